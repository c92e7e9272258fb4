// LUGX smoke checks
//
// Design Decision: Use clap derive with env fallbacks so CI can point at any deployment.
// Design Decision: Print one line per check; exit non-zero if any check failed.

mod checks;
mod client;

use clap::Parser;
use std::time::Duration;

use checks::{
    Targets, DEFAULT_ANALYTICS_URL, DEFAULT_FRONTEND_URL, DEFAULT_GAME_URL, DEFAULT_ORDER_URL,
};

#[derive(Parser)]
#[command(name = "lugx-smoke")]
#[command(about = "Smoke checks against deployed LUGX services")]
#[command(version)]
pub struct Cli {
    /// Order service base URL
    #[arg(long, env = "LUGX_ORDER_URL", default_value = DEFAULT_ORDER_URL)]
    pub order_url: String,

    /// Game service base URL
    #[arg(long, env = "LUGX_GAME_URL", default_value = DEFAULT_GAME_URL)]
    pub game_url: String,

    /// Analytics service base URL
    #[arg(long, env = "LUGX_ANALYTICS_URL", default_value = DEFAULT_ANALYTICS_URL)]
    pub analytics_url: String,

    /// Frontend base URL
    #[arg(long, env = "LUGX_FRONTEND_URL", default_value = DEFAULT_FRONTEND_URL)]
    pub frontend_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "10")]
    pub timeout: u64,
}

impl Cli {
    fn targets(&self) -> Targets {
        Targets {
            order: self.order_url.clone(),
            game: self.game_url.clone(),
            analytics: self.analytics_url.clone(),
            frontend: self.frontend_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = client::Client::new(Duration::from_secs(cli.timeout))?;

    let outcomes = checks::run(&client, &checks::plan(&cli.targets())).await;
    for outcome in &outcomes {
        println!("{}", outcome);
    }

    let failed = outcomes.iter().filter(|o| !o.passed()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} checks failed", failed, outcomes.len());
    }
    Ok(())
}
