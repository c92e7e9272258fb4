// Smoke check plan and runner
// Decision: Checks run sequentially in a fixed order; a failure never stops later checks

use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::fmt;

use crate::client::{Client, ClientError};

pub const DEFAULT_ORDER_URL: &str = "http://34.93.184.130:5001";
pub const DEFAULT_GAME_URL: &str = "http://34.100.182.195:5000";
pub const DEFAULT_ANALYTICS_URL: &str = "http://35.200.226.132:5002";
pub const DEFAULT_FRONTEND_URL: &str = "http://35.244.41.165";

/// Base URLs of the deployment under test
#[derive(Debug, Clone)]
pub struct Targets {
    pub order: String,
    pub game: String,
    pub analytics: String,
    pub frontend: String,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER_URL.to_string(),
            game: DEFAULT_GAME_URL.to_string(),
            analytics: DEFAULT_ANALYTICS_URL.to_string(),
            frontend: DEFAULT_FRONTEND_URL.to_string(),
        }
    }
}

/// One request and the statuses that count as a pass
#[derive(Debug, Clone)]
pub struct Check {
    pub name: &'static str,
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub expected: &'static [StatusCode],
}

const OK: &[StatusCode] = &[StatusCode::OK];
const CREATED: &[StatusCode] = &[StatusCode::CREATED];
const OK_OR_CREATED: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED];

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Every check against `targets`, in reporting order
pub fn plan(targets: &Targets) -> Vec<Check> {
    vec![
        Check {
            name: "Order Service GET",
            method: Method::GET,
            url: join(&targets.order, "/orders"),
            body: None,
            expected: OK,
        },
        Check {
            name: "Order Service POST",
            method: Method::POST,
            url: join(&targets.order, "/place-order"),
            body: Some(json!({
                "customer": "Ruzaik",
                "items": ["Call of Duty 2", "FIFA 25"],
                "total": 120.98
            })),
            expected: CREATED,
        },
        Check {
            name: "Game Service GET",
            method: Method::GET,
            url: join(&targets.game, "/games"),
            body: None,
            expected: OK,
        },
        Check {
            name: "Game Service POST",
            method: Method::POST,
            url: join(&targets.game, "/add-game"),
            body: Some(json!({
                "name": "Call of Duty 13",
                "category": "Action",
                "release_date": "2022-11-13",
                "price": 69.99
            })),
            expected: CREATED,
        },
        Check {
            name: "Analytics Service Track",
            method: Method::POST,
            url: join(&targets.analytics, "/track"),
            body: Some(json!({
                "event_type": "integration_test",
                "page_url": "/test"
            })),
            expected: OK_OR_CREATED,
        },
        Check {
            name: "Frontend",
            method: Method::GET,
            url: join(&targets.frontend, "/"),
            body: None,
            expected: OK,
        },
    ]
}

/// Result of one check
#[derive(Debug)]
pub struct Outcome {
    pub name: &'static str,
    pub result: Result<StatusCode, ClientError>,
}

impl Outcome {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(_) => write!(f, "{} OK", self.name),
            Err(e) => write!(f, "{} Failed: {}", self.name, e),
        }
    }
}

pub async fn run(client: &Client, checks: &[Check]) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(checks.len());
    for check in checks {
        let result = client
            .expect_status(
                check.method.clone(),
                &check.url,
                check.body.as_ref(),
                check.expected,
            )
            .await;
        outcomes.push(Outcome {
            name: check.name,
            result,
        });
    }
    outcomes
}
