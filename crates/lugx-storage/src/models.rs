// Row models
//
// Game and order columns are forwarded as whatever JSON the client sent;
// the hosted backend decides whether a value fits its column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// ClickHouse table holding analytics events
pub const ANALYTICS_TABLE: &str = "web_analytics";

/// Supabase table holding the game catalog
pub const GAMES_TABLE: &str = "games";

/// Supabase table holding placed orders
pub const ORDERS_TABLE: &str = "orders";

// ============================================
// Analytics
// ============================================

/// Columns written on ingest; `id` and `timestamp` are filled by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAnalyticsEvent {
    pub event_type: String,
    pub page_url: String,
    pub user_agent: String,
}

impl NewAnalyticsEvent {
    pub const COLUMNS: [&'static str; 3] = ["event_type", "page_url", "user_agent"];
}

/// A stored analytics event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEventRow {
    pub id: Uuid,
    pub event_type: String,
    pub page_url: String,
    pub user_agent: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================
// Catalog
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGame {
    pub name: Value,
    pub category: Value,
    pub release_date: Value,
    pub price: Value,
}

// ============================================
// Orders
// ============================================

/// An order as inserted. `items` keeps its JSON structure (jsonb column).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrder {
    pub customer: Value,
    pub items: Value,
    pub total: Value,
    pub order_date: DateTime<Utc>,
}
