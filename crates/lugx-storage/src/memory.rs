// In-memory storage for dev mode and tests
// Decision: Use parking_lot for thread-safe access
// Decision: Emulate the backend defaults (UUID + timestamp for events, serial id + created_at for tables)
//
// Data lives for the lifetime of the process and is lost on restart.

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{AnalyticsEventRow, NewAnalyticsEvent};

/// Append-only event log standing in for ClickHouse
#[derive(Default)]
pub struct InMemoryEventStore {
    events: RwLock<Vec<AnalyticsEventRow>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, event: &NewAnalyticsEvent) -> AnalyticsEventRow {
        let row = AnalyticsEventRow {
            id: Uuid::new_v4(),
            event_type: event.event_type.clone(),
            page_url: event.page_url.clone(),
            user_agent: event.user_agent.clone(),
            timestamp: Utc::now(),
        };
        self.events.write().push(row.clone());
        row
    }

    /// Snapshot of all events in insertion order
    pub fn events(&self) -> Vec<AnalyticsEventRow> {
        self.events.read().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

#[derive(Default)]
struct Table {
    rows: Vec<Value>,
    next_id: i64,
}

/// Named tables of JSON rows standing in for Supabase
#[derive(Default)]
pub struct InMemoryTables {
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one object row, filling `id` and `created_at` when absent.
    /// Returns the stored row the way PostgREST's representation would.
    pub fn insert<T: Serialize + ?Sized>(&self, table: &str, row: &T) -> Result<Vec<Value>> {
        let mut object = match serde_json::to_value(row)? {
            Value::Object(map) => map,
            other => {
                return Err(StorageError::rejected(
                    400,
                    format!("row for {} must be a JSON object, got {}", table, other),
                ))
            }
        };

        let mut tables = self.tables.write();
        let entry = tables.entry(table.to_string()).or_default();
        entry.next_id += 1;
        object
            .entry("id")
            .or_insert_with(|| Value::from(entry.next_id));
        object
            .entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        let stored = Value::Object(object);
        entry.rows.push(stored.clone());
        Ok(vec![stored])
    }

    /// All rows of `table` in insertion order; unknown tables are empty
    pub fn select_all(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }
}
