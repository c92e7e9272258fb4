// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// Each service holds exactly one of these, created at startup:
// the hosted client in production, the in-memory store in dev mode.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::clickhouse::{ClickHouseClient, ClickHouseSettings, CREATE_ANALYTICS_TABLE};
use crate::error::Result;
use crate::memory::{InMemoryEventStore, InMemoryTables};
use crate::models::{NewAnalyticsEvent, ANALYTICS_TABLE};
use crate::supabase::{SupabaseClient, SupabaseSettings};

// ============================================
// Analytics events
// ============================================

/// Where analytics events are written
#[derive(Clone)]
pub enum EventStore {
    /// ClickHouse over HTTP (production)
    ClickHouse(ClickHouseClient),
    /// In-memory log (dev mode)
    InMemory(Arc<InMemoryEventStore>),
}

impl EventStore {
    /// Connect to ClickHouse and make sure the analytics table exists
    pub async fn clickhouse(settings: ClickHouseSettings) -> Result<Self> {
        let client = ClickHouseClient::connect(settings).await?;
        let store = Self::ClickHouse(client);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryEventStore::new()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClickHouse(_) => "clickhouse",
            Self::InMemory(_) => "in-memory",
        }
    }

    /// Create the analytics table if it does not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        match self {
            Self::ClickHouse(client) => {
                client.command(CREATE_ANALYTICS_TABLE).await?;
                tracing::info!(table = ANALYTICS_TABLE, "Analytics table ready");
                Ok(())
            }
            Self::InMemory(_) => Ok(()),
        }
    }

    /// Append one event; `id` and `timestamp` are left to the backend
    pub async fn insert_event(&self, event: &NewAnalyticsEvent) -> Result<()> {
        match self {
            Self::ClickHouse(client) => {
                client
                    .insert_rows(
                        ANALYTICS_TABLE,
                        &NewAnalyticsEvent::COLUMNS,
                        std::slice::from_ref(event),
                    )
                    .await
            }
            Self::InMemory(store) => {
                store.insert(event);
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClickHouse(client) => f.debug_tuple("ClickHouse").field(client).finish(),
            Self::InMemory(store) => f
                .debug_struct("InMemory")
                .field("events", &store.len())
                .finish(),
        }
    }
}

// ============================================
// Relational tables
// ============================================

/// Where catalog and order rows live
#[derive(Clone)]
pub enum TableStore {
    /// Supabase PostgREST (production)
    Supabase(SupabaseClient),
    /// In-memory tables (dev mode)
    InMemory(Arc<InMemoryTables>),
}

impl TableStore {
    /// Build a Supabase-backed store. Fails on unusable settings only.
    pub fn supabase(settings: SupabaseSettings) -> Result<Self> {
        Ok(Self::Supabase(SupabaseClient::new(settings)?))
    }

    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryTables::new()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Supabase(_) => "supabase",
            Self::InMemory(_) => "in-memory",
        }
    }

    /// Insert one row and return the stored representation
    pub async fn insert<T: Serialize + ?Sized>(&self, table: &str, row: &T) -> Result<Vec<Value>> {
        match self {
            Self::Supabase(client) => client.insert(table, row).await,
            Self::InMemory(tables) => tables.insert(table, row),
        }
    }

    /// Every row of `table`
    pub async fn select_all(&self, table: &str) -> Result<Vec<Value>> {
        match self {
            Self::Supabase(client) => client.select_all(table).await,
            Self::InMemory(tables) => Ok(tables.select_all(table)),
        }
    }
}

impl std::fmt::Debug for TableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Supabase(client) => f.debug_tuple("Supabase").field(client).finish(),
            Self::InMemory(_) => f.write_str("InMemory"),
        }
    }
}
