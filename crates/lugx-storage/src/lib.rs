// LUGX storage layer
//
// Two hosted backends, each reached over plain HTTP:
// - ClickHouseClient: append-only analytics events (web_analytics table)
// - SupabaseClient: games and orders tables through PostgREST
//
// EventStore and TableStore dispatch between the hosted client and an
// in-memory stand-in used for dev mode and tests.

pub mod backend;
pub mod clickhouse;
pub mod error;
pub mod memory;
pub mod models;
pub mod supabase;

pub use backend::{EventStore, TableStore};
pub use clickhouse::{ClickHouseClient, ClickHouseSettings, CREATE_ANALYTICS_TABLE};
pub use error::{Result, StorageError};
pub use memory::{InMemoryEventStore, InMemoryTables};
pub use models::*;
pub use supabase::{SupabaseClient, SupabaseSettings};
