//! SQLite storage adapter, schema, and expiry reaper.

pub mod config;
pub mod expire;
pub mod store;

pub use config::StorageConfig;
pub use expire::Reaper;
pub use store::{SqliteStore, TableNames};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// All `expiry` columns hold absolute timestamps in this form.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}
