//! The SQLite storage adapter.
//!
//! Owns the single database connection. SQLite serializes writers anyway,
//! so one connection behind a mutex is the whole concurrency story; every
//! statement runs on the blocking pool via [`tokio::task::spawn_blocking`].

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::task::spawn_blocking;

use crate::error::{RedisError, RedisResult};

/// Resolved names of the four type tables.
#[derive(Debug)]
#[allow(missing_docs)]
pub struct TableNames {
    pub string: String,
    pub hash: String,
    pub list: String,
    pub set: String,
}

impl TableNames {
    fn new(prefix: &str) -> Self {
        Self {
            string: format!("{prefix}string_store"),
            hash: format!("{prefix}hash_store"),
            list: format!("{prefix}list_store"),
            set: format!("{prefix}set_store"),
        }
    }

    /// The tables in a fixed iteration order (string, hash, list, set).
    pub fn all(&self) -> [&str; 4] {
        [&self.string, &self.hash, &self.list, &self.set]
    }
}

/// SQLite-backed storage adapter shared by all callers.
///
/// `rusqlite::Connection` is neither `Send` nor `Sync`-friendly under
/// concurrent use, so it lives behind `Arc<Mutex<_>>` and is only touched
/// from blocking-pool closures.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    tables: Arc<TableNames>,
}

impl SqliteStore {
    /// Opens (or creates) the database and applies the schema idempotently.
    pub fn open(filename: &str, prefix: &str) -> RedisResult<Self> {
        validate_prefix(prefix)?;

        let conn = if filename == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(filename)?
        };

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;",
        )?;

        let tables = TableNames::new(prefix);
        conn.execute_batch(&schema_sql(&tables))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            tables: Arc::new(tables),
        })
    }

    /// The resolved (prefixed) table names.
    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// Runs a read-only closure against the connection on the blocking pool.
    pub async fn query<F, T>(&self, f: F) -> RedisResult<T>
    where
        F: FnOnce(&Connection, &TableNames) -> RedisResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let tables = Arc::clone(&self.tables);
        spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| RedisError::Unknown("storage mutex poisoned".to_string()))?;
            f(&guard, &tables)
        })
        .await
        .map_err(|e| RedisError::Unknown(format!("blocking task failed: {e}")))?
    }

    /// Runs a closure inside one SQL transaction, committing on `Ok` and
    /// rolling back on `Err`.
    ///
    /// The closure receives the transaction as `&Connection` (through
    /// deref), which is what lets every command operation run either
    /// standalone or as part of a MULTI/EXEC batch.
    pub async fn transaction<F, T>(&self, f: F) -> RedisResult<T>
    where
        F: FnOnce(&Connection, &TableNames) -> RedisResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let tables = Arc::clone(&self.tables);
        spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| RedisError::Unknown("storage mutex poisoned".to_string()))?;
            let tx = guard.transaction()?;
            let result = f(&tx, &tables)?;
            tx.commit()?;
            Ok(result)
        })
        .await
        .map_err(|e| RedisError::Unknown(format!("blocking task failed: {e}")))?
    }
}

/// Table prefixes come from configuration or the environment and are
/// spliced into DDL, so only identifier characters are allowed.
fn validate_prefix(prefix: &str) -> RedisResult<()> {
    if prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(RedisError::Unknown(format!(
            "invalid table prefix '{prefix}'"
        )))
    }
}

/// Four tables share one key namespace; a key has rows in at most one of
/// them at any time. `expiry` is NULL or absolute milliseconds; each table
/// gets an expiry index for reaper scans.
fn schema_sql(t: &TableNames) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {string} (
            key TEXT PRIMARY KEY,
            value BLOB NOT NULL,
            expiry INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_{string}_expiry ON {string}(expiry);

        CREATE TABLE IF NOT EXISTS {hash} (
            key TEXT NOT NULL,
            field BLOB NOT NULL,
            value BLOB NOT NULL,
            expiry INTEGER,
            PRIMARY KEY (key, field)
        );
        CREATE INDEX IF NOT EXISTS idx_{hash}_expiry ON {hash}(expiry);

        CREATE TABLE IF NOT EXISTS {list} (
            key TEXT NOT NULL,
            idx INTEGER NOT NULL,
            value BLOB NOT NULL,
            expiry INTEGER,
            PRIMARY KEY (key, idx)
        );
        CREATE INDEX IF NOT EXISTS idx_{list}_expiry ON {list}(expiry);

        CREATE TABLE IF NOT EXISTS {set} (
            key TEXT NOT NULL,
            member BLOB NOT NULL,
            expiry INTEGER,
            PRIMARY KEY (key, member)
        );
        CREATE INDEX IF NOT EXISTS idx_{set}_expiry ON {set}(expiry);",
        string = t.string,
        hash = t.hash,
        list = t.list,
        set = t.set,
    )
}
