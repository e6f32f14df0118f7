use std::time::Duration;

/// Environment variable overriding the table-name prefix, so multiple
/// logical databases can share one file.
pub const PREFIX_ENV: &str = "REDIS_SQLITE_PREFIX";

const DEFAULT_PREFIX: &str = "redis_";

/// Configuration for the store.
///
/// The default opens an in-memory database with no password, the
/// `redis_` table prefix (or [`PREFIX_ENV`] when set), and a one-second
/// reap interval.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// SQLite database filename, or `:memory:`.
    pub filename: String,
    /// Password required from RESP connections when set.
    pub password: Option<String>,
    /// Prefix applied to the four table names.
    pub table_prefix: String,
    /// How often the background reaper deletes expired rows.
    pub reap_interval: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            filename: ":memory:".to_string(),
            password: None,
            table_prefix: std::env::var(PREFIX_ENV).unwrap_or_else(|_| DEFAULT_PREFIX.to_string()),
            reap_interval: Duration::from_secs(1),
        }
    }
}

#[allow(missing_docs)]
impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }
}
