//! The command engine.
//!
//! Store operations live in the submodules as synchronous functions over
//! `&rusqlite::Connection`; [`Engine`] fronts them with async methods that
//! open one transaction per command (or thread the EXEC batch through a
//! single transaction) and drive the blocking coordinator.

pub mod dispatch;
pub mod hashes;
pub mod keys;
pub mod lists;
pub mod sets;
pub mod strings;

pub use keys::KeyType;
pub use strings::SetOptions;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::spawn_blocking;

use crate::blocking::BlockingCoordinator;
use crate::error::{RedisError, RedisResult};
use crate::storage::{now_ms, Reaper, SqliteStore, StorageConfig};
use crate::txn::BufferedCommand;
use crate::types::Value;

struct EngineInner {
    store: SqliteStore,
    blocking: BlockingCoordinator,
    password: Option<String>,
    reaper: Reaper,
}

/// The shared command engine. Cheap to clone; all clones use the same
/// database connection and waiter registry.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Opens the database, applies the schema, and starts the expiry
    /// reaper.
    pub async fn open(config: StorageConfig) -> RedisResult<Engine> {
        let filename = config.filename.clone();
        let prefix = config.table_prefix.clone();
        let store = spawn_blocking(move || SqliteStore::open(&filename, &prefix))
            .await
            .map_err(|e| RedisError::Unknown(format!("blocking task failed: {e}")))??;
        let reaper = Reaper::spawn(store.clone(), config.reap_interval);
        Ok(Engine {
            inner: Arc::new(EngineInner {
                store,
                blocking: BlockingCoordinator::new(),
                password: config.password,
                reaper,
            }),
        })
    }

    /// Stops the expiry reaper. The database connection itself is closed
    /// when the last clone is dropped.
    pub fn close(&self) {
        self.inner.reaper.shutdown();
    }

    /// Whether connections must AUTH before running commands.
    pub fn requires_auth(&self) -> bool {
        self.inner.password.is_some()
    }

    /// AUTH semantics: error when no password is configured, error on
    /// mismatch, `Ok` on match.
    pub fn verify_password(&self, attempt: &str) -> RedisResult<()> {
        match self.inner.password.as_deref() {
            None => Err(RedisError::AuthNotConfigured),
            Some(configured) if configured == attempt => Ok(()),
            Some(_) => Err(RedisError::InvalidPassword),
        }
    }

    /// Runs one command in its own transaction.
    ///
    /// BRPOPLPUSH takes the async path through the blocking coordinator;
    /// everything else goes through [`dispatch`].
    pub async fn execute(&self, name: &str, args: Vec<Vec<u8>>) -> RedisResult<Value> {
        let name = name.to_ascii_uppercase();
        dispatch::check_arity(&name, args.len())?;

        if name == "BRPOPLPUSH" {
            let src = String::from_utf8_lossy(&args[0]).into_owned();
            let dst = String::from_utf8_lossy(&args[1]).into_owned();
            let timeout = dispatch::parse_timeout(&args, 2)?;
            return Ok(match self.brpoplpush(&src, &dst, timeout).await? {
                Some(value) => Value::String(value),
                None => Value::Null,
            });
        }

        let wake = dispatch::wake_target(&name, &args);
        let result = self
            .inner
            .store
            .transaction(move |conn, t| dispatch::dispatch(conn, t, &name, &args, now_ms()))
            .await?;
        if let Some(key) = wake {
            self.inner.blocking.wake(&key);
        }
        Ok(result)
    }

    /// Runs an EXEC buffer inside one transaction.
    ///
    /// Each command gets a result slot; logic-level errors are captured in
    /// their slot and the batch continues, while an SQL-level failure
    /// rolls everything back and becomes the error of the whole batch.
    pub async fn exec_batch(
        &self,
        commands: Vec<BufferedCommand>,
    ) -> RedisResult<Vec<RedisResult<Value>>> {
        let wakes: Vec<String> = commands
            .iter()
            .filter_map(|cmd| dispatch::wake_target(&cmd.name, &cmd.args))
            .collect();

        let results = self
            .inner
            .store
            .transaction(move |conn, t| {
                let now = now_ms();
                let mut out = Vec::with_capacity(commands.len());
                for cmd in &commands {
                    match dispatch::dispatch(conn, t, &cmd.name, &cmd.args, now) {
                        Ok(value) => out.push(Ok(value)),
                        Err(e) if e.aborts_batch() => return Err(e),
                        Err(e) => out.push(Err(e)),
                    }
                }
                Ok(out)
            })
            .await?;

        for key in wakes {
            self.inner.blocking.wake(&key);
        }
        Ok(results)
    }

    /// BRPOPLPUSH: RPOPLPUSH, suspending while the source is empty.
    ///
    /// `timeout_secs` of 0 waits forever, as in Redis. Returns `None` on
    /// timeout.
    pub async fn brpoplpush(
        &self,
        src: &str,
        dst: &str,
        timeout_secs: u64,
    ) -> RedisResult<Option<Vec<u8>>> {
        if let Some(value) = self.try_rpoplpush(src, dst).await? {
            return Ok(Some(value));
        }

        let deadline = (timeout_secs > 0)
            .then(|| tokio::time::Instant::now() + Duration::from_secs(timeout_secs));
        let waiter = self.inner.blocking.subscribe(src);
        loop {
            // Re-check after registering: a push that landed in the gap
            // has already banked its wakeup permit, but the data may as
            // well be taken now.
            if let Some(value) = self.try_rpoplpush(src, dst).await? {
                return Ok(Some(value));
            }
            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, waiter.notified())
                        .await
                        .is_err()
                    {
                        return Ok(None);
                    }
                }
                None => waiter.notified().await,
            }
        }
    }

    async fn try_rpoplpush(&self, src: &str, dst: &str) -> RedisResult<Option<Vec<u8>>> {
        let (src_owned, dst_owned) = (src.to_string(), dst.to_string());
        let moved = self
            .inner
            .store
            .transaction(move |conn, t| {
                lists::rpoplpush(conn, t, &src_owned, &dst_owned, now_ms())
            })
            .await?;
        if moved.is_some() {
            self.inner.blocking.wake(dst);
        }
        Ok(moved)
    }
}
