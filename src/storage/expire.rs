//! Background expiry reaper.
//!
//! Deletes rows whose `expiry` has elapsed, across all four tables, on a
//! fixed tick. Reaping is best-effort: readers always re-check `expiry`
//! against the current time, so a slow or failed reap only delays space
//! reclamation, never correctness.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::store::SqliteStore;
use super::now_ms;
use crate::error::RedisResult;

/// Handle to the background reap task.
///
/// Dropping the handle does not stop the task; call [`Reaper::shutdown`]
/// when closing the engine.
pub struct Reaper {
    shutdown: watch::Sender<bool>,
}

impl Reaper {
    /// Spawns the reap task on the current runtime.
    pub fn spawn(store: SqliteStore, interval: Duration) -> Self {
        let (tx, mut rx) = watch::channel(false);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => match Self::reap(&store).await {
                        Ok(0) => {}
                        Ok(n) => debug!(rows = n, "reaped expired rows"),
                        // Swallow and retry next tick.
                        Err(e) => warn!(error = %e, "expiry reap failed"),
                    },
                    _ = rx.changed() => break,
                }
            }
            debug!("expiry reaper stopped");
        });
        Self { shutdown: tx }
    }

    async fn reap(store: &SqliteStore) -> RedisResult<usize> {
        store
            .transaction(|conn, tables| {
                let now = now_ms();
                let mut total = 0;
                for table in tables.all() {
                    total += conn.execute(
                        &format!("DELETE FROM {table} WHERE expiry IS NOT NULL AND expiry <= ?1"),
                        [now],
                    )?;
                }
                Ok(total)
            })
            .await
    }

    /// Signals the task to stop after the current tick.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}
