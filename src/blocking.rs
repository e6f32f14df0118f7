//! Waiter coordination for blocking list operations.
//!
//! BRPOPLPUSH callers with an empty source register under the source key
//! and suspend; commands that push to a list wake one waiter for that key
//! after their transaction commits. `Notify` buffers a wakeup permit, so
//! a push landing between a waiter's registration and its await is not
//! lost.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Notify;

struct WaiterSlot {
    notify: Arc<Notify>,
    count: usize,
}

/// In-memory registry of blocked-list waiters, keyed by list key.
#[derive(Clone, Default)]
pub struct BlockingCoordinator {
    waiters: Arc<DashMap<String, WaiterSlot>>,
}

#[allow(missing_docs)]
impl BlockingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in pushes to `key`. The returned waiter
    /// unregisters itself on drop.
    pub fn subscribe(&self, key: &str) -> Waiter {
        let notify = match self.waiters.entry(key.to_string()) {
            Entry::Occupied(mut slot) => {
                let slot = slot.get_mut();
                slot.count += 1;
                Arc::clone(&slot.notify)
            }
            Entry::Vacant(vacant) => {
                let notify = Arc::new(Notify::new());
                vacant.insert(WaiterSlot {
                    notify: Arc::clone(&notify),
                    count: 1,
                });
                notify
            }
        };
        Waiter {
            key: key.to_string(),
            notify,
            waiters: Arc::clone(&self.waiters),
        }
    }

    /// Wakes one waiter blocked on `key`, if any.
    pub fn wake(&self, key: &str) {
        if let Some(slot) = self.waiters.get(key) {
            slot.notify.notify_one();
        }
    }
}

/// A registered blocked-list waiter.
pub struct Waiter {
    key: String,
    notify: Arc<Notify>,
    waiters: Arc<DashMap<String, WaiterSlot>>,
}

impl Waiter {
    /// Suspends until a push wakes this waiter.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        if let Entry::Occupied(mut slot) = self.waiters.entry(self.key.clone()) {
            let inner = slot.get_mut();
            inner.count -= 1;
            if inner.count == 0 {
                slot.remove();
            }
        }
    }
}
