//! Rolling floor tracker.
//!
//! Same locking layout as the heartbeat store: a read-mostly map of
//! per-component slots, each behind its own mutex.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::trace;

use rollcall_core::ComponentKey;

/// Snapshots retained per component unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 15;

/// Alive count observed for a component on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub taken_at: Instant,
    pub count: usize,
}

type History = VecDeque<Snapshot>;

/// Bounded, insertion-ordered snapshot history per component.
pub struct RollingFloorTracker {
    histories: RwLock<HashMap<ComponentKey, Arc<Mutex<History>>>>,
    capacity: usize,
}

impl Default for RollingFloorTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl RollingFloorTracker {
    /// Create a tracker keeping at most `capacity` snapshots per component.
    ///
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Minimum count in the retained history, 0 when empty.
    pub async fn floor(&self, key: &ComponentKey) -> usize {
        let Some(slot) = self.existing_slot(key).await else {
            return 0;
        };
        let history = slot.lock().await;
        history.iter().map(|s| s.count).min().unwrap_or(0)
    }

    /// Append a snapshot, evicting the oldest one when full.
    pub async fn record(&self, key: &ComponentKey, count: usize, now: Instant) {
        let slot = self.slot(key).await;
        let mut history = slot.lock().await;
        while history.len() >= self.capacity {
            history.pop_front();
        }
        history.push_back(Snapshot {
            taken_at: now,
            count,
        });
        trace!(component = %key, count, retained = history.len(), "snapshot recorded");
    }

    /// Retained snapshots for `key`, oldest first.
    pub async fn history(&self, key: &ComponentKey) -> Vec<Snapshot> {
        let Some(slot) = self.existing_slot(key).await else {
            return Vec::new();
        };
        let history = slot.lock().await;
        history.iter().copied().collect()
    }

    async fn existing_slot(&self, key: &ComponentKey) -> Option<Arc<Mutex<History>>> {
        let histories = self.histories.read().await;
        histories.get(key).cloned()
    }

    async fn slot(&self, key: &ComponentKey) -> Arc<Mutex<History>> {
        if let Some(slot) = self.existing_slot(key).await {
            return slot;
        }
        let mut histories = self.histories.write().await;
        Arc::clone(
            histories
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(VecDeque::with_capacity(self.capacity)))),
        )
    }
}
