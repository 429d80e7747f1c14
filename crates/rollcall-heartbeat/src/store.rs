//! Heartbeat store — tracks which servers of each component are alive.
//!
//! Expiry is sliding: each checkin moves the server's deadline to
//! `now + ttl`. Entries past their deadline are ignored by every read,
//! whether or not `reap_expired` has removed them yet.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;

use rollcall_core::{ComponentKey, MAX_DURATION, RunningUnit, ServerId};

/// Default liveness window for a server after its last checkin.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Servers of one component: server id → expiry deadline.
type ServerSet = HashMap<ServerId, Instant>;

/// Per-component sliding-TTL sets of server ids.
///
/// `Send + Sync`; share it behind an `Arc`. The outer map is write-locked
/// only when a component checks in for the first time, every other
/// operation locks just the affected component.
pub struct HeartbeatStore {
    components: RwLock<HashMap<ComponentKey, Arc<Mutex<ServerSet>>>>,
    ttl: Duration,
}

impl Default for HeartbeatStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl HeartbeatStore {
    /// Create an empty store with the given liveness window.
    ///
    /// The window is capped at [`MAX_DURATION`] so `now + ttl` cannot overflow.
    pub fn new(ttl: Duration) -> Self {
        Self {
            components: RwLock::new(HashMap::new()),
            ttl: ttl.min(MAX_DURATION),
        }
    }

    /// Liveness window applied to every checkin.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Record a checkin for `server` of `key` at `now`.
    ///
    /// Inserts the server if absent and resets its expiry to `now + ttl`.
    pub async fn checkin(&self, key: &ComponentKey, server: &str, now: Instant) {
        let slot = self.slot(key).await;
        let mut servers = slot.lock().await;
        let expires_at = now + self.ttl;

        match servers.get_mut(server) {
            Some(deadline) => *deadline = expires_at,
            None => {
                servers.insert(server.to_string(), expires_at);
                debug!(
                    environment = key.environment(),
                    system = key.system(),
                    component = key.component(),
                    %server,
                    "new server checked in"
                );
            }
        }
    }

    /// Record a checkin from a heartbeat payload.
    pub async fn checkin_unit(&self, unit: &RunningUnit, now: Instant) {
        self.checkin(&unit.component_key(), &unit.server, now).await;
    }

    /// Number of servers of `key` whose expiry has not passed at `now`.
    ///
    /// Unknown components have zero alive servers.
    pub async fn alive_count(&self, key: &ComponentKey, now: Instant) -> usize {
        let Some(slot) = self.existing_slot(key).await else {
            return 0;
        };
        let servers = slot.lock().await;
        servers.values().filter(|&&expires_at| now <= expires_at).count()
    }

    /// Alive server ids of `key` at `now`, sorted.
    pub async fn alive_servers(&self, key: &ComponentKey, now: Instant) -> Vec<ServerId> {
        let Some(slot) = self.existing_slot(key).await else {
            return Vec::new();
        };
        let servers = slot.lock().await;
        let mut alive: Vec<ServerId> = servers
            .iter()
            .filter(|&(_, &expires_at)| now <= expires_at)
            .map(|(server, _)| server.clone())
            .collect();
        alive.sort();
        alive
    }

    /// Every component that has ever checked in.
    ///
    /// Components stay known even after all their servers expire.
    pub async fn components(&self) -> Vec<ComponentKey> {
        let components = self.components.read().await;
        components.keys().cloned().collect()
    }

    /// Physically drop expired servers.
    ///
    /// Component keys are kept so that a component whose servers all
    /// vanished is still evaluated (and reported at zero). Returns the
    /// number of server entries removed.
    pub async fn reap_expired(&self, now: Instant) -> usize {
        let slots: Vec<(ComponentKey, Arc<Mutex<ServerSet>>)> = {
            let components = self.components.read().await;
            components
                .iter()
                .map(|(key, slot)| (key.clone(), Arc::clone(slot)))
                .collect()
        };

        let mut reaped = 0;
        for (key, slot) in slots {
            let mut servers = slot.lock().await;
            let before = servers.len();
            servers.retain(|_, expires_at| now <= *expires_at);
            let removed = before - servers.len();
            if removed > 0 {
                debug!(component = %key, removed, "reaped expired servers");
            }
            reaped += removed;
        }
        reaped
    }

    async fn existing_slot(&self, key: &ComponentKey) -> Option<Arc<Mutex<ServerSet>>> {
        let components = self.components.read().await;
        components.get(key).cloned()
    }

    async fn slot(&self, key: &ComponentKey) -> Arc<Mutex<ServerSet>> {
        if let Some(slot) = self.existing_slot(key).await {
            return slot;
        }
        let mut components = self.components.write().await;
        Arc::clone(
            components
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(HashMap::new()))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ComponentKey {
        ComponentKey::new("prod", "billing", "api")
    }

    #[tokio::test]
    async fn checkin_is_immediately_alive() {
        let store = HeartbeatStore::default();
        let now = Instant::now();

        store.checkin(&key(), "s1", now).await;
        assert_eq!(store.alive_count(&key(), now).await, 1);
        assert_eq!(store.alive_servers(&key(), now).await, vec!["s1".to_string()]);
    }

    #[tokio::test]
    async fn unknown_component_has_zero_alive() {
        let store = HeartbeatStore::default();
        assert_eq!(store.alive_count(&key(), Instant::now()).await, 0);
        assert!(store.components().await.is_empty());
    }

    #[tokio::test]
    async fn server_expires_after_ttl() {
        let store = HeartbeatStore::default();
        let t = Instant::now();
        store.checkin(&key(), "s1", t).await;

        // Still alive right at the edge of the window.
        assert_eq!(store.alive_count(&key(), t + DEFAULT_TTL).await, 1);
        assert_eq!(
            store
                .alive_count(&key(), t + DEFAULT_TTL + Duration::from_millis(1))
                .await,
            0
        );
    }

    #[tokio::test]
    async fn checkin_slides_the_expiry() {
        let store = HeartbeatStore::default();
        let t = Instant::now();
        store.checkin(&key(), "s1", t).await;
        store.checkin(&key(), "s1", t + Duration::from_secs(240)).await;

        // Past the first deadline, within the second.
        let later = t + DEFAULT_TTL + Duration::from_secs(60);
        assert_eq!(store.alive_count(&key(), later).await, 1);
    }

    #[tokio::test]
    async fn repeated_checkins_count_once() {
        let store = HeartbeatStore::default();
        let t = Instant::now();
        for i in 0..10 {
            store.checkin(&key(), "s1", t + Duration::from_secs(i)).await;
        }
        assert_eq!(store.alive_count(&key(), t + Duration::from_secs(10)).await, 1);
    }

    #[tokio::test]
    async fn components_are_isolated() {
        let store = HeartbeatStore::default();
        let other = ComponentKey::new("prod", "billing", "worker");
        let now = Instant::now();

        store.checkin(&key(), "s1", now).await;
        store.checkin(&key(), "s2", now).await;
        store.checkin(&other, "s1", now).await;

        assert_eq!(store.alive_count(&key(), now).await, 2);
        assert_eq!(store.alive_count(&other, now).await, 1);
        assert_eq!(store.components().await.len(), 2);
    }

    #[tokio::test]
    async fn checkin_unit_uses_component_key() {
        let store = HeartbeatStore::default();
        let now = Instant::now();
        store
            .checkin_unit(&RunningUnit::new("prod", "billing", "api", "host-9"), now)
            .await;
        assert_eq!(store.alive_servers(&key(), now).await, vec!["host-9".to_string()]);
    }

    #[tokio::test]
    async fn reap_removes_entries_but_keeps_component() {
        let store = HeartbeatStore::new(Duration::from_secs(10));
        let t = Instant::now();
        store.checkin(&key(), "s1", t).await;
        store.checkin(&key(), "s2", t + Duration::from_secs(8)).await;

        let reaped = store.reap_expired(t + Duration::from_secs(12)).await;
        assert_eq!(reaped, 1);
        assert_eq!(store.alive_count(&key(), t + Duration::from_secs(12)).await, 1);

        let reaped = store.reap_expired(t + Duration::from_secs(60)).await;
        assert_eq!(reaped, 1);
        assert_eq!(store.components().await, vec![key()]);
    }

    #[tokio::test]
    async fn concurrent_checkins() {
        let store = Arc::new(HeartbeatStore::default());
        let now = Instant::now();

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let key = ComponentKey::new("prod", "billing", format!("svc-{}", i % 4));
                store.checkin(&key, &format!("s{}", i % 8), now).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.components().await.len(), 4);
        let total: usize = {
            let mut sum = 0;
            for key in store.components().await {
                sum += store.alive_count(&key, now).await;
            }
            sum
        };
        // svc-k receives servers s{k} and s{k+4}.
        assert_eq!(total, 8);
    }

    #[tokio::test]
    async fn oversized_ttl_is_capped() {
        let store = HeartbeatStore::new(Duration::from_secs(u64::MAX));
        assert_eq!(store.ttl(), MAX_DURATION);

        let now = Instant::now();
        store.checkin(&key(), "s1", now).await;
        assert_eq!(store.alive_count(&key(), now).await, 1);
        assert_eq!(store.alive_count(&key(), now + MAX_DURATION).await, 1);
    }
}
