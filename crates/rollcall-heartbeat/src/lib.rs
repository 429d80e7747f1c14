//! rollcall-heartbeat — liveness tracking for running units.
//!
//! Every component owns a set of server ids, each with a sliding expiry
//! that is pushed forward on every checkin. A server is alive until its
//! expiry passes; counts filter expired entries at read time, and a
//! periodic reaper removes them physically.
//!
//! # Architecture
//!
//! ```text
//! HeartbeatStore
//!   ├── RwLock<HashMap<ComponentKey, slot>>   (write-locked only on first checkin)
//!   └── slot: Mutex<HashMap<ServerId, expires_at>>
//! ```

pub mod store;

pub use store::{DEFAULT_TTL, HeartbeatStore};
