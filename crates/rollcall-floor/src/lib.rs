//! rollcall-floor — rolling instance count history per component.
//!
//! Each evaluation tick appends one `Snapshot` per component. The history
//! is bounded by count (15 by default), not by wall-clock age, so with a
//! fixed tick period it covers roughly the last 15 ticks. The *floor* is
//! the smallest count still retained, or 0 before anything was recorded.

pub mod tracker;

pub use tracker::{DEFAULT_HISTORY_CAPACITY, RollingFloorTracker, Snapshot};
