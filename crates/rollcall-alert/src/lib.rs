//! rollcall-alert — floor comparison and alert delivery.
//!
//! Once per tick the evaluator compares every known component's alive
//! count with its rolling floor and notifies the sinks about deviations.
//!
//! # Architecture
//!
//! ```text
//! AlertTicker (background task, 1m period)
//!   └── Evaluator::tick(now)
//!       ├── per component:
//!       │   ├── HeartbeatStore::alive_count → current
//!       │   ├── RollingFloorTracker::floor  → floor
//!       │   ├── compare(current, floor)     → Option<AlertKind>
//!       │   └── RollingFloorTracker::record(current)
//!       └── Dispatcher::dispatch(events)
//!           ├── FewerUnits → ChatSink + PagerSink
//!           └── MoreUnits  → PagerSink
//! ```
//!
//! # Alert semantics
//!
//! Alerts are level-triggered: a condition that persists fires again on
//! every tick. A component seen for the first time has an empty history,
//! so its floor is 0 and its first tick pages "more units".
//!
//! Every sink call runs in its own task under a timeout; failures are
//! logged and reported in the `TickReport`, never propagated.

pub mod dispatch;
pub mod evaluator;
pub mod sink;
pub mod ticker;

#[cfg(test)]
mod testing;

pub use dispatch::{DEFAULT_SINK_TIMEOUT, Delivery, DeliveryOutcome, Dispatcher, SinkTarget};
pub use evaluator::{AlertEvent, AlertKind, Evaluator, TickReport, compare};
pub use sink::{ChatSink, LogSink, PagerSink, SinkError, SinkFuture};
pub use ticker::{AlertTicker, DEFAULT_TICK_INTERVAL, TickObserver};
