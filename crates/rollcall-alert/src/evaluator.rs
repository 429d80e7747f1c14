//! Evaluator — compares live unit counts against the rolling floor.
//!
//! Each tick reads every known component's alive count, compares it with
//! the component's floor, records the count into the history, and hands
//! the resulting alert events to the dispatcher.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info};

use rollcall_core::ComponentKey;
use rollcall_floor::RollingFloorTracker;
use rollcall_heartbeat::HeartbeatStore;

use crate::dispatch::{Delivery, DeliveryOutcome, Dispatcher};

/// Direction of a deviation from the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Fewer units alive than the floor.
    FewerUnits,
    /// More units alive than the floor.
    MoreUnits,
}

/// A deviation observed on one tick for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    pub component: ComponentKey,
    pub kind: AlertKind,
    /// The floor the count was compared against.
    pub expected: usize,
    /// Alive count at the tick.
    pub actual: usize,
}

/// Compare the current alive count against the floor.
///
/// Returns `None` when they are equal.
pub fn compare(current: usize, floor: usize) -> Option<AlertKind> {
    match current.cmp(&floor) {
        std::cmp::Ordering::Less => Some(AlertKind::FewerUnits),
        std::cmp::Ordering::Greater => Some(AlertKind::MoreUnits),
        std::cmp::Ordering::Equal => None,
    }
}

/// Everything that happened during one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Number of components evaluated.
    pub evaluated: usize,
    pub events: Vec<AlertEvent>,
    pub deliveries: Vec<Delivery>,
}

impl TickReport {
    /// Deliveries that did not succeed.
    pub fn failed_deliveries(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries
            .iter()
            .filter(|d| d.outcome != DeliveryOutcome::Delivered)
    }
}

/// Drives the floor comparison for every known component.
pub struct Evaluator {
    heartbeats: Arc<HeartbeatStore>,
    floors: Arc<RollingFloorTracker>,
    dispatcher: Dispatcher,
}

impl Evaluator {
    pub fn new(
        heartbeats: Arc<HeartbeatStore>,
        floors: Arc<RollingFloorTracker>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            heartbeats,
            floors,
            dispatcher,
        }
    }

    pub fn heartbeats(&self) -> &Arc<HeartbeatStore> {
        &self.heartbeats
    }

    pub fn floors(&self) -> &Arc<RollingFloorTracker> {
        &self.floors
    }

    /// Evaluate a single component at `now`.
    ///
    /// The alive count is recorded into the history whether or not it
    /// deviates from the floor.
    pub async fn evaluate_component(&self, key: &ComponentKey, now: Instant) -> Option<AlertEvent> {
        let current = self.heartbeats.alive_count(key, now).await;
        let floor = self.floors.floor(key).await;
        let kind = compare(current, floor);

        self.floors.record(key, current, now).await;

        match kind {
            Some(kind) => {
                debug!(component = %key, ?kind, expected = floor, actual = current, "unit count deviates from floor");
                Some(AlertEvent {
                    component: key.clone(),
                    kind,
                    expected: floor,
                    actual: current,
                })
            }
            None => None,
        }
    }

    /// Evaluate every known component, then deliver the alerts.
    ///
    /// Sinks are only called after all components have been evaluated,
    /// so sink trouble never skips a component.
    pub async fn tick(&self, now: Instant) -> TickReport {
        let mut components = self.heartbeats.components().await;
        components.sort();

        let mut events = Vec::new();
        for key in &components {
            if let Some(event) = self.evaluate_component(key, now).await {
                events.push(event);
            }
        }

        let deliveries = self.dispatcher.dispatch(&events).await;
        let report = TickReport {
            evaluated: components.len(),
            events,
            deliveries,
        };

        info!(
            components = report.evaluated,
            alerts = report.events.len(),
            failed_deliveries = report.failed_deliveries().count(),
            "evaluation tick complete"
        );
        report
    }
}
