//! Guarded sink dispatch.
//!
//! Each sink call runs as its own task under a timeout, so a hung sink,
//! an erroring sink or a panicking sink only affects its own delivery.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::evaluator::{AlertEvent, AlertKind};
use crate::sink::{ChatSink, PagerSink};

/// Default upper bound for a single sink call.
pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Which sink a delivery went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkTarget {
    Chat,
    Pager,
}

impl SinkTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkTarget::Chat => "chat",
            SinkTarget::Pager => "pager",
        }
    }
}

/// Result of one sink call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
    TimedOut,
    Panicked,
}

/// One sink call made for one alert event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub event: AlertEvent,
    pub target: SinkTarget,
    pub outcome: DeliveryOutcome,
}

/// Routes alert events to the chat and pager sinks.
///
/// Fewer-units events go to both sinks; more-units events go to the
/// pager only.
#[derive(Clone)]
pub struct Dispatcher {
    chat: Arc<dyn ChatSink>,
    pager: Arc<dyn PagerSink>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(chat: Arc<dyn ChatSink>, pager: Arc<dyn PagerSink>) -> Self {
        Self {
            chat,
            pager,
            timeout: DEFAULT_SINK_TIMEOUT,
        }
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sinks an event of `kind` is delivered to.
    pub fn targets(kind: AlertKind) -> &'static [SinkTarget] {
        match kind {
            AlertKind::FewerUnits => &[SinkTarget::Chat, SinkTarget::Pager],
            AlertKind::MoreUnits => &[SinkTarget::Pager],
        }
    }

    /// Deliver every event to its sinks.
    ///
    /// All calls start at once; this returns when each has finished or
    /// timed out, so it never waits much longer than one timeout.
    pub async fn dispatch(&self, events: &[AlertEvent]) -> Vec<Delivery> {
        let mut pending: Vec<(AlertEvent, SinkTarget, JoinHandle<DeliveryOutcome>)> = Vec::new();

        for event in events {
            for &target in Self::targets(event.kind) {
                let handle = self.spawn_call(event.clone(), target);
                pending.push((event.clone(), target, handle));
            }
        }

        let mut deliveries = Vec::with_capacity(pending.len());
        for (event, target, handle) in pending {
            let outcome = handle.await.unwrap_or_else(|e| {
                if e.is_panic() {
                    DeliveryOutcome::Panicked
                } else {
                    DeliveryOutcome::Failed(e.to_string())
                }
            });

            match &outcome {
                DeliveryOutcome::Delivered => {
                    debug!(component = %event.component, sink = target.as_str(), "alert delivered");
                }
                DeliveryOutcome::Failed(reason) => {
                    warn!(component = %event.component, sink = target.as_str(), %reason, "alert delivery failed");
                }
                DeliveryOutcome::TimedOut => {
                    warn!(
                        component = %event.component,
                        sink = target.as_str(),
                        timeout = ?self.timeout,
                        "alert delivery timed out"
                    );
                }
                DeliveryOutcome::Panicked => {
                    warn!(component = %event.component, sink = target.as_str(), "alert sink panicked");
                }
            }

            deliveries.push(Delivery {
                event,
                target,
                outcome,
            });
        }
        deliveries
    }

    fn spawn_call(&self, event: AlertEvent, target: SinkTarget) -> JoinHandle<DeliveryOutcome> {
        let chat = Arc::clone(&self.chat);
        let pager = Arc::clone(&self.pager);
        let timeout = self.timeout;

        tokio::spawn(async move {
            let AlertEvent {
                component,
                kind,
                expected,
                actual,
            } = event;

            let call = async {
                match (target, kind) {
                    (SinkTarget::Chat, _) => {
                        chat.notify_fewer_units(&component, expected, actual).await
                    }
                    (SinkTarget::Pager, AlertKind::FewerUnits) => {
                        pager.notify_fewer_units(&component, expected, actual).await
                    }
                    (SinkTarget::Pager, AlertKind::MoreUnits) => {
                        pager.notify_more_units(&component, expected, actual).await
                    }
                }
            };

            match tokio::time::timeout(timeout, call).await {
                Ok(Ok(())) => DeliveryOutcome::Delivered,
                Ok(Err(e)) => DeliveryOutcome::Failed(e.to_string()),
                Err(_) => DeliveryOutcome::TimedOut,
            }
        })
    }
}
