//! In-memory sinks for unit tests.

use std::sync::{Arc, Mutex};

use rollcall_core::ComponentKey;

use crate::evaluator::AlertKind;
use crate::sink::{ChatSink, PagerSink, SinkError, SinkFuture};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkCall {
    pub component: String,
    pub kind: AlertKind,
    pub expected: usize,
    pub actual: usize,
}

impl SinkCall {
    pub fn fewer(component: &str, expected: usize, actual: usize) -> Self {
        Self {
            component: component.to_string(),
            kind: AlertKind::FewerUnits,
            expected,
            actual,
        }
    }

    pub fn more(component: &str, expected: usize, actual: usize) -> Self {
        Self {
            component: component.to_string(),
            kind: AlertKind::MoreUnits,
            expected,
            actual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    Hang,
    Panic,
}

/// Records every call, then behaves as configured.
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    behavior: Behavior,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Self::with_behavior(Behavior::Succeed)
    }

    pub fn with_behavior(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            behavior,
        })
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    fn handle<'a>(
        &'a self,
        component: &'a ComponentKey,
        kind: AlertKind,
        expected: usize,
        actual: usize,
    ) -> SinkFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(SinkCall {
                component: component.to_string(),
                kind,
                expected,
                actual,
            });
            match self.behavior {
                Behavior::Succeed => Ok(()),
                Behavior::Fail => Err(SinkError::Delivery("sink unavailable".to_string())),
                Behavior::Hang => std::future::pending().await,
                Behavior::Panic => panic!("sink exploded"),
            }
        })
    }
}

impl ChatSink for RecordingSink {
    fn notify_fewer_units<'a>(
        &'a self,
        component: &'a ComponentKey,
        expected: usize,
        actual: usize,
    ) -> SinkFuture<'a> {
        self.handle(component, AlertKind::FewerUnits, expected, actual)
    }
}

impl PagerSink for RecordingSink {
    fn notify_fewer_units<'a>(
        &'a self,
        component: &'a ComponentKey,
        expected: usize,
        actual: usize,
    ) -> SinkFuture<'a> {
        self.handle(component, AlertKind::FewerUnits, expected, actual)
    }

    fn notify_more_units<'a>(
        &'a self,
        component: &'a ComponentKey,
        expected: usize,
        actual: usize,
    ) -> SinkFuture<'a> {
        self.handle(component, AlertKind::MoreUnits, expected, actual)
    }
}
