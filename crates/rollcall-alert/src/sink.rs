//! Alert sink capabilities.
//!
//! Sinks are the notification channels the evaluator reports to. A
//! chat-style sink only hears about missing units; a paging-style sink
//! hears about both directions.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tracing::warn;

use rollcall_core::ComponentKey;

/// Future returned by every sink call.
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>>;

/// Failure reported by a sink implementation.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Chat-style notifications (e.g. a team channel).
pub trait ChatSink: Send + Sync {
    /// `component` is running fewer units than `expected`.
    fn notify_fewer_units<'a>(
        &'a self,
        component: &'a ComponentKey,
        expected: usize,
        actual: usize,
    ) -> SinkFuture<'a>;
}

/// Paging-style notifications (e.g. an on-call incident service).
pub trait PagerSink: Send + Sync {
    /// `component` is running fewer units than `expected`.
    fn notify_fewer_units<'a>(
        &'a self,
        component: &'a ComponentKey,
        expected: usize,
        actual: usize,
    ) -> SinkFuture<'a>;

    /// `component` is running more units than `expected`.
    fn notify_more_units<'a>(
        &'a self,
        component: &'a ComponentKey,
        expected: usize,
        actual: usize,
    ) -> SinkFuture<'a>;
}

/// Sink that writes alerts to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ChatSink for LogSink {
    fn notify_fewer_units<'a>(
        &'a self,
        component: &'a ComponentKey,
        expected: usize,
        actual: usize,
    ) -> SinkFuture<'a> {
        Box::pin(async move {
            warn!(
                sink = "chat",
                environment = component.environment(),
                system = component.system(),
                component = component.component(),
                expected,
                actual,
                "fewer running units than expected"
            );
            Ok(())
        })
    }
}

impl PagerSink for LogSink {
    fn notify_fewer_units<'a>(
        &'a self,
        component: &'a ComponentKey,
        expected: usize,
        actual: usize,
    ) -> SinkFuture<'a> {
        Box::pin(async move {
            warn!(
                sink = "pager",
                environment = component.environment(),
                system = component.system(),
                component = component.component(),
                expected,
                actual,
                "fewer running units than expected"
            );
            Ok(())
        })
    }

    fn notify_more_units<'a>(
        &'a self,
        component: &'a ComponentKey,
        expected: usize,
        actual: usize,
    ) -> SinkFuture<'a> {
        Box::pin(async move {
            warn!(
                sink = "pager",
                environment = component.environment(),
                system = component.system(),
                component = component.component(),
                expected,
                actual,
                "more running units than expected"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_sink_always_succeeds() {
        let key = ComponentKey::new("prod", "billing", "api");
        let sink = LogSink;

        assert!(ChatSink::notify_fewer_units(&sink, &key, 3, 2).await.is_ok());
        assert!(PagerSink::notify_fewer_units(&sink, &key, 3, 2).await.is_ok());
        assert!(sink.notify_more_units(&key, 0, 1).await.is_ok());
    }

    #[test]
    fn sink_error_display() {
        let err = SinkError::Delivery("webhook returned 503".to_string());
        assert_eq!(err.to_string(), "delivery failed: webhook returned 503");
    }
}
