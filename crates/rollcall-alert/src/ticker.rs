//! Alert ticker — the background task that runs the evaluator.
//!
//! The ticker is owned by whoever builds it: `start()` spawns the loop,
//! `stop()` signals it and waits for it to exit. Dropping a running
//! ticker aborts the task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::evaluator::{Evaluator, TickReport};

/// Default evaluation period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Optional observer invoked with every tick's report.
pub type TickObserver = Arc<dyn Fn(&TickReport) + Send + Sync>;

struct Running {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

/// Periodically runs `Evaluator::tick`.
pub struct AlertTicker {
    evaluator: Arc<Evaluator>,
    interval: Duration,
    observer: Option<TickObserver>,
    running: Option<Running>,
}

impl AlertTicker {
    pub fn new(evaluator: Arc<Evaluator>, interval: Duration) -> Self {
        Self {
            evaluator,
            interval,
            observer: None,
            running: None,
        }
    }

    /// Set an observer for tick reports.
    pub fn with_observer(mut self, observer: TickObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the tick loop. The first tick runs immediately.
    ///
    /// Calling `start` on a running ticker does nothing.
    pub fn start(&mut self) {
        if self.running.is_some() {
            warn!("alert ticker already running");
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let evaluator = Arc::clone(&self.evaluator);
        let observer = self.observer.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            run_tick_loop(evaluator, interval, observer, shutdown_rx).await;
        });

        self.running = Some(Running {
            handle,
            shutdown_tx,
        });
        info!(interval = ?self.interval, "alert ticker started");
    }

    /// Signal the loop to exit and wait for it.
    ///
    /// A tick already in progress finishes first.
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown_tx.send(true);
            if let Err(e) = running.handle.await {
                warn!(error = %e, "alert ticker task ended abnormally");
            }
            info!("alert ticker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }
}

impl Drop for AlertTicker {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown_tx.send(true);
            running.handle.abort();
        }
    }
}

async fn run_tick_loop(
    evaluator: Arc<Evaluator>,
    period: Duration,
    observer: Option<TickObserver>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = evaluator.tick(Instant::now()).await;
                if let Some(ref observe) = observer {
                    observe(&report);
                }
            }
            _ = shutdown.changed() => {
                debug!("alert tick loop shutting down");
                break;
            }
        }
    }
}
