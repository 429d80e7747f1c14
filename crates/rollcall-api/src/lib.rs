//! rollcall-api — REST API for rollcall.
//!
//! Receives heartbeats from running units and exposes the current view of
//! every known component.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/v1/checkin` | Report a running unit as alive |
//! | GET | `/api/v1/components` | Alive count, floor and history per component |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;
pub mod prometheus;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use rollcall_floor::RollingFloorTracker;
use rollcall_heartbeat::HeartbeatStore;

pub use handlers::ComponentStatus;
pub use prometheus::render_prometheus;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub heartbeats: Arc<HeartbeatStore>,
    pub floors: Arc<RollingFloorTracker>,
}

/// Build the complete API router.
pub fn build_router(heartbeats: Arc<HeartbeatStore>, floors: Arc<RollingFloorTracker>) -> Router {
    let state = ApiState { heartbeats, floors };

    let api_routes = Router::new()
        .route("/checkin", post(handlers::checkin))
        .route("/components", get(handlers::list_components))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::prometheus_metrics).with_state(state))
}
