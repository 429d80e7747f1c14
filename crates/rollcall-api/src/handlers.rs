//! REST API handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use rollcall_core::{RunningUnit, ServerId};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// Current view of one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentStatus {
    pub environment: String,
    pub system: String,
    pub component: String,
    pub alive: usize,
    pub servers: Vec<ServerId>,
    pub floor: usize,
    /// Retained snapshot counts, oldest first.
    pub history: Vec<usize>,
}

/// Status of every known component at `now`, sorted by key.
pub async fn collect_status(state: &ApiState, now: Instant) -> Vec<ComponentStatus> {
    let mut keys = state.heartbeats.components().await;
    keys.sort();

    let mut statuses = Vec::with_capacity(keys.len());
    for key in keys {
        let servers = state.heartbeats.alive_servers(&key, now).await;
        let history = state
            .floors
            .history(&key)
            .await
            .into_iter()
            .map(|s| s.count)
            .collect();
        statuses.push(ComponentStatus {
            environment: key.environment().to_string(),
            system: key.system().to_string(),
            component: key.component().to_string(),
            alive: servers.len(),
            servers,
            floor: state.floors.floor(&key).await,
            history,
        });
    }
    statuses
}

// ── Checkins ───────────────────────────────────────────────────

/// POST /api/v1/checkin
pub async fn checkin(
    State(state): State<ApiState>,
    Json(unit): Json<RunningUnit>,
) -> impl IntoResponse {
    if let Err(e) = unit.validate() {
        return error_response(&e.to_string(), StatusCode::BAD_REQUEST).into_response();
    }

    state.heartbeats.checkin_unit(&unit, Instant::now()).await;
    debug!(
        environment = %unit.environment,
        system = %unit.system,
        component = %unit.component,
        server = %unit.server,
        "checkin received"
    );
    (StatusCode::ACCEPTED, ApiResponse::ok("accepted")).into_response()
}

// ── Components ─────────────────────────────────────────────────

/// GET /api/v1/components
pub async fn list_components(State(state): State<ApiState>) -> impl IntoResponse {
    let statuses = collect_status(&state, Instant::now()).await;
    ApiResponse::ok(statuses).into_response()
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let statuses = collect_status(&state, Instant::now()).await;
    let body = crate::prometheus::render_prometheus(&statuses);
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
