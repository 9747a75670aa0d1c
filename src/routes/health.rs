use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;
use crate::services::registry::JobCounts;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub jobs: JobCounts,
    pub queue: QueueHealth,
}

#[derive(Serialize)]
pub struct QueueHealth {
    pub depth: usize,
    pub capacity: usize,
}

/// GET /health — liveness plus job and queue totals.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let depth = state.queue.depth();
    metrics::gauge!("ad_queue_depth").set(depth as f64);

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        jobs: state.registry.counts(),
        queue: QueueHealth {
            depth,
            capacity: state.queue.capacity(),
        },
    })
}
