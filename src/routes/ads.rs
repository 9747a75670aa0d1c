use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::ApiKey;
use crate::error::{AppError, AppResult};
use crate::models::ad::{AdRequest, GenerateAdResponse, JobStatusResponse};
use crate::models::job::JobStatus;
use crate::services::queue::QueuedJob;

/// POST /generate-ad — Queue an ad for generation and return its job id.
pub async fn submit_ad(
    State(state): State<AppState>,
    _key: ApiKey,
    body: Result<Json<AdRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<GenerateAdResponse>)> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Reserve the queue slot first so a full queue leaves no orphaned record.
    let slot = state.queue.reserve()?;

    let job_id = Uuid::new_v4();
    state
        .registry
        .create(job_id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    slot.dispatch(QueuedJob { job_id, request });

    metrics::counter!("ad_jobs_submitted_total").increment(1);
    metrics::gauge!("ad_queue_depth").set(state.queue.depth() as f64);
    tracing::info!(job_id = %job_id, "Ad generation job queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateAdResponse {
            job_id,
            status: JobStatus::Processing,
        }),
    ))
}

/// GET /status/{job_id} — Current snapshot of a generation job.
pub async fn get_job_status(
    State(state): State<AppState>,
    _key: ApiKey,
    Path(job_id): Path<String>,
) -> AppResult<Json<JobStatusResponse>> {
    let job = Uuid::parse_str(&job_id)
        .ok()
        .and_then(|id| state.registry.get(id))
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    Ok(Json(JobStatusResponse::from(job)))
}
