use axum::extract::{Multipart, Path, State};
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::prediction::{JobStatusResponse, SubmitResponse};
use crate::routes::error::ApiError;

/// POST /predict-image — upload an image and get a job id back immediately.
///
/// The bytes are not inspected here; anything that fails to decode shows up
/// later as an `error` job.
pub async fn submit_prediction(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmitResponse>, ApiError> {
    let mut image_data = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            image_data = Some(field.bytes().await?);
        }
    }

    let image_data = image_data.ok_or(ApiError::MissingFile)?;
    let job_id = Uuid::new_v4();

    state.store.create(job_id).await?;
    metrics::counter!("classification_jobs_submitted_total").increment(1);

    tracing::info!(job_id = %job_id, bytes = image_data.len(), "Job submitted");

    // Fire and forget: the result is only observable through the store.
    state.processor.dispatch(job_id, image_data);

    Ok(Json(SubmitResponse { job_id }))
}

/// GET /predict-status/{job_id} — current state of a job.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    // An id that is not a UUID can never name a job.
    let job_id = Uuid::parse_str(&job_id).map_err(|_| ApiError::JobNotFound)?;
    let job = state.store.get(job_id).await?;

    Ok(Json(job.into()))
}
