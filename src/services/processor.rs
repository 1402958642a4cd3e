use axum::body::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinHandle};
use uuid::Uuid;

use crate::models::job::JobStatus;
use crate::services::inference::{InferenceClient, InferenceError};
use crate::services::labels::{LabelError, LabelTable, Prediction};
use crate::services::normalizer::{self, NormalizeError};
use crate::services::store::{JobStore, StoreError};

/// Turns a pending job into a terminal one: normalize, infer, pick a label,
/// persist. Every run is a single attempt.
pub struct JobProcessor {
    store: Arc<dyn JobStore>,
    inference: InferenceClient,
    labels: LabelTable,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error("image preprocessing task failed: {0}")]
    Preprocess(#[from] JoinError),
}

impl JobProcessor {
    pub fn new(store: Arc<dyn JobStore>, inference: InferenceClient, labels: LabelTable) -> Self {
        Self {
            store,
            inference,
            labels,
        }
    }

    /// Run the processor for `job_id` on a background task.
    ///
    /// The handle is only for callers that want to wait; dropping it leaves
    /// the task running.
    pub fn dispatch(self: &Arc<Self>, job_id: Uuid, image: Bytes) -> JoinHandle<Option<JobStatus>> {
        let processor = Arc::clone(self);
        tokio::spawn(async move { processor.process(job_id, image).await })
    }

    /// Process one job to completion. Failures end up on the job record.
    ///
    /// Returns the terminal status that was persisted, or `None` when the
    /// store rejected the write.
    pub async fn process(&self, job_id: Uuid, image: Bytes) -> Option<JobStatus> {
        let start = Instant::now();
        metrics::gauge!("classification_jobs_in_flight").increment(1.0);

        let persisted = match self.classify(job_id, image).await {
            Ok(prediction) => self
                .store
                .mark_done(job_id, &prediction.label, prediction.score)
                .await
                .map(|()| {
                    tracing::info!(
                        job_id = %job_id,
                        label = %prediction.label,
                        score = prediction.score,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Job completed"
                    );
                    metrics::counter!("classification_jobs_completed_total").increment(1);
                    JobStatus::Done
                }),
            Err(e) => {
                tracing::error!(
                    job_id = %job_id,
                    error = %e,
                    error_debug = ?e,
                    "Job processing failed"
                );
                self.store
                    .mark_error(job_id, &e.to_string())
                    .await
                    .map(|()| {
                        metrics::counter!("classification_jobs_failed_total").increment(1);
                        JobStatus::Error
                    })
            }
        };

        metrics::gauge!("classification_jobs_in_flight").decrement(1.0);
        metrics::histogram!("classification_processing_seconds")
            .record(start.elapsed().as_secs_f64());

        match persisted {
            Ok(status) => Some(status),
            Err(e) => {
                log_persist_failure(job_id, &e);
                None
            }
        }
    }

    async fn classify(&self, job_id: Uuid, image: Bytes) -> Result<Prediction, ProcessError> {
        tracing::debug!(job_id = %job_id, bytes = image.len(), "Normalizing image");
        let tensor = tokio::task::spawn_blocking(move || normalizer::normalize(&image)).await??;

        tracing::debug!(job_id = %job_id, url = %self.inference.url(), "Calling inference endpoint");
        let scores = self.inference.predict(&tensor).await?;

        Ok(self.labels.classify(&scores)?)
    }
}

fn log_persist_failure(job_id: Uuid, error: &StoreError) {
    match error {
        StoreError::AlreadyFinished { status, .. } => {
            tracing::warn!(job_id = %job_id, status = %status, "Job was already finished, result dropped")
        }
        _ => tracing::error!(job_id = %job_id, error = %error, "Failed to persist job outcome"),
    }
}
