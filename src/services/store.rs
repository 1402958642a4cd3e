use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::job::{Job, JobState, JobStatus};

/// Keyed storage for classification jobs.
///
/// Every mutation is a single atomic update of one record. Only `pending`
/// jobs can be marked, so a terminal job never changes again.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new `pending` job.
    async fn create(&self, id: Uuid) -> Result<(), StoreError>;

    /// Transition a pending job to `done`.
    async fn mark_done(&self, id: Uuid, label: &str, score: f64) -> Result<(), StoreError>;

    /// Transition a pending job to `error`.
    async fn mark_error(&self, id: Uuid, detail: &str) -> Result<(), StoreError>;

    /// Look up a job by id.
    async fn get(&self, id: Uuid) -> Result<Job, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("job {0} already exists")]
    DuplicateKey(Uuid),

    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("job {id} is already {status}")]
    AlreadyFinished { id: Uuid, status: JobStatus },

    #[error("job {id} has an invalid stored row: {reason}")]
    InvalidRow { id: Uuid, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Process-local job store.
///
/// Jobs live only as long as the process. Used when no database is configured
/// and throughout the test suite.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn finish(&self, id: Uuid, state: JobState) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if job.status().is_terminal() {
            return Err(StoreError::AlreadyFinished {
                id,
                status: job.status(),
            });
        }
        job.state = state;
        job.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, id: Uuid) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&id) {
            return Err(StoreError::DuplicateKey(id));
        }
        let now = Utc::now();
        jobs.insert(
            id,
            Job {
                id,
                state: JobState::Pending,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn mark_done(&self, id: Uuid, label: &str, score: f64) -> Result<(), StoreError> {
        self.finish(
            id,
            JobState::Done {
                label: label.to_string(),
                score,
            },
        )
        .await
    }

    async fn mark_error(&self, id: Uuid, detail: &str) -> Result<(), StoreError> {
        self.finish(
            id,
            JobState::Error {
                detail: detail.to_string(),
            },
        )
        .await
    }

    async fn get(&self, id: Uuid) -> Result<Job, StoreError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }
}
