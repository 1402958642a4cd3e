use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::job::{Job, JobState, JobStatus};
use crate::services::store::{JobStore, StoreError};

/// Postgres-backed job store over the `jobs` table.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Work out why a pending-only update touched no row.
    async fn explain_missed_update(&self, id: Uuid) -> StoreError {
        match self.get(id).await {
            Ok(job) => StoreError::AlreadyFinished {
                id,
                status: job.status(),
            },
            Err(e) => e,
        }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO jobs (job_id, status)
            VALUES ($1, 'pending')
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateKey(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn mark_done(&self, id: Uuid, label: &str, score: f64) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'done', label = $2, score = $3, updated_at = NOW()
            WHERE job_id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(label)
        .bind(score)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.explain_missed_update(id).await);
        }
        Ok(())
    }

    async fn mark_error(&self, id: Uuid, detail: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'error', detail = $2, updated_at = NOW()
            WHERE job_id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(detail)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.explain_missed_update(id).await);
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Job, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT job_id, status, label, score, detail, created_at, updated_at
            FROM jobs
            WHERE job_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => job_from_row(&r),
            None => Err(StoreError::NotFound(id)),
        }
    }
}

fn job_from_row(r: &PgRow) -> Result<Job, StoreError> {
    let id: Uuid = r.try_get("job_id")?;
    let status_str: String = r.try_get("status")?;
    let status: JobStatus = status_str.parse().map_err(|_| StoreError::InvalidRow {
        id,
        reason: format!("unknown status '{}'", status_str),
    })?;

    let label: Option<String> = r.try_get("label")?;
    let score: Option<f64> = r.try_get("score")?;
    let detail: Option<String> = r.try_get("detail")?;

    let state = match (status, label, score, detail) {
        (JobStatus::Pending, None, None, None) => JobState::Pending,
        (JobStatus::Done, Some(label), Some(score), None) => JobState::Done { label, score },
        (JobStatus::Error, None, None, Some(detail)) => JobState::Error { detail },
        (status, ..) => {
            return Err(StoreError::InvalidRow {
                id,
                reason: format!("fields do not match status '{}'", status),
            })
        }
    };

    Ok(Job {
        id,
        state,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}
