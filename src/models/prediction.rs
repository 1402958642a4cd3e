use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{Job, JobState};

/// Response after submitting an image for classification.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: Uuid,
}

/// Response for querying job status.
///
/// Only the fields valid for the current status are ever serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatusResponse {
    Pending,
    Done {
        #[serde(rename = "class")]
        label: String,
        score: f64,
    },
    Error {
        detail: String,
    },
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        match job.state {
            JobState::Pending => JobStatusResponse::Pending,
            JobState::Done { label, score } => JobStatusResponse::Done { label, score },
            JobState::Error { detail } => JobStatusResponse::Error { detail },
        }
    }
}

/// Error body returned by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pending_exposes_status_only() {
        let body = serde_json::to_value(JobStatusResponse::Pending).unwrap();
        assert_eq!(body, json!({ "status": "pending" }));
    }

    #[test]
    fn test_done_uses_class_key() {
        let body = serde_json::to_value(JobStatusResponse::Done {
            label: "Highland".to_string(),
            score: 0.75,
        })
        .unwrap();
        assert_eq!(body, json!({ "status": "done", "class": "Highland", "score": 0.75 }));
    }

    #[test]
    fn test_error_exposes_detail_only() {
        let body = serde_json::to_value(JobStatusResponse::Error {
            detail: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(body, json!({ "status": "error", "detail": "boom" }));
    }
}
