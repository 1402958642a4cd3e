use serde::Deserialize;
use std::time::Duration;

use crate::services::labels::{LabelError, LabelTable, DEFAULT_LABELS};

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string. Jobs are kept in memory when unset.
    pub database_url: Option<String>,

    /// Full URL of the model's predict endpoint
    pub inference_url: String,

    /// Comma-separated class names, in model output order
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,

    /// Per-request timeout for inference calls. No timeout when unset.
    pub inference_timeout_secs: Option<u64>,

    /// Maximum accepted request body size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|l| l.to_string()).collect()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn label_table(&self) -> Result<LabelTable, LabelError> {
        LabelTable::new(self.labels.clone())
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout_secs.map(Duration::from_secs)
    }
}
