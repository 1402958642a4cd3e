use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::services::normalizer::NormalizedImage;

/// Longest slice of an error response body kept in job details.
const MAX_ERROR_BODY: usize = 512;

/// Client for a TensorFlow Serving style `:predict` endpoint.
///
/// No request timeout is set unless one is configured, so a hung endpoint
/// can hold a call open indefinitely. Calls only happen on background
/// processor tasks.
pub struct InferenceClient {
    http: Client,
    url: String,
    expected_classes: usize,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: [&'a NormalizedImage; 1],
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f64>>,
}

impl InferenceClient {
    pub fn new(
        url: impl Into<String>,
        expected_classes: usize,
        timeout: Option<Duration>,
    ) -> Result<Self, InferenceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            url: url.into(),
            expected_classes,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one image as a single-instance batch and return its class scores.
    pub async fn predict(&self, image: &NormalizedImage) -> Result<Vec<f64>, InferenceError> {
        let response = self
            .http
            .post(&self.url)
            .json(&PredictRequest { instances: [image] })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::HttpStatus {
                status,
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let body = response.bytes().await?;
        parse_predictions(&body, self.expected_classes)
    }
}

/// Validate a `{"predictions": [[...]]}` body and return the single score row.
pub fn parse_predictions(body: &[u8], expected_classes: usize) -> Result<Vec<f64>, InferenceError> {
    let parsed: PredictResponse = serde_json::from_slice(body)
        .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;

    let mut predictions = parsed.predictions;
    if predictions.len() != 1 {
        return Err(InferenceError::MalformedResponse(format!(
            "expected 1 prediction row, got {}",
            predictions.len()
        )));
    }

    let scores = predictions.remove(0);
    if scores.len() != expected_classes {
        return Err(InferenceError::MalformedResponse(format!(
            "expected {} scores, got {}",
            expected_classes,
            scores.len()
        )));
    }
    if let Some(bad) = scores.iter().find(|s| !(0.0..=1.0).contains(*s)) {
        return Err(InferenceError::MalformedResponse(format!(
            "score {} is outside [0, 1]",
            bad
        )));
    }

    Ok(scores)
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("inference endpoint returned HTTP {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    #[error("malformed inference response: {0}")]
    MalformedResponse(String),
}
