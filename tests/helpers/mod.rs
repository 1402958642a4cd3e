//! Test helpers: a mock inference endpoint and an in-process API server

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use cattle_classify::{
    app_state::AppState,
    models::prediction::{JobStatusResponse, SubmitResponse},
    routes,
    services::{
        inference::InferenceClient, labels::LabelTable, processor::JobProcessor,
        store::MemoryJobStore,
    },
};
use metrics_exporter_prometheus::PrometheusBuilder;
use reqwest::multipart;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;
use uuid::Uuid;

/// How the mock inference endpoint answers.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always return this score row.
    Scores(Vec<f64>),
    /// Score the dominant channel of the center pixel (R, G, B -> labels 0, 1, 2).
    DominantChannel,
    /// Respond with this status and a text body.
    Status(u16),
    /// Respond 200 with this raw body.
    RawBody(&'static str),
    /// Never respond.
    Hang,
}

pub struct MockInference {
    pub url: String,
    pub calls: Arc<AtomicUsize>,
}

#[derive(Deserialize)]
struct MockRequest {
    instances: Vec<Vec<Vec<Vec<f32>>>>,
}

struct MockState {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
}

async fn mock_predict(State(state): State<Arc<MockState>>, Json(body): Json<MockRequest>) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);

    assert_eq!(body.instances.len(), 1, "expected a single-instance batch");
    let tensor = &body.instances[0];
    assert_eq!(tensor.len(), 224);
    assert!(tensor.iter().all(|row| row.len() == 224));
    assert!(tensor.iter().flatten().all(|px| px.len() == 3));

    match &state.behavior {
        MockBehavior::Scores(scores) => {
            Json(serde_json::json!({ "predictions": [scores] })).into_response()
        }
        MockBehavior::DominantChannel => {
            let pixel = &tensor[112][112];
            let mut best = 0;
            for c in 1..3 {
                if pixel[c] > pixel[best] {
                    best = c;
                }
            }
            let mut scores = vec![0.02; 6];
            scores[best] = 0.9;
            Json(serde_json::json!({ "predictions": [scores] })).into_response()
        }
        MockBehavior::Status(code) => {
            let status = StatusCode::from_u16(*code).expect("valid status code");
            (status, "model exploded").into_response()
        }
        MockBehavior::RawBody(body) => (StatusCode::OK, *body).into_response(),
        MockBehavior::Hang => {
            std::future::pending::<()>().await;
            StatusCode::OK.into_response()
        }
    }
}

/// Start a mock TensorFlow Serving style endpoint on an ephemeral port.
pub async fn spawn_mock_inference(behavior: MockBehavior) -> MockInference {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = Arc::new(MockState {
        behavior,
        calls: calls.clone(),
    });

    let app = Router::new()
        .route("/v1/models/cattle:predict", post(mock_predict))
        .with_state(state)
        // A JSON-encoded 224x224x3 tensor is close to axum's default limit.
        .layer(DefaultBodyLimit::disable());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock");
    let addr = listener.local_addr().expect("mock addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });

    MockInference {
        url: format!("http://{}/v1/models/cattle:predict", addr),
        calls,
    }
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryJobStore>,
}

/// Start the API on an ephemeral port, backed by an in-memory store.
pub async fn spawn_app(inference_url: &str) -> TestApp {
    let store = Arc::new(MemoryJobStore::new());
    let labels = LabelTable::default();
    let inference =
        InferenceClient::new(inference_url, labels.len(), None).expect("inference client");
    let processor = JobProcessor::new(store.clone(), inference, labels);
    let state = AppState::new(store.clone(), processor);

    let prometheus = Arc::new(PrometheusBuilder::new().build_recorder().handle());
    let app = routes::router(state, prometheus, 10 * 1024 * 1024);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind app");
    let addr = listener.local_addr().expect("app addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("app server");
    });

    TestApp {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        store,
    }
}

impl TestApp {
    /// Upload image bytes to POST /predict-image.
    pub async fn upload_image(&self, bytes: Vec<u8>) -> SubmitResponse {
        let form = multipart::Form::new().part(
            "file",
            multipart::Part::bytes(bytes)
                .file_name("upload.jpg")
                .mime_str("image/jpeg")
                .expect("mime"),
        );

        let response = self
            .client
            .post(format!("{}/predict-image", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("upload request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("submit response")
    }

    pub async fn get_status_raw(&self, job_id: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/predict-status/{}", self.base_url, job_id))
            .send()
            .await
            .expect("status request")
    }

    pub async fn get_status(&self, job_id: Uuid) -> JobStatusResponse {
        let response = self.get_status_raw(&job_id.to_string()).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("status response")
    }

    /// Poll until the job leaves `pending`.
    pub async fn wait_for_terminal(&self, job_id: Uuid) -> JobStatusResponse {
        for _ in 0..200 {
            let status = self.get_status(job_id).await;
            if status != JobStatusResponse::Pending {
                return status;
            }
            sleep(Duration::from_millis(50)).await;
        }
        panic!("job {} did not finish within 10 seconds", job_id);
    }
}
