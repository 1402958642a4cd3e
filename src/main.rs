use cattle_classify::{
    app_state::AppState,
    config::AppConfig,
    db::{self, queries::PgJobStore},
    routes,
    services::{
        inference::InferenceClient,
        processor::JobProcessor,
        store::{JobStore, MemoryJobStore},
    },
};
use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::PgPool;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");
    let labels = config.label_table().expect("LABELS must name at least one class");

    tracing::info!(labels = labels.len(), "Initializing classification server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!(
        "classification_jobs_submitted_total",
        "Total classification jobs submitted"
    );
    metrics::describe_counter!(
        "classification_jobs_completed_total",
        "Total classification jobs that reached done"
    );
    metrics::describe_counter!(
        "classification_jobs_failed_total",
        "Total classification jobs that reached error"
    );
    metrics::describe_gauge!(
        "classification_jobs_in_flight",
        "Jobs currently being processed"
    );
    metrics::describe_histogram!(
        "classification_processing_seconds",
        "Time from dispatch to a terminal job state"
    );

    // Initialize job store
    let (store, db_pool): (Arc<dyn JobStore>, Option<PgPool>) = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to PostgreSQL database");
            let pool = db::init_pool(url)
                .await
                .expect("Failed to connect to database");

            tracing::info!("Running database migrations");
            db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");

            let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(pool.clone()));
            (store, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, jobs will be kept in memory only");
            let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
            (store, None)
        }
    };

    // Initialize inference client
    match config.inference_timeout() {
        Some(timeout) => tracing::info!(
            url = %config.inference_url,
            timeout_secs = timeout.as_secs(),
            "Initializing inference client"
        ),
        None => tracing::warn!(
            url = %config.inference_url,
            "Inference client has no request timeout; a hung endpoint leaves jobs pending"
        ),
    }
    let inference = InferenceClient::new(
        config.inference_url.clone(),
        labels.len(),
        config.inference_timeout(),
    )
    .expect("Failed to initialize inference client");

    let processor = JobProcessor::new(store.clone(), inference, labels);
    let state = AppState::new(store, processor);

    let app = routes::router(state, prometheus_handle, config.max_upload_bytes);

    tracing::info!("Starting classification server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // In-flight processor tasks are not awaited; their jobs stay pending.
    if let Some(pool) = db_pool {
        tracing::info!("Closing database pool");
        pool.close().await;
    }

    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
