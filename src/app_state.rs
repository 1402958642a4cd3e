use std::sync::Arc;

use crate::services::{processor::JobProcessor, store::JobStore};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub processor: Arc<JobProcessor>,
}

impl AppState {
    pub fn new(store: Arc<dyn JobStore>, processor: JobProcessor) -> Self {
        Self {
            store,
            processor: Arc::new(processor),
        }
    }
}
