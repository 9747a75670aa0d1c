use std::sync::Arc;

use crate::services::{queue::JobQueue, registry::JobRegistry};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub queue: JobQueue,
    pub api_key: Arc<str>,
}

impl AppState {
    pub fn new(registry: Arc<JobRegistry>, queue: JobQueue, api_key: &str) -> Self {
        Self {
            registry,
            queue,
            api_key: Arc::from(api_key),
        }
    }
}
