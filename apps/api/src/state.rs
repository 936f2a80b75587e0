use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::model_assessor::ModelAssessor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Pluggable model collaborator. `DisabledModelAssessor` when no API key is set.
    pub model: Arc<dyn ModelAssessor>,
}
