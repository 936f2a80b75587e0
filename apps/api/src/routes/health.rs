use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::matching::taxonomy::TAXONOMY_VERSION;
use crate::state::AppState;

/// GET /health
/// Returns service version, taxonomy version and the active model backend.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "recruiter-api",
        "taxonomy_version": TAXONOMY_VERSION,
        "model_backend": state.model.backend()
    }))
}
