//! Axum route handlers for the matching and assessment API.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assessment::model::CandidateAssessment;
use crate::assessment::normalizer::{normalize_detailed, NormalizationTier};
use crate::errors::AppError;
use crate::matching::criteria::{parse, Criteria};
use crate::matching::features::{extract, ExtractedFeatures};
use crate::matching::scorer::{GateDecision, ScoreWeights};
use crate::matching::taxonomy::SkillId;
use crate::pipeline::batch::{
    analyze_candidate, run_batch, BatchOptions, BatchReport, CandidateInput, JobContext,
    ModelStage,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseCriteriaRequest {
    pub criteria_text: String,
}

#[derive(Debug, Serialize)]
pub struct NormalizeResponse {
    pub assessment: CandidateAssessment,
    pub tier: NormalizationTier,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub job_text: String,
    pub cv_text: String,
    #[serde(default)]
    pub criteria_text: String,
    pub weights: Option<ScoreWeights>,
    pub alpha: Option<f64>,
    #[serde(default)]
    pub use_model: bool,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub assessment: CandidateAssessment,
    pub gate: GateDecision,
    pub matched: Vec<SkillId>,
    pub missing: Vec<String>,
    pub model_used: bool,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub job_text: String,
    #[serde(default)]
    pub criteria_text: String,
    pub candidates: Vec<CandidateInput>,
    pub weights: Option<ScoreWeights>,
    pub alpha: Option<f64>,
    pub dedupe: Option<bool>,
    #[serde(default)]
    pub anonymize: bool,
    pub min_score: Option<u8>,
    #[serde(default)]
    pub use_model: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/features/extract
pub async fn handle_extract(Json(request): Json<ExtractRequest>) -> Json<ExtractedFeatures> {
    Json(extract(&request.text))
}

/// POST /api/v1/criteria/parse
pub async fn handle_parse_criteria(Json(request): Json<ParseCriteriaRequest>) -> Json<Criteria> {
    Json(parse(&request.criteria_text))
}

/// POST /api/v1/assessments/normalize
///
/// Repairs any JSON value into a canonical assessment. Never fails on content.
pub async fn handle_normalize(Json(raw): Json<Value>) -> Json<NormalizeResponse> {
    let (assessment, tier) = normalize_detailed(&raw);
    Json(NormalizeResponse { assessment, tier })
}

/// POST /api/v1/assessments/score
///
/// Scores a single CV. The model blend is used only when requested and enabled.
pub async fn handle_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    if request.job_text.trim().is_empty() {
        return Err(AppError::Validation("job_text cannot be empty".to_string()));
    }

    let ctx = job_context(
        &state,
        request.job_text,
        request.criteria_text,
        request.weights,
        request.alpha,
    );
    let model = model_stage(&state, request.use_model);

    let scored = analyze_candidate(
        Arc::new(ctx),
        0,
        "candidat-1".to_string(),
        request.cv_text,
        model,
    )
    .await?;

    Ok(Json(ScoreResponse {
        assessment: scored.assessment,
        gate: scored.gate,
        matched: scored.matched,
        missing: scored.missing,
        model_used: scored.model_used,
    }))
}

/// POST /api/v1/assessments/batch
///
/// Scores every candidate against one job posting and returns them ranked,
/// with skipped inputs and a summary.
pub async fn handle_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchReport>, AppError> {
    let options = BatchOptions {
        dedupe: request.dedupe.unwrap_or(state.config.dedupe_enabled),
        anonymize: request.anonymize,
        min_score: request.min_score,
        max_workers: state.config.max_workers,
        qualify_threshold: state.config.qualify_threshold,
    };
    let ctx = job_context(
        &state,
        request.job_text,
        request.criteria_text,
        request.weights,
        request.alpha,
    );
    let model = model_stage(&state, request.use_model);

    let report = run_batch(ctx, request.candidates, model, &options).await?;
    Ok(Json(report))
}

fn job_context(
    state: &AppState,
    job_text: String,
    criteria_text: String,
    weights: Option<ScoreWeights>,
    alpha: Option<f64>,
) -> JobContext {
    JobContext::new(
        job_text,
        criteria_text,
        weights.unwrap_or(state.config.weights),
        alpha.unwrap_or(state.config.hybrid_alpha),
        state.config.policy.clone(),
    )
}

fn model_stage(state: &AppState, use_model: bool) -> Option<ModelStage> {
    (use_model && state.model.enabled()).then(|| ModelStage {
        assessor: Arc::clone(&state.model),
        timeout: Duration::from_secs(state.config.model_timeout_secs),
    })
}
