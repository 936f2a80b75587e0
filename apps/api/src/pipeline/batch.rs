//! Batch pipeline — scores every CV of one job posting.
//!
//! Per candidate: feature extraction → rule scoring → optional model record
//! (normalized) → hybrid blend. Candidates run on a bounded worker pool; the
//! coordinating task alone owns the dedupe map, and ordering is computed only
//! once every task has finished.
//!
//! A candidate task either completes in full or contributes nothing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::assessment::dedup::{merge, DedupeKey, Ranked};
use crate::assessment::hybrid::{clamp_alpha, combine};
use crate::assessment::model::{CandidateAssessment, DEFAULT_CANDIDATE_NAME};
use crate::assessment::normalizer::normalize_detailed;
use crate::assessment::privacy::anonymize_infos;
use crate::assessment::rule::build_rule_assessment;
use crate::config::MAX_WORKERS_LIMIT;
use crate::errors::AppError;
use crate::matching::criteria::{parse, Criteria};
use crate::matching::features::{extract, ExtractedFeatures};
use crate::matching::scorer::{score_with_policy, GateDecision, ScoreWeights, ScoringPolicy};
use crate::matching::taxonomy::SkillId;
use crate::pipeline::model_assessor::ModelAssessor;

/// Minimum length, in characters, of a job posting and of a usable CV.
pub const MIN_TEXT_CHARS: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

/// Everything derived once per job run and shared read-only by all workers.
#[derive(Debug)]
pub struct JobContext {
    pub job_text: String,
    pub criteria_text: String,
    pub job: ExtractedFeatures,
    pub criteria: Criteria,
    pub weights: ScoreWeights,
    pub alpha: f64,
    pub policy: ScoringPolicy,
}

impl JobContext {
    pub fn new(
        job_text: String,
        criteria_text: String,
        weights: ScoreWeights,
        alpha: f64,
        policy: ScoringPolicy,
    ) -> Self {
        let job = extract(&job_text);
        let criteria = parse(&criteria_text);
        Self {
            job_text,
            criteria_text,
            job,
            criteria,
            weights,
            alpha: clamp_alpha(alpha),
            policy,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateInput {
    #[serde(default)]
    pub name: String,
    pub cv_text: String,
}

impl CandidateInput {
    fn label(&self, index: usize) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            format!("candidat-{}", index + 1)
        } else {
            name.to_string()
        }
    }
}

/// The model collaborator for one run. Absent means rule-only results.
#[derive(Clone)]
pub struct ModelStage {
    pub assessor: Arc<dyn ModelAssessor>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub dedupe: bool,
    pub anonymize: bool,
    pub min_score: Option<u8>,
    pub max_workers: usize,
    pub qualify_threshold: u8,
}

// ────────────────────────────────────────────────────────────────────────────
// Outputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    /// Position in the submitted list.
    pub index: usize,
    pub name: String,
    pub assessment: CandidateAssessment,
    pub gate: GateDecision,
    pub matched: Vec<SkillId>,
    pub missing: Vec<String>,
    pub model_used: bool,
}

impl ScoredCandidate {
    pub fn global(&self) -> u8 {
        self.assessment.global()
    }
}

impl Ranked for ScoredCandidate {
    fn global_score(&self) -> u8 {
        self.global()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedCandidate {
    pub index: usize,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub count: usize,
    pub qualified: usize,
    pub threshold: u8,
    pub average: u8,
    pub top: Option<u8>,
}

impl BatchSummary {
    pub fn from_candidates(candidates: &[ScoredCandidate], threshold: u8) -> Self {
        let count = candidates.len();
        let total: u32 = candidates.iter().map(|c| c.global() as u32).sum();
        let average = if count == 0 {
            0
        } else {
            (total as f64 / count as f64).round() as u8
        };
        Self {
            count,
            qualified: candidates.iter().filter(|c| c.global() >= threshold).count(),
            threshold,
            average,
            top: candidates.iter().map(ScoredCandidate::global).max(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Global score descending, ties in submission order.
    pub candidates: Vec<ScoredCandidate>,
    pub skipped: Vec<SkippedCandidate>,
    pub summary: BatchSummary,
}

// ────────────────────────────────────────────────────────────────────────────
// Single candidate
// ────────────────────────────────────────────────────────────────────────────

/// Scores one CV against the job context.
///
/// The CPU-bound rule side runs in `spawn_blocking`. A model failure or timeout
/// is logged and the result falls back to the rule side alone.
pub async fn analyze_candidate(
    ctx: Arc<JobContext>,
    index: usize,
    name: String,
    cv_text: String,
    model: Option<ModelStage>,
) -> Result<ScoredCandidate, AppError> {
    let rule_ctx = Arc::clone(&ctx);
    let rule_cv = cv_text.clone();
    let (outcome, rule) = tokio::task::spawn_blocking(move || {
        let cv = extract(&rule_cv);
        let outcome = score_with_policy(
            &rule_ctx.job,
            &cv,
            &rule_ctx.criteria,
            &rule_ctx.weights,
            &rule_ctx.policy,
        );
        let rule = build_rule_assessment(&outcome, &cv);
        (outcome, rule)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed scoring {name}: {e}")))?;

    let model_assessment = match &model {
        Some(stage) if stage.assessor.enabled() => {
            fetch_model_assessment(stage, &ctx, &cv_text, &name).await
        }
        _ => None,
    };
    let model_used = model_assessment.is_some();

    let mut assessment = combine(rule, model_assessment, ctx.alpha, &ctx.weights, &ctx.policy);
    if assessment.identity.name == DEFAULT_CANDIDATE_NAME {
        assessment.identity.name = name.clone();
    }

    Ok(ScoredCandidate {
        index,
        name,
        assessment,
        gate: outcome.gate,
        matched: outcome.matched,
        missing: outcome.missing,
        model_used,
    })
}

async fn fetch_model_assessment(
    stage: &ModelStage,
    ctx: &JobContext,
    cv_text: &str,
    name: &str,
) -> Option<CandidateAssessment> {
    let call = stage
        .assessor
        .assess(&ctx.job_text, cv_text, &ctx.criteria_text);

    match tokio::time::timeout(stage.timeout, call).await {
        Ok(Ok(raw)) => {
            let (assessment, tier) = normalize_detailed(&raw);
            debug!("Model record for {name} normalized ({tier:?} tier)");
            Some(assessment)
        }
        Ok(Err(e)) => {
            warn!("Model assessment failed for {name}, using rule-only result: {e}");
            None
        }
        Err(_) => {
            warn!(
                "Model assessment timed out for {name} after {}s, using rule-only result",
                stage.timeout.as_secs()
            );
            None
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Batch
// ────────────────────────────────────────────────────────────────────────────

pub fn validate_job_text(job_text: &str) -> Result<(), AppError> {
    if job_text.trim().chars().count() < MIN_TEXT_CHARS {
        return Err(AppError::Validation(format!(
            "job_text must be at least {MIN_TEXT_CHARS} characters"
        )));
    }
    Ok(())
}

pub async fn run_batch(
    ctx: JobContext,
    inputs: Vec<CandidateInput>,
    model: Option<ModelStage>,
    options: &BatchOptions,
) -> Result<BatchReport, AppError> {
    validate_job_text(&ctx.job_text)?;
    if inputs.is_empty() {
        return Err(AppError::Validation(
            "at least one candidate is required".to_string(),
        ));
    }

    let mut skipped = Vec::new();
    let mut accepted = Vec::new();
    for (index, input) in inputs.into_iter().enumerate() {
        let name = input.label(index);
        if input.cv_text.trim().chars().count() < MIN_TEXT_CHARS {
            skipped.push(SkippedCandidate {
                index,
                name,
                reason: format!("CV text shorter than {MIN_TEXT_CHARS} characters"),
            });
            continue;
        }
        accepted.push((index, name, input.cv_text));
    }

    let workers = options.max_workers.clamp(1, MAX_WORKERS_LIMIT);
    info!(
        "Scoring {} candidates ({} skipped) with {} workers",
        accepted.len(),
        skipped.len(),
        workers
    );

    let ctx = Arc::new(ctx);
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut tasks = JoinSet::new();

    for (index, name, cv_text) in accepted {
        let ctx = Arc::clone(&ctx);
        let model = model.clone();
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!("worker pool closed: {e}")))?;
            analyze_candidate(ctx, index, name, cv_text, model).await
        });
    }

    let mut completed = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(candidate)) => {
                debug!(
                    "Scored {}: global={} gated={}",
                    candidate.name,
                    candidate.global(),
                    candidate.gate.gated
                );
                completed.push(candidate);
            }
            Ok(Err(e)) => warn!("Candidate task failed, dropping it: {e}"),
            Err(e) => warn!("Candidate task aborted, dropping it: {e}"),
        }
    }

    // Merges run in submission order so ties resolve the same way every run.
    completed.sort_by_key(|c| c.index);
    let mut candidates = if options.dedupe {
        dedupe_candidates(completed)
    } else {
        completed
    };

    if options.anonymize {
        for candidate in &mut candidates {
            candidate.assessment.identity = anonymize_infos(&candidate.assessment.identity);
        }
    }

    candidates.sort_by(|a, b| b.global().cmp(&a.global()).then(a.index.cmp(&b.index)));

    let summary = BatchSummary::from_candidates(&candidates, options.qualify_threshold);
    if let Some(min_score) = options.min_score {
        candidates.retain(|c| c.global() >= min_score);
    }

    info!(
        "Batch complete: {} candidates, {} qualified, average {}",
        summary.count, summary.qualified, summary.average
    );

    Ok(BatchReport {
        candidates,
        skipped,
        summary,
    })
}

/// Collapses candidates sharing a dedupe key, keeping the better one.
fn dedupe_candidates(candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut slots: HashMap<DedupeKey, ScoredCandidate> = HashMap::new();
    let mut first_seen: Vec<DedupeKey> = Vec::new();

    for candidate in candidates {
        let key = DedupeKey::for_identity(&candidate.assessment.identity);
        let existing = slots.remove(&key);
        match &existing {
            None => first_seen.push(key),
            Some(previous) => debug!(
                "Duplicate identity {key}: {} ({}) vs {} ({})",
                previous.name,
                previous.global(),
                candidate.name,
                candidate.global()
            ),
        }
        slots.insert(key, merge(existing, candidate, &key));
    }

    first_seen
        .into_iter()
        .filter_map(|key| slots.remove(&key))
        .collect()
}
