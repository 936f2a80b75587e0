//! Model Assessor — pluggable, trait-based source of the untrusted model record.
//!
//! Default without an API key: `DisabledModelAssessor` (rule-only results).
//! With a key: `LlmModelAssessor`, backed by the shared `LlmClient` and the
//! `AssessmentCache`.
//!
//! `AppState` holds an `Arc<dyn ModelAssessor>`, chosen at startup from config.
//! Whatever comes back is raw JSON; only the normalizer turns it into a record.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::pipeline::cache::{AssessmentCache, CacheKey};
use crate::pipeline::prompts::build_assessment_prompt;

pub const JOB_TEXT_LIMIT: usize = 2000;
pub const CV_TEXT_LIMIT: usize = 4000;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Produces a raw, untrusted assessment record for one candidate.
///
/// Carried in `AppState` as `Arc<dyn ModelAssessor>`.
#[async_trait]
pub trait ModelAssessor: Send + Sync {
    async fn assess(
        &self,
        job_text: &str,
        cv_text: &str,
        criteria_text: &str,
    ) -> Result<Value, AppError>;

    /// "disabled" | "llm" — reported by /health.
    fn backend(&self) -> &'static str;

    /// A disabled assessor is skipped instead of called.
    fn enabled(&self) -> bool {
        true
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DisabledModelAssessor
// ────────────────────────────────────────────────────────────────────────────

pub struct DisabledModelAssessor;

#[async_trait]
impl ModelAssessor for DisabledModelAssessor {
    async fn assess(&self, _job: &str, _cv: &str, _criteria: &str) -> Result<Value, AppError> {
        Err(AppError::Llm("model assessment is disabled".to_string()))
    }

    fn backend(&self) -> &'static str {
        "disabled"
    }

    fn enabled(&self) -> bool {
        false
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmModelAssessor
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmModelAssessor {
    llm: LlmClient,
    cache: Arc<AssessmentCache>,
}

impl LlmModelAssessor {
    pub fn new(llm: LlmClient, cache: Arc<AssessmentCache>) -> Self {
        Self { llm, cache }
    }
}

#[async_trait]
impl ModelAssessor for LlmModelAssessor {
    async fn assess(
        &self,
        job_text: &str,
        cv_text: &str,
        criteria_text: &str,
    ) -> Result<Value, AppError> {
        let job = truncate_chars(job_text, JOB_TEXT_LIMIT);
        let cv = truncate_chars(cv_text, CV_TEXT_LIMIT);

        let key = CacheKey::new(job, criteria_text, cv);
        if let Some(record) = self.cache.get(&key) {
            debug!("assessment cache hit");
            return Ok(record);
        }

        let prompt = build_assessment_prompt(job, criteria_text, cv);
        let record: Value = self.llm.call_json(&prompt, JSON_ONLY_SYSTEM).await?;
        if !record.is_object() {
            return Err(AppError::Llm("model did not return a JSON object".to_string()));
        }

        self.cache.insert(key, record.clone());
        Ok(record)
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("éàü", 2), "éà");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
        assert_eq!(truncate_chars(&"é".repeat(5000), CV_TEXT_LIMIT).chars().count(), 4000);
    }

    #[tokio::test]
    async fn test_disabled_assessor_always_errs() {
        let assessor = DisabledModelAssessor;
        assert!(assessor.assess("job", "cv", "crit").await.is_err());
        assert_eq!(assessor.backend(), "disabled");
        assert!(!assessor.enabled());
    }
}
