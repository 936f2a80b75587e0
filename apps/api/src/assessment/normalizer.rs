//! Schema Normalizer — repairs an untrusted record into a `CandidateAssessment`.
//!
//! Two tiers:
//! 1. Strict: the record deserializes into the canonical type as-is (every
//!    field present, every type right, scores within [0, 100]).
//! 2. Tolerant: start from the default record and copy every sub-field that is
//!    present and plausible. Anything else keeps its default.
//!
//! `normalize` is total: any JSON value, including `null`, yields a valid record.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::assessment::model::{
    CandidateAssessment, HistoryItem, QuestionItem, DEFAULT_HISTORY_TITLE, DEFAULT_QUESTION_THEME,
};
use crate::matching::scorer::Score;

/// Which tier produced the normalized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationTier {
    Strict,
    Tolerant,
}

pub fn normalize(raw: &Value) -> CandidateAssessment {
    normalize_detailed(raw).0
}

pub fn normalize_detailed(raw: &Value) -> (CandidateAssessment, NormalizationTier) {
    match serde_json::from_value::<CandidateAssessment>(raw.clone()) {
        Ok(strict) => (strict.into_canonical(), NormalizationTier::Strict),
        Err(_) => (tolerant(raw), NormalizationTier::Tolerant),
    }
}

fn tolerant(raw: &Value) -> CandidateAssessment {
    let mut out = CandidateAssessment::default();
    let Some(root) = raw.as_object() else {
        return out;
    };

    if let Some(infos) = section(root, "infos") {
        let identity = &mut out.identity;
        copy_string(infos, "nom", &mut identity.name);
        copy_string(infos, "email", &mut identity.email);
        copy_string(infos, "tel", &mut identity.phone);
        copy_string(infos, "ville", &mut identity.city);
        copy_string(infos, "linkedin", &mut identity.linkedin);
        copy_string(infos, "poste_actuel", &mut identity.current_title);
    }

    if let Some(scores) = section(root, "scores") {
        let target = &mut out.scores;
        copy_score(scores, "global", &mut target.global);
        copy_score(scores, "tech", &mut target.axes.tech);
        copy_score(scores, "experience", &mut target.axes.experience);
        copy_score(scores, "soft", &mut target.axes.soft);
        copy_score(scores, "fit", &mut target.axes.fit);
    }

    if let Some(salary) = section(root, "salaire") {
        copy_amount(salary, "min", &mut out.salary.min);
        copy_amount(salary, "max", &mut out.salary.max);
        copy_string(salary, "confiance", &mut out.salary.confidence);
        copy_string(salary, "analyse", &mut out.salary.analysis);
    }

    if let Some(narrative) = section(root, "analyse") {
        copy_string(narrative, "verdict", &mut out.narrative.verdict);
        copy_string_list(narrative, "points_forts", &mut out.narrative.strengths);
        copy_string_list(narrative, "points_faibles", &mut out.narrative.weaknesses);
    }

    if let Some(competencies) = section(root, "competences") {
        copy_string_list(competencies, "match", &mut out.competencies.matched);
        copy_string_list(competencies, "manquant", &mut out.competencies.missing);
    }

    out.history = records(root, "historique")
        .map(|item| HistoryItem {
            title: string_field(item, "titre").unwrap_or_else(|| DEFAULT_HISTORY_TITLE.to_string()),
            company: string_field(item, "entreprise").unwrap_or_default(),
            duration: string_field(item, "duree").unwrap_or_default(),
            // "mission" is the older name of the summary field.
            summary: string_field(item, "resume_synthetique")
                .or_else(|| string_field(item, "mission"))
                .unwrap_or_default(),
        })
        .collect();

    out.interview_guide = records(root, "entretien")
        .map(|item| QuestionItem {
            theme: string_field(item, "theme")
                .unwrap_or_else(|| DEFAULT_QUESTION_THEME.to_string()),
            question: string_field(item, "question").unwrap_or_default(),
            expected: string_field(item, "attendu").unwrap_or_default(),
        })
        .collect();

    out.into_canonical()
}

// ────────────────────────────────────────────────────────────────────────────
// Field coercion helpers
// ────────────────────────────────────────────────────────────────────────────

fn section<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    root.get(key).and_then(Value::as_object)
}

/// Record-shaped elements of a list section; anything else is skipped.
fn records<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a Map<String, Value>> {
    root.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

/// Scalars convert to strings; null, lists and records are not plausible text.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn string_field(section: &Map<String, Value>, key: &str) -> Option<String> {
    section.get(key).and_then(scalar_to_string)
}

fn copy_string(section: &Map<String, Value>, key: &str, target: &mut String) {
    if let Some(value) = string_field(section, key) {
        *target = value;
    }
}

fn copy_string_list(section: &Map<String, Value>, key: &str, target: &mut Vec<String>) {
    if let Some(items) = section.get(key).and_then(Value::as_array) {
        *target = items.iter().filter_map(scalar_to_string).collect();
    }
}

/// Numbers are truncated toward zero then clamped into [0, 100].
fn copy_score(section: &Map<String, Value>, key: &str, target: &mut Score) {
    if let Some(n) = section.get(key).and_then(Value::as_f64) {
        *target = Score::clamped(n.trunc());
    }
}

fn copy_amount(section: &Map<String, Value>, key: &str, target: &mut u32) {
    if let Some(n) = section.get(key).and_then(Value::as_f64) {
        if n.is_finite() {
            *target = n.trunc().clamp(0.0, u32::MAX as f64) as u32;
        }
    }
}
