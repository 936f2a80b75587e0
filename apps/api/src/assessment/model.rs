//! Canonical `CandidateAssessment` record.
//!
//! Field names on the wire follow the historical JSON shape (`infos`,
//! `salaire`, `competences`, ...). Every type has a total default, so an
//! assessment is always constructible, even from an empty input.
//!
//! None of these types carry `#[serde(default)]`: deserializing one directly
//! is the strict parse, which fails unless every field is present and typed.
//! The tolerant path lives in `normalizer`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::matching::scorer::{Score, ScoreAxes};

pub const DEFAULT_CANDIDATE_NAME: &str = "Candidat";
pub const DEFAULT_SALARY_ANALYSIS: &str = "Non estimé";
pub const DEFAULT_VERDICT: &str = "En attente";
pub const DEFAULT_QUESTION_THEME: &str = "Général";
pub const DEFAULT_HISTORY_TITLE: &str = "Poste";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "nom")]
    pub name: String,
    pub email: String,
    #[serde(rename = "tel")]
    pub phone: String,
    #[serde(rename = "ville")]
    pub city: String,
    pub linkedin: String,
    #[serde(rename = "poste_actuel")]
    pub current_title: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: DEFAULT_CANDIDATE_NAME.to_string(),
            email: String::new(),
            phone: String::new(),
            city: String::new(),
            linkedin: String::new(),
            current_title: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub global: Score,
    #[serde(flatten)]
    pub axes: ScoreAxes,
}

/// Salary band in k€ gross per year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryEstimate {
    pub min: u32,
    pub max: u32,
    #[serde(rename = "confiance")]
    pub confidence: String,
    #[serde(rename = "analyse")]
    pub analysis: String,
}

impl Default for SalaryEstimate {
    fn default() -> Self {
        Self {
            min: 0,
            max: 0,
            confidence: String::new(),
            analysis: DEFAULT_SALARY_ANALYSIS.to_string(),
        }
    }
}

/// Matched and missing competencies. Both lists behave as ordered sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competencies {
    #[serde(rename = "match")]
    pub matched: Vec<String>,
    #[serde(rename = "manquant")]
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub verdict: String,
    #[serde(rename = "points_forts")]
    pub strengths: Vec<String>,
    #[serde(rename = "points_faibles")]
    pub weaknesses: Vec<String>,
}

impl Default for Narrative {
    fn default() -> Self {
        Self {
            verdict: DEFAULT_VERDICT.to_string(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(rename = "entreprise")]
    pub company: String,
    #[serde(rename = "duree")]
    pub duration: String,
    #[serde(rename = "resume_synthetique")]
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionItem {
    pub theme: String,
    pub question: String,
    #[serde(rename = "attendu")]
    pub expected: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateAssessment {
    #[serde(rename = "infos")]
    pub identity: Identity,
    pub scores: Scores,
    #[serde(rename = "salaire")]
    pub salary: SalaryEstimate,
    #[serde(rename = "analyse")]
    pub narrative: Narrative,
    #[serde(rename = "competences")]
    pub competencies: Competencies,
    #[serde(rename = "historique")]
    pub history: Vec<HistoryItem>,
    #[serde(rename = "entretien")]
    pub interview_guide: Vec<QuestionItem>,
}

impl CandidateAssessment {
    /// The untyped JSON form, as an external collaborator would see it.
    pub fn as_raw_record(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    pub fn global(&self) -> u8 {
        self.scores.global.value()
    }

    /// Enforces the ordered-set invariant on the competency lists.
    pub(crate) fn into_canonical(mut self) -> Self {
        dedupe_in_place(&mut self.competencies.matched);
        dedupe_in_place(&mut self.competencies.missing);
        self
    }
}

/// Removes repeated entries, keeping the first occurrence of each.
pub(crate) fn dedupe_in_place(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}
