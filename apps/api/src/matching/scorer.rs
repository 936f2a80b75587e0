//! Deterministic Scorer — combines job features, CV features and parsed criteria
//! into four bounded axes, a weighted global score and a gate decision.
//!
//! Any missing must-have (required skill, language level, degree) closes the
//! gate, which caps the global score at `ScoringPolicy::gate_cap` whatever the
//! weighted average says.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::matching::criteria::Criteria;
use crate::matching::features::ExtractedFeatures;
use crate::matching::taxonomy::SkillId;

// ────────────────────────────────────────────────────────────────────────────
// Bounded scores
// ────────────────────────────────────────────────────────────────────────────

/// An integer score in [0, 100]. Out-of-range input is clamped on construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self(0);
        }
        Self(value.round().clamp(0.0, 100.0) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (0..=100).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(format!("score {value} is outside [0, 100]"))
        }
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

/// The four scoring axes. Every axis is a `Score`, so never out of range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreAxes {
    pub tech: Score,
    pub experience: Score,
    pub soft: Score,
    pub fit: Score,
}

impl ScoreAxes {
    pub fn new(tech: f64, experience: f64, soft: f64, fit: f64) -> Self {
        Self {
            tech: Score::clamped(tech),
            experience: Score::clamped(experience),
            soft: Score::clamped(soft),
            fit: Score::clamped(fit),
        }
    }

    /// round(tech·w_tech + experience·w_exp + soft·w_soft + fit·w_fit).
    pub fn weighted_global(&self, weights: &ScoreWeights) -> Score {
        let w = weights.normalized();
        Score::clamped(
            self.tech.value() as f64 * w.tech
                + self.experience.value() as f64 * w.experience
                + self.soft.value() as f64 * w.soft
                + self.fit.value() as f64 * w.fit,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Weights and policy constants
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub tech: f64,
    pub experience: f64,
    pub soft: f64,
    pub fit: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            tech: 0.40,
            experience: 0.30,
            soft: 0.15,
            fit: 0.15,
        }
    }
}

impl ScoreWeights {
    /// Rescales to sum to 1. A raw total ≤ 0 (or non-finite) falls back to
    /// the default weights; otherwise negative components count as zero.
    pub fn normalized(&self) -> Self {
        let raw = [self.tech, self.experience, self.soft, self.fit];
        let raw_total: f64 = raw.iter().sum();
        if raw_total <= 0.0 || !raw_total.is_finite() {
            return Self::default();
        }
        let parts = raw.map(|w| w.max(0.0));
        let total: f64 = parts.iter().sum();
        Self {
            tech: parts[0] / total,
            experience: parts[1] / total,
            soft: parts[2] / total,
            fit: parts[3] / total,
        }
    }
}

/// Business constants of the scoring formula. Overridable from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub gate_cap: u8,
    pub fit_base: f64,
    pub fit_remote_bonus: f64,
    pub fit_remote_penalty: f64,
    pub fit_language_penalty: f64,
    pub fit_degree_penalty: f64,
    pub tech_fallback_matched: f64,
    pub tech_fallback_unmatched: f64,
    pub experience_ratio_cap: f64,
    pub experience_slope: f64,
    pub experience_intercept: f64,
    pub experience_unknown_with_signal: f64,
    pub experience_unknown: f64,
    pub soft_base: f64,
    pub soft_per_hit: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            gate_cap: 49,
            fit_base: 72.0,
            fit_remote_bonus: 8.0,
            fit_remote_penalty: 6.0,
            fit_language_penalty: 15.0,
            fit_degree_penalty: 10.0,
            tech_fallback_matched: 80.0,
            tech_fallback_unmatched: 40.0,
            experience_ratio_cap: 1.4,
            experience_slope: 0.55,
            experience_intercept: 0.45,
            experience_unknown_with_signal: 70.0,
            experience_unknown: 50.0,
            soft_base: 50.0,
            soft_per_hit: 8.0,
        }
    }
}

impl ScoringPolicy {
    /// Caps `global` when the gate is closed.
    pub fn apply_gate(&self, global: Score, gate: &GateDecision) -> Score {
        if gate.gated {
            global.min(Score(self.gate_cap.min(100)))
        } else {
            global
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Outcome
// ────────────────────────────────────────────────────────────────────────────

/// Whether a disqualifying gap capped the score, and which labels caused it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub gated: bool,
    pub missing: Vec<String>,
}

impl GateDecision {
    pub fn from_missing(missing: &[String]) -> Self {
        Self {
            gated: !missing.is_empty(),
            missing: missing.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreOutcome {
    pub axes: ScoreAxes,
    pub global: Score,
    pub gate: GateDecision,
    /// Sorted intersection of CV and job skills.
    pub matched: Vec<SkillId>,
    /// Missing required skills (criteria order) followed by fit-rule labels.
    pub missing: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// Scores with the default policy.
pub fn score(
    job: &ExtractedFeatures,
    cv: &ExtractedFeatures,
    criteria: &Criteria,
    weights: &ScoreWeights,
) -> ScoreOutcome {
    score_with_policy(job, cv, criteria, weights, &ScoringPolicy::default())
}

pub fn score_with_policy(
    job: &ExtractedFeatures,
    cv: &ExtractedFeatures,
    criteria: &Criteria,
    weights: &ScoreWeights,
    policy: &ScoringPolicy,
) -> ScoreOutcome {
    let matched: Vec<SkillId> = cv.skills.intersection(&job.skills).copied().collect();

    let mut missing: Vec<String> = criteria
        .required_skills
        .iter()
        .filter(|skill| !cv.skills.contains(*skill))
        .map(|skill| skill.to_string())
        .collect();

    let tech = tech_axis(job, cv, criteria, policy);
    let experience = experience_axis(job, cv, criteria, policy);
    let soft = (policy.soft_base + policy.soft_per_hit * cv.soft_signals.len() as f64).min(100.0);
    let fit = fit_axis(job, cv, criteria, policy, &mut missing);

    let axes = ScoreAxes::new(tech, experience, soft, fit);
    let gate = GateDecision::from_missing(&missing);
    let global = policy.apply_gate(axes.weighted_global(weights), &gate);

    ScoreOutcome {
        axes,
        global,
        gate,
        matched,
        missing,
    }
}

fn tech_axis(
    job: &ExtractedFeatures,
    cv: &ExtractedFeatures,
    criteria: &Criteria,
    policy: &ScoringPolicy,
) -> f64 {
    if job.skills.is_empty() {
        let required: BTreeSet<SkillId> = criteria.required_skills.iter().copied().collect();
        return if cv.skills.intersection(&required).next().is_some() {
            policy.tech_fallback_matched
        } else {
            policy.tech_fallback_unmatched
        };
    }
    let overlap = cv.skills.intersection(&job.skills).count() as f64;
    overlap / job.skills.len() as f64 * 100.0
}

fn experience_axis(
    job: &ExtractedFeatures,
    cv: &ExtractedFeatures,
    criteria: &Criteria,
    policy: &ScoringPolicy,
) -> f64 {
    let required = match (criteria.min_years.map(|y| y as f32), job.years_experience) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };

    let Some(required) = required else {
        return if cv.years_experience.is_some() {
            policy.experience_unknown_with_signal
        } else {
            policy.experience_unknown
        };
    };

    let ratio = if required > 0.0 {
        (cv.years_experience.unwrap_or(0.0) / required) as f64
    } else {
        policy.experience_ratio_cap
    };
    let ratio = ratio.min(policy.experience_ratio_cap);
    (policy.experience_slope * ratio + policy.experience_intercept).clamp(0.0, 1.0) * 100.0
}

fn fit_axis(
    job: &ExtractedFeatures,
    cv: &ExtractedFeatures,
    criteria: &Criteria,
    policy: &ScoringPolicy,
    missing: &mut Vec<String>,
) -> f64 {
    let mut fit = policy.fit_base;

    let remote_must_have = criteria.remote_required == Some(true);
    if job.mentions_remote || remote_must_have {
        if cv.mentions_remote {
            fit += policy.fit_remote_bonus;
        } else {
            fit -= policy.fit_remote_penalty;
            // Only a criteria must-have disqualifies; a job-text mention just costs fit.
            if remote_must_have {
                missing.push("télétravail".to_string());
            }
        }
    }

    if let Some(required) = criteria.min_language {
        if cv.language_level.map_or(true, |level| level < required) {
            fit -= policy.fit_language_penalty;
            let language = criteria.language.as_deref().unwrap_or("langue");
            missing.push(format!("{language} {required}+"));
        }
    }

    if let Some(required) = criteria.min_degree {
        if cv.degree_level.map_or(true, |level| level < required) {
            fit -= policy.fit_degree_penalty;
            missing.push(format!("diplôme bac+{required}"));
        }
    }

    fit.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::criteria::parse;
    use crate::matching::features::{extract_at, CefrLevel};
    use crate::matching::taxonomy::canonicalize;

    fn features_with_skills(skills: &[&str]) -> ExtractedFeatures {
        ExtractedFeatures {
            skills: skills.iter().filter_map(|s| canonicalize(s)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_required_skill_gates_score() {
        let job = features_with_skills(&["python", "aws"]);
        let cv = features_with_skills(&["python"]);
        let criteria = parse("python, aws");

        let outcome = score(&job, &cv, &criteria, &ScoreWeights::default());
        assert_eq!(outcome.missing, vec!["aws".to_string()]);
        assert!(outcome.gate.gated);
        assert!(outcome.global.value() <= 49);
        assert_eq!(outcome.axes.tech.value(), 50);
    }

    #[test]
    fn test_empty_job_skills_uses_tech_fallback() {
        let job = ExtractedFeatures::default();
        let cv = features_with_skills(&["python"]);
        let criteria = parse("python");

        let outcome = score(&job, &cv, &criteria, &ScoreWeights::default());
        assert_eq!(outcome.axes.tech.value(), 80);
        assert!(outcome.missing.is_empty());
        assert!(!outcome.gate.gated);
        assert!(outcome.matched.is_empty());
    }

    #[test]
    fn test_empty_job_skills_without_criteria_match() {
        let job = ExtractedFeatures::default();
        let cv = features_with_skills(&["java"]);
        let outcome = score(&job, &cv, &Criteria::default(), &ScoreWeights::default());
        assert_eq!(outcome.axes.tech.value(), 40);
    }

    #[test]
    fn test_language_requirement_penalizes_fit() {
        let job = ExtractedFeatures::default();
        let cv = ExtractedFeatures {
            years_experience: Some(3.0),
            ..Default::default()
        };
        let criteria = parse("5 ans, anglais C1");
        assert_eq!(criteria.min_years, Some(5));

        let outcome = score(&job, &cv, &criteria, &ScoreWeights::default());
        assert_eq!(outcome.axes.fit.value(), 72 - 15);
        assert!(outcome.missing.contains(&"anglais C1+".to_string()));
        assert!(outcome.global.value() <= 49);
        // ratio 0.6 → 0.55·0.6 + 0.45 = 0.78
        assert_eq!(outcome.axes.experience.value(), 78);
    }

    #[test]
    fn test_degree_requirement_penalizes_fit() {
        let cv = ExtractedFeatures {
            degree_level: Some(3),
            language_level: Some(CefrLevel::C2),
            ..Default::default()
        };
        let criteria = parse("bac+5, anglais B2");
        let outcome = score(&ExtractedFeatures::default(), &cv, &criteria, &ScoreWeights::default());
        assert_eq!(outcome.missing, vec!["diplôme bac+5".to_string()]);
        assert_eq!(outcome.axes.fit.value(), 62);
    }

    #[test]
    fn test_remote_agreement_and_mismatch() {
        let job = ExtractedFeatures {
            mentions_remote: true,
            ..Default::default()
        };
        let remote_cv = ExtractedFeatures {
            mentions_remote: true,
            ..Default::default()
        };
        let office_cv = ExtractedFeatures::default();
        let w = ScoreWeights::default();

        assert_eq!(score(&job, &remote_cv, &Criteria::default(), &w).axes.fit.value(), 80);
        assert_eq!(score(&job, &office_cv, &Criteria::default(), &w).axes.fit.value(), 66);
        assert_eq!(
            score(&office_cv, &office_cv, &Criteria::default(), &w).axes.fit.value(),
            72
        );
    }

    #[test]
    fn test_remote_must_have_gates_when_cv_lacks_remote() {
        let cv = features_with_skills(&["python"]);
        let job = ExtractedFeatures::default();
        let w = ScoreWeights::default();
        let criteria = parse("python, télétravail");
        assert_eq!(criteria.remote_required, Some(true));

        let outcome = score(&job, &cv, &criteria, &w);
        assert_eq!(outcome.axes.fit.value(), 66);
        assert_eq!(outcome.missing, vec!["télétravail".to_string()]);
        assert!(outcome.gate.gated);
        assert!(outcome.global.value() <= 49);

        let remote_cv = ExtractedFeatures {
            mentions_remote: true,
            ..cv
        };
        let outcome = score(&job, &remote_cv, &criteria, &w);
        assert_eq!(outcome.axes.fit.value(), 80);
        assert!(outcome.missing.is_empty());
        assert!(!outcome.gate.gated);
    }

    #[test]
    fn test_language_label_names_the_required_language() {
        let nobody = ExtractedFeatures::default();
        let w = ScoreWeights::default();

        let outcome = score(&nobody, &nobody, &parse("allemand B2"), &w);
        assert_eq!(outcome.missing, vec!["allemand B2+".to_string()]);

        let outcome = score(&nobody, &nobody, &parse("B2"), &w);
        assert_eq!(outcome.missing, vec!["langue B2+".to_string()]);
    }

    #[test]
    fn test_experience_without_requirement() {
        let with_signal = ExtractedFeatures {
            years_experience: Some(0.0),
            ..Default::default()
        };
        let w = ScoreWeights::default();
        let none = ExtractedFeatures::default();
        assert_eq!(score(&none, &with_signal, &Criteria::default(), &w).axes.experience.value(), 70);
        assert_eq!(score(&none, &none, &Criteria::default(), &w).axes.experience.value(), 50);
    }

    #[test]
    fn test_experience_ratio_is_capped() {
        let job = ExtractedFeatures {
            years_experience: Some(2.0),
            ..Default::default()
        };
        let cv = ExtractedFeatures {
            years_experience: Some(20.0),
            ..Default::default()
        };
        let outcome = score(&job, &cv, &Criteria::default(), &ScoreWeights::default());
        assert_eq!(outcome.axes.experience.value(), 100);
    }

    #[test]
    fn test_soft_axis_saturates() {
        let cv = extract_at(
            "communication leadership autonomie rigueur curiosité créativité empathie mentoring",
            2025,
        );
        let outcome = score(&ExtractedFeatures::default(), &cv, &Criteria::default(), &ScoreWeights::default());
        assert_eq!(outcome.axes.soft.value(), 100);
    }

    #[test]
    fn test_weights_summing_to_zero_use_defaults() {
        let job = features_with_skills(&["python", "sql"]);
        let cv = features_with_skills(&["python"]);
        let zero = ScoreWeights {
            tech: 0.0,
            experience: 0.0,
            soft: 0.0,
            fit: 0.0,
        };
        let negative = ScoreWeights {
            tech: -1.0,
            experience: -2.0,
            soft: 0.0,
            fit: 0.0,
        };
        let expected = score(&job, &cv, &Criteria::default(), &ScoreWeights::default());
        assert_eq!(score(&job, &cv, &Criteria::default(), &zero), expected);
        assert_eq!(score(&job, &cv, &Criteria::default(), &negative), expected);
    }

    #[test]
    fn test_mixed_sign_weights_summing_to_zero_use_defaults() {
        let job = features_with_skills(&["python", "sql"]);
        let cv = features_with_skills(&["python"]);
        let expected = score(&job, &cv, &Criteria::default(), &ScoreWeights::default());
        for weights in [
            ScoreWeights { tech: 5.0, experience: -5.0, soft: 0.0, fit: 0.0 },
            ScoreWeights { tech: 1.0, experience: 1.0, soft: -3.0, fit: 0.5 },
            ScoreWeights { tech: f64::NAN, experience: 1.0, soft: 0.0, fit: 0.0 },
        ] {
            assert_eq!(weights.normalized(), ScoreWeights::default());
            assert_eq!(score(&job, &cv, &Criteria::default(), &weights), expected);
        }
    }

    #[test]
    fn test_negative_component_with_positive_total_counts_as_zero() {
        let w = ScoreWeights { tech: 3.0, experience: -1.0, soft: 1.0, fit: 0.0 }.normalized();
        assert_eq!(w.experience, 0.0);
        assert!((w.tech - 0.75).abs() < 1e-9);
        assert!((w.soft - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_weights_are_renormalized() {
        let w = ScoreWeights {
            tech: 40.0,
            experience: 30.0,
            soft: 15.0,
            fit: 15.0,
        }
        .normalized();
        assert!((w.tech - 0.40).abs() < 1e-9);
        assert!((w.tech + w.experience + w.soft + w.fit - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_gate_holds_with_extreme_weights() {
        let job = features_with_skills(&["python"]);
        let cv = features_with_skills(&["python"]);
        let criteria = parse("python, rust");
        let w = ScoreWeights {
            tech: 1.0,
            experience: 0.0,
            soft: 0.0,
            fit: 0.0,
        };
        let outcome = score(&job, &cv, &criteria, &w);
        assert_eq!(outcome.axes.tech.value(), 100);
        assert_eq!(outcome.global.value(), 49);
    }

    #[test]
    fn test_custom_gate_cap() {
        let job = features_with_skills(&["python"]);
        let cv = features_with_skills(&["python"]);
        let criteria = parse("rust");
        let policy = ScoringPolicy {
            gate_cap: 30,
            ..Default::default()
        };
        let w = ScoreWeights {
            tech: 1.0,
            experience: 0.0,
            soft: 0.0,
            fit: 0.0,
        };
        let outcome = score_with_policy(&job, &cv, &criteria, &w, &policy);
        assert_eq!(outcome.global.value(), 30);
    }

    #[test]
    fn test_score_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Score>("101").is_err());
        assert!(serde_json::from_str::<Score>("-1").is_err());
        assert_eq!(serde_json::from_str::<Score>("42").unwrap().value(), 42);
        assert_eq!(serde_json::to_string(&Score::clamped(250.0)).unwrap(), "100");
    }

    #[test]
    fn test_all_axes_in_range_for_degenerate_input() {
        let cv = extract_at("", 2025);
        let outcome = score(&cv, &cv, &parse(";;;"), &ScoreWeights::default());
        for axis in [
            outcome.axes.tech,
            outcome.axes.experience,
            outcome.axes.soft,
            outcome.axes.fit,
            outcome.global,
        ] {
            assert!(axis.value() <= 100);
        }
    }
}
