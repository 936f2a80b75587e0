//! Hybrid Combiner — blends the rule assessment with an optional model one.
//!
//! Axes are mixed per axis as `alpha·rule + (1 − alpha)·model`, the global is
//! recomputed with the scoring weights, and the rule side's gate is re-applied:
//! a rule-side gap caps the result whatever the model reported.

use crate::assessment::model::{CandidateAssessment, Competencies, Identity, Narrative, Scores};
use crate::matching::scorer::{GateDecision, ScoreAxes, ScoreWeights, ScoringPolicy};

pub const DEFAULT_ALPHA: f64 = 0.5;

/// Clamps `alpha` into [0, 1]; non-finite values fall back to `DEFAULT_ALPHA`.
pub fn clamp_alpha(alpha: f64) -> f64 {
    if alpha.is_finite() {
        alpha.clamp(0.0, 1.0)
    } else {
        DEFAULT_ALPHA
    }
}

pub fn combine(
    rule: CandidateAssessment,
    model: Option<CandidateAssessment>,
    alpha: f64,
    weights: &ScoreWeights,
    policy: &ScoringPolicy,
) -> CandidateAssessment {
    let Some(model) = model else {
        return rule;
    };
    let alpha = clamp_alpha(alpha);

    let blend = |r: u8, m: u8| alpha * r as f64 + (1.0 - alpha) * m as f64;
    let (ra, ma) = (rule.scores.axes, model.scores.axes);
    let axes = ScoreAxes::new(
        blend(ra.tech.value(), ma.tech.value()),
        blend(ra.experience.value(), ma.experience.value()),
        blend(ra.soft.value(), ma.soft.value()),
        blend(ra.fit.value(), ma.fit.value()),
    );

    let gate = GateDecision::from_missing(&rule.competencies.missing);
    let global = policy.apply_gate(axes.weighted_global(weights), &gate);

    let mut matched = rule.competencies.matched;
    for skill in model.competencies.matched {
        if !matched.contains(&skill) {
            matched.push(skill);
        }
    }

    // A model narrative still at its default carries no information.
    let narrative = if model.narrative == Narrative::default() {
        rule.narrative
    } else {
        model.narrative
    };

    CandidateAssessment {
        identity: merge_identity(rule.identity, model.identity),
        scores: Scores { global, axes },
        salary: model.salary,
        narrative,
        competencies: Competencies {
            matched,
            missing: rule.competencies.missing,
        },
        history: model.history,
        interview_guide: model.interview_guide,
    }
    .into_canonical()
}

/// Field-wise merge: the model's non-empty values win, the rule's fill the gaps.
fn merge_identity(rule: Identity, model: Identity) -> Identity {
    let pick = |m: String, r: String| if m.trim().is_empty() { r } else { m };
    let default_name = Identity::default().name;
    Identity {
        name: if model.name.trim().is_empty() || model.name == default_name {
            rule.name
        } else {
            model.name
        },
        email: pick(model.email, rule.email),
        phone: pick(model.phone, rule.phone),
        city: pick(model.city, rule.city),
        linkedin: pick(model.linkedin, rule.linkedin),
        current_title: pick(model.current_title, rule.current_title),
    }
}
