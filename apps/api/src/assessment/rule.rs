//! Rule-side assessment — turns a deterministic `ScoreOutcome` into a canonical
//! `CandidateAssessment`, so the pipeline always has a result without a model.

use crate::assessment::model::{CandidateAssessment, Competencies, Identity, Narrative, Scores};
use crate::assessment::normalizer::normalize;
use crate::matching::features::ExtractedFeatures;
use crate::matching::scorer::ScoreOutcome;

/// Verdict bands: 80+ Excellent | 60–79 Bon | 40–59 Moyen | <40 Inadéquat.
pub fn verdict_band(global: u8) -> &'static str {
    match global {
        80.. => "Excellent",
        60..=79 => "Bon",
        40..=59 => "Moyen",
        _ => "Inadéquat",
    }
}

pub fn build_rule_assessment(
    outcome: &ScoreOutcome,
    cv: &ExtractedFeatures,
) -> CandidateAssessment {
    let global = outcome.global.value();

    let verdict = if outcome.gate.gated {
        format!(
            "{} ({global}/100) — critère éliminatoire manquant : {}",
            verdict_band(global),
            outcome.gate.missing.join(", ")
        )
    } else {
        format!("{} ({global}/100) — évaluation déterministe", verdict_band(global))
    };

    let mut strengths: Vec<String> = outcome
        .matched
        .iter()
        .map(|skill| format!("Compétence attendue : {skill}"))
        .collect();
    if outcome.axes.experience.value() >= 80 {
        strengths.push("Expérience en adéquation avec le poste".to_string());
    }
    if !cv.soft_signals.is_empty() {
        let signals: Vec<&str> = cv.soft_signals.iter().copied().collect();
        strengths.push(format!("Savoir-être : {}", signals.join(", ")));
    }

    let weaknesses = outcome
        .missing
        .iter()
        .map(|label| format!("Manquant : {label}"))
        .collect();

    let contacts = &cv.contacts;
    let assessment = CandidateAssessment {
        identity: Identity {
            email: contacts.email.clone().unwrap_or_default(),
            phone: contacts.phone.clone().unwrap_or_default(),
            linkedin: contacts.linkedin.clone().unwrap_or_default(),
            ..Identity::default()
        },
        scores: Scores {
            global: outcome.global,
            axes: outcome.axes,
        },
        narrative: Narrative {
            verdict,
            strengths,
            weaknesses,
        },
        competencies: Competencies {
            matched: outcome.matched.iter().map(|s| s.to_string()).collect(),
            missing: outcome.missing.clone(),
        },
        ..CandidateAssessment::default()
    };

    // Round-trip through the normalizer so rule output obeys the same invariants
    // as model output.
    normalize(&assessment.as_raw_record())
}
