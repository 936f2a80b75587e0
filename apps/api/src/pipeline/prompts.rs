// Prompt constants for the model-side candidate assessment.
// Reuses the JSON-only system prompt from llm_client::prompts.

/// User prompt preamble: scoring rubric and the exact record schema the
/// normalizer expects. Inputs are appended by `build_assessment_prompt`.
pub const ASSESSMENT_PROMPT: &str = r#"RÔLE : expert en recrutement, exigeant et précis, biais minimisés.

CONTRAINTE : réponds UNIQUEMENT avec un objet JSON valide, sans texte autour.

BARÈME :
- GLOBAL (0-100) = Tech (40%) + Expérience (30%) + Soft (15%) + Fit (15%).
- Si une compétence critique manque, GLOBAL < 50.
- 80+ Excellent | 60-79 Bon | 40-59 Moyen | <40 Inadéquat.

SALAIRE (France, k€ brut/an) : ajuste selon séniorité, région (Paris +15%) et rareté des compétences.

SCHÉMA :
{
  "infos": {"nom": "", "email": "", "tel": "", "ville": "", "linkedin": "", "poste_actuel": ""},
  "scores": {"global": 0, "tech": 0, "experience": 0, "soft": 0, "fit": 0},
  "salaire": {"min": 0, "max": 0, "confiance": "", "analyse": ""},
  "competences": {"match": [], "manquant": []},
  "analyse": {"verdict": "", "points_forts": [], "points_faibles": []},
  "historique": [{"titre": "", "entreprise": "", "duree": "", "resume_synthetique": ""}],
  "entretien": [{"theme": "", "question": "", "attendu": ""}]
}"#;

pub fn build_assessment_prompt(job_text: &str, criteria_text: &str, cv_text: &str) -> String {
    format!(
        "{ASSESSMENT_PROMPT}\n\nOFFRE :\n{job_text}\n\nCRITÈRES CRITIQUES :\n{criteria_text}\n\nCV :\n{cv_text}\n"
    )
}
