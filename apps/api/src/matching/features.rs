//! Text Feature Extractor — pulls skills, experience, language level, degree
//! level and contact tokens out of a plain-text blob.
//!
//! Pure and total: a missing signal is `None`, never an error. Zero years is a
//! real value and stays distinguishable from "unknown".

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matching::taxonomy::{contains_word, find_all, normalize_text, SkillId};

/// CEFR proficiency, ordered from A1 (lowest) to C2 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// Parses "b2", "C1", ... (exact two-character token).
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "a1" => Some(Self::A1),
            "a2" => Some(Self::A2),
            "b1" => Some(Self::B1),
            "b2" => Some(Self::B2),
            "c1" => Some(Self::C1),
            "c2" => Some(Self::C2),
            _ => None,
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        };
        f.write_str(label)
    }
}

/// Contact-like tokens found in a CV. Only the first occurrence of each is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactTokens {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
}

/// Signals derived from one text blob. Built fresh per call, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedFeatures {
    pub skills: BTreeSet<SkillId>,
    pub years_experience: Option<f32>,
    pub language_level: Option<CefrLevel>,
    /// Years of post-bac study (bachelor≈3, master≈5, doctorate≈8). Ordinal only.
    pub degree_level: Option<u8>,
    pub mentions_remote: bool,
    pub soft_signals: BTreeSet<&'static str>,
    pub contacts: ContactTokens,
}

/// Degree floors implied by diploma names.
pub const BACHELOR_LEVEL: u8 = 3;
pub const MASTER_LEVEL: u8 = 5;
pub const DOCTORATE_LEVEL: u8 = 8;

static RE_YEARS_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\s*\+?\s*(?:years?|yrs?|ans|années?|annees?)\b").unwrap()
});

static RE_YEAR_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b((?:19|20)\d{2})\s*(?:-|–|—|/|à|au|to)\s*((?:19|20)\d{2}|present|présent|now|today|current|aujourd'hui|aujourd’hui|actuel|ce jour)\b",
    )
    .unwrap()
});

static RE_CEFR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([abc][12])\b").unwrap());

static RE_BAC_PLUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bbac\s*\+\s*(\d{1,2})\b").unwrap());

static RE_MASTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:masters?|msc|m\.sc|mba)\b").unwrap());

static RE_DOCTORATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:doctorat|doctorate|phd|ph\.d)\b").unwrap());

static RE_BACHELOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bbachelors?\b").unwrap());

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}").unwrap());

static RE_PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(?:\+|00)\d{1,3}[\s.-]?|\b0)[1-9](?:[\s.-]?\d{2}){4}\b").unwrap()
});

static RE_LINKEDIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?(?:[a-z]{2,3}\.)?linkedin\.com/in/[a-z0-9_%-]+/?").unwrap()
});

const REMOTE_MARKERS: &[&str] = &[
    "remote",
    "télétravail",
    "teletravail",
    "travail à distance",
];

/// (indicator, phrases). One indicator counts once however many phrases hit.
const SOFT_SKILL_LEXICON: &[(&str, &[&str])] = &[
    ("communication", &["communication", "communicant", "communicante"]),
    ("leadership", &["leadership", "leader"]),
    ("autonomie", &["autonomie", "autonome", "autonomy", "autonomous"]),
    (
        "esprit d'équipe",
        &["esprit d'équipe", "travail en équipe", "teamwork", "team player"],
    ),
    ("rigueur", &["rigueur", "rigoureux", "rigoureuse", "rigorous"]),
    ("adaptabilité", &["adaptabilité", "adaptability", "flexibilité"]),
    (
        "résolution de problèmes",
        &["résolution de problèmes", "problem solving", "problem-solving"],
    ),
    ("organisation", &["organisation", "organisé", "organisée", "organized"]),
    ("curiosité", &["curiosité", "curieux", "curieuse", "curious"]),
    ("créativité", &["créativité", "créatif", "créative", "creative", "creativity"]),
    ("empathie", &["empathie", "empathy", "à l'écoute"]),
    ("négociation", &["négociation", "negotiation"]),
    ("mentorat", &["mentorat", "mentoring", "coaching"]),
];

/// Extracts features relative to the current calendar year.
pub fn extract(text: &str) -> ExtractedFeatures {
    extract_at(text, Utc::now().year())
}

/// Extracts features, resolving "present"/"now" in year spans to `current_year`.
pub fn extract_at(text: &str, current_year: i32) -> ExtractedFeatures {
    let normalized = normalize_text(text);

    ExtractedFeatures {
        skills: find_all(&normalized).into_iter().collect(),
        years_experience: extract_years(&normalized, current_year),
        language_level: extract_language_level(&normalized),
        degree_level: extract_degree_level(&normalized),
        mentions_remote: mentions_remote(&normalized),
        soft_signals: extract_soft_signals(&normalized),
        contacts: extract_contacts(&normalized),
    }
}

/// Maximum over explicit "N years" mentions and computed year spans.
pub(crate) fn extract_years(normalized: &str, current_year: i32) -> Option<f32> {
    let mentions = RE_YEARS_MENTION
        .captures_iter(normalized)
        .filter_map(|c| c[1].parse::<f32>().ok());

    let spans = RE_YEAR_SPAN.captures_iter(normalized).filter_map(|c| {
        let start: i32 = c[1].parse().ok()?;
        let end: i32 = c[2].parse().unwrap_or(current_year);
        let duration = end - start;
        (duration > 0).then_some(duration as f32)
    });

    mentions.chain(spans).reduce(f32::max)
}

pub(crate) fn extract_language_level(normalized: &str) -> Option<CefrLevel> {
    RE_CEFR
        .captures_iter(normalized)
        .filter_map(|c| CefrLevel::from_token(&c[1]))
        .max()
}

pub(crate) fn extract_degree_level(normalized: &str) -> Option<u8> {
    let mut levels: Vec<u8> = RE_BAC_PLUS
        .captures_iter(normalized)
        .filter_map(|c| c[1].parse::<u8>().ok())
        .collect();

    if RE_BACHELOR.is_match(normalized) {
        levels.push(BACHELOR_LEVEL);
    }
    if RE_MASTER.is_match(normalized) {
        levels.push(MASTER_LEVEL);
    }
    if RE_DOCTORATE.is_match(normalized) {
        levels.push(DOCTORATE_LEVEL);
    }

    levels.into_iter().max()
}

pub(crate) fn mentions_remote(normalized: &str) -> bool {
    REMOTE_MARKERS
        .iter()
        .any(|marker| contains_word(normalized, marker))
}

fn extract_soft_signals(normalized: &str) -> BTreeSet<&'static str> {
    SOFT_SKILL_LEXICON
        .iter()
        .filter(|(_, phrases)| phrases.iter().any(|p| contains_word(normalized, p)))
        .map(|(indicator, _)| *indicator)
        .collect()
}

fn extract_contacts(normalized: &str) -> ContactTokens {
    ContactTokens {
        email: RE_EMAIL.find(normalized).map(|m| m.as_str().to_string()),
        phone: RE_PHONE.find(normalized).map(|m| m.as_str().trim().to_string()),
        linkedin: RE_LINKEDIN.find(normalized).map(|m| m.as_str().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CV_FIXTURE: &str = r#"
        Jeanne Martin — Data Engineer
        jeanne.martin@example.fr | 06 12 34 56 78 | linkedin.com/in/jeanne-martin
        Expérience : 2019 - 2023 chez Acme (Python, Spark, AWS), 2023 - présent chez Beta.
        Formation : Master Informatique (Bac+5). Anglais C1, allemand B1.
        Rigoureuse, autonome, excellente communication. Ouverte au télétravail.
    "#;

    #[test]
    fn test_extract_full_cv() {
        let features = extract_at(CV_FIXTURE, 2025);
        let skills: Vec<&str> = features.skills.iter().map(|s| s.as_str()).collect();
        assert_eq!(skills, vec!["aws", "python", "spark"]);
        assert_eq!(features.years_experience, Some(4.0));
        assert_eq!(features.language_level, Some(CefrLevel::C1));
        assert_eq!(features.degree_level, Some(5));
        assert!(features.mentions_remote);
        assert_eq!(features.soft_signals.len(), 3);
        assert_eq!(
            features.contacts.email.as_deref(),
            Some("jeanne.martin@example.fr")
        );
        assert_eq!(features.contacts.phone.as_deref(), Some("06 12 34 56 78"));
        assert_eq!(
            features.contacts.linkedin.as_deref(),
            Some("linkedin.com/in/jeanne-martin")
        );
    }

    #[test]
    fn test_empty_text_has_no_signals() {
        let features = extract_at("", 2025);
        assert_eq!(features, ExtractedFeatures::default());
    }

    #[test]
    fn test_years_takes_maximum_mention() {
        assert_eq!(extract_years("3 ans de python puis 7 years of java", 2025), Some(7.0));
        assert_eq!(extract_years("5+ ans d'expérience", 2025), Some(5.0));
    }

    #[test]
    fn test_years_zero_is_distinct_from_unknown() {
        assert_eq!(extract_years("0 ans d'expérience", 2025), Some(0.0));
        assert_eq!(extract_years("débutant motivé", 2025), None);
    }

    #[test]
    fn test_years_present_resolves_to_current_year() {
        assert_eq!(extract_years("2020 - present", 2025), Some(5.0));
        assert_eq!(extract_years("2020–now", 2024), Some(4.0));
    }

    #[test]
    fn test_years_discards_negative_and_empty_spans() {
        assert_eq!(extract_years("2023 - 2019", 2025), None);
        assert_eq!(extract_years("2021 - 2021", 2025), None);
    }

    #[test]
    fn test_years_ignore_digits_inside_calendar_years() {
        assert_eq!(extract_years("diplômé en 2019 years ago", 2025), None);
    }

    #[test]
    fn test_language_level_reports_maximum() {
        assert_eq!(
            extract_language_level("anglais b2, espagnol c1, italien a2"),
            Some(CefrLevel::C1)
        );
        assert_eq!(extract_language_level("anglais courant"), None);
    }

    #[test]
    fn test_cefr_ordering() {
        assert!(CefrLevel::A1 < CefrLevel::A2);
        assert!(CefrLevel::B2 < CefrLevel::C1);
        assert!(CefrLevel::C1 < CefrLevel::C2);
    }

    #[test]
    fn test_degree_level_floors() {
        assert_eq!(extract_degree_level("bac+2 puis bac + 3"), Some(3));
        assert_eq!(extract_degree_level("msc in computer science"), Some(5));
        assert_eq!(extract_degree_level("phd candidate, bac+5"), Some(8));
        assert_eq!(extract_degree_level("bachelor of science"), Some(3));
        assert_eq!(extract_degree_level("autodidacte"), None);
    }

    #[test]
    fn test_remote_detection_is_whole_word() {
        assert!(mentions_remote("poste en full remote"));
        assert!(mentions_remote("2 jours de télétravail"));
        assert!(!mentions_remote("remotely operated vehicles"));
    }

    #[test]
    fn test_soft_signals_count_indicators_once() {
        let signals = extract_soft_signals("leader, leadership reconnu, team player");
        assert_eq!(
            signals.into_iter().collect::<Vec<_>>(),
            vec!["esprit d'équipe", "leadership"]
        );
    }
}
