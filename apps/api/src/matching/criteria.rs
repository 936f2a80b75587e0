//! Criteria Parser — turns the free-form "must-have" string into a requirement set.
//!
//! The input is a short comma/semicolon/newline separated list of phrases.
//! Unrecognized phrases are dropped, so a bad criteria string only ever
//! produces fewer constraints.

use serde::Serialize;

use crate::matching::features::{
    extract_degree_level, extract_language_level, extract_years, mentions_remote, CefrLevel,
};
use crate::matching::taxonomy::{canonicalize, contains_word, find_all, normalize_text, SkillId};

/// Location hints recognised in criteria, mapped to the label reported.
const LOCATION_HINTS: &[(&str, &str)] = &[
    ("paris", "paris"),
    ("idf", "île-de-france"),
    ("île-de-france", "île-de-france"),
    ("ile-de-france", "île-de-france"),
    ("lyon", "lyon"),
    ("marseille", "marseille"),
    ("lille", "lille"),
    ("toulouse", "toulouse"),
    ("bordeaux", "bordeaux"),
    ("nantes", "nantes"),
];

/// Words that may surround a CEFR level without naming the language.
const LANGUAGE_FILLERS: &[&str] = &["niveau", "min", "minimum", "level", "en", "cecrl", "cefr"];

/// Parsed requirement set. Built once per job run and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Criteria {
    /// De-duplicated, first-seen order.
    pub required_skills: Vec<SkillId>,
    pub min_years: Option<u32>,
    pub min_language: Option<CefrLevel>,
    /// Language named next to `min_language`, e.g. "anglais".
    pub language: Option<String>,
    pub min_degree: Option<u8>,
    pub remote_required: Option<bool>,
    pub location_hint: Option<String>,
}

impl Criteria {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Parses a criteria string. Each phrase is tried against years, CEFR level,
/// degree, remote, location, then skills; the first kind that matches wins.
pub fn parse(criteria_text: &str) -> Criteria {
    let mut criteria = Criteria::default();

    let tokens = criteria_text
        .split([',', ';', '\n'])
        .map(normalize_text)
        .filter(|t| !t.is_empty());

    for token in tokens {
        // The current year only matters for year spans, which criteria never rely on.
        if let Some(years) = extract_years(&token, 0) {
            let years = years as u32;
            criteria.min_years = Some(criteria.min_years.map_or(years, |y| y.max(years)));
            continue;
        }

        if let Some(level) = extract_language_level(&token) {
            if criteria.min_language.map_or(true, |current| level > current) {
                criteria.min_language = Some(level);
                criteria.language = language_word(&token);
            }
            continue;
        }

        if let Some(degree) = extract_degree_level(&token) {
            criteria.min_degree = Some(criteria.min_degree.map_or(degree, |d| d.max(degree)));
            continue;
        }

        if mentions_remote(&token) {
            criteria.remote_required = Some(true);
            continue;
        }

        if let Some((_, label)) = LOCATION_HINTS
            .iter()
            .find(|(hint, _)| contains_word(&token, hint))
        {
            criteria.location_hint = Some(label.to_string());
            continue;
        }

        let skills = match canonicalize(&token) {
            Some(skill) => vec![skill],
            None => find_all(&token),
        };
        for skill in skills {
            if !criteria.required_skills.contains(&skill) {
                criteria.required_skills.push(skill);
            }
        }
    }

    criteria
}

/// First alphabetic word of a CEFR phrase that is neither the level nor a filler.
fn language_word(token: &str) -> Option<String> {
    token
        .split_whitespace()
        .filter(|word| word.chars().all(char::is_alphabetic))
        .find(|word| !LANGUAGE_FILLERS.contains(word))
        .map(str::to_string)
}
