//! Skill Taxonomy — static mapping from surface forms (abbreviations, synonyms,
//! spellings) to a single canonical skill id.
//!
//! The table is processed top to bottom. If two rows claim the same surface
//! form, the later row wins. Extending the taxonomy means adding a row here.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::Serialize;

/// Bumped whenever `SKILL_TABLE` changes in a way that alters matching.
pub const TAXONOMY_VERSION: &str = "2025.1";

/// Canonical skill identifier (e.g. "python", "kubernetes").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SkillId(&'static str);

impl SkillId {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// (canonical id, surface forms). Surface forms are lower-case with single spaces.
/// The canonical form is always matched, it does not need to be listed.
const SKILL_TABLE: &[(&str, &[&str])] = &[
    // Languages
    ("python", &["python3", "python 3", "py"]),
    ("java", &["java8", "java11", "java17", "openjdk", "jdk"]),
    ("javascript", &["js", "ecmascript", "es6", "java script"]),
    ("typescript", &["ts", "type script"]),
    ("golang", &["go lang"]),
    ("rust", &["rust lang", "rustlang"]),
    ("csharp", &["c#", "c sharp", ".net", "dotnet"]),
    ("cplusplus", &["c++", "cpp"]),
    ("php", &["php7", "php8"]),
    ("ruby", &["ruby on rails", "rails", "ror"]),
    ("kotlin", &[]),
    ("swift", &[]),
    ("scala", &[]),
    ("sql", &["t-sql", "pl/sql", "plsql", "tsql"]),
    // Frontend
    ("react", &["reactjs", "react.js", "react js"]),
    ("angular", &["angularjs", "angular.js"]),
    ("vue", &["vuejs", "vue.js", "vue js"]),
    ("html", &["html5"]),
    ("css", &["css3", "scss", "sass"]),
    // Backend frameworks
    ("nodejs", &["node.js", "node js", "node"]),
    ("django", &["django rest framework", "drf"]),
    ("flask", &[]),
    ("fastapi", &["fast api"]),
    ("spring", &["spring boot", "springboot"]),
    // Data stores
    ("postgresql", &["postgres", "postgre sql"]),
    ("mysql", &["mariadb", "my sql"]),
    ("mongodb", &["mongo", "mongo db"]),
    ("redis", &[]),
    ("elasticsearch", &["elastic search", "elk"]),
    // Cloud and infra
    ("aws", &["amazon web services", "ec2", "s3", "lambda"]),
    ("gcp", &["google cloud", "google cloud platform"]),
    ("azure", &["microsoft azure", "ms azure"]),
    ("docker", &["containers", "conteneurs"]),
    ("kubernetes", &["k8s", "kube", "openshift"]),
    ("terraform", &["infrastructure as code", "iac"]),
    ("ansible", &[]),
    ("ci/cd", &["cicd", "ci cd", "gitlab ci", "github actions", "jenkins"]),
    ("git", &["github", "gitlab"]),
    ("linux", &["unix", "bash", "shell"]),
    // Data and ML
    ("machine learning", &["ml", "apprentissage automatique"]),
    ("deep learning", &["neural networks", "réseaux de neurones"]),
    ("pytorch", &["torch"]),
    ("tensorflow", &["keras"]),
    ("pandas", &[]),
    ("spark", &["pyspark", "apache spark"]),
    ("airflow", &["apache airflow"]),
    ("power bi", &["powerbi"]),
    ("tableau", &[]),
    ("excel", &["vba"]),
    ("llm", &["large language model", "llms", "genai", "ia générative"]),
    // Methods and business tools
    ("agile", &["scrum", "kanban"]),
    ("sap", &[]),
    ("salesforce", &["sfdc"]),
    ("jira", &[]),
    ("figma", &[]),
];

/// surface form -> canonical id, later rows overriding earlier ones.
static SURFACE_TO_CANONICAL: Lazy<HashMap<&'static str, SkillId>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (canonical, surfaces) in SKILL_TABLE {
        map.insert(*canonical, SkillId(*canonical));
        for surface in *surfaces {
            map.insert(*surface, SkillId(*canonical));
        }
    }
    map
});

/// Lower-cases and collapses whitespace runs into single spaces.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Resolves a single token to its canonical skill id (case-insensitive).
pub fn canonicalize(token: &str) -> Option<SkillId> {
    let normalized = normalize_text(token);
    SURFACE_TO_CANONICAL.get(normalized.as_str()).copied()
}

/// Returns every canonical skill whose surface form appears as a whole word
/// in `normalized` (already passed through `normalize_text`).
pub fn find_all(normalized: &str) -> Vec<SkillId> {
    let mut found: Vec<SkillId> = SURFACE_TO_CANONICAL
        .iter()
        .filter(|(surface, _)| contains_word(normalized, surface))
        .map(|(_, id)| *id)
        .collect();
    found.sort();
    found.dedup();
    found
}

/// Whole-word containment: the match must not touch an alphanumeric character
/// on either side, so "python" does not match inside "pythonic".
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, matched)| {
        let end = start + matched.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
