//! Deduplication merge rule.
//!
//! Candidates are keyed by a content-derived identity: the normalized email and
//! the digits of the phone number, hashed into a UUID v5. A record with neither
//! gets a fresh random key so two anonymous records never collide.

use std::fmt;

use tracing::debug;
use uuid::Uuid;

use crate::assessment::model::{CandidateAssessment, Identity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupeKey(Uuid);

impl DedupeKey {
    pub fn for_identity(identity: &Identity) -> Self {
        let email = identity.email.trim().to_lowercase();
        let digits: String = identity.phone.chars().filter(char::is_ascii_digit).collect();

        if email.is_empty() && digits.is_empty() {
            return Self(Uuid::new_v4());
        }
        let material = format!("{email}|{digits}");
        Self(Uuid::new_v5(&Uuid::NAMESPACE_DNS, material.as_bytes()))
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Anything carrying a global score can go through the merge rule.
pub trait Ranked {
    fn global_score(&self) -> u8;
}

impl Ranked for CandidateAssessment {
    fn global_score(&self) -> u8 {
        self.global()
    }
}

/// Keeps whichever record has the higher global score. Ties keep `existing`.
pub fn merge<T: Ranked>(existing: Option<T>, incoming: T, key: &DedupeKey) -> T {
    let Some(existing) = existing else {
        return incoming;
    };
    let (kept, dropped) = (existing.global_score(), incoming.global_score());
    if kept >= dropped {
        debug!("duplicate {key}: kept existing ({kept}), dropped incoming ({dropped})");
        existing
    } else {
        debug!("duplicate {key}: replaced existing ({kept}) with incoming ({dropped})");
        incoming
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::scorer::Score;

    fn with_global(name: &str, global: f64) -> CandidateAssessment {
        let mut a = CandidateAssessment::default();
        a.identity.name = name.to_string();
        a.scores.global = Score::clamped(global);
        a
    }

    fn identity(email: &str, phone: &str) -> Identity {
        Identity {
            email: email.to_string(),
            phone: phone.to_string(),
            ..Identity::default()
        }
    }

    #[test]
    fn test_key_is_stable_across_formatting() {
        let a = DedupeKey::for_identity(&identity(" Ada@Example.org ", "06 12 34 56 78"));
        let b = DedupeKey::for_identity(&identity("ada@example.org", "06.12.34.56.78"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_differs_per_identity() {
        let a = DedupeKey::for_identity(&identity("ada@example.org", ""));
        let b = DedupeKey::for_identity(&identity("bob@example.org", ""));
        assert_ne!(a, b);
    }

    #[test]
    fn test_anonymous_records_never_collide() {
        let a = DedupeKey::for_identity(&identity("", "  "));
        let b = DedupeKey::for_identity(&identity("", ""));
        assert_ne!(a, b);
    }

    #[test]
    fn test_merge_without_existing_stores_incoming() {
        let key = DedupeKey::for_identity(&identity("a@b.co", ""));
        let merged = merge(None, with_global("new", 40.0), &key);
        assert_eq!(merged.identity.name, "new");
    }

    #[test]
    fn test_merge_keeps_higher_global() {
        let key = DedupeKey::for_identity(&identity("a@b.co", ""));
        assert_eq!(
            merge(Some(with_global("old", 40.0)), with_global("new", 70.0), &key).identity.name,
            "new"
        );
        assert_eq!(
            merge(Some(with_global("old", 90.0)), with_global("new", 70.0), &key).identity.name,
            "old"
        );
    }

    #[test]
    fn test_merge_tie_keeps_existing() {
        let key = DedupeKey::for_identity(&identity("a@b.co", ""));
        for _ in 0..3 {
            let merged = merge(Some(with_global("old", 55.0)), with_global("new", 55.0), &key);
            assert_eq!(merged.identity.name, "old");
        }
    }
}
