//! Masking of contact details for anonymized exports.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::assessment::model::Identity;

const MASK: &str = "✱✱✱✱";

/// First character, at least one more before `@`, then the domain.
static RE_MASKABLE_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.).+(@.+)$").unwrap());

/// Masks email, phone and LinkedIn. Empty fields stay empty.
pub fn anonymize_infos(identity: &Identity) -> Identity {
    Identity {
        email: mask_email(&identity.email),
        phone: mask_phone(&identity.phone),
        linkedin: if identity.linkedin.trim().is_empty() {
            String::new()
        } else {
            "(lien)".to_string()
        },
        ..identity.clone()
    }
}

/// Values that do not look like `xy…@domain` are returned as-is.
fn mask_email(email: &str) -> String {
    RE_MASKABLE_EMAIL
        .replace(email.trim(), "${1}***${2}")
        .into_owned()
}

fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(char::is_ascii_digit).collect();
    if phone.trim().is_empty() {
        return String::new();
    }
    if digits.len() < 4 {
        return MASK.to_string();
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("{MASK} {tail}")
}
