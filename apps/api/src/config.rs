use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::assessment::hybrid::{clamp_alpha, DEFAULT_ALPHA};
use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::matching::scorer::{ScoreWeights, ScoringPolicy};

pub const MAX_WORKERS_LIMIT: usize = 8;

/// Application configuration loaded from environment variables.
/// Every variable is optional; a malformed value fails startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// `None` disables the model collaborator; results are rule-only.
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub model_timeout_secs: u64,
    pub weights: ScoreWeights,
    pub hybrid_alpha: f64,
    pub qualify_threshold: u8,
    pub dedupe_enabled: bool,
    pub max_workers: usize,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub policy: ScoringPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            llm_api_key: None,
            llm_base_url: DEFAULT_BASE_URL.to_string(),
            llm_model: DEFAULT_MODEL.to_string(),
            model_timeout_secs: 45,
            weights: ScoreWeights::default(),
            hybrid_alpha: DEFAULT_ALPHA,
            qualify_threshold: 70,
            dedupe_enabled: true,
            max_workers: 3,
            cache_ttl_secs: 3600,
            cache_capacity: 256,
            policy: ScoringPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests need not touch
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut policy = defaults.policy.clone();
        policy.gate_cap = parse_or(&get, "GATE_CAP", policy.gate_cap)?;
        policy.fit_remote_bonus = parse_or(&get, "FIT_REMOTE_BONUS", policy.fit_remote_bonus)?;
        policy.fit_remote_penalty =
            parse_or(&get, "FIT_REMOTE_PENALTY", policy.fit_remote_penalty)?;
        policy.fit_language_penalty =
            parse_or(&get, "FIT_LANGUAGE_PENALTY", policy.fit_language_penalty)?;
        policy.fit_degree_penalty =
            parse_or(&get, "FIT_DEGREE_PENALTY", policy.fit_degree_penalty)?;
        if policy.gate_cap > 100 {
            bail!("GATE_CAP must be within 0..=100");
        }

        let weights = match get("SCORE_WEIGHTS") {
            Some(raw) => parse_weights(&raw)
                .with_context(|| format!("SCORE_WEIGHTS '{raw}' must be four comma-separated numbers"))?,
            None => defaults.weights,
        };

        let max_workers: usize = parse_or(&get, "MAX_WORKERS", defaults.max_workers)?;

        Ok(Config {
            port: parse_or(&get, "PORT", defaults.port)?,
            rust_log: get("RUST_LOG").unwrap_or(defaults.rust_log),
            llm_api_key: get("LLM_API_KEY"),
            llm_base_url: get("LLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            llm_model: get("LLM_MODEL").unwrap_or(defaults.llm_model),
            model_timeout_secs: parse_or(&get, "MODEL_TIMEOUT_SECS", defaults.model_timeout_secs)?,
            weights,
            hybrid_alpha: clamp_alpha(parse_or(&get, "HYBRID_ALPHA", defaults.hybrid_alpha)?),
            qualify_threshold: parse_or(&get, "QUALIFY_THRESHOLD", defaults.qualify_threshold)?,
            dedupe_enabled: parse_or(&get, "DEDUPE_ENABLED", defaults.dedupe_enabled)?,
            max_workers: max_workers.clamp(1, MAX_WORKERS_LIMIT),
            cache_ttl_secs: parse_or(&get, "CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
            cache_capacity: parse_or(&get, "CACHE_CAPACITY", defaults.cache_capacity)?,
            policy,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

/// "40,30,15,15" → weights in tech, experience, soft, fit order.
pub fn parse_weights(raw: &str) -> Result<ScoreWeights> {
    let parts = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .context("weight is not a number")?;
    let &[tech, experience, soft, fit] = parts.as_slice() else {
        bail!("expected 4 weights, got {}", parts.len());
    };
    Ok(ScoreWeights {
        tech,
        experience,
        soft,
        fit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.llm_api_key.is_none());
        assert_eq!(config.llm_model, "llama-3.3-70b-versatile");
        assert_eq!(config.max_workers, 3);
        assert_eq!(config.qualify_threshold, 70);
        assert!(config.dedupe_enabled);
        assert_eq!(config.policy, ScoringPolicy::default());
        assert_eq!(config.weights, ScoreWeights::default());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("LLM_API_KEY", "sk-test"),
            ("SCORE_WEIGHTS", "50, 30, 10, 10"),
            ("HYBRID_ALPHA", "1.7"),
            ("MAX_WORKERS", "32"),
            ("DEDUPE_ENABLED", "false"),
            ("GATE_CAP", "39"),
            ("FIT_LANGUAGE_PENALTY", "20"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.llm_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.weights.tech, 50.0);
        assert_eq!(config.hybrid_alpha, 1.0);
        assert_eq!(config.max_workers, 8);
        assert!(!config.dedupe_enabled);
        assert_eq!(config.policy.gate_cap, 39);
        assert_eq!(config.policy.fit_language_penalty, 20.0);
    }

    #[test]
    fn test_blank_api_key_disables_model() {
        let config = config_from(&[("LLM_API_KEY", "   ")]).unwrap();
        assert!(config.llm_api_key.is_none());
    }

    #[test]
    fn test_malformed_values_fail_with_context() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        assert!(config_from(&[("SCORE_WEIGHTS", "40,30,15")]).is_err());
        assert!(config_from(&[("SCORE_WEIGHTS", "40,abc,15,15")]).is_err());
        assert!(config_from(&[("GATE_CAP", "150")]).is_err());
        assert!(config_from(&[("MAX_WORKERS", "0")]).unwrap().max_workers == 1);
    }
}
