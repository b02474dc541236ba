//! Shared configuration and small domain enums for the tikpulse workspace.

mod app_config;
mod config;

pub use app_config::{AppConfig, Environment, StoreBackend};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Service tier requested by a caller.
///
/// `Pro` unlocks the rendering-proxy fallback, LLM advice and persistence.
/// Anything that is not recognisably `pro` is treated as `Free`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
}

impl Tier {
    /// Lenient parse used for request bodies: unknown values fall back to `Free`.
    #[must_use]
    pub fn from_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("pro") => Tier::Pro,
            _ => Tier::Free,
        }
    }

    #[must_use]
    pub fn is_pro(self) -> bool {
        matches!(self, Tier::Pro)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Pro => write!(f, "pro"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_from_lenient_accepts_pro_any_case() {
        assert_eq!(Tier::from_lenient(Some("pro")), Tier::Pro);
        assert_eq!(Tier::from_lenient(Some(" PRO ")), Tier::Pro);
    }

    #[test]
    fn tier_from_lenient_defaults_to_free() {
        assert_eq!(Tier::from_lenient(None), Tier::Free);
        assert_eq!(Tier::from_lenient(Some("premium")), Tier::Free);
    }

    #[test]
    fn tier_serializes_lowercase() {
        let json = serde_json::to_string(&Tier::Pro).expect("serialize");
        assert_eq!(json, "\"pro\"");
    }
}
