//! Process configuration, read once from the environment at start-up.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro-exp-03-25";
pub const DEFAULT_LISTING_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// Which predictor serves `POST /api/predictions`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PredictionBackend {
    Heuristic,
    Gemini,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    /// Absent key is a request-time configuration error, not a start-up one.
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Password sign-in is disabled when unset.
    pub url: Option<String>,
    pub anon_key: String,
    pub jwt_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// In-memory store when unset.
    pub database_url: Option<String>,
    pub supabase: SupabaseConfig,
    pub prediction_backend: PredictionBackend,
    pub gemini: GeminiConfig,
    pub listing_debounce: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an explicit variable map (tests, embedding).
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", format!("'{bind_raw}': {e}")))?;

        let jwt_secret = get("SUPABASE_JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("SUPABASE_JWT_SECRET not set; using insecure dev default");
            DEFAULT_JWT_SECRET.to_string()
        });

        let gemini = GeminiConfig {
            api_key: get("GEMINI_API_KEY"),
            api_url: get("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        };

        let prediction_backend = match get("PREDICTION_BACKEND") {
            None if gemini.api_key.is_some() => PredictionBackend::Gemini,
            None => PredictionBackend::Heuristic,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "heuristic" => PredictionBackend::Heuristic,
                "gemini" => PredictionBackend::Gemini,
                other => {
                    return Err(ConfigError::invalid(
                        "PREDICTION_BACKEND",
                        format!("expected heuristic or gemini, got '{other}'"),
                    ));
                }
            },
        };

        let listing_debounce = match get("LISTING_DEBOUNCE_MS") {
            None => DEFAULT_LISTING_DEBOUNCE,
            Some(raw) => Duration::from_millis(raw.parse::<u64>().map_err(|e| {
                ConfigError::invalid("LISTING_DEBOUNCE_MS", format!("'{raw}': {e}"))
            })?),
        };

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            supabase: SupabaseConfig {
                url: get("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string()),
                anon_key: get("SUPABASE_ANON_KEY").unwrap_or_default(),
                jwt_secret,
            },
            prediction_backend,
            gemini,
            listing_debounce,
        })
    }
}
