//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub reasoning_model: String,
    pub chat_model: String,
    pub generation_timeout: Duration,
    pub cors_origins: Vec<HeaderValue>,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values are treated as unset.
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        // --- Load Server Settings ---
        let bind_address_str = match (get("BIND_ADDRESS"), get("PORT")) {
            (Some(address), _) => address,
            (None, Some(port)) => format!("0.0.0.0:{}", port.trim()),
            (None, None) => "0.0.0.0:8080".to_string(),
        };
        let bind_address = bind_address_str.trim().parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = get("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.trim().parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Gemini Settings ---
        let gemini_api_key = get("GEMINI_API_KEY")
            .or_else(|| get("GOOGLE_API_KEY"))
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;
        let gemini_api_base =
            get("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string());
        let reasoning_model = get("REASONING_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let chat_model = get("CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_secs = match get("GENERATION_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "GENERATION_TIMEOUT_SECS".to_string(),
                        format!("'{}' is not a positive number of seconds", raw),
                    ))
                }
            },
            None => cognipath_core::DEFAULT_GENERATION_TIMEOUT.as_secs(),
        };

        // --- Load HTTP Boundary Settings ---
        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|e| {
                    ConfigError::InvalidValue("CORS_ORIGINS".to_string(), e.to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue("MAX_UPLOAD_BYTES".to_string(), e.to_string())
            })?,
            None => 25 * 1024 * 1024,
        };

        Ok(Self {
            bind_address,
            log_level,
            gemini_api_key,
            gemini_api_base,
            reasoning_model,
            chat_model,
            generation_timeout: Duration::from_secs(timeout_secs),
            cors_origins,
            max_upload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let config = load(&[("GEMINI_API_KEY", "secret")]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.gemini_api_key, "secret");
        assert_eq!(config.gemini_api_base, DEFAULT_GEMINI_API_BASE);
        assert_eq!(config.reasoning_model, DEFAULT_MODEL);
        assert_eq!(config.chat_model, DEFAULT_MODEL);
        assert_eq!(config.generation_timeout, Duration::from_secs(120));
        assert_eq!(config.cors_origins, vec![HeaderValue::from_static("http://localhost:5173")]);
        assert_eq!(config.max_upload_bytes, 26_214_400);
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = load(&[("GEMINI_API_KEY", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(var) if var == "GEMINI_API_KEY"));
    }

    #[test]
    fn google_api_key_is_accepted_as_fallback() {
        let config = load(&[("GOOGLE_API_KEY", "fallback")]).unwrap();
        assert_eq!(config.gemini_api_key, "fallback");
    }

    #[test]
    fn port_alone_sets_the_bind_address() {
        let config = load(&[("GEMINI_API_KEY", "k"), ("PORT", "9000")]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:9000".parse().unwrap());

        let config = load(&[
            ("GEMINI_API_KEY", "k"),
            ("PORT", "9000"),
            ("BIND_ADDRESS", "127.0.0.1:4000"),
        ])
        .unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:4000".parse().unwrap());
    }

    #[test]
    fn cors_origins_are_comma_separated() {
        let config = load(&[
            ("GEMINI_API_KEY", "k"),
            ("CORS_ORIGINS", "http://a.test, https://b.test,"),
        ])
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec![
                HeaderValue::from_static("http://a.test"),
                HeaderValue::from_static("https://b.test")
            ]
        );
    }

    #[test]
    fn invalid_values_name_the_variable() {
        for (var, value) in [
            ("BIND_ADDRESS", "nowhere"),
            ("RUST_LOG", "loud"),
            ("GENERATION_TIMEOUT_SECS", "0"),
            ("GENERATION_TIMEOUT_SECS", "soon"),
            ("MAX_UPLOAD_BYTES", "-1"),
        ] {
            let err = load(&[("GEMINI_API_KEY", "k"), (var, value)]).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue(name, _) if name == var),
                "{var}={value} gave {err:?}"
            );
        }
    }
}
