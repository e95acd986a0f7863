//! Runtime configuration read from the environment

use std::{env, fmt::Display, str::FromStr, time::Duration};

use db::models::language::Language;
use secrecy::SecretString;
use thiserror::Error;
use tracing::{info, warn};

use super::language_model::{DEFAULT_MODEL, ModelSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Missing key leaves the server running; translation requests then fail
    pub anthropic_api_key: Option<SecretString>,
    pub translation_model: String,
    pub translation_timeout: Duration,
    /// Language served when a request does not name one
    pub default_language: Language,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let anthropic_api_key = lookup("ANTHROPIC_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(SecretString::from);
        if anthropic_api_key.is_none() {
            warn!("ANTHROPIC_API_KEY not set, translation requests will fail");
        }

        Ok(Self {
            host: load(&lookup, "HOST", "127.0.0.1")?,
            port: load(&lookup, "PORT", "3001")?,
            database_url: load(&lookup, "DATABASE_URL", "sqlite://travel.db?mode=rwc")?,
            anthropic_api_key,
            translation_model: load(&lookup, "TRANSLATION_MODEL", DEFAULT_MODEL)?,
            translation_timeout: Duration::from_secs(load(&lookup, "TRANSLATION_TIMEOUT_SECS", "120")?),
            default_language: load(&lookup, "DEFAULT_LANGUAGE", "en")?,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Model client settings, if an API key is configured
    pub fn model_settings(&self) -> Option<ModelSettings> {
        let api_key = self.anthropic_api_key.clone()?;
        let mut settings = ModelSettings::new(api_key);
        settings.model = self.translation_model.clone();
        settings.timeout = self.translation_timeout;
        Some(settings)
    }
}

fn load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            message: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:3001");
        assert_eq!(config.database_url, "sqlite://travel.db?mode=rwc");
        assert_eq!(config.default_language, Language::En);
        assert_eq!(config.translation_timeout, Duration::from_secs(120));
        assert!(config.anthropic_api_key.is_none());
        assert!(config.model_settings().is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "8080"),
            ("DEFAULT_LANGUAGE", "ES"),
            ("ANTHROPIC_API_KEY", " sk-test "),
            ("TRANSLATION_MODEL", "claude-test"),
            ("TRANSLATION_TIMEOUT_SECS", "30"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_language, Language::Es);

        let settings = config.model_settings().unwrap();
        assert_eq!(settings.api_key.expose_secret(), "sk-test");
        assert_eq!(settings.model, "claude-test");
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));

        let err = config(&[("DEFAULT_LANGUAGE", "fr")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DEFAULT_LANGUAGE", .. }));
    }
}
