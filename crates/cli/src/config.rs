//! Configuration loading from handoff.toml.

use activity::{ActivityOptions, RetryPolicy};
use runtime::OpenAiBackend;
use runtime::providers::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable consulted when the file carries no API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Top-level configuration.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Timeouts and retries around model calls.
    #[serde(default)]
    pub activity: ActivityConfig,
}

/// Backend provider configuration.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Provider name (currently only "openai" supported).
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    /// API root of an OpenAI-compatible server.
    pub base_url: Option<String>,

    /// API key; falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            api_key: None,
        }
    }
}

/// Activity options as written in the file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    pub start_to_close_secs: u64,
    /// Start-to-close bound for the triage classification call.
    pub classify_timeout_secs: u64,
    pub initial_interval_ms: u64,
    pub backoff_coefficient: f64,
    pub maximum_interval_ms: u64,
    pub maximum_attempts: u32,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            start_to_close_secs: 30,
            classify_timeout_secs: 10,
            initial_interval_ms: 1_000,
            backoff_coefficient: 2.0,
            maximum_interval_ms: 10_000,
            maximum_attempts: 3,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load the file if it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve the API key: the file first, then the given environment value.
    pub fn api_key(&self, env: Option<String>) -> Result<String, ConfigError> {
        self.backend
            .api_key
            .clone()
            .into_iter()
            .chain(env)
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    /// API key from the file or the process environment.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        self.api_key(std::env::var(API_KEY_ENV).ok())
    }

    /// Build the model backend, with an optional model override.
    pub fn backend(&self, model: Option<&str>) -> Result<OpenAiBackend, ConfigError> {
        if self.backend.provider != "openai" {
            return Err(ConfigError::UnsupportedProvider(self.backend.provider.clone()));
        }
        let api_key = self.resolve_api_key()?;
        Ok(OpenAiBackend::builder(api_key)
            .base_url(self.backend.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))
            .model(model.unwrap_or(&self.backend.model))
            .build())
    }

    /// Activity options, validated.
    pub fn activity_options(&self) -> Result<ActivityOptions, ConfigError> {
        let a = &self.activity;
        if a.start_to_close_secs == 0 {
            return Err(ConfigError::Invalid(
                "activity.start_to_close_secs must be positive".into(),
            ));
        }
        let policy = RetryPolicy {
            initial_interval: Duration::from_millis(a.initial_interval_ms),
            backoff_coefficient: a.backoff_coefficient,
            maximum_interval: Duration::from_millis(a.maximum_interval_ms),
            maximum_attempts: a.maximum_attempts,
        };
        policy.validate().map_err(ConfigError::Invalid)?;
        Ok(ActivityOptions::default()
            .with_timeout(Duration::from_secs(a.start_to_close_secs))
            .with_retry_policy(policy))
    }

    /// Options for the classification activity: the shorter timeout under
    /// the same retry policy.
    pub fn classify_options(&self) -> Result<ActivityOptions, ConfigError> {
        if self.activity.classify_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "activity.classify_timeout_secs must be positive".into(),
            ));
        }
        Ok(self
            .activity_options()?
            .with_timeout(Duration::from_secs(self.activity.classify_timeout_secs)))
    }
}

/// Show only the first 8 and last 4 characters of a key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("API key not configured: set backend.api_key or {API_KEY_ENV}")]
    MissingApiKey,

    #[error("unsupported provider '{0}' (only 'openai' is supported)")]
    UnsupportedProvider(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
