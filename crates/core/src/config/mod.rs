//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LESSONLENS_*)
//! 2. TOML config file (if LESSONLENS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LESSONLENS_*)
/// 2. TOML config file (if LESSONLENS_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via LESSONLENS_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to download per document.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Timeout of the HEAD request that determines the content type, in milliseconds.
    #[serde(default = "default_head_timeout_ms")]
    pub head_timeout_ms: u64,

    /// Timeout of the full-content GET request, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Number of characters of page text handed to the classifiers.
    #[serde(default = "default_content_char_limit")]
    pub content_char_limit: usize,

    /// Number of search results enriched concurrently.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Anthropic API key for the classification model.
    ///
    /// Set via LESSONLENS_ANTHROPIC_API_KEY environment variable.
    /// Required only when a classification has to reach the model.
    #[serde(default)]
    pub anthropic_api_key: Option<String>,

    /// Base URL of the Anthropic API.
    #[serde(default = "default_anthropic_base_url")]
    pub anthropic_base_url: String,

    /// Model identifier sent with each completion request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens per model reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Timeout of a single model request, in milliseconds.
    #[serde(default = "default_llm_timeout_ms")]
    pub llm_timeout_ms: u64,

    /// How often a rate-limited or failed model request is retried.
    #[serde(default = "default_llm_max_retries")]
    pub llm_max_retries: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./lessonlens-cache.sqlite")
}

fn default_user_agent() -> String {
    "lessonlens/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_head_timeout_ms() -> u64 {
    5_000
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_content_char_limit() -> usize {
    5_000
}

fn default_worker_count() -> usize {
    10
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com/v1".into()
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".into()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_llm_timeout_ms() -> u64 {
    60_000
}

fn default_llm_max_retries() -> u32 {
    2
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            head_timeout_ms: default_head_timeout_ms(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            content_char_limit: default_content_char_limit(),
            worker_count: default_worker_count(),
            anthropic_api_key: None,
            anthropic_base_url: default_anthropic_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            llm_timeout_ms: default_llm_timeout_ms(),
            llm_max_retries: default_llm_max_retries(),
        }
    }
}

impl AppConfig {
    /// HEAD timeout as Duration for use with reqwest/tokio.
    pub fn head_timeout(&self) -> Duration {
        Duration::from_millis(self.head_timeout_ms)
    }

    /// GET timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Model request timeout as Duration.
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LESSONLENS_`
    /// 2. TOML file from `LESSONLENS_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LESSONLENS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LESSONLENS_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if the Anthropic API key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_anthropic_api_key(&self) -> Result<&str, ConfigError> {
        self.anthropic_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "anthropic_api_key".into(),
                hint: "Set LESSONLENS_ANTHROPIC_API_KEY environment variable".into(),
            })
    }
}
