//! Configuration loading, validation, and management for AgentLoom.
//!
//! Loads configuration from `~/.agentloom/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.agentloom/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model backend connection and sampling
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Orchestrator behavior
    #[serde(default)]
    pub agent: AgentConfig,

    /// Where the built-in tools keep their files
    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Chat model
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_context_window")]
    pub context_window: u32,
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "phi3".into()
}
fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}
fn default_timeout_ms() -> u64 {
    60_000
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_temperature() -> f32 {
    0.7
}
fn default_context_window() -> u32 {
    2048
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            timeout_ms: default_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            context_window: default_context_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model round-trips allowed per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Language every agent must answer in
    #[serde(default = "default_response_language")]
    pub response_language: String,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_response_language() -> String {
    "Brazilian Portuguese (pt-BR)".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            response_language: default_response_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    /// Entries kept by `save_log`
    #[serde(default = "default_max_log_entries")]
    pub max_log_entries: usize,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data")
}
fn default_max_log_entries() -> usize {
    1000
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            max_log_entries: default_max_log_entries(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.agentloom/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Load a config file, then apply environment variable overrides:
    /// - `OLLAMA_BASE_URL`, `OLLAMA_MODEL`, `OLLAMA_EMBEDDING_MODEL`
    /// - `OLLAMA_TIMEOUT` (ms), `OLLAMA_MAX_TOKENS`
    /// - `AGENTLOOM_MAX_ITERATIONS`
    /// - `DATA_PATH`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (the process environment in production).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.ollama.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.ollama.model = model;
        }
        if let Some(model) = lookup("OLLAMA_EMBEDDING_MODEL") {
            self.ollama.embedding_model = model;
        }
        if let Some(raw) = lookup("OLLAMA_TIMEOUT") {
            self.ollama.timeout_ms = parse_number("OLLAMA_TIMEOUT", &raw)?;
        }
        if let Some(raw) = lookup("OLLAMA_MAX_TOKENS") {
            self.ollama.max_tokens = parse_number("OLLAMA_MAX_TOKENS", &raw)?;
        }
        if let Some(raw) = lookup("AGENTLOOM_MAX_ITERATIONS") {
            self.agent.max_iterations = parse_number("AGENTLOOM_MAX_ITERATIONS", &raw)?;
        }
        if let Some(path) = lookup("DATA_PATH") {
            self.data.path = PathBuf::from(path);
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentloom")
    }

    /// Default config file location.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ollama.temperature < 0.0 || self.ollama.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "ollama.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.ollama.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ollama.base_url must not be empty".into(),
            ));
        }

        if self.ollama.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ollama.model must not be empty".into(),
            ));
        }

        if self.ollama.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "ollama.timeout_ms must be > 0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be >= 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `config --init`).
    pub fn default_toml() -> String {
        Self::default().to_toml()
    }

    /// Render this configuration as TOML.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| {
        ConfigError::ValidationError(format!("{key} must be a non-negative integer, got '{raw}'"))
    })
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.ollama.model, "phi3");
        assert_eq!(config.ollama.timeout_ms, 60_000);
        assert_eq!(config.agent.max_iterations, 10);
        assert_eq!(config.data.max_log_entries, 1000);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = config.to_toml();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.ollama.model, config.ollama.model);
        assert_eq!(parsed.data.path, config.data.path);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [ollama]
            model = "llama3"

            [agent]
            max_iterations = 4
            "#,
        )
        .unwrap();
        assert_eq!(parsed.ollama.model, "llama3");
        assert_eq!(parsed.ollama.context_window, 2048);
        assert_eq!(parsed.agent.max_iterations, 4);
        assert_eq!(parsed.agent.response_language, "Brazilian Portuguese (pt-BR)");
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.ollama.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_iterations"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().ollama.model, "phi3");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ollama]\nbase_url = \"http://gpu-box:11434\"\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.ollama.base_url, "http://gpu-box:11434");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ollama\nmodel = ").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_win() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[
                ("OLLAMA_BASE_URL", "http://10.0.0.2:11434"),
                ("OLLAMA_MODEL", "mistral"),
                ("OLLAMA_TIMEOUT", "5000"),
                ("OLLAMA_MAX_TOKENS", "256"),
                ("AGENTLOOM_MAX_ITERATIONS", "3"),
                ("DATA_PATH", "/var/lib/agentloom"),
            ]))
            .unwrap();

        assert_eq!(config.ollama.base_url, "http://10.0.0.2:11434");
        assert_eq!(config.ollama.model, "mistral");
        assert_eq!(config.ollama.timeout_ms, 5000);
        assert_eq!(config.ollama.max_tokens, 256);
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.data.path, PathBuf::from("/var/lib/agentloom"));
        assert_eq!(config.ollama.embedding_model, "nomic-embed-text");
    }

    #[test]
    fn non_numeric_env_override_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_overrides(env(&[("OLLAMA_TIMEOUT", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("OLLAMA_TIMEOUT"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("[ollama]"));
        assert!(toml_str.contains("phi3"));
        assert!(toml_str.contains("max_log_entries = 1000"));
    }
}
