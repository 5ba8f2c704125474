//! Configuration loading, validation, and management for callmill.
//!
//! Loads configuration from `~/.callmill/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.callmill/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default export flags and filters
    #[serde(default)]
    pub export: ExportConfig,

    /// Fine-tuning model, epochs, and price overrides
    #[serde(default)]
    pub training: TrainingConfig,

    /// Train/validation split
    #[serde(default)]
    pub split: SplitConfig,

    /// Token estimation heuristic
    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    /// Example and dataset validation limits
    #[serde(default)]
    pub validation: ValidationConfig,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_true")]
    pub include_system_prompt: bool,

    #[serde(default = "default_true")]
    pub include_tools: bool,

    #[serde(default)]
    pub include_context: bool,

    #[serde(default)]
    pub tool_calls_only: bool,

    /// Only export conversations for this agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    /// Only export conversations carrying this tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Maximum number of conversations to export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            include_system_prompt: true,
            include_tools: true,
            include_context: false,
            tool_calls_only: false,
            agent_id: None,
            tag: None,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Model priced by the cost estimate
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_epochs")]
    pub epochs: u32,

    /// Price per 1M training tokens in USD, by model name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_pricing: BTreeMap<String, f64>,
}

fn default_model() -> String {
    "gpt-4o".into()
}
fn default_epochs() -> u32 {
    3
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            epochs: default_epochs(),
            custom_pricing: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of examples assigned to the train set, in (0, 1]
    #[serde(default = "default_train_ratio")]
    pub train_ratio: f64,

    /// Seed for a reproducible shuffle; random when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_train_ratio() -> f64 {
    0.8
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_ratio: default_train_ratio(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
}

fn default_chars_per_token() -> usize {
    4
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            chars_per_token: default_chars_per_token(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Examples estimated above this many tokens are excluded
    #[serde(default = "default_max_example_tokens")]
    pub max_example_tokens: usize,

    /// Fewer exported examples than this raises a dataset warning
    #[serde(default = "default_min_dataset_examples")]
    pub min_dataset_examples: usize,
}

fn default_max_example_tokens() -> usize {
    65_536
}
fn default_min_dataset_examples() -> usize {
    10
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_example_tokens: default_max_example_tokens(),
            min_dataset_examples: default_min_dataset_examples(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.callmill/config.toml).
    ///
    /// Environment variables override the file:
    /// - `CALLMILL_MODEL`
    /// - `CALLMILL_EPOCHS`
    /// - `CALLMILL_SPLIT_SEED`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
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

    /// Apply `CALLMILL_*` overrides read through `lookup`.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(model) = lookup("CALLMILL_MODEL") {
            self.training.model = model;
        }

        if let Some(epochs) = lookup("CALLMILL_EPOCHS") {
            self.training.epochs = epochs.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("CALLMILL_EPOCHS is not a number: {epochs}"))
            })?;
        }

        if let Some(seed) = lookup("CALLMILL_SPLIT_SEED") {
            self.split.seed = Some(seed.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("CALLMILL_SPLIT_SEED is not a number: {seed}"))
            })?);
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".callmill")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.split.train_ratio > 0.0 && self.split.train_ratio <= 1.0) {
            return Err(ConfigError::ValidationError(
                "split.train_ratio must be in (0.0, 1.0]".into(),
            ));
        }

        if self.training.epochs == 0 {
            return Err(ConfigError::ValidationError(
                "training.epochs must be at least 1".into(),
            ));
        }

        if self.tokenizer.chars_per_token == 0 {
            return Err(ConfigError::ValidationError(
                "tokenizer.chars_per_token must be at least 1".into(),
            ));
        }

        if self.validation.max_example_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "validation.max_example_tokens must be at least 1".into(),
            ));
        }

        if let Some((model, _)) = self
            .training
            .custom_pricing
            .iter()
            .find(|(_, price)| !price.is_finite() || **price < 0.0)
        {
            return Err(ConfigError::ValidationError(format!(
                "training.custom_pricing.{model} must be a non-negative number"
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
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
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.training.model, "gpt-4o");
        assert_eq!(config.training.epochs, 3);
        assert_eq!(config.split.train_ratio, 0.8);
        assert_eq!(config.tokenizer.chars_per_token, 4);
        assert_eq!(config.validation.max_example_tokens, 65_536);
        assert_eq!(config.validation.min_dataset_examples, 10);
        assert!(config.export.include_system_prompt);
        assert!(!config.export.include_context);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn invalid_ratio_rejected() {
        for ratio in [0.0, 1.2, -0.1] {
            let mut config = AppConfig::default();
            config.split.train_ratio = ratio;
            assert!(config.validate().is_err(), "ratio {ratio} accepted");
        }
    }

    #[test]
    fn zero_epochs_and_zero_chars_rejected() {
        let mut config = AppConfig::default();
        config.training.epochs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.tokenizer.chars_per_token = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_custom_price_rejected() {
        let mut config = AppConfig::default();
        config.training.custom_pricing.insert("my-model".into(), -1.0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("my-model"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert_eq!(result.unwrap(), AppConfig::default());
    }

    #[test]
    fn load_from_file_with_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[export]
include_context = true
tag = "gold"
limit = 50

[training]
model = "gpt-4o-mini"

[training.custom_pricing]
"ft-house-model" = 4.5

[split]
seed = 7
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert!(config.export.include_context);
        assert!(config.export.include_tools);
        assert_eq!(config.export.tag.as_deref(), Some("gold"));
        assert_eq!(config.export.limit, Some(50));
        assert_eq!(config.training.model, "gpt-4o-mini");
        assert_eq!(config.training.epochs, 3);
        assert_eq!(config.training.custom_pricing["ft-house-model"], 4.5);
        assert_eq!(config.split.seed, Some(7));
        assert_eq!(config.split.train_ratio, 0.8);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[split\ntrain_ratio = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn invalid_file_is_validation_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[split]\ntrain_ratio = 2.0\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("CALLMILL_MODEL", "gpt-4.1-mini"),
            ("CALLMILL_EPOCHS", "5"),
            ("CALLMILL_SPLIT_SEED", "42"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.training.model, "gpt-4.1-mini");
        assert_eq!(config.training.epochs, 5);
        assert_eq!(config.split.seed, Some(42));
    }

    #[test]
    fn env_override_must_be_numeric() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(|k| {
            (k == "CALLMILL_EPOCHS").then(|| "three".to_string())
        });
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o"));
        assert!(toml_str.contains("65536"));
        assert!(toml_str.contains("[split]"));
    }
}
