//! Configuration management for Pagewright
//!
//! This module provides the configuration structures for the generation
//! service, retry behavior, asset limits and an optional custom questionnaire.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::types::QuestionSpec;
use crate::{PagewrightError, Result};

/// Directory holding the config file, relative to the working directory
pub const CONFIG_DIR: &str = ".pagewright";
/// Config file name inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "config.toml";

/// Top-level Pagewright configuration
///
/// Loaded from `.pagewright/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagewrightConfig {
    /// Generation service settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Backoff for transient generation failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Limits on uploaded images
    #[serde(default)]
    pub assets: AssetConfig,

    /// Interview settings
    #[serde(default)]
    pub wizard: WizardConfig,
}

/// Generation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model alias (`flash` or `pro`)
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the generative language API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Per-call timeout; expiry is reported as a `Timeout` failure
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Retry settings for transient generation failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

/// Asset limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Largest accepted image, in bytes
    #[serde(default = "default_max_asset_bytes")]
    pub max_bytes: usize,
}

/// Interview settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Replaces the built-in questionnaire when non-empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<QuestionSpec>,
}

// Default value providers
fn default_model() -> String {
    "flash".to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_max_backoff_ms() -> u64 {
    8000
}

fn default_max_asset_bytes() -> usize {
    5 * 1024 * 1024
}

impl PagewrightConfig {
    /// Path of the config file under `root`
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load configuration from `.pagewright/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = Self::path_in(root);

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate a specific config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            PagewrightError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write default configuration to `.pagewright/config.toml`
    pub fn write_default(root: &Path) -> Result<PathBuf> {
        let config_dir = root.join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(&Self::default()).map_err(|e| {
            PagewrightError::Config(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(&config_path, content)?;
        Ok(config_path)
    }

    /// Reject values that would make the wizard unusable
    pub fn validate(&self) -> Result<()> {
        if self.generation.timeout_secs == 0 {
            return Err(PagewrightError::Config(
                "generation.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.assets.max_bytes == 0 {
            return Err(PagewrightError::Config(
                "assets.max_bytes must be greater than zero".to_string(),
            ));
        }

        for (index, question) in self.wizard.questions.iter().enumerate() {
            let expected = index as u32 + 1;
            if question.id != expected {
                return Err(PagewrightError::Config(format!(
                    "wizard.questions ids must run 1..N in order; found {} at position {}",
                    question.id, expected
                )));
            }
            if question.prompt.trim().is_empty() {
                return Err(PagewrightError::Config(format!(
                    "wizard.questions[{}] has an empty prompt",
                    question.id
                )));
            }
        }

        Ok(())
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_asset_bytes(),
        }
    }
}
