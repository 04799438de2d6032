//! Configuration management for wireup
//!
//! Handles configuration loading, validation, and environment overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::module::id::DEFAULT_SOURCE_EXTENSIONS;
use crate::module::registry::Scope;
use crate::module::suggest::DEFAULT_SUGGESTION_THRESHOLD;
use crate::utils::env::{env_int, env_opt};

/// Environment variable overriding `suggestion_threshold`
pub const ENV_SUGGESTION_THRESHOLD: &str = "WIREUP_SUGGESTION_THRESHOLD";

/// Environment variable overriding the logging filter
pub const ENV_LOG: &str = "WIREUP_LOG";

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "wireup=debug"); RUST_LOG takes precedence
    #[serde(default)]
    pub filter: Option<String>,

    /// Emit JSON lines (requires the `json-logging` feature)
    #[serde(default)]
    pub json_format: bool,
}

/// Container configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Edit-distance threshold for "maybe you meant" suggestions
    ///
    /// Candidates must be strictly closer than this.
    #[serde(default = "default_suggestion_threshold")]
    pub suggestion_threshold: usize,

    /// Scope for descriptors that do not set one
    #[serde(default)]
    pub default_scope: Scope,

    /// Prefix applied to ids derived from source locations by `add_scanned`
    #[serde(default)]
    pub id_prefix: Option<String>,

    /// File extensions dropped from source locations when deriving ids
    ///
    /// Any other trailing `.part` stays in the id as a segment.
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

fn default_suggestion_threshold() -> usize {
    DEFAULT_SUGGESTION_THRESHOLD
}

fn default_source_extensions() -> Vec<String> {
    DEFAULT_SOURCE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            suggestion_threshold: DEFAULT_SUGGESTION_THRESHOLD,
            default_scope: Scope::Singleton,
            id_prefix: None,
            source_extensions: default_source_extensions(),
            logging: None,
        }
    }
}

impl ContainerConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: ContainerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ContainerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        // A zero threshold would silently disable every suggestion
        if self.suggestion_threshold == 0 {
            return Err(anyhow::anyhow!(
                "suggestion_threshold must be greater than 0"
            ));
        }

        if let Some(prefix) = &self.id_prefix {
            if prefix.contains("::") {
                return Err(anyhow::anyhow!(
                    "id_prefix [{}] cannot contain a namespace separator",
                    prefix
                ));
            }
        }

        if let Some(ext) = self
            .source_extensions
            .iter()
            .find(|e| e.trim_start_matches('.').is_empty() || e.contains('/'))
        {
            return Err(anyhow::anyhow!("invalid source extension [{}]", ext));
        }

        Ok(())
    }

    /// Apply `WIREUP_SUGGESTION_THRESHOLD` and `WIREUP_LOG` on top of this config
    ///
    /// Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(threshold) = env_int::<usize>(ENV_SUGGESTION_THRESHOLD) {
            if threshold > 0 {
                self.suggestion_threshold = threshold;
            }
        }
        if let Some(filter) = env_opt(ENV_LOG) {
            self.logging.get_or_insert_with(LoggingConfig::default).filter = Some(filter);
        }
    }
}
