//! Rewriter configuration
//!
//! Loaded from a JSON file. Every field has a default, so an empty object
//! `{}` is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event, Logger, Severity};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Rewriter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Maximum nesting of marker expansions before failing
    #[serde(default = "default_max_expansion_depth")]
    pub max_expansion_depth: usize,

    /// Log every marker expansion at TRACE level
    #[serde(default)]
    pub trace_markers: bool,

    /// Minimum severity written by the logger
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_expansion_depth() -> usize {
    32
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            max_expansion_depth: default_max_expansion_depth(),
            trace_markers: false,
            log_level: default_log_level(),
        }
    }
}

impl RewriteConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", &path.display().to_string()),
                ("max_expansion_depth", &config.max_expansion_depth.to_string()),
            ],
        );

        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: RewriteConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the expansion depth bound
    pub fn with_max_expansion_depth(mut self, depth: usize) -> Self {
        self.max_expansion_depth = depth;
        self
    }

    /// Enables per-marker trace logging
    pub fn with_trace_markers(mut self, enabled: bool) -> Self {
        self.trace_markers = enabled;
        self
    }

    /// Parsed log level
    pub fn severity(&self) -> ConfigResult<Severity> {
        Severity::parse(&self.log_level).ok_or_else(|| {
            ConfigError::Invalid(format!("Unknown log_level: '{}'", self.log_level))
        })
    }

    /// Applies `log_level` as the process-wide minimum severity
    pub fn init_logging(&self) -> ConfigResult<()> {
        Logger::set_min_severity(self.severity()?);
        Ok(())
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_expansion_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_expansion_depth must be > 0".into(),
            ));
        }
        self.severity()?;
        Ok(())
    }
}
