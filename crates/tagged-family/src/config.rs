// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry configuration.
//!
//! Supports both programmatic and file-based configuration.
//!
//! ```toml
//! discriminator = "kind"
//! max_depth = 64
//! deny_unknown_fields = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Reserved field name carrying a variant's tag.
    #[serde(default = "default_discriminator")]
    pub discriminator: String,

    /// Maximum nesting depth accepted by the codec.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Reject input fields no declared field matches.
    #[serde(default)]
    pub deny_unknown_fields: bool,
}

fn default_discriminator() -> String {
    "type".to_string()
}

fn default_max_depth() -> usize {
    128
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            discriminator: default_discriminator(),
            max_depth: default_max_depth(),
            deny_unknown_fields: false,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discriminator.is_empty() {
            return Err(ConfigError::Invalid("Discriminator name is empty".into()));
        }
        let mut chars = self.discriminator.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(ConfigError::Invalid(format!(
                "Discriminator '{}' is not an identifier",
                self.discriminator
            )));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".into()));
        }
        Ok(())
    }
}
