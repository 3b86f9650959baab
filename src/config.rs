//! YAML configuration for the templar pipeline.
//!
//! Everything a host decides once per process lives here; everything a
//! template decides lives in the template's settings.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "bulk import"
//!
//! # Accept every write without constraint checks (e.g. bulk imports).
//! skip_checks: false
//! # Enforce min_values on required bindings for programmatic writes.
//! enforce_min_values: true
//! max_annotation_depth: 4
//! default_title_property: "dcterms:title"
//! expand_vocabularies: true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Process-wide pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    /// Global bypass of constraint checks.
    #[serde(default)]
    pub skip_checks: bool,

    /// Default for [`crate::WriteOptions::enforce_min_values`].
    #[serde(default)]
    pub enforce_min_values: bool,

    /// How deep nested annotations are enriched.
    #[serde(default = "default_max_annotation_depth")]
    pub max_annotation_depth: usize,

    /// Title property of templates that do not declare one.
    #[serde(default = "default_title_property")]
    pub default_title_property: String,

    #[serde(default = "true_value")]
    pub expand_vocabularies: bool,
}

impl PipelineConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }

        if self.max_annotation_depth == 0 {
            return Err(ConfigLoadError::Validation(
                "max_annotation_depth must be >= 1".to_string(),
            ));
        }
        if self.max_annotation_depth > 32 {
            return Err(ConfigLoadError::Validation(
                "max_annotation_depth must be <= 32".to_string(),
            ));
        }

        let term = self.default_title_property.trim();
        match term.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => Ok(()),
            _ => Err(ConfigLoadError::Validation(format!(
                "default_title_property must be a prefixed term, got \"{term}\""
            ))),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            skip_checks: false,
            enforce_min_values: false,
            max_annotation_depth: default_max_annotation_depth(),
            default_title_property: default_title_property(),
            expand_vocabularies: true,
        }
    }
}

fn default_max_annotation_depth() -> usize {
    4
}
fn default_title_property() -> String {
    store::DEFAULT_TITLE_PROPERTY.to_string()
}
fn true_value() -> bool {
    true
}
