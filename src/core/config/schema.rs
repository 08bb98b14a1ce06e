//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Values are validated after parsing: both names must be non-empty single
//! path segments, otherwise classification could never match them.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::paths::PathClassifier;

/// Default suffix identifying a repository root directory.
pub const DEFAULT_REPOSITORY_SUFFIX: &str = ".git";

/// Default name of the synthetic directory injected into repository roots.
pub const DEFAULT_ENTRY_NAME: &str = "gitFakeFs";

/// Overlay configuration.
///
/// # Example
///
/// ```toml
/// repository_suffix = ".git"
/// entry_name = "gitFakeFs"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    /// Directory-name suffix of a repository root.
    pub repository_suffix: String,

    /// Name of the overlay entry below each repository root.
    pub entry_name: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            repository_suffix: DEFAULT_REPOSITORY_SUFFIX.to_string(),
            entry_name: DEFAULT_ENTRY_NAME.to_string(),
        }
    }
}

impl OverlayConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::validate_segment("repository_suffix", &self.repository_suffix)?;
        Self::validate_segment("entry_name", &self.entry_name)?;
        if matches!(self.entry_name.as_str(), "." | "..") {
            return Err(ConfigError::InvalidValue(format!(
                "entry_name cannot be '{}'",
                self.entry_name
            )));
        }
        Ok(())
    }

    fn validate_segment(field: &str, value: &str) -> Result<(), ConfigError> {
        if value.is_empty() {
            return Err(ConfigError::InvalidValue(format!("{field} cannot be empty")));
        }
        if value.contains('/') || value.contains('\\') || value.contains('\0') {
            return Err(ConfigError::InvalidValue(format!(
                "{field} must be a single path segment, got '{value}'"
            )));
        }
        Ok(())
    }

    /// Build the path classifier for this configuration.
    pub fn classifier(&self) -> PathClassifier {
        PathClassifier::new(&self.repository_suffix, &self.entry_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = OverlayConfig::default();
        assert_eq!(config.repository_suffix, ".git");
        assert_eq!(config.entry_name, "gitFakeFs");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: OverlayConfig = toml::from_str(r#"entry_name = "@git""#).unwrap();
        assert_eq!(config.entry_name, "@git");
        assert_eq!(config.repository_suffix, ".git");
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<OverlayConfig, _> = toml::from_str("entry = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn separators_rejected() {
        let config = OverlayConfig {
            entry_name: "a/b".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn empty_rejected() {
        let config = OverlayConfig {
            repository_suffix: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn dot_entry_rejected() {
        let config = OverlayConfig {
            entry_name: "..".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
