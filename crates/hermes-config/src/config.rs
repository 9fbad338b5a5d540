//! Configuration types.

use hermes_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Query-array encodings the dispatcher understands.
pub const KNOWN_ARRAY_FORMATS: [&str; 3] = ["brackets", "comma", "repeat"];

/// Complete Hermes configuration.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert!(config.dispatch.validate_responses);
/// assert!(config.dispatch.automatically_remove_pathname_prefix);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Dispatch behaviour.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LogConfig,
}

impl HermesConfig {
    /// Configuration tuned for local development.
    #[must_use]
    pub fn development() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            logging: LogConfig::development(),
        }
    }

    /// Configuration tuned for production.
    #[must_use]
    pub fn production() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            logging: LogConfig::production(),
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found in any section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dispatch.validate()?;
        if self.logging.enabled && self.logging.level.trim().is_empty() {
            return Err(ConfigError::EmptyLogLevel);
        }
        Ok(())
    }
}

/// Settings for route construction and dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Check 2xx replies against their response schema by default.
    pub validate_responses: bool,

    /// Query-array encodings accepted when parsing query strings, in the
    /// order they are tried.
    pub supported_array_formats: Vec<String>,

    /// Take the effective path from the wildcard parameter of an outer
    /// dispatcher when mounted below one.
    pub automatically_remove_pathname_prefix: bool,

    /// A fixed prefix to strip from every path.
    pub remove_pathname_prefix: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            validate_responses: true,
            supported_array_formats: KNOWN_ARRAY_FORMATS.iter().map(ToString::to_string).collect(),
            automatically_remove_pathname_prefix: true,
            remove_pathname_prefix: None,
        }
    }
}

impl DispatchConfig {
    /// Validate the dispatch section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if both prefix options are active, or the
    /// array-format list is empty or names an unknown encoding. An empty
    /// prefix counts as unset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(prefix) = self.remove_pathname_prefix.as_deref() {
            if self.automatically_remove_pathname_prefix && !prefix.is_empty() {
                return Err(ConfigError::ConflictingPrefixOptions {
                    prefix: prefix.to_string(),
                });
            }
        }

        if self.supported_array_formats.is_empty() {
            return Err(ConfigError::NoArrayFormats);
        }

        if let Some(unknown) = self
            .supported_array_formats
            .iter()
            .find(|f| !KNOWN_ARRAY_FORMATS.contains(&f.as_str()))
        {
            return Err(ConfigError::UnknownArrayFormat {
                format: unknown.clone(),
                expected: KNOWN_ARRAY_FORMATS.join(", "),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_telemetry::LogFormat;

    #[test]
    fn test_defaults_are_valid() {
        let config = HermesConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.dispatch.supported_array_formats,
            vec!["brackets", "comma", "repeat"]
        );
        assert!(config.dispatch.remove_pathname_prefix.is_none());
    }

    #[test]
    fn test_presets() {
        assert_eq!(HermesConfig::development().logging.format, LogFormat::Pretty);
        assert_eq!(HermesConfig::production().logging.format, LogFormat::Json);
    }

    #[test]
    fn test_prefix_options_conflict() {
        let dispatch = DispatchConfig {
            remove_pathname_prefix: Some("/api".to_string()),
            ..DispatchConfig::default()
        };
        assert!(matches!(
            dispatch.validate(),
            Err(ConfigError::ConflictingPrefixOptions { ref prefix }) if prefix == "/api"
        ));

        let empty = DispatchConfig {
            remove_pathname_prefix: Some(String::new()),
            ..DispatchConfig::default()
        };
        assert!(empty.validate().is_ok());

        let dispatch = DispatchConfig {
            automatically_remove_pathname_prefix: false,
            ..dispatch
        };
        assert!(dispatch.validate().is_ok());
    }

    #[test]
    fn test_array_formats_checked() {
        let empty = DispatchConfig {
            supported_array_formats: Vec::new(),
            ..DispatchConfig::default()
        };
        assert!(matches!(empty.validate(), Err(ConfigError::NoArrayFormats)));

        let unknown = DispatchConfig {
            supported_array_formats: vec!["pipes".to_string()],
            ..DispatchConfig::default()
        };
        assert!(matches!(
            unknown.validate(),
            Err(ConfigError::UnknownArrayFormat { ref format, .. }) if format == "pipes"
        ));
    }

    #[test]
    fn test_enabled_logging_needs_a_level() {
        let mut config = HermesConfig::default();
        config.logging.level = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyLogLevel)));

        config.logging.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<HermesConfig, _> = toml::from_str("[dispatch]\nvalidate = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: HermesConfig =
            toml::from_str("[dispatch]\nvalidate_responses = false\n").unwrap();
        assert!(!config.dispatch.validate_responses);
        assert!(config.dispatch.automatically_remove_pathname_prefix);
        assert_eq!(config.logging, LogConfig::default());
    }
}
