//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating Hermes configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read configuration file.
    #[error("failed to read configuration file: {path}")]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The source is neither TOML nor JSON.
    #[error("unsupported configuration format: {format}")]
    UnsupportedFormat {
        /// The format name or file path that was rejected.
        format: String,
    },

    /// TOML parsing error, including unknown fields.
    #[error("failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error, including unknown fields.
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A fixed prefix was set while automatic prefix removal is on.
    #[error(
        "dispatch.remove_pathname_prefix {prefix:?} cannot be combined with \
         dispatch.automatically_remove_pathname_prefix"
    )]
    ConflictingPrefixOptions {
        /// The fixed prefix that was configured.
        prefix: String,
    },

    /// `dispatch.supported_array_formats` is empty.
    #[error("dispatch.supported_array_formats needs at least one format")]
    NoArrayFormats,

    /// `dispatch.supported_array_formats` names an encoding the query
    /// parser does not know.
    #[error("unknown array format {format:?} in dispatch.supported_array_formats, expected one of {expected}")]
    UnknownArrayFormat {
        /// The rejected format.
        format: String,
        /// The accepted formats, comma separated.
        expected: String,
    },

    /// Logging is enabled without a level filter.
    #[error("logging.level must not be empty when logging is enabled")]
    EmptyLogLevel,

    /// An environment override could not be applied.
    #[error("invalid environment override {var}: {reason}")]
    EnvOverride {
        /// The environment variable name.
        var: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub(crate) fn env_override(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvOverride {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_error() {
        let err = ConfigError::file_not_found("/etc/hermes/hermes.toml");
        assert!(err.to_string().contains("/etc/hermes/hermes.toml"));
    }

    #[test]
    fn test_dispatch_errors_name_their_field() {
        let err = ConfigError::ConflictingPrefixOptions {
            prefix: "/api".to_string(),
        };
        assert!(err.to_string().contains("\"/api\""));
        assert!(err.to_string().contains("automatically_remove_pathname_prefix"));

        let err = ConfigError::UnknownArrayFormat {
            format: "pipes".to_string(),
            expected: "brackets, comma, repeat".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unknown array format \"pipes\" in dispatch.supported_array_formats, \
             expected one of brackets, comma, repeat"
        );
    }

    #[test]
    fn test_env_override_error() {
        let err = ConfigError::env_override("HERMES__DISPATCH__VALIDATE_RESPONSES", "expected boolean");
        assert_eq!(
            err.to_string(),
            "invalid environment override HERMES__DISPATCH__VALIDATE_RESPONSES: expected boolean"
        );
    }

    #[test]
    fn test_toml_error_converts() {
        let toml_err = toml::from_str::<toml::Value>("= nope").unwrap_err();
        let err: ConfigError = toml_err.into();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
