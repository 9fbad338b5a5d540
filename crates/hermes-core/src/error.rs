//! Error types for Hermes.
//!
//! [`Error`] is the single error type that flows through the middleware
//! chain. Variants that describe an HTTP-level outcome carry a status via
//! [`Error::status`]; application errors wrapped in [`Error::Other`] and
//! configuration mistakes do not, and are never turned into a response by the
//! engine itself.
//!
//! | Variant              | Status | Code                        |
//! |----------------------|--------|-----------------------------|
//! | `MethodNotAllowed`   | 405    | `METHOD_NOT_ALLOWED`        |
//! | `InputValidation`    | 400    | `INPUT_VALIDATION_ERROR`    |
//! | `InputParsing`       | 400    | `INPUT_PARSING_ERROR`       |
//! | `InvalidContentType` | 400    | `INVALID_CONTENT_TYPE`      |
//! | `InvalidQueryParams` | 400    | `INVALID_QUERY_PARAMS`      |
//! | `NotFound`           | 404    | `NOT_FOUND`                 |
//! | `Unauthorized`       | 401    | `UNAUTHORIZED`              |
//! | `ResponseValidation` | 500    | `RESPONSE_VALIDATION_ERROR` |
//! | `Http`               | any    | `HTTP_ERROR`                |
//! | `Configuration`      | none   | `CONFIGURATION_ERROR`       |
//! | `Other`              | none   | `INTERNAL_ERROR`            |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// One problem found while validating a value against a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// JSON pointer to the offending value (empty for the root).
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl Issue {
    /// Creates an issue.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// The full list of issues produced by a failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationIssues(Vec<Issue>);

impl ValidationIssues {
    /// Creates an empty issue list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an issue list holding a single root-level message.
    pub fn single(message: impl Into<String>) -> Self {
        Self(vec![Issue::new("", message)])
    }

    /// Appends an issue.
    pub fn push(&mut self, issue: Issue) {
        self.0.push(issue);
    }

    /// Returns the issues in discovery order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.0
    }

    /// Returns `true` if no issue was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<Issue>> for ValidationIssues {
    fn from(issues: Vec<Issue>) -> Self {
        Self(issues)
    }
}

impl FromIterator<Issue> for ValidationIssues {
    fn from_iter<I: IntoIterator<Item = Issue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Errors raised while dispatching a request.
#[derive(Debug, Error)]
pub enum Error {
    /// The route does not accept the request method.
    #[error("only {} accepted", .allowed.join(","))]
    MethodNotAllowed {
        /// Methods the route accepts, in declaration order.
        allowed: Vec<String>,
    },

    /// Parsed input did not satisfy its schema.
    #[error("{input} failed validation: {issues}")]
    InputValidation {
        /// Which part of the request failed (`json body`, `query params`, ...).
        input: &'static str,
        /// Every issue found.
        issues: ValidationIssues,
    },

    /// The body could not be parsed at all.
    #[error("{message}")]
    InputParsing {
        /// Human-readable error message.
        message: String,
    },

    /// The request's content type does not match what the route expects.
    #[error("{message}")]
    InvalidContentType {
        /// Human-readable error message.
        message: String,
    },

    /// The query string uses an unsupported encoding.
    #[error("{message}")]
    InvalidQueryParams {
        /// Human-readable error message.
        message: String,
    },

    /// The requested resource does not exist.
    #[error("{message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// An auth strategy rejected the request.
    #[error("{message}")]
    Unauthorized {
        /// Human-readable error message.
        message: String,
    },

    /// A handler produced a success response that does not match its schema.
    #[error("response validation failed: {0}")]
    ResponseValidation(ValidationIssues),

    /// An explicit HTTP failure raised by application code.
    #[error("{message}")]
    Http {
        /// Status to respond with.
        status: StatusCode,
        /// Human-readable error message.
        message: String,
    },

    /// The engine was wired up incorrectly.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// Any other application error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a method-not-allowed error from the accepted methods.
    pub fn method_not_allowed<I, M>(allowed: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: fmt::Display,
    {
        Self::MethodNotAllowed {
            allowed: allowed.into_iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Creates an input validation error.
    #[must_use]
    pub fn input_validation(input: &'static str, issues: ValidationIssues) -> Self {
        Self::InputValidation { input, issues }
    }

    /// Creates an input parsing error.
    #[must_use]
    pub fn input_parsing(message: impl Into<String>) -> Self {
        Self::InputParsing {
            message: message.into(),
        }
    }

    /// Creates an invalid content type error.
    #[must_use]
    pub fn invalid_content_type(message: impl Into<String>) -> Self {
        Self::InvalidContentType {
            message: message.into(),
        }
    }

    /// Creates an invalid query parameters error.
    #[must_use]
    pub fn invalid_query_params(message: impl Into<String>) -> Self {
        Self::InvalidQueryParams {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates an HTTP error with an explicit status.
    #[must_use]
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wraps an arbitrary application error.
    pub fn other(error: impl Into<anyhow::Error>) -> Self {
        Self::Other(error.into())
    }

    /// Returns the HTTP status for errors that describe an HTTP outcome.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::MethodNotAllowed { .. } => Some(StatusCode::METHOD_NOT_ALLOWED),
            Self::InputValidation { .. }
            | Self::InputParsing { .. }
            | Self::InvalidContentType { .. }
            | Self::InvalidQueryParams { .. } => Some(StatusCode::BAD_REQUEST),
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::ResponseValidation(_) => Some(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Http { status, .. } => Some(*status),
            Self::Configuration { .. } | Self::Other(_) => None,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            Self::InputValidation { .. } => "INPUT_VALIDATION_ERROR",
            Self::InputParsing { .. } => "INPUT_PARSING_ERROR",
            Self::InvalidContentType { .. } => "INVALID_CONTENT_TYPE",
            Self::InvalidQueryParams { .. } => "INVALID_QUERY_PARAMS",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::ResponseValidation(_) => "RESPONSE_VALIDATION_ERROR",
            Self::Http { .. } => "HTTP_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns `true` for client-side request validation failures.
    #[must_use]
    pub const fn is_request_validation(&self) -> bool {
        matches!(
            self,
            Self::InputValidation { .. }
                | Self::InputParsing { .. }
                | Self::InvalidContentType { .. }
                | Self::InvalidQueryParams { .. }
        )
    }

    /// Returns the validation issues carried by this error, if any.
    #[must_use]
    pub fn issues(&self) -> Option<&ValidationIssues> {
        match self {
            Self::InputValidation { issues, .. } | Self::ResponseValidation(issues) => Some(issues),
            _ => None,
        }
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                details: self.issues().and_then(|i| serde_json::to_value(i).ok()),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Validation issues, when the error carries them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_allowed_message() {
        let error = Error::method_not_allowed([http::Method::GET, http::Method::POST]);
        assert_eq!(error.to_string(), "only GET,POST accepted");
        assert_eq!(error.status(), Some(StatusCode::METHOD_NOT_ALLOWED));
    }

    #[test]
    fn test_request_validation_family_is_400() {
        let errors = [
            Error::input_validation("json body", ValidationIssues::single("bad")),
            Error::input_parsing("not json"),
            Error::invalid_content_type("expected json"),
            Error::invalid_query_params("brackets not supported"),
        ];
        for error in errors {
            assert!(error.is_request_validation());
            assert_eq!(error.status(), Some(StatusCode::BAD_REQUEST));
        }
    }

    #[test]
    fn test_response_validation_is_server_error() {
        let error = Error::ResponseValidation(ValidationIssues::single("missing field"));
        assert!(!error.is_request_validation());
        assert_eq!(error.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(error.code(), "RESPONSE_VALIDATION_ERROR");
    }

    #[test]
    fn test_other_and_configuration_have_no_status() {
        assert_eq!(Error::other(anyhow::anyhow!("boom")).status(), None);
        assert_eq!(Error::configuration("bad wiring").status(), None);
    }

    #[test]
    fn test_issues_display() {
        let issues: ValidationIssues = vec![
            Issue::new("/name", "is required"),
            Issue::new("", "must be an object"),
        ]
        .into();
        assert_eq!(issues.to_string(), "/name: is required; must be an object");
    }

    #[test]
    fn test_envelope_carries_issues() {
        let error = Error::input_validation(
            "query params",
            vec![Issue::new("/limit", "must be a number")].into(),
        );
        let envelope = error.to_envelope(Some("req-1"));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["error"]["code"], "INPUT_VALIDATION_ERROR");
        assert_eq!(json["error"]["details"][0]["path"], "/limit");
        assert_eq!(json["request_id"], "req-1");
    }
}
