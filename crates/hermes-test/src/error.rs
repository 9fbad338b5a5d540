//! Test error types.

use thiserror::Error;

/// Errors that can occur while driving a bundle in tests.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request could not be built.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Form encoding failed.
    #[error("form encoding error: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),

    /// The response body was not valid UTF-8.
    #[error("body is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The dispatcher raised an error instead of producing a response.
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] hermes_core::Error),
}
