//! # Hermes Core
//!
//! Core types shared by every Hermes crate:
//!
//! - [`Request`] - Inbound request enriched with route parameters and validated input
//! - [`Context`] - Per-call mutable state carrying identity and middleware extensions
//! - [`Reply`] - The response model (JSON, multipart, custom, raw)
//! - [`Schema`] - The validation capability used for input and output
//! - [`Error`] - The dispatch error taxonomy
//! - [`CallerIdentity`] - Identity established by auth strategies

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod identity;
mod reply;
mod request;
mod schema;
mod types;

pub use context::{Context, RequestId};
pub use error::{Error, ErrorDetail, ErrorEnvelope, Issue, Result, ValidationIssues};
pub use identity::CallerIdentity;
pub use reply::{
    MultipartValue, Reply, ReplyBody, ResponseHeaders, ResponseInit, ResponseSchemas, StatusText,
};
pub use request::{Request, ValidatedInput};
pub use schema::{AnySchema, FnSchema, JsonSchema, Schema, SchemaRef, Typed};
pub use types::{collect_body, ResponseExt, WireRequest, WireResponse};

pub use hermes_router::{RouteParam, RouteParams};
