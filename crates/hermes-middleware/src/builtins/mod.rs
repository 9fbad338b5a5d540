//! Application middleware shipped with Hermes.
//!
//! None of these are part of the engine's fixed stages; applications add
//! them to the global before/after-auth lists, to a route, or as
//! strategies in the auth map.

pub mod auth_strategies;
pub mod cors;
pub mod ctx_error;
pub mod json_error_handler;
pub mod request_logging;
pub mod timeout;

pub use auth_strategies::{ApiKeyAuth, BearerAuth, CredentialVerifier};
pub use cors::Cors;
pub use ctx_error::{CtxError, CtxErrorExt, ErrorResponder};
pub use json_error_handler::JsonErrorHandler;
pub use request_logging::RequestLogging;
pub use timeout::Timeout;
