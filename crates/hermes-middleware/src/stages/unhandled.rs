//! Unhandled error conversion.
//!
//! This is the outermost stage of every route chain. Errors that describe an
//! HTTP outcome (see [`Error::status`]) are turned into a JSON error envelope
//! with that status:
//!
//! ```json
//! {
//!   "error": {
//!     "code": "METHOD_NOT_ALLOWED",
//!     "message": "only GET accepted"
//!   },
//!   "request_id": "0190..."
//! }
//! ```
//!
//! Errors without a status (configuration mistakes, bare application errors)
//! pass through unchanged, so they surface from the dispatch call itself.

use crate::middleware::{BoxFuture, Middleware, Next};
use hermes_core::{Context, Error, Reply, Request, ResponseExt, Result, WireResponse};
use http::header::{HeaderValue, ALLOW};
use tracing::{error, warn};

/// Converts status-carrying errors into error envelope responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnhandledErrors;

impl UnhandledErrors {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn envelope(error: &Error, ctx: &Context) -> Option<WireResponse> {
        let status = error.status()?;
        let request_id = ctx.request_id().to_string();
        let body = serde_json::to_vec(&error.to_envelope(Some(&request_id))).ok()?;
        let mut response = WireResponse::json_bytes(status, body);

        if let Error::MethodNotAllowed { allowed } = error {
            if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
                response.headers_mut().insert(ALLOW, value);
            }
        }
        Some(response)
    }
}

impl Middleware for UnhandledErrors {
    fn name(&self) -> &'static str {
        "unhandled_errors"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(async move {
            let error = match next.run(ctx, request).await {
                Ok(reply) => return Ok(reply),
                Err(error) => error,
            };

            let Some(response) = Self::envelope(&error, ctx) else {
                return Err(error);
            };

            if response.status().is_server_error() {
                error!(
                    request_id = %ctx.request_id(),
                    code = error.code(),
                    error = %error,
                    "request failed"
                );
            } else {
                warn!(
                    request_id = %ctx.request_id(),
                    code = error.code(),
                    status = response.status().as_u16(),
                    "request rejected"
                );
            }
            Ok(Reply::raw(response))
        })
    }
}
