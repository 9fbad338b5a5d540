//! Response serialization stage.
//!
//! Every route chain contains this stage twice: once right after
//! [`UnhandledErrors`](super::UnhandledErrors) with validation off, so
//! middleware that short-circuits with its own replies is never checked
//! against the route's success schemas, and once as the innermost wrapper
//! around the handler with validation on (unless the route or the global
//! default turns it off).
//!
//! The stage turns whatever reply comes back into a raw reply by calling
//! [`Reply::serialize`], merging the headers that middleware stored in
//! [`Context::response_defaults`] underneath the reply's own headers.

use crate::middleware::{BoxFuture, Middleware, Next};
use hermes_core::{Context, Reply, Request, ResponseSchemas, Result};
use tracing::trace;

/// Converts the downstream reply into a wire response.
#[derive(Debug, Clone, Default)]
pub struct SerializeResponse {
    validate: bool,
    schemas: ResponseSchemas,
}

impl SerializeResponse {
    /// Creates a stage that checks 2xx replies against `schemas`.
    #[must_use]
    pub fn validating(schemas: ResponseSchemas) -> Self {
        Self {
            validate: true,
            schemas,
        }
    }

    /// Creates a stage that never validates.
    ///
    /// `schemas` is still consulted for custom content types, which must be
    /// registered either way.
    #[must_use]
    pub fn unchecked(schemas: ResponseSchemas) -> Self {
        Self {
            validate: false,
            schemas,
        }
    }

    /// Returns `true` if this stage validates replies.
    #[must_use]
    pub const fn validates(&self) -> bool {
        self.validate
    }
}

impl Middleware for SerializeResponse {
    fn name(&self) -> &'static str {
        if self.validate {
            "serialize_response_validated"
        } else {
            "serialize_response"
        }
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(async move {
            let reply = next.run(ctx, request).await?;
            trace!(
                kind = reply.kind(),
                status = reply.status_code().as_u16(),
                validate = self.validate,
                "serializing reply"
            );
            let response = reply.serialize(self.validate, &self.schemas, ctx.response_defaults())?;
            Ok(Reply::raw(response))
        })
    }
}
