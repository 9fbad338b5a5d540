//! JSON error handler middleware.
//!
//! Catches every error raised downstream and answers with
//!
//! ```json
//! { "ok": false, "error": { "message": "...", "error_code": "..." } }
//! ```
//!
//! using the error's own status, or 500 when it has none. Unlike
//! [`UnhandledErrors`](crate::stages::UnhandledErrors), nothing escapes this
//! middleware.

use crate::middleware::{BoxFuture, Middleware, Next};
use hermes_core::{Context, Error, Reply, Request, Result};
use http::StatusCode;
use serde_json::json;
use tracing::error;

/// Converts any downstream error into a JSON reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorHandler;

impl JsonErrorHandler {
    /// Creates the middleware.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Builds the reply for an intercepted error.
    #[must_use]
    pub fn reply_for(error: &Error) -> Reply {
        let (status, error_code) = match error.status() {
            Some(status) => (status, error.code().to_ascii_lowercase()),
            None => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_server_error".to_string(),
            ),
        };
        Reply::json(json!({
            "ok": false,
            "error": {
                "message": error.to_string(),
                "error_code": error_code,
            }
        }))
        .status(status)
    }
}

impl Middleware for JsonErrorHandler {
    fn name(&self) -> &'static str {
        "json_error_handler"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(async move {
            match next.run(ctx, request).await {
                Ok(reply) => Ok(reply),
                Err(err) => {
                    error!(request_id = %ctx.request_id(), error = %err, "intercepted error");
                    Ok(Self::reply_for(&err))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnEndpoint;
    use crate::pipeline::Chain;
    use bytes::Bytes;
    use hermes_core::ReplyBody;

    async fn intercept(make: fn() -> Error) -> Reply {
        let chain = Chain::builder()
            .push(JsonErrorHandler::new())
            .build(FnEndpoint::new(move |_ctx, _req| {
                Box::pin(async move { Err(make()) })
            }));
        chain
            .run(&mut Context::new(), http::Request::new(Bytes::new()).into())
            .await
            .unwrap()
    }

    fn body(reply: &Reply) -> &serde_json::Value {
        match reply.body() {
            ReplyBody::Json(value) => value,
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bare_error_becomes_500() {
        let reply = intercept(|| Error::other(anyhow::anyhow!("disk on fire"))).await;
        assert_eq!(reply.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&reply)["ok"], false);
        assert_eq!(body(&reply)["error"]["message"], "disk on fire");
        assert_eq!(body(&reply)["error"]["error_code"], "internal_server_error");
    }

    #[tokio::test]
    async fn test_status_is_kept() {
        let reply = intercept(|| Error::unauthorized("bad token")).await;
        assert_eq!(reply.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(body(&reply)["error"]["error_code"], "unauthorized");
    }
}
