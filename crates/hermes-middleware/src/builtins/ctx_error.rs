//! Context error helper.
//!
//! [`CtxError`] stores an [`ErrorResponder`] on the context so handlers can
//! answer with a JSON error body of any status without raising:
//!
//! ```json
//! { "error": { "error_code": "quota_exceeded", "message": "try tomorrow" } }
//! ```

use crate::middleware::{BoxFuture, Middleware, Next};
use hermes_core::{Context, Reply, Request, Result};
use http::StatusCode;
use serde_json::json;

/// Builds JSON error replies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorResponder;

impl ErrorResponder {
    /// Builds an error reply with the given status.
    #[must_use]
    pub fn error(&self, status: StatusCode, error_code: &str, message: &str) -> Reply {
        Reply::json(json!({
            "error": {
                "error_code": error_code,
                "message": message,
            }
        }))
        .status(status)
    }
}

/// Extension methods for contexts that went through [`CtxError`].
pub trait CtxErrorExt {
    /// Builds an error reply, if [`CtxError`] ran for this request.
    fn error(&self, status: StatusCode, error_code: &str, message: &str) -> Option<Reply>;
}

impl CtxErrorExt for Context {
    fn error(&self, status: StatusCode, error_code: &str, message: &str) -> Option<Reply> {
        self.get_extension::<ErrorResponder>()
            .map(|responder| responder.error(status, error_code, message))
    }
}

/// Installs an [`ErrorResponder`] on the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct CtxError;

impl CtxError {
    /// Creates the middleware.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for CtxError {
    fn name(&self) -> &'static str {
        "ctx_error"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>> {
        ctx.set_extension(ErrorResponder);
        Box::pin(next.run(ctx, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnEndpoint;
    use crate::pipeline::Chain;
    use bytes::Bytes;
    use hermes_core::{Error, ReplyBody};

    #[tokio::test]
    async fn test_handler_builds_error_reply() {
        let chain = Chain::builder()
            .push(CtxError::new())
            .build(FnEndpoint::new(|ctx, _req| {
                Box::pin(async move {
                    ctx.error(StatusCode::TOO_MANY_REQUESTS, "quota_exceeded", "try tomorrow")
                        .ok_or_else(|| Error::configuration("ctx error missing"))
                })
            }));

        let mut ctx = Context::new();
        let reply = chain
            .run(&mut ctx, http::Request::new(Bytes::new()).into())
            .await
            .unwrap();

        assert_eq!(reply.status_code(), StatusCode::TOO_MANY_REQUESTS);
        match reply.body() {
            ReplyBody::Json(body) => {
                assert_eq!(body["error"]["error_code"], "quota_exceeded");
                assert_eq!(body["error"]["message"], "try tomorrow");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_without_middleware_there_is_no_responder() {
        let ctx = Context::new();
        assert!(ctx.error(StatusCode::BAD_REQUEST, "x", "y").is_none());
    }
}
