//! Request logging middleware.
//!
//! Emits one `info` event when a request comes in and one when its reply
//! goes out:
//!
//! ```text
//! > GET /users/7?expand=teams
//! < 200 {"id":7,"name":"ada","teams":[{"id":
//! ```
//!
//! The outgoing line carries the first 40 characters of the body with line
//! breaks removed. Errors are logged and re-raised unchanged.

use crate::middleware::{BoxFuture, Middleware, Next};
use hermes_core::{Context, Reply, ReplyBody, Request, Result};
use http_body_util::BodyExt;
use tracing::info;

const SNIPPET_CHARS: usize = 40;

/// Logs every request and its outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogging;

impl RequestLogging {
    /// Creates the middleware.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Returns the start of a reply body, flattened to one line.
pub async fn body_snippet(reply: &Reply) -> Option<String> {
    let text = match reply.body() {
        ReplyBody::Json(value) => value.to_string(),
        ReplyBody::Custom { payload, .. } => match payload {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        },
        ReplyBody::MultipartFormData(_) => return None,
        ReplyBody::Raw(response) => {
            let bytes = response.body().clone().collect().await.ok()?.to_bytes();
            String::from_utf8_lossy(&bytes).into_owned()
        }
    };
    Some(
        text.chars()
            .filter(|c| *c != '\r' && *c != '\n')
            .take(SNIPPET_CHARS)
            .collect(),
    )
}

impl Middleware for RequestLogging {
    fn name(&self) -> &'static str {
        "request_logging"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(async move {
            let request_id = ctx.request_id();
            let method = request.method().clone();
            let path = request.path().to_string();
            info!(
                request_id = %request_id,
                http.method = %method,
                http.path = %path,
                "> {} {}",
                method,
                request.uri()
            );

            match next.run(ctx, request).await {
                Ok(reply) => {
                    let status = reply.status_code().as_u16();
                    let snippet = body_snippet(&reply).await.unwrap_or_default();
                    info!(
                        request_id = %request_id,
                        http.method = %method,
                        http.path = %path,
                        http.status_code = status,
                        duration_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX),
                        "< {} {}",
                        status,
                        snippet
                    );
                    Ok(reply)
                }
                Err(error) => {
                    let message: String = error.to_string().chars().take(50).collect();
                    info!(
                        request_id = %request_id,
                        http.method = %method,
                        http.path = %path,
                        code = error.code(),
                        "< ERROR {}...",
                        message
                    );
                    Err(error)
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
    use hermes_core::{Error, ResponseExt, WireResponse};
    use http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_snippet_is_truncated_and_flattened() {
        let reply = Reply::custom("text/plain", format!("line one\r\nline two {}", "x".repeat(80)));
        let snippet = body_snippet(&reply).await.unwrap();
        assert_eq!(snippet.chars().count(), SNIPPET_CHARS);
        assert!(snippet.starts_with("line oneline two"));
    }

    #[tokio::test]
    async fn test_snippet_of_raw_reply() {
        let reply = Reply::raw(WireResponse::text(StatusCode::OK, "hello"));
        assert_eq!(body_snippet(&reply).await.as_deref(), Some("hello"));
        assert_eq!(
            body_snippet(&Reply::json(json!({ "a": 1 }))).await.as_deref(),
            Some(r#"{"a":1}"#)
        );
    }

    #[tokio::test]
    async fn test_passes_reply_and_error_through() {
        let ok = Chain::builder()
            .push(RequestLogging::new())
            .build(FnEndpoint::new(|ctx, _req| {
                Box::pin(async move { Ok(ctx.json(json!({ "ok": true })).status(StatusCode::ACCEPTED)) })
            }));
        let mut ctx = Context::new();
        let reply = ok
            .run(&mut ctx, http::Request::new(Bytes::new()).into())
            .await
            .unwrap();
        assert_eq!(reply.status_code(), StatusCode::ACCEPTED);

        let failing = Chain::builder()
            .push(RequestLogging::new())
            .build(FnEndpoint::new(|_ctx, _req| {
                Box::pin(async { Err(Error::unauthorized("who are you")) })
            }));
        let err = failing
            .run(&mut Context::new(), http::Request::new(Bytes::new()).into())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized { .. }));
    }
}
