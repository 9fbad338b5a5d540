//! Request timeout middleware.
//!
//! Races the rest of the chain against a timer. When the timer wins, the
//! downstream future is dropped and the request fails with
//! `503 Service Unavailable`. Side effects the chain already issued are not
//! undone.

use crate::middleware::{BoxFuture, Middleware, Next};
use hermes_core::{Context, Error, Reply, Request, Result};
use http::StatusCode;
use std::time::Duration;
use tracing::warn;

/// Fails requests that take longer than a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    limit: Duration,
}

impl Timeout {
    /// Creates the middleware.
    #[must_use]
    pub const fn new(limit: Duration) -> Self {
        Self { limit }
    }
}

impl Middleware for Timeout {
    fn name(&self) -> &'static str {
        "timeout"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(async move {
            let request_id = ctx.request_id();
            match tokio::time::timeout(self.limit, next.run(ctx, request)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(request_id = %request_id, limit_ms = u64::try_from(self.limit.as_millis()).unwrap_or(u64::MAX), "request timed out");
                    Err(Error::http(
                        StatusCode::SERVICE_UNAVAILABLE,
                        format!("request timed out after {:?}", self.limit),
                    ))
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
    use serde_json::json;

    fn sleepy(delay: Duration) -> Chain {
        Chain::builder()
            .push(Timeout::new(Duration::from_secs(5)))
            .build(FnEndpoint::new(move |ctx, _req| {
                Box::pin(async move {
                    tokio::time::sleep(delay).await;
                    Ok(ctx.json(json!("done")))
                })
            }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_request_passes() {
        let result = sleepy(Duration::from_secs(1))
            .run(&mut Context::new(), http::Request::new(Bytes::new()).into())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_times_out() {
        let err = sleepy(Duration::from_secs(60))
            .run(&mut Context::new(), http::Request::new(Bytes::new()).into())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }
}
