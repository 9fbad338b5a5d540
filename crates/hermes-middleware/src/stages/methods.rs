//! Method allow-list stage.

use crate::middleware::{BoxFuture, Middleware, Next};
use hermes_core::{Context, Error, Reply, Request, Result};
use http::Method;

/// Rejects requests whose method the route does not accept.
#[derive(Debug, Clone)]
pub struct Methods {
    allowed: Vec<Method>,
}

impl Methods {
    /// Creates the stage from the accepted methods, in declaration order.
    #[must_use]
    pub fn new(allowed: impl IntoIterator<Item = Method>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    /// Returns the accepted methods.
    #[must_use]
    pub fn allowed(&self) -> &[Method] {
        &self.allowed
    }
}

impl Middleware for Methods {
    fn name(&self) -> &'static str {
        "methods"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(async move {
            if !self.allowed.contains(request.method()) {
                return Err(Error::method_not_allowed(&self.allowed));
            }
            next.run(ctx, request).await
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

    fn chain() -> Chain {
        Chain::builder()
            .push(Methods::new([Method::GET, Method::HEAD]))
            .build(FnEndpoint::new(|ctx, _req| {
                Box::pin(async move { Ok(ctx.json(json!("ok"))) })
            }))
    }

    fn request(method: Method) -> Request {
        http::Request::builder()
            .method(method)
            .body(Bytes::new())
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn test_allowed_method_passes() {
        let mut ctx = Context::new();
        assert!(chain().run(&mut ctx, request(Method::GET)).await.is_ok());
    }

    #[tokio::test]
    async fn test_other_method_lists_allowed() {
        let mut ctx = Context::new();
        let err = chain()
            .run(&mut ctx, request(Method::POST))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "only GET,HEAD accepted");
    }
}
