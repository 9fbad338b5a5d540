//! Composed middleware chains.
//!
//! A [`Chain`] is an ordered list of middleware closed over a terminal
//! [`Endpoint`]. Running it hands the request to the first middleware with a
//! [`Next`] that covers the rest, so the endpoint is the innermost
//! continuation. A chain borrows nothing from a single call and can be run
//! any number of times, concurrently.
//!
//! Because `Chain` is itself an [`Endpoint`], chains nest: a route's chain
//! can be the endpoint of a chain that prepends ad-hoc middleware.

use crate::middleware::{BoxFuture, BoxedMiddleware, Endpoint, Middleware, Next};
use hermes_core::{Context, Reply, Request, Result};
use std::sync::Arc;
use tracing::debug;

/// An immutable middleware chain ending in an endpoint.
#[derive(Clone)]
pub struct Chain {
    middleware: Vec<BoxedMiddleware>,
    endpoint: Arc<dyn Endpoint>,
}

impl Chain {
    /// Creates a new chain builder.
    #[must_use]
    pub fn builder() -> ChainBuilder {
        ChainBuilder::new()
    }

    /// Runs the request through every middleware and then the endpoint.
    pub async fn run(&self, ctx: &mut Context, request: Request) -> Result<Reply> {
        Next::new(&self.middleware, self.endpoint.as_ref())
            .run(ctx, request)
            .await
    }

    /// Returns the names of the middleware in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Returns the number of middleware in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Returns `true` if the chain calls the endpoint directly.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }
}

impl Endpoint for Chain {
    fn call<'a>(&'a self, ctx: &'a mut Context, request: Request) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(self.run(ctx, request))
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Chain`].
#[derive(Default)]
pub struct ChainBuilder {
    middleware: Vec<BoxedMiddleware>,
}

impl ChainBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware.
    #[must_use]
    pub fn push<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared middleware.
    #[must_use]
    pub fn push_boxed(mut self, middleware: BoxedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Appends several shared middleware, keeping their order.
    #[must_use]
    pub fn extend<I>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        self.middleware.extend(middleware);
        self
    }

    /// Closes the chain over `endpoint`.
    pub fn build<E: Endpoint + 'static>(self, endpoint: E) -> Chain {
        self.build_shared(Arc::new(endpoint))
    }

    /// Closes the chain over a shared endpoint.
    pub fn build_shared(self, endpoint: Arc<dyn Endpoint>) -> Chain {
        let chain = Chain {
            middleware: self.middleware,
            endpoint,
        };
        debug!(stages = ?chain.stage_names(), "middleware chain built");
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{FnEndpoint, FnMiddleware};
    use bytes::Bytes;
    use serde_json::json;

    #[derive(Default)]
    struct Trail(Vec<String>);

    fn record(ctx: &mut Context, step: &str) {
        if !ctx.has_extension::<Trail>() {
            ctx.set_extension(Trail::default());
        }
        if let Some(trail) = ctx.get_extension_mut::<Trail>() {
            trail.0.push(step.to_string());
        }
    }

    fn tracer(name: &'static str) -> BoxedMiddleware {
        FnMiddleware::new(name, move |ctx, req, next| {
            Box::pin(async move {
                record(ctx, &format!("{name}:before"));
                let reply = next.run(ctx, req).await;
                record(ctx, &format!("{name}:after"));
                reply
            })
        })
        .boxed()
    }

    fn endpoint() -> FnEndpoint {
        FnEndpoint::new(|ctx, _req| {
            Box::pin(async move {
                record(ctx, "handler");
                Ok(ctx.json(json!({ "ok": true })))
            })
        })
    }

    fn request() -> Request {
        http::Request::new(Bytes::new()).into()
    }

    #[tokio::test]
    async fn test_chain_wraps_in_declared_order() {
        let chain = Chain::builder()
            .push_boxed(tracer("a"))
            .push_boxed(tracer("b"))
            .build(endpoint());
        assert_eq!(chain.stage_names(), vec!["a", "b"]);

        let mut ctx = Context::new();
        chain.run(&mut ctx, request()).await.unwrap();

        let trail = ctx.remove_extension::<Trail>().unwrap().0;
        assert_eq!(
            trail,
            vec!["a:before", "b:before", "handler", "b:after", "a:after"]
        );
    }

    #[tokio::test]
    async fn test_chain_is_reusable() {
        let chain = Chain::builder().push_boxed(tracer("a")).build(endpoint());
        for _ in 0..3 {
            let mut ctx = Context::new();
            chain.run(&mut ctx, request()).await.unwrap();
            let trail = ctx.remove_extension::<Trail>().unwrap().0;
            assert_eq!(trail.iter().filter(|s| *s == "handler").count(), 1);
        }
    }

    #[tokio::test]
    async fn test_chains_nest() {
        let inner = Chain::builder().push_boxed(tracer("inner")).build(endpoint());
        let outer = Chain::builder().push_boxed(tracer("outer")).build(inner);

        let mut ctx = Context::new();
        outer.run(&mut ctx, request()).await.unwrap();

        let trail = ctx.remove_extension::<Trail>().unwrap().0;
        assert_eq!(trail[0], "outer:before");
        assert_eq!(trail[1], "inner:before");
        assert_eq!(trail[2], "handler");
    }

    #[test]
    fn test_empty_chain() {
        let chain = Chain::builder().build(endpoint());
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
    }
}
