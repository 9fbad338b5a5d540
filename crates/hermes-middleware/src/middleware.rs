//! Core middleware trait and types.
//!
//! A [`Middleware`] receives the shared [`Context`], the request, and a
//! [`Next`] continuation for the rest of the chain. It may call `next` zero
//! times (short-circuit), once, or several times, each time with whatever
//! request it chooses. Errors are plain `Err` values that propagate through
//! every awaiting caller; catching them is itself a middleware concern.
//!
//! # Example
//!
//! ```
//! use hermes_core::{Context, Reply, Request, Result};
//! use hermes_middleware::{BoxFuture, Middleware, Next};
//!
//! struct Stamp;
//!
//! impl Middleware for Stamp {
//!     fn name(&self) -> &'static str {
//!         "stamp"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut Context,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Result<Reply>> {
//!         Box::pin(async move {
//!             let reply = next.run(ctx, request).await?;
//!             Ok(reply.header("x-stamp", "1"))
//!         })
//!     }
//! }
//! ```

use hermes_core::{Context, Reply, Request, Result};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased middleware that can be stored in a chain.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The core middleware trait.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request, usually by calling `next`.
    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>>;
}

/// The terminal handler a chain runs into.
pub trait Endpoint: Send + Sync {
    /// Handles the request.
    fn call<'a>(&'a self, ctx: &'a mut Context, request: Request) -> BoxFuture<'a, Result<Reply>>;
}

/// Continuation that runs the rest of the chain.
///
/// `Next` only borrows the chain, so it is `Copy`: a middleware can call it
/// again (to retry, for instance) and every call starts from the same point.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [BoxedMiddleware],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    /// Creates a continuation over `chain` that ends in `endpoint`.
    #[must_use]
    pub fn new(chain: &'a [BoxedMiddleware], endpoint: &'a dyn Endpoint) -> Self {
        Self { chain, endpoint }
    }

    /// Creates a continuation that calls `endpoint` directly.
    #[must_use]
    pub fn endpoint(endpoint: &'a dyn Endpoint) -> Self {
        Self::new(&[], endpoint)
    }

    /// Returns the number of middleware left before the endpoint.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }

    /// Invokes the next middleware, or the endpoint once the chain is exhausted.
    pub async fn run(self, ctx: &mut Context, request: Request) -> Result<Reply> {
        match self.chain.split_first() {
            Some((middleware, rest)) => {
                let next = Next {
                    chain: rest,
                    endpoint: self.endpoint,
                };
                middleware.process(ctx, request, next).await
            }
            None => self.endpoint.call(ctx, request).await,
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field(
                "chain",
                &self.chain.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

type HandlerFn =
    dyn for<'a> Fn(&'a mut Context, Request) -> BoxFuture<'a, Result<Reply>> + Send + Sync;

/// An [`Endpoint`] backed by a closure.
///
/// # Example
///
/// ```
/// use hermes_middleware::FnEndpoint;
/// use serde_json::json;
///
/// let hello = FnEndpoint::new(|ctx, _req| {
///     Box::pin(async move { Ok(ctx.json(json!({ "hello": "world" }))) })
/// });
/// ```
#[derive(Clone)]
pub struct FnEndpoint {
    func: Arc<HandlerFn>,
}

impl FnEndpoint {
    /// Creates an endpoint from a handler function.
    pub fn new<F>(func: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context, Request) -> BoxFuture<'a, Result<Reply>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }
}

impl Endpoint for FnEndpoint {
    fn call<'a>(&'a self, ctx: &'a mut Context, request: Request) -> BoxFuture<'a, Result<Reply>> {
        (self.func)(ctx, request)
    }
}

impl std::fmt::Debug for FnEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnEndpoint").finish_non_exhaustive()
    }
}

/// A middleware that can be created from a closure.
///
/// # Example
///
/// ```
/// use hermes_middleware::FnMiddleware;
///
/// let timing = FnMiddleware::new("timing", |ctx, req, next| {
///     Box::pin(async move {
///         let reply = next.run(ctx, req).await?;
///         tracing::debug!(elapsed = ?ctx.elapsed(), "handled");
///         Ok(reply)
///     })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context, Request, Next<'a>) -> BoxFuture<'a, Result<Reply>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based middleware.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }

    /// Wraps the middleware for storage in a chain.
    pub fn boxed(self) -> BoxedMiddleware {
        Arc::new(self)
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context, Request, Next<'a>) -> BoxFuture<'a, Result<Reply>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>> {
        (self.func)(ctx, request, next)
    }
}
