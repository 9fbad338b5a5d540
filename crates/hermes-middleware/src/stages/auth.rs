//! Auth negotiation.
//!
//! A route may accept several auth strategies. [`AuthNegotiator`] tries them
//! in order and runs the rest of the chain exactly once, through whichever
//! strategy lets the request in first.
//!
//! Each attempt gets its own [`DownstreamGate`], an endpoint that records
//! whether the strategy handed the request on. That makes the outcome of an
//! attempt explicit:
//!
//! | strategy result | gate reached | outcome                                |
//! |-----------------|--------------|----------------------------------------|
//! | `Ok`            | either       | success, return it                     |
//! | `Err`           | no           | rejection, try the next strategy       |
//! | `Err`           | yes          | downstream failure, re-raise unchanged |
//!
//! When every strategy rejects, the failure callback (if any) sees every
//! rejection in strategy order and the last rejection is raised.

use crate::middleware::{BoxFuture, BoxedMiddleware, Endpoint, Middleware, Next};
use hermes_core::{Context, Error, Reply, Request, Result};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Callback invoked when every auth strategy rejected the request.
///
/// Returning `Err` replaces the error raised by the negotiator.
pub type AuthFailureHandler = Arc<dyn Fn(&[Error]) -> Result<()> + Send + Sync>;

/// Result of trying one strategy.
#[derive(Debug)]
pub enum AuthAttempt {
    /// The strategy let the request through and the chain produced a reply.
    Succeeded(Reply),
    /// The strategy raised before handing the request on.
    Rejected(Error),
    /// The strategy handed the request on and something downstream raised.
    DownstreamFailed(Error),
}

impl AuthAttempt {
    /// Classifies a strategy's result by whether it reached downstream.
    #[must_use]
    pub fn classify(result: Result<Reply>, reached_downstream: bool) -> Self {
        match result {
            Ok(reply) => Self::Succeeded(reply),
            Err(error) if reached_downstream => Self::DownstreamFailed(error),
            Err(error) => Self::Rejected(error),
        }
    }
}

/// Endpoint handed to a strategy in place of the real continuation.
pub struct DownstreamGate<'a> {
    next: Next<'a>,
    reached: AtomicBool,
}

impl<'a> DownstreamGate<'a> {
    /// Wraps `next`.
    #[must_use]
    pub fn new(next: Next<'a>) -> Self {
        Self {
            next,
            reached: AtomicBool::new(false),
        }
    }

    /// Returns `true` once the strategy has called through.
    #[must_use]
    pub fn reached(&self) -> bool {
        self.reached.load(Ordering::SeqCst)
    }
}

impl Endpoint for DownstreamGate<'_> {
    fn call<'b>(&'b self, ctx: &'b mut Context, request: Request) -> BoxFuture<'b, Result<Reply>> {
        self.reached.store(true, Ordering::SeqCst);
        Box::pin(self.next.run(ctx, request))
    }
}

/// Tries a route's acceptable auth strategies in order.
#[derive(Clone, Default)]
pub struct AuthNegotiator {
    strategies: Vec<(String, BoxedMiddleware)>,
    on_all_failed: Option<AuthFailureHandler>,
}

impl AuthNegotiator {
    /// Creates a negotiator over named strategies, in the order to try them.
    #[must_use]
    pub fn new<I, S>(strategies: I) -> Self
    where
        I: IntoIterator<Item = (S, BoxedMiddleware)>,
        S: Into<String>,
    {
        Self {
            strategies: strategies
                .into_iter()
                .map(|(name, mw)| (name.into(), mw))
                .collect(),
            on_all_failed: None,
        }
    }

    /// Sets the callback invoked when every strategy rejects.
    #[must_use]
    pub fn on_all_failed<F>(self, handler: F) -> Self
    where
        F: Fn(&[Error]) -> Result<()> + Send + Sync + 'static,
    {
        self.failure_handler(Some(Arc::new(handler)))
    }

    /// Sets or clears the shared failure callback.
    #[must_use]
    pub fn failure_handler(mut self, handler: Option<AuthFailureHandler>) -> Self {
        self.on_all_failed = handler;
        self
    }

    /// Returns the strategy names in trial order.
    pub fn strategy_names(&self) -> impl Iterator<Item = &str> {
        self.strategies.iter().map(|(name, _)| name.as_str())
    }

    async fn attempt(
        strategy: &dyn Middleware,
        ctx: &mut Context,
        request: Request,
        next: Next<'_>,
    ) -> AuthAttempt {
        let gate = DownstreamGate::new(next);
        let result = strategy.process(ctx, request, Next::endpoint(&gate)).await;
        AuthAttempt::classify(result, gate.reached())
    }
}

impl Middleware for AuthNegotiator {
    fn name(&self) -> &'static str {
        "auth_negotiator"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(async move {
            if self.strategies.is_empty() {
                return next.run(ctx, request).await;
            }

            let mut rejections = Vec::with_capacity(self.strategies.len());
            for (name, strategy) in &self.strategies {
                match Self::attempt(strategy.as_ref(), ctx, request.clone(), next).await {
                    AuthAttempt::Succeeded(reply) => {
                        debug!(strategy = %name, request_id = %ctx.request_id(), "auth strategy accepted request");
                        return Ok(reply);
                    }
                    AuthAttempt::DownstreamFailed(error) => return Err(error),
                    AuthAttempt::Rejected(error) => {
                        warn!(
                            strategy = %name,
                            request_id = %ctx.request_id(),
                            error = %error,
                            "auth strategy rejected request"
                        );
                        rejections.push(error);
                    }
                }
            }

            if let Some(handler) = &self.on_all_failed {
                handler(&rejections)?;
            }
            match rejections.pop() {
                Some(last) => Err(last),
                None => Err(Error::unauthorized("no auth strategy accepted the request")),
            }
        })
    }
}

impl fmt::Debug for AuthNegotiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthNegotiator")
            .field("strategies", &self.strategy_names().collect::<Vec<_>>())
            .field("on_all_failed", &self.on_all_failed.is_some())
            .finish()
    }
}
