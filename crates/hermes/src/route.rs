//! Route construction.
//!
//! Every route runs the same stage order:
//!
//! ```text
//! UnhandledErrors → SerializeResponse (unchecked) → before-auth
//!   → AuthNegotiator → after-auth → route middleware → Methods
//!   → InputValidation → SerializeResponse (validating) → handler
//! ```
//!
//! The early serializer lets middleware return typed replies (error bodies
//! in particular) without being held to the route's success schema. The
//! late one checks what the handler returned.

use crate::spec::{GlobalSpec, RouteSpec};
use hermes_core::{Context, Error, Reply, Request, Result};
use hermes_middleware::{
    AuthNegotiator, BoxFuture, Chain, Endpoint, InputValidation, Methods, SerializeResponse,
    UnhandledErrors,
};
use http::Method;
use std::sync::Arc;
use tracing::debug;

/// A handler wrapped in its route's full middleware chain.
#[derive(Clone, Debug)]
pub struct Route {
    chain: Chain,
    methods: Arc<[Method]>,
}

impl Route {
    /// Returns the methods the route accepts.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.chain.stage_names()
    }

    /// Runs a request through the route.
    pub async fn run(&self, ctx: &mut Context, request: Request) -> Result<Reply> {
        self.chain.run(ctx, request).await
    }
}

impl Endpoint for Route {
    fn call<'a>(&'a self, ctx: &'a mut Context, request: Request) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(self.chain.run(ctx, request))
    }
}

impl GlobalSpec {
    /// Builds a route from its spec and handler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the route accepts no methods or
    /// names an auth strategy this spec does not register.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes::{GlobalSpec, RouteSpec};
    /// use hermes_middleware::FnEndpoint;
    /// use http::Method;
    /// use serde_json::json;
    ///
    /// let route = GlobalSpec::new()
    ///     .route(
    ///         RouteSpec::new([Method::GET]),
    ///         FnEndpoint::new(|ctx, _req| Box::pin(async move { Ok(ctx.json(json!({ "ok": true }))) })),
    ///     )
    ///     .unwrap();
    /// assert_eq!(route.stage_names().first(), Some(&"unhandled_errors"));
    /// ```
    pub fn route<E: Endpoint + 'static>(&self, spec: RouteSpec, handler: E) -> Result<Route> {
        if spec.methods.is_empty() {
            return Err(Error::configuration("a route must accept at least one method"));
        }

        let strategies = self.strategies_for(&spec.auth)?;
        let on_failed = spec
            .on_all_auth_failed
            .clone()
            .or_else(|| self.on_all_auth_failed.clone());
        let negotiator = AuthNegotiator::new(strategies).failure_handler(on_failed);

        let validate = spec.validate_response.unwrap_or(self.validate_responses);
        let late_serializer = if validate {
            SerializeResponse::validating(spec.responses.clone())
        } else {
            SerializeResponse::unchecked(spec.responses.clone())
        };

        let chain = Chain::builder()
            .push(UnhandledErrors::new())
            .push(SerializeResponse::unchecked(spec.responses.clone()))
            .extend(self.before_auth.iter().cloned())
            .push(negotiator)
            .extend(self.after_auth.iter().cloned())
            .extend(spec.middleware.iter().cloned())
            .push(Methods::new(spec.methods.iter().cloned()))
            .push(InputValidation::new(spec.input).array_formats(self.array_formats.iter().copied()))
            .push(late_serializer)
            .build(handler);

        debug!(
            methods = ?spec.methods,
            auth = ?spec.auth,
            validate_response = validate,
            "route constructed"
        );

        Ok(Route {
            chain,
            methods: spec.methods.into(),
        })
    }
}
