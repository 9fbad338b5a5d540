//! The dispatcher: wire request in, wire response out.

use crate::bundle::RouteBundle;
use hermes_config::DispatchConfig;
use hermes_core::{
    Context, Error, Request, ResponseExt, ResponseSchemas, Result, RouteParams, WireRequest,
    WireResponse,
};
use hermes_middleware::{BoxedMiddleware, Middleware, Next};
use http::StatusCode;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Per-call dispatch options.
#[derive(Clone)]
pub struct MakeRequestOptions {
    /// Must be off for `remove_pathname_prefix` to apply. Requests handed
    /// down by an outer bundle take their path from the outer route's
    /// wildcard parameter whenever no fixed prefix is set.
    pub automatically_remove_pathname_prefix: bool,
    /// A fixed prefix to strip. Requires automatic removal to be off; an
    /// empty prefix counts as unset.
    pub remove_pathname_prefix: Option<String>,
    /// Middleware run before the matched route's own chain.
    pub middleware: Vec<BoxedMiddleware>,
}

impl Default for MakeRequestOptions {
    fn default() -> Self {
        Self {
            automatically_remove_pathname_prefix: true,
            remove_pathname_prefix: None,
            middleware: Vec::new(),
        }
    }
}

impl MakeRequestOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the prefix settings from configuration.
    #[must_use]
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            automatically_remove_pathname_prefix: config.automatically_remove_pathname_prefix,
            remove_pathname_prefix: config.remove_pathname_prefix.clone(),
            middleware: Vec::new(),
        }
    }

    /// Sets automatic prefix removal.
    #[must_use]
    pub fn automatically_remove_pathname_prefix(mut self, enabled: bool) -> Self {
        self.automatically_remove_pathname_prefix = enabled;
        self
    }

    /// Sets a fixed prefix to strip.
    #[must_use]
    pub fn remove_pathname_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.remove_pathname_prefix = Some(prefix.into());
        self
    }

    /// Prepends middleware to the matched route's chain.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Works out the path to match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if both prefix options are set, or
    /// no fixed prefix is set and the request carries outer route
    /// parameters without exactly one wildcard among them. An empty fixed
    /// prefix counts as unset.
    pub fn effective_path(&self, request: &WireRequest) -> Result<String> {
        let path = request.uri().path();

        let explicit = self
            .remove_pathname_prefix
            .as_deref()
            .filter(|prefix| !prefix.is_empty());

        if let Some(prefix) = explicit {
            if self.automatically_remove_pathname_prefix {
                return Err(Error::configuration(
                    "automatically_remove_pathname_prefix and remove_pathname_prefix cannot both be specified",
                ));
            }
            let stripped = path.strip_prefix(prefix).unwrap_or(path);
            return Ok(if stripped.starts_with('/') {
                stripped.to_string()
            } else {
                format!("/{stripped}")
            });
        }

        if let Some(outer) = request.extensions().get::<RouteParams>() {
            let mut wildcards = outer.wildcards();
            let segments = match (wildcards.next(), wildcards.next()) {
                (Some((_, segments)), None) => segments,
                (None, _) => return Err(Error::configuration("no wildcard route parameter found")),
                (Some(_), Some(_)) => {
                    return Err(Error::configuration(
                        "only one wildcard route parameter is supported",
                    ))
                }
            };
            return Ok(format!("/{}", segments.join("/")));
        }

        Ok(path.to_string())
    }
}

impl fmt::Debug for MakeRequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MakeRequestOptions")
            .field(
                "automatically_remove_pathname_prefix",
                &self.automatically_remove_pathname_prefix,
            )
            .field("remove_pathname_prefix", &self.remove_pathname_prefix)
            .field(
                "middleware",
                &self.middleware.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl RouteBundle {
    /// Dispatches a request with the default options.
    pub async fn dispatch(&self, request: WireRequest) -> Result<WireResponse> {
        self.make_request(request, &MakeRequestOptions::default()).await
    }

    /// Dispatches a request.
    ///
    /// Unmatched paths go to the not-found handler (a plain `404 Not found`
    /// by default) with empty route parameters. Matched requests run through
    /// `options.middleware` and then the route's chain.
    ///
    /// # Errors
    ///
    /// Configuration errors are raised before any handler runs. Errors no
    /// middleware converted into a reply leave the dispatcher unchanged.
    pub async fn make_request(
        &self,
        request: WireRequest,
        options: &MakeRequestOptions,
    ) -> Result<WireResponse> {
        let path = options.effective_path(&request)?;

        let matched = self
            .matcher()
            .match_path(&path)
            .and_then(|m| self.route(m.route_id).map(|route| (m.route_id, route, m.params)));

        let mut ctx = Context::new();

        let Some((route_id, route, params)) = matched else {
            debug!(request_id = %ctx.request_id(), path = %path, "no route matched");
            let mut request = Request::from_wire(request, RouteParams::new()).await;
            request.extensions_mut().insert(self.clone());
            return self.not_found(&mut ctx, request).await;
        };

        debug!(
            request_id = %ctx.request_id(),
            route = route_id,
            path = %path,
            "dispatching"
        );

        let mut request = Request::from_wire(request, params).await;
        request.extensions_mut().insert(self.clone());

        let reply = Next::new(&options.middleware, route).run(&mut ctx, request).await?;
        reply.serialize(false, &ResponseSchemas::default(), ctx.response_defaults())
    }

    async fn not_found(&self, ctx: &mut Context, request: Request) -> Result<WireResponse> {
        match self.not_found_handler() {
            Some(handler) => handler.call(ctx, request).await?.serialize(
                false,
                &ResponseSchemas::default(),
                ctx.response_defaults(),
            ),
            None => Ok(WireResponse::text(StatusCode::NOT_FOUND, "Not found")),
        }
    }
}
