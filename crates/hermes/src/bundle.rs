//! Route bundles: the table of path patterns and their routes.

use crate::route::Route;
use hermes_core::{Error, Request, Result};
use hermes_middleware::Endpoint;
use hermes_router::{RouteMatcher, Router};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Routes keyed by pattern, a matcher over those patterns, and an optional
/// not-found handler.
///
/// Cloning is cheap; clones share the same table.
#[derive(Clone)]
pub struct RouteBundle {
    inner: Arc<BundleInner>,
}

struct BundleInner {
    matcher: Box<dyn RouteMatcher>,
    routes: IndexMap<String, Route>,
    handle_404: Option<Arc<dyn Endpoint>>,
}

impl RouteBundle {
    /// Creates a bundle builder.
    #[must_use]
    pub fn builder() -> RouteBundleBuilder {
        RouteBundleBuilder::default()
    }

    /// Returns the route registered under `route_id`.
    #[must_use]
    pub fn route(&self, route_id: &str) -> Option<&Route> {
        self.inner.routes.get(route_id)
    }

    /// Returns the registered route ids in insertion order.
    pub fn route_ids(&self) -> impl Iterator<Item = &str> {
        self.inner.routes.keys().map(String::as_str)
    }

    /// Returns the matcher used to resolve paths.
    #[must_use]
    pub fn matcher(&self) -> &dyn RouteMatcher {
        self.inner.matcher.as_ref()
    }

    /// Returns the custom not-found handler, if any.
    #[must_use]
    pub fn not_found_handler(&self) -> Option<&dyn Endpoint> {
        self.inner.handle_404.as_deref()
    }

    /// Returns `true` if both handles share the same table.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for RouteBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteBundle")
            .field("routes", &self.route_ids().collect::<Vec<_>>())
            .field("handle_404", &self.inner.handle_404.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`RouteBundle`].
///
/// # Example
///
/// ```
/// use hermes::{GlobalSpec, RouteBundle, RouteSpec};
/// use hermes_middleware::FnEndpoint;
/// use http::Method;
/// use serde_json::json;
///
/// let global = GlobalSpec::new();
/// let health = global
///     .route(
///         RouteSpec::new([Method::GET]),
///         FnEndpoint::new(|ctx, _req| Box::pin(async move { Ok(ctx.json(json!("ok"))) })),
///     )
///     .unwrap();
///
/// let bundle = RouteBundle::builder()
///     .route("health/", health)
///     .build()
///     .unwrap();
/// assert_eq!(bundle.route_ids().collect::<Vec<_>>(), vec!["/health"]);
/// ```
#[derive(Default)]
pub struct RouteBundleBuilder {
    routes: IndexMap<String, Route>,
    duplicates: Vec<String>,
    handle_404: Option<Arc<dyn Endpoint>>,
}

impl RouteBundleBuilder {
    /// Adds a route under a path pattern such as `/users/[id]`.
    ///
    /// The pattern is normalised: a leading slash is added, a trailing
    /// slash or `/index` segment is dropped.
    #[must_use]
    pub fn route(mut self, pattern: &str, route: Route) -> Self {
        let key = normalize_route_key(pattern);
        if self.routes.insert(key.clone(), route).is_some() {
            self.duplicates.push(key);
        }
        self
    }

    /// Sets the handler for paths no route matches.
    #[must_use]
    pub fn handle_404<E: Endpoint + 'static>(mut self, handler: E) -> Self {
        self.handle_404 = Some(Arc::new(handler));
        self
    }

    /// Builds the bundle with the radix router over the registered patterns.
    pub fn build(self) -> Result<RouteBundle> {
        let mut router = Router::new();
        for pattern in self.routes.keys() {
            router
                .insert(pattern)
                .map_err(|e| Error::configuration(e.to_string()))?;
        }
        self.build_with_matcher(router)
    }

    /// Builds the bundle with a caller-supplied matcher.
    ///
    /// The matcher must report the normalised pattern of a registered route
    /// as its route id; any other id dispatches to the not-found handler.
    pub fn build_with_matcher<M: RouteMatcher + 'static>(self, matcher: M) -> Result<RouteBundle> {
        if let Some(duplicate) = self.duplicates.first() {
            return Err(Error::configuration(format!(
                "route {duplicate} is registered more than once"
            )));
        }

        Ok(RouteBundle {
            inner: Arc::new(BundleInner {
                matcher: Box::new(matcher),
                routes: self.routes,
                handle_404: self.handle_404,
            }),
        })
    }
}

/// Normalises a route pattern to the form the matcher stores.
#[must_use]
pub fn normalize_route_key(pattern: &str) -> String {
    let trimmed = pattern.trim().trim_matches('/');
    let trimmed = if trimmed == "index" {
        ""
    } else {
        trimmed.strip_suffix("/index").unwrap_or(trimmed)
    };
    format!("/{trimmed}")
}

/// Access to the bundle that dispatched a request.
pub trait RequestBundleExt {
    /// Returns the bundle that dispatched this request.
    fn bundle(&self) -> Option<&RouteBundle>;
}

impl RequestBundleExt for Request {
    fn bundle(&self) -> Option<&RouteBundle> {
        self.extensions().get::<RouteBundle>()
    }
}
