//! Radix tree router for Hermes route maps.
//!
//! Route patterns use file-system style segments:
//!
//! - `/users` matches literally
//! - `/users/[id]` binds one segment to `id`
//! - `/files/[...path]` binds one or more trailing segments to `path`
//! - `/docs/[[...slug]]` binds zero or more trailing segments to `slug`
//!
//! Matching walks the tree once per path segment, preferring static over
//! parameter over catch-all children, and backtracks when a preferred branch
//! dead-ends.
//!
//! # Example
//!
//! ```rust
//! use hermes_router::{RouteMatcher, Router};
//!
//! let mut router = Router::new();
//! router.insert("/health").unwrap();
//! router.insert("/orgs/[org]/[...rest]").unwrap();
//!
//! let found = router.match_path("/orgs/acme/a/b").unwrap();
//! assert_eq!(found.route_id, "/orgs/[org]/[...rest]");
//! assert_eq!(found.params.get_str("org"), Some("acme"));
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!           "orgs"         "health"
//!              │             (leaf)
//!           "[org]"
//!              │
//!         "[...rest]"
//!           (leaf)
//! ```

mod node;
mod params;
mod router;

pub use node::{Node, SegmentKind};
pub use params::{RouteParam, RouteParams};
pub use router::Router;

use thiserror::Error;

/// Errors raised while building a route map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The pattern is already registered.
    #[error("duplicate route pattern: {0}")]
    Duplicate(String),

    /// A segment uses brackets incorrectly.
    #[error("invalid route segment: {0}")]
    InvalidSegment(String),

    /// A catch-all segment appears before the end of the pattern.
    #[error("catch-all segment must be last in pattern: {0}")]
    WildcardNotLast(String),

    /// A dynamic segment conflicts with one already registered at the same position.
    #[error("route {pattern} conflicts with existing segment {existing}")]
    ConflictingParam {
        /// The pattern being inserted
        pattern: String,
        /// The segment already in the tree
        existing: String,
    },
}

/// A matched route with its identifier and extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// Identifier of the matched route (the pattern unless registered otherwise)
    pub route_id: &'a str,
    /// Extracted path parameters
    pub params: RouteParams,
}

impl<'a> RouteMatch<'a> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(route_id: &'a str, params: RouteParams) -> Self {
        Self { route_id, params }
    }
}

/// Resolves a request path to a route.
///
/// The dispatcher only depends on this trait, so any matcher producing
/// [`RouteParams`] can stand in for [`Router`].
pub trait RouteMatcher: Send + Sync {
    /// Returns the route matching `path`, if any.
    fn match_path(&self, path: &str) -> Option<RouteMatch<'_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_routing() {
        let mut router = Router::new();
        router.insert("/users").unwrap();
        router.insert("/users/[id]").unwrap();

        let m = router.match_path("/users").unwrap();
        assert_eq!(m.route_id, "/users");
        assert!(m.params.is_empty());

        let m = router.match_path("/users/123").unwrap();
        assert_eq!(m.route_id, "/users/[id]");
        assert_eq!(m.params.get_str("id"), Some("123"));
    }

    #[test]
    fn test_multiple_params() {
        let mut router = Router::new();
        router.insert("/orgs/[orgId]/users/[userId]").unwrap();

        let m = router.match_path("/orgs/acme/users/123").unwrap();
        assert_eq!(m.params.get_str("orgId"), Some("acme"));
        assert_eq!(m.params.get_str("userId"), Some("123"));
    }

    #[test]
    fn test_matcher_as_trait_object() {
        let mut router = Router::new();
        router.insert("/a/[x]").unwrap();
        let matcher: &dyn RouteMatcher = &router;
        assert!(matcher.match_path("/a/1").is_some());
        assert!(matcher.match_path("/b").is_none());
    }

    #[test]
    fn test_route_error_display() {
        let err = RouteError::Duplicate("/users".to_string());
        assert_eq!(err.to_string(), "duplicate route pattern: /users");
    }
}
