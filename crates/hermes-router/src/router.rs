//! High-level router API.
//!
//! This module provides the main [`Router`] struct which is the primary
//! interface for building and matching route maps.

use crate::node::Node;
use crate::{RouteError, RouteMatch, RouteMatcher};

/// A radix tree router over file-system style route patterns.
///
/// # Example
///
/// ```rust
/// use hermes_router::{RouteMatcher, Router};
///
/// let mut router = Router::new();
/// router.insert("/users/[id]").unwrap();
/// router.insert("/files/[...path]").unwrap();
///
/// let found = router.match_path("/users/123").unwrap();
/// assert_eq!(found.route_id, "/users/[id]");
/// assert_eq!(found.params.get_str("id"), Some("123"));
/// ```
///
/// # Route Priority
///
/// When multiple routes could match, the router uses the following priority:
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/[id]`)
/// 3. **Catch-all segments** (e.g., `/files/[...path]`)
///
/// A failed deeper match falls back to the next option at each level.
#[derive(Debug, Clone)]
pub struct Router {
    /// Root node of the radix tree
    root: Node,
    /// Number of routes registered
    route_count: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts a route pattern, using the pattern itself as its identifier.
    pub fn insert(&mut self, pattern: &str) -> Result<(), RouteError> {
        self.insert_with_id(pattern, pattern)
    }

    /// Inserts a route pattern under an explicit identifier.
    pub fn insert_with_id(&mut self, pattern: &str, route_id: &str) -> Result<(), RouteError> {
        self.root.insert(pattern, route_id)?;
        self.route_count += 1;
        Ok(())
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

impl RouteMatcher for Router {
    fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        let (route_id, params) = self.root.match_path(path)?;
        Some(RouteMatch::new(route_id, params))
    }
}

impl<S: AsRef<str>> FromIterator<S> for Router {
    /// Builds a router from patterns, skipping any that fail to insert.
    ///
    /// Use [`Router::insert`] directly when insertion errors matter.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut router = Self::new();
        for pattern in iter {
            let _ = router.insert(pattern.as_ref());
        }
        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RouteParam;
    use proptest::prelude::*;

    #[test]
    fn test_router_new() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_router_insert() {
        let mut router = Router::new();
        router.insert("/users").unwrap();
        assert_eq!(router.len(), 1);
        assert!(!router.is_empty());
    }

    #[test]
    fn test_failed_insert_not_counted() {
        let mut router = Router::new();
        router.insert("/users").unwrap();
        assert!(router.insert("/users").is_err());
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_router_match_root() {
        let mut router = Router::new();
        router.insert("/").unwrap();

        let found = router.match_path("/").unwrap();
        assert_eq!(found.route_id, "/");
        assert!(found.params.is_empty());
    }

    #[test]
    fn test_static_beats_param() {
        let mut router = Router::new();
        router.insert("/users/[id]").unwrap();
        router.insert("/users/me").unwrap();

        assert_eq!(router.match_path("/users/me").unwrap().route_id, "/users/me");
        assert_eq!(
            router.match_path("/users/42").unwrap().route_id,
            "/users/[id]"
        );
    }

    #[test]
    fn test_param_beats_wildcard() {
        let mut router = Router::new();
        router.insert("/files/[...path]").unwrap();
        router.insert("/files/[name]").unwrap();

        assert_eq!(
            router.match_path("/files/a").unwrap().route_id,
            "/files/[name]"
        );
        let found = router.match_path("/files/a/b").unwrap();
        assert_eq!(found.route_id, "/files/[...path]");
        assert_eq!(
            found.params.get("path"),
            Some(&RouteParam::Wildcard(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn test_static_falls_back_to_param() {
        let mut router = Router::new();
        router.insert("/users/me/profile").unwrap();
        router.insert("/users/[id]").unwrap();

        let found = router.match_path("/users/me").unwrap();
        assert_eq!(found.route_id, "/users/[id]");
        assert_eq!(found.params.get_str("id"), Some("me"));
    }

    #[test]
    fn test_insert_with_id() {
        let mut router = Router::new();
        router.insert_with_id("/health/", "health").unwrap();
        assert_eq!(router.match_path("/health").unwrap().route_id, "health");
    }

    #[test]
    fn test_router_no_match() {
        let mut router = Router::new();
        router.insert("/users").unwrap();
        assert!(router.match_path("/posts").is_none());
        assert!(router.match_path("/users/1").is_none());
    }

    #[test]
    fn test_from_iter() {
        let router: Router = ["/a", "/b/[id]", "/c/[[...rest]]"].into_iter().collect();
        assert_eq!(router.len(), 3);
        assert!(router.match_path("/c").is_some());
    }

    proptest! {
        #[test]
        fn prop_param_captures_any_segment(segment in "[a-zA-Z0-9_-]{1,16}") {
            let mut router = Router::new();
            router.insert("/items/[id]").unwrap();

            let path = format!("/items/{segment}");
            let found = router.match_path(&path).unwrap();
            prop_assert_eq!(found.params.get_str("id"), Some(segment.as_str()));
        }

        #[test]
        fn prop_wildcard_captures_all_segments(
            segments in proptest::collection::vec("[a-z0-9]{1,8}", 1..6)
        ) {
            let mut router = Router::new();
            router.insert("/static/[...rest]").unwrap();

            let path = format!("/static/{}", segments.join("/"));
            let found = router.match_path(&path).unwrap();
            prop_assert_eq!(
                found.params.get("rest").and_then(RouteParam::as_segments),
                Some(segments.as_slice())
            );
        }
    }
}
