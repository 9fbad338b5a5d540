//! Path parameter extraction and storage.
//!
//! A route parameter is either a single path segment (`[id]`) or an ordered
//! list of segments captured by a catch-all (`[...path]`). Parameters are kept
//! in insertion order using a small-vector so that common routes with one to
//! four parameters never touch the heap for the list itself.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Maximum number of parameters stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// The value bound to a single route parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteParam {
    /// One path segment, e.g. `123` for `/users/[id]`.
    Single(String),
    /// The segments captured by a catch-all, e.g. `["a", "b"]` for `/files/[...path]`.
    Wildcard(Vec<String>),
}

impl RouteParam {
    /// Returns the value if this is a single-segment parameter.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Wildcard(_) => None,
        }
    }

    /// Returns the captured segments if this is a catch-all parameter.
    #[must_use]
    pub fn as_segments(&self) -> Option<&[String]> {
        match self {
            Self::Single(_) => None,
            Self::Wildcard(segments) => Some(segments),
        }
    }

    /// Returns true for catch-all parameters.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard(_))
    }
}

impl From<&str> for RouteParam {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for RouteParam {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for RouteParam {
    fn from(segments: Vec<String>) -> Self {
        Self::Wildcard(segments)
    }
}

/// Extracted path parameters from a route match.
///
/// # Example
///
/// ```rust
/// use hermes_router::{RouteParam, RouteParams};
///
/// let mut params = RouteParams::new();
/// params.push("userId", "123");
/// params.push("rest", vec!["a".to_string(), "b".to_string()]);
///
/// assert_eq!(params.get_str("userId"), Some("123"));
/// assert!(params.get("rest").is_some_and(RouteParam::is_wildcard));
/// assert_eq!(params.get("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteParams {
    /// Storage for parameter (name, value) pairs
    inner: SmallVec<[(String, RouteParam); INLINE_PARAMS]>,
}

impl RouteParams {
    /// Creates a new empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, replacing any earlier value bound to the same name.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<RouteParam>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.inner.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.inner.push((name, value));
        }
    }

    /// Returns the value for a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RouteParam> {
        self.inner.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns a single-segment parameter by name.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(RouteParam::as_str)
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the parameters in match order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteParam)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Returns the catch-all parameters, in match order.
    pub fn wildcards(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner
            .iter()
            .filter_map(|(n, v)| v.as_segments().map(|s| (n.as_str(), s)))
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }
}

impl Serialize for RouteParams {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.inner.len()))?;
        for (name, value) in &self.inner {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<RouteParam>> FromIterator<(K, V)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.push(name, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_new() {
        let params = RouteParams::new();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
    }

    #[test]
    fn test_params_push_and_get() {
        let mut params = RouteParams::new();
        params.push("id", "123");
        params.push("name", "alice");

        assert_eq!(params.get_str("id"), Some("123"));
        assert_eq!(params.get_str("name"), Some("alice"));
        assert_eq!(params.get("unknown"), None);
    }

    #[test]
    fn test_push_replaces_existing_name() {
        let mut params = RouteParams::new();
        params.push("id", "1");
        params.push("id", "2");

        assert_eq!(params.len(), 1);
        assert_eq!(params.get_str("id"), Some("2"));
    }

    #[test]
    fn test_wildcards_filter() {
        let mut params = RouteParams::new();
        params.push("org", "acme");
        params.push("path", vec!["a".to_string(), "b".to_string()]);

        let wildcards: Vec<_> = params.wildcards().collect();
        assert_eq!(wildcards.len(), 1);
        assert_eq!(wildcards[0].0, "path");
        assert_eq!(wildcards[0].1, ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_serializes_as_object() {
        let params: RouteParams = vec![
            ("id", RouteParam::from("7")),
            ("rest", RouteParam::from(vec!["x".to_string()])),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({"id": "7", "rest": ["x"]}));
    }

    #[test]
    fn test_params_many_params() {
        let mut params = RouteParams::new();
        for i in 0..10 {
            params.push(format!("key{i}"), format!("value{i}"));
        }

        assert_eq!(params.len(), 10);
        assert_eq!(params.get_str("key5"), Some("value5"));
    }
}
