//! Radix tree node implementation.
//!
//! Each node holds one path segment. Route identifiers live on the node where
//! a pattern ends.

use crate::params::{RouteParam, RouteParams};
use crate::RouteError;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "users", "api")
    Static,
    /// Named parameter (e.g., "[id]")
    Param(String),
    /// Catch-all matching one or more segments (e.g., "[...path]")
    Wildcard(String),
    /// Catch-all matching zero or more segments (e.g., "[[...path]]")
    OptionalWildcard(String),
}

impl SegmentKind {
    /// Parses a single pattern segment.
    pub(crate) fn parse(segment: &str) -> Result<Self, RouteError> {
        if let Some(name) = segment
            .strip_prefix("[[...")
            .and_then(|s| s.strip_suffix("]]"))
        {
            return Self::named(name, segment).map(Self::OptionalWildcard);
        }
        if let Some(name) = segment.strip_prefix("[...").and_then(|s| s.strip_suffix(']')) {
            return Self::named(name, segment).map(Self::Wildcard);
        }
        if let Some(name) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            return Self::named(name, segment).map(Self::Param);
        }
        if segment.contains('[') || segment.contains(']') {
            return Err(RouteError::InvalidSegment(segment.to_string()));
        }
        Ok(Self::Static)
    }

    fn named(name: &str, segment: &str) -> Result<String, RouteError> {
        if name.is_empty() || name.contains(['[', ']', '.']) {
            Err(RouteError::InvalidSegment(segment.to_string()))
        } else {
            Ok(name.to_string())
        }
    }

    const fn is_catch_all(&self) -> bool {
        matches!(self, Self::Wildcard(_) | Self::OptionalWildcard(_))
    }
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// The path segment this node represents
    pub segment: String,

    /// The kind of segment
    pub kind: SegmentKind,

    /// Route identifier when a pattern ends at this node
    pub route_id: Option<String>,

    /// Static children, sorted by segment for binary search
    pub static_children: Vec<Node>,

    /// Parameter child (at most one per node)
    pub param_child: Option<Box<Node>>,

    /// Catch-all child (at most one per node, always a leaf)
    pub wildcard_child: Option<Box<Node>>,
}

impl Node {
    fn new(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            route_id: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new("", SegmentKind::Static)
    }

    /// Inserts a route pattern into the tree.
    pub fn insert(&mut self, pattern: &str, route_id: &str) -> Result<(), RouteError> {
        let segments = Self::parse_pattern(pattern)?;
        self.insert_segments(&segments, pattern, route_id)
    }

    /// Parses a pattern into segments.
    fn parse_pattern(pattern: &str) -> Result<Vec<(String, SegmentKind)>, RouteError> {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| SegmentKind::parse(s).map(|kind| (s.to_string(), kind)))
            .collect::<Result<Vec<_>, _>>()?;

        let last = segments.len().saturating_sub(1);
        if segments
            .iter()
            .enumerate()
            .any(|(i, (_, kind))| kind.is_catch_all() && i != last)
        {
            return Err(RouteError::WildcardNotLast(pattern.to_string()));
        }

        Ok(segments)
    }

    fn insert_segments(
        &mut self,
        segments: &[(String, SegmentKind)],
        pattern: &str,
        route_id: &str,
    ) -> Result<(), RouteError> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            if self.route_id.is_some() {
                return Err(RouteError::Duplicate(pattern.to_string()));
            }
            self.route_id = Some(route_id.to_string());
            return Ok(());
        };

        match kind {
            SegmentKind::Static => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(i) => self.static_children[i].insert_segments(remaining, pattern, route_id),
                    Err(i) => {
                        let mut child = Self::new(segment.clone(), SegmentKind::Static);
                        child.insert_segments(remaining, pattern, route_id)?;
                        self.static_children.insert(i, child);
                        Ok(())
                    }
                }
            }
            SegmentKind::Param(_) => {
                let child = self
                    .param_child
                    .get_or_insert_with(|| Box::new(Self::new(segment.clone(), kind.clone())));
                if child.kind != *kind {
                    return Err(RouteError::ConflictingParam {
                        pattern: pattern.to_string(),
                        existing: child.segment.clone(),
                    });
                }
                child.insert_segments(remaining, pattern, route_id)
            }
            SegmentKind::Wildcard(_) | SegmentKind::OptionalWildcard(_) => {
                if let Some(existing) = &self.wildcard_child {
                    return Err(if existing.kind == *kind {
                        RouteError::Duplicate(pattern.to_string())
                    } else {
                        RouteError::ConflictingParam {
                            pattern: pattern.to_string(),
                            existing: existing.segment.clone(),
                        }
                    });
                }
                let mut child = Self::new(segment.clone(), kind.clone());
                child.route_id = Some(route_id.to_string());
                self.wildcard_child = Some(Box::new(child));
                Ok(())
            }
        }
    }

    /// Matches a path against the tree.
    ///
    /// Returns the route identifier and extracted parameters if found.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&str, RouteParams)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = RouteParams::new();
        let route_id = self.match_segments(&segments, &mut params)?;
        Some((route_id, params))
    }

    fn match_segments<'a>(&'a self, segments: &[&str], params: &mut RouteParams) -> Option<&'a str> {
        let Some((segment, remaining)) = segments.split_first() else {
            if let Some(route_id) = &self.route_id {
                return Some(route_id);
            }
            // An optional catch-all also matches the bare prefix.
            let child = self.wildcard_child.as_deref()?;
            return match &child.kind {
                SegmentKind::OptionalWildcard(name) => {
                    params.push(name.clone(), RouteParam::Wildcard(Vec::new()));
                    child.route_id.as_deref()
                }
                _ => None,
            };
        };

        // Static match first (highest priority)
        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, params) {
                return Some(found);
            }
        }

        // Parameter match, backtracking on failure
        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), *segment);
                if let Some(found) = child.match_segments(remaining, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        // Catch-all (lowest priority, consumes every remaining segment)
        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) | SegmentKind::OptionalWildcard(name) = &child.kind {
                let captured = segments.iter().map(ToString::to_string).collect::<Vec<_>>();
                params.push(name.clone(), RouteParam::Wildcard(captured));
                return child.route_id.as_deref();
            }
        }

        None
    }

    /// Finds a static child by segment using binary search.
    fn find_static_child(&self, segment: &str) -> Option<&Self> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}
