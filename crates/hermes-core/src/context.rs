//! Per-call context.
//!
//! A [`Context`] is created fresh for every dispatched request and passed by
//! mutable reference through the whole middleware chain, so whatever one
//! stage records is visible to every later stage and to the handler.

use crate::identity::CallerIdentity;
use crate::reply::{MultipartValue, Reply, ResponseHeaders};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log correlation sortable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Mutable per-call state shared by every middleware and the handler.
///
/// # Example
///
/// ```
/// use hermes_core::{CallerIdentity, Context};
///
/// #[derive(Debug, PartialEq)]
/// struct TenantId(String);
///
/// let mut ctx = Context::new();
/// ctx.set_identity(CallerIdentity::user("u-1"));
/// ctx.set_extension(TenantId("acme".to_string()));
///
/// assert!(ctx.identity().is_authenticated());
/// assert_eq!(ctx.get_extension::<TenantId>(), Some(&TenantId("acme".to_string())));
/// ```
#[derive(Debug)]
pub struct Context {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// The authenticated identity of the caller.
    identity: CallerIdentity,

    /// When the request started processing.
    started_at: Instant,

    /// Headers merged underneath every reply's own headers.
    response_defaults: ResponseHeaders,

    /// Type-erased extension data contributed by middleware.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Context {
    /// Creates a new context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            identity: CallerIdentity::Anonymous,
            started_at: Instant::now(),
            response_defaults: ResponseHeaders::new(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the caller identity.
    #[must_use]
    pub const fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    /// Sets the caller identity. Auth strategies call this on success.
    pub fn set_identity(&mut self, identity: CallerIdentity) {
        self.identity = identity;
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns the headers every reply inherits.
    #[must_use]
    pub const fn response_defaults(&self) -> &ResponseHeaders {
        &self.response_defaults
    }

    /// Returns the inherited headers for modification.
    pub fn response_defaults_mut(&mut self) -> &mut ResponseHeaders {
        &mut self.response_defaults
    }

    /// Stores a typed extension value, replacing any earlier one.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Retrieves a typed extension value for modification.
    pub fn get_extension_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.extensions
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }

    /// Builds a JSON reply.
    pub fn json(&self, value: impl Into<Value>) -> Reply {
        Reply::json(value)
    }

    /// Builds a multipart form-data reply.
    pub fn multipart_form_data<I, K, V>(&self, fields: I) -> Reply
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MultipartValue>,
    {
        Reply::multipart_form_data(fields)
    }

    /// Builds a reply with a custom content type.
    pub fn custom(&self, content_type: impl Into<String>, payload: impl Into<Value>) -> Reply {
        Reply::custom(content_type, payload)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_new_generates_unique_ids() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_request_id_display() {
        let display = RequestId::new().to_string();
        assert_eq!(display.len(), 36);
    }

    #[test]
    fn test_new_context_is_anonymous() {
        let ctx = Context::new();
        assert_eq!(ctx.identity(), &CallerIdentity::Anonymous);
        assert!(ctx.response_defaults().is_empty());
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, Clone, PartialEq)]
        struct Counter(u32);

        let mut ctx = Context::new();
        assert!(!ctx.has_extension::<Counter>());

        ctx.set_extension(Counter(1));
        if let Some(counter) = ctx.get_extension_mut::<Counter>() {
            counter.0 += 1;
        }
        assert_eq!(ctx.get_extension::<Counter>(), Some(&Counter(2)));

        assert_eq!(ctx.remove_extension::<Counter>(), Some(Counter(2)));
        assert!(!ctx.has_extension::<Counter>());
    }

    #[test]
    fn test_response_defaults_accumulate() {
        let mut ctx = Context::new();
        ctx.response_defaults_mut().insert("X-One", "1");
        ctx.response_defaults_mut().insert("x-one", "2");
        assert_eq!(ctx.response_defaults().get("x-one"), Some("2"));
    }

    #[test]
    fn test_reply_helpers() {
        let ctx = Context::new();
        assert_eq!(ctx.json(serde_json::json!({})).kind(), "json");
        assert_eq!(ctx.custom("text/plain", "x").kind(), "custom");
        assert_eq!(
            ctx.multipart_form_data([("a", "b")]).kind(),
            "multipart"
        );
    }
}
