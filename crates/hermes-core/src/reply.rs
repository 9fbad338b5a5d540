//! The response model.
//!
//! Handlers and middleware return a [`Reply`]: a closed set of body variants
//! plus response-init state (status, status text, headers) that can be
//! adjusted with chained calls. A reply becomes a [`WireResponse`] exactly
//! once, in [`Reply::serialize`], where the route's response schemas are
//! applied.

use crate::error::{Error, Result};
use crate::schema::SchemaRef;
use crate::types::WireResponse;
use bytes::{Bytes, BytesMut};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use tracing::debug;
use uuid::Uuid;

/// An ordered, case-insensitive header set where later writes win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders(IndexMap<String, String>);

impl ResponseHeaders {
    /// Creates an empty header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header, replacing any earlier value for the same name.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Returns the value of a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Removes a header.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.shift_remove(&name.to_ascii_lowercase())
    }

    /// Merges `other` on top of this set.
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }

    /// Iterates headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns `true` if no header is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Writes every header into `target`, optionally keeping existing values.
    fn apply_to(&self, target: &mut HeaderMap, overwrite: bool) -> Result<()> {
        for (name, value) in self.iter() {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::configuration(format!("invalid response header name {name:?}")))?;
            if !overwrite && target.contains_key(&header_name) {
                continue;
            }
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                Error::configuration(format!("invalid value for response header {name}"))
            })?;
            target.insert(header_name, header_value);
        }
        Ok(())
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ResponseHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name.as_ref(), value);
        }
        headers
    }
}

/// Reason phrase attached to a serialized response.
///
/// `http` responses only carry the canonical reason, so a custom status text
/// travels as a response extension for the server layer to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusText(pub String);

/// Mutable response-init state shared by every reply variant.
#[derive(Debug, Clone, Default)]
pub struct ResponseInit {
    /// Status override; `None` keeps the variant's default.
    pub status: Option<StatusCode>,
    /// Custom reason phrase.
    pub status_text: Option<String>,
    /// Headers applied on top of the variant's own headers.
    pub headers: ResponseHeaders,
}

/// One field of a multipart form-data reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartValue {
    /// A plain text field.
    Text(String),
    /// A file part.
    File {
        /// File name sent in the content disposition.
        file_name: Option<String>,
        /// Content type of the part.
        content_type: Option<String>,
        /// Raw bytes.
        data: Bytes,
    },
}

impl MultipartValue {
    /// Creates a file part.
    pub fn file(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self::File {
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data: data.into(),
        }
    }

    /// Returns the JSON view used for schema validation.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::File {
                file_name,
                content_type,
                data,
            } => serde_json::json!({
                "file_name": file_name,
                "content_type": content_type,
                "size": data.len(),
            }),
        }
    }
}

impl From<&str> for MultipartValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MultipartValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MultipartValue {
    fn from(value: i64) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for MultipartValue {
    fn from(value: f64) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for MultipartValue {
    fn from(value: bool) -> Self {
        Self::Text(value.to_string())
    }
}

/// The body of a [`Reply`].
#[derive(Debug)]
pub enum ReplyBody {
    /// A JSON document.
    Json(Value),
    /// A multipart form-data document.
    MultipartFormData(IndexMap<String, MultipartValue>),
    /// A payload sent under a custom content type.
    ///
    /// String payloads are sent verbatim, anything else is JSON encoded.
    Custom {
        /// The content type, also the key of the payload's response schema.
        content_type: String,
        /// The payload.
        payload: Value,
    },
    /// A prebuilt wire response that bypasses the model.
    Raw(WireResponse),
}

/// Response schemas declared by a route.
#[derive(Clone, Default)]
pub struct ResponseSchemas {
    /// Schema for JSON replies.
    pub json: Option<SchemaRef>,
    /// Schema for multipart form-data replies.
    pub multipart: Option<SchemaRef>,
    /// Schemas for custom replies, keyed by content type.
    pub custom: IndexMap<String, SchemaRef>,
}

impl std::fmt::Debug for ResponseSchemas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseSchemas")
            .field("json", &self.json.is_some())
            .field("multipart", &self.multipart.is_some())
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A response produced by a handler or middleware.
///
/// # Example
///
/// ```
/// use hermes_core::Reply;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let reply = Reply::json(json!({ "hello": "world" }))
///     .status(StatusCode::CREATED)
///     .header("x-hello", "world");
/// assert_eq!(reply.status_code(), StatusCode::CREATED);
/// ```
#[derive(Debug)]
pub struct Reply {
    body: ReplyBody,
    init: ResponseInit,
}

impl Reply {
    fn with_body(body: ReplyBody) -> Self {
        Self {
            body,
            init: ResponseInit::default(),
        }
    }

    /// Creates a JSON reply.
    pub fn json(value: impl Into<Value>) -> Self {
        Self::with_body(ReplyBody::Json(value.into()))
    }

    /// Creates a JSON reply from any serializable value.
    pub fn json_from<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value).map_err(Error::other)?;
        Ok(Self::json(value))
    }

    /// Creates a multipart form-data reply.
    pub fn multipart_form_data<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MultipartValue>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::with_body(ReplyBody::MultipartFormData(fields))
    }

    /// Creates a reply with a custom content type.
    pub fn custom(content_type: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self::with_body(ReplyBody::Custom {
            content_type: content_type.into(),
            payload: payload.into(),
        })
    }

    /// Wraps a prebuilt wire response.
    #[must_use]
    pub fn raw(response: WireResponse) -> Self {
        Self::with_body(ReplyBody::Raw(response))
    }

    /// Sets the status code.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.init.status = Some(status);
        self
    }

    /// Sets a custom reason phrase.
    #[must_use]
    pub fn status_text(mut self, text: impl Into<String>) -> Self {
        self.init.status_text = Some(text.into());
        self
    }

    /// Sets a header. Later writes to the same name win.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Sets several headers in order.
    #[must_use]
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.set_header(name.as_ref(), value);
        }
        self
    }

    /// Sets a header in place.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.init.headers.insert(name, value);
    }

    /// Returns the status the serialized response will carry.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match (&self.body, self.init.status) {
            (_, Some(status)) => status,
            (ReplyBody::Raw(response), None) => response.status(),
            (_, None) => StatusCode::OK,
        }
    }

    /// Returns the body variant.
    #[must_use]
    pub fn body(&self) -> &ReplyBody {
        &self.body
    }

    /// Returns the response-init state.
    #[must_use]
    pub fn init(&self) -> &ResponseInit {
        &self.init
    }

    /// Returns a short name for the body variant, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self.body {
            ReplyBody::Json(_) => "json",
            ReplyBody::MultipartFormData(_) => "multipart",
            ReplyBody::Custom { .. } => "custom",
            ReplyBody::Raw(_) => "raw",
        }
    }

    /// Converts the reply into a wire response.
    ///
    /// `defaults` are headers contributed through the context; they sit
    /// underneath the reply's own headers. When `validate` is set and the
    /// status is 2xx, the body is checked against the matching schema in
    /// `schemas` and replaced by the parsed value. A custom reply whose
    /// content type has no registered schema is always rejected.
    pub fn serialize(
        self,
        validate: bool,
        schemas: &ResponseSchemas,
        defaults: &ResponseHeaders,
    ) -> Result<WireResponse> {
        let status = self.status_code();
        let check = validate && status.is_success();
        let Self { body, init } = self;

        let (content_type, bytes) = match body {
            ReplyBody::Raw(mut response) => {
                *response.status_mut() = status;
                defaults.apply_to(response.headers_mut(), false)?;
                init.headers.apply_to(response.headers_mut(), true)?;
                if let Some(text) = init.status_text {
                    response.extensions_mut().insert(StatusText(text));
                }
                return Ok(response);
            }
            ReplyBody::Json(value) => {
                let value = checked(check, schemas.json.as_ref(), value)?;
                let bytes = serde_json::to_vec(&value).map_err(Error::other)?;
                ("application/json".to_string(), Bytes::from(bytes))
            }
            ReplyBody::MultipartFormData(fields) => {
                if check {
                    let view = fields
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_json()))
                        .collect::<serde_json::Map<_, _>>();
                    checked(true, schemas.multipart.as_ref(), Value::Object(view))?;
                }
                let boundary = format!("hermes-{}", Uuid::now_v7().simple());
                let bytes = encode_multipart(&boundary, &fields);
                (format!("multipart/form-data; boundary={boundary}"), bytes)
            }
            ReplyBody::Custom {
                content_type,
                payload,
            } => {
                let schema = schemas.custom.get(&content_type).ok_or_else(|| {
                    Error::configuration(format!(
                        "no response schema registered for content type {content_type}"
                    ))
                })?;
                let payload = checked(check, Some(schema), payload)?;
                let bytes = match payload {
                    Value::String(text) => Bytes::from(text),
                    other => Bytes::from(serde_json::to_vec(&other).map_err(Error::other)?),
                };
                (content_type, bytes)
            }
        };

        let mut response = http::Response::new(Full::new(bytes));
        *response.status_mut() = status;
        defaults.apply_to(response.headers_mut(), true)?;
        let content_type = HeaderValue::from_str(&content_type).map_err(|_| {
            Error::configuration(format!("invalid content type {content_type:?}"))
        })?;
        response.headers_mut().insert(CONTENT_TYPE, content_type);
        init.headers.apply_to(response.headers_mut(), true)?;
        if let Some(text) = init.status_text {
            response.extensions_mut().insert(StatusText(text));
        }
        Ok(response)
    }
}

impl From<WireResponse> for Reply {
    fn from(response: WireResponse) -> Self {
        Self::raw(response)
    }
}

fn checked(check: bool, schema: Option<&SchemaRef>, value: Value) -> Result<Value> {
    match schema {
        Some(schema) if check => schema.parse(value).map_err(|issues| {
            debug!(issues = %issues, "reply failed its response schema");
            Error::ResponseValidation(issues)
        }),
        _ => Ok(value),
    }
}

/// Percent-encodes the characters RFC 7578 forbids inside a quoted
/// `Content-Disposition` parameter.
fn escape_disposition(value: &str) -> Cow<'_, str> {
    if !value.contains(['"', '\r', '\n']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 6);
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

fn encode_multipart(boundary: &str, fields: &IndexMap<String, MultipartValue>) -> Bytes {
    let mut out = BytesMut::new();
    for (name, value) in fields {
        let name = escape_disposition(name);
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match value {
            MultipartValue::Text(text) => {
                out.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                out.extend_from_slice(text.as_bytes());
            }
            MultipartValue::File {
                file_name,
                content_type,
                data,
            } => {
                let file_name = escape_disposition(file_name.as_deref().unwrap_or("blob"));
                out.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
                    )
                    .as_bytes(),
                );
                let content_type = content_type
                    .as_deref()
                    .unwrap_or("application/octet-stream");
                out.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
                out.extend_from_slice(data);
            }
        }
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FnSchema, JsonSchema};
    use crate::types::collect_body;
    use serde_json::json;
    use std::sync::Arc;

    fn object_schema() -> SchemaRef {
        JsonSchema::shared(json!({
            "type": "object",
            "properties": { "hello": { "type": "string" } },
            "required": ["hello"]
        }))
        .unwrap()
    }

    async fn body_text(response: WireResponse) -> String {
        String::from_utf8(collect_body(response.into_body()).await.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        let response = Reply::json(json!({ "hello": "world" }))
            .status(StatusCode::CREATED)
            .header("x-hello", "world")
            .serialize(true, &ResponseSchemas::default(), &ResponseHeaders::new())
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-hello"], "world");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_text(response).await, r#"{"hello":"world"}"#);
    }

    #[test]
    fn test_invalid_success_body_is_response_validation_error() {
        let schemas = ResponseSchemas {
            json: Some(object_schema()),
            ..ResponseSchemas::default()
        };
        let err = Reply::json(json!({ "hello": 1 }))
            .serialize(true, &schemas, &ResponseHeaders::new())
            .unwrap_err();
        assert!(matches!(err, Error::ResponseValidation(_)));
    }

    #[test]
    fn test_non_success_status_skips_validation() {
        let schemas = ResponseSchemas {
            json: Some(object_schema()),
            ..ResponseSchemas::default()
        };
        let response = Reply::json(json!({ "error": "nope" }))
            .status(StatusCode::BAD_REQUEST)
            .serialize(true, &schemas, &ResponseHeaders::new())
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validation_disabled_skips_schema() {
        let schemas = ResponseSchemas {
            json: Some(object_schema()),
            ..ResponseSchemas::default()
        };
        assert!(Reply::json(json!([]))
            .serialize(false, &schemas, &ResponseHeaders::new())
            .is_ok());
    }

    #[tokio::test]
    async fn test_parsed_value_replaces_body() {
        let schemas = ResponseSchemas {
            json: Some(FnSchema::new(|_| Ok(json!({ "trimmed": true }))).shared()),
            ..ResponseSchemas::default()
        };
        let response = Reply::json(json!({ "secret": "x" }))
            .serialize(true, &schemas, &ResponseHeaders::new())
            .unwrap();
        assert_eq!(body_text(response).await, r#"{"trimmed":true}"#);
    }

    #[test]
    fn test_unregistered_custom_type_fails_without_validation() {
        let err = Reply::custom("text/csv", "a,b")
            .serialize(false, &ResponseSchemas::default(), &ResponseHeaders::new())
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_custom_bodies() {
        let mut schemas = ResponseSchemas::default();
        schemas
            .custom
            .insert("text/plain".to_string(), Arc::new(crate::AnySchema));

        let response = Reply::custom("text/plain", "hi")
            .serialize(true, &schemas, &ResponseHeaders::new())
            .unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(body_text(response).await, "hi");

        let response = Reply::custom("text/plain", 4)
            .serialize(true, &schemas, &ResponseHeaders::new())
            .unwrap();
        assert_eq!(body_text(response).await, "4");
    }

    #[test]
    fn test_header_merge_order() {
        let defaults: ResponseHeaders =
            [("X-Trace", "from-middleware"), ("x-shared", "default")]
                .into_iter()
                .collect();
        let response = Reply::json(json!({}))
            .header("x-shared", "first")
            .headers([("x-shared", "handler")])
            .serialize(false, &ResponseSchemas::default(), &defaults)
            .unwrap();

        assert_eq!(response.headers()["x-trace"], "from-middleware");
        assert_eq!(response.headers()["x-shared"], "handler");
    }

    #[test]
    fn test_raw_reply_keeps_own_headers_over_defaults() {
        let mut raw = WireResponse::new(Full::new(Bytes::from_static(b"ok")));
        raw.headers_mut()
            .insert("x-owner", HeaderValue::from_static("raw"));
        let defaults: ResponseHeaders = [("x-owner", "ctx"), ("x-extra", "ctx")]
            .into_iter()
            .collect();

        let response = Reply::raw(raw)
            .serialize(true, &ResponseSchemas::default(), &defaults)
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-owner"], "raw");
        assert_eq!(response.headers()["x-extra"], "ctx");
    }

    #[test]
    fn test_multipart_encoding() {
        let response = Reply::multipart_form_data([
            ("name", MultipartValue::from("ada")),
            ("avatar", MultipartValue::file("a.png", "image/png", &b"PNG"[..])),
        ])
        .serialize(true, &ResponseSchemas::default(), &ResponseHeaders::new())
        .unwrap();

        let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap()
            .to_string();
        let body = tokio_test::block_on(body_text(response));
        assert!(body.starts_with(&format!("--{boundary}\r\n")));
        assert!(body.contains("name=\"name\"\r\n\r\nada\r\n"));
        assert!(body.contains("filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\nPNG\r\n"));
        assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn test_multipart_disposition_is_escaped() {
        let response = Reply::multipart_form_data([
            ("a\"b", MultipartValue::from("x")),
            (
                "doc",
                MultipartValue::file("evil\"\r\nX-Injected: 1.txt", "text/plain", &b"hi"[..]),
            ),
        ])
        .serialize(true, &ResponseSchemas::default(), &ResponseHeaders::new())
        .unwrap();

        let body = tokio_test::block_on(body_text(response));
        assert!(body.contains("name=\"a%22b\"\r\n\r\nx\r\n"));
        assert!(body.contains("filename=\"evil%22%0D%0AX-Injected: 1.txt\"\r\n"));
        assert!(!body.contains("\r\nX-Injected"));
    }

    #[test]
    fn test_status_text_extension() {
        let response = Reply::json(json!({}))
            .status_text("All Good")
            .serialize(false, &ResponseSchemas::default(), &ResponseHeaders::new())
            .unwrap();
        assert_eq!(
            response.extensions().get::<StatusText>(),
            Some(&StatusText("All Good".to_string()))
        );
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn header_pairs() -> impl Strategy<Value = Vec<(String, String)>> {
            prop::collection::vec(("[a-c]{1,2}", "[a-z0-9]{0,4}"), 0..12)
        }

        proptest! {
            #[test]
            fn merge_keeps_every_name_and_later_values_win(
                base in header_pairs(),
                top in header_pairs(),
            ) {
                let mut merged: ResponseHeaders = base.iter().cloned().collect();
                let top: ResponseHeaders = top.into_iter().collect();
                merged.merge(&top);

                for (name, value) in top.iter() {
                    prop_assert_eq!(merged.get(name), Some(value));
                }
                for (name, _) in &base {
                    prop_assert!(merged.get(name).is_some());
                }
            }
        }
    }
}
