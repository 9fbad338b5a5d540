//! The enriched request seen by middleware and handlers.

use crate::error::{Error, Result};
use crate::reply::MultipartValue;
use crate::types::{collect_body, WireRequest};
use bytes::Bytes;
use hermes_router::RouteParams;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};
use http_body_util::Full;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Input parsed and validated before the handler runs.
///
/// Each field is only populated when the route declares a schema for it.
#[derive(Debug, Clone, Default)]
pub struct ValidatedInput {
    /// Parsed JSON body.
    pub json_body: Option<Value>,
    /// Parsed query parameters.
    pub query_params: Option<Value>,
    /// Query parameters merged with the JSON body (body keys win).
    pub common_params: Option<Value>,
    /// Parsed route parameters.
    pub route_params: Option<Value>,
    /// Parsed `application/x-www-form-urlencoded` body.
    pub url_encoded_form_data: Option<Value>,
    /// JSON view of a parsed `multipart/form-data` body.
    pub multipart_form_data: Option<Value>,
    /// The raw multipart parts, including file contents.
    pub multipart_parts: IndexMap<String, MultipartValue>,
}

/// An inbound request enriched with route parameters and validated input.
///
/// The wire request's head and buffered body are kept as-is; enrichment only
/// adds fields next to them.
#[derive(Debug)]
pub struct Request {
    parts: Parts,
    body: Bytes,
    route_params: RouteParams,
    input: ValidatedInput,
}

impl Request {
    /// Builds a request from a wire request, buffering its body.
    pub async fn from_wire(wire: WireRequest, route_params: RouteParams) -> Self {
        let (parts, body) = wire.into_parts();
        let body = collect_body(body).await;
        Self::from_parts(parts, body, route_params)
    }

    /// Builds a request from an already buffered head and body.
    #[must_use]
    pub fn from_parts(parts: Parts, body: Bytes, route_params: RouteParams) -> Self {
        Self {
            parts,
            body,
            route_params,
            input: ValidatedInput::default(),
        }
    }

    /// Returns the request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Returns the request URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Returns the URL path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Returns the raw query string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Returns the request headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.parts.headers
    }

    /// Returns a header value if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the essence of the `content-type` header, lowercased.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        self.header(http::header::CONTENT_TYPE.as_str())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
    }

    /// Returns the buffered body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the wire request's extensions.
    #[must_use]
    pub const fn extensions(&self) -> &http::Extensions {
        &self.parts.extensions
    }

    /// Returns the wire request's extensions for modification.
    pub fn extensions_mut(&mut self) -> &mut http::Extensions {
        &mut self.parts.extensions
    }

    /// Returns the raw route parameters extracted by the matcher.
    #[must_use]
    pub const fn route_params(&self) -> &RouteParams {
        &self.route_params
    }

    /// Returns the validated input.
    #[must_use]
    pub const fn input(&self) -> &ValidatedInput {
        &self.input
    }

    /// Returns the validated input for modification.
    pub fn input_mut(&mut self) -> &mut ValidatedInput {
        &mut self.input
    }

    /// Returns the parsed JSON body.
    #[must_use]
    pub fn json_body(&self) -> Option<&Value> {
        self.input.json_body.as_ref()
    }

    /// Returns the parsed query parameters.
    #[must_use]
    pub fn query_params(&self) -> Option<&Value> {
        self.input.query_params.as_ref()
    }

    /// Returns query parameters merged with the JSON body.
    #[must_use]
    pub fn common_params(&self) -> Option<&Value> {
        self.input.common_params.as_ref()
    }

    /// Returns the parsed URL-encoded form body.
    #[must_use]
    pub fn url_encoded_form_data(&self) -> Option<&Value> {
        self.input.url_encoded_form_data.as_ref()
    }

    /// Returns the JSON view of the parsed multipart body.
    #[must_use]
    pub fn multipart_form_data(&self) -> Option<&Value> {
        self.input.multipart_form_data.as_ref()
    }

    /// Returns a raw multipart part by field name.
    #[must_use]
    pub fn multipart_part(&self, name: &str) -> Option<&MultipartValue> {
        self.input.multipart_parts.get(name)
    }

    /// Deserializes the parsed JSON body.
    pub fn json_body_as<T: DeserializeOwned>(&self) -> Result<T> {
        typed("json body", self.json_body())
    }

    /// Deserializes the parsed query parameters.
    pub fn query_params_as<T: DeserializeOwned>(&self) -> Result<T> {
        typed("query params", self.query_params())
    }

    /// Deserializes the merged query and body parameters.
    pub fn common_params_as<T: DeserializeOwned>(&self) -> Result<T> {
        typed("common params", self.common_params())
    }

    /// Deserializes the parsed URL-encoded form body.
    pub fn url_encoded_form_data_as<T: DeserializeOwned>(&self) -> Result<T> {
        typed("url-encoded form data", self.url_encoded_form_data())
    }

    /// Deserializes the JSON view of the multipart body.
    pub fn multipart_form_data_as<T: DeserializeOwned>(&self) -> Result<T> {
        typed("multipart form data", self.multipart_form_data())
    }

    /// Deserializes the route parameters, preferring their validated form.
    pub fn route_params_as<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.input.route_params {
            Some(value) => typed("route params", Some(value)),
            None => {
                let value = serde_json::to_value(&self.route_params).map_err(Error::other)?;
                typed("route params", Some(&value))
            }
        }
    }

    /// Converts back into a wire request.
    ///
    /// The route parameters travel in the request extensions, so a bundle
    /// mounted below a catch-all route can pick them up.
    #[must_use]
    pub fn into_wire(self) -> WireRequest {
        let Self {
            mut parts,
            body,
            route_params,
            ..
        } = self;
        parts.extensions.insert(route_params);
        http::Request::from_parts(parts, Full::new(body))
    }
}

impl Clone for Request {
    fn clone(&self) -> Self {
        let (mut parts, ()) = http::Request::new(()).into_parts();
        parts.method = self.parts.method.clone();
        parts.uri = self.parts.uri.clone();
        parts.version = self.parts.version;
        parts.headers = self.parts.headers.clone();
        parts.extensions = self.parts.extensions.clone();
        Self {
            parts,
            body: self.body.clone(),
            route_params: self.route_params.clone(),
            input: self.input.clone(),
        }
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        let route_params = parts
            .extensions
            .get::<RouteParams>()
            .cloned()
            .unwrap_or_default();
        Self::from_parts(parts, body, route_params)
    }
}

fn typed<T: DeserializeOwned>(what: &str, value: Option<&Value>) -> Result<T> {
    let value = value.ok_or_else(|| {
        Error::configuration(format!("{what} were not parsed: the route declares no schema for them"))
    })?;
    T::deserialize(value).map_err(|e| Error::input_parsing(format!("invalid {what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_router::RouteParam;
    use serde::Deserialize;
    use serde_json::json;

    fn request(uri: &str) -> Request {
        http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "Application/JSON; charset=utf-8")
            .body(Bytes::from_static(b"{}"))
            .unwrap()
            .into()
    }

    #[test]
    fn test_accessors() {
        let req = request("/users/7?limit=10");
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/users/7");
        assert_eq!(req.query(), Some("limit=10"));
        assert_eq!(req.content_type().as_deref(), Some("application/json"));
        assert_eq!(req.body().as_ref(), b"{}");
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Body {
        name: String,
    }

    #[test]
    fn test_typed_json_body() {
        let mut req = request("/");
        req.input_mut().json_body = Some(json!({ "name": "ada" }));
        assert_eq!(
            req.json_body_as::<Body>().unwrap(),
            Body {
                name: "ada".to_string()
            }
        );
    }

    #[test]
    fn test_typed_access_without_schema_is_configuration_error() {
        let req = request("/");
        assert!(matches!(
            req.json_body_as::<Body>(),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_typed_access_mismatch_is_parsing_error() {
        let mut req = request("/");
        req.input_mut().query_params = Some(json!({ "name": 3 }));
        assert!(matches!(
            req.query_params_as::<Body>(),
            Err(Error::InputParsing { .. })
        ));
    }

    #[test]
    fn test_route_params_fall_back_to_raw() {
        #[derive(Deserialize)]
        struct Params {
            id: String,
            rest: Vec<String>,
        }

        let params: RouteParams = [
            ("id", RouteParam::from("7")),
            ("rest", RouteParam::from(vec!["a".to_string()])),
        ]
        .into_iter()
        .collect();
        let (parts, body) = http::Request::new(Bytes::new()).into_parts();
        let req = Request::from_parts(parts, body, params);

        let parsed: Params = req.route_params_as().unwrap();
        assert_eq!(parsed.id, "7");
        assert_eq!(parsed.rest, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_into_wire_carries_route_params() {
        let mut params = RouteParams::new();
        params.push("path", vec!["x".to_string(), "y".to_string()]);
        let wire = http::Request::builder()
            .uri("/mount/x/y")
            .body(Full::new(Bytes::from_static(b"payload")))
            .unwrap();

        let req = Request::from_wire(wire, params.clone()).await;
        let wire = req.into_wire();
        assert_eq!(wire.extensions().get::<RouteParams>(), Some(&params));

        let again = Request::from_wire(wire, RouteParams::new()).await;
        assert_eq!(again.body().as_ref(), b"payload");
    }
}
