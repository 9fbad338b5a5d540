//! In-memory client for route bundles.

use crate::error::TestError;
use crate::response::TestResponse;
use bytes::Bytes;
use hermes::{MakeRequestOptions, RouteBundle};
use hermes_core::WireRequest;
use http::{header, HeaderName, HeaderValue, Method};
use http_body_util::Full;
use serde::Serialize;

/// Dispatches requests straight into a [`RouteBundle`].
///
/// No socket is opened; every request goes through
/// [`RouteBundle::make_request`] with the client's options.
///
/// # Example
///
/// ```
/// use hermes::prelude::*;
/// use hermes_test::TestClient;
/// use http::Method;
/// use serde_json::json;
///
/// let route = GlobalSpec::new()
///     .route(
///         RouteSpec::new([Method::GET]),
///         FnEndpoint::new(|ctx, _req| Box::pin(async move { Ok(ctx.json(json!("pong"))) })),
///     )
///     .unwrap();
/// let bundle = RouteBundle::builder().route("/ping", route).build().unwrap();
/// let client = TestClient::new(bundle);
/// # let _ = client;
/// ```
#[derive(Debug, Clone)]
pub struct TestClient {
    bundle: RouteBundle,
    options: MakeRequestOptions,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client with default dispatch options.
    #[must_use]
    pub fn new(bundle: RouteBundle) -> Self {
        Self::with_options(bundle, MakeRequestOptions::default())
    }

    /// Creates a client with custom dispatch options.
    #[must_use]
    pub fn with_options(bundle: RouteBundle, options: MakeRequestOptions) -> Self {
        Self {
            bundle,
            options,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the bundle under test.
    #[must_use]
    pub fn bundle(&self) -> &RouteBundle {
        &self.bundle
    }

    /// Starts a GET request.
    pub fn get(&self, uri: &str) -> TestRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: &str) -> TestRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: &str) -> TestRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a PATCH request.
    pub fn patch(&self, uri: &str) -> TestRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: &str) -> TestRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: &str) -> TestRequest<'_> {
        let mut request = TestRequest {
            client: self,
            builder: http::Request::builder().method(method).uri(uri),
            body: Bytes::new(),
            error: None,
        };
        for (name, value) in &self.default_headers {
            request = request.header(name, value);
        }
        request
    }
}

/// A request being built against a [`TestClient`].
#[must_use]
pub struct TestRequest<'a> {
    client: &'a TestClient,
    builder: http::request::Builder,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => self.builder = self.builder.header(name, value),
            _ => self.fail(TestError::RequestBuild(format!("invalid header {name}"))),
        }
        self
    }

    /// Sets `authorization: Bearer <token>`.
    pub fn bearer_token(self, token: &str) -> Self {
        self.header(header::AUTHORIZATION.as_str(), &format!("Bearer {token}"))
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and its content type.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => self.fail(e.into()),
        }
        self.header(header::CONTENT_TYPE.as_str(), "application/json")
    }

    /// Sets a URL-encoded form body and its content type.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => self.body = Bytes::from(encoded),
            Err(e) => self.fail(e.into()),
        }
        self.header(
            header::CONTENT_TYPE.as_str(),
            "application/x-www-form-urlencoded",
        )
    }

    /// Builds the wire request without sending it.
    pub fn build(self) -> Result<WireRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.builder
            .body(Full::new(self.body))
            .map_err(|e| TestError::RequestBuild(e.to_string()))
    }

    /// Dispatches the request and buffers the response.
    ///
    /// Errors the dispatcher raises instead of answering come back as
    /// [`TestError::Dispatch`].
    pub async fn send(self) -> Result<TestResponse, TestError> {
        let client = self.client;
        let request = self.build()?;
        let response = client.bundle.make_request(request, &client.options).await?;
        Ok(TestResponse::from_wire(response).await)
    }

    fn fail(&mut self, error: TestError) {
        self.error.get_or_insert(error);
    }
}
