//! CORS middleware.
//!
//! Answers `OPTIONS` preflight requests directly and adds the same CORS
//! headers to every other response, error envelopes included. The allowed
//! origin is echoed from the request's `Origin` header, or `*` when the
//! request has none.
//!
//! ## Example
//!
//! ```
//! use hermes_middleware::builtins::Cors;
//!
//! let cors = Cors::new().allow_header("x-tenant-id");
//! assert!(cors.allowed_headers().contains(&"x-tenant-id".to_string()));
//! ```

use crate::middleware::{BoxFuture, Middleware, Next};
use bytes::Bytes;
use hermes_core::{Context, Reply, Request, ResponseHeaders, Result};
use http::{Method, StatusCode};
use http_body_util::Full;
use std::time::Duration;

/// CORS header names.
pub mod headers {
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// `Access-Control-Max-Age` header.
    pub const MAX_AGE: &str = "access-control-max-age";
    /// `Origin` header.
    pub const ORIGIN: &str = "origin";
    /// `Vary` header.
    pub const VARY: &str = "vary";
}

/// Request headers allowed by default.
pub const DEFAULT_ALLOWED_HEADERS: [&str; 10] = [
    "x-csrf-token",
    "x-requested-with",
    "accept",
    "accept-version",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "authorization",
    "user-agent",
];

/// Permissive CORS middleware.
#[derive(Debug, Clone)]
pub struct Cors {
    allowed_methods: Vec<Method>,
    allowed_headers: Vec<String>,
    allow_credentials: bool,
    max_age: Duration,
}

impl Default for Cors {
    fn default() -> Self {
        Self {
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
            allowed_headers: DEFAULT_ALLOWED_HEADERS
                .iter()
                .map(ToString::to_string)
                .collect(),
            allow_credentials: true,
            max_age: Duration::from_secs(86400),
        }
    }
}

impl Cors {
    /// Creates the middleware with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an allowed request header.
    #[must_use]
    pub fn allow_header(mut self, header: impl Into<String>) -> Self {
        let header = header.into().to_ascii_lowercase();
        if !self.allowed_headers.contains(&header) {
            self.allowed_headers.push(header);
        }
        self
    }

    /// Replaces the allowed methods.
    #[must_use]
    pub fn allow_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allowed_methods = methods.into_iter().collect();
        self
    }

    /// Sets whether credentials are allowed.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Sets how long preflight results may be cached.
    #[must_use]
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Returns the allowed request headers.
    #[must_use]
    pub fn allowed_headers(&self) -> &[String] {
        &self.allowed_headers
    }

    fn headers_for(&self, request: &Request) -> ResponseHeaders {
        let mut out = ResponseHeaders::new();
        out.insert(
            headers::ALLOW_ORIGIN,
            request.header(headers::ORIGIN).unwrap_or("*"),
        );
        out.insert(
            headers::ALLOW_METHODS,
            self.allowed_methods
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        );
        if self.allow_credentials {
            out.insert(headers::ALLOW_CREDENTIALS, "true");
        }
        out.insert(headers::ALLOW_HEADERS, self.allowed_headers.join(", "));
        out.insert(headers::MAX_AGE, self.max_age.as_secs().to_string());
        out.insert(headers::VARY, "Origin");
        out
    }
}

impl Middleware for Cors {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(async move {
            let cors = self.headers_for(&request);

            if request.method() == Method::OPTIONS {
                let mut preflight = http::Response::new(Full::new(Bytes::new()));
                *preflight.status_mut() = StatusCode::OK;
                return Ok(Reply::raw(preflight).headers(cors.iter()));
            }

            ctx.response_defaults_mut().merge(&cors);
            next.run(ctx, request).await
        })
    }
}
