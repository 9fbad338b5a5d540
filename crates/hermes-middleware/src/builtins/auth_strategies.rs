//! Ready-made auth strategies.
//!
//! Both strategies read one credential from the request, hand it to a
//! [`CredentialVerifier`], store the resulting identity on the context and
//! call through. A missing or rejected credential raises
//! [`Error::Unauthorized`] without reaching downstream, which the
//! [`AuthNegotiator`](crate::stages::AuthNegotiator) treats as "try the next
//! strategy".
//!
//! ## Example
//!
//! ```
//! use hermes_core::{CallerIdentity, Error};
//! use hermes_middleware::builtins::BearerAuth;
//!
//! let bearer = BearerAuth::new(|token: &str| {
//!     if token == "let-me-in" {
//!         Ok(CallerIdentity::user("u-1"))
//!     } else {
//!         Err(Error::unauthorized("unknown token"))
//!     }
//! });
//! ```

use crate::middleware::{BoxFuture, Middleware, Next};
use hermes_core::{CallerIdentity, Context, Error, Reply, Request, Result};
use http::header::AUTHORIZATION;

/// Turns a credential into a caller identity.
pub trait CredentialVerifier: Send + Sync + 'static {
    /// Verifies `credential`.
    fn verify<'a>(&'a self, credential: &'a str) -> BoxFuture<'a, Result<CallerIdentity>>;
}

impl<F> CredentialVerifier for F
where
    F: Fn(&str) -> Result<CallerIdentity> + Send + Sync + 'static,
{
    fn verify<'a>(&'a self, credential: &'a str) -> BoxFuture<'a, Result<CallerIdentity>> {
        let result = self(credential);
        Box::pin(async move { result })
    }
}

async fn authenticate<'a, V: CredentialVerifier>(
    verifier: &'a V,
    credential: Option<&'a str>,
    missing: &'static str,
    ctx: &'a mut Context,
    request: Request,
    next: Next<'a>,
) -> Result<Reply> {
    let credential = credential.ok_or_else(|| Error::unauthorized(missing))?;
    let identity = verifier.verify(credential).await?;
    ctx.set_identity(identity);
    next.run(ctx, request).await
}

/// Authenticates `Authorization: Bearer <token>` headers.
#[derive(Debug, Clone)]
pub struct BearerAuth<V> {
    verifier: V,
}

impl<V: CredentialVerifier> BearerAuth<V> {
    /// Creates the strategy.
    pub const fn new(verifier: V) -> Self {
        Self { verifier }
    }
}

fn bearer_token(request: &Request) -> Option<String> {
    let value = request.header(AUTHORIZATION.as_str())?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

impl<V: CredentialVerifier> Middleware for BearerAuth<V> {
    fn name(&self) -> &'static str {
        "bearer_auth"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(async move {
            let token = bearer_token(&request);
            authenticate(
                &self.verifier,
                token.as_deref(),
                "missing bearer token",
                ctx,
                request,
                next,
            )
            .await
        })
    }
}

/// Authenticates an API key carried in a header (`x-api-key` by default).
#[derive(Debug, Clone)]
pub struct ApiKeyAuth<V> {
    header: String,
    verifier: V,
}

impl<V: CredentialVerifier> ApiKeyAuth<V> {
    /// Creates the strategy reading `x-api-key`.
    pub fn new(verifier: V) -> Self {
        Self {
            header: "x-api-key".to_string(),
            verifier,
        }
    }

    /// Reads the key from another header.
    #[must_use]
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into().to_ascii_lowercase();
        self
    }
}

impl<V: CredentialVerifier> Middleware for ApiKeyAuth<V> {
    fn name(&self) -> &'static str {
        "api_key_auth"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(async move {
            let key = request
                .header(&self.header)
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ToString::to_string);
            authenticate(
                &self.verifier,
                key.as_deref(),
                "missing api key",
                ctx,
                request,
                next,
            )
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnEndpoint;
    use crate::pipeline::Chain;
    use bytes::Bytes;
    use serde_json::json;

    fn verify_token(token: &str) -> Result<CallerIdentity> {
        match token {
            "good" => Ok(CallerIdentity::user("u-1")),
            _ => Err(Error::unauthorized("unknown token")),
        }
    }

    fn verify_key(key: &str) -> Result<CallerIdentity> {
        match key {
            "k-1" => Ok(CallerIdentity::api_key("k-1")),
            _ => Err(Error::unauthorized("unknown key")),
        }
    }

    fn whoami() -> FnEndpoint {
        FnEndpoint::new(|ctx, _req| {
            Box::pin(async move { Ok(ctx.json(json!(ctx.identity().log_id()))) })
        })
    }

    fn request(header: Option<(&str, &str)>) -> Request {
        let mut builder = http::Request::builder().uri("/me");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(Bytes::new()).unwrap().into()
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(
            bearer_token(&request(Some(("authorization", "Bearer abc")))).as_deref(),
            Some("abc")
        );
        assert_eq!(
            bearer_token(&request(Some(("authorization", "bearer  abc ")))).as_deref(),
            Some("abc")
        );
        assert!(bearer_token(&request(Some(("authorization", "Basic abc")))).is_none());
        assert!(bearer_token(&request(Some(("authorization", "Bearer")))).is_none());
        assert!(bearer_token(&request(None)).is_none());
    }

    #[tokio::test]
    async fn test_bearer_sets_identity() {
        let chain = Chain::builder()
            .push(BearerAuth::new(verify_token))
            .build(whoami());
        let mut ctx = Context::new();
        chain
            .run(&mut ctx, request(Some(("authorization", "Bearer good"))))
            .await
            .unwrap();
        assert_eq!(ctx.identity(), &CallerIdentity::user("u-1"));
    }

    #[tokio::test]
    async fn test_bearer_rejects_missing_and_unknown() {
        let chain = Chain::builder()
            .push(BearerAuth::new(verify_token))
            .build(whoami());

        let err = chain.run(&mut Context::new(), request(None)).await.unwrap_err();
        assert_eq!(err.to_string(), "missing bearer token");

        let err = chain
            .run(
                &mut Context::new(),
                request(Some(("authorization", "Bearer bad"))),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown token");
    }

    #[tokio::test]
    async fn test_api_key_custom_header() {
        let chain = Chain::builder()
            .push(ApiKeyAuth::new(verify_key).header("X-Key"))
            .build(whoami());
        let mut ctx = Context::new();
        chain
            .run(&mut ctx, request(Some(("x-key", "k-1"))))
            .await
            .unwrap();
        assert_eq!(ctx.identity(), &CallerIdentity::api_key("k-1"));

        let err = chain
            .run(&mut Context::new(), request(Some(("x-api-key", "k-1"))))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized { .. }));
    }
}
