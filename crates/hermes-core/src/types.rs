//! Wire types shared by every Hermes crate.
//!
//! The engine never deviates from plain `http` request and response values
//! with fully buffered bodies at its boundary.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use http_body_util::Full;

/// The inbound HTTP request as seen by the dispatcher.
pub type WireRequest = http::Request<Full<Bytes>>;

/// The outbound HTTP response produced by the dispatcher.
pub type WireResponse = http::Response<Full<Bytes>>;

/// Extension trait for building plain responses without the builder's
/// fallible API.
pub trait ResponseExt {
    /// Creates a plain-text response with the given status code.
    fn text(status: StatusCode, message: &str) -> WireResponse;

    /// Creates a JSON response from an already serialized body.
    fn json_bytes(status: StatusCode, body: impl Into<Bytes>) -> WireResponse;
}

impl ResponseExt for WireResponse {
    fn text(status: StatusCode, message: &str) -> WireResponse {
        let mut response = http::Response::new(Full::new(Bytes::from(message.to_string())));
        *response.status_mut() = status;
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }

    fn json_bytes(status: StatusCode, body: impl Into<Bytes>) -> WireResponse {
        let mut response = http::Response::new(Full::new(body.into()));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

/// Collects a fully buffered body into bytes.
pub async fn collect_body(body: Full<Bytes>) -> Bytes {
    use http_body_util::BodyExt;

    match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response() {
        let response = WireResponse::text(StatusCode::NOT_FOUND, "Not found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_json_bytes_response() {
        let response = WireResponse::json_bytes(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"code":"UNAUTHORIZED","message":"no token"}}"#,
        );
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = collect_body(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
        assert_eq!(json["error"]["message"], "no token");
    }
}
