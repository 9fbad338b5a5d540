//! # Hermes Test
//!
//! In-memory testing for route bundles. Requests are built with a fluent
//! API and dispatched straight into [`RouteBundle::make_request`]; nothing
//! binds a port.
//!
//! ```ignore
//! let client = TestClient::new(bundle);
//!
//! let response = client
//!     .post("/users")
//!     .bearer_token("secret")
//!     .json(&json!({ "name": "Alice" }))
//!     .send()
//!     .await?;
//!
//! response.assert_status(StatusCode::CREATED);
//! ```
//!
//! [`RouteBundle::make_request`]: hermes::RouteBundle::make_request

#![doc(html_root_url = "https://docs.rs/hermes-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod response;

pub use client::{TestClient, TestRequest};
pub use error::TestError;
pub use response::TestResponse;
