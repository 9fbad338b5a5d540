//! # Hermes Middleware
//!
//! The middleware model of Hermes and the stages every route chain is built
//! from.
//!
//! A middleware receives the per-call [`Context`](hermes_core::Context), the
//! request, and a [`Next`] continuation. A [`Chain`] closes an ordered list
//! of middleware over a terminal [`Endpoint`]:
//!
//! ```text
//! Request → UnhandledErrors → SerializeResponse → before-auth → AuthNegotiator
//!         → after-auth → route middleware → Methods → InputValidation
//!         → SerializeResponse (validating) → handler
//! ```
//!
//! Errors are ordinary `Err` values. They travel back through every
//! middleware that awaited `next` until one of them converts the error into
//! a reply; if nothing does, the error leaves the chain.
//!
//! ## Example
//!
//! ```
//! use hermes_middleware::{builtins::Cors, Chain, FnEndpoint};
//! use serde_json::json;
//!
//! let chain = Chain::builder()
//!     .push(Cors::new())
//!     .build(FnEndpoint::new(|ctx, _req| {
//!         Box::pin(async move { Ok(ctx.json(json!({ "hello": "world" }))) })
//!     }));
//! assert_eq!(chain.stage_names(), vec!["cors"]);
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod builtins;
pub mod middleware;
pub mod pipeline;
pub mod stages;

pub use middleware::{BoxFuture, BoxedMiddleware, Endpoint, FnEndpoint, FnMiddleware, Middleware, Next};
pub use pipeline::{Chain, ChainBuilder};
pub use stages::{
    ArrayFormat, AuthFailureHandler, AuthNegotiator, InputSchemas, InputValidation, Methods,
    SerializeResponse, UnhandledErrors,
};
