//! # Hermes
//!
//! Request dispatch and middleware composition for HTTP API handlers.
//!
//! An application declares, per route, which methods it accepts, what its
//! input and output must look like, and which auth strategies may let a
//! caller in. Hermes turns each declaration into one composed chain with a
//! fixed stage order and dispatches wire requests to it.
//!
//! ## Quick Start
//!
//! ```
//! use hermes::prelude::*;
//! use http::{Method, StatusCode};
//! use serde_json::json;
//!
//! # fn main() -> hermes::core::Result<()> {
//! let global = GlobalSpec::new();
//!
//! let hello = global.route(
//!     RouteSpec::new([Method::GET])
//!         .json_response(JsonSchema::shared(json!({ "type": "object" }))?),
//!     FnEndpoint::new(|ctx, _req| {
//!         Box::pin(async move {
//!             Ok(ctx
//!                 .json(json!({ "hello": "world" }))
//!                 .status(StatusCode::CREATED)
//!                 .header("x-hello", "world"))
//!         })
//!     }),
//! )?;
//!
//! let bundle = RouteBundle::builder().route("/hello", hello).build()?;
//! # let _ = bundle;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! WireRequest → RouteBundle::make_request
//!     → effective path (prefix removal) → RouteMatcher
//!     → [ad-hoc middleware] → UnhandledErrors → SerializeResponse
//!     → before-auth → AuthNegotiator → after-auth → route middleware
//!     → Methods → InputValidation → SerializeResponse (validating) → handler
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bundle;
mod dispatch;
mod route;
mod spec;

pub use bundle::{normalize_route_key, RequestBundleExt, RouteBundle, RouteBundleBuilder};
pub use dispatch::MakeRequestOptions;
pub use route::Route;
pub use spec::{AuthRequirement, GlobalSpec, RouteSpec};

// Re-export the member crates
pub use hermes_config as config;
pub use hermes_core as core;
pub use hermes_middleware as middleware;
pub use hermes_router as router;
pub use hermes_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```
/// use hermes::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AuthRequirement, GlobalSpec, MakeRequestOptions, RequestBundleExt, Route, RouteBundle,
        RouteSpec,
    };
    pub use hermes_core::{
        CallerIdentity, Context, Error, JsonSchema, Reply, Request, Result, Typed, WireRequest,
        WireResponse,
    };
    pub use hermes_middleware::{
        BoxFuture, BoxedMiddleware, Endpoint, FnEndpoint, FnMiddleware, Middleware, Next,
    };
}
