//! Engine stages.
//!
//! Every route chain is assembled from these stages around the application's
//! own middleware, in this order:
//!
//! 1. [`unhandled`] - Convert status-carrying errors to envelopes
//! 2. [`serialization`] - Early serialization, no validation
//! 3. global before-auth middleware
//! 4. [`auth`] - Negotiate the route's auth strategies
//! 5. global after-auth middleware
//! 6. route middleware
//! 7. [`methods`] - Reject methods the route does not accept
//! 8. [`validation`] - Parse and validate request input
//! 9. [`serialization`] - Late serialization, response validation
//! 10. the handler

pub mod auth;
pub mod methods;
pub mod serialization;
pub mod unhandled;
pub mod validation;

pub use auth::{AuthAttempt, AuthFailureHandler, AuthNegotiator, DownstreamGate};
pub use methods::Methods;
pub use serialization::SerializeResponse;
pub use unhandled::UnhandledErrors;
pub use validation::{parse_query, ArrayFormat, InputSchemas, InputValidation};
