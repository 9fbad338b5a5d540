//! # Hermes Telemetry
//!
//! Logging setup for services built on Hermes. Every Hermes crate logs
//! through `tracing`; this crate installs the subscriber that writes those
//! events out.
//!
//! | Format    | Use                                   |
//! |-----------|---------------------------------------|
//! | `json`    | production, one object per event      |
//! | `pretty`  | local development                     |
//! | `compact` | terminals where one line per event fits |

#![doc(html_root_url = "https://docs.rs/hermes-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
