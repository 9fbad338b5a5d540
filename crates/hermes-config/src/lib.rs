//! Configuration for Hermes.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict parsing (unknown fields are rejected)
//! - Layered loading (defaults → file → env)
//!
//! # Configuration File Format
//!
//! ```toml
//! [dispatch]
//! validate_responses = true
//! supported_array_formats = ["brackets", "comma", "repeat"]
//! automatically_remove_pathname_prefix = false
//! remove_pathname_prefix = "/api"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `HERMES__DISPATCH__VALIDATE_RESPONSES=false`
//! - `HERMES__DISPATCH__SUPPORTED_ARRAY_FORMATS=comma,repeat`
//! - `HERMES__LOGGING__LEVEL=debug`

#![doc(html_root_url = "https://docs.rs/hermes-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{DispatchConfig, HermesConfig, KNOWN_ARRAY_FORMATS};
pub use error::ConfigError;
pub use loader::ConfigLoader;
