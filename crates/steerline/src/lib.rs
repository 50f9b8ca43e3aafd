//! Request-shaping and error-translation hooks in action.
//!
//! The crate bundles the policies, mock tools and demo scenarios built on
//! top of [`steerline_core`], plus a CLI that runs the demos against a
//! DeepSeek-compatible endpoint.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod config;
pub mod demos;
pub mod formats;
pub mod policies;
pub mod tools;

pub use config::{
    API_KEY_VAR, BASE_URL_VAR, Config, ConfigError, MODEL_VAR,
};

/// Re-exports of [`steerline_core`] crate.
pub mod core {
    pub use steerline_core::*;
}
