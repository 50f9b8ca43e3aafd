//! Provider-neutral types shared by the agent and its model providers.
//!
//! This crate establishes a unified protocol for the agent to talk to
//! the hosted LLMs it supports, so that the agent and its hooks can
//! switch between models without touching provider code.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;
mod turn;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
pub use turn::*;
