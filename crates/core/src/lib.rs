//! Core logic including the agent loop, request-shaping hooks, tool
//! execution and conversation state.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod conversation;
pub mod hook;
mod model_client;
pub mod tool;

pub use agent::{Agent, AgentBuilder, AgentError, ResponseFormat, Run};
pub use model_client::ModelReply;
