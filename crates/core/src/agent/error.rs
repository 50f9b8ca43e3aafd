use std::error::Error;
use std::fmt::{self, Display};

use steerline_model::ModelProviderError;

use crate::conversation::IntegrityError;
use crate::tool::Error as ToolError;

/// The error type for agent runs.
#[derive(Debug)]
pub enum AgentError {
    /// The run was started with an empty conversation log.
    EmptyConversation,
    /// The model call failed. Model failures are never converted into
    /// turns.
    Model(Box<dyn ModelProviderError>),
    /// A tool call failed and no tool hook handled it.
    Tool {
        /// The id of the failed call.
        id: String,
        /// The name of the tool the call asked for.
        name: String,
        /// The failure.
        error: ToolError,
    },
    /// A turn would have broken the integrity of the log.
    Integrity(IntegrityError),
    /// The run reached its step limit before the model gave a final
    /// answer.
    StepLimitExceeded(usize),
}

impl Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::EmptyConversation => {
                write!(f, "the conversation has no turns to answer")
            }
            AgentError::Model(err) => {
                write!(f, "model call failed ({}): {err}", err.kind())
            }
            AgentError::Tool { id, name, error } => {
                write!(f, "tool `{name}` failed on call `{id}`: {error}")
            }
            AgentError::Integrity(err) => {
                write!(f, "conversation integrity violated: {err}")
            }
            AgentError::StepLimitExceeded(limit) => {
                write!(f, "no final answer after {limit} model calls")
            }
        }
    }
}

impl Error for AgentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AgentError::Model(err) => Some(err.as_ref()),
            AgentError::Tool { error, .. } => Some(error),
            AgentError::Integrity(err) => Some(err),
            AgentError::EmptyConversation
            | AgentError::StepLimitExceeded(_) => None,
        }
    }
}

impl From<IntegrityError> for AgentError {
    #[inline]
    fn from(err: IntegrityError) -> Self {
        AgentError::Integrity(err)
    }
}
