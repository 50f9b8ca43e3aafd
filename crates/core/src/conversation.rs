//! Conversation-related types.

use std::collections::HashSet;
use std::error::Error;
use std::fmt::{self, Display};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use steerline_model::{Role, Turn};

/// Describes a turn that would break the referential integrity of a
/// conversation log.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntegrityError {
    /// A tool turn answers a call that no earlier assistant turn made.
    UnknownToolCall(String),
    /// A tool turn answers a call that has already been answered.
    DuplicateToolResult(String),
    /// An assistant turn reuses a tool call id.
    DuplicateToolCallId(String),
    /// A tool result was produced for a different call than the one
    /// being executed.
    MismatchedToolResult {
        /// The id of the call being executed.
        expected: String,
        /// The id carried by the result.
        found: String,
    },
}

impl Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityError::UnknownToolCall(id) => {
                write!(f, "tool turn answers unknown call `{id}`")
            }
            IntegrityError::DuplicateToolResult(id) => {
                write!(f, "call `{id}` has already been answered")
            }
            IntegrityError::DuplicateToolCallId(id) => {
                write!(f, "tool call id `{id}` is used more than once")
            }
            IntegrityError::MismatchedToolResult { expected, found } => {
                write!(f, "expected a result for `{expected}`, got `{found}`")
            }
        }
    }
}

impl Error for IntegrityError {}

/// An append-only log of turns.
///
/// Every `Tool` turn in the log answers exactly one call requested by a
/// strictly earlier `Assistant` turn, and no call is answered twice. The
/// log checks this on every append, so a `ConversationLog` value is always
/// consistent.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct ConversationLog {
    turns: Vec<Turn>,
    issued: HashSet<String>,
    answered: HashSet<String>,
}

impl ConversationLog {
    /// Creates an empty log.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a log from existing turns, checking them in order.
    pub fn from_turns<I>(turns: I) -> Result<Self, IntegrityError>
    where
        I: IntoIterator<Item = Turn>,
    {
        let mut log = Self::new();
        for turn in turns {
            log.push(turn)?;
        }
        Ok(log)
    }

    /// Appends a turn, rejecting it if it would break the integrity of
    /// the log. A rejected turn leaves the log untouched.
    pub fn push(&mut self, turn: Turn) -> Result<(), IntegrityError> {
        match &turn {
            Turn::Assistant { tool_calls, .. } => {
                let mut ids = HashSet::with_capacity(tool_calls.len());
                for call in tool_calls {
                    if self.issued.contains(&call.id)
                        || !ids.insert(call.id.as_str())
                    {
                        return Err(IntegrityError::DuplicateToolCallId(
                            call.id.clone(),
                        ));
                    }
                }
                self.issued
                    .extend(tool_calls.iter().map(|call| call.id.clone()));
            }
            Turn::Tool(result) => {
                if !self.issued.contains(&result.id) {
                    return Err(IntegrityError::UnknownToolCall(
                        result.id.clone(),
                    ));
                }
                if !self.answered.insert(result.id.clone()) {
                    return Err(IntegrityError::DuplicateToolResult(
                        result.id.clone(),
                    ));
                }
            }
            Turn::User { .. } => {}
        }
        self.turns.push(turn);
        Ok(())
    }

    /// Returns the turns in order.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the number of turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if the log has no turns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the latest turn.
    #[inline]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Returns the number of turns authored by `role`.
    pub fn count(&self, role: Role) -> usize {
        self.turns.iter().filter(|turn| turn.role() == role).count()
    }

    /// Returns the ids of calls that have been requested but not yet
    /// answered, in request order.
    pub fn pending_tool_calls(&self) -> Vec<&str> {
        self.turns
            .iter()
            .flat_map(Turn::tool_calls)
            .map(|call| call.id.as_str())
            .filter(|id| !self.answered.contains(*id))
            .collect()
    }

    /// Consumes the log and returns the turns.
    #[inline]
    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }
}

/// Checks that a sequence of turns forms a consistent log.
#[inline]
pub fn validate(turns: &[Turn]) -> Result<(), IntegrityError> {
    ConversationLog::from_turns(turns.iter().cloned()).map(|_| ())
}

/// The state of a conversation: the log plus named extension fields.
///
/// Extension fields are opaque to the agent loop. They are handed to the
/// hooks read-only and returned unchanged in the final state. Readers
/// should treat a missing field as an empty value.
///
/// A run with a [`ResponseFormat`] also leaves the structured answer of the
/// model here.
///
/// [`ResponseFormat`]: crate::ResponseFormat
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentState {
    log: ConversationLog,
    extensions: Map<String, Value>,
    structured_response: Option<Value>,
}

impl AgentState {
    /// Creates a state around an existing log.
    #[inline]
    pub fn new(log: ConversationLog) -> Self {
        Self {
            log,
            extensions: Map::new(),
            structured_response: None,
        }
    }

    /// Creates a state containing a single user turn.
    #[inline]
    pub fn from_user_input<S: Into<String>>(input: S) -> Self {
        let mut log = ConversationLog::new();
        // User turns never break integrity.
        log.turns.push(Turn::user(input));
        Self::new(log)
    }

    /// Sets an extension field.
    #[inline]
    pub fn with_extension<S: Into<String>>(
        mut self,
        name: S,
        value: Value,
    ) -> Self {
        self.extensions.insert(name.into(), value);
        self
    }

    /// Returns the conversation log.
    #[inline]
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    #[inline]
    pub(crate) fn log_mut(&mut self) -> &mut ConversationLog {
        &mut self.log
    }

    /// Returns all extension fields.
    #[inline]
    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }

    /// Returns an extension field, if present.
    #[inline]
    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions.get(name)
    }

    /// Returns the latest structured answer, if any.
    #[inline]
    pub fn structured_response(&self) -> Option<&Value> {
        self.structured_response.as_ref()
    }

    /// Decodes the latest structured answer into `T`.
    pub fn parse_structured_response<T: DeserializeOwned>(
        &self,
    ) -> Option<Result<T, serde_json::Error>> {
        self.structured_response
            .as_ref()
            .map(|answer| T::deserialize(answer))
    }

    #[inline]
    pub(crate) fn set_structured_response(&mut self, answer: Value) {
        self.structured_response = Some(answer);
    }

    /// Returns the text of the latest turn, or an empty string.
    #[inline]
    pub fn last_content(&self) -> &str {
        self.log.last().map(Turn::content).unwrap_or_default()
    }
}
