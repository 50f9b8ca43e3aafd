use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::ToolCallRequest;

/// The author of a [`Turn`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation.
    User,
    /// The model.
    Assistant,
    /// A tool answering an assistant's call.
    Tool,
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// One entry in a conversation log.
///
/// The kind of a turn is decided when it's constructed, and each kind
/// only carries the fields that make sense for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Turn {
    /// A user input text.
    User {
        /// The text the user typed.
        content: String,
    },
    /// A model output, possibly requesting tool calls.
    Assistant {
        /// The text the model produced, may be empty.
        content: String,
        /// Tool calls requested by the model, in the order they were
        /// emitted.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },
    /// The result of a tool call.
    Tool(ToolCallResult),
}

impl Turn {
    /// Creates a user turn.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Turn::User {
            content: content.into(),
        }
    }

    /// Creates an assistant turn without tool calls.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Turn::Assistant {
            content: content.into(),
            tool_calls: vec![],
        }
    }

    /// Creates a tool turn answering the call `id`.
    #[inline]
    pub fn tool<S1: Into<String>, S2: Into<String>>(id: S1, content: S2) -> Self {
        Turn::Tool(ToolCallResult {
            id: id.into(),
            content: content.into(),
        })
    }

    /// Returns the author of this turn.
    #[inline]
    pub fn role(&self) -> Role {
        match self {
            Turn::User { .. } => Role::User,
            Turn::Assistant { .. } => Role::Assistant,
            Turn::Tool(_) => Role::Tool,
        }
    }

    /// Returns the text of this turn.
    #[inline]
    pub fn content(&self) -> &str {
        match self {
            Turn::User { content } | Turn::Assistant { content, .. } => {
                content
            }
            Turn::Tool(result) => &result.content,
        }
    }

    /// Returns the tool calls requested by this turn. Always empty for
    /// non-assistant turns.
    #[inline]
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match self {
            Turn::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// Returns the id of the call this turn answers, for tool turns.
    #[inline]
    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Turn::Tool(result) => Some(&result.id),
            _ => None,
        }
    }
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// The identifier of the tool call request this result answers.
    #[serde(rename = "tool_call_id")]
    pub id: String,
    /// The result of the tool call.
    pub content: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_accessors() {
        let turn = Turn::Assistant {
            content: String::new(),
            tool_calls: vec![ToolCallRequest {
                id: "call:1".to_owned(),
                name: "search".to_owned(),
                arguments: json!({ "query": "rust" }),
            }],
        };
        assert_eq!(turn.role(), Role::Assistant);
        assert_eq!(turn.content(), "");
        assert_eq!(turn.tool_calls().len(), 1);
        assert_eq!(turn.tool_call_id(), None);

        let turn = Turn::tool("call:1", "found it");
        assert_eq!(turn.role(), Role::Tool);
        assert_eq!(turn.tool_call_id(), Some("call:1"));
        assert!(turn.tool_calls().is_empty());
    }

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(Turn::tool("call:7", "42")).unwrap();
        assert_eq!(
            value,
            json!({ "role": "tool", "tool_call_id": "call:7", "content": "42" })
        );

        let turn: Turn =
            serde_json::from_value(json!({ "role": "user", "content": "hi" }))
                .unwrap();
        assert_eq!(turn, Turn::user("hi"));
    }
}
