//! Hooks that wrap model and tool calls.
//!
//! Hooks form a chain of responsibility around the two kinds of steps the
//! agent takes. Model hooks are registered as an ordered list, and the
//! first registered hook is the outermost one: it sees the request first
//! and the reply last. Each hook receives a continuation (`ModelNext` or
//! `ToolNext`) that runs the rest of the chain. Continuations are consumed
//! when run, so a hook can delegate at most once.
//!
//! A hook only sees the conversation through a [`StepContext`], which
//! borrows the log immutably. Hooks can shape the next request but never
//! rewrite history.

mod model;
mod tool;
mod translate;

use serde_json::{Map, Value};

pub use model::{ModelHook, ModelNext, ModelResult, RequestShaper};
pub(crate) use model::ShaperHook;
pub use tool::{ToolCallOutcome, ToolHook, ToolNext};
pub use translate::ToolErrorTranslator;

use crate::conversation::ConversationLog;

/// Out-of-band data supplied by the caller of a run, such as the role of
/// the user talking to the agent.
///
/// The context is usually a JSON object. Anything else is kept as is, and
/// lookups into it simply find nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunContext(Value);

impl RunContext {
    /// Creates an empty context.
    #[inline]
    pub fn none() -> Self {
        Self(Value::Null)
    }

    /// Wraps a JSON value as a context.
    #[inline]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns `true` if no context was supplied.
    #[inline]
    pub fn is_absent(&self) -> bool {
        self.0.is_null()
    }

    /// Looks up a top-level entry.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the raw value.
    #[inline]
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for RunContext {
    #[inline]
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A read-only view of the conversation state for the step being taken.
#[derive(Clone, Copy, Debug)]
pub struct StepContext<'a> {
    log: &'a ConversationLog,
    context: &'a RunContext,
    extensions: &'a Map<String, Value>,
}

impl<'a> StepContext<'a> {
    /// Creates a view over borrowed state.
    #[inline]
    pub fn new(
        log: &'a ConversationLog,
        context: &'a RunContext,
        extensions: &'a Map<String, Value>,
    ) -> Self {
        Self {
            log,
            context,
            extensions,
        }
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn log(&self) -> &'a ConversationLog {
        self.log
    }

    /// Returns the caller-supplied context of this run.
    #[inline]
    pub fn context(&self) -> &'a RunContext {
        self.context
    }

    /// Returns an extension field of the state, if present.
    #[inline]
    pub fn extension(&self, name: &str) -> Option<&'a Value> {
        self.extensions.get(name)
    }

    /// Returns an extension field as a map. Missing fields and fields that
    /// aren't objects read as an empty map.
    pub fn extension_map(&self, name: &str) -> Map<String, Value> {
        self.extension(name)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_run_context_lookup() {
        let context = RunContext::new(json!({ "user_role": "expert" }));
        assert_eq!(context.get("user_role"), Some(&json!("expert")));
        assert_eq!(context.get("missing"), None);

        // Non-object contexts are kept but never match a key.
        let context = RunContext::from(json!("expert"));
        assert!(!context.is_absent());
        assert_eq!(context.get("user_role"), None);
        assert!(RunContext::none().is_absent());
    }

    #[test]
    fn test_extension_map() {
        let log = ConversationLog::new();
        let context = RunContext::none();
        let mut extensions = Map::new();
        extensions.insert("prefs".to_owned(), json!({ "style": "concise" }));
        extensions.insert("broken".to_owned(), json!([1, 2, 3]));
        let step = StepContext::new(&log, &context, &extensions);

        assert_eq!(step.extension_map("prefs").len(), 1);
        assert!(step.extension_map("broken").is_empty());
        assert!(step.extension_map("missing").is_empty());
    }
}
