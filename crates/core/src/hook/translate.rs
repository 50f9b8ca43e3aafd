use async_trait::async_trait;
use steerline_model::{ToolCallRequest, ToolCallResult};

use super::{ToolCallOutcome, ToolHook, ToolNext};
use crate::tool::Error;

/// A tool hook that turns every tool failure into a regular tool turn.
///
/// The model then sees a diagnostic instead of a result, and can correct
/// its input or explain the problem to the user. The conversation always
/// continues. The hook treats all tools alike and never looks at which
/// tool failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolErrorTranslator {
    prefix: String,
}

impl ToolErrorTranslator {
    /// The text put in front of the failure reason by default.
    pub const DEFAULT_PREFIX: &str =
        "Tool error: please check your input and try again.";

    /// Creates a translator with the default prefix.
    #[inline]
    pub fn new() -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX)
    }

    /// Creates a translator with a custom prefix.
    #[inline]
    pub fn with_prefix<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the diagnostic reported to the model for `err`.
    #[inline]
    pub fn diagnostic(&self, err: &Error) -> String {
        format!("{} ({err})", self.prefix)
    }
}

impl Default for ToolErrorTranslator {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHook for ToolErrorTranslator {
    fn name(&self) -> &str {
        "tool error translator"
    }

    async fn wrap_tool_call(
        &self,
        call: &ToolCallRequest,
        next: ToolNext<'_>,
    ) -> ToolCallOutcome {
        match next.run(call).await {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(call = %call.id, "caught a tool error: {err}");
                Ok(ToolCallResult {
                    id: call.id.clone(),
                    content: self.diagnostic(&err),
                })
            }
        }
    }
}
