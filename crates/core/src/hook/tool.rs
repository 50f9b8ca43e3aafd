use async_trait::async_trait;
use steerline_model::{ToolCallRequest, ToolCallResult};

use crate::tool::{Error, Executor};

/// The outcome of running a tool call through the hook.
pub type ToolCallOutcome = Result<ToolCallResult, Error>;

/// A hook that wraps every tool call.
///
/// Unlike model hooks, a tool hook may answer on behalf of the tool, for
/// example to turn a failure into a regular result. Whatever it returns
/// must answer `call`, i.e. carry the same id.
#[async_trait]
pub trait ToolHook: Send + Sync + 'static {
    /// Returns the name of the hook, used in diagnostics.
    fn name(&self) -> &str;

    /// Wraps a tool call.
    async fn wrap_tool_call(
        &self,
        call: &ToolCallRequest,
        next: ToolNext<'_>,
    ) -> ToolCallOutcome;
}

/// Runs the tool a call asks for.
pub struct ToolNext<'a> {
    executor: &'a Executor,
}

impl<'a> ToolNext<'a> {
    #[inline]
    pub(crate) fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    /// Executes the call and wraps its output as a result for the call.
    pub async fn run(self, call: &ToolCallRequest) -> ToolCallOutcome {
        let content = self.executor.execute(call).await?;
        Ok(ToolCallResult {
            id: call.id.clone(),
            content,
        })
    }
}
