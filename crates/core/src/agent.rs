mod builder;
mod error;
mod response_format;
mod run;

use std::sync::Arc;

use steerline_model::ModelTool;
use tracing::Instrument;

use crate::conversation::AgentState;
use crate::hook::{ModelHook, RunContext, ToolHook};
use crate::model_client::{ModelClient, TranscriptFn};
use crate::tool::Executor as ToolExecutor;
pub use builder::AgentBuilder;
pub use error::AgentError;
pub use response_format::ResponseFormat;
pub use run::Run;
use run::Progress;

/// An agent that alternates between the model and its tools until the
/// model stops asking for tool calls.
///
/// The agent itself holds no conversation. Each run takes a state,
/// appends the turns it produces to its log and hands the state back, so
/// a single agent can serve any number of conversations.
pub struct Agent {
    model_client: ModelClient,
    tool_executor: ToolExecutor,
    model_hooks: Vec<Arc<dyn ModelHook>>,
    tool_hook: Option<Arc<dyn ToolHook>>,
    model: Option<String>,
    system_prompt: Option<String>,
    response_format: Option<ResponseFormat>,
    max_steps: usize,
    on_transcript: Option<TranscriptFn>,
}

impl Agent {
    /// The default number of model calls a single run may make.
    pub const DEFAULT_MAX_STEPS: usize = 25;

    /// Runs the agent until the model gives a final answer, and returns
    /// the resulting state.
    pub async fn invoke(
        &self,
        state: AgentState,
        context: RunContext,
    ) -> Result<AgentState, AgentError> {
        let mut run = self.stream(state, context);
        async {
            while !matches!(run.step().await?, Progress::Finished) {}
            Ok::<_, AgentError>(())
        }
        .instrument(info_span!("agent invoke"))
        .await?;
        Ok(run.into_state())
    }

    /// Starts a run that yields a snapshot of the state after every
    /// appended turn.
    #[inline]
    pub fn stream(&self, state: AgentState, context: RunContext) -> Run<'_> {
        Run::new(self, state, context)
    }

    /// Returns what the model is offered to call: the tools, then the
    /// response format.
    fn tool_definitions(&self) -> Vec<ModelTool> {
        let mut definitions = self.tool_executor.definitions();
        if let Some(format) = &self.response_format {
            definitions.retain(|tool| tool.name != format.name());
            definitions.push(format.definition());
        }
        definitions
    }

    #[inline]
    fn from_builder(builder: AgentBuilder) -> Self {
        let AgentBuilder {
            model_client,
            tools,
            model_hooks,
            tool_hook,
            model,
            system_prompt,
            response_format,
            max_steps,
            on_transcript,
        } = builder;

        Self {
            model_client,
            tool_executor: ToolExecutor::with_tools(tools),
            model_hooks,
            tool_hook,
            model,
            system_prompt,
            response_format,
            max_steps,
            on_transcript,
        }
    }
}
