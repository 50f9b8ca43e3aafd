use std::sync::Arc;

use steerline_model::ModelProvider;

use super::{Agent, ResponseFormat};
use crate::hook::{ModelHook, RequestShaper, ShaperHook, ToolHook};
use crate::model_client::{ModelClient, TranscriptFn};
use crate::tool::{SharedTool, Tool, Typed};

/// [`Agent`] builder.
pub struct AgentBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) tools: Vec<SharedTool>,
    pub(crate) model_hooks: Vec<Arc<dyn ModelHook>>,
    pub(crate) tool_hook: Option<Arc<dyn ToolHook>>,
    pub(crate) model: Option<String>,
    pub(crate) system_prompt: Option<String>,
    pub(crate) response_format: Option<ResponseFormat>,
    pub(crate) max_steps: usize,
    pub(crate) on_transcript: Option<TranscriptFn>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            tools: vec![],
            model_hooks: vec![],
            tool_hook: None,
            model: None,
            system_prompt: None,
            response_format: None,
            max_steps: Agent::DEFAULT_MAX_STEPS,
            on_transcript: None,
        }
    }

    /// Selects the model used when no hook picks one. Without this, the
    /// provider's default model is used.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the system prompt used when no hook replaces it.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.push(Typed::shared(tool));
        self
    }

    /// Appends a model hook. Hooks registered earlier wrap the ones
    /// registered later.
    #[inline]
    pub fn with_model_hook<H: ModelHook>(mut self, hook: H) -> Self {
        self.model_hooks.push(Arc::new(hook));
        self
    }

    /// Appends a request shaper to the model hooks.
    #[inline]
    pub fn with_request_shaper<S: RequestShaper>(mut self, shaper: S) -> Self {
        self.model_hooks.push(Arc::new(ShaperHook(shaper)));
        self
    }

    /// Sets the tool hook, replacing any previous one.
    #[inline]
    pub fn with_tool_hook<H: ToolHook>(mut self, hook: H) -> Self {
        if let Some(previous) = &self.tool_hook {
            debug!("replacing tool hook `{}`", previous.name());
        }
        self.tool_hook = Some(Arc::new(hook));
        self
    }

    /// Asks the model to end every run with an answer in `format`.
    #[inline]
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    /// Limits how many times a single run may call the model.
    #[inline]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Attaches a callback receiving the model's text as it streams in.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_transcript = Some(Arc::new(on_transcript));
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent::from_builder(self)
    }
}
