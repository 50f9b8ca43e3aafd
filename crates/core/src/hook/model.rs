use std::sync::Arc;

use async_trait::async_trait;
use steerline_model::{ModelProviderError, ModelRequest};

use super::StepContext;
use crate::model_client::{ModelClient, ModelReply, TranscriptFn};

/// The outcome of running a model request through the chain.
pub type ModelResult = Result<ModelReply, Box<dyn ModelProviderError>>;

/// A hook that wraps every model call.
///
/// The hook receives the request the agent is about to send and the
/// continuation that sends it. A hook may rewrite the request before
/// running the continuation, and must return what the continuation
/// returns. Since [`ModelReply`] can only be produced by the model, a hook
/// has no way to answer without delegating.
///
/// Hooks must be pure with respect to their inputs: calling a hook twice
/// with the same step and request must shape the request the same way.
#[async_trait]
pub trait ModelHook: Send + Sync + 'static {
    /// Returns the name of the hook, used in diagnostics.
    fn name(&self) -> &str;

    /// Wraps a model call.
    async fn wrap_model_call(
        &self,
        step: StepContext<'_>,
        request: ModelRequest,
        next: ModelNext<'_>,
    ) -> ModelResult;
}

/// The rest of the model hook chain, ending at the model itself.
pub struct ModelNext<'a> {
    step: StepContext<'a>,
    hooks: &'a [Arc<dyn ModelHook>],
    client: &'a ModelClient,
    on_transcript: Option<&'a TranscriptFn>,
}

impl<'a> ModelNext<'a> {
    #[inline]
    pub(crate) fn new(
        step: StepContext<'a>,
        hooks: &'a [Arc<dyn ModelHook>],
        client: &'a ModelClient,
        on_transcript: Option<&'a TranscriptFn>,
    ) -> Self {
        Self {
            step,
            hooks,
            client,
            on_transcript,
        }
    }

    /// Runs the remaining hooks and then the model.
    pub async fn run(self, request: ModelRequest) -> ModelResult {
        let Some((hook, rest)) = self.hooks.split_first() else {
            return self
                .client
                .send_request(request, self.on_transcript.cloned())
                .await;
        };
        trace!("entering model hook `{}`", hook.name());
        let step = self.step;
        let next = ModelNext { hooks: rest, ..self };
        hook.wrap_model_call(step, request, next).await
    }
}

/// A model hook that only edits the request.
///
/// Shapers are the common case of [`ModelHook`]: they decide on a model or
/// a system prompt from the conversation state and always delegate, so
/// they cannot drop a turn by forgetting to call the continuation. The
/// decision must be total: a shaper that can't compute its input falls
/// back to a default instead of failing the request.
pub trait RequestShaper: Send + Sync + 'static {
    /// Returns the name of the shaper, used in diagnostics.
    fn name(&self) -> &str;

    /// Edits the request for the step about to be taken.
    fn shape(&self, step: StepContext<'_>, request: &mut ModelRequest);
}

pub(crate) struct ShaperHook<S: RequestShaper>(pub S);

#[async_trait]
impl<S: RequestShaper> ModelHook for ShaperHook<S> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn wrap_model_call(
        &self,
        step: StepContext<'_>,
        mut request: ModelRequest,
        next: ModelNext<'_>,
    ) -> ModelResult {
        self.0.shape(step, &mut request);
        next.run(request).await
    }
}
