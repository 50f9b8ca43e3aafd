use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use steerline_model::{
    ModelFinishReason, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent, ToolCallRequest,
};
use tracing::Instrument;

pub(crate) type TranscriptFn = Arc<dyn Fn(&str) + Send + Sync>;
pub(crate) type SendRequestResult =
    Result<ModelReply, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, Option<TranscriptFn>) -> BoxedSendRequestFuture
        + Send + Sync
>;

/// A wrapper around a model provider that maintains an execution
/// environment for the provider and provides a type-erased interface
/// for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(
            move |req: ModelRequest,
                  on_transcript: Option<TranscriptFn>|
                  -> BoxedSendRequestFuture {
                let fut = provider.send_request(&req);
                let model =
                    req.effective_model(provider.default_model()).to_owned();
                Box::pin(
                    async move {
                        trace!("got a request: {:?}", req);
                        let resp_or_err = fut.await;
                        handle_response::<P>(model, resp_or_err, on_transcript)
                            .await
                    }
                    .instrument(trace_span!("model client req")),
                )
            },
        );
        Self { handler_fn }
    }

    /// Sends a request and returns the fully received response.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_transcript: Option<TranscriptFn>,
    ) -> SendRequestResult {
        (self.handler_fn)(req, on_transcript).await
    }
}

/// A completely received response from the model.
///
/// Replies can only be obtained by running a request through the model,
/// so a hook that returns one has necessarily delegated the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelReply {
    model: String,
    content: String,
    tool_calls: Vec<ToolCallRequest>,
    finish_reason: Option<ModelFinishReason>,
}

impl ModelReply {
    /// Returns the model that produced this reply.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the generated text.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the tool calls the model requested.
    #[inline]
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        &self.tool_calls
    }

    /// Returns the reason the model finished generating, if reported.
    #[inline]
    pub fn finish_reason(&self) -> Option<ModelFinishReason> {
        self.finish_reason
    }

    #[inline]
    pub(crate) fn into_parts(self) -> (String, Vec<ToolCallRequest>) {
        (self.content, self.tool_calls)
    }
}

async fn handle_response<P: ModelProvider + 'static>(
    model: String,
    resp_or_err: Result<P::Response, P::Error>,
    on_transcript: Option<TranscriptFn>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Box::new(err));
        }
    };

    let mut content = String::new();
    let mut tool_calls = Vec::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(event) => event,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(Box::new(err));
            }
        };

        let Some(event) = event else {
            break;
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                content.push_str(&delta);
                if let Some(on_transcript) = &on_transcript {
                    on_transcript(&delta);
                }
            }
            ModelResponseEvent::ToolCall(req) => {
                tool_calls.push(req);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(ModelReply {
        model,
        content,
        tool_calls,
        finish_reason,
    })
}
