use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use serde_json::Value;
use steerline_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};

use crate::Error;
use crate::proto::{ChatCompletionChunk, ToolCall};
use crate::sse::Sse;

struct PartialState {
    sse: Sse,
    id: Option<String>,
    tool_calls: Vec<ToolCall>,
    // Tool calls are only emitted once the model finished the turn, since
    // their arguments arrive in pieces.
    pending_tool_call_idx: VecDeque<usize>,
    // This field will be cleared after the response returns the complete event.
    pending_finish_reason: Option<ModelFinishReason>,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct OpenAIResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl OpenAIResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            id: None,
            tool_calls: Default::default(),
            pending_tool_call_idx: Default::default(),
            pending_finish_reason: Default::default(),
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

fn parse_finish_reason(reason: &str) -> Result<ModelFinishReason, Error> {
    match reason {
        "tool_calls" => Ok(ModelFinishReason::ToolCalls),
        "length" => Ok(ModelFinishReason::Length),
        "content_filter" => Err(Error::new(
            "the response was blocked by the content filter",
            ErrorKind::Moderated,
        )),
        "insufficient_system_resource" => Err(Error::new(
            "the provider ran out of resources",
            ErrorKind::RateLimitExceeded,
        )),
        _ => Ok(ModelFinishReason::Stop),
    }
}

fn merge_tool_call(partial_state: &mut PartialState, tool_call: ToolCall) {
    let Some(partial_tool_call) = partial_state
        .tool_calls
        .iter_mut()
        .find(|t| t.index == tool_call.index)
    else {
        partial_state
            .pending_tool_call_idx
            .push_back(partial_state.tool_calls.len());
        partial_state.tool_calls.push(tool_call);
        return;
    };
    if let Some(id) = tool_call.id {
        partial_tool_call.id.get_or_insert_default().push_str(&id);
    }
    if let Some(ty) = tool_call.r#type {
        partial_tool_call.r#type.get_or_insert_default().push_str(&ty);
    }
    if let Some(function) = tool_call.function {
        match partial_tool_call.function {
            Some(ref mut partial_func) => {
                if let Some(name) = function.name {
                    partial_func.name.get_or_insert_default().push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    partial_func
                        .arguments
                        .get_or_insert_default()
                        .push_str(&arguments);
                }
            }
            None => partial_tool_call.function = Some(function),
        }
    }
}

fn finish_tool_call(tool_call: &ToolCall) -> Result<ToolCallRequest, Error> {
    // Results are matched to calls by id, a call without one can never be
    // answered.
    let Some(id) = tool_call.id.clone().filter(|id| !id.is_empty()) else {
        let index = tool_call.index.unwrap_or_default();
        return Err(Error::new(
            format!("tool call #{index} has no id"),
            ErrorKind::Other,
        ));
    };
    let function = tool_call.function.as_ref();
    let name = function.and_then(|f| f.name.clone()).unwrap_or_default();
    let raw_arguments = function
        .and_then(|f| f.arguments.as_deref())
        .unwrap_or_default();
    let arguments = if raw_arguments.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        // Malformed arguments are passed on as a string, the tool will
        // refuse them as invalid input.
        serde_json::from_str::<Value>(raw_arguments).unwrap_or_else(|err| {
            warn!("tool call `{id}` has malformed arguments: {err}");
            Value::String(raw_arguments.to_owned())
        })
    };
    Ok(ToolCallRequest {
        id,
        name,
        arguments,
    })
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<ModelResponseEvent>, PartialState), Error> {
    let mut message_delta = None;

    // Pending tool calls are drained before reading further.
    if partial_state.pending_finish_reason.is_none() {
        loop {
            let sse_event = match partial_state.sse.next_event().await {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(err) => {
                    return Err(Error::new(err.to_string(), ErrorKind::Other));
                }
            };
            trace!("got sse event: {sse_event}");
            if sse_event == "[DONE]" {
                break;
            }

            let mut chunk =
                serde_json::from_str::<ChatCompletionChunk>(&sse_event)
                    .map_err(|err| {
                        Error::new(format!("{err}"), ErrorKind::Other)
                    })?;
            if partial_state.id.get_or_insert_with(|| chunk.id.clone())
                != &chunk.id
            {
                return Err(Error::new("chunk id mismatch", ErrorKind::Other));
            };

            // The usage chunk has no choices.
            let Some(choice) = chunk.choices.pop() else {
                continue;
            };

            if let Some(content) = choice.delta.content {
                if !content.is_empty() {
                    message_delta = Some(content);
                }
            }
            for tool_call in choice.delta.tool_calls.into_iter().flatten() {
                merge_tool_call(&mut partial_state, tool_call);
            }
            if let Some(finish_reason) = choice.finish_reason {
                partial_state.pending_finish_reason =
                    Some(parse_finish_reason(&finish_reason)?);
                break;
            }

            if message_delta.is_some() {
                break;
            }
        }
    }

    // The order of events are important. Always emit message delta first, then
    // emit pending tool calls, and finally emit pending finish reason if any.

    if let Some(message_delta) = message_delta {
        return Ok((
            Some(ModelResponseEvent::MessageDelta(message_delta)),
            partial_state,
        ));
    }

    if let Some(idx) = partial_state.pending_tool_call_idx.pop_front() {
        let tool_call = finish_tool_call(&partial_state.tool_calls[idx])?;
        return Ok((Some(ModelResponseEvent::ToolCall(tool_call)), partial_state));
    }

    if let Some(finish_reason) = partial_state.pending_finish_reason.take() {
        return Ok((
            Some(ModelResponseEvent::Completed(finish_reason)),
            partial_state,
        ));
    }

    Ok((None, partial_state))
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use serde_json::json;
    use steerline_model::ModelProviderError;

    use super::*;

    const TOOL_CALL_STREAM: &[u8] = br#"data: {"id":"c1","choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}

data: {"id":"c1","choices":[{"index":0,"delta":{"content":"Let me "},"finish_reason":null}]}

data: {"id":"c1","choices":[{"index":0,"delta":{"content":"check."},"finish_reason":null}]}

data: {"id":"c1","choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_0","type":"function","function":{"name":"get_weather","arguments":""}}]},"finish_reason":null}]}

data: {"id":"c1","choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"location\":"}}]},"finish_reason":null}]}

data: {"id":"c1","choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"Shanghai\"}"}}]},"finish_reason":null}]}

data: {"id":"c1","choices":[{"index":0,"delta":{"tool_calls":[{"index":1,"id":"call_1","type":"function","function":{"name":"divide","arguments":"{\"a\": 1"}}]},"finish_reason":null}]}

data: {"id":"c1","choices":[{"index":0,"delta":{"content":null},"finish_reason":"tool_calls"}]}

data: {"id":"c1","choices":[],"usage":{"prompt_tokens":10,"completion_tokens":20,"total_tokens":30}}

data: [DONE]

"#;

    async fn collect_events(stream: &'static [u8]) -> Vec<ModelResponseEvent> {
        let sse = Sse::from_chunks([Bytes::from_static(stream)]);
        let mut resp = pin!(OpenAIResponse::from_sse(sse));
        let mut events = vec![];
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await.unwrap()
        {
            events.push(event);
        }
        events
    }

    async fn first_error(stream: &'static [u8]) -> Error {
        let sse = Sse::from_chunks([Bytes::from_static(stream)]);
        let mut resp = pin!(OpenAIResponse::from_sse(sse));
        loop {
            match poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("the stream ended without an error"),
                Err(err) => return err,
            }
        }
    }

    #[tokio::test]
    async fn test_tool_call_events() {
        let events = collect_events(TOOL_CALL_STREAM).await;
        assert_eq!(events, [
            ModelResponseEvent::MessageDelta("Let me ".to_owned()),
            ModelResponseEvent::MessageDelta("check.".to_owned()),
            ModelResponseEvent::ToolCall(ToolCallRequest {
                id: "call_0".to_owned(),
                name: "get_weather".to_owned(),
                arguments: json!({ "location": "Shanghai" }),
            }),
            ModelResponseEvent::ToolCall(ToolCallRequest {
                id: "call_1".to_owned(),
                name: "divide".to_owned(),
                arguments: json!("{\"a\": 1"),
            }),
            ModelResponseEvent::Completed(ModelFinishReason::ToolCalls),
        ]);
    }

    #[tokio::test]
    async fn test_finish_reasons() {
        const LENGTH: &[u8] = br#"data: {"id":"c2","choices":[{"index":0,"delta":{"content":"Once upon"},"finish_reason":"length"}]}

"#;
        let events = collect_events(LENGTH).await;
        assert_eq!(events, [
            ModelResponseEvent::MessageDelta("Once upon".to_owned()),
            ModelResponseEvent::Completed(ModelFinishReason::Length),
        ]);

        const FILTERED: &[u8] = br#"data: {"id":"c3","choices":[{"index":0,"delta":{"content":""},"finish_reason":"content_filter"}]}

"#;
        let err = first_error(FILTERED).await;
        assert_eq!(err.kind(), ErrorKind::Moderated);
    }

    #[tokio::test]
    async fn test_tool_call_without_id() {
        const MISSING_ID: &[u8] = br#"data: {"id":"c4","choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"type":"function","function":{"name":"search","arguments":"{}"}}]},"finish_reason":null}]}

data: {"id":"c4","choices":[{"index":0,"delta":{"tool_calls":[{"index":1,"type":"function","function":{"name":"search","arguments":"{}"}}]},"finish_reason":"tool_calls"}]}

data: [DONE]

"#;
        let err = first_error(MISSING_ID).await;
        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(err.message(), "tool call #0 has no id");
    }
}
