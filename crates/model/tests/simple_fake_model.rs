use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use steerline_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent, Turn,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct EchoProviderError(ErrorKind);

impl Display for EchoProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for EchoProviderError {}

impl ModelProviderError for EchoProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Streams "<model> heard <last user input>" word by word.
#[derive(Debug)]
struct EchoResponse {
    words: VecDeque<String>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl EchoResponse {
    fn new(model: &str, input: &str) -> Self {
        let words = format!("{model} heard {input}")
            .split(' ')
            .map(ToString::to_string)
            .collect();
        Self { words, sleep: None }
    }
}

impl ModelResponse for EchoResponse {
    type Error = EchoProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            let Some(mut word) = this.words.pop_front() else {
                return Poll::Ready(Ok(None));
            };
            if !this.words.is_empty() {
                word.push(' ');
            }
            return Poll::Ready(Ok(Some(ModelResponseEvent::MessageDelta(
                word,
            ))));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_event(cx)
    }
}

struct EchoProvider;

impl ModelProvider for EchoProvider {
    type Error = EchoProviderError;
    type Response = EchoResponse;

    fn default_model(&self) -> &str {
        "echo-small"
    }

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let last_user_input = req.messages.iter().rev().find_map(|turn| {
            match turn {
                Turn::User { content } => Some(content.as_str()),
                _ => None,
            }
        });
        let result = match last_user_input {
            Some(input) => Ok(EchoResponse::new(
                req.effective_model(self.default_model()),
                input,
            )),
            None => Err(EchoProviderError(ErrorKind::Other)),
        };
        future::ready(result)
    }
}

async fn collect_text(mut resp: EchoResponse) -> String {
    use std::future::poll_fn;

    let mut text = String::new();
    loop {
        let event = poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx))
            .await
            .unwrap();
        match event {
            Some(ModelResponseEvent::MessageDelta(delta)) => {
                text.push_str(&delta);
            }
            Some(event) => unreachable!("unexpected event: {event:?}"),
            None => break,
        }
    }
    text
}

#[tokio::test]
async fn test_default_model() {
    let req = ModelRequest {
        messages: vec![Turn::user("Good morning")],
        ..Default::default()
    };
    let resp = EchoProvider.send_request(&req).await.unwrap();
    assert_eq!(collect_text(resp).await, "echo-small heard Good morning");
}

#[tokio::test]
async fn test_selected_model() {
    let req = ModelRequest {
        model: Some("echo-large".to_owned()),
        messages: vec![
            Turn::user("first"),
            Turn::assistant("ok"),
            Turn::user("second"),
        ],
        ..Default::default()
    };
    let resp = EchoProvider.send_request(&req).await.unwrap();
    assert_eq!(collect_text(resp).await, "echo-large heard second");
}

#[tokio::test]
async fn test_error() {
    let req = ModelRequest::default();
    let err = EchoProvider.send_request(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);
}
