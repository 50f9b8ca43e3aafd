use serde_json::json;
use steerline::core::conversation::AgentState;
use steerline::demos::{Demo, Reporter};
use steerline::formats::ContactInfo;
use steerline::policies::RolePrompt;
use steerline_core::hook::ToolErrorTranslator;
use steerline_model::{Role, ToolCallRequest};
use steerline_test_model::{PresetEvent, PresetResponse, TestModelProvider};

#[derive(Default)]
struct RecordingReporter {
    demos: Vec<Demo>,
    finished: Vec<(String, AgentState)>,
    snapshots: Vec<AgentState>,
}

impl Reporter for RecordingReporter {
    fn begin(&mut self, demo: Demo) {
        self.demos.push(demo);
    }

    fn waiting(&mut self, _label: &str) {}

    fn finished(&mut self, label: &str, state: &AgentState) {
        self.finished.push((label.to_owned(), state.clone()));
    }

    fn snapshot(&mut self, state: &AgentState) {
        self.snapshots.push(state.clone());
    }
}

fn call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCallRequest {
    ToolCallRequest {
        id: id.to_owned(),
        name: name.to_owned(),
        arguments,
    }
}

/// Scripts one tool call followed by a final answer.
fn tool_round_provider(call: ToolCallRequest, answer: &str) -> TestModelProvider {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::tool_call(call));
    model_provider.add_tool_result_step();
    model_provider.add_assistant_response_step(PresetResponse::text(answer));
    model_provider
}

#[test]
fn test_select() {
    assert_eq!(Demo::select("all").unwrap().len(), 10);
    assert_eq!(Demo::select("tool-errors").unwrap(), [Demo::ToolErrors]);
    for demo in Demo::ALL {
        assert_eq!(demo.name().parse::<Demo>().unwrap(), demo);
    }
    let err = Demo::select("middleware").unwrap_err();
    assert_eq!(err.to_string(), "unknown demo `middleware`");
}

#[tokio::test]
async fn test_tool_errors_demo() {
    let model_provider = tool_round_provider(
        call("call_0", "divide", json!({ "a": 10, "b": 0 })),
        "Dividing by zero isn't possible.",
    );
    let mut reporter = RecordingReporter::default();
    Demo::ToolErrors
        .run(model_provider.clone(), &mut reporter)
        .await
        .unwrap();

    assert_eq!(reporter.demos, [Demo::ToolErrors]);
    assert_eq!(reporter.finished.len(), 2);
    for (_, state) in &reporter.finished {
        let turns = state.log().turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[2].role(), Role::Tool);
        assert_eq!(turns[2].tool_call_id(), Some("call_0"));
        assert!(
            turns[2]
                .content()
                .starts_with(ToolErrorTranslator::DEFAULT_PREFIX)
        );
        assert!(turns[2].content().contains("division by zero"));
        assert_eq!(turns[3].role(), Role::Assistant);
        assert!(state.log().pending_tool_calls().is_empty());
    }
}

#[tokio::test]
async fn test_tool_errors_demo_recovers_from_bad_arguments() {
    let model_provider = tool_round_provider(
        call("call_0", "divide", json!({ "a": "ten", "b": 2 })),
        "Please give me numbers.",
    );
    let mut reporter = RecordingReporter::default();
    Demo::ToolErrors
        .run(model_provider, &mut reporter)
        .await
        .unwrap();

    let (_, state) = &reporter.finished[0];
    let tool_turn = &state.log().turns()[2];
    assert!(tool_turn.content().contains("Invalid input"));
    assert_eq!(state.last_content(), "Please give me numbers.");
}

#[tokio::test]
async fn test_dynamic_model_demo() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::text("Hi!"));
    model_provider.add_user_input_steps(13);
    model_provider.add_assistant_response_step(PresetResponse::text("Sure."));

    let mut reporter = RecordingReporter::default();
    Demo::DynamicModel
        .run(model_provider.clone(), &mut reporter)
        .await
        .unwrap();

    let models = model_provider
        .recorded_requests()
        .into_iter()
        .map(|req| req.model)
        .collect::<Vec<_>>();
    assert_eq!(models, [
        Some("deepseek-chat".to_owned()),
        Some("deepseek-reasoner".to_owned())
    ]);
    assert_eq!(reporter.finished[1].1.log().len(), 16);
}

#[tokio::test]
async fn test_dynamic_prompt_demo() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::text("OK"));

    let mut reporter = RecordingReporter::default();
    Demo::DynamicPrompt
        .run(model_provider.clone(), &mut reporter)
        .await
        .unwrap();

    let prompts = model_provider
        .recorded_requests()
        .into_iter()
        .map(|req| req.system_prompt.unwrap())
        .collect::<Vec<_>>();
    assert_eq!(prompts.len(), 3);
    assert_ne!(prompts[0], prompts[1]);
    assert_ne!(prompts[1], prompts[2]);
    assert_ne!(prompts[0], prompts[2]);
    assert_eq!(prompts[2], RolePrompt::DEFAULT_BASE);
}

#[tokio::test]
async fn test_custom_state_demo() {
    let model_provider = tool_round_provider(
        call("call_0", "get_recommendation", json!({ "topic": "movies" })),
        "Here are some movies.",
    );
    let mut reporter = RecordingReporter::default();
    Demo::CustomState
        .run(model_provider, &mut reporter)
        .await
        .unwrap();

    let (_, state) = &reporter.finished[0];
    assert_eq!(
        state.extension("user_preferences"),
        Some(&json!({ "style": "technical", "verbosity": "detailed" }))
    );
    assert!(state.log().turns()[2].content().contains("movies"));
}

#[tokio::test]
async fn test_stream_demo() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::with_events([
        PresetEvent::MessageDelta("Let me search.".to_owned()),
        PresetEvent::ToolCall(call(
            "call_0",
            "search",
            json!({ "query": "AI progress" }),
        )),
    ]));
    model_provider.add_tool_result_step();
    model_provider
        .add_assistant_response_step(PresetResponse::text("AI keeps moving."));

    let mut reporter = RecordingReporter::default();
    Demo::Stream.run(model_provider, &mut reporter).await.unwrap();

    let lengths = reporter
        .snapshots
        .iter()
        .map(|state| state.log().len())
        .collect::<Vec<_>>();
    assert_eq!(lengths, [1, 2, 3, 4]);
    assert_eq!(
        reporter.snapshots[2].last_content(),
        "Search results for AI progress: this is a mock result."
    );
    assert_eq!(reporter.finished[0].1, reporter.snapshots[3]);
}

#[tokio::test]
async fn test_react_demo() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::tool_call(
        call("call_0", "search_products", json!({ "query": "most popular" })),
    ));
    model_provider.add_tool_result_step();
    model_provider.add_assistant_response_step(PresetResponse::tool_call(
        call("call_1", "check_inventory", json!({ "product_id": "AirPods Pro 2" })),
    ));
    model_provider.add_tool_result_step();
    model_provider.add_assistant_response_step(PresetResponse::text(
        "AirPods Pro 2 is the most popular, 5 in stock.",
    ));

    let mut reporter = RecordingReporter::default();
    Demo::React.run(model_provider, &mut reporter).await.unwrap();

    for (_, state) in &reporter.finished {
        let turns = state.log().turns();
        assert_eq!(turns.len(), 6);
        assert_eq!(turns[4].content(), "Product AirPods Pro 2: 5 in stock");
    }
}

#[tokio::test]
async fn test_structured_output_demo() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::tool_call(
        call(
            "call_0",
            "ContactInfo",
            json!({
                "name": "John Doe",
                "email": "john@example.com",
                "phone": "(555) 123-4567"
            }),
        ),
    ));

    let mut reporter = RecordingReporter::default();
    Demo::StructuredOutput
        .run(model_provider.clone(), &mut reporter)
        .await
        .unwrap();

    let (label, state) = &reporter.finished[0];
    assert_eq!(label, "Contact extraction");
    let contact: ContactInfo =
        state.parse_structured_response().unwrap().unwrap();
    assert_eq!(contact, ContactInfo {
        name: "John Doe".to_owned(),
        email: "john@example.com".to_owned(),
        phone: "(555) 123-4567".to_owned(),
    });
    assert_eq!(state.log().len(), 3);
    assert_eq!(state.log().turns()[2].tool_call_id(), Some("call_0"));

    let requests = model_provider.recorded_requests();
    assert_eq!(requests.len(), 1);
    let offered = requests[0]
        .tools
        .iter()
        .map(|tool| tool.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(offered, ["search", "ContactInfo"]);
}
