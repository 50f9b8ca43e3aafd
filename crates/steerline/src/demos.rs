//! Demo scenarios showing the hooks at work.
//!
//! Every demo builds its own agent around a clone of the given provider,
//! runs one or more conversations and hands the results to a
//! [`Reporter`]. The demos don't print anything themselves.

use std::error::Error;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde_json::json;
use steerline_core::conversation::{AgentState, ConversationLog};
use steerline_core::hook::{RunContext, ToolErrorTranslator};
use steerline_core::{Agent, AgentBuilder, AgentError};
use steerline_model::{ModelProvider, Turn};

use crate::formats::ContactInfo;
use crate::policies::{ConversationLengthModel, PreferenceLogger, RolePrompt};
use crate::tools::{
    CheckInventoryTool, DivideTool, RecommendationTool, SearchProductsTool,
    SearchTool, WeatherTool,
};

/// The system prompt used by the system prompt demo.
pub const CONCISE_PROMPT: &str = "You are a helpful assistant. Answer \
                                  concisely and accurately, without adding \
                                  unnecessary information.";

/// Receives the progress and results of demos.
pub trait Reporter {
    /// A demo starts.
    fn begin(&mut self, demo: Demo);

    /// A conversation was sent to the agent and the reply is pending.
    fn waiting(&mut self, label: &str);

    /// A conversation finished with `state`.
    fn finished(&mut self, label: &str, state: &AgentState);

    /// A streamed run produced a new snapshot.
    fn snapshot(&mut self, state: &AgentState);
}

/// The available demos.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Demo {
    /// A plain invocation with a search tool.
    Invoke,
    /// A fixed system prompt.
    SystemPrompt,
    /// Two tools the model picks between.
    Tools,
    /// Several reason-act cycles in one run.
    React,
    /// The model chosen by conversation length.
    DynamicModel,
    /// The system prompt chosen by the user's role.
    DynamicPrompt,
    /// Tool failures turned into tool turns.
    ToolErrors,
    /// Extra state fields read by a hook.
    CustomState,
    /// Snapshots streamed while the agent works.
    Stream,
    /// An answer in a fixed structure.
    StructuredOutput,
}

impl Demo {
    /// All demos, in the order `all` runs them.
    pub const ALL: [Demo; 10] = [
        Demo::Invoke,
        Demo::SystemPrompt,
        Demo::Tools,
        Demo::React,
        Demo::DynamicModel,
        Demo::DynamicPrompt,
        Demo::ToolErrors,
        Demo::CustomState,
        Demo::Stream,
        Demo::StructuredOutput,
    ];

    /// Returns the command line name of the demo.
    pub fn name(&self) -> &'static str {
        match self {
            Demo::Invoke => "invoke",
            Demo::SystemPrompt => "system-prompt",
            Demo::Tools => "tools",
            Demo::React => "react",
            Demo::DynamicModel => "dynamic-model",
            Demo::DynamicPrompt => "dynamic-prompt",
            Demo::ToolErrors => "tool-errors",
            Demo::CustomState => "custom-state",
            Demo::Stream => "stream",
            Demo::StructuredOutput => "structured-output",
        }
    }

    /// Returns a one-line description of the demo.
    pub fn description(&self) -> &'static str {
        match self {
            Demo::Invoke => "invoke an agent with a search tool",
            Demo::SystemPrompt => "answer under a fixed system prompt",
            Demo::Tools => "let the model pick between two tools",
            Demo::React => "chain several tool calls to reach an answer",
            Demo::DynamicModel => "switch models as the conversation grows",
            Demo::DynamicPrompt => "adapt the system prompt to the user",
            Demo::ToolErrors => "recover from a failing tool",
            Demo::CustomState => "carry user preferences in the state",
            Demo::Stream => "stream state snapshots while working",
            Demo::StructuredOutput => "extract contact details as a record",
        }
    }

    /// Resolves a command line selection, where `all` selects every demo.
    pub fn select(name: &str) -> Result<Vec<Demo>, UnknownDemo> {
        if name == "all" {
            return Ok(Demo::ALL.to_vec());
        }
        name.parse().map(|demo| vec![demo])
    }

    /// Runs the demo against `provider`.
    pub async fn run<P, R>(
        self,
        provider: P,
        reporter: &mut R,
    ) -> Result<(), AgentError>
    where
        P: ModelProvider + Clone + 'static,
        R: Reporter,
    {
        reporter.begin(self);
        match self {
            Demo::Invoke => invoke(provider, reporter).await,
            Demo::SystemPrompt => system_prompt(provider, reporter).await,
            Demo::Tools => tools(provider, reporter).await,
            Demo::React => react(provider, reporter).await,
            Demo::DynamicModel => dynamic_model(provider, reporter).await,
            Demo::DynamicPrompt => dynamic_prompt(provider, reporter).await,
            Demo::ToolErrors => tool_errors(provider, reporter).await,
            Demo::CustomState => custom_state(provider, reporter).await,
            Demo::Stream => stream(provider, reporter).await,
            Demo::StructuredOutput => {
                structured_output(provider, reporter).await
            }
        }
    }
}

impl Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Demo {
    type Err = UnknownDemo;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Demo::ALL
            .into_iter()
            .find(|demo| demo.name() == s)
            .ok_or_else(|| UnknownDemo(s.to_owned()))
    }
}

/// The error returned when a demo name isn't recognized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownDemo(pub String);

impl Display for UnknownDemo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown demo `{}`", self.0)
    }
}

impl Error for UnknownDemo {}

async fn ask<R: Reporter>(
    agent: &Agent,
    reporter: &mut R,
    label: &str,
    state: AgentState,
    context: RunContext,
) -> Result<AgentState, AgentError> {
    reporter.waiting(label);
    let state = agent.invoke(state, context).await?;
    reporter.finished(label, &state);
    Ok(state)
}

async fn ask_all<R: Reporter>(
    agent: &Agent,
    reporter: &mut R,
    questions: &[(&str, &str)],
) -> Result<(), AgentError> {
    for (label, question) in questions {
        let state = AgentState::from_user_input(*question);
        ask(agent, reporter, label, state, RunContext::none()).await?;
    }
    Ok(())
}

async fn invoke<P, R>(provider: P, reporter: &mut R) -> Result<(), AgentError>
where
    P: ModelProvider + 'static,
    R: Reporter,
{
    let agent = AgentBuilder::with_model_provider(provider)
        .with_tool(SearchTool::new())
        .build();
    ask_all(&agent, reporter, &[(
        "Basic invocation",
        "What's the weather like in San Francisco?",
    )])
    .await
}

async fn system_prompt<P, R>(
    provider: P,
    reporter: &mut R,
) -> Result<(), AgentError>
where
    P: ModelProvider + 'static,
    R: Reporter,
{
    let agent = AgentBuilder::with_model_provider(provider)
        .with_system_prompt(CONCISE_PROMPT)
        .build();
    ask_all(&agent, reporter, &[
        ("Concept question", "What is an AI agent? Explain in detail."),
        (
            "How-to question",
            "How do I write a simple function in Python?",
        ),
    ])
    .await
}

async fn tools<P, R>(provider: P, reporter: &mut R) -> Result<(), AgentError>
where
    P: ModelProvider + 'static,
    R: Reporter,
{
    let agent = AgentBuilder::with_model_provider(provider)
        .with_tool(SearchTool::new())
        .with_tool(WeatherTool::new())
        .build();
    ask_all(&agent, reporter, &[
        ("Weather lookup", "What's the weather like in Beijing?"),
        ("Web search", "Where were the 2024 Olympics held?"),
    ])
    .await
}

async fn react<P, R>(provider: P, reporter: &mut R) -> Result<(), AgentError>
where
    P: ModelProvider + 'static,
    R: Reporter,
{
    let agent = AgentBuilder::with_model_provider(provider)
        .with_tool(SearchProductsTool::new())
        .with_tool(CheckInventoryTool::new())
        .build();
    ask_all(&agent, reporter, &[
        (
            "Search, then check",
            "Find the most popular wireless headphones right now and check \
             their stock.",
        ),
        ("Direct check", "Check the stock of WH-1000XM5."),
    ])
    .await
}

async fn dynamic_model<P, R>(
    provider: P,
    reporter: &mut R,
) -> Result<(), AgentError>
where
    P: ModelProvider + 'static,
    R: Reporter,
{
    let policy = ConversationLengthModel::default();
    let agent = AgentBuilder::with_model_provider(provider)
        .with_request_shaper(policy)
        .build();

    let state = AgentState::from_user_input("Hi, introduce yourself.");
    ask(&agent, reporter, "Short conversation", state, RunContext::none())
        .await?;

    let turns = (1..=15).map(|i| {
        Turn::user(format!("This is message number {i}, say something."))
    });
    // User turns never break integrity.
    let log = ConversationLog::from_turns(turns).map_err(AgentError::from)?;
    let state = AgentState::new(log);
    ask(&agent, reporter, "Long conversation", state, RunContext::none())
        .await?;
    Ok(())
}

async fn dynamic_prompt<P, R>(
    provider: P,
    reporter: &mut R,
) -> Result<(), AgentError>
where
    P: ModelProvider + 'static,
    R: Reporter,
{
    let agent = AgentBuilder::with_model_provider(provider)
        .with_request_shaper(RolePrompt::default())
        .build();
    let question = "Explain how machine learning works.";
    for (label, context) in [
        ("Expert", RunContext::new(json!({ "user_role": "expert" }))),
        ("Beginner", RunContext::new(json!({ "user_role": "beginner" }))),
        ("No role", RunContext::none()),
    ] {
        let state = AgentState::from_user_input(question);
        ask(&agent, reporter, label, state, context).await?;
    }
    Ok(())
}

async fn tool_errors<P, R>(
    provider: P,
    reporter: &mut R,
) -> Result<(), AgentError>
where
    P: ModelProvider + 'static,
    R: Reporter,
{
    let agent = AgentBuilder::with_model_provider(provider)
        .with_tool(DivideTool::new())
        .with_tool_hook(ToolErrorTranslator::new())
        .build();
    ask_all(&agent, reporter, &[
        ("Division by zero", "Compute 10 divided by 0."),
        ("Regular division", "Compute 10 divided by 2."),
    ])
    .await
}

async fn custom_state<P, R>(
    provider: P,
    reporter: &mut R,
) -> Result<(), AgentError>
where
    P: ModelProvider + 'static,
    R: Reporter,
{
    let agent = AgentBuilder::with_model_provider(provider)
        .with_tool(RecommendationTool::new())
        .with_request_shaper(PreferenceLogger::default())
        .build();
    let state = AgentState::from_user_input("Recommend some movies.")
        .with_extension(
            PreferenceLogger::DEFAULT_FIELD,
            json!({ "style": "technical", "verbosity": "detailed" }),
        );
    ask(&agent, reporter, "With preferences", state, RunContext::none())
        .await?;
    Ok(())
}

async fn stream<P, R>(provider: P, reporter: &mut R) -> Result<(), AgentError>
where
    P: ModelProvider + 'static,
    R: Reporter,
{
    let agent = AgentBuilder::with_model_provider(provider)
        .with_tool(SearchTool::new())
        .build();
    let state = AgentState::from_user_input(
        "Search for the latest progress in AI and summarize the findings.",
    );
    reporter.waiting("Streaming");
    let mut run = agent.stream(state, RunContext::none());
    while let Some(snapshot) = run.next_snapshot().await {
        reporter.snapshot(&snapshot?);
    }
    reporter.finished("Streaming", run.state());
    Ok(())
}

async fn structured_output<P, R>(
    provider: P,
    reporter: &mut R,
) -> Result<(), AgentError>
where
    P: ModelProvider + 'static,
    R: Reporter,
{
    let agent = AgentBuilder::with_model_provider(provider)
        .with_tool(SearchTool::new())
        .with_response_format(ContactInfo::response_format())
        .build();
    ask_all(&agent, reporter, &[(
        "Contact extraction",
        "Extract the contact information from: John Doe, john@example.com, \
         (555) 123-4567",
    )])
    .await
}
