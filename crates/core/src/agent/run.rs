use std::collections::VecDeque;

use steerline_model::{ModelRequest, ToolCallRequest, ToolCallResult, Turn};

use super::{Agent, AgentError};
use crate::conversation::{AgentState, IntegrityError};
use crate::hook::{ModelNext, RunContext, StepContext, ToolNext};

#[derive(Debug)]
enum Stage {
    Start,
    ModelThinking,
    RunningTools(VecDeque<ToolCallRequest>),
    Finished,
}

pub(super) enum Progress {
    Started,
    Appended,
    Finished,
}

/// A run in progress, driven one turn at a time.
///
/// Call [`Run::next_snapshot`] repeatedly until it returns `None`. The
/// first snapshot is the input state; every following one carries exactly
/// one more turn than the previous. An error ends the run.
pub struct Run<'a> {
    agent: &'a Agent,
    state: AgentState,
    context: RunContext,
    stage: Stage,
    model_calls: usize,
    // Set once the model gave an answer in the response format.
    answered: bool,
}

impl<'a> Run<'a> {
    #[inline]
    pub(super) fn new(
        agent: &'a Agent,
        state: AgentState,
        context: RunContext,
    ) -> Self {
        Self {
            agent,
            state,
            context,
            stage: Stage::Start,
            model_calls: 0,
            answered: false,
        }
    }

    /// Advances the run and returns a snapshot of the state, or `None`
    /// once the model has given its final answer.
    pub async fn next_snapshot(
        &mut self,
    ) -> Option<Result<AgentState, AgentError>> {
        match self.step().await {
            Ok(Progress::Started | Progress::Appended) => {
                Some(Ok(self.state.clone()))
            }
            Ok(Progress::Finished) => None,
            Err(err) => Some(Err(err)),
        }
    }

    /// Returns the state as it is now.
    #[inline]
    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Ends the run and returns the state as it is now.
    #[inline]
    pub fn into_state(self) -> AgentState {
        self.state
    }

    pub(super) async fn step(&mut self) -> Result<Progress, AgentError> {
        let result = match &mut self.stage {
            Stage::Start => self.start(),
            Stage::ModelThinking => self.call_model().await,
            Stage::RunningTools(calls) => match calls.pop_front() {
                Some(call) => self.call_tool(call).await,
                None => {
                    self.stage = Stage::ModelThinking;
                    self.call_model().await
                }
            },
            Stage::Finished => return Ok(Progress::Finished),
        };
        if let Err(err) = &result {
            warn!("run failed: {err}");
            self.stage = Stage::Finished;
        }
        result
    }

    fn start(&mut self) -> Result<Progress, AgentError> {
        if self.state.log().is_empty() {
            return Err(AgentError::EmptyConversation);
        }
        debug!(
            "starting a run with {} turns, context: {:?}",
            self.state.log().len(),
            self.context.as_value()
        );
        self.stage = Stage::ModelThinking;
        Ok(Progress::Started)
    }

    async fn call_model(&mut self) -> Result<Progress, AgentError> {
        let agent = self.agent;
        if self.model_calls >= agent.max_steps {
            return Err(AgentError::StepLimitExceeded(agent.max_steps));
        }
        self.model_calls += 1;

        let request = ModelRequest {
            model: agent.model.clone(),
            system_prompt: agent.system_prompt.clone(),
            messages: self.state.log().turns().to_vec(),
            tools: agent.tool_definitions(),
        };
        let step = StepContext::new(
            self.state.log(),
            &self.context,
            self.state.extensions(),
        );
        let next = ModelNext::new(
            step,
            &agent.model_hooks,
            &agent.model_client,
            agent.on_transcript.as_ref(),
        );
        let reply = next.run(request).await.map_err(AgentError::Model)?;
        debug!(
            "model `{}` replied with {} tool calls",
            reply.model(),
            reply.tool_calls().len()
        );

        let (content, tool_calls) = reply.into_parts();
        let calls = VecDeque::from(tool_calls.clone());
        self.state
            .log_mut()
            .push(Turn::Assistant { content, tool_calls })?;
        self.stage = if calls.is_empty() {
            Stage::Finished
        } else {
            Stage::RunningTools(calls)
        };
        Ok(Progress::Appended)
    }

    async fn call_tool(
        &mut self,
        call: ToolCallRequest,
    ) -> Result<Progress, AgentError> {
        let agent = self.agent;
        let turn = match &agent.response_format {
            Some(format) if format.name() == call.name => {
                match format.accept(&call) {
                    Ok(answer) => {
                        debug!("got a structured answer in `{}`", call.id);
                        let content = format.acknowledgement(&answer);
                        self.state.set_structured_response(answer);
                        self.answered = true;
                        Turn::tool(call.id, content)
                    }
                    Err(content) => {
                        warn!("rejected the structured answer `{}`", call.id);
                        Turn::tool(call.id, content)
                    }
                }
            }
            _ => Turn::Tool(self.run_tool(call).await?),
        };
        self.state.log_mut().push(turn)?;

        if let Stage::RunningTools(calls) = &self.stage {
            if calls.is_empty() {
                self.stage = if self.answered {
                    Stage::Finished
                } else {
                    Stage::ModelThinking
                };
            }
        }
        Ok(Progress::Appended)
    }

    async fn run_tool(
        &self,
        call: ToolCallRequest,
    ) -> Result<ToolCallResult, AgentError> {
        let agent = self.agent;
        let next = ToolNext::new(&agent.tool_executor);
        let outcome = match &agent.tool_hook {
            Some(hook) => {
                trace!("entering tool hook `{}`", hook.name());
                hook.wrap_tool_call(&call, next).await
            }
            None => next.run(&call).await,
        };

        let ToolCallRequest { id, name, .. } = call;
        let result = outcome.map_err(|error| AgentError::Tool {
            id: id.clone(),
            name,
            error,
        })?;
        if result.id != id {
            return Err(IntegrityError::MismatchedToolResult {
                expected: id,
                found: result.id,
            }
            .into());
        }
        Ok(result)
    }
}
