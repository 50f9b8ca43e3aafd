use serde_json::Value;
use steerline_core::hook::{RequestShaper, RunContext, StepContext};
use steerline_model::ModelRequest;

/// The audience a reply is written for, read from the `user_role` entry
/// of the run context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UserRole {
    /// Wants detailed, technical answers.
    Expert,
    /// Wants plain explanations.
    Beginner,
    /// Anyone else, including an absent or unreadable role.
    Default,
}

impl UserRole {
    /// The context entry holding the role.
    pub const CONTEXT_KEY: &str = "user_role";

    /// Reads the role from a run context.
    pub fn from_context(context: &RunContext) -> Self {
        match context.get(Self::CONTEXT_KEY) {
            Some(Value::String(role)) => match role.as_str() {
                "expert" => UserRole::Expert,
                "beginner" => UserRole::Beginner,
                _ => UserRole::Default,
            },
            Some(other) => {
                debug!("ignoring malformed user role: {other}");
                UserRole::Default
            }
            None => UserRole::Default,
        }
    }
}

/// Tailors the system prompt to the role of the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RolePrompt {
    base: String,
    expert: String,
    beginner: String,
}

impl RolePrompt {
    /// The prompt used when no role applies.
    pub const DEFAULT_BASE: &str = "You are a helpful assistant.";

    /// Creates a policy with custom prompts.
    #[inline]
    pub fn new<S1, S2, S3>(base: S1, expert: S2, beginner: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            base: base.into(),
            expert: expert.into(),
            beginner: beginner.into(),
        }
    }

    /// Returns the prompt for `role`.
    #[inline]
    pub fn prompt_for(&self, role: UserRole) -> &str {
        match role {
            UserRole::Expert => &self.expert,
            UserRole::Beginner => &self.beginner,
            UserRole::Default => &self.base,
        }
    }
}

impl Default for RolePrompt {
    fn default() -> Self {
        let base = Self::DEFAULT_BASE;
        Self::new(
            base,
            format!(
                "{base} Provide detailed technical responses, with in-depth \
                 explanations and precise terminology."
            ),
            format!(
                "{base} Explain concepts simply, avoid jargon and use plain \
                 language."
            ),
        )
    }
}

impl RequestShaper for RolePrompt {
    fn name(&self) -> &str {
        "role prompt"
    }

    fn shape(&self, step: StepContext<'_>, request: &mut ModelRequest) {
        let role = UserRole::from_context(step.context());
        debug!("shaping the system prompt for {role:?}");
        request.system_prompt = Some(self.prompt_for(role).to_owned());
    }
}
