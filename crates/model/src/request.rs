use serde_json::Value;

use crate::Turn;

/// A request to be sent to the model provider.
///
/// The orchestrator builds a fresh request for every model step, and the
/// registered hooks may edit it before it reaches the provider.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelRequest {
    /// The model to sample from. `None` selects the provider's default.
    pub model: Option<String>,
    /// The effective system instructions, if any.
    pub system_prompt: Option<String>,
    /// The conversation so far.
    pub messages: Vec<Turn>,
    /// Tools that are available to the model.
    pub tools: Vec<ModelTool>,
}

impl ModelRequest {
    /// Returns the model this request will be sampled from, given the
    /// provider's default.
    #[inline]
    pub fn effective_model<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default)
    }
}

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelTool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters definition of the tool.
    ///
    /// For most model providers, the parameters should typically be
    /// defined by a [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}
