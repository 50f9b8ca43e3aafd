use serde_json::{Map, Value};
use steerline_model::{ModelTool, ToolCallRequest};

/// Asks the model to end a run with a structured answer.
///
/// The format is offered to the model as one more tool, whose name and
/// parameter schema describe the answer. Once the model calls it with
/// fitting arguments, the arguments become the structured response of the
/// state, the call is acknowledged with a tool turn and the run finishes
/// without asking the model again. Arguments that don't fit are answered
/// with a tool turn explaining the problem, and the model gets another
/// try.
///
/// Calls to the format are answered by the agent itself. They never reach
/// the tool hook, and the format shadows a registered tool of the same
/// name.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseFormat {
    name: String,
    description: String,
    schema: Value,
}

impl ResponseFormat {
    /// Creates a format named `name` whose answers follow the JSON schema
    /// `schema`.
    pub fn new<S: Into<String>>(name: S, schema: Value) -> Self {
        let name = name.into();
        let description = format!(
            "Gives the final answer as {name}. Call this exactly once, when \
             you are ready to answer."
        );
        Self {
            name,
            description,
            schema,
        }
    }

    /// Replaces the description shown to the model.
    #[inline]
    pub fn with_description<S: Into<String>>(
        mut self,
        description: S,
    ) -> Self {
        self.description = description.into();
        self
    }

    /// Returns the name the model calls the format by.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the schema of the answer.
    #[inline]
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub(crate) fn definition(&self) -> ModelTool {
        ModelTool {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.schema.clone(),
        }
    }

    /// Checks the arguments of a call against the top level of the schema.
    /// Returns the answer, or the text telling the model what is wrong.
    pub(crate) fn accept(
        &self,
        call: &ToolCallRequest,
    ) -> Result<Value, String> {
        let Some(answer) = call.arguments.as_object() else {
            return Err(format!(
                "Error: the answer must be a JSON object, got {}. Please call \
                 `{}` again.",
                call.arguments, self.name
            ));
        };
        let missing = self.missing_fields(answer);
        if !missing.is_empty() {
            return Err(format!(
                "Error: the answer is missing {}. Please call `{}` again.",
                missing.join(", "),
                self.name
            ));
        }
        Ok(call.arguments.clone())
    }

    /// Returns the acknowledgement of an accepted answer.
    pub(crate) fn acknowledgement(&self, answer: &Value) -> String {
        format!("Returning structured response: {answer}")
    }

    fn missing_fields(&self, answer: &Map<String, Value>) -> Vec<String> {
        let required = self.schema.get("required").and_then(Value::as_array);
        let Some(required) = required else {
            return vec![];
        };
        required
            .iter()
            .filter_map(Value::as_str)
            .filter(|field| !answer.contains_key(*field))
            .map(|field| format!("`{field}`"))
            .collect()
    }
}
