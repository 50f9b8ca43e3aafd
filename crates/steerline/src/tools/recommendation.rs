use std::future::ready;

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use steerline_core::tool::{Tool, ToolResult};

/// Parameters of [`RecommendationTool`].
#[derive(Deserialize, JsonSchema)]
#[allow(missing_docs)]
pub struct RecommendationToolParameters {
    #[schemars(description = "What to recommend, e.g. books or movies.")]
    pub topic: String,
}

/// A tool giving canned recommendations.
pub struct RecommendationTool {
    parameter_schema: Value,
}

impl RecommendationTool {
    /// Creates a new recommendation tool.
    #[inline]
    pub fn new() -> Self {
        RecommendationTool {
            parameter_schema: schema_for!(RecommendationToolParameters)
                .to_value(),
        }
    }
}

impl Default for RecommendationTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for RecommendationTool {
    type Input = RecommendationToolParameters;

    fn name(&self) -> &str {
        "get_recommendation"
    }

    fn description(&self) -> &str {
        "Get recommendations on a topic."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: RecommendationToolParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok(format!(
            "Recommendations on {}: hand-picked content just for you.",
            input.topic
        )))
    }
}
