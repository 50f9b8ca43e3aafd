use std::future::ready;

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use steerline_core::tool::{Tool, ToolResult};

/// Parameters of [`WeatherTool`].
#[derive(Deserialize, JsonSchema)]
#[allow(missing_docs)]
pub struct WeatherToolParameters {
    #[schemars(description = "The city or place to look up.")]
    pub location: String,
}

/// A tool reporting the same sunny weather everywhere.
pub struct WeatherTool {
    parameter_schema: Value,
}

impl WeatherTool {
    /// Creates a new weather tool.
    #[inline]
    pub fn new() -> Self {
        WeatherTool {
            parameter_schema: schema_for!(WeatherToolParameters).to_value(),
        }
    }
}

impl Default for WeatherTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for WeatherTool {
    type Input = WeatherToolParameters;

    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a location."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: WeatherToolParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok(format!("Weather in {}: sunny, 25°C", input.location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_weather() {
        let result = WeatherTool::new()
            .execute(WeatherToolParameters {
                location: "Shanghai".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(result, "Weather in Shanghai: sunny, 25°C");
    }
}
