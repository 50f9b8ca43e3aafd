use std::future::ready;

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use steerline_core::tool::{Error as ToolError, Tool, ToolResult};

/// Parameters of [`DivideTool`].
#[derive(Deserialize, JsonSchema)]
#[allow(missing_docs)]
pub struct DivideToolParameters {
    #[schemars(description = "The dividend.")]
    pub a: i64,
    #[schemars(description = "The divisor.")]
    pub b: i64,
}

/// A tool dividing two integers. Fails on a zero divisor.
pub struct DivideTool {
    parameter_schema: Value,
}

impl DivideTool {
    /// Creates a new divide tool.
    #[inline]
    pub fn new() -> Self {
        DivideTool {
            parameter_schema: schema_for!(DivideToolParameters).to_value(),
        }
    }
}

impl Default for DivideTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for DivideTool {
    type Input = DivideToolParameters;

    fn name(&self) -> &str {
        "divide"
    }

    fn description(&self) -> &str {
        "Divide `a` by `b`."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: DivideToolParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let result = if input.b == 0 {
            Err(ToolError::execution_error().with_reason("division by zero"))
        } else {
            // Always report a decimal, `10 / 4` is `2.5`.
            Ok(format!("{:?}", input.a as f64 / input.b as f64))
        };
        ready(result)
    }
}
