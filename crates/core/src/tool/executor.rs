use std::sync::Arc;

use steerline_model::{ModelTool, ToolCallRequest};
use tracing::Instrument;

use crate::tool::{Error, SharedTool, ToolResult};

/// An executor that runs tool call requests from the model.
pub struct Executor {
    tools: Vec<SharedTool>,
}

impl Executor {
    /// Creates an executor. Tools are offered to the model in the given
    /// order; a later tool with a duplicated name replaces the earlier one.
    pub fn with_tools(tools: Vec<SharedTool>) -> Self {
        let mut deduped: Vec<SharedTool> = Vec::with_capacity(tools.len());
        for tool in tools {
            match deduped.iter_mut().find(|t| t.name() == tool.name()) {
                Some(slot) => {
                    warn!("tool `{}` registered twice, replacing", tool.name());
                    *slot = tool;
                }
                None => deduped.push(tool),
            }
        }
        Self { tools: deduped }
    }

    #[inline]
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    /// Runs a single tool call to completion.
    ///
    /// Decoding the arguments and running the tool both happen on a
    /// spawned task, so a panicking tool surfaces as an execution error
    /// instead of unwinding through the agent loop.
    pub async fn execute(&self, req: &ToolCallRequest) -> ToolResult {
        let Some(tool) = self.tools.iter().find(|t| t.name() == req.name)
        else {
            warn!("tool not found: {}", req.name);
            return Err(Error::not_found()
                .with_reason(format!("no tool named `{}`", req.name)));
        };

        trace!("running a tool ({}) with args: {:?}", req.id, req.arguments);
        let fut = Arc::clone(tool)
            .call(req.arguments.clone())
            .instrument(debug_span!("tool execute", name = %req.name));
        match tokio::spawn(fut).await {
            Ok(result) => result,
            Err(err) if err.is_panic() => {
                error!("tool `{}` panicked", req.name);
                Err(Error::execution_error().with_reason("the tool panicked"))
            }
            Err(_) => Err(Error::execution_error()
                .with_reason("the tool was cancelled")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;

    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::tool::{ErrorKind, Tool, Typed};

    static EMPTY_SCHEMA: &Value = &Value::Null;

    #[derive(Deserialize)]
    struct HalveInput {
        value: i64,
    }

    struct HalveTool;

    impl Tool for HalveTool {
        type Input = HalveInput;

        fn name(&self) -> &str {
            "halve"
        }

        fn description(&self) -> &str {
            "Halves an even number"
        }

        fn parameter_schema(&self) -> &Value {
            EMPTY_SCHEMA
        }

        fn execute(
            &self,
            input: Self::Input,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            let result = if input.value % 2 == 0 {
                Ok(format!("{}", input.value / 2))
            } else {
                Err(Error::execution_error().with_reason("odd number"))
            };
            ready(result)
        }
    }

    struct PanickingTool;

    impl Tool for PanickingTool {
        type Input = Value;

        fn name(&self) -> &str {
            "panicking"
        }

        fn description(&self) -> &str {
            "Always panics"
        }

        fn parameter_schema(&self) -> &Value {
            EMPTY_SCHEMA
        }

        #[allow(clippy::manual_async_fn)]
        fn execute(
            &self,
            _input: Self::Input,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            async { panic!("boom") }
        }
    }

    struct EagerPanickingTool;

    impl Tool for EagerPanickingTool {
        type Input = Value;

        fn name(&self) -> &str {
            "eager_panicking"
        }

        fn description(&self) -> &str {
            "Panics before returning a future"
        }

        fn parameter_schema(&self) -> &Value {
            EMPTY_SCHEMA
        }

        fn execute(
            &self,
            input: Self::Input,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            let divisor = input["divisor"].as_i64().unwrap_or_default();
            ready(Ok(format!("{}", 100 / divisor)))
        }
    }

    fn request(name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest {
            id: "call:1".to_owned(),
            name: name.to_owned(),
            arguments,
        }
    }

    fn executor() -> Executor {
        Executor::with_tools(vec![
            Typed::shared(HalveTool),
            Typed::shared(PanickingTool),
            Typed::shared(EagerPanickingTool),
        ])
    }

    #[tokio::test]
    async fn test_execute() {
        let executor = executor();
        let result =
            executor.execute(&request("halve", json!({ "value": 8 }))).await;
        assert_eq!(result.unwrap(), "4");

        let err = executor
            .execute(&request("halve", json!({ "value": 3 })))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
        assert_eq!(err.reason(), "odd number");
    }

    #[tokio::test]
    async fn test_faults() {
        let executor = executor();

        let err = executor
            .execute(&request("halve", json!({ "value": "eight" })))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = executor
            .execute(&request("read_file", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        for name in ["panicking", "eager_panicking"] {
            let err = executor
                .execute(&request(name, json!({ "divisor": 0 })))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ExecutionError);
            assert_eq!(err.reason(), "the tool panicked");
        }
    }

    #[test]
    fn test_definitions_keep_order() {
        let names: Vec<_> = executor()
            .definitions()
            .into_iter()
            .map(|def| def.name)
            .collect();
        assert_eq!(names, ["halve", "panicking", "eager_panicking"]);
    }
}
