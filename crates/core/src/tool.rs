//! Tools the model can call.

mod error;
mod executor;

use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use steerline_model::ModelTool;

pub use error::{Error, ErrorKind};
pub(crate) use executor::Executor;

/// The result of a tool call, i.e. the text handed back to the model.
pub type ToolResult = Result<String, Error>;

pub(crate) type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// A tool that can be called by the model.
///
/// The model is shown the name, the description and the parameter schema
/// of the tool. The JSON arguments it calls the tool with are decoded into
/// [`Tool::Input`] first; arguments that don't decode are refused as
/// invalid input and never reach [`Tool::execute`].
///
/// Failures are reported through [`ToolResult`]. They are not fatal to the
/// conversation on their own: a registered [`ToolHook`] decides whether they
/// become a regular tool turn or abort the run.
///
/// [`ToolHook`]: crate::hook::ToolHook
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// The returned future must not borrow `self`. This method and the
    /// future it returns both run on a task of their own, so a panic in
    /// either is reported as an execution error.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

/// A registered tool, shared with the tasks that run its calls.
pub(crate) type SharedTool = Arc<dyn ErasedTool>;

pub(crate) trait ErasedTool: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn definition(&self) -> ModelTool;

    /// Returns a future that decodes the arguments and runs the tool.
    /// Nothing happens until the future is polled.
    fn call(self: Arc<Self>, arguments: Value) -> ToolFuture;
}

/// Erases the input type of a [`Tool`].
pub(crate) struct Typed<T>(pub T);

impl<T: Tool> Typed<T> {
    #[inline]
    pub(crate) fn shared(tool: T) -> SharedTool {
        Arc::new(Self(tool))
    }
}

impl<T: Tool> ErasedTool for Typed<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    fn definition(&self) -> ModelTool {
        ModelTool {
            name: self.0.name().to_owned(),
            description: self.0.description().to_owned(),
            parameters: self.0.parameter_schema().clone(),
        }
    }

    fn call(self: Arc<Self>, arguments: Value) -> ToolFuture {
        Box::pin(async move {
            let input = decode::<T::Input>(self.0.name(), arguments)?;
            self.0.execute(input).await
        })
    }
}

fn decode<I: DeserializeOwned>(
    tool: &str,
    arguments: Value,
) -> Result<I, Error> {
    serde_json::from_value(arguments).map_err(|err| {
        Error::invalid_input()
            .with_reason(format!("bad arguments for `{tool}`: {err}"))
    })
}
