use serde_json::{Map, Value};
use steerline_core::hook::{RequestShaper, StepContext};
use steerline_model::ModelRequest;

/// Reports the user's preferences before every model call. The request is
/// left as is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreferenceLogger {
    field: String,
}

impl PreferenceLogger {
    /// The state field read by default.
    pub const DEFAULT_FIELD: &str = "user_preferences";

    /// Creates a logger reading another state field.
    #[inline]
    pub fn with_field<S: Into<String>>(field: S) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Returns the preferences visible at `step`. A missing field reads as
    /// no preferences.
    #[inline]
    pub fn preferences(&self, step: StepContext<'_>) -> Map<String, Value> {
        step.extension_map(&self.field)
    }
}

impl Default for PreferenceLogger {
    #[inline]
    fn default() -> Self {
        Self::with_field(Self::DEFAULT_FIELD)
    }
}

impl RequestShaper for PreferenceLogger {
    fn name(&self) -> &str {
        "preference logger"
    }

    fn shape(&self, step: StepContext<'_>, _request: &mut ModelRequest) {
        let preferences = Value::Object(self.preferences(step));
        info!("user preferences: {preferences}");
    }
}
