use steerline_core::hook::{RequestShaper, StepContext};
use steerline_model::ModelRequest;

/// Picks a stronger model once a conversation grows long.
///
/// A log with more than `threshold` turns is sent to the `long` model,
/// anything else to the `short` one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationLengthModel {
    threshold: usize,
    short: String,
    long: String,
}

impl ConversationLengthModel {
    /// The default number of turns a short conversation may have.
    pub const DEFAULT_THRESHOLD: usize = 10;

    /// Creates a policy with custom alternatives.
    #[inline]
    pub fn new<S1, S2>(threshold: usize, short: S1, long: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            threshold,
            short: short.into(),
            long: long.into(),
        }
    }

    /// Returns the model for a conversation with `turns` turns.
    #[inline]
    pub fn select(&self, turns: usize) -> &str {
        if turns > self.threshold {
            &self.long
        } else {
            &self.short
        }
    }
}

impl Default for ConversationLengthModel {
    #[inline]
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD, "deepseek-chat", "deepseek-reasoner")
    }
}

impl RequestShaper for ConversationLengthModel {
    fn name(&self) -> &str {
        "conversation length model"
    }

    fn shape(&self, step: StepContext<'_>, request: &mut ModelRequest) {
        let turns = step.log().len();
        let model = self.select(turns);
        info!("conversation has {turns} turns, using `{model}`");
        request.model = Some(model.to_owned());
    }
}
