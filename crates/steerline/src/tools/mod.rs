//! Mock tools used by the demos.
//!
//! All tools answer from hardcoded data, so the demos exercise the agent
//! loop without touching the network beyond the model itself.

mod divide;
mod products;
mod recommendation;
mod search;
mod weather;

pub use divide::{DivideTool, DivideToolParameters};
pub use products::{
    CheckInventoryParameters, CheckInventoryTool, SearchProductsParameters,
    SearchProductsTool,
};
pub use recommendation::{RecommendationTool, RecommendationToolParameters};
pub use search::{SearchTool, SearchToolParameters};
pub use weather::{WeatherTool, WeatherToolParameters};
