use std::future::ready;

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use steerline_core::tool::{Tool, ToolResult};

/// Parameters of [`SearchTool`].
#[derive(Deserialize, JsonSchema)]
#[allow(missing_docs)]
pub struct SearchToolParameters {
    #[schemars(description = "The search query.")]
    pub query: String,
}

/// A tool pretending to search the web.
pub struct SearchTool {
    parameter_schema: Value,
}

impl SearchTool {
    /// Creates a new search tool.
    #[inline]
    pub fn new() -> Self {
        SearchTool {
            parameter_schema: schema_for!(SearchToolParameters).to_value(),
        }
    }
}

impl Default for SearchTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

fn search(query: &str) -> String {
    let lowered = query.to_lowercase();
    if !lowered.contains("weather") {
        return format!("Search results for {query}: this is a mock result.");
    }
    if lowered.contains("san francisco") {
        "San Francisco weather: sunny today, 18-22°C, humidity 65%, \
         wind 15 km/h."
            .to_owned()
    } else {
        format!(
            "Found weather information for {query}: please check the local \
             forecast."
        )
    }
}

impl Tool for SearchTool {
    type Input = SearchToolParameters;

    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search for information."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: SearchToolParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok(search(&input.query)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search() {
        let tool = SearchTool::new();

        let result = tool
            .execute(SearchToolParameters {
                query: "Weather in San Francisco".to_owned(),
            })
            .await
            .unwrap();
        assert!(result.starts_with("San Francisco weather"));

        let result = tool
            .execute(SearchToolParameters {
                query: "weather in Oslo".to_owned(),
            })
            .await
            .unwrap();
        assert!(result.contains("local forecast"));

        let result = tool
            .execute(SearchToolParameters {
                query: "latest AI news".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(
            result,
            "Search results for latest AI news: this is a mock result."
        );
    }

    #[test]
    fn test_schema() {
        let schema = SearchTool::new().parameter_schema().clone();
        assert_eq!(schema["properties"]["query"]["type"], "string");
        assert_eq!(schema["required"][0], "query");
    }
}
