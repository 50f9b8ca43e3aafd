use std::future::ready;

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use steerline_core::tool::{Tool, ToolResult};

const INVENTORY: &[(&str, u32)] = &[
    ("WH-1000XM5", 10),
    ("AirPods Pro 2", 5),
    ("Bose QuietComfort Ultra", 3),
    ("Sony WF-1000XM5", 8),
    ("Sennheiser Momentum True Wireless 4", 2),
];

/// Parameters of [`SearchProductsTool`].
#[derive(Deserialize, JsonSchema)]
#[allow(missing_docs)]
pub struct SearchProductsParameters {
    #[schemars(description = "Keywords describing the product.")]
    pub query: String,
}

/// A tool searching a small catalog of headphones.
pub struct SearchProductsTool {
    parameter_schema: Value,
}

impl SearchProductsTool {
    /// Creates a new product search tool.
    #[inline]
    pub fn new() -> Self {
        SearchProductsTool {
            parameter_schema: schema_for!(SearchProductsParameters).to_value(),
        }
    }
}

impl Default for SearchProductsTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

fn search_products(query: &str) -> String {
    let lowered = query.to_lowercase();
    let has_any =
        |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

    if has_any(&["wireless earbuds", "earbuds", "headphones", "bluetooth"]) {
        "Top wireless headphones:\n\
         1. WH-1000XM5 (Sony)\n\
         2. AirPods Pro 2 (Apple)\n\
         3. Bose QuietComfort Ultra\n\
         4. Sony WF-1000XM5\n\
         5. Sennheiser Momentum True Wireless 4"
            .to_owned()
    } else if has_any(&["airpods", "apple"]) {
        "Apple headphones: AirPods Pro 2 (2nd generation), active noise \
         cancellation, 6 hours of battery life"
            .to_owned()
    } else if has_any(&["sony"]) {
        "Sony headphones: WH-1000XM5 (over-ear), WF-1000XM5 (true wireless), \
         both with industry-leading noise cancellation"
            .to_owned()
    } else if has_any(&["most popular", "popular", "best"]) {
        "Most popular wireless headphones right now:\n\
         1. AirPods Pro 2 (Apple)\n\
         2. WH-1000XM5 (Sony)\n\
         3. Bose QuietComfort Ultra\n\
         4. Galaxy Buds2 Pro (Samsung)\n\
         5. Sony WF-1000XM5"
            .to_owned()
    } else {
        format!(
            "Search results for {query}: found 3 related products, please \
             use a more specific query"
        )
    }
}

impl Tool for SearchProductsTool {
    type Input = SearchProductsParameters;

    fn name(&self) -> &str {
        "search_products"
    }

    fn description(&self) -> &str {
        "Search the product catalog."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: SearchProductsParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok(search_products(&input.query)))
    }
}

/// Parameters of [`CheckInventoryTool`].
#[derive(Deserialize, JsonSchema)]
#[allow(missing_docs)]
pub struct CheckInventoryParameters {
    #[schemars(description = "The product id, e.g. `WH-1000XM5`.")]
    pub product_id: String,
}

/// A tool reporting the stock of a product.
pub struct CheckInventoryTool {
    parameter_schema: Value,
}

impl CheckInventoryTool {
    /// Creates a new inventory tool.
    #[inline]
    pub fn new() -> Self {
        CheckInventoryTool {
            parameter_schema: schema_for!(CheckInventoryParameters).to_value(),
        }
    }
}

impl Default for CheckInventoryTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for CheckInventoryTool {
    type Input = CheckInventoryParameters;

    fn name(&self) -> &str {
        "check_inventory"
    }

    fn description(&self) -> &str {
        "Check how many units of a product are in stock."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: CheckInventoryParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let count = INVENTORY
            .iter()
            .find(|(id, _)| *id == input.product_id)
            .map(|(_, count)| *count)
            .unwrap_or(0);
        ready(Ok(format!("Product {}: {count} in stock", input.product_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_products() {
        assert!(search_products("wireless headphones").contains("WH-1000XM5"));
        assert!(search_products("AirPods").starts_with("Apple headphones"));
        assert!(search_products("Sony").starts_with("Sony headphones"));
        assert!(search_products("most popular").starts_with("Most popular"));
        assert!(search_products("toaster").contains("found 3 related"));
    }

    #[tokio::test]
    async fn test_check_inventory() {
        let tool = CheckInventoryTool::new();
        let result = tool
            .execute(CheckInventoryParameters {
                product_id: "WH-1000XM5".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(result, "Product WH-1000XM5: 10 in stock");

        let result = tool
            .execute(CheckInventoryParameters {
                product_id: "Walkman".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(result, "Product Walkman: 0 in stock");
    }
}
