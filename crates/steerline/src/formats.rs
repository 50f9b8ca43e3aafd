//! Structured answers the demos ask the model for.

use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use steerline_core::ResponseFormat;

/// Contact details extracted from free text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContactInfo {
    /// Full name of the person.
    #[schemars(description = "Full name of the person.")]
    pub name: String,
    /// Email address.
    #[schemars(description = "Email address.")]
    pub email: String,
    /// Phone number, as written in the text.
    #[schemars(description = "Phone number, as written in the text.")]
    pub phone: String,
}

impl ContactInfo {
    /// Returns the response format asking for a `ContactInfo`.
    pub fn response_format() -> ResponseFormat {
        ResponseFormat::new("ContactInfo", schema_for!(ContactInfo).to_value())
            .with_description("The contact information found in the text.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_format() {
        let format = ContactInfo::response_format();
        assert_eq!(format.name(), "ContactInfo");
        let mut required = format.schema()["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|field| field.as_str().unwrap())
            .collect::<Vec<_>>();
        required.sort_unstable();
        assert_eq!(required, ["email", "name", "phone"]);
        assert_eq!(
            format.schema()["properties"]["phone"]["description"],
            "Phone number, as written in the text."
        );
    }
}
