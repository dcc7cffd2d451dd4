use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to find matching venues
///
/// Every field is optional; missing or blank fields are simply not scored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct FindVenuesRequest {
    #[validate(length(max = 100))]
    #[serde(default)]
    pub city: Option<String>,
    #[validate(length(max = 32))]
    #[serde(default, deserialize_with = "string_or_number")]
    pub capacity: Option<String>,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub style: Option<String>,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub keywords: Option<String>,
}

/// Accepts `"capacity": 200` as well as `"capacity": "200+"`
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "capacity must be a string or number, got {}",
            other
        ))),
    }
}
