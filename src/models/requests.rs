use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::lenient_number;

/// Raw search text from the UI
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QueryChangedRequest {
    #[validate(length(max = 256))]
    #[serde(default)]
    pub query: String,
}

/// Radius control value. Missing or non-numeric values are accepted and
/// treated as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadiusChangedRequest {
    #[serde(alias = "radius_km", rename = "radiusKm", default, deserialize_with = "lenient_radius")]
    pub radius_km: Option<f64>,
}

/// One-shot lookup against the current dataset
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LookupRequest {
    #[validate(length(max = 256))]
    pub query: String,
    #[serde(alias = "radius_km", rename = "radiusKm", default, deserialize_with = "lenient_radius")]
    pub radius_km: Option<f64>,
}

fn lenient_radius<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(|v| lenient_number(&v)))
}
