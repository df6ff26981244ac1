use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A user loaded from the directory
///
/// Coordinates that could not be read are stored as NaN; see
/// [`UserRecord::coordinates`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub country: String,
    #[serde(default = "nan", deserialize_with = "lenient_degrees")]
    pub latitude: f64,
    #[serde(default = "nan", deserialize_with = "lenient_degrees")]
    pub longitude: f64,
}

impl UserRecord {
    pub fn new(
        username: impl Into<String>,
        country: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            username: username.into(),
            country: country.into(),
            latitude,
            longitude,
        }
    }

    /// Latitude/longitude pair, or `None` when either value is not finite
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        if self.latitude.is_finite() && self.longitude.is_finite() {
            Some((self.latitude, self.longitude))
        } else {
            None
        }
    }

    /// Whether the record can take part in distance computations
    pub fn is_well_formed(&self) -> bool {
        !self.username.is_empty() && !self.country.is_empty() && self.coordinates().is_some()
    }
}

fn nan() -> f64 {
    f64::NAN
}

/// Accepts a number, a numeric string or null. Anything unreadable becomes NaN.
fn lenient_degrees<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(lenient_number).unwrap_or(f64::NAN))
}

/// Read a JSON number or numeric string; anything else is NaN
pub fn lenient_number(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Immutable snapshot of the loaded users, in directory order
///
/// Cloning is cheap. Two datasets are considered the same input only when
/// they share the same snapshot, so a reload always counts as a change.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[UserRecord]>,
    loaded_at: chrono::DateTime<chrono::Utc>,
}

impl Dataset {
    pub fn new(records: Vec<UserRecord>) -> Self {
        Self {
            records: records.into(),
            loaded_at: chrono::Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn loaded_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.loaded_at
    }

    pub fn same_snapshot(&self, other: &Dataset) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }
}

/// Search text after trimming and case folding
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NormalizedQuery(String);

impl NormalizedQuery {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Distance threshold in kilometers, never negative or NaN
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Radius(f64);

impl Radius {
    pub const DEFAULT_KM: f64 = 5000.0;

    /// Negative, NaN and missing values all collapse to zero
    pub fn from_km(km: Option<f64>) -> Self {
        match km {
            Some(v) if v.is_nan() || v <= 0.0 => Self(0.0),
            Some(v) => Self(v),
            None => Self(0.0),
        }
    }

    pub fn km(self) -> f64 {
        self.0
    }

    pub fn admits_nothing(self) -> bool {
        self.0 <= 0.0
    }
}

/// Normalized search inputs
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub query: NormalizedQuery,
    pub radius: Radius,
}

impl SearchState {
    pub fn new(raw_query: &str, radius_km: Option<f64>) -> Self {
        Self {
            query: NormalizedQuery::new(raw_query),
            radius: Radius::from_km(radius_km),
        }
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: NormalizedQuery::default(),
            radius: Radius::from_km(Some(Radius::DEFAULT_KM)),
        }
    }
}

/// Same-country user with its distance to the match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    #[serde(flatten)]
    pub user: UserRecord,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
}

/// Derived result of one (dataset, query, radius) tuple
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResultView {
    #[serde(rename = "match")]
    pub matched: Option<Arc<UserRecord>>,
    #[serde(rename = "notFound")]
    pub not_found: bool,
    pub neighbors: Vec<Neighbor>,
}

impl ResultView {
    /// Empty query: nothing has been searched yet
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn not_found() -> Self {
        Self {
            matched: None,
            not_found: true,
            neighbors: Vec::new(),
        }
    }

    pub fn found(matched: Arc<UserRecord>, neighbors: Vec<Neighbor>) -> Self {
        Self {
            matched: Some(matched),
            not_found: false,
            neighbors,
        }
    }

    pub fn matched_username(&self) -> Option<&str> {
        self.matched.as_deref().map(|u| u.username.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reads_string_coordinates() {
        let json = r#"{"username":"ana","country":"FR","latitude":"48.8566","longitude":2.3522}"#;
        let record: UserRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.coordinates(), Some((48.8566, 2.3522)));
        assert!(record.is_well_formed());
    }

    #[test]
    fn test_record_with_bad_coordinates() {
        let json = r#"{"username":"ana","country":"FR","latitude":"north"}"#;
        let record: UserRecord = serde_json::from_str(json).unwrap();

        assert!(record.latitude.is_nan());
        assert!(record.longitude.is_nan());
        assert_eq!(record.coordinates(), None);
        assert!(!record.is_well_formed());
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = UserRecord::new("ana", "FR", 48.5, 2.25);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "username": "ana",
                "country": "FR",
                "latitude": 48.5,
                "longitude": 2.25
            })
        );
    }

    #[test]
    fn test_query_normalization() {
        assert_eq!(NormalizedQuery::new("  AnA \t").as_str(), "ana");
        assert!(NormalizedQuery::new("   ").is_empty());

        let once = NormalizedQuery::new(" Bob ");
        let twice = NormalizedQuery::new(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_radius_sanitizing() {
        assert_eq!(Radius::from_km(Some(500.0)).km(), 500.0);
        assert_eq!(Radius::from_km(Some(-3.0)).km(), 0.0);
        assert_eq!(Radius::from_km(Some(f64::NAN)).km(), 0.0);
        assert_eq!(Radius::from_km(None).km(), 0.0);
        assert!(Radius::from_km(Some(0.0)).admits_nothing());
    }

    #[test]
    fn test_dataset_snapshot_identity() {
        let a = Dataset::new(vec![UserRecord::new("ana", "FR", 1.0, 2.0)]);
        let b = a.clone();
        let c = Dataset::new(vec![UserRecord::new("ana", "FR", 1.0, 2.0)]);

        assert!(a.same_snapshot(&b));
        assert!(!a.same_snapshot(&c));
    }

    #[test]
    fn test_view_wire_format() {
        let view = ResultView::found(
            Arc::new(UserRecord::new("ana", "FR", 1.0, 2.0)),
            vec![Neighbor { user: UserRecord::new("bob", "FR", 1.5, 2.5), distance_km: 12.3 }],
        );
        let value = serde_json::to_value(&view).unwrap();

        assert_eq!(value["match"]["username"], "ana");
        assert_eq!(value["notFound"], false);
        assert_eq!(value["neighbors"][0]["username"], "bob");
        assert_eq!(value["neighbors"][0]["distanceKm"], 12.3);
    }
}
