use crate::config::SourceSettings;
use crate::models::{domain::lenient_number, UserRecord};
use crate::services::source::{SourceError, UserSource};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// randomuser.me API client
///
/// Fetches a fixed page of users. The seed makes the page repeatable, so
/// every session sees the same people.
pub struct RandomUserClient {
    endpoint: String,
    results: u32,
    seed: String,
    client: Client,
}

impl RandomUserClient {
    /// Create a new client
    pub fn new(
        endpoint: String,
        results: u32,
        seed: String,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint,
            results,
            seed,
            client,
        })
    }

    pub fn from_settings(settings: &SourceSettings) -> Result<Self, SourceError> {
        Self::new(
            settings.endpoint.clone(),
            settings.results,
            settings.seed.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// Full request URL including the page size and seed
    pub fn request_url(&self) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}results={}&seed={}",
            self.endpoint,
            separator,
            self.results,
            urlencoding::encode(&self.seed)
        )
    }

    /// Fetch every user on the seeded page
    pub async fn fetch_users(&self) -> Result<Vec<UserRecord>, SourceError> {
        let url = self.request_url();

        tracing::debug!("Fetching users from: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Failed to fetch users: {} - {}", status, body);
            return Err(SourceError::ApiError(format!("Failed to fetch users: {}", status)));
        }

        let json: Value = response.json().await?;

        let results = json
            .get("results")
            .and_then(|r| r.as_array())
            .ok_or_else(|| SourceError::InvalidResponse("Missing results array".into()))?;

        let users: Vec<UserRecord> = results.iter().map(parse_user).collect();

        let malformed = users.iter().filter(|u| !u.is_well_formed()).count();
        if malformed > 0 {
            tracing::warn!("{} of {} users have incomplete data", malformed, users.len());
        }
        tracing::info!("Total users loaded: {}", users.len());

        Ok(users)
    }
}

impl UserSource for RandomUserClient {
    async fn fetch_users(&self) -> Result<Vec<UserRecord>, SourceError> {
        RandomUserClient::fetch_users(self).await
    }
}

/// Map one directory entry to a record. Missing text fields become empty,
/// missing or unreadable coordinates become NaN.
fn parse_user(doc: &Value) -> UserRecord {
    let text = |value: Option<&Value>| {
        value
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_default()
    };

    let location = doc.get("location");
    let coordinates = location.and_then(|l| l.get("coordinates"));
    let degrees = |key: &str| {
        coordinates
            .and_then(|c| c.get(key))
            .map(lenient_number)
            .unwrap_or(f64::NAN)
    };

    UserRecord {
        username: text(doc.get("login").and_then(|l| l.get("username"))),
        country: text(location.and_then(|l| l.get("country"))),
        latitude: degrees("latitude"),
        longitude: degrees("longitude"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> RandomUserClient {
        RandomUserClient::new(
            endpoint.to_string(),
            100,
            "fixed seed".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_request_url() {
        assert_eq!(
            client("https://randomuser.me/api/").request_url(),
            "https://randomuser.me/api/?results=100&seed=fixed%20seed"
        );
        assert_eq!(
            client("https://randomuser.me/api/?nat=fr").request_url(),
            "https://randomuser.me/api/?nat=fr&results=100&seed=fixed%20seed"
        );
    }

    #[test]
    fn test_parse_user() {
        let doc = serde_json::json!({
            "login": {"username": "silverfish42"},
            "location": {
                "country": "France",
                "coordinates": {"latitude": "48.8566", "longitude": "2.3522"}
            }
        });

        let user = parse_user(&doc);
        assert_eq!(user, UserRecord::new("silverfish42", "France", 48.8566, 2.3522));
    }

    #[test]
    fn test_parse_incomplete_user() {
        let doc = serde_json::json!({
            "location": {"coordinates": {"latitude": "n/a"}}
        });

        let user = parse_user(&doc);
        assert_eq!(user.username, "");
        assert_eq!(user.country, "");
        assert!(user.latitude.is_nan());
        assert!(user.longitude.is_nan());
    }
}
