use crate::models::UserRecord;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading the user directory
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Supplies the full user dataset in one call
pub trait UserSource: Send + Sync + 'static {
    fn fetch_users(&self) -> impl Future<Output = Result<Vec<UserRecord>, SourceError>> + Send;
}

/// In-memory source with scripted responses
///
/// Each call returns the next scripted response; the last one repeats.
#[derive(Debug)]
pub struct StaticUserSource {
    responses: Vec<(Duration, Result<Vec<UserRecord>, String>)>,
    calls: AtomicUsize,
}

impl StaticUserSource {
    pub fn new(records: Vec<UserRecord>) -> Self {
        Self::sequence(vec![(Duration::ZERO, Ok(records))])
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self::sequence(vec![(Duration::ZERO, Err(reason.into()))])
    }

    pub fn sequence(responses: Vec<(Duration, Result<Vec<UserRecord>, String>)>) -> Self {
        Self {
            responses,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of fetches started so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UserSource for StaticUserSource {
    async fn fetch_users(&self) -> Result<Vec<UserRecord>, SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let Some((delay, response)) = self
            .responses
            .get(call)
            .or_else(|| self.responses.last())
            .cloned()
        else {
            return Ok(Vec::new());
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        response.map_err(SourceError::Unavailable)
    }
}
