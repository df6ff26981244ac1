use crate::models::NormalizedQuery;
use std::time::Duration;
use tokio::time::Instant;

/// Default quiet window for query input
pub const DEFAULT_QUERY_DEBOUNCE: Duration = Duration::from_millis(300);

/// Coalesces raw query input into normalized, distinct values
///
/// Every raw update restarts the quiet window. When the window expires the
/// latest raw value is normalized and released only if it differs from the
/// last released value. The caller owns the clock: it calls
/// [`QueryDebouncer::poll`] at or after [`QueryDebouncer::deadline`].
#[derive(Debug)]
pub struct QueryDebouncer {
    window: Duration,
    pending: Option<(String, Instant)>,
    last_accepted: Option<NormalizedQuery>,
}

impl QueryDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            last_accepted: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Accept a starting value right away, without waiting for the window
    pub fn prime(&mut self, raw: &str) -> NormalizedQuery {
        let query = NormalizedQuery::new(raw);
        self.pending = None;
        self.last_accepted = Some(query.clone());
        query
    }

    /// Record a raw update and restart the quiet window
    pub fn push(&mut self, raw: impl Into<String>, now: Instant) {
        self.pending = Some((raw.into(), now + self.window));
    }

    /// When the pending value becomes due, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    /// Release the pending value if its window has expired and it normalizes
    /// to something new
    pub fn poll(&mut self, now: Instant) -> Option<NormalizedQuery> {
        match &self.pending {
            Some((_, due)) if *due <= now => {}
            _ => return None,
        }

        let (raw, _) = self.pending.take()?;
        let query = NormalizedQuery::new(&raw);

        if self.last_accepted.as_ref() == Some(&query) {
            tracing::trace!("Query '{}' unchanged, suppressed", query);
            return None;
        }

        self.last_accepted = Some(query.clone());
        Some(query)
    }
}

impl Default for QueryDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY_DEBOUNCE)
    }
}
