use crate::config::SearchSettings;
use crate::core::{QueryDebouncer, SearchEngine};
use crate::models::{Dataset, Radius, ResultView, UserRecord};
use crate::services::source::{SourceError, UserSource};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

/// Errors returned by a [`SessionHandle`]
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Search session has stopped")]
    Closed,
}

/// Dataset loading progress as seen by the UI
#[derive(Debug, Clone)]
pub enum LoadState {
    Pending,
    Loaded {
        records: usize,
        loaded_at: chrono::DateTime<chrono::Utc>,
    },
    Failed {
        reason: String,
    },
}

impl LoadState {
    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Pending => "pending",
            LoadState::Loaded { .. } => "loaded",
            LoadState::Failed { .. } => "failed",
        }
    }
}

/// Startup values for a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub debounce: Duration,
    pub initial_query: String,
    pub default_radius_km: f64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: crate::core::DEFAULT_QUERY_DEBOUNCE,
            initial_query: String::new(),
            default_radius_km: Radius::DEFAULT_KM,
        }
    }
}

impl From<&SearchSettings> for SessionOptions {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            debounce: Duration::from_millis(settings.debounce_ms),
            initial_query: String::new(),
            default_radius_km: settings.default_radius_km,
        }
    }
}

#[derive(Debug)]
enum SessionInput {
    Query(String),
    Radius(Option<f64>),
    Reload,
    Shutdown,
}

type LoadOutcome = (u64, Result<Vec<UserRecord>, SourceError>);

/// Cloneable handle to a running search session
#[derive(Clone)]
pub struct SessionHandle {
    inputs: mpsc::UnboundedSender<SessionInput>,
    view: watch::Receiver<Option<Arc<ResultView>>>,
    load: watch::Receiver<LoadState>,
    snapshot: watch::Receiver<Option<Dataset>>,
    default_radius_km: f64,
}

impl SessionHandle {
    /// Raw query text; applied after the quiet window
    pub fn query(&self, raw: impl Into<String>) -> Result<(), SessionError> {
        self.send(SessionInput::Query(raw.into()))
    }

    /// Raw radius value; applied immediately
    pub fn radius(&self, km: Option<f64>) -> Result<(), SessionError> {
        self.send(SessionInput::Radius(km))
    }

    /// Fetch the dataset again; the newest load wins
    pub fn reload(&self) -> Result<(), SessionError> {
        self.send(SessionInput::Reload)
    }

    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionInput::Shutdown)
    }

    /// Latest view, `None` until the first successful load
    pub fn view(&self) -> Option<Arc<ResultView>> {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<ResultView>>> {
        self.view.clone()
    }

    pub fn load_state(&self) -> LoadState {
        self.load.borrow().clone()
    }

    pub fn subscribe_load(&self) -> watch::Receiver<LoadState> {
        self.load.clone()
    }

    /// Dataset the current view was derived from
    pub fn snapshot(&self) -> Option<Dataset> {
        self.snapshot.borrow().clone()
    }

    pub fn default_radius_km(&self) -> f64 {
        self.default_radius_km
    }

    fn send(&self, input: SessionInput) -> Result<(), SessionError> {
        self.inputs.send(input).map_err(|_| SessionError::Closed)
    }
}

/// Event loop hosting one [`SearchEngine`]
///
/// Owns the engine and the query debouncer. Dataset loads run as separate
/// tasks and report back here; results of superseded loads are dropped.
pub struct SearchSession<S: UserSource> {
    source: Arc<S>,
    engine: SearchEngine,
    debouncer: QueryDebouncer,
    generation: u64,
    inputs: mpsc::UnboundedReceiver<SessionInput>,
    loads_tx: mpsc::UnboundedSender<LoadOutcome>,
    loads_rx: mpsc::UnboundedReceiver<LoadOutcome>,
    view_tx: watch::Sender<Option<Arc<ResultView>>>,
    load_tx: watch::Sender<LoadState>,
    snapshot_tx: watch::Sender<Option<Dataset>>,
}

impl<S: UserSource> SearchSession<S> {
    /// Start the session on the current tokio runtime
    ///
    /// The initial query and default radius take effect immediately and the
    /// first dataset load starts right away.
    pub fn spawn(source: Arc<S>, options: SessionOptions) -> SessionHandle {
        let (inputs_tx, inputs) = mpsc::unbounded_channel();
        let (loads_tx, loads_rx) = mpsc::unbounded_channel();
        let (view_tx, view) = watch::channel(None);
        let (load_tx, load) = watch::channel(LoadState::Pending);
        let (snapshot_tx, snapshot) = watch::channel(None);

        let mut debouncer = QueryDebouncer::new(options.debounce);
        let query = debouncer.prime(&options.initial_query);
        let radius = Radius::from_km(Some(options.default_radius_km));
        let engine = SearchEngine::with_inputs(query, radius);

        let session = Self {
            source,
            engine,
            debouncer,
            generation: 0,
            inputs,
            loads_tx,
            loads_rx,
            view_tx,
            load_tx,
            snapshot_tx,
        };

        tokio::spawn(session.run());

        SessionHandle {
            inputs: inputs_tx,
            view,
            load,
            snapshot,
            default_radius_km: options.default_radius_km,
        }
    }

    async fn run(mut self) {
        tracing::info!("Search session started (debounce: {:?})", self.debouncer.window());
        self.start_load();

        loop {
            let deadline = self.debouncer.deadline();

            tokio::select! {
                input = self.inputs.recv() => match input {
                    Some(SessionInput::Query(raw)) => self.debouncer.push(raw, Instant::now()),
                    Some(SessionInput::Radius(km)) => {
                        let radius = Radius::from_km(km);
                        tracing::debug!("Radius changed to {} km", radius.km());
                        let view = self.engine.set_radius(radius);
                        self.publish(view);
                    }
                    Some(SessionInput::Reload) => self.start_load(),
                    Some(SessionInput::Shutdown) | None => break,
                },
                Some((generation, outcome)) = self.loads_rx.recv() => {
                    self.apply_load(generation, outcome);
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(query) = self.debouncer.poll(Instant::now()) {
                        tracing::info!("Searching for: '{}'", query);
                        let view = self.engine.set_query(query);
                        self.publish(view);
                    }
                }
            }
        }

        tracing::info!("Search session stopped");
    }

    fn start_load(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let source = Arc::clone(&self.source);
        let loads_tx = self.loads_tx.clone();

        tracing::debug!("Starting dataset load #{}", generation);

        tokio::spawn(async move {
            let outcome = source.fetch_users().await;
            let _ = loads_tx.send((generation, outcome));
        });
    }

    fn apply_load(&mut self, generation: u64, outcome: Result<Vec<UserRecord>, SourceError>) {
        if generation != self.generation {
            tracing::debug!("Discarding superseded dataset load #{}", generation);
            return;
        }

        match outcome {
            Ok(records) => {
                let dataset = Dataset::new(records);
                tracing::info!("Dataset loaded: {} users", dataset.len());

                self.load_tx.send_replace(LoadState::Loaded {
                    records: dataset.len(),
                    loaded_at: dataset.loaded_at(),
                });
                self.snapshot_tx.send_replace(Some(dataset.clone()));

                let view = self.engine.set_dataset(dataset);
                self.publish(view);
            }
            Err(e) => {
                tracing::warn!("Dataset load #{} failed: {}", generation, e);
                self.load_tx.send_replace(LoadState::Failed {
                    reason: e.to_string(),
                });
            }
        }
    }

    fn publish(&self, view: Option<Arc<ResultView>>) {
        let Some(view) = view else {
            return;
        };

        if view.not_found {
            tracing::info!("User not found");
        } else if let Some(username) = view.matched_username() {
            tracing::info!("Found {} neighbors of {}", view.neighbors.len(), username);
        }

        self.view_tx.send_replace(Some(view));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::source::StaticUserSource;

    fn records() -> Vec<UserRecord> {
        vec![
            UserRecord::new("ana", "FR", 48.8566, 2.3522),
            UserRecord::new("bob", "FR", 45.7640, 4.8357),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_view_needs_no_interaction() {
        let source = Arc::new(StaticUserSource::new(records()));
        let handle = SearchSession::spawn(source, SessionOptions::default());
        let mut views = handle.subscribe();

        let view = views.wait_for(|v| v.is_some()).await.unwrap().clone().unwrap();
        assert_eq!(*view, ResultView::idle());
        assert_eq!(handle.load_state().label(), "loaded");
        assert_eq!(handle.snapshot().map(|d| d.len()), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_publishes_no_view() {
        let source = Arc::new(StaticUserSource::failing("offline"));
        let handle = SearchSession::spawn(source, SessionOptions::default());
        let mut load = handle.subscribe_load();

        load.wait_for(|s| matches!(s, LoadState::Failed { .. })).await.unwrap();
        assert!(handle.view().is_none());
        assert!(handle.snapshot().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_reports_closed_session() {
        let source = Arc::new(StaticUserSource::new(records()));
        let handle = SearchSession::spawn(source, SessionOptions::default());
        handle.shutdown().unwrap();

        // let the session task observe the shutdown
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(handle.query("ana"), Err(SessionError::Closed)));
    }
}
