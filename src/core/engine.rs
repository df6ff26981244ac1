use crate::core::neighbors::derive_view;
use crate::models::{Dataset, NormalizedQuery, Radius, ResultView, SearchState, UserRecord};
use std::sync::Arc;

/// Combine-latest node over (dataset, normalized query, radius)
///
/// Holds the last value of each input and recomputes the [`ResultView`]
/// whenever one of them actually changes, once all three are known. The
/// view is replaced as a whole; it is never patched in place.
///
/// The matched user is handed out as a shared reference that survives
/// recomputations for as long as the same record keeps matching. A reload
/// that changes the matched user's data replaces the reference, so the
/// view always reflects the current dataset.
#[derive(Debug, Default)]
pub struct SearchEngine {
    dataset: Option<Dataset>,
    query: Option<NormalizedQuery>,
    radius: Option<Radius>,
    view: Option<Arc<ResultView>>,
    current_match: Option<Arc<UserRecord>>,
    recomputations: u64,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with query and radius already primed, waiting for a dataset
    pub fn with_inputs(query: NormalizedQuery, radius: Radius) -> Self {
        Self {
            query: Some(query),
            radius: Some(radius),
            ..Self::default()
        }
    }

    /// Replace the dataset. A new snapshot always triggers recomputation.
    pub fn set_dataset(&mut self, dataset: Dataset) -> Option<Arc<ResultView>> {
        if self.dataset.as_ref().is_some_and(|d| d.same_snapshot(&dataset)) {
            return None;
        }
        self.dataset = Some(dataset);
        self.recompute()
    }

    pub fn set_query(&mut self, query: NormalizedQuery) -> Option<Arc<ResultView>> {
        if self.query.as_ref() == Some(&query) {
            return None;
        }
        self.query = Some(query);
        self.recompute()
    }

    pub fn set_radius(&mut self, radius: Radius) -> Option<Arc<ResultView>> {
        if self.radius == Some(radius) {
            return None;
        }
        self.radius = Some(radius);
        self.recompute()
    }

    /// Latest derived view, `None` until every input has a value
    pub fn view(&self) -> Option<Arc<ResultView>> {
        self.view.clone()
    }

    /// The exposed match reference
    pub fn current_match(&self) -> Option<&Arc<UserRecord>> {
        self.current_match.as_ref()
    }

    pub fn search_state(&self) -> Option<SearchState> {
        Some(SearchState {
            query: self.query.clone()?,
            radius: self.radius?,
        })
    }

    /// How many views have been derived so far
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    fn recompute(&mut self) -> Option<Arc<ResultView>> {
        let dataset = self.dataset.as_ref()?;
        let state = self.search_state()?;

        let mut view = derive_view(dataset.records(), &state);
        self.recomputations += 1;

        // an empty query leaves the exposed match alone
        if view.not_found {
            self.current_match = None;
        } else if let Some(found) = view.matched.take() {
            let unchanged = self
                .current_match
                .as_ref()
                .is_some_and(|current| same_record(current, &found));
            if !unchanged {
                self.current_match = Some(found);
            }
            view.matched = self.current_match.clone();
        }

        tracing::debug!(
            query = %state.query,
            radius_km = state.radius.km(),
            matched = view.matched_username().unwrap_or("-"),
            not_found = view.not_found,
            neighbors = view.neighbors.len(),
            "Recomputed search view"
        );

        let view = Arc::new(view);
        self.view = Some(view.clone());
        Some(view)
    }
}

/// Field-wise equality where two NaN coordinates count as equal
fn same_record(a: &UserRecord, b: &UserRecord) -> bool {
    a.username == b.username
        && a.country == b.country
        && a.latitude.to_bits() == b.latitude.to_bits()
        && a.longitude.to_bits() == b.longitude.to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_for(query: &str) -> SearchEngine {
        SearchEngine::with_inputs(NormalizedQuery::new(query), Radius::from_km(Some(500.0)))
    }

    fn records() -> Vec<UserRecord> {
        vec![
            UserRecord::new("ana", "FR", 48.8566, 2.3522),
            UserRecord::new("bob", "FR", 45.7640, 4.8357),
            UserRecord::new("cid", "DE", 52.5200, 13.4050),
        ]
    }

    #[test]
    fn test_no_view_until_all_inputs_known() {
        let mut engine = SearchEngine::new();

        assert!(engine.set_query(NormalizedQuery::new("ana")).is_none());
        assert!(engine.set_radius(Radius::from_km(Some(500.0))).is_none());
        assert!(engine.view().is_none());

        let view = engine.set_dataset(Dataset::new(records())).unwrap();
        assert_eq!(view.matched_username(), Some("ana"));
        assert_eq!(engine.recomputations(), 1);
    }

    #[test]
    fn test_unchanged_inputs_do_not_recompute() {
        let mut engine = engine_for("ana");
        let dataset = Dataset::new(records());
        engine.set_dataset(dataset.clone());

        assert!(engine.set_query(NormalizedQuery::new("ana")).is_none());
        assert!(engine.set_radius(Radius::from_km(Some(500.0))).is_none());
        assert!(engine.set_dataset(dataset).is_none());
        assert_eq!(engine.recomputations(), 1);
    }

    #[test]
    fn test_reload_always_recomputes() {
        let mut engine = engine_for("ana");
        engine.set_dataset(Dataset::new(records()));

        assert!(engine.set_dataset(Dataset::new(records())).is_some());
        assert_eq!(engine.recomputations(), 2);
    }

    #[test]
    fn test_match_reference_is_stable() {
        let mut engine = engine_for("ana");
        engine.set_dataset(Dataset::new(records()));
        let first = engine.current_match().cloned().unwrap();

        let view = engine.set_radius(Radius::from_km(Some(100.0))).unwrap();
        assert!(Arc::ptr_eq(&first, view.matched.as_ref().unwrap()));
        assert!(Arc::ptr_eq(&first, engine.current_match().unwrap()));

        // also across a reload that still contains the same username
        engine.set_dataset(Dataset::new(records()));
        assert!(Arc::ptr_eq(&first, engine.current_match().unwrap()));

        engine.set_query(NormalizedQuery::new("bob"));
        assert!(!Arc::ptr_eq(&first, engine.current_match().unwrap()));
    }

    #[test]
    fn test_changed_record_replaces_match_on_reload() {
        let mut engine = engine_for("ana");
        engine.set_dataset(Dataset::new(records()));
        let first = engine.current_match().cloned().unwrap();

        let mut moved = records();
        moved[0].latitude = 45.0;
        let view = engine.set_dataset(Dataset::new(moved)).unwrap();

        let matched = view.matched.as_ref().unwrap();
        assert!(!Arc::ptr_eq(&first, matched));
        assert_eq!(matched.latitude, 45.0);
        assert!(Arc::ptr_eq(matched, engine.current_match().unwrap()));
    }

    #[test]
    fn test_match_without_coordinates_stays_stable() {
        let mut engine = engine_for("ana");
        let broken = vec![UserRecord::new("ana", "FR", f64::NAN, f64::NAN)];
        engine.set_dataset(Dataset::new(broken.clone()));
        let first = engine.current_match().cloned().unwrap();

        engine.set_dataset(Dataset::new(broken));
        assert!(Arc::ptr_eq(&first, engine.current_match().unwrap()));
    }

    #[test]
    fn test_not_found_clears_match_but_empty_query_keeps_it() {
        let mut engine = engine_for("ana");
        engine.set_dataset(Dataset::new(records()));

        let view = engine.set_query(NormalizedQuery::new("")).unwrap();
        assert!(view.matched.is_none());
        assert!(!view.not_found);
        assert_eq!(engine.current_match().map(|u| u.username.as_str()), Some("ana"));

        let view = engine.set_query(NormalizedQuery::new("zoe")).unwrap();
        assert!(view.not_found);
        assert!(engine.current_match().is_none());
    }

    #[test]
    fn test_empty_dataset_reports_not_found() {
        let mut engine = engine_for("ana");
        let view = engine.set_dataset(Dataset::empty()).unwrap();

        assert!(view.not_found);
        assert!(view.neighbors.is_empty());
    }
}
