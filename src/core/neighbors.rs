use crate::core::{
    distance::great_circle_km,
    filters::{is_same_country_neighbor, is_within_radius, matches_username},
};
use crate::models::{Neighbor, NormalizedQuery, Radius, ResultView, SearchState, UserRecord};
use std::sync::Arc;

/// First record whose username matches the query, in dataset order
pub fn find_user<'a>(records: &'a [UserRecord], query: &NormalizedQuery) -> Option<&'a UserRecord> {
    records.iter().find(|record| matches_username(record, query))
}

/// Same-country neighbors of `found` within `radius`, nearest first
///
/// # Pipeline Stages
/// 1. Same country, different username
/// 2. Usable coordinates on both sides
/// 3. Rounded great-circle distance within the radius
/// 4. Stable sort by distance, so dataset order breaks ties
pub fn find_neighbors(records: &[UserRecord], found: &UserRecord, radius: Radius) -> Vec<Neighbor> {
    let Some((origin_lat, origin_lon)) = found.coordinates() else {
        tracing::debug!("Matched user {} has no usable coordinates", found.username);
        return Vec::new();
    };

    if radius.admits_nothing() {
        return Vec::new();
    }

    let mut neighbors: Vec<Neighbor> = records
        .iter()
        .filter(|candidate| is_same_country_neighbor(candidate, found))
        .filter_map(|candidate| {
            let (lat, lon) = candidate.coordinates()?;
            let distance_km = great_circle_km(origin_lat, origin_lon, lat, lon);

            is_within_radius(distance_km, radius).then(|| Neighbor {
                user: candidate.clone(),
                distance_km,
            })
        })
        .collect();

    neighbors.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    neighbors
}

/// Derive the view for one (dataset, query, radius) tuple
///
/// Pure: the same inputs always give an equal view.
pub fn derive_view(records: &[UserRecord], state: &SearchState) -> ResultView {
    if state.query.is_empty() {
        return ResultView::idle();
    }

    match find_user(records, &state.query) {
        None => ResultView::not_found(),
        Some(found) => {
            let neighbors = find_neighbors(records, found, state.radius);
            ResultView::found(Arc::new(found.clone()), neighbors)
        }
    }
}
