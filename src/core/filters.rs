use crate::models::{NormalizedQuery, Radius, UserRecord};

/// Case-insensitive exact username comparison against a normalized query
#[inline]
pub fn matches_username(record: &UserRecord, query: &NormalizedQuery) -> bool {
    !query.is_empty() && record.username.to_lowercase() == query.as_str()
}

/// Check if a candidate is a same-country neighbor of the matched user
///
/// The matched user itself (by username) never counts, and neither does any
/// record whose country is unknown.
#[inline]
pub fn is_same_country_neighbor(candidate: &UserRecord, found: &UserRecord) -> bool {
    !candidate.country.is_empty()
        && candidate.country == found.country
        && candidate.username != found.username
}

/// Check if a computed distance falls inside the radius
///
/// NaN distances and a zero radius never pass.
#[inline]
pub fn is_within_radius(distance_km: f64, radius: Radius) -> bool {
    !radius.admits_nothing() && distance_km <= radius.km()
}
