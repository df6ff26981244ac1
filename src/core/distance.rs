/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Unrounded distance in kilometers. NaN inputs yield NaN.
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // rounding can push `a` just past 1.0 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Great-circle distance in kilometers, rounded to one decimal place
///
/// This is the distance reported for neighbors and compared against the
/// search radius.
#[inline]
pub fn great_circle_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    round_to_tenth(haversine_distance(lat1, lon1, lat2, lon2))
}

/// Round half away from zero to one decimal place
#[inline]
pub fn round_to_tenth(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Distance from London to Paris (approximately 344 km)
        let london_lat = 51.5074;
        let london_lon = -0.1278;
        let paris_lat = 48.8566;
        let paris_lon = 2.3522;

        let distance = haversine_distance(london_lat, london_lon, paris_lat, paris_lon);
        assert!((distance - 344.0).abs() < 10.0, "Distance should be ~344km, got {}", distance);
    }

    #[test]
    fn test_great_circle_is_rounded() {
        let distance = great_circle_km(51.5074, -0.1278, 48.8566, 2.3522);
        assert_eq!(distance, 343.6);
        assert_eq!(round_to_tenth(distance), distance);
    }

    #[test]
    fn test_identical_points() {
        assert_eq!(great_circle_km(48.8566, 2.3522, 48.8566, 2.3522), 0.0);
        assert_eq!(great_circle_km(-90.0, 0.0, -90.0, 0.0), 0.0);
    }

    #[test]
    fn test_antipodal_points() {
        let distance = great_circle_km(0.0, 0.0, 0.0, 180.0);
        let half_circumference = round_to_tenth(EARTH_RADIUS_KM * std::f64::consts::PI);
        assert_eq!(distance, half_circumference);
    }

    #[test]
    fn test_antipodal_points_off_the_equator() {
        let half_circumference = round_to_tenth(EARTH_RADIUS_KM * std::f64::consts::PI);

        for (lat, lon) in [(2.5, 10.0), (48.8566, 2.3522), (-33.8688, 151.2093), (89.0, 45.0)] {
            let antipode_lon = if lon > 0.0 { lon - 180.0 } else { lon + 180.0 };
            let distance = great_circle_km(lat, lon, -lat, antipode_lon);
            assert!(!distance.is_nan(), "({}, {}) gave NaN", lat, lon);
            assert!(
                (distance - half_circumference).abs() < 0.2,
                "({}, {}) gave {}",
                lat,
                lon,
                distance
            );
        }
    }

    #[test]
    fn test_nan_propagates() {
        assert!(great_circle_km(f64::NAN, 2.0, 48.0, 2.0).is_nan());
        assert!(great_circle_km(48.0, 2.0, 48.0, f64::NAN).is_nan());
    }
}
