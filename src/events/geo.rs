//! Rectangular bounding-box approximation for "events near me".

/// Kilometres spanned by one degree of latitude.
const KM_PER_DEGREE_LAT: f64 = 111.0;

/// Lat/lng window around a point, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Compute the window that covers `radius_km` around a point.
///
/// This is a rectangle, not a circle: corners reach further than the
/// radius, which is acceptable for discovery. Longitude degrees shrink
/// with latitude, so the longitude delta divides by cos(lat); the cosine
/// is clamped at 1e-6 so polar latitudes stay finite.
pub fn bounding_box(lat: f64, lng: f64, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / KM_PER_DEGREE_LAT;
    let lng_delta = radius_km / (KM_PER_DEGREE_LAT * lat.to_radians().cos().max(1e-6));

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lng: lng - lng_delta,
        max_lng: lng + lng_delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn equator_deltas_are_symmetric() {
        // 111 km at the equator is one degree in both axes
        let bb = bounding_box(0.0, 0.0, 111.0);

        assert!((bb.min_lat - -1.0).abs() < EPSILON);
        assert!((bb.max_lat - 1.0).abs() < EPSILON);
        assert!((bb.min_lng - -1.0).abs() < EPSILON);
        assert!((bb.max_lng - 1.0).abs() < EPSILON);

        // (0.5, 0.5) falls inside, (2, 2) outside
        assert!(bb.min_lat <= 0.5 && 0.5 <= bb.max_lat);
        assert!(bb.min_lng <= 0.5 && 0.5 <= bb.max_lng);
        assert!(2.0 > bb.max_lat);
        assert!(2.0 > bb.max_lng);
    }

    #[test]
    fn longitude_widens_away_from_equator() {
        let equator = bounding_box(0.0, 0.0, 50.0);
        let north = bounding_box(60.0, 0.0, 50.0);

        let equator_width = equator.max_lng - equator.min_lng;
        let north_width = north.max_lng - north.min_lng;

        // cos(60°) = 0.5, so the window is twice as wide
        assert!((north_width - 2.0 * equator_width).abs() < 1e-6);
    }

    #[test]
    fn polar_latitude_stays_finite() {
        let bb = bounding_box(90.0, 0.0, 10.0);

        assert!(bb.min_lng.is_finite());
        assert!(bb.max_lng.is_finite());
    }
}
