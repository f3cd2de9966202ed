//! Great-circle distance between positions.

/// Mean Earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Calculate the great-circle distance between two positions.
///
/// # Arguments
///
/// * `from` - First position as (latitude, longitude) in degrees
/// * `to` - Second position as (latitude, longitude) in degrees
///
/// # Returns
///
/// Distance in meters.
///
/// # Example
///
/// ```
/// use fixgate::acquisition::distance_m;
///
/// // One degree of latitude is roughly 111km
/// let dist = distance_m((0.0, 0.0), (1.0, 0.0));
/// assert!((dist - 111_195.0).abs() < 100.0);
/// ```
pub fn distance_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let lat1_rad = lat1 * DEG_TO_RAD;
    let lat2_rad = lat2 * DEG_TO_RAD;
    let delta_lat = (lat2 - lat1) * DEG_TO_RAD;
    let delta_lon = (lon2 - lon1) * DEG_TO_RAD;

    // Haversine formula
    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(distance_m((53.63, 9.98), (53.63, 9.98)), 0.0);
    }

    #[test]
    fn test_one_degree_latitude() {
        let dist = distance_m((0.0, 0.0), (1.0, 0.0));
        assert!((dist - 111_195.0).abs() < 100.0, "got {}", dist);
    }

    #[test]
    fn test_symmetric() {
        let a = (43.629444, 1.363889);
        let b = (53.630278, 9.988333);
        assert!((distance_m(a, b) - distance_m(b, a)).abs() < 1e-6);
    }

    #[test]
    fn test_kilometer_scale() {
        // 0.01 degrees of latitude is ~1.1km
        let dist = distance_m((50.0, 8.0), (50.01, 8.0));
        assert!(dist > 1000.0 && dist < 1200.0, "got {}", dist);

        // 0.005 degrees of latitude is ~556m
        let dist = distance_m((50.0, 8.0), (50.005, 8.0));
        assert!(dist > 500.0 && dist < 600.0, "got {}", dist);
    }
}
