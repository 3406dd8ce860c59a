use crate::track_point::PathPoint;

/// Mean radius of the earth in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in km between two `(lat, lng)` pairs given in degrees.
pub fn haversine_distance(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let d_lat = (p2.0 - p1.0).to_radians();
    let d_lng = (p2.1 - p1.1).to_radians();
    let lat1 = p1.0.to_radians();
    let lat2 = p2.0.to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lng / 2.).powi(2);
    let c = 2. * f64::atan2(a.sqrt(), (1. - a).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn point_distance(p1: &PathPoint, p2: &PathPoint) -> f64 {
    haversine_distance((p1.lat, p1.lng), (p2.lat, p2.lng))
}

/// Sum of the distances between consecutive points, in km.
pub fn path_distance_km(path: &[PathPoint]) -> f64 {
    path.windows(2).map(|pair| point_distance(&pair[0], &pair[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_are_zero_apart() {
        assert_eq!(haversine_distance((10.0, 76.0), (10.0, 76.0)), 0.0);
    }

    #[test]
    fn tenth_of_a_degree_latitude() {
        let expected = EARTH_RADIUS_KM * 0.1_f64.to_radians();
        let d = haversine_distance((10.0, 76.0), (10.1, 76.0));
        assert!((d - expected).abs() < 1e-9, "{d} vs {expected}");
        assert!((d - 11.1195).abs() < 1e-3);
    }

    #[test]
    fn symmetric() {
        let a = (9.9312, 76.2673);
        let b = (8.5241, 76.9366);
        assert!((haversine_distance(a, b) - haversine_distance(b, a)).abs() < 1e-12);
    }

    #[test]
    fn path_distance_of_short_paths() {
        assert_eq!(path_distance_km(&[]), 0.0);
        assert_eq!(path_distance_km(&[PathPoint::new(1.0, 1.0)]), 0.0);

        let path = [
            PathPoint::new(10.000, 76.0),
            PathPoint::new(10.001, 76.0),
            PathPoint::new(10.002, 76.0),
        ];
        let step = haversine_distance((10.000, 76.0), (10.001, 76.0));
        assert!((path_distance_km(&path) - 2. * step).abs() < 1e-9);
    }
}
