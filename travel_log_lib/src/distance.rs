use crate::{haversine::haversine_distance, track_point::PositionSample};

/// Running great-circle distance over a stream of samples.
///
/// Samples are trusted in arrival order. There is no minimum-movement
/// threshold, so GPS jitter while standing still adds distance too.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceAccumulator {
    last_position: Option<PositionSample>,
    cumulative_km: f64,
}

impl DistanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one sample and returns the updated cumulative distance in km.
    /// The first sample only establishes the baseline.
    pub fn ingest(&mut self, sample: &PositionSample) -> f64 {
        if let Some(last) = &self.last_position {
            self.cumulative_km += haversine_distance(
                (last.latitude, last.longitude),
                (sample.latitude, sample.longitude),
            );
        }
        self.last_position = Some(*sample);
        self.cumulative_km
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn cumulative_km(&self) -> f64 {
        self.cumulative_km
    }

    pub fn last_position(&self) -> Option<&PositionSample> {
        self.last_position.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn sample(lat: f64, lng: f64) -> PositionSample {
        PositionSample::new(lat, lng, None, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
    }

    #[test]
    fn first_sample_is_baseline_only() {
        let mut acc = DistanceAccumulator::new();
        assert_eq!(acc.ingest(&sample(10.0, 76.0)), 0.0);
        assert_eq!(acc.cumulative_km(), 0.0);
        assert!(acc.last_position().is_some());
    }

    #[test]
    fn duplicate_sample_adds_nothing() {
        let mut acc = DistanceAccumulator::new();
        acc.ingest(&sample(10.0, 76.0));
        assert_eq!(acc.ingest(&sample(10.0, 76.0)), 0.0);
    }

    #[test]
    fn accumulates_each_leg_without_shortcut() {
        let a = sample(10.0, 76.0);
        let b = sample(10.05, 76.05);
        let c = sample(10.1, 76.0);

        let mut acc = DistanceAccumulator::new();
        acc.ingest(&a);
        acc.ingest(&b);
        let total = acc.ingest(&c);

        let ab = haversine_distance((a.latitude, a.longitude), (b.latitude, b.longitude));
        let bc = haversine_distance((b.latitude, b.longitude), (c.latitude, c.longitude));
        let ac = haversine_distance((a.latitude, a.longitude), (c.latitude, c.longitude));
        assert!((total - (ab + bc)).abs() < 1e-9);
        assert!(total > ac);
    }

    #[test]
    fn stationary_jitter_still_counts() {
        // Known characteristic: no noise filter.
        let mut acc = DistanceAccumulator::new();
        acc.ingest(&sample(10.0, 76.0));
        acc.ingest(&sample(10.000001, 76.0));
        let total = acc.ingest(&sample(10.0, 76.0));
        assert!(total > 0.0);
        assert!(total < 0.001);
    }

    #[test]
    fn reset_clears_state() {
        let mut acc = DistanceAccumulator::new();
        acc.ingest(&sample(10.0, 76.0));
        acc.ingest(&sample(10.1, 76.0));
        acc.reset();
        assert_eq!(acc, DistanceAccumulator::new());
    }
}
