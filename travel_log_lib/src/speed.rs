use crate::track_point::PositionSample;

const MPS_TO_KMH: f64 = 3.6;

/// Display speed in km/h for a sample. Uses the reported speed verbatim and
/// falls back to 0 when the provider gives none. Nothing is derived from
/// consecutive samples and nothing is smoothed.
pub fn current_speed_kmh(sample: &PositionSample) -> f64 {
    match sample.speed_mps {
        Some(speed) if speed.is_finite() && speed > 0. => speed * MPS_TO_KMH,
        _ => 0.,
    }
}

/// Holds the speed of the most recent sample for live display.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedEstimator {
    current_kmh: f64,
}

impl SpeedEstimator {
    pub fn update(&mut self, sample: &PositionSample) -> f64 {
        self.current_kmh = current_speed_kmh(sample);
        self.current_kmh
    }

    pub fn current_kmh(&self) -> f64 {
        self.current_kmh
    }
}
