use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    distance::DistanceAccumulator,
    speed::SpeedEstimator,
    track_point::{PathPoint, PositionSample},
    trip::{Trip, TripDetails},
};

/// Points recorded during a session, in the order they were accepted.
/// Only the session appends to it; once attached to a trip it is read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedPath(Vec<PathPoint>);

impl TrackedPath {
    pub fn from_points(points: Vec<PathPoint>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&PathPoint> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&PathPoint> {
        self.0.last()
    }

    fn push(&mut self, point: PathPoint) {
        self.0.push(point);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no trip is being tracked")]
    NotActive,
    #[error("a trip is already being tracked")]
    AlreadyActive,
}

#[derive(Debug)]
struct ActiveSession {
    trip: Trip,
    path: TrackedPath,
    distance: DistanceAccumulator,
    speed: SpeedEstimator,
    duration_ticks: u64,
}

/// Lifecycle of the single trip being tracked: `Idle -> Active -> Idle`.
///
/// Every accessor reports the idle defaults when no trip is active. Calls that
/// need an active trip return [`SessionError::NotActive`] and leave the state
/// untouched.
///
/// Start instants are kept strictly increasing at millisecond precision, so
/// trip ids never repeat even when trips start within the same millisecond.
#[derive(Debug, Default)]
pub struct TripSession {
    active: Option<ActiveSession>,
    last_start: Option<DateTime<Utc>>,
}

impl TripSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, details: TripDetails, now: DateTime<Utc>) -> Result<&Trip, SessionError> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyActive);
        }

        let mut started_at = now.trunc_subsecs(3);
        if let Some(last) = self.last_start.filter(|last| started_at <= *last) {
            started_at = last + Duration::milliseconds(1);
        }
        self.last_start = Some(started_at);

        let session = self.active.insert(ActiveSession {
            trip: Trip::start(details, started_at),
            path: TrackedPath::default(),
            distance: DistanceAccumulator::new(),
            speed: SpeedEstimator::default(),
            duration_ticks: 0,
        });

        Ok(&session.trip)
    }

    /// Records a sample and returns the cumulative distance in km.
    pub fn ingest(&mut self, sample: &PositionSample) -> Result<f64, SessionError> {
        let session = self.active.as_mut().ok_or(SessionError::NotActive)?;
        session.path.push(sample.point());
        session.speed.update(sample);
        Ok(session.distance.ingest(sample))
    }

    /// Advances the duration timer by one unit.
    pub fn tick(&mut self) -> Result<u64, SessionError> {
        let session = self.active.as_mut().ok_or(SessionError::NotActive)?;
        session.duration_ticks += 1;
        Ok(session.duration_ticks)
    }

    /// Finishes the trip, attaching the recorded path and end instant.
    pub fn end(&mut self, now: DateTime<Utc>) -> Result<Trip, SessionError> {
        let session = self.active.take().ok_or(SessionError::NotActive)?;
        Ok(session.trip.complete(session.path, now))
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_trip(&self) -> Option<&Trip> {
        self.active.as_ref().map(|session| &session.trip)
    }

    pub fn distance_km(&self) -> f64 {
        self.active.as_ref().map(|session| session.distance.cumulative_km()).unwrap_or(0.)
    }

    pub fn speed_kmh(&self) -> f64 {
        self.active.as_ref().map(|session| session.speed.current_kmh()).unwrap_or(0.)
    }

    pub fn duration_ticks(&self) -> u64 {
        self.active.as_ref().map(|session| session.duration_ticks).unwrap_or(0)
    }

    pub fn path(&self) -> &[PathPoint] {
        self.active.as_ref().map(|session| session.path.points()).unwrap_or(&[])
    }

    pub fn last_position(&self) -> Option<PathPoint> {
        self.active.as_ref().and_then(|session| session.path.last().copied())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::{haversine::haversine_distance, trip::TransportMode};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn details() -> TripDetails {
        TripDetails {
            origin: "Ernakulam".into(),
            destination: "Thrissur".into(),
            date_time: t0(),
            mode: TransportMode::Bus,
            activity: "Visiting relatives".into(),
            accompanying: 2,
        }
    }

    fn sample(lat: f64, lng: f64, speed: Option<f64>) -> PositionSample {
        PositionSample::new(lat, lng, speed, t0())
    }

    #[test]
    fn three_equal_steps() {
        let mut session = TripSession::new();
        session.start(details(), t0()).unwrap();

        session.ingest(&sample(10.000, 76.000, None)).unwrap();
        session.ingest(&sample(10.001, 76.000, None)).unwrap();
        let total = session.ingest(&sample(10.002, 76.000, None)).unwrap();

        let step = haversine_distance((10.000, 76.000), (10.001, 76.000));
        assert!((total - 2. * step).abs() < 1e-9);
        assert_eq!(session.path().len(), 3);

        let trip = session.end(t0() + Duration::minutes(5)).unwrap();
        assert_eq!(trip.path_points().len(), 3);
        assert_eq!(trip.path_points()[0], PathPoint::new(10.000, 76.000));
    }

    #[test]
    fn ingest_while_idle_is_rejected_without_side_effects() {
        let mut session = TripSession::new();
        assert_eq!(session.ingest(&sample(10.0, 76.0, Some(3.0))), Err(SessionError::NotActive));
        assert_eq!(session.distance_km(), 0.0);
        assert_eq!(session.speed_kmh(), 0.0);
        assert!(session.path().is_empty());
        assert!(!session.is_active());

        // Same after a finished session.
        session.start(details(), t0()).unwrap();
        session.ingest(&sample(10.0, 76.0, None)).unwrap();
        session.end(t0()).unwrap();
        assert_eq!(session.ingest(&sample(10.5, 76.0, None)), Err(SessionError::NotActive));
        assert!(session.path().is_empty());
    }

    #[test]
    fn end_and_tick_while_idle_are_rejected() {
        let mut session = TripSession::new();
        assert_eq!(session.end(t0()).unwrap_err(), SessionError::NotActive);
        assert_eq!(session.tick(), Err(SessionError::NotActive));
    }

    #[test]
    fn second_start_is_rejected() {
        let mut session = TripSession::new();
        session.start(details(), t0()).unwrap();
        session.ingest(&sample(10.0, 76.0, None)).unwrap();
        assert_eq!(session.start(details(), t0()).unwrap_err(), SessionError::AlreadyActive);
        assert_eq!(session.path().len(), 1);
    }

    #[test]
    fn start_resets_distance() {
        let mut session = TripSession::new();
        session.start(details(), t0()).unwrap();
        session.ingest(&sample(10.0, 76.0, None)).unwrap();
        session.ingest(&sample(10.1, 76.0, None)).unwrap();
        assert!(session.distance_km() > 11.0);
        session.end(t0()).unwrap();

        session.start(details(), t0() + Duration::hours(1)).unwrap();
        assert_eq!(session.distance_km(), 0.0);
        assert_eq!(session.duration_ticks(), 0);
        // The first sample of the new session is a fresh baseline.
        assert_eq!(session.ingest(&sample(20.0, 80.0, None)).unwrap(), 0.0);
    }

    #[test]
    fn end_without_samples_gives_empty_path() {
        let mut session = TripSession::new();
        session.start(details(), t0()).unwrap();
        let trip = session.end(t0() + Duration::seconds(30)).unwrap();
        assert!(trip.is_completed());
        assert!(trip.path.as_ref().is_some_and(TrackedPath::is_empty));
        assert_eq!(trip.end_time, Some(t0() + Duration::seconds(30)));
        assert!(!session.is_active());
    }

    #[test]
    fn speed_is_zero_without_speed_field() {
        let mut session = TripSession::new();
        session.start(details(), t0()).unwrap();
        for i in 0..5 {
            session.ingest(&sample(10.0 + i as f64 * 0.001, 76.0, None)).unwrap();
            assert_eq!(session.speed_kmh(), 0.0);
        }
    }

    #[test]
    fn speed_follows_latest_sample() {
        let mut session = TripSession::new();
        session.start(details(), t0()).unwrap();
        session.ingest(&sample(10.0, 76.0, Some(5.0))).unwrap();
        assert!((session.speed_kmh() - 18.0).abs() < 1e-9);
        session.ingest(&sample(10.0, 76.0, None)).unwrap();
        assert_eq!(session.speed_kmh(), 0.0);
    }

    #[test]
    fn ticks_count_duration() {
        let mut session = TripSession::new();
        session.start(details(), t0()).unwrap();
        for _ in 0..3 {
            session.tick().unwrap();
        }
        assert_eq!(session.duration_ticks(), 3);
        session.end(t0()).unwrap();
        assert_eq!(session.duration_ticks(), 0);
    }

    #[test]
    fn trip_id_is_start_instant() {
        let mut session = TripSession::new();
        let trip = session.start(details(), t0()).unwrap();
        assert_eq!(trip.id, "2024-05-01T08:00:00.000Z");
        assert!(!trip.is_completed());
    }

    #[test]
    fn restarts_within_a_millisecond_get_distinct_ids() {
        let mut session = TripSession::new();
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(session.start(details(), t0()).unwrap().id.clone());
            session.end(t0()).unwrap();
        }
        assert_eq!(ids, ["2024-05-01T08:00:00.000Z", "2024-05-01T08:00:00.001Z", "2024-05-01T08:00:00.002Z"]);

        // A later clock reading is used as is.
        let later = t0() + Duration::seconds(5) + Duration::microseconds(1_500);
        assert_eq!(session.start(details(), later).unwrap().id, "2024-05-01T08:00:05.001Z");
    }
}
