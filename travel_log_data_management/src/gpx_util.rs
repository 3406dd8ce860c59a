use std::{
    io::{BufReader, Read, Write},
    time::SystemTime,
};

use geo_types::Point;
use gpx::{Gpx, GpxVersion, Time, Track, TrackSegment, Waypoint};
use time::OffsetDateTime;
use travel_log_lib::{PathPoint, TrackedPath, Trip};

use crate::{DataManager, DataManagerError};

impl DataManager {
    pub async fn export_gpx<W: Write>(&self, trip_id: &str, writer: W) -> Result<(), DataManagerError> {
        let trip = self.get_trip(trip_id).await?;
        write_gpx(&trip_to_gpx(&trip), writer)
    }
}

/// One track with one segment holding the trip's path.
pub fn trip_to_gpx(trip: &Trip) -> Gpx {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("travel_log".into()),
        ..Default::default()
    };

    let start_time: SystemTime = trip.details.date_time.into();
    let start_time: OffsetDateTime = start_time.into();
    gpx.metadata = Some(gpx::Metadata {
        name: Some(format!("{} → {}", trip.details.origin, trip.details.destination)),
        description: Some(format!("{}, {}", trip.details.mode, trip.details.activity)),
        time: Some(Time::from(start_time)),
        ..Default::default()
    });

    let mut track = Track::new();
    track.name = Some(trip.id.clone());
    let mut segment = TrackSegment::new();

    segment.points.extend(trip.path_points().iter().map(|point| Waypoint::new(Point::new(point.lng, point.lat))));

    track.segments.push(segment);
    gpx.tracks.push(track);
    gpx
}

pub fn write_gpx<W: Write>(gpx: &Gpx, writer: W) -> Result<(), DataManagerError> {
    gpx::write(gpx, writer).map_err(|err| DataManagerError::Gpx(format!("Failed to write gpx: {err}")))
}

/// All track points of a GPX document, in file order.
pub fn read_gpx_path<R: Read>(reader: R) -> Result<TrackedPath, DataManagerError> {
    let gpx = gpx::read(BufReader::new(reader)).map_err(|err| DataManagerError::Gpx(format!("Failed to read gpx: {err}")))?;

    let points = gpx.tracks.iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter())
        .map(|waypoint| PathPoint::from(waypoint.point().0))
        .collect();

    Ok(TrackedPath::from_points(points))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use travel_log_lib::{PositionSample, TransportMode, TripDetails, TripSession};

    use super::*;
    use crate::MemoryStore;

    fn trip_with_path(points: &[(f64, f64)]) -> Trip {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 6, 0, 0).unwrap();
        let mut session = TripSession::new();
        session.start(TripDetails {
            origin: "Munnar".into(),
            destination: "Top Station".into(),
            date_time: start,
            mode: TransportMode::Car,
            activity: "Sightseeing".into(),
            accompanying: 3,
        }, start).unwrap();
        for (lat, lng) in points {
            session.ingest(&PositionSample::new(*lat, *lng, None, start)).unwrap();
        }
        session.end(start + Duration::hours(1)).unwrap()
    }

    #[test]
    fn exported_track_reads_back() {
        let trip = trip_with_path(&[(10.08, 77.06), (10.10, 77.10), (10.12, 77.16)]);
        let mut buf = Vec::new();
        write_gpx(&trip_to_gpx(&trip), &mut buf).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("Munnar → Top Station"));

        let path = read_gpx_path(buf.as_slice()).unwrap();
        assert_eq!(path.len(), 3);
        let first = path.first().unwrap();
        assert!((first.lat - 10.08).abs() < 1e-9);
        assert!((first.lng - 77.06).abs() < 1e-9);
    }

    #[test]
    fn empty_path_exports_empty_segment() {
        let trip = trip_with_path(&[]);
        let gpx = trip_to_gpx(&trip);
        assert!(gpx.tracks[0].segments[0].points.is_empty());
    }

    #[test]
    fn garbage_is_a_gpx_error() {
        assert!(matches!(read_gpx_path("not xml".as_bytes()), Err(DataManagerError::Gpx(_))));
    }

    #[tokio::test]
    async fn export_unknown_trip() {
        let manager = DataManager::with_store(Arc::new(MemoryStore::new()));
        let result = manager.export_gpx("missing", Vec::new()).await;
        assert!(matches!(result, Err(DataManagerError::NotFound(_))));
    }
}
