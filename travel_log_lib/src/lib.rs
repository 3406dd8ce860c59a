pub mod track_point;
pub mod haversine;
pub mod distance;
pub mod speed;
pub mod location;
pub mod trip;
pub mod track_session;
pub mod stats;
pub mod checklist;
pub mod settings;

pub use distance::DistanceAccumulator;
pub use location::{LocationError, SourceEvent};
pub use track_point::{PathPoint, PositionSample};
pub use track_session::{SessionError, TrackedPath, TripSession};
pub use trip::{ShareSummary, TransportMode, Trip, TripDetails};

/// Random hex identifier used for checklists, checklist items and contacts.
pub fn random_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes)
}
