use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::track_session::TrackedPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportMode {
    Car,
    Bus,
    Train,
    Bicycle,
    Walk,
    #[serde(rename = "Auto Rickshaw")]
    AutoRickshaw,
    Other,
}

impl TransportMode {
    pub const ALL: [TransportMode; 7] = [
        TransportMode::Car,
        TransportMode::Bus,
        TransportMode::Train,
        TransportMode::Bicycle,
        TransportMode::Walk,
        TransportMode::AutoRickshaw,
        TransportMode::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TransportMode::Car => "Car",
            TransportMode::Bus => "Bus",
            TransportMode::Train => "Train",
            TransportMode::Bicycle => "Bicycle",
            TransportMode::Walk => "Walk",
            TransportMode::AutoRickshaw => "Auto Rickshaw",
            TransportMode::Other => "Other",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The user-entered part of a trip. Validation happens before it gets here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetails {
    pub origin: String,
    pub destination: String,
    pub date_time: DateTime<Utc>,
    pub mode: TransportMode,
    pub activity: String,
    pub accompanying: u32,
}

/// A trip record. `path` and `end_time` are both present exactly when the
/// trip has finished its session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    #[serde(flatten)]
    pub details: TripDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<TrackedPath>,
}

impl Trip {
    /// A new in-progress trip keyed by its start instant.
    pub fn start(details: TripDetails, started_at: DateTime<Utc>) -> Self {
        Self {
            id: trip_id(started_at),
            details,
            end_time: None,
            path: None,
        }
    }

    pub(crate) fn complete(self, path: TrackedPath, end_time: DateTime<Utc>) -> Self {
        Self {
            end_time: Some(end_time),
            path: Some(path),
            ..self
        }
    }

    pub fn is_completed(&self) -> bool {
        self.end_time.is_some() && self.path.is_some()
    }

    /// Plain text summary for sharing outside the app.
    pub fn share_summary(&self) -> ShareSummary {
        let details = &self.details;
        ShareSummary {
            title: format!("My trip to {}", details.destination),
            text: format!(
                "Check out my trip!\n\nFrom: {}\nTo: {}\nActivity: {}\nTransport: {}\nDate: {}",
                details.origin,
                details.destination,
                details.activity,
                details.mode,
                details.date_time.format("%A, %-d %B %Y"),
            ),
        }
    }

    /// Route geometry, empty for active trips and for trips with no samples.
    pub fn path_points(&self) -> &[crate::PathPoint] {
        self.path.as_ref().map(|path| path.points()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareSummary {
    pub title: String,
    pub text: String,
}

/// Sortable id derived from the start instant, e.g. `2024-05-01T10:00:00.000Z`.
pub fn trip_id(started_at: DateTime<Utc>) -> String {
    started_at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
