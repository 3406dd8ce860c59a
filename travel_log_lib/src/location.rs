use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::track_point::PositionSample;

/// Failures reported by a position source. The display text is what the
/// user sees; tracking continues with whatever samples still arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationError {
    #[error("Location access was denied.")]
    PermissionDenied,
    #[error("Location information is unavailable.")]
    PositionUnavailable,
    #[error("The request to get user location timed out.")]
    Timeout,
    #[error("Geolocation is not supported by your browser.")]
    Unsupported,
    #[error("Location tracking is disabled in settings.")]
    Disabled,
    #[error("An unknown error occurred.")]
    Unknown,
}

/// What a position source emits. Errors do not end the subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SourceEvent {
    Sample(PositionSample),
    Error { code: LocationError },
}

impl From<PositionSample> for SourceEvent {
    fn from(sample: PositionSample) -> Self {
        SourceEvent::Sample(sample)
    }
}

impl From<LocationError> for SourceEvent {
    fn from(code: LocationError) -> Self {
        SourceEvent::Error { code }
    }
}
