use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use travel_log_data_management::DataManagerError;
use travel_log_lib::SessionError;

use crate::tracking::TrackerError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<DataManagerError> for ApiError {
    fn from(err: DataManagerError) -> Self {
        match err {
            DataManagerError::NotFound(_) => Self::not_found(err.to_string()),
            DataManagerError::InvalidTrip(_) | DataManagerError::Gpx(_) => Self::bad_request(err.to_string()),
            DataManagerError::DuplicateTrip(_) => Self::new(StatusCode::CONFLICT, err.to_string()),
            _ => {
                tracing::error!("Data management failed: {err}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            },
        }
    }
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Session(SessionError::NotActive | SessionError::AlreadyActive) => {
                Self::new(StatusCode::CONFLICT, err.to_string())
            },
            TrackerError::Stopped => {
                tracing::error!("Tracker is not running");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            },
        }
    }
}
