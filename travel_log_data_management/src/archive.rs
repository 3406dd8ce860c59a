use std::sync::Arc;

use tokio::sync::Mutex;
use travel_log_lib::{Trip, TripDetails};

use crate::{
    database::constants::TRIPS_KEY,
    store::{read_json, write_json, KeyValueStore},
    DataManagerError,
};

/// Completed trips, newest first, stored as one JSON array.
///
/// Every read-modify-write holds `write_lock` so concurrent edits cannot drop
/// each other's changes.
#[derive(Clone)]
pub struct TripArchive {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl TripArchive {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> Result<Vec<Trip>, DataManagerError> {
        read_json(self.store.as_ref(), TRIPS_KEY).await
    }

    pub async fn get(&self, trip_id: &str) -> Result<Trip, DataManagerError> {
        self.list().await?
            .into_iter()
            .find(|trip| trip.id == trip_id)
            .ok_or_else(|| DataManagerError::NotFound(format!("trip {trip_id}")))
    }

    /// Stores a trip that has finished its session.
    pub async fn archive(&self, trip: Trip) -> Result<(), DataManagerError> {
        if !trip.is_completed() {
            return Err(DataManagerError::InvalidTrip(trip.id));
        }

        let _guard = self.write_lock.lock().await;
        let mut trips = self.list().await?;
        if trips.iter().any(|archived| archived.id == trip.id) {
            tracing::warn!("Trip {} is already archived", trip.id);
            return Err(DataManagerError::DuplicateTrip(trip.id));
        }
        tracing::info!("Archiving trip {} with {} path points", trip.id, trip.path_points().len());
        trips.insert(0, trip);
        write_json(self.store.as_ref(), TRIPS_KEY, &trips).await
    }

    /// Replaces the user-entered fields. Path and end time stay as recorded.
    pub async fn update_details(&self, trip_id: &str, details: TripDetails) -> Result<Trip, DataManagerError> {
        let _guard = self.write_lock.lock().await;
        let mut trips = self.list().await?;

        let trip = trips.iter_mut()
            .find(|trip| trip.id == trip_id)
            .ok_or_else(|| DataManagerError::NotFound(format!("trip {trip_id}")))?;
        trip.details = details;
        let updated = trip.clone();

        write_json(self.store.as_ref(), TRIPS_KEY, &trips).await?;
        Ok(updated)
    }

    pub async fn delete(&self, trip_id: &str) -> Result<(), DataManagerError> {
        let _guard = self.write_lock.lock().await;
        let mut trips = self.list().await?;

        let before = trips.len();
        trips.retain(|trip| trip.id != trip_id);
        if trips.len() == before {
            return Err(DataManagerError::NotFound(format!("trip {trip_id}")));
        }

        write_json(self.store.as_ref(), TRIPS_KEY, &trips).await
    }
}
