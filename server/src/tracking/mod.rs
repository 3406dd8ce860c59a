pub mod source;
mod actor;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::{sync::{mpsc, oneshot, watch}, task::JoinHandle};
use travel_log_data_management::{DataManager, DataManagerError};
use travel_log_lib::{stats::format_clock, LocationError, PathPoint, PositionSample, SessionError, Trip, TripDetails};

use actor::{Tracker, TrackerCommand};
pub use source::{ChannelSource, PositionSource, SampleSink, Subscription};

#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    pub tick_period: Duration,
    pub channel_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            channel_capacity: 64,
        }
    }
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("the tracker has stopped")]
    Stopped,
}

/// Where finished trips go. Failing here does not keep a session alive.
#[async_trait]
pub trait TripArchiveSink: Send + Sync {
    async fn archive_trip(&self, trip: Trip) -> Result<(), DataManagerError>;
}

#[async_trait]
impl TripArchiveSink for DataManager {
    async fn archive_trip(&self, trip: Trip) -> Result<(), DataManagerError> {
        DataManager::archive_trip(self, trip).await
    }
}

/// Snapshot of the session as the dashboard shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveMetrics {
    pub active: bool,
    pub trip_id: Option<String>,
    pub trip: Option<Trip>,
    pub distance_km: f64,
    pub speed_kmh: f64,
    pub duration_secs: u64,
    pub duration: String,
    pub position: Option<PathPoint>,
    pub path_length: usize,
    pub error: Option<LocationError>,
    pub error_message: Option<String>,
}

impl Default for LiveMetrics {
    fn default() -> Self {
        Self {
            active: false,
            trip_id: None,
            trip: None,
            distance_km: 0.0,
            speed_kmh: 0.0,
            duration_secs: 0,
            duration: format_clock(0),
            position: None,
            path_length: 0,
            error: None,
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndReport {
    pub trip: Trip,
    pub archive_error: Option<String>,
}

/// Cheap to clone. The tracker task stops once every handle is dropped.
#[derive(Clone)]
pub struct TrackerHandle {
    commands: mpsc::Sender<TrackerCommand>,
    metrics: watch::Receiver<LiveMetrics>,
}

impl TrackerHandle {
    pub async fn start(&self, details: TripDetails, location_enabled: bool) -> Result<Trip, TrackerError> {
        self.request(|reply| TrackerCommand::Start { details, location_enabled, reply }).await
    }

    pub async fn end(&self) -> Result<EndReport, TrackerError> {
        self.request(|reply| TrackerCommand::End { reply }).await
    }

    /// Feeds a sample directly, bypassing the position source.
    pub async fn ingest(&self, sample: PositionSample) -> Result<f64, TrackerError> {
        self.request(|reply| TrackerCommand::Ingest { sample, reply }).await
    }

    /// Points recorded so far in the active session, empty when idle.
    pub async fn path(&self) -> Result<Vec<PathPoint>, TrackerError> {
        let (reply, response) = oneshot::channel();
        self.commands.send(TrackerCommand::Path { reply }).await.map_err(|_| TrackerError::Stopped)?;
        response.await.map_err(|_| TrackerError::Stopped)
    }

    pub fn metrics(&self) -> LiveMetrics {
        self.metrics.borrow().clone()
    }

    pub fn subscribe_metrics(&self) -> watch::Receiver<LiveMetrics> {
        self.metrics.clone()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<Result<T, TrackerError>>) -> TrackerCommand,
    ) -> Result<T, TrackerError> {
        let (reply, response) = oneshot::channel();
        self.commands.send(command(reply)).await.map_err(|_| TrackerError::Stopped)?;
        response.await.map_err(|_| TrackerError::Stopped)?
    }
}

/// Spawns the task that owns the trip session. All commands, source events
/// and clock ticks are handled there one at a time.
pub fn spawn_tracker(
    config: TrackerConfig,
    source: Arc<dyn PositionSource>,
    archive: Arc<dyn TripArchiveSink>,
) -> (TrackerHandle, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::channel(config.channel_capacity);
    let (source_tx, source_rx) = mpsc::channel(config.channel_capacity);
    let (metrics_tx, metrics_rx) = watch::channel(LiveMetrics::default());

    let tracker = Tracker::new(config, source, archive, source_tx, metrics_tx);
    let join = tokio::spawn(tracker.run(command_rx, source_rx));

    (TrackerHandle { commands: command_tx, metrics: metrics_rx }, join)
}
