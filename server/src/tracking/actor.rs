use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Instant, Interval, MissedTickBehavior},
};
use travel_log_lib::{stats::format_clock, LocationError, PathPoint, PositionSample, SourceEvent, Trip, TripDetails, TripSession};

use super::{
    source::{SampleSink, SourceMessage, Subscription},
    EndReport, LiveMetrics, PositionSource, TrackerConfig, TrackerError, TripArchiveSink,
};

pub(crate) enum TrackerCommand {
    Start {
        details: TripDetails,
        location_enabled: bool,
        reply: oneshot::Sender<Result<Trip, TrackerError>>,
    },
    End {
        reply: oneshot::Sender<Result<EndReport, TrackerError>>,
    },
    Ingest {
        sample: PositionSample,
        reply: oneshot::Sender<Result<f64, TrackerError>>,
    },
    Path {
        reply: oneshot::Sender<Vec<PathPoint>>,
    },
}

pub(crate) struct Tracker {
    session: TripSession,
    tick_period: Duration,
    ticker: Option<Interval>,

    source: Arc<dyn PositionSource>,
    source_tx: mpsc::Sender<SourceMessage>,
    subscription: Option<Subscription>,
    next_subscription_id: u64,
    location_error: Option<LocationError>,

    archive: Arc<dyn TripArchiveSink>,
    metrics: watch::Sender<LiveMetrics>,
}

impl Tracker {
    pub(crate) fn new(
        config: TrackerConfig,
        source: Arc<dyn PositionSource>,
        archive: Arc<dyn TripArchiveSink>,
        source_tx: mpsc::Sender<SourceMessage>,
        metrics: watch::Sender<LiveMetrics>,
    ) -> Self {
        Self {
            session: TripSession::new(),
            tick_period: config.tick_period,
            ticker: None,
            source,
            source_tx,
            subscription: None,
            next_subscription_id: 0,
            location_error: None,
            archive,
            metrics,
        }
    }

    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::Receiver<TrackerCommand>,
        mut source_events: mpsc::Receiver<SourceMessage>,
    ) {
        tracing::info!("Tracker running");

        loop {
            // Queued source events go first, so an End sees every sample that
            // arrived before it.
            tokio::select! {
                biased;

                Some(message) = source_events.recv() => {
                    self.handle_source(message);
                    self.publish();
                },
                _ = next_tick(&mut self.ticker), if self.ticker.is_some() => {
                    self.handle_tick();
                    self.publish();
                },
                command = commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    self.handle_command(command).await;
                },
            }
        }

        self.unsubscribe();
        tracing::info!("Tracker stopped");
    }

    /// Metrics are published before replying, so a caller never reads a
    /// snapshot older than its own command.
    async fn handle_command(&mut self, command: TrackerCommand) {
        match command {
            TrackerCommand::Start { details, location_enabled, reply } => {
                let result = self.start(details, location_enabled);
                self.publish();
                let _ = reply.send(result);
            },
            TrackerCommand::End { reply } => {
                let result = self.end().await;
                self.publish();
                let _ = reply.send(result);
            },
            TrackerCommand::Ingest { sample, reply } => {
                let result = self.session.ingest(&sample).map_err(TrackerError::from);
                self.publish();
                let _ = reply.send(result);
            },
            TrackerCommand::Path { reply } => {
                let _ = reply.send(self.session.path().to_vec());
            },
        }
    }

    fn start(&mut self, details: TripDetails, location_enabled: bool) -> Result<Trip, TrackerError> {
        let trip = self.session.start(details, Utc::now()).cloned().inspect_err(|err| {
            tracing::warn!("Refusing to start trip: {err}");
        })?;
        tracing::info!("Started trip {}", trip.id);

        self.location_error = None;
        let mut ticker = tokio::time::interval_at(Instant::now() + self.tick_period, self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);

        if location_enabled {
            self.subscribe();
        } else {
            tracing::info!("Location disabled, waiting for manual samples");
            self.location_error = Some(LocationError::Disabled);
        }

        Ok(trip)
    }

    async fn end(&mut self) -> Result<EndReport, TrackerError> {
        let trip = self.session.end(Utc::now())?;
        self.unsubscribe();
        self.ticker = None;
        self.location_error = None;

        tracing::info!("Ended trip {} with {} points", trip.id, trip.path_points().len());

        let archive_error = match self.archive.archive_trip(trip.clone()).await {
            Ok(()) => None,
            Err(err) => {
                tracing::error!("Failed to archive trip {}: {err}", trip.id);
                Some(err.to_string())
            },
        };

        Ok(EndReport { trip, archive_error })
    }

    fn handle_source(&mut self, message: SourceMessage) {
        if self.subscription.as_ref().map(Subscription::id) != Some(message.subscription_id) {
            tracing::debug!("Dropping event from stale subscription {}", message.subscription_id);
            return;
        }

        match message.event {
            SourceEvent::Sample(sample) => match self.session.ingest(&sample) {
                Ok(_) => self.location_error = None,
                Err(err) => tracing::warn!("Dropping sample: {err}"),
            },
            SourceEvent::Error { code } => {
                tracing::warn!("Position source error: {code}");
                self.location_error = Some(code);
            },
        }
    }

    fn handle_tick(&mut self) {
        if let Err(err) = self.session.tick() {
            tracing::warn!("Tick without active session: {err}");
            self.ticker = None;
        }
    }

    fn subscribe(&mut self) {
        self.unsubscribe();
        self.next_subscription_id += 1;

        let sink = SampleSink::new(self.next_subscription_id, self.source_tx.clone());
        match self.source.subscribe(sink) {
            Ok(subscription) => {
                tracing::debug!("Subscribed to position source as {}", subscription.id());
                self.subscription = Some(subscription);
            },
            Err(err) => {
                tracing::warn!("Failed to subscribe to position source: {err}");
                self.location_error = Some(err);
            },
        }
    }

    fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            tracing::debug!("Unsubscribing {}", subscription.id());
            self.source.unsubscribe(subscription);
        }
    }

    fn publish(&self) {
        let elapsed = elapsed_secs(self.tick_period, self.session.duration_ticks());

        self.metrics.send_replace(LiveMetrics {
            active: self.session.is_active(),
            trip_id: self.session.active_trip().map(|trip| trip.id.clone()),
            trip: self.session.active_trip().cloned(),
            distance_km: self.session.distance_km(),
            speed_kmh: self.session.speed_kmh(),
            duration_secs: elapsed,
            duration: format_clock(elapsed),
            position: self.session.last_position(),
            path_length: self.session.path().len(),
            error: self.location_error,
            error_message: self.location_error.map(|err| err.to_string()),
        });
    }
}

/// Whole seconds covered by `ticks` periods, saturating instead of wrapping.
fn elapsed_secs(tick_period: Duration, ticks: u64) -> u64 {
    let millis = tick_period.as_millis().saturating_mul(u128::from(ticks));
    u64::try_from(millis / 1000).unwrap_or(u64::MAX)
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        },
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_follows_tick_count() {
        assert_eq!(elapsed_secs(Duration::from_secs(1), 0), 0);
        assert_eq!(elapsed_secs(Duration::from_secs(1), 3), 3);
        assert_eq!(elapsed_secs(Duration::from_millis(250), 10), 2);
    }

    #[test]
    fn elapsed_does_not_wrap_past_u32_ticks() {
        let ticks = u64::from(u32::MAX) + 1000;
        assert_eq!(elapsed_secs(Duration::from_secs(1), ticks), ticks);
        assert_eq!(elapsed_secs(Duration::from_millis(1), ticks), ticks / 1000);
        assert_eq!(elapsed_secs(Duration::from_secs(u64::MAX), u64::MAX), u64::MAX);
    }
}
