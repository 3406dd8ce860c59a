use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc;
use travel_log_lib::{LocationError, SourceEvent};

/// An event tagged with the subscription it was delivered through.
#[derive(Debug)]
pub(crate) struct SourceMessage {
    pub subscription_id: u64,
    pub event: SourceEvent,
}

#[derive(Debug, Error)]
#[error("the tracker is no longer listening")]
pub struct SinkClosed;

/// Where a position source delivers its events for one subscription.
#[derive(Debug, Clone)]
pub struct SampleSink {
    subscription_id: u64,
    tx: mpsc::Sender<SourceMessage>,
}

impl SampleSink {
    pub(crate) fn new(subscription_id: u64, tx: mpsc::Sender<SourceMessage>) -> Self {
        Self { subscription_id, tx }
    }

    pub fn subscription_id(&self) -> u64 {
        self.subscription_id
    }

    /// Waits for room in the tracker's queue, so a fast source is slowed down
    /// rather than dropping samples.
    pub async fn send(&self, event: SourceEvent) -> Result<(), SinkClosed> {
        self.tx.send(SourceMessage { subscription_id: self.subscription_id, event }).await
            .map_err(|_| SinkClosed)
    }
}

/// Handle for a live subscription. Cancelling or dropping it detaches the sink.
pub struct Subscription {
    id: u64,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(id: u64, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subscription {{ id: {} }}", self.id)
    }
}

/// A stream of device positions. Errors are delivered as events and do not
/// end the subscription.
pub trait PositionSource: Send + Sync {
    fn subscribe(&self, sink: SampleSink) -> Result<Subscription, LocationError>;

    fn unsubscribe(&self, subscription: Subscription) {
        subscription.cancel();
    }
}

/// In-process source fed by whoever calls [`ChannelSource::publish`], e.g. the
/// device feed listener or the HTTP position endpoint. Holds at most one sink.
#[derive(Clone, Default)]
pub struct ChannelSource {
    sink: Arc<Mutex<Option<SampleSink>>>,
}

impl ChannelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forwards an event to the current subscriber. Returns `false` if nobody
    /// is listening, in which case the event is dropped.
    pub async fn publish(&self, event: SourceEvent) -> bool {
        let sink = self.sink.lock().ok().and_then(|slot| slot.clone());

        let Some(sink) = sink else {
            tracing::debug!("No subscriber, dropping {:?}", event);
            return false;
        };

        sink.send(event).await.is_ok()
    }

    pub fn is_subscribed(&self) -> bool {
        self.sink.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

impl PositionSource for ChannelSource {
    fn subscribe(&self, sink: SampleSink) -> Result<Subscription, LocationError> {
        let id = sink.subscription_id();
        let mut slot = self.sink.lock().map_err(|_| LocationError::Unknown)?;
        if let Some(previous) = slot.replace(sink) {
            tracing::warn!("Subscription {} replaced by {}", previous.subscription_id(), id);
        }

        let shared = self.sink.clone();
        Ok(Subscription::new(id, move || {
            if let Ok(mut slot) = shared.lock() {
                if slot.as_ref().is_some_and(|sink| sink.subscription_id() == id) {
                    *slot = None;
                }
            }
        }))
    }
}
