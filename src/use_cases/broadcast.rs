// Per-tick snapshot fan-out and per-subscriber delivery workers.

use super::subscribers::{FanOutStats, SubscriberId, SubscriberRegistry};
use crate::domain::WorldSnapshot;
use futures::{Sink, SinkExt};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Port for turning a world snapshot into a transport frame.
pub trait SnapshotEncoder: Send + Sync {
    type Frame: Clone + Send + 'static;
    type Error: Debug;

    fn encode(&self, snapshot: &WorldSnapshot) -> Result<Self::Frame, Self::Error>;
}

/// Encodes each snapshot once and offers it to every registered subscriber.
pub struct Broadcaster<E: SnapshotEncoder> {
    registry: Arc<SubscriberRegistry<E::Frame>>,
    encoder: E,
}

impl<E: SnapshotEncoder> Broadcaster<E> {
    pub fn new(registry: Arc<SubscriberRegistry<E::Frame>>, encoder: E) -> Self {
        Self { registry, encoder }
    }

    /// Publishes one snapshot. Never waits on a subscriber's transport.
    pub async fn publish(&self, snapshot: &WorldSnapshot) -> FanOutStats {
        if self.registry.is_empty().await {
            return FanOutStats::default();
        }

        let frame = match self.encoder.encode(snapshot) {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = ?e, tick = snapshot.tick, "failed to encode world snapshot");
                return FanOutStats::default();
            }
        };

        let stats = self.registry.fan_out(frame).await;
        if stats.dropped > 0 {
            debug!(
                tick = snapshot.tick,
                dropped = stats.dropped,
                "subscriber queues full; frame skipped"
            );
        }
        stats
    }
}

/// How a delivery worker finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    // Every queue sender was dropped and the queue was drained.
    Drained,
    // The transport rejected a write; the subscriber was unregistered.
    TransportFailed,
    // Stopped through `cancel` before the queue was drained.
    Cancelled,
}

/// Drains one subscriber's queue into its transport, in order.
///
/// On a write failure the subscriber is removed from `registry` and `shutdown` is signalled
/// so the connection's reader stops too. A signal on `cancel` stops the worker at once, even
/// while a write is pending on a transport that no longer makes progress.
pub async fn deliver<F, S>(
    subscriber_id: SubscriberId,
    mut queue: mpsc::Receiver<F>,
    mut sink: S,
    registry: Arc<SubscriberRegistry<F>>,
    shutdown: Arc<Notify>,
    cancel: Arc<Notify>,
) -> DeliveryOutcome
where
    S: Sink<F> + Unpin,
    S::Error: Debug,
{
    loop {
        let next = tokio::select! {
            _ = cancel.notified() => return cancelled(subscriber_id, &registry).await,
            next = queue.recv() => next,
        };
        let Some(frame) = next else {
            break;
        };

        let sent = tokio::select! {
            _ = cancel.notified() => return cancelled(subscriber_id, &registry).await,
            sent = sink.send(frame) => sent,
        };
        if let Err(e) = sent {
            warn!(subscriber_id, error = ?e, "delivery failed; dropping subscriber");
            if registry.remove(subscriber_id).await.is_some() {
                debug!(subscriber_id, "subscriber unregistered by delivery worker");
            }
            shutdown.notify_one();
            return DeliveryOutcome::TransportFailed;
        }
    }

    let closed = tokio::select! {
        _ = cancel.notified() => return cancelled(subscriber_id, &registry).await,
        closed = sink.close() => closed,
    };
    if let Err(e) = closed {
        debug!(subscriber_id, error = ?e, "transport close error");
    }
    DeliveryOutcome::Drained
}

async fn cancelled<F>(
    subscriber_id: SubscriberId,
    registry: &SubscriberRegistry<F>,
) -> DeliveryOutcome {
    if registry.remove(subscriber_id).await.is_some() {
        debug!(subscriber_id, "subscriber unregistered on cancellation");
    }
    debug!(subscriber_id, "delivery cancelled");
    DeliveryOutcome::Cancelled
}

/// Waits up to `grace` for a delivery worker to finish on its own, then cancels it.
///
/// Callers drop their queue senders first so a healthy worker can flush and exit.
pub async fn finish_delivery(
    mut worker: JoinHandle<DeliveryOutcome>,
    cancel: &Notify,
    grace: Duration,
) -> Option<DeliveryOutcome> {
    if let Ok(joined) = tokio::time::timeout(grace, &mut worker).await {
        return joined.ok();
    }

    cancel.notify_one();
    match tokio::time::timeout(grace, &mut worker).await {
        Ok(joined) => joined.ok(),
        Err(_) => {
            warn!("delivery worker ignored cancellation; aborting");
            worker.abort();
            None
        }
    }
}
