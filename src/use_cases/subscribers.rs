// Registry of live subscribers and their bounded delivery queues.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

pub type SubscriberId = u64;

/// A connected consumer of per-tick frames.
#[derive(Debug)]
pub struct Subscriber<F> {
    pub id: SubscriberId,
    /// Faction this subscriber commands.
    pub faction: Arc<str>,
    queue: mpsc::Sender<F>,
}

impl<F> Subscriber<F> {
    /// Creates a subscriber and the receiving half of its delivery queue.
    pub fn new(
        id: SubscriberId,
        faction: Arc<str>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<F>) {
        // mpsc panics on zero capacity.
        let (queue, rx) = mpsc::channel(capacity.max(1));
        (Self { id, faction, queue }, rx)
    }

    /// Extra handle onto the same queue, for replies addressed to this subscriber only.
    pub fn sender(&self) -> mpsc::Sender<F> {
        self.queue.clone()
    }
}

/// Per-call fan-out counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOutStats {
    pub delivered: usize,
    // Queue was full; this frame is skipped for that subscriber.
    pub dropped: usize,
    // Queue receiver is gone; the subscriber was pruned.
    pub closed: usize,
}

/// Thread-safe set of subscribers.
///
/// Fan-out only holds the read lock and never awaits a subscriber, so add/remove wait at
/// most for one pass of non-blocking enqueues.
#[derive(Debug)]
pub struct SubscriberRegistry<F> {
    subscribers: RwLock<Vec<Subscriber<F>>>,
    next_id: AtomicU64,
}

impl<F> Default for SubscriberRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> SubscriberRegistry<F> {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns a process-unique subscriber id.
    pub fn next_id(&self) -> SubscriberId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Appends a subscriber. Returns false (and drops it) if the id is already registered.
    pub async fn add(&self, subscriber: Subscriber<F>) -> bool {
        let mut subscribers = self.subscribers.write().await;
        if subscribers.iter().any(|s| s.id == subscriber.id) {
            return false;
        }
        subscribers.push(subscriber);
        true
    }

    /// Removes a subscriber by id.
    ///
    /// Only the first caller for a given id gets `Some`, so racing teardown paths can use
    /// the result to run their cleanup exactly once.
    pub async fn remove(&self, id: SubscriberId) -> Option<Subscriber<F>> {
        let mut subscribers = self.subscribers.write().await;
        let index = subscribers.iter().position(|s| s.id == id)?;
        Some(subscribers.remove(index))
    }

    pub async fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.read().await.iter().any(|s| s.id == id)
    }

    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subscribers.read().await.is_empty()
    }
}

impl<F: Clone> SubscriberRegistry<F> {
    /// Offers `frame` to every subscriber without waiting on any of them.
    pub async fn fan_out(&self, frame: F) -> FanOutStats {
        let mut stats = FanOutStats::default();
        let mut closed = Vec::new();

        {
            let subscribers = self.subscribers.read().await;
            for subscriber in subscribers.iter() {
                match subscriber.queue.try_send(frame.clone()) {
                    Ok(()) => stats.delivered += 1,
                    Err(TrySendError::Full(_)) => stats.dropped += 1,
                    Err(TrySendError::Closed(_)) => closed.push(subscriber.id),
                }
            }
        }

        for id in closed {
            if self.remove(id).await.is_some() {
                stats.closed += 1;
                debug!(subscriber_id = id, "pruned subscriber with closed queue");
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn subscriber(
        registry: &SubscriberRegistry<u32>,
        capacity: usize,
    ) -> (Subscriber<u32>, mpsc::Receiver<u32>) {
        Subscriber::new(registry.next_id(), Arc::from("USA"), capacity)
    }

    #[tokio::test]
    async fn when_registry_is_empty_then_fan_out_delivers_nothing() {
        let registry = SubscriberRegistry::<u32>::new();

        let stats = registry.fan_out(7).await;

        assert_eq!(stats, FanOutStats::default());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn when_subscribers_are_registered_then_each_receives_the_frame() {
        let registry = SubscriberRegistry::new();
        let (a, mut a_rx) = subscriber(&registry, 4);
        let (b, mut b_rx) = subscriber(&registry, 4);
        assert!(registry.add(a).await);
        assert!(registry.add(b).await);

        let stats = registry.fan_out(9).await;

        assert_eq!(stats.delivered, 2);
        assert_eq!(a_rx.recv().await, Some(9));
        assert_eq!(b_rx.recv().await, Some(9));
    }

    #[tokio::test]
    async fn when_queue_is_full_then_frame_is_dropped_for_that_subscriber_only() {
        let registry = SubscriberRegistry::new();
        let (slow, mut slow_rx) = subscriber(&registry, 1);
        let (fast, mut fast_rx) = subscriber(&registry, 8);
        registry.add(slow).await;
        registry.add(fast).await;

        registry.fan_out(1).await;
        let stats = registry.fan_out(2).await;

        assert_eq!(stats, FanOutStats { delivered: 1, dropped: 1, closed: 0 });
        assert_eq!(slow_rx.recv().await, Some(1));
        assert!(slow_rx.try_recv().is_err());
        assert_eq!(fast_rx.recv().await, Some(1));
        assert_eq!(fast_rx.recv().await, Some(2));
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn when_queue_receiver_is_dropped_then_subscriber_is_pruned() {
        let registry = SubscriberRegistry::new();
        let (gone, gone_rx) = subscriber(&registry, 1);
        let gone_id = gone.id;
        registry.add(gone).await;
        drop(gone_rx);

        let stats = registry.fan_out(1).await;

        assert_eq!(stats.closed, 1);
        assert!(!registry.contains(gone_id).await);
    }

    #[tokio::test]
    async fn when_id_is_already_registered_then_add_is_rejected() {
        let registry = SubscriberRegistry::<u32>::new();
        let (first, _first_rx) = Subscriber::new(5, Arc::from("USA"), 1);
        let (second, _second_rx) = Subscriber::new(5, Arc::from("Russia"), 1);

        assert!(registry.add(first).await);
        assert!(!registry.add(second).await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn when_removed_twice_then_only_first_removal_returns_subscriber() {
        let registry = SubscriberRegistry::new();
        let (sub, _rx) = subscriber(&registry, 1);
        let id = sub.id;
        registry.add(sub).await;

        assert!(registry.remove(id).await.is_some());
        assert!(registry.remove(id).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn when_removals_race_with_fan_out_then_registry_has_no_duplicates_or_leftovers() {
        let registry = Arc::new(SubscriberRegistry::<u32>::new());
        let mut receivers = Vec::new();
        let mut ids = Vec::new();
        for _ in 0..64 {
            let (sub, rx) = subscriber(&registry, 2);
            ids.push(sub.id);
            receivers.push(rx);
            registry.add(sub).await;
        }

        let broadcaster = {
            let registry = registry.clone();
            tokio::spawn(async move {
                for frame in 0..200 {
                    registry.fan_out(frame).await;
                    tokio::task::yield_now().await;
                }
            })
        };

        // Every even subscriber disconnects, and each is removed twice concurrently.
        let mut removals = Vec::new();
        for id in ids.iter().copied().filter(|id| id % 2 == 0) {
            for _ in 0..2 {
                let registry = registry.clone();
                removals.push(tokio::spawn(async move { registry.remove(id).await.is_some() }));
            }
        }

        let mut removed = 0;
        for removal in removals {
            if removal.await.expect("removal task") {
                removed += 1;
            }
        }
        broadcaster.await.expect("broadcast task");

        let expected: HashSet<_> = ids.iter().copied().filter(|id| id % 2 != 0).collect();
        assert_eq!(removed, ids.len() - expected.len());
        let remaining = registry.subscribers.read().await;
        let remaining_ids: HashSet<_> = remaining.iter().map(|s| s.id).collect();
        assert_eq!(remaining.len(), remaining_ids.len());
        assert_eq!(remaining_ids, expected);
    }
}
