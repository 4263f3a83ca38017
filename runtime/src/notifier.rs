//! Availability notifier: fan-out of seat changes to connected observers.
//!
//! # Architecture
//!
//! ```text
//! BookingEngine ──notify()──▶ [bounded queue] ──▶ dispatcher task ──broadcast()──┬─▶ observer 1
//!   (try_send, never waits)                                                     ├─▶ observer 2
//!                                                                               └─▶ observer N
//! ```
//!
//! - The registry is owned by an [`AvailabilityNotifier`] instance and guarded
//!   by one mutex. Subscribe, unsubscribe and every broadcast iteration hold it.
//! - Delivery uses `try_send` into each observer's bounded buffer. An observer
//!   whose buffer is full or whose receiver is gone is removed; the others
//!   still get the update.
//! - The handoff from the booking engine is fire-and-forget. Updates may be
//!   lost; observers reconcile by re-reading the seat map.

use crate::metrics::NotifierMetrics;
use boxoffice_core::{SeatId, SeatUpdate};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Notifier sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierConfig {
    /// Capacity of the booking → dispatcher queue
    pub queue_capacity: usize,
    /// Per-observer buffer; an observer this far behind is disconnected
    pub observer_buffer: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            observer_buffer: 32,
        }
    }
}

/// Identifier of a registered observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Receiving end of a subscription.
#[derive(Debug)]
pub struct Observer {
    id: ObserverId,
    receiver: mpsc::Receiver<SeatUpdate>,
}

impl Observer {
    /// Registry id, used to unsubscribe.
    #[must_use]
    pub const fn id(&self) -> ObserverId {
        self.id
    }

    /// Wait for the next update. `None` once the observer has been removed
    /// from the registry and its buffer is drained.
    pub async fn recv(&mut self) -> Option<SeatUpdate> {
        self.receiver.recv().await
    }

    /// Take an update if one is already buffered.
    pub fn try_recv(&mut self) -> Option<SeatUpdate> {
        self.receiver.try_recv().ok()
    }
}

/// Result of one broadcast pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Observers that accepted the update
    pub delivered: usize,
    /// Observers removed because they were full or closed
    pub dropped: usize,
}

/// Registry of connected observers.
#[derive(Debug)]
pub struct AvailabilityNotifier {
    observers: Mutex<HashMap<ObserverId, mpsc::Sender<SeatUpdate>>>,
    next_id: AtomicU64,
    observer_buffer: usize,
}

impl AvailabilityNotifier {
    /// Create an empty registry.
    #[must_use]
    pub fn new(config: &NotifierConfig) -> Self {
        Self {
            observers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            observer_buffer: config.observer_buffer.max(1),
        }
    }

    /// Register a new observer.
    pub fn subscribe(&self) -> Observer {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.observer_buffer);

        let count = {
            let mut observers = self.lock();
            observers.insert(id, sender);
            observers.len()
        };
        NotifierMetrics::record_observers(count);
        debug!(observer = %id, observers = count, "Observer subscribed");

        Observer { id, receiver }
    }

    /// Remove an observer. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let (removed, count) = {
            let mut observers = self.lock();
            let removed = observers.remove(&id).is_some();
            (removed, observers.len())
        };
        if removed {
            NotifierMetrics::record_observers(count);
            debug!(observer = %id, observers = count, "Observer unsubscribed");
        }
        removed
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.lock().len()
    }

    /// Deliver `update` to every observer without waiting on any of them.
    pub fn broadcast(&self, update: &SeatUpdate) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        let count = {
            let mut observers = self.lock();
            observers.retain(|id, sender| match sender.try_send(update.clone()) {
                Ok(()) => {
                    report.delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    warn!(observer = %id, "Observer buffer full, disconnecting");
                    report.dropped += 1;
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(observer = %id, "Observer closed, removing");
                    report.dropped += 1;
                    false
                }
            });
            observers.len()
        };

        if report.dropped > 0 {
            NotifierMetrics::record_observers(count);
        }
        NotifierMetrics::record_broadcast(report.dropped);

        report
    }

    /// Start the dispatcher task that drains the booking queue into
    /// [`broadcast`](Self::broadcast).
    ///
    /// The task ends once every [`NotifierHandle`] has been dropped.
    #[must_use]
    pub fn spawn_dispatcher(self: &Arc<Self>, queue_capacity: usize) -> (NotifierHandle, JoinHandle<()>) {
        let (queue, mut updates) = mpsc::channel::<SeatUpdate>(queue_capacity.max(1));
        let notifier = Arc::clone(self);

        let task = tokio::spawn(async move {
            info!("Availability dispatcher started");
            while let Some(update) = updates.recv().await {
                let report = notifier.broadcast(&update);
                debug!(
                    seats = update.seat_ids.len(),
                    delivered = report.delivered,
                    dropped = report.dropped,
                    "Seat update dispatched"
                );
            }
            info!("Availability dispatcher stopped");
        });

        (NotifierHandle { queue }, task)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ObserverId, mpsc::Sender<SeatUpdate>>> {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sending side of the booking → dispatcher queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NotifierHandle {
    queue: mpsc::Sender<SeatUpdate>,
}

impl NotifierHandle {
    /// A handle with no dispatcher behind it. Every notification is dropped.
    #[must_use]
    pub fn detached() -> Self {
        let (queue, _) = mpsc::channel(1);
        Self { queue }
    }

    /// Queue a seat change for broadcast without waiting.
    ///
    /// Returns `false` if the update was dropped because the queue is full or
    /// the dispatcher has stopped.
    pub fn notify(&self, seat_ids: Vec<SeatId>) -> bool {
        if seat_ids.is_empty() {
            return true;
        }

        match self.queue.try_send(SeatUpdate::new(seat_ids)) {
            Ok(()) => true,
            Err(TrySendError::Full(update)) => {
                warn!(seats = update.seat_ids.len(), "Notifier queue full, seat update dropped");
                NotifierMetrics::record_update_dropped();
                false
            }
            Err(TrySendError::Closed(update)) => {
                debug!(seats = update.seat_ids.len(), "Notifier stopped, seat update dropped");
                NotifierMetrics::record_update_dropped();
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ids(raw: &[i64]) -> Vec<SeatId> {
        raw.iter().copied().map(SeatId::new).collect()
    }

    #[test]
    fn broadcast_reaches_every_observer() {
        let notifier = AvailabilityNotifier::new(&NotifierConfig::default());
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        let report = notifier.broadcast(&SeatUpdate::new(ids(&[2, 3])));

        assert_eq!(report, BroadcastReport { delivered: 2, dropped: 0 });
        assert_eq!(first.try_recv().unwrap().seat_ids, ids(&[2, 3]));
        assert_eq!(second.try_recv().unwrap().seat_ids, ids(&[2, 3]));
    }

    #[test]
    fn full_observer_is_dropped_without_affecting_others() {
        let notifier = AvailabilityNotifier::new(&NotifierConfig {
            queue_capacity: 8,
            observer_buffer: 1,
        });
        let _slow = notifier.subscribe();
        let mut fast = notifier.subscribe();

        notifier.broadcast(&SeatUpdate::new(ids(&[1])));
        fast.try_recv().unwrap();
        let report = notifier.broadcast(&SeatUpdate::new(ids(&[2])));

        assert_eq!(report, BroadcastReport { delivered: 1, dropped: 1 });
        assert_eq!(notifier.observer_count(), 1);
        assert_eq!(fast.try_recv().unwrap().seat_ids, ids(&[2]));
    }

    #[test]
    fn dropped_receiver_is_pruned_on_next_broadcast() {
        let notifier = AvailabilityNotifier::new(&NotifierConfig::default());
        let gone = notifier.subscribe();
        drop(gone);

        let report = notifier.broadcast(&SeatUpdate::new(ids(&[1])));

        assert_eq!(report.dropped, 1);
        assert_eq!(notifier.observer_count(), 0);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let notifier = AvailabilityNotifier::new(&NotifierConfig::default());
        let observer = notifier.subscribe();

        assert!(notifier.unsubscribe(observer.id()));
        assert!(!notifier.unsubscribe(observer.id()));
        assert_eq!(notifier.observer_count(), 0);
    }

    #[test]
    fn detached_handle_swallows_updates() {
        let handle = NotifierHandle::detached();
        assert!(!handle.notify(ids(&[1])));
        assert!(handle.notify(Vec::new()));
    }

    #[tokio::test]
    async fn dispatcher_forwards_queued_updates_and_stops_with_handles() {
        let notifier = Arc::new(AvailabilityNotifier::new(&NotifierConfig::default()));
        let mut observer = notifier.subscribe();
        let (handle, task) = notifier.spawn_dispatcher(4);

        assert!(handle.notify(ids(&[5, 6])));
        let update = tokio::time::timeout(Duration::from_secs(1), observer.recv())
            .await
            .expect("update in time")
            .expect("observer still registered");
        assert_eq!(update.seat_ids, ids(&[5, 6]));

        drop(handle);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("dispatcher stops")
            .expect("dispatcher did not panic");
    }

    #[tokio::test]
    async fn concurrent_subscribe_and_broadcast_keep_registry_consistent() {
        let notifier = Arc::new(AvailabilityNotifier::new(&NotifierConfig::default()));
        let mut tasks = Vec::new();

        for i in 0..16 {
            let notifier = Arc::clone(&notifier);
            tasks.push(tokio::spawn(async move {
                let observer = notifier.subscribe();
                notifier.broadcast(&SeatUpdate::new(vec![SeatId::new(i)]));
                notifier.unsubscribe(observer.id());
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(notifier.observer_count(), 0);
    }
}
