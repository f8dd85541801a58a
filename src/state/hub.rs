use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Outbound half of a live WebSocket session.
#[derive(Debug, Clone)]
struct Subscriber {
    tx: mpsc::Sender<String>,
}

/// Registry of live WebSocket sessions.
///
/// Guarded by its own mutex, separate from the todo store lock, and never
/// held across a send: `broadcast` snapshots the senders, drops the lock and
/// then delivers, so sessions can join or leave mid-sweep.
#[derive(Clone)]
pub struct BroadcastHub {
    subscribers: Arc<Mutex<HashMap<u64, Subscriber>>>,
    next_id: Arc<AtomicU64>,
    buffer: usize,
}

impl BroadcastHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            buffer: buffer.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Subscriber>> {
        // The map stays consistent even if a holder panicked mid-insert.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a session. The receiver yields every notification queued for it
    /// and returns `None` once the hub drops the session.
    pub fn register(&self) -> (u64, mpsc::Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);

        self.lock().insert(id, Subscriber { tx });
        debug!("Subscriber {} registered", id);

        (id, rx)
    }

    /// Remove a session. Unknown ids are ignored.
    pub fn unregister(&self, id: u64) {
        if self.lock().remove(&id).is_some() {
            debug!("Subscriber {} unregistered", id);
        }
    }

    /// Queue `payload` for every live session and return how many accepted
    /// it. Never waits: a session whose queue is full or closed is dropped.
    pub fn broadcast(&self, payload: &str) -> usize {
        let snapshot: Vec<(u64, mpsc::Sender<String>)> = self
            .lock()
            .iter()
            .map(|(id, sub)| (*id, sub.tx.clone()))
            .collect();

        let mut delivered = 0;
        let mut dead = Vec::new();

        for (id, tx) in snapshot {
            match tx.try_send(payload.to_owned()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!("Subscriber {} is not keeping up, dropping it", id);
                    dead.push(id);
                }
                Err(TrySendError::Closed(_)) => dead.push(id),
            }
        }

        if !dead.is_empty() {
            let mut map = self.lock();
            for id in dead {
                map.remove(&id);
            }
        }

        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Drop every session; their receivers end and the sockets close.
    pub fn close_all(&self) -> usize {
        let mut map = self.lock();
        let count = map.len();
        map.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber() {
        let hub = BroadcastHub::new(8);
        let (_a, mut rx_a) = hub.register();
        let (_b, mut rx_b) = hub.register();

        assert_eq!(hub.broadcast("changed"), 2);
        assert_eq!(rx_a.recv().await.as_deref(), Some("changed"));
        assert_eq!(rx_b.recv().await.as_deref(), Some("changed"));
    }

    #[tokio::test]
    async fn unregistered_subscriber_gets_nothing() {
        let hub = BroadcastHub::new(8);
        let (a, mut rx_a) = hub.register();
        let (_b, mut rx_b) = hub.register();

        hub.unregister(a);
        hub.unregister(a);

        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(hub.broadcast("x"), 1);
        assert_eq!(rx_b.recv().await.as_deref(), Some("x"));
        // sender dropped on unregister, nothing queued
        assert_eq!(rx_a.recv().await, None);
    }

    #[test]
    fn closed_receiver_is_pruned() {
        let hub = BroadcastHub::new(8);
        let (_a, rx_a) = hub.register();
        let (_b, _rx_b) = hub.register();

        drop(rx_a);

        assert_eq!(hub.broadcast("x"), 1);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn slow_subscriber_is_dropped_without_blocking() {
        let hub = BroadcastHub::new(2);
        let (_slow, mut slow_rx) = hub.register();

        assert_eq!(hub.broadcast("1"), 1);
        assert_eq!(hub.broadcast("2"), 1);
        assert_eq!(hub.broadcast("3"), 0);
        assert_eq!(hub.subscriber_count(), 0);

        // what was queued is still readable, then the stream ends
        assert_eq!(slow_rx.recv().await.as_deref(), Some("1"));
        assert_eq!(slow_rx.recv().await.as_deref(), Some("2"));
        assert_eq!(slow_rx.recv().await, None);
    }

    #[tokio::test]
    async fn close_all_ends_every_session() {
        let hub = BroadcastHub::new(4);
        let (_a, mut rx_a) = hub.register();
        let (_b, mut rx_b) = hub.register();

        assert_eq!(hub.close_all(), 2);
        assert_eq!(hub.broadcast("x"), 0);
        assert_eq!(rx_a.recv().await, None);
        assert_eq!(rx_b.recv().await, None);
    }

    #[test]
    fn ids_are_unique() {
        let hub = BroadcastHub::new(1);
        let (a, _ra) = hub.register();
        let (b, _rb) = hub.register();
        assert_ne!(a, b);
    }
}
