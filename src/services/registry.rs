//! Broadcast registry routing page snapshots to live subscribers

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use tokio::sync::mpsc;
use tracing::debug;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Handle onto one subscriber's outbound queue
///
/// The socket task owns the receiving end; once it goes away every send fails.
#[derive(Debug, Clone)]
pub struct Connection {
    id: u64,
    tx: mpsc::UnboundedSender<Arc<str>>,
}

impl Connection {
    /// Create a connection handle and the queue its socket task drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Arc<str>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
        (Self { id, tx }, rx)
    }

    fn deliver(&self, payload: &Arc<str>) -> bool {
        self.tx.send(Arc::clone(payload)).is_ok()
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}

/// Maps a page's public link to the connections subscribed to it
#[derive(Debug, Default)]
pub struct BroadcastRegistry {
    connections: Mutex<HashMap<String, Vec<Connection>>>,
}

impl BroadcastRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, Vec<Connection>>> {
        self.connections.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register `connection` under `public_link`
    ///
    /// Registering the same connection twice delivers every update twice.
    pub fn connect(&self, connection: Connection, public_link: &str) {
        debug!("Connection {} subscribed to {}", connection.id, public_link);
        self.table()
            .entry(public_link.to_string())
            .or_default()
            .push(connection);
    }

    /// Remove one registration of `connection`; absent entries are ignored
    pub fn disconnect(&self, connection: &Connection, public_link: &str) {
        let mut table = self.table();
        let Some(connections) = table.get_mut(public_link) else {
            return;
        };

        if let Some(position) = connections.iter().position(|c| c == connection) {
            connections.remove(position);
            debug!("Connection {} unsubscribed from {}", connection.id, public_link);
        }
        if connections.is_empty() {
            table.remove(public_link);
        }
    }

    /// Deliver `payload` to every subscriber of `public_link`
    ///
    /// Returns the number of successful deliveries. Subscribers whose queue is
    /// closed are disconnected.
    pub fn broadcast_update(&self, public_link: &str, payload: &str) -> usize {
        let targets = match self.table().get(public_link) {
            Some(connections) => connections.clone(),
            None => return 0,
        };

        let payload: Arc<str> = Arc::from(payload);
        let mut delivered = 0;
        for connection in &targets {
            if connection.deliver(&payload) {
                delivered += 1;
            } else {
                debug!("Dropping closed connection {} from {}", connection.id, public_link);
                self.disconnect(connection, public_link);
            }
        }
        delivered
    }

    /// Number of registrations under `public_link`
    pub fn subscriber_count(&self, public_link: &str) -> usize {
        self.table().get(public_link).map_or(0, Vec::len)
    }

    /// Number of pages with at least one subscriber
    pub fn page_count(&self) -> usize {
        self.table().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_without_subscribers() {
        let registry = BroadcastRegistry::new();
        assert_eq!(registry.broadcast_update("nobody", "{}"), 0);
        assert_eq!(registry.page_count(), 0);
    }

    #[test]
    fn test_broadcast_reaches_every_subscriber() {
        let registry = BroadcastRegistry::new();
        let (first, mut first_rx) = Connection::channel();
        let (second, mut second_rx) = Connection::channel();
        let (other, mut other_rx) = Connection::channel();
        registry.connect(first, "page");
        registry.connect(second, "page");
        registry.connect(other, "elsewhere");

        assert_eq!(registry.broadcast_update("page", "payload"), 2);
        assert_eq!(&*first_rx.try_recv().unwrap(), "payload");
        assert_eq!(&*second_rx.try_recv().unwrap(), "payload");
        assert!(other_rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_subscriber_is_pruned() {
        let registry = BroadcastRegistry::new();
        let (closed, closed_rx) = Connection::channel();
        let (open, mut open_rx) = Connection::channel();
        registry.connect(closed, "page");
        registry.connect(open, "page");
        drop(closed_rx);

        assert_eq!(registry.broadcast_update("page", "x"), 1);
        assert_eq!(registry.subscriber_count("page"), 1);
        assert_eq!(&*open_rx.try_recv().unwrap(), "x");
    }

    #[test]
    fn test_only_closed_subscriber_removes_key() {
        let registry = BroadcastRegistry::new();
        let (closed, closed_rx) = Connection::channel();
        registry.connect(closed, "page");
        drop(closed_rx);

        assert_eq!(registry.broadcast_update("page", "x"), 0);
        assert_eq!(registry.page_count(), 0);
    }

    #[test]
    fn test_disconnect_is_redundant_safe() {
        let registry = BroadcastRegistry::new();
        let (connection, _rx) = Connection::channel();
        registry.connect(connection.clone(), "page");

        registry.disconnect(&connection, "page");
        registry.disconnect(&connection, "page");
        registry.disconnect(&connection, "missing");
        assert_eq!(registry.page_count(), 0);
    }

    #[test]
    fn test_disconnect_keeps_other_subscribers() {
        let registry = BroadcastRegistry::new();
        let (first, _first_rx) = Connection::channel();
        let (second, _second_rx) = Connection::channel();
        registry.connect(first.clone(), "page");
        registry.connect(second, "page");

        registry.disconnect(&first, "page");
        assert_eq!(registry.subscriber_count("page"), 1);
    }

    #[test]
    fn test_duplicate_registration_duplicates_delivery() {
        let registry = BroadcastRegistry::new();
        let (connection, mut rx) = Connection::channel();
        registry.connect(connection.clone(), "page");
        registry.connect(connection.clone(), "page");

        assert_eq!(registry.broadcast_update("page", "x"), 2);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());

        registry.disconnect(&connection, "page");
        assert_eq!(registry.subscriber_count("page"), 1);
    }

    #[test]
    fn test_concurrent_connect_and_broadcast() {
        let registry = Arc::new(BroadcastRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let (connection, rx) = Connection::channel();
                        registry.connect(connection.clone(), "page");
                        registry.broadcast_update("page", "x");
                        drop(rx);
                        registry.disconnect(&connection, "page");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.page_count(), 0);
    }
}
