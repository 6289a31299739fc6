//! Chat hub: live connection registry plus the broadcast fan-out loop.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::types::Message;

/// Size of the per-connection send buffer. A client that falls this far
/// behind back-pressures the fan-out loop until its writer catches up.
const CONNECTION_BUFFER_SIZE: usize = 64;

/// Identifier for one live connection.
pub type ConnId = u64;

/// One registered client: its display name and outbound channel.
struct Client {
    name: String,
    tx: mpsc::Sender<Message>,
}

/// Central broadcast point for all chat messages.
///
/// The hub owns the two pieces of state shared across tasks: the registry of
/// live connections and the intake queue. Every published message passes
/// through a single drain task which fans it out to each registered
/// connection's outbound channel in publish order.
///
/// The intake queue is unbounded, so publishers never block; sustained
/// overload grows memory instead of stalling producers.
pub struct ChatHub {
    /// Live connections. Iterated via a snapshot during fan-out, so entries
    /// may be removed concurrently without upsetting delivery.
    clients: DashMap<ConnId, Client>,
    next_conn_id: AtomicU64,
    intake_tx: mpsc::UnboundedSender<Message>,
}

impl ChatHub {
    /// Create a hub and spawn its drain task.
    pub fn start() -> Arc<Self> {
        let (intake_tx, mut intake_rx) = mpsc::unbounded_channel();
        let hub = Arc::new(Self {
            clients: DashMap::new(),
            next_conn_id: AtomicU64::new(1),
            intake_tx,
        });

        let drain_hub = hub.clone();
        tokio::spawn(async move {
            while let Some(msg) = intake_rx.recv().await {
                drain_hub.fan_out(msg).await;
            }
            debug!("Hub intake queue closed, drain task exiting");
        });

        hub
    }

    /// Register a new connection.
    ///
    /// Returns the connection id and the receiver its writer task drains.
    pub fn register(&self, name: &str) -> (ConnId, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER_SIZE);
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        self.clients.insert(
            conn_id,
            Client {
                name: name.to_string(),
                tx,
            },
        );
        info!("Registered connection {} for {}", conn_id, name);
        (conn_id, rx)
    }

    /// Remove a connection from the registry.
    ///
    /// Idempotent and safe from any task. Returns the display name only for
    /// the call that actually removed the entry, which makes it the
    /// exactly-once edge for publishing the leave notice.
    pub fn unregister(&self, conn_id: ConnId) -> Option<String> {
        let removed = self.clients.remove(&conn_id).map(|(_, client)| client.name);
        if let Some(name) = &removed {
            info!("Unregistered connection {} for {}", conn_id, name);
        }
        removed
    }

    /// Queue a message for delivery to every registered connection.
    ///
    /// Never blocks; delivery happens asynchronously in publish order.
    pub fn publish(&self, message: Message) {
        if self.intake_tx.send(message).is_err() {
            warn!("Hub drain task is gone, dropping message");
        }
    }

    /// Deliver a message to a single connection, bypassing the fan-out.
    ///
    /// Used for the welcome message a new client receives alone. Returns
    /// false if the connection is unknown or its writer is gone.
    pub async fn send_to(&self, conn_id: ConnId, message: Message) -> bool {
        // Clone the sender out of the map entry; holding a map ref across
        // an await could block writers.
        let tx = match self.clients.get(&conn_id) {
            Some(client) => client.tx.clone(),
            None => return false,
        };
        tx.send(message).await.is_ok()
    }

    /// Number of currently registered connections.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Fan a message out to every registered connection.
    ///
    /// A failed send means the connection's writer has stopped: the entry is
    /// removed and a leave notice queued, and delivery continues to the
    /// remaining connections.
    async fn fan_out(&self, message: Message) {
        let targets: Vec<(ConnId, mpsc::Sender<Message>)> = self
            .clients
            .iter()
            .map(|entry| (*entry.key(), entry.value().tx.clone()))
            .collect();

        for (conn_id, tx) in targets {
            if tx.send(message.clone()).await.is_err() {
                warn!("Dropping dead connection {} during fan-out", conn_id);
                if let Some(name) = self.unregister(conn_id) {
                    self.publish(Message::system(format!("{} has left the chat", name)));
                }
            }
        }
    }
}
