//! Session Registry
//!
//! Tracks every connected viewer and fans game updates out to them.
//!
//! The registry only knows connections through the [`Connection`] trait, so
//! the game host never depends on a particular transport. A broadcast
//! delivers to the sessions registered when it starts; any session whose
//! send fails is dropped before the broadcast returns.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use crate::network::protocol::ServerMessage;

/// Unique session identifier.
pub type SessionId = uuid::Uuid;

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Message could not be handed to the transport.
    #[error("Send failed: {0}")]
    SendFailure(String),

    /// Connection is closed.
    #[error("Connection closed")]
    Closed,
}

// =============================================================================
// CONNECTION
// =============================================================================

/// Outbound half of a text-message transport.
///
/// Sends must not block: a transport that cannot accept a message right now
/// reports a failure and the registry drops it.
pub trait Connection: Send + Sync {
    /// Queue a text message for delivery.
    fn send(&self, text: &str) -> Result<(), SessionError>;

    /// Close the connection. Calling it again does nothing.
    fn close(&self);

    /// Whether messages can still be sent.
    fn is_open(&self) -> bool;
}

/// Item consumed by a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Text frame
    Text(String),
    /// Close the socket and stop writing
    Close,
}

/// [`Connection`] backed by a bounded channel drained by a writer task.
#[derive(Debug)]
pub struct ChannelConnection {
    tx: mpsc::Sender<Outbound>,
    closed: AtomicBool,
}

impl ChannelConnection {
    /// Create a connection and the receiver its writer task reads from.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                closed: AtomicBool::new(false),
            },
            rx,
        )
    }
}

impl Connection for ChannelConnection {
    fn send(&self, text: &str) -> Result<(), SessionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SessionError::Closed);
        }
        self.tx
            .try_send(Outbound::Text(text.to_string()))
            .map_err(|e| match e {
                TrySendError::Full(_) => SessionError::SendFailure("outbound queue full".into()),
                TrySendError::Closed(_) => {
                    self.closed.store(true, Ordering::Release);
                    SessionError::Closed
                }
            })
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            // Best effort; a full queue still ends when the sender drops
            let _ = self.tx.try_send(Outbound::Close);
        }
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && !self.tx.is_closed()
    }
}

// =============================================================================
// SESSION REGISTRY
// =============================================================================

/// Counts from one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions that accepted the message
    pub delivered: usize,
    /// Sessions removed because delivery failed
    pub pruned: usize,
}

/// All live sessions.
pub struct SessionRegistry {
    sessions: RwLock<BTreeMap<SessionId, Arc<dyn Connection>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a session after sending it `snapshot`.
    ///
    /// The snapshot goes out before the session is visible to broadcasts, so
    /// it is always the first message the session sees. An existing session
    /// with the same id is replaced and closed.
    pub async fn add(
        &self,
        id: SessionId,
        connection: Arc<dyn Connection>,
        snapshot: &ServerMessage,
    ) -> Result<(), SessionError> {
        let text = snapshot.to_json().map_err(|e| {
            error!("Failed to serialize snapshot: {}", e);
            SessionError::SendFailure(e.to_string())
        })?;
        connection.send(&text)?;

        let replaced = self.sessions.write().await.insert(id, Arc::clone(&connection));
        if let Some(old) = replaced {
            if !same_connection(&old, &connection) {
                old.close();
            }
        }

        info!("Session {} connected", id);
        Ok(())
    }

    /// Remove a session and close its connection. Safe to call repeatedly.
    pub async fn remove(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id);
        match removed {
            Some(connection) => {
                if connection.is_open() {
                    connection.close();
                }
                info!("Session {} disconnected", id);
                true
            }
            None => false,
        }
    }

    /// Send `message` to every registered session.
    ///
    /// The message is serialized once. Sessions that fail are removed and
    /// closed before this returns.
    pub async fn broadcast(&self, message: &ServerMessage) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize message: {}", e);
                return report;
            }
        };

        // Send from a snapshot so connects and prunes can proceed meanwhile
        let targets: Vec<(SessionId, Arc<dyn Connection>)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, connection)| (*id, Arc::clone(connection)))
            .collect();

        let mut failed = Vec::new();
        for (id, connection) in targets {
            if !connection.is_open() {
                debug!("Session {} already closed", id);
                failed.push((id, connection));
                continue;
            }
            match connection.send(&text) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Send to session {} failed: {}", id, e);
                    failed.push((id, connection));
                }
            }
        }

        if !failed.is_empty() {
            let mut sessions = self.sessions.write().await;
            for (id, connection) in failed {
                // A reconnect may have replaced the entry in the meantime
                if sessions.get(&id).is_some_and(|current| same_connection(current, &connection)) {
                    sessions.remove(&id);
                    report.pruned += 1;
                    info!("Session {} pruned", id);
                }
                connection.close();
            }
        }

        report
    }

    /// Number of registered sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is registered.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Whether `id` is registered.
    pub async fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(id)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn same_connection(a: &Arc<dyn Connection>, b: &Arc<dyn Connection>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const u8, Arc::as_ptr(b) as *const u8)
}
