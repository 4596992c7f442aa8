use crate::transport::{Session, TransportKind};
use crate::types::{RealtimeError, RealtimeEvent, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Reconnection state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    /// Never connected, or manually disconnected
    Idle,
    Connecting,
    Connected,
    /// Waiting for a scheduled retry
    Reconnecting,
    /// Retry budget spent; only an explicit reconnect resumes
    Exhausted,
}

/// Owns the active session and the connection phase.
///
/// Never takes the client state lock, so it may be called while that lock is held.
pub struct ConnectionManager {
    session: RwLock<Option<Arc<dyn Session>>>,
    phase: RwLock<ConnectionPhase>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            session: RwLock::new(None),
            phase: RwLock::new(ConnectionPhase::Idle),
        }
    }

    /// Gets the current connection phase
    pub async fn phase(&self) -> ConnectionPhase {
        *self.phase.read().await
    }

    pub async fn set_phase(&self, phase: ConnectionPhase) {
        let mut current = self.phase.write().await;
        if *current != phase {
            tracing::debug!("Connection phase {:?} -> {:?}", *current, phase);
            *current = phase;
        }
    }

    /// Checks if a session is open
    pub async fn is_connected(&self) -> bool {
        self.phase().await == ConnectionPhase::Connected && self.has_session().await
    }

    /// Installs the session returned by a successful open
    pub async fn set_session(&self, session: Arc<dyn Session>) {
        *self.session.write().await = Some(session);
    }

    pub async fn take_session(&self) -> Option<Arc<dyn Session>> {
        self.session.write().await.take()
    }

    pub async fn has_session(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Transport of the active session
    pub async fn transport(&self) -> Option<TransportKind> {
        self.session.read().await.as_ref().map(|session| session.kind())
    }

    /// Sends an event over the active session
    pub async fn send_event(&self, event: &RealtimeEvent) -> Result<()> {
        let session = self
            .session
            .read()
            .await
            .clone()
            .ok_or(RealtimeError::NotConnected)?;

        session.send(event).await
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
