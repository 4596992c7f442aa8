//! Wire transports behind a uniform session interface.
//!
//! Reconnection, heartbeat and queuing only ever talk to [`Session`] and
//! [`Connector`], so they work the same over WebSocket, SSE and polling and
//! can be exercised without a network.

pub mod endpoints;
pub mod network;
pub mod polling;
pub mod selector;
pub mod sse;
pub mod websocket;

#[cfg(test)]
pub(crate) mod testing;

pub use endpoints::Endpoints;
pub use network::NetworkConnector;
pub use polling::PollingSession;
pub use selector::{TransportCapabilities, TransportSelection, choose_transport, select_transport};
pub use sse::SseSession;
pub use websocket::WebSocketSession;

use crate::client::ConnectionConfig;
use crate::types::{RealtimeEvent, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// The concrete wire mechanism used to move events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    WebSocket,
    Sse,
    Polling,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebSocket => "websocket",
            Self::Sse => "sse",
            Self::Polling => "polling",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound notifications from an open session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// One raw JSON frame
    Message(String),
    /// The remote side ended the session
    Closed(Option<String>),
    /// The session failed and is no longer usable
    Error(String),
}

pub type SessionEventSender = mpsc::UnboundedSender<SessionEvent>;
pub type SessionEventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// One open connection over a single wire protocol
#[async_trait]
pub trait Session: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Transmits one event over the transport's native send path
    async fn send(&self, event: &RealtimeEvent) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Opens sessions and measures network quality
#[async_trait]
pub trait Connector: Send + Sync {
    /// Transports this runtime can use
    fn capabilities(&self) -> TransportCapabilities {
        TransportCapabilities::default()
    }

    /// Round-trip time to the backend's ping endpoint
    async fn probe(&self, config: &ConnectionConfig) -> Result<Duration>;

    /// Opens a session of `kind`; inbound traffic is delivered on `events`
    async fn open(
        &self,
        kind: TransportKind,
        config: &ConnectionConfig,
        events: SessionEventSender,
    ) -> Result<Arc<dyn Session>>;
}
