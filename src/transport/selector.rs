use super::{Connector, TransportKind};
use crate::client::{ConnectionConfig, ConnectionQuality};
use std::time::Duration;
use tokio::time;

/// Transports available in the current runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportCapabilities {
    pub websocket: bool,
    pub sse: bool,
}

impl Default for TransportCapabilities {
    fn default() -> Self {
        Self {
            websocket: true,
            sse: true,
        }
    }
}

/// Outcome of one selection round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSelection {
    pub kind: TransportKind,
    pub quality: ConnectionQuality,
    /// Measured round trip, `None` when the probe failed
    pub latency: Option<Duration>,
}

/// Picks a transport for the measured quality.
///
/// Polling works wherever plain HTTP does, so it is the universal fallback.
pub fn choose_transport(
    quality: ConnectionQuality,
    capabilities: TransportCapabilities,
) -> TransportKind {
    if capabilities.websocket && quality == ConnectionQuality::Excellent {
        TransportKind::WebSocket
    } else if capabilities.sse && quality != ConnectionQuality::Poor {
        TransportKind::Sse
    } else {
        TransportKind::Polling
    }
}

/// Probes the backend and chooses a transport; probe failure counts as poor quality
pub async fn select_transport(
    connector: &dyn Connector,
    config: &ConnectionConfig,
) -> TransportSelection {
    let latency = match time::timeout(config.timeout, connector.probe(config)).await {
        Ok(Ok(latency)) => Some(latency),
        Ok(Err(e)) => {
            tracing::warn!("Quality probe failed: {}", e);
            None
        }
        Err(_) => {
            tracing::warn!("Quality probe timed out after {:?}", config.timeout);
            None
        }
    };

    let quality = latency
        .map(ConnectionQuality::from_latency)
        .unwrap_or(ConnectionQuality::Poor);
    let kind = choose_transport(quality, connector.capabilities());

    tracing::debug!(
        "Selected {} transport (quality={}, latency={:?})",
        kind,
        quality,
        latency
    );

    TransportSelection {
        kind,
        quality,
        latency,
    }
}
