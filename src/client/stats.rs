use crate::transport::{TransportKind, TransportSelection};
use crate::types::{EXCELLENT_LATENCY, GOOD_LATENCY, RealtimeEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Network quality classification derived from round-trip latency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionQuality {
    Excellent,
    Good,
    Poor,
    Disconnected,
}

impl ConnectionQuality {
    /// `<100ms` is excellent, `<300ms` is good, anything slower is poor
    pub fn from_latency(latency: Duration) -> Self {
        let millis = latency.as_millis();
        if millis < u128::from(EXCELLENT_LATENCY) {
            Self::Excellent
        } else if millis < u128::from(GOOD_LATENCY) {
            Self::Good
        } else {
            Self::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Poor => "poor",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time copy of the connection statistics handed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStats {
    pub connected: bool,
    pub quality: ConnectionQuality,
    pub latency_ms: u64,
    pub reconnect_attempts: u32,
    pub messages_received: u64,
    pub messages_sent: u64,
    /// Events evicted from a full outbound queue
    pub messages_dropped: u64,
    /// Milliseconds since the last successful open, zero while disconnected
    pub uptime_ms: u64,
    pub last_connected: Option<DateTime<Utc>>,
    pub transport: Option<TransportKind>,
}

/// Mutable counters behind [`ConnectionStats`]
#[derive(Debug)]
pub struct StatsTracker {
    quality: ConnectionQuality,
    latency_ms: u64,
    reconnect_attempts: u32,
    messages_received: u64,
    messages_sent: u64,
    messages_dropped: u64,
    connected_at: Option<Instant>,
    last_connected: Option<DateTime<Utc>>,
    transport: Option<TransportKind>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            quality: ConnectionQuality::Disconnected,
            latency_ms: 0,
            reconnect_attempts: 0,
            messages_received: 0,
            messages_sent: 0,
            messages_dropped: 0,
            connected_at: None,
            last_connected: None,
            transport: None,
        }
    }

    /// Records the probed latency. Quality stays `Disconnected` until a
    /// session actually opens.
    pub fn record_probe(&mut self, selection: &TransportSelection) {
        if let Some(latency) = selection.latency {
            self.latency_ms = duration_millis(latency);
        }
    }

    pub fn mark_connected(&mut self, transport: TransportKind, quality: ConnectionQuality) {
        self.quality = quality;
        self.connected_at = Some(Instant::now());
        self.last_connected = Some(Utc::now());
        self.transport = Some(transport);
    }

    pub fn mark_disconnected(&mut self) {
        self.connected_at = None;
        self.quality = ConnectionQuality::Disconnected;
        self.transport = None;
    }

    pub fn is_connected(&self) -> bool {
        self.connected_at.is_some()
    }

    pub fn record_sent(&mut self) {
        self.messages_sent += 1;
    }

    /// Counts an inbound event and resamples latency from its timestamp.
    /// Events stamped in the future (clock skew) leave latency untouched.
    pub fn record_received(&mut self, event: &RealtimeEvent) {
        self.messages_received += 1;

        let age = Utc::now().timestamp_millis() - event.timestamp;
        if let Ok(age) = u64::try_from(age) {
            self.latency_ms = age;
            self.quality = ConnectionQuality::from_latency(Duration::from_millis(age));
        }
    }

    pub fn record_dropped(&mut self, count: usize) {
        self.messages_dropped += count as u64;
    }

    pub fn set_reconnect_attempts(&mut self, attempts: u32) {
        self.reconnect_attempts = attempts;
    }

    pub fn snapshot(&self) -> ConnectionStats {
        ConnectionStats {
            connected: self.is_connected(),
            quality: self.quality,
            latency_ms: self.latency_ms,
            reconnect_attempts: self.reconnect_attempts,
            messages_received: self.messages_received,
            messages_sent: self.messages_sent,
            messages_dropped: self.messages_dropped,
            uptime_ms: self
                .connected_at
                .map(|start| duration_millis(start.elapsed()))
                .unwrap_or(0),
            last_connected: self.last_connected,
            transport: self.transport,
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
