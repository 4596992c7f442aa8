use crate::client::{ClientState, ConnectionManager};
use crate::transport::{SessionEvent, SessionEventSender};
use crate::types::{HEARTBEAT_INTERVAL, RealtimeEvent};
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{self, Instant, MissedTickBehavior};

const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(HEARTBEAT_INTERVAL);

/// Periodic liveness probe for the active session.
///
/// Pings go straight to the session, never through the outbound queue. A
/// failed ping is reported on the session's event channel as an error so the
/// client tears the session down exactly as it would for a transport error.
pub struct HeartbeatManager {
    interval: Duration,
    user_id: String,
    connection: Weak<ConnectionManager>,
    state: Weak<RwLock<ClientState>>,
    session_events: SessionEventSender,
}

impl HeartbeatManager {
    pub fn new(
        connection: Weak<ConnectionManager>,
        state: Weak<RwLock<ClientState>>,
        session_events: SessionEventSender,
    ) -> Self {
        Self {
            interval: DEFAULT_HEARTBEAT_INTERVAL,
            user_id: String::new(),
            connection,
            state,
            session_events,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Runs until the client is dropped or a ping fails.
    /// The first ping fires one full interval after start.
    pub async fn run(self) {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            // Client dropped, exit heartbeat task
            let Some(connection) = self.connection.upgrade() else {
                break;
            };

            if !connection.is_connected().await {
                continue;
            }

            let ping = RealtimeEvent::ping(&self.user_id);
            match connection.send_event(&ping).await {
                Ok(()) => {
                    if let Some(state) = self.state.upgrade() {
                        state.write().await.stats.record_sent();
                    }
                    tracing::debug!("Sent heartbeat {}", ping.id);
                }
                Err(e) => {
                    tracing::warn!("[Heartbeat] Failed to send: {}", e);
                    let _ = self
                        .session_events
                        .send(SessionEvent::Error(format!("heartbeat failed: {}", e)));
                    break;
                }
            }
        }
    }
}
