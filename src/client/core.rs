use super::state::{HEARTBEAT_TASK, READER_TASK, RECONNECT_TASK};
use super::{
    ClientState, ConnectOptions, ConnectionConfig, ConnectionManager, ConnectionPhase,
    ConnectionStats, RealtimeClientBuilder,
};
use crate::infrastructure::HeartbeatManager;
use crate::messaging::{EventFilter, EventType, HandlerId, invoke_isolated};
use crate::transport::{
    Connector, SessionEvent, SessionEventReceiver, TransportKind, select_transport,
};
use crate::types::{RealtimeError, RealtimeEvent, Result};
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tokio::time;

/// Adaptive realtime client.
///
/// `RealtimeClient` picks the best transport for the current network
/// (WebSocket, Server-Sent Events or HTTP polling), keeps the session alive
/// with heartbeats, reconnects with exponential backoff, and queues outbound
/// events while no session is open.
///
/// The handle is cheap to clone; every clone drives the same connection.
///
/// # Example
///
/// ```no_run
/// use adaptive_realtime_rs::{ConnectOptions, EventType, RealtimeClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RealtimeClient::builder("https://realtime.example.com")?
///     .credentials("your-token", "user-1")?
///     .build()?;
///
/// client.on(EventType::Like, |event| {
///     println!("{} liked {:?}", event.user_id, event.game_id);
/// }).await;
///
/// client.connect(ConnectOptions::default()).await?;
/// client.send_like("game-1", "user-1").await;
/// client.disconnect().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeClient {
    pub(crate) connector: Arc<dyn Connector>,

    // Active session and phase
    pub(crate) connection: Arc<ConnectionManager>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ClientState>>,
}

impl RealtimeClient {
    /// Creates a client with default settings for `url`.
    ///
    /// No connection is made until [`connect()`](Self::connect).
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::UrlParse`] if `url` cannot be parsed and
    /// [`RealtimeError::Config`] if its scheme is not http(s) or ws(s).
    pub fn new(url: impl Into<String>) -> Result<Self> {
        RealtimeClientBuilder::new(url)?.build()
    }

    pub fn builder(url: impl Into<String>) -> Result<RealtimeClientBuilder> {
        RealtimeClientBuilder::new(url)
    }

    /// Opens a session.
    ///
    /// `options` overrides the stored configuration for this and later
    /// attempts. The network is probed, a transport is chosen, and once the
    /// session is open the authentication event is sent, queued events are
    /// flushed and connection-state listeners are notified. A caller-initiated
    /// connect also resets the reconnect attempt counter.
    ///
    /// Returns `Ok(true)` once connected (immediately if already connected)
    /// and `Ok(false)` if another attempt is already in flight.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the open attempt
    /// fails. [`RealtimeError::Timeout`] means the attempt exceeded
    /// `timeout`. In both failure cases automatic reconnection has already
    /// been scheduled.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use adaptive_realtime_rs::{ConnectOptions, RealtimeClient};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = RealtimeClient::new("https://realtime.example.com")?;
    ///
    /// client
    ///     .connect(ConnectOptions {
    ///         max_reconnect_attempts: Some(3),
    ///         ..Default::default()
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(&self, options: ConnectOptions) -> Result<bool> {
        let generation = {
            let mut state = self.state.write().await;
            match self.connection.phase().await {
                ConnectionPhase::Connected => return Ok(true),
                ConnectionPhase::Connecting => {
                    tracing::debug!("Connection attempt already in progress");
                    return Ok(false);
                }
                _ => {}
            }

            let config = state.config.merged(options);
            config.validate()?;
            state.apply_config(config);

            state.was_manual_disconnect = false;
            state.reconnect_pending = false;
            state.task_manager.abort(RECONNECT_TASK);
            self.connection.set_phase(ConnectionPhase::Connecting).await;
            state.next_generation()
        };

        self.open_session(generation).await.map(|()| true)
    }

    /// Closes the session and stops every background task.
    ///
    /// Marks the disconnect as manual, so no automatic reconnection happens
    /// until [`connect()`](Self::connect) or [`reconnect()`](Self::reconnect)
    /// is called. Calling it again has no further effect.
    pub async fn disconnect(&self) {
        let session = {
            let mut state = self.state.write().await;
            state.was_manual_disconnect = true;

            if self.connection.phase().await == ConnectionPhase::Idle
                && !self.connection.has_session().await
            {
                return;
            }

            tracing::info!("Disconnecting");
            state.next_generation();
            state.task_manager.abort_all();
            state.reconnect_pending = false;
            state.stats.mark_disconnected();
            self.connection.set_phase(ConnectionPhase::Idle).await;
            self.connection.take_session().await
        };

        let Some(session) = session else {
            return;
        };

        if let Err(e) = session.close().await {
            tracing::warn!("Error while closing {} session: {}", session.kind(), e);
        }
        tracing::info!("Disconnected");
        self.notify_connection_state().await;
    }

    /// Disconnects and connects again with the stored configuration.
    ///
    /// This is the only way out of [`ConnectionPhase::Exhausted`] besides
    /// `connect()`; the attempt counter starts over.
    pub async fn reconnect(&self) -> Result<bool> {
        tracing::info!("Reconnect requested");
        self.disconnect().await;
        self.connect(ConnectOptions::default()).await
    }

    /// Replaces the whole configuration and reconnects with it
    pub async fn reconfigure(&self, config: ConnectionConfig) -> Result<bool> {
        config.validate()?;
        self.disconnect().await;
        self.state.write().await.apply_config(config);
        self.connect(ConnectOptions::default()).await
    }

    /// Sends an event.
    ///
    /// Returns `true` if the event went out on the open session. Otherwise
    /// (not connected, or the transmit failed) the event is appended to the
    /// outbound queue and `false` is returned; it is sent on the next
    /// successful open.
    pub async fn send(&self, event: RealtimeEvent) -> bool {
        if self.connection.is_connected().await {
            match self.connection.send_event(&event).await {
                Ok(()) => {
                    self.state.write().await.stats.record_sent();
                    tracing::debug!("Sent {} event {}", event.event_type, event.id);
                    return true;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to send {} event {}, queuing: {}",
                        event.event_type,
                        event.id,
                        e
                    );
                }
            }
        }

        self.enqueue(event).await;
        false
    }

    pub async fn send_like(&self, game_id: &str, user_id: &str) -> bool {
        self.send(RealtimeEvent::like(game_id, user_id)).await
    }

    pub async fn send_follow(&self, target_user_id: &str, user_id: &str) -> bool {
        self.send(RealtimeEvent::follow(target_user_id, user_id))
            .await
    }

    pub async fn send_reaction(&self, game_id: &str, user_id: &str, reaction: &str) -> bool {
        self.send(RealtimeEvent::reaction(game_id, user_id, reaction))
            .await
    }

    pub async fn send_user_online(&self, user_id: &str) -> bool {
        self.send(RealtimeEvent::user_online(user_id)).await
    }

    pub async fn send_comment(&self, game_id: &str, user_id: &str, text: &str) -> bool {
        self.send(RealtimeEvent::comment(game_id, user_id, text))
            .await
    }

    pub async fn send_share(&self, game_id: &str, user_id: &str) -> bool {
        self.send(RealtimeEvent::share(game_id, user_id)).await
    }

    pub async fn send_game_update(&self, game_id: &str, user_id: &str, payload: Value) -> bool {
        let event = RealtimeEvent::new(EventType::GameUpdate, payload, user_id).with_game_id(game_id);
        self.send(event).await
    }

    pub async fn send_notification(&self, user_id: &str, payload: Value) -> bool {
        self.send(RealtimeEvent::new(EventType::Notification, payload, user_id))
            .await
    }

    /// Registers a handler for one event type, or for every event with
    /// [`EventFilter::Any`].
    ///
    /// Type-specific handlers run before wildcard handlers. A handler that
    /// panics is logged and skipped; the remaining handlers still run.
    pub async fn on<F>(&self, filter: impl Into<EventFilter>, handler: F) -> HandlerId
    where
        F: Fn(&RealtimeEvent) + Send + Sync + 'static,
    {
        self.state
            .write()
            .await
            .dispatcher
            .register(filter.into(), Arc::new(handler))
    }

    /// Removes an event handler; returns false if it was not registered
    pub async fn off(&self, id: HandlerId) -> bool {
        self.state.write().await.dispatcher.unregister(id)
    }

    /// Registers a listener that receives a stats snapshot on every open,
    /// close and on retry exhaustion
    pub async fn on_connection_state<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&ConnectionStats) + Send + Sync + 'static,
    {
        self.state
            .write()
            .await
            .dispatcher
            .register_state_listener(Arc::new(handler))
    }

    pub async fn off_connection_state(&self, id: HandlerId) -> bool {
        self.state
            .write()
            .await
            .dispatcher
            .unregister_state_listener(id)
    }

    /// Snapshot of the connection statistics
    pub async fn stats(&self) -> ConnectionStats {
        self.state.read().await.stats.snapshot()
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    pub async fn phase(&self) -> ConnectionPhase {
        self.connection.phase().await
    }

    /// Transport of the open session, if any
    pub async fn transport(&self) -> Option<TransportKind> {
        self.connection.transport().await
    }

    /// Number of outbound events waiting for a session
    pub async fn queued_len(&self) -> usize {
        self.state.read().await.queue.len()
    }

    pub async fn config(&self) -> ConnectionConfig {
        self.state.read().await.config.clone()
    }

    // Boxed to break the open -> reader -> reconnect -> open future cycle
    fn open_session(&self, generation: u64) -> BoxFuture<'static, Result<()>> {
        let client = self.clone();
        Box::pin(async move { client.open_session_inner(generation).await })
    }

    async fn open_session_inner(&self, generation: u64) -> Result<()> {
        let config = {
            let state = self.state.read().await;
            if state.generation != generation || state.was_manual_disconnect {
                return Err(RealtimeError::Connection(
                    "connection attempt superseded".to_string(),
                ));
            }
            self.connection.set_phase(ConnectionPhase::Connecting).await;
            state.config.clone()
        };

        let selection = select_transport(self.connector.as_ref(), &config).await;
        self.state.write().await.stats.record_probe(&selection);
        tracing::info!("Connecting to {} via {}", config.url, selection.kind);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let opened = match time::timeout(
            config.timeout,
            self.connector
                .open(selection.kind, &config, events_tx.clone()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RealtimeError::Timeout),
        };

        let session = match opened {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Failed to open {} session: {}", selection.kind, e);
                self.schedule_reconnect(generation).await;
                return Err(e);
            }
        };

        let installed = {
            let mut state = self.state.write().await;
            if state.generation != generation || state.was_manual_disconnect {
                false
            } else {
                let generation = state.next_generation();
                state.timer.reset();
                state.reconnect_pending = false;
                state.stats.set_reconnect_attempts(0);
                state.stats.mark_connected(session.kind(), selection.quality);

                self.connection.set_session(Arc::clone(&session)).await;
                self.connection.set_phase(ConnectionPhase::Connected).await;

                let reader = self.clone();
                state.task_manager.spawn(READER_TASK, async move {
                    reader.read_session(events_rx, generation).await;
                });

                let mut heartbeat = HeartbeatManager::new(
                    Arc::downgrade(&self.connection),
                    Arc::downgrade(&self.state),
                    events_tx,
                )
                .with_interval(config.heartbeat_interval);
                if let Some(credentials) = &config.credentials {
                    heartbeat = heartbeat.with_user_id(credentials.user_id.as_str());
                }
                state.task_manager.spawn(HEARTBEAT_TASK, heartbeat.run());
                true
            }
        };

        if !installed {
            tracing::info!("Discarding {} session opened after disconnect", session.kind());
            if let Err(e) = session.close().await {
                tracing::debug!("Error while closing discarded session: {}", e);
            }
            return Err(RealtimeError::Connection(
                "connection attempt superseded".to_string(),
            ));
        }

        tracing::info!("Connected via {}", session.kind());
        self.authenticate(&config).await;
        self.flush_queue().await;
        self.notify_connection_state().await;
        Ok(())
    }

    /// Sends the one-shot authentication event. Rejected credentials
    /// surface later as a close from the backend.
    async fn authenticate(&self, config: &ConnectionConfig) {
        let Some(credentials) = &config.credentials else {
            return;
        };

        let event = RealtimeEvent::authentication(credentials);
        match self.connection.send_event(&event).await {
            Ok(()) => {
                self.state.write().await.stats.record_sent();
                tracing::debug!("Sent authentication for {}", credentials.user_id);
            }
            Err(e) => tracing::warn!("Failed to send authentication: {}", e),
        }
    }

    async fn flush_queue(&self) {
        let pending = self.state.write().await.queue.drain();
        if pending.is_empty() {
            return;
        }

        tracing::info!("Flushing {} queued events", pending.len());
        for event in pending {
            self.send(event).await;
        }
    }

    async fn enqueue(&self, event: RealtimeEvent) {
        let mut state = self.state.write().await;
        if let Some(evicted) = state.queue.push(event) {
            tracing::warn!(
                "Outbound queue full, dropped oldest {} event {}",
                evicted.event_type,
                evicted.id
            );
            state.stats.record_dropped(1);
        }
    }

    async fn read_session(&self, mut events: SessionEventReceiver, generation: u64) {
        tracing::debug!("Starting session reader");
        let reason = loop {
            match events.recv().await {
                Some(SessionEvent::Message(raw)) => self.handle_inbound(&raw).await,
                Some(SessionEvent::Closed(reason)) => {
                    break reason.unwrap_or_else(|| "closed by server".to_string());
                }
                Some(SessionEvent::Error(e)) => break e,
                None => break "session ended".to_string(),
            }
        };

        self.handle_session_lost(generation, &reason).await;
    }

    async fn handle_inbound(&self, raw: &str) {
        let event = match serde_json::from_str::<RealtimeEvent>(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!("Failed to parse message: {} - Raw: {}", e, raw);
                return;
            }
        };
        tracing::debug!("Received {} event {}", event.event_type, event.id);

        let handlers = {
            let mut state = self.state.write().await;
            state.stats.record_received(&event);
            state.dispatcher.handlers_for(event.event_type)
        };

        let summary = invoke_isolated(event.event_type.as_str(), &handlers, &event);
        if summary.failed > 0 {
            tracing::warn!(
                "{} of {} handlers failed for {} event {}",
                summary.failed,
                summary.invoked,
                event.event_type,
                event.id
            );
        }
    }

    async fn handle_session_lost(&self, generation: u64, reason: &str) {
        let (session, generation) = {
            let mut state = self.state.write().await;
            if state.generation != generation {
                return;
            }

            // running inside the reader task
            state.task_manager.detach(READER_TASK);
            state.task_manager.abort(HEARTBEAT_TASK);
            state.stats.mark_disconnected();
            self.connection.set_phase(ConnectionPhase::Reconnecting).await;
            (self.connection.take_session().await, state.next_generation())
        };

        tracing::warn!("Session lost: {}", reason);
        if let Some(session) = session
            && let Err(e) = session.close().await
        {
            tracing::debug!("Error while closing lost session: {}", e);
        }

        self.notify_connection_state().await;
        self.schedule_reconnect(generation).await;
    }

    /// Counts a failed attempt and either schedules the next one or gives up
    async fn schedule_reconnect(&self, generation: u64) {
        let exhausted = {
            let mut state = self.state.write().await;
            if state.generation != generation || state.was_manual_disconnect {
                return;
            }
            if state.reconnect_pending {
                tracing::debug!("Reconnect already scheduled");
                return;
            }

            let attempt = state.timer.record_attempt();
            let max_attempts = state.config.max_reconnect_attempts;
            state.stats.set_reconnect_attempts(attempt);

            if attempt >= max_attempts {
                tracing::error!("Giving up after {} connection attempts", attempt);
                self.connection.set_phase(ConnectionPhase::Exhausted).await;
                true
            } else {
                let delay = state.timer.delay_for(attempt);
                tracing::info!(
                    "Reconnecting in {:?} (attempt {}/{})",
                    delay,
                    attempt,
                    max_attempts
                );

                state.reconnect_pending = true;
                let client = self.clone();
                state.task_manager.spawn(RECONNECT_TASK, async move {
                    time::sleep(delay).await;
                    client.run_scheduled_reconnect(generation).await;
                });
                self.connection.set_phase(ConnectionPhase::Reconnecting).await;
                false
            }
        };

        if exhausted {
            self.notify_connection_state().await;
        }
    }

    async fn run_scheduled_reconnect(&self, generation: u64) {
        {
            let mut state = self.state.write().await;
            if state.generation != generation {
                return;
            }
            // the attempt may replace or abort this very task
            state.task_manager.detach(RECONNECT_TASK);
            state.reconnect_pending = false;
            if state.was_manual_disconnect {
                return;
            }
        }

        tracing::info!("Attempting to reconnect...");
        if let Err(e) = self.open_session(generation).await {
            tracing::warn!("Reconnection attempt failed: {}", e);
        }
    }

    async fn notify_connection_state(&self) {
        let (listeners, snapshot) = {
            let state = self.state.read().await;
            (state.dispatcher.state_listeners(), state.stats.snapshot())
        };

        invoke_isolated("connection-state", &listeners, &snapshot);
    }
}
