use super::{ConnectionConfig, StatsTracker};
use crate::infrastructure::{MessageQueue, ReconnectTimer, TaskManager};
use crate::messaging::EventDispatcher;

/// Task names tracked by the client's [`TaskManager`]
pub(crate) const READER_TASK: &str = "session-reader";
pub(crate) const HEARTBEAT_TASK: &str = "heartbeat";
pub(crate) const RECONNECT_TASK: &str = "reconnect";

/// Consolidated mutable state for RealtimeClient
/// Using a single struct reduces lock contention
pub struct ClientState {
    /// Settings for the current and future connection attempts
    pub config: ConnectionConfig,

    pub stats: StatsTracker,

    /// Outbound events awaiting an open session
    pub queue: MessageQueue,

    /// Event handlers and connection-state listeners
    pub dispatcher: EventDispatcher,

    /// Background task manager
    pub task_manager: TaskManager,

    /// Attempt counter and backoff schedule
    pub timer: ReconnectTimer,

    /// A retry is already scheduled; further losses must not schedule another
    pub reconnect_pending: bool,

    /// Whether the disconnect was manual (prevents auto-reconnect)
    pub was_manual_disconnect: bool,

    /// Bumped whenever a session is installed or torn down.
    /// Work tagged with an older generation is discarded.
    pub generation: u64,
}

impl ClientState {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            queue: MessageQueue::new(config.max_queue_size),
            timer: ReconnectTimer::new(config.reconnect_interval),
            config,
            stats: StatsTracker::new(),
            dispatcher: EventDispatcher::new(),
            task_manager: TaskManager::new(),
            reconnect_pending: false,
            was_manual_disconnect: false,
            generation: 0,
        }
    }

    /// Replaces the configuration, resizing the queue and restarting the backoff schedule
    pub fn apply_config(&mut self, config: ConnectionConfig) {
        let evicted = self.queue.set_capacity(config.max_queue_size);
        if !evicted.is_empty() {
            tracing::warn!(
                "Queue shrunk to {}, dropped {} oldest events",
                config.max_queue_size,
                evicted.len()
            );
            self.stats.record_dropped(evicted.len());
        }

        self.timer = ReconnectTimer::new(config.reconnect_interval);
        self.stats.set_reconnect_attempts(0);
        self.config = config;
    }

    /// Start a new session generation and return it
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}
