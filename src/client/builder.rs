use super::{ClientState, ConnectionManager, RealtimeClient};
use crate::transport::{Connector, NetworkConnector};
use crate::types::{
    Credentials, DEFAULT_TIMEOUT, HEARTBEAT_INTERVAL, MAX_QUEUE_SIZE, MAX_RECONNECT_ATTEMPTS,
    RECONNECT_INTERVAL, RealtimeError, Result,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use url::Url;

/// Settings used for one connection attempt.
///
/// Only replaced wholesale, either through [`ConnectOptions`] on
/// `connect()` or through `reconfigure()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    /// Base URL every transport endpoint is derived from
    pub url: String,
    /// Base delay of the exponential backoff
    pub reconnect_interval: Duration,
    pub max_reconnect_attempts: u32,
    pub heartbeat_interval: Duration,
    /// Bound on the quality probe and on every open attempt
    pub timeout: Duration,
    pub credentials: Option<Credentials>,
    /// Outbound queue bound, zero for unbounded
    pub max_queue_size: usize,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_interval: Duration::from_millis(RECONNECT_INTERVAL),
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            heartbeat_interval: Duration::from_millis(HEARTBEAT_INTERVAL),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT),
            credentials: None,
            max_queue_size: MAX_QUEUE_SIZE,
        }
    }

    /// Returns a copy with every `Some` field of `options` applied
    pub fn merged(&self, options: ConnectOptions) -> Self {
        let mut config = self.clone();
        if let Some(url) = options.url {
            config.url = url;
        }
        if let Some(ms) = options.reconnect_interval {
            config.reconnect_interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = options.max_reconnect_attempts {
            config.max_reconnect_attempts = attempts;
        }
        if let Some(ms) = options.heartbeat_interval {
            config.heartbeat_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = options.timeout {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(credentials) = options.credentials {
            config.credentials = Some(credentials);
        }
        if let Some(size) = options.max_queue_size {
            config.max_queue_size = size;
        }
        config
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.url)?;
        if !matches!(url.scheme(), "http" | "https" | "ws" | "wss") {
            return Err(RealtimeError::Config(format!(
                "unsupported URL scheme: {}",
                url.scheme()
            )));
        }

        if self.reconnect_interval.is_zero() {
            return Err(RealtimeError::Config(
                "reconnect interval must be positive".to_string(),
            ));
        }
        if self.heartbeat_interval.is_zero() {
            return Err(RealtimeError::Config(
                "heartbeat interval must be positive".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(RealtimeError::Config("timeout must be positive".to_string()));
        }

        if let Some(credentials) = &self.credentials
            && (credentials.token.is_empty() || credentials.user_id.is_empty())
        {
            return Err(RealtimeError::Auth(
                "token and user id are required".to_string(),
            ));
        }

        Ok(())
    }
}

/// Partial configuration accepted by `connect()`.
///
/// Durations are in milliseconds.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub url: Option<String>,
    pub reconnect_interval: Option<u64>,
    pub max_reconnect_attempts: Option<u32>,
    pub heartbeat_interval: Option<u64>,
    pub timeout: Option<u64>,
    pub credentials: Option<Credentials>,
    pub max_queue_size: Option<usize>,
}

/// Builder for [`RealtimeClient`]
pub struct RealtimeClientBuilder {
    config: ConnectionConfig,
    connector: Option<Arc<dyn Connector>>,
}

impl RealtimeClientBuilder {
    /// Create a new builder; fails if `url` is not a valid URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        Url::parse(&url)?;

        Ok(Self {
            config: ConnectionConfig::new(url),
            connector: None,
        })
    }

    pub fn credentials(
        mut self,
        token: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self> {
        let credentials = Credentials::new(token, user_id);
        if credentials.token.is_empty() || credentials.user_id.is_empty() {
            return Err(RealtimeError::Auth(
                "token and user id are required".to_string(),
            ));
        }
        self.config.credentials = Some(credentials);
        Ok(self)
    }

    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.config.reconnect_interval = interval;
        self
    }

    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.max_reconnect_attempts = attempts;
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.config.max_queue_size = size;
        self
    }

    /// Replaces the network connector, e.g. with one restricted to fewer transports
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Build the client. No connection is made until `connect()`.
    pub fn build(self) -> Result<RealtimeClient> {
        self.config.validate()?;

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(NetworkConnector::new()));

        Ok(RealtimeClient {
            connector,
            connection: Arc::new(ConnectionManager::new()),
            state: Arc::new(RwLock::new(ClientState::new(self.config))),
        })
    }
}
