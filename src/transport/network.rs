use super::{
    Connector, Endpoints, PollingSession, Session, SessionEventSender, SseSession, TransportKind,
    WebSocketSession,
};
use crate::client::ConnectionConfig;
use crate::infrastructure::measure_round_trip;
use crate::types::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Production connector backed by `tokio-tungstenite` and `reqwest`
#[derive(Clone)]
pub struct NetworkConnector {
    http: reqwest::Client,
}

impl NetworkConnector {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Uses a preconfigured client (proxy, TLS roots) for every HTTP request
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Default for NetworkConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for NetworkConnector {
    async fn probe(&self, config: &ConnectionConfig) -> Result<Duration> {
        let endpoints = Endpoints::new(&config.url)?;
        measure_round_trip(&self.http, endpoints.ping()?, config.timeout).await
    }

    async fn open(
        &self,
        kind: TransportKind,
        config: &ConnectionConfig,
        events: SessionEventSender,
    ) -> Result<Arc<dyn Session>> {
        let endpoints = Endpoints::new(&config.url)?;
        let credentials = config.credentials.as_ref();

        let session: Arc<dyn Session> = match kind {
            TransportKind::WebSocket => Arc::new(
                WebSocketSession::open(&endpoints.websocket()?, config.timeout, events).await?,
            ),
            TransportKind::Sse => Arc::new(
                SseSession::open(
                    self.http.clone(),
                    &endpoints,
                    credentials,
                    config.timeout,
                    events,
                )
                .await?,
            ),
            TransportKind::Polling => Arc::new(
                PollingSession::open(
                    self.http.clone(),
                    &endpoints,
                    credentials,
                    config.timeout,
                    events,
                )
                .await?,
            ),
        };

        Ok(session)
    }
}
