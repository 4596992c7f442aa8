use super::{Endpoints, Session, SessionEvent, SessionEventSender, TransportKind};
use crate::infrastructure::{HttpSender, TaskManager, request_error, with_auth_headers};
use crate::types::{Credentials, POLL_INTERVAL, RealtimeError, RealtimeEvent, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{self, Instant, MissedTickBehavior};
use url::Url;

const POLL_TASK: &str = "poll-loop";

/// Plain HTTP session: GET `{base}/poll` every second, POST `{base}/send` to transmit
pub struct PollingSession {
    sender: HttpSender,
    tasks: Mutex<TaskManager>,
    closed: AtomicBool,
}

struct Poller {
    client: reqwest::Client,
    url: Url,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl Poller {
    async fn poll_once(&self) -> Result<Vec<String>> {
        let request = self.client.get(self.url.clone()).timeout(self.timeout);
        let response = with_auth_headers(request, self.credentials.as_ref())
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(RealtimeError::Transport(format!(
                "poll failed with status: {}",
                status
            )));
        }

        Ok(split_poll_body(&response.text().await?))
    }
}

impl PollingSession {
    /// The first poll must succeed for the session to count as open.
    /// Every request, polls and sends alike, is bounded by `timeout`.
    pub async fn open(
        client: reqwest::Client,
        endpoints: &Endpoints,
        credentials: Option<&Credentials>,
        timeout: Duration,
        events: SessionEventSender,
    ) -> Result<Self> {
        let poller = Poller {
            client: client.clone(),
            url: endpoints.poll()?,
            credentials: credentials.cloned(),
            timeout,
        };
        tracing::info!("Starting HTTP polling at {}", poller.url);

        let initial = poller.poll_once().await?;
        for raw in initial {
            let _ = events.send(SessionEvent::Message(raw));
        }

        let mut tasks = TaskManager::new();
        tasks.spawn(POLL_TASK, poll_loop(poller, events));

        Ok(Self {
            sender: HttpSender::new(client, endpoints.send()?, credentials.cloned(), timeout),
            tasks: Mutex::new(tasks),
            closed: AtomicBool::new(false),
        })
    }
}

async fn poll_loop(poller: Poller, events: SessionEventSender) {
    let period = Duration::from_millis(POLL_INTERVAL);
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match poller.poll_once().await {
            Ok(batch) => {
                for raw in batch {
                    if events.send(SessionEvent::Message(raw)).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Poll request failed: {}", e);
                let _ = events.send(SessionEvent::Error(e.to_string()));
                return;
            }
        }
    }
}

/// Splits a poll response into raw event frames.
///
/// Accepts a JSON array of events, a single event, or an empty body. A body
/// that is not JSON is passed through whole so the client reports it as a
/// parse failure.
pub fn split_poll_body(body: &str) -> Vec<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => items.iter().map(Value::to_string).collect(),
        Ok(Value::Null) => Vec::new(),
        _ => vec![trimmed.to_string()],
    }
}

#[async_trait]
impl Session for PollingSession {
    fn kind(&self) -> TransportKind {
        TransportKind::Polling
    }

    async fn send(&self, event: &RealtimeEvent) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RealtimeError::NotConnected);
        }
        self.sender.post(event).await
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.tasks.lock().await.abort_all();
        Ok(())
    }
}
