//! Server-Sent Events session.
//!
//! Inbound traffic arrives on a long-lived `GET {base}/events` stream whose
//! `data:` lines carry JSON events. SSE is receive-only, so outbound events
//! are POSTed to `{base}/send`.

use super::{Endpoints, Session, SessionEvent, SessionEventSender, TransportKind};
use crate::infrastructure::{HttpSender, TaskManager};
use crate::types::{Credentials, RealtimeError, RealtimeEvent, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time;

const STREAM_TASK: &str = "sse-stream";

pub struct SseSession {
    sender: HttpSender,
    tasks: Mutex<TaskManager>,
    closed: AtomicBool,
}

impl SseSession {
    /// `timeout` bounds the stream handshake and each outbound POST. The
    /// stream itself stays open for as long as the backend keeps it open.
    pub async fn open(
        client: reqwest::Client,
        endpoints: &Endpoints,
        credentials: Option<&Credentials>,
        timeout: Duration,
        events: SessionEventSender,
    ) -> Result<Self> {
        let url = endpoints.events(credentials)?;
        tracing::info!("Opening event stream at {}", endpoints.events(None)?);

        let request = client
            .get(url)
            .header("Accept", "text/event-stream")
            .send();
        let response = time::timeout(timeout, request)
            .await
            .map_err(|_| RealtimeError::Timeout)??;

        if !response.status().is_success() {
            return Err(RealtimeError::Transport(format!(
                "event stream rejected with status: {}",
                response.status()
            )));
        }

        let mut tasks = TaskManager::new();
        tasks.spawn(STREAM_TASK, async move {
            let mut frames = Box::pin(parse_sse_events(response.bytes_stream()));
            while let Some(data) = frames.next().await {
                if events.send(SessionEvent::Message(data)).is_err() {
                    return;
                }
            }
            let _ = events.send(SessionEvent::Closed(Some("event stream ended".to_string())));
        });

        Ok(Self {
            sender: HttpSender::new(client, endpoints.send()?, credentials.cloned(), timeout),
            tasks: Mutex::new(tasks),
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Session for SseSession {
    fn kind(&self) -> TransportKind {
        TransportKind::Sse
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

/// Turns a chunked byte stream into SSE event payloads.
///
/// Consecutive `data:` lines are joined with `\n` and emitted at the blank
/// line that terminates the event. Comments and other fields (`event:`,
/// `id:`, `retry:`) are skipped. A read error ends the stream.
pub fn parse_sse_events<S, E>(byte_stream: S) -> impl Stream<Item = String> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    futures::stream::unfold(
        (
            Box::pin(byte_stream.fuse()),
            BytesMut::with_capacity(8192),
            Vec::<String>::new(),
        ),
        |(mut stream, mut buffer, mut data_lines)| async move {
            loop {
                if let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                    let mut line_bytes = buffer.split_to(newline_pos + 1);
                    line_bytes.truncate(line_bytes.len() - 1);
                    if line_bytes.last() == Some(&b'\r') {
                        line_bytes.truncate(line_bytes.len() - 1);
                    }

                    // invalid UTF-8 lines are skipped
                    let Ok(line) = std::str::from_utf8(&line_bytes) else {
                        continue;
                    };

                    if line.is_empty() {
                        if !data_lines.is_empty() {
                            let data = data_lines.join("\n");
                            data_lines.clear();
                            return Some((data, (stream, buffer, data_lines)));
                        }
                        continue;
                    }

                    if let Some(value) = data_field(line) {
                        data_lines.push(value.to_string());
                    }
                    continue;
                }

                match stream.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(e)) => {
                        tracing::warn!("SSE stream read error: {}", e);
                        return None;
                    }
                    None => {
                        // final event without a terminating blank line
                        if data_lines.is_empty() {
                            return None;
                        }
                        let data = data_lines.join("\n");
                        data_lines.clear();
                        return Some((data, (stream, buffer, data_lines)));
                    }
                }
            }
        },
    )
}

fn data_field(line: &str) -> Option<&str> {
    if line.starts_with(':') {
        return None;
    }
    let value = line.strip_prefix("data:")?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}
