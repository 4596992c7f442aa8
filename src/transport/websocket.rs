use super::{Session, SessionEvent, SessionEventSender, TransportKind};
use crate::infrastructure::TaskManager;
use crate::types::{RealtimeError, RealtimeEvent, Result};
use async_trait::async_trait;
use futures::SinkExt;
use futures::stream::{SplitSink, SplitStream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const READ_TASK: &str = "websocket-read";

/// Full-duplex session over a single WebSocket.
///
/// Writes and the close handshake are bounded by `write_timeout`, so a peer
/// that stops reading cannot hold the writer lock past that deadline.
pub struct WebSocketSession {
    writer: Mutex<Option<SplitSink<WsStream, Message>>>,
    tasks: Mutex<TaskManager>,
    write_timeout: Duration,
    closed: AtomicBool,
}

impl WebSocketSession {
    /// Performs the WebSocket handshake and starts forwarding text frames
    pub async fn open(
        url: &Url,
        write_timeout: Duration,
        events: SessionEventSender,
    ) -> Result<Self> {
        tracing::info!("Opening WebSocket to {}", url);
        let (stream, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
        let (write_half, read_half) = stream.split();

        let mut tasks = TaskManager::new();
        tasks.spawn(READ_TASK, read_frames(read_half, events));

        Ok(Self {
            writer: Mutex::new(Some(write_half)),
            tasks: Mutex::new(tasks),
            write_timeout,
            closed: AtomicBool::new(false),
        })
    }
}

async fn read_frames(mut read_half: SplitStream<WsStream>, events: SessionEventSender) {
    tracing::debug!("Starting WebSocket read task");
    while let Some(frame) = read_half.next().await {
        let forwarded = match frame {
            Ok(Message::Text(text)) => {
                tracing::debug!("Received text frame: {}", text.as_str());
                events.send(SessionEvent::Message(text.as_str().to_owned()))
            }
            Ok(Message::Close(frame)) => {
                let reason = match frame {
                    Some(close_frame) => {
                        tracing::warn!(
                            "Server closed connection: code={:?}, reason='{}'",
                            close_frame.code,
                            close_frame.reason
                        );
                        format!("{} {}", close_frame.code, close_frame.reason)
                    }
                    None => {
                        tracing::warn!("Server closed connection without close frame");
                        "closed without frame".to_string()
                    }
                };
                let _ = events.send(SessionEvent::Closed(Some(reason)));
                return;
            }
            Ok(Message::Binary(data)) => {
                tracing::warn!("Ignoring unexpected binary message ({} bytes)", data.len());
                Ok(())
            }
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => Ok(()),
            Err(e) => {
                tracing::error!("WebSocket read error: {}", e);
                let _ = events.send(SessionEvent::Error(e.to_string()));
                return;
            }
        };

        // Receiver gone, nobody is listening anymore
        if forwarded.is_err() {
            return;
        }
    }

    let _ = events.send(SessionEvent::Closed(Some("stream ended".to_string())));
}

#[async_trait]
impl Session for WebSocketSession {
    fn kind(&self) -> TransportKind {
        TransportKind::WebSocket
    }

    async fn send(&self, event: &RealtimeEvent) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RealtimeError::NotConnected);
        }
        let json = serde_json::to_string(event)?;

        let mut writer = time::timeout(self.write_timeout, self.writer.lock())
            .await
            .map_err(|_| RealtimeError::Timeout)?;
        let Some(ws) = writer.as_mut() else {
            return Err(RealtimeError::NotConnected);
        };
        time::timeout(self.write_timeout, ws.send(Message::Text(json.into())))
            .await
            .map_err(|_| RealtimeError::Timeout)??;
        Ok(())
    }

    /// Closes the WebSocket connection, gracefully when the peer cooperates
    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.tasks.lock().await.abort_all();

        let Ok(mut writer) = time::timeout(self.write_timeout, self.writer.lock()).await else {
            tracing::warn!("WebSocket writer busy, dropping connection without close frame");
            return Ok(());
        };
        if let Some(mut ws) = writer.take() {
            match time::timeout(self.write_timeout, ws.close()).await {
                Ok(result) => result?,
                Err(_) => tracing::warn!("WebSocket close handshake timed out"),
            }
        }
        Ok(())
    }
}
