//! In-memory connector used by unit tests.

use super::{
    Connector, Session, SessionEvent, SessionEventSender, TransportCapabilities, TransportKind,
};
use crate::client::ConnectionConfig;
use crate::messaging::EventType;
use crate::types::{RealtimeError, RealtimeEvent, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Default)]
pub(crate) struct MockSession {
    kind: Option<TransportKind>,
    sent: Mutex<Vec<RealtimeEvent>>,
    fail_sends: AtomicBool,
    closed: AtomicBool,
}

impl MockSession {
    pub fn sent(&self) -> Vec<RealtimeEvent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_of(&self, event_type: EventType) -> Vec<RealtimeEvent> {
        self.sent()
            .into_iter()
            .filter(|event| event.event_type == event_type)
            .collect()
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Session for MockSession {
    fn kind(&self) -> TransportKind {
        self.kind.unwrap_or(TransportKind::WebSocket)
    }

    async fn send(&self, event: &RealtimeEvent) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RealtimeError::NotConnected);
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(RealtimeError::Transport("mock send failure".to_string()));
        }
        self.sent.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct MockState {
    probe: Option<Duration>,
    capabilities: TransportCapabilities,
    open_ok: bool,
    open_delay: Option<Duration>,
    scripted: VecDeque<bool>,
    attempts: Vec<(Instant, TransportKind)>,
    sessions: Vec<Arc<MockSession>>,
    senders: Vec<SessionEventSender>,
}

#[derive(Clone)]
pub(crate) struct MockConnector {
    inner: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Fast probe (20ms) and opens that always succeed
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                probe: Some(Duration::from_millis(20)),
                capabilities: TransportCapabilities::default(),
                open_ok: true,
                open_delay: None,
                scripted: VecDeque::new(),
                attempts: Vec::new(),
                sessions: Vec::new(),
                senders: Vec::new(),
            })),
        }
    }

    /// Every open attempt is refused
    pub fn failing() -> Self {
        let connector = Self::new();
        connector.set_open_ok(false);
        connector
    }

    /// `None` makes the probe fail
    pub fn with_probe(self, probe: Option<Duration>) -> Self {
        self.inner.lock().unwrap().probe = probe;
        self
    }

    pub fn with_capabilities(self, capabilities: TransportCapabilities) -> Self {
        self.inner.lock().unwrap().capabilities = capabilities;
        self
    }

    pub fn with_open_delay(self, delay: Duration) -> Self {
        self.inner.lock().unwrap().open_delay = Some(delay);
        self
    }

    pub fn set_open_ok(&self, ok: bool) {
        self.inner.lock().unwrap().open_ok = ok;
    }

    /// Outcomes for the next open attempts, consumed before `open_ok` applies
    pub fn script(&self, outcomes: &[bool]) {
        self.inner.lock().unwrap().scripted.extend(outcomes);
    }

    pub fn open_attempts(&self) -> usize {
        self.inner.lock().unwrap().attempts.len()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.inner
            .lock()
            .unwrap()
            .attempts
            .iter()
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn attempted_kinds(&self) -> Vec<TransportKind> {
        self.inner
            .lock()
            .unwrap()
            .attempts
            .iter()
            .map(|(_, kind)| *kind)
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }

    pub fn last_session(&self) -> Arc<MockSession> {
        let state = self.inner.lock().unwrap();
        Arc::clone(state.sessions.last().expect("no session opened"))
    }

    fn last_sender(&self) -> SessionEventSender {
        let state = self.inner.lock().unwrap();
        state.senders.last().expect("no session opened").clone()
    }

    /// Delivers a raw inbound frame on the latest session
    pub fn inject(&self, raw: &str) {
        let _ = self.last_sender().send(SessionEvent::Message(raw.to_string()));
    }

    /// Simulates the backend closing the latest session
    pub fn close_remote(&self, reason: &str) {
        let _ = self
            .last_sender()
            .send(SessionEvent::Closed(Some(reason.to_string())));
    }

    pub fn fail_remote(&self, reason: &str) {
        let _ = self
            .last_sender()
            .send(SessionEvent::Error(reason.to_string()));
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn capabilities(&self) -> TransportCapabilities {
        self.inner.lock().unwrap().capabilities
    }

    async fn probe(&self, _config: &ConnectionConfig) -> Result<Duration> {
        let probe = self.inner.lock().unwrap().probe;
        probe.ok_or_else(|| RealtimeError::Transport("mock probe failure".to_string()))
    }

    async fn open(
        &self,
        kind: TransportKind,
        _config: &ConnectionConfig,
        events: SessionEventSender,
    ) -> Result<Arc<dyn Session>> {
        let (ok, delay) = {
            let mut state = self.inner.lock().unwrap();
            state.attempts.push((Instant::now(), kind));
            let ok = state.scripted.pop_front().unwrap_or(state.open_ok);
            (ok, state.open_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if !ok {
            return Err(RealtimeError::Connection("mock open refused".to_string()));
        }

        let session = Arc::new(MockSession {
            kind: Some(kind),
            ..Default::default()
        });
        let mut state = self.inner.lock().unwrap();
        state.sessions.push(Arc::clone(&session));
        state.senders.push(events);
        Ok(session as Arc<dyn Session>)
    }
}

/// How the stub answers one HTTP request
pub(crate) enum StubReply {
    /// Raw response bytes; the connection is closed after writing them
    Raw(String),
    /// Accept the request and never answer
    Hang,
}

impl StubReply {
    pub fn ok(content_type: &str, body: &str) -> Self {
        Self::Raw(format!(
            "HTTP/1.1 200 OK\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            content_type,
            body.len(),
            body
        ))
    }

    pub fn status(code: u16) -> Self {
        Self::Raw(format!(
            "HTTP/1.1 {} Stub\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
            code
        ))
    }

    /// An event stream that ends when the connection closes
    pub fn event_stream(body: &str) -> Self {
        Self::Raw(format!(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n{}",
            body
        ))
    }
}

type StubResponder = dyn Fn(usize, &str) -> StubReply + Send + Sync;

/// Minimal HTTP/1.1 server on 127.0.0.1 serving canned responses.
///
/// The responder receives the zero-based request index and the request
/// line. Recorded requests keep the request line as sent and lowercase the
/// header block.
pub(crate) struct StubServer {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    accept_task: tokio::task::JoinHandle<()>,
}

impl StubServer {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(usize, &str) -> StubReply + Send + Sync + 'static,
    {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responder: Arc<StubResponder> = Arc::new(responder);

        let recorded = Arc::clone(&requests);
        let accept_task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let recorded = Arc::clone(&recorded);
                let responder = Arc::clone(&responder);
                tokio::spawn(serve_connection(socket, recorded, responder));
            }
        });

        Self {
            addr,
            requests,
            accept_task,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> url::Url {
        url::Url::parse(&format!("{}/{}", self.base_url(), path)).unwrap()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn serve_connection(
    mut socket: tokio::net::TcpStream,
    recorded: Arc<Mutex<Vec<String>>>,
    responder: Arc<StubResponder>,
) {
    use tokio::io::AsyncWriteExt;

    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    let request_line = request.lines().next().unwrap_or_default().to_string();
    let index = {
        let mut recorded = recorded.lock().unwrap();
        recorded.push(request);
        recorded.len() - 1
    };

    match responder(index, &request_line) {
        StubReply::Raw(response) => {
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        StubReply::Hang => {
            let _socket = socket;
            std::future::pending::<()>().await;
        }
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<String> {
    use tokio::io::AsyncReadExt;

    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let read = socket.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(pos) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..head_end]).to_string();
    let (request_line, headers) = head.split_once("\r\n").unwrap_or((head.as_str(), ""));
    let headers = headers.to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buffer.len() < head_end + content_length {
        let read = socket.read(&mut chunk).await.ok()?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }

    let body = String::from_utf8_lossy(&buffer[head_end..]).to_string();
    Some(format!("{}\r\n{}{}", request_line, headers, body))
}
