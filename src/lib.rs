//! # Adaptive Realtime
//!
//! A realtime event client that adapts its transport to the network:
//! WebSocket on fast links, Server-Sent Events on average ones, and HTTP
//! polling everywhere else. Sessions are kept alive with heartbeats,
//! re-established with exponential backoff, and outbound events are queued
//! while disconnected.
//!
//! ## Example
//!
//! ```no_run
//! use adaptive_realtime_rs::{ConnectOptions, EventFilter, EventType, RealtimeClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RealtimeClient::builder("https://realtime.example.com")?
//!         .credentials("your-token", "user-1")?
//!         .build()?;
//!
//!     client.on(EventType::Follow, |event| println!("new follower: {}", event.user_id)).await;
//!     client.on(EventFilter::Any, |event| println!("event: {}", event.event_type)).await;
//!
//!     client.connect(ConnectOptions::default()).await?;
//!     client.send_like("game-1", "user-1").await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod transport;
pub mod types;

pub use client::{
    ConnectOptions, ConnectionConfig, ConnectionPhase, ConnectionQuality, ConnectionStats,
    RealtimeClient, RealtimeClientBuilder,
};
pub use messaging::{EventFilter, EventType, HandlerId};
pub use transport::{Connector, NetworkConnector, Session, TransportCapabilities, TransportKind};
pub use types::{Credentials, RealtimeError, RealtimeEvent, Result};
