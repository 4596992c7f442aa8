// Module declarations
mod builder;
mod connection;
mod core;
mod state;
mod stats;


// Public API exports
pub use builder::{ConnectOptions, ConnectionConfig, RealtimeClientBuilder};
pub use connection::{ConnectionManager, ConnectionPhase};
pub use self::core::RealtimeClient;
pub use state::ClientState;
pub use stats::{ConnectionQuality, ConnectionStats, StatsTracker};
