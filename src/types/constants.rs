/// Endpoint path suffixes appended to the configured base URL
pub mod endpoints {
    pub const WEBSOCKET: &str = "websocket";
    pub const EVENTS: &str = "events";
    pub const PING: &str = "ping";
    pub const POLL: &str = "poll";
    pub const SEND: &str = "send";
}

/// HTTP header carrying the user id for polling and send requests
pub const USER_ID_HEADER: &str = "X-User-ID";

/// Default open/probe timeout (milliseconds)
pub const DEFAULT_TIMEOUT: u64 = 10000;

/// Default heartbeat interval (milliseconds)
pub const HEARTBEAT_INTERVAL: u64 = 30000;

/// Default base reconnect interval (milliseconds)
pub const RECONNECT_INTERVAL: u64 = 1000;

/// Default reconnect attempt budget
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Upper bound for a single backoff delay (milliseconds)
pub const MAX_RECONNECT_DELAY: u64 = 60000;

/// Interval between polling requests (milliseconds)
pub const POLL_INTERVAL: u64 = 1000;

/// Default outbound queue capacity
pub const MAX_QUEUE_SIZE: usize = 1000;

/// Latency below this is classified excellent (milliseconds)
pub const EXCELLENT_LATENCY: u64 = 100;

/// Latency below this is classified good (milliseconds)
pub const GOOD_LATENCY: u64 = 300;
