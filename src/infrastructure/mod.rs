// Infrastructure module - Core background services and utilities
pub mod heartbeat;
pub mod http;
pub mod queue;
pub mod task_manager;
pub mod timer;

pub use heartbeat::HeartbeatManager;
pub use http::{HttpSender, measure_round_trip, request_error, with_auth_headers};
pub use queue::MessageQueue;
pub use task_manager::TaskManager;
pub use timer::ReconnectTimer;
