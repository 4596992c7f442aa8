// Messaging module - Event types and handler dispatch
pub mod event;
pub mod router;

pub use event::{EventFilter, EventType};
pub use router::{
    ConnectionStateHandler, DispatchSummary, EventDispatcher, EventHandler, HandlerId,
    invoke_isolated,
};
