use super::{EventFilter, EventType};
use crate::client::ConnectionStats;
use crate::types::RealtimeEvent;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Callback invoked for every matching inbound event
pub type EventHandler = Arc<dyn Fn(&RealtimeEvent) + Send + Sync + 'static>;

/// Callback invoked with a stats snapshot on every open/close transition
pub type ConnectionStateHandler = Arc<dyn Fn(&ConnectionStats) + Send + Sync + 'static>;

/// Identifies a registered handler so it can be removed later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Result of delivering one value to a set of handlers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub invoked: usize,
    pub failed: usize,
}

/// Routes inbound events to type-keyed and wildcard handlers
#[derive(Default)]
pub struct EventDispatcher {
    next_id: u64,
    typed: HashMap<EventType, Vec<(HandlerId, EventHandler)>>,
    wildcard: Vec<(HandlerId, EventHandler)>,
    state_listeners: Vec<(HandlerId, ConnectionStateHandler)>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn make_id(&mut self) -> HandlerId {
        self.next_id += 1;
        HandlerId(self.next_id)
    }

    pub fn register(&mut self, filter: EventFilter, handler: EventHandler) -> HandlerId {
        let id = self.make_id();
        match filter {
            EventFilter::Type(event_type) => {
                self.typed.entry(event_type).or_default().push((id, handler))
            }
            EventFilter::Any => self.wildcard.push((id, handler)),
        }
        id
    }

    /// Removes an event handler; returns false if the id is unknown
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let before = self.handler_count();
        for handlers in self.typed.values_mut() {
            handlers.retain(|(existing, _)| *existing != id);
        }
        self.typed.retain(|_, handlers| !handlers.is_empty());
        self.wildcard.retain(|(existing, _)| *existing != id);
        self.handler_count() != before
    }

    pub fn register_state_listener(&mut self, handler: ConnectionStateHandler) -> HandlerId {
        let id = self.make_id();
        self.state_listeners.push((id, handler));
        id
    }

    pub fn unregister_state_listener(&mut self, id: HandlerId) -> bool {
        let before = self.state_listeners.len();
        self.state_listeners.retain(|(existing, _)| *existing != id);
        self.state_listeners.len() != before
    }

    /// Handlers for an event type in delivery order: type-specific first, then wildcard
    pub fn handlers_for(&self, event_type: EventType) -> Vec<EventHandler> {
        self.typed
            .get(&event_type)
            .into_iter()
            .flatten()
            .chain(self.wildcard.iter())
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }

    pub fn state_listeners(&self) -> Vec<ConnectionStateHandler> {
        self.state_listeners
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }

    pub fn handler_count(&self) -> usize {
        self.typed.values().map(Vec::len).sum::<usize>() + self.wildcard.len()
    }
}

/// Invokes each handler in order, catching panics so one failing handler
/// never prevents delivery to the rest
pub fn invoke_isolated<T: ?Sized>(
    label: &str,
    handlers: &[Arc<dyn Fn(&T) + Send + Sync + 'static>],
    value: &T,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();

    for handler in handlers {
        summary.invoked += 1;
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(value))) {
            summary.failed += 1;
            tracing::error!(
                "Handler for '{}' failed: {}",
                label,
                panic_message(&*panic)
            );
        }
    }

    summary
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
