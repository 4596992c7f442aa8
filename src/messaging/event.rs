use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-safe event kinds carried in the `type` field of every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Like,
    Follow,
    Comment,
    Share,
    Reaction,
    GameUpdate,
    UserOnline,
    Notification,
    Authentication,
    Ping,
}

impl EventType {
    pub const ALL: [EventType; 10] = [
        Self::Like,
        Self::Follow,
        Self::Comment,
        Self::Share,
        Self::Reaction,
        Self::GameUpdate,
        Self::UserOnline,
        Self::Notification,
        Self::Authentication,
        Self::Ping,
    ];

    /// Parse a wire string into an event type
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == s)
    }

    /// Convert event to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Follow => "follow",
            Self::Comment => "comment",
            Self::Share => "share",
            Self::Reaction => "reaction",
            Self::GameUpdate => "game_update",
            Self::UserOnline => "user_online",
            Self::Notification => "notification",
            Self::Authentication => "authentication",
            Self::Ping => "ping",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects which events a handler receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    /// Only events of this type
    Type(EventType),
    /// Every event (wildcard)
    Any,
}

impl EventFilter {
    pub fn matches(&self, event_type: EventType) -> bool {
        match self {
            Self::Type(expected) => *expected == event_type,
            Self::Any => true,
        }
    }
}

impl From<EventType> for EventFilter {
    fn from(event_type: EventType) -> Self {
        Self::Type(event_type)
    }
}
