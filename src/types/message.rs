use crate::messaging::EventType;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// A structured event moved between the client and the realtime backend.
///
/// The same JSON shape is used on every transport and in both directions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub payload: Value,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl RealtimeEvent {
    /// Creates an event with a fresh id and the current timestamp.
    pub fn new(event_type: EventType, payload: Value, user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            payload,
            timestamp: Utc::now().timestamp_millis(),
            user_id: user_id.into(),
            game_id: None,
            metadata: None,
        }
    }

    pub fn with_game_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    pub fn like(game_id: &str, user_id: &str) -> Self {
        Self::new(EventType::Like, json!({ "gameId": game_id }), user_id).with_game_id(game_id)
    }

    pub fn follow(target_user_id: &str, user_id: &str) -> Self {
        Self::new(
            EventType::Follow,
            json!({ "targetUserId": target_user_id }),
            user_id,
        )
    }

    pub fn reaction(game_id: &str, user_id: &str, reaction: &str) -> Self {
        Self::new(
            EventType::Reaction,
            json!({ "gameId": game_id, "reaction": reaction }),
            user_id,
        )
        .with_game_id(game_id)
    }

    pub fn comment(game_id: &str, user_id: &str, text: &str) -> Self {
        Self::new(
            EventType::Comment,
            json!({ "gameId": game_id, "text": text }),
            user_id,
        )
        .with_game_id(game_id)
    }

    pub fn share(game_id: &str, user_id: &str) -> Self {
        Self::new(EventType::Share, json!({ "gameId": game_id }), user_id).with_game_id(game_id)
    }

    pub fn user_online(user_id: &str) -> Self {
        Self::new(
            EventType::UserOnline,
            json!({ "userId": user_id, "online": true }),
            user_id,
        )
    }

    pub fn ping(user_id: &str) -> Self {
        Self::new(EventType::Ping, json!({}), user_id)
    }

    /// The one-shot handshake sent right after a session opens.
    pub fn authentication(credentials: &Credentials) -> Self {
        Self::new(
            EventType::Authentication,
            json!({ "token": credentials.token, "userId": credentials.user_id }),
            credentials.user_id.as_str(),
        )
    }
}

/// Token and user id presented to the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub token: String,
    pub user_id: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}
