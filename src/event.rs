//! Normalized notification types consumed from the chat-platform client.
//!
//! The platform client is an external collaborator; it is expected to translate
//! its own gateway payloads into these three notification kinds and hand them
//! to an [`EventDispatcher`](crate::EventDispatcher) (or directly to an
//! [`EventRecorder`](crate::EventRecorder) when per-user ordering is already
//! guaranteed by the caller).
//!
//! Every notification carries the instant it was observed; all session
//! durations are computed from these instants, never from processing time.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// External identity of a community member as the platform reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserHandle {
    /// Stable platform-assigned id.
    pub external_id: i64,
    /// Current display name; refreshed on every observed event.
    pub display_name: String,
}

impl UserHandle {
    pub fn new(external_id: i64, display_name: impl Into<String>) -> Self {
        Self {
            external_id,
            display_name: display_name.into(),
        }
    }
}

/// Classification of a presence activity.
///
/// Only [`Game`](ActivityKind::Game) opens a game session; every kind opens an
/// activity event row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Game,
    Listening,
    Watching,
    Streaming,
    Custom,
    Unknown,
}

impl ActivityKind {
    /// Label stored in the `activity_event.activity_kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Game => "game",
            ActivityKind::Listening => "listening",
            ActivityKind::Watching => "watching",
            ActivityKind::Streaming => "streaming",
            ActivityKind::Custom => "custom",
            ActivityKind::Unknown => "unknown",
        }
    }

    pub fn is_game(self) -> bool {
        matches!(self, ActivityKind::Game)
    }
}

/// One activity from a presence update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub name: String,
    /// Platform-provided detail payload, `{}` when absent.
    #[serde(default = "empty_details")]
    pub details: serde_json::Value,
}

fn empty_details() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Activity {
    pub fn new(kind: ActivityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            details: empty_details(),
        }
    }

    /// Convenience constructor for a game activity.
    pub fn game(name: impl Into<String>) -> Self {
        Self::new(ActivityKind::Game, name)
    }
}

/// A user's presence changed; `activities` is the full new activity list, not
/// a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceChanged {
    pub user: UserHandle,
    pub activities: Vec<Activity>,
    pub observed_at: OffsetDateTime,
}

/// A user's voice state changed.
///
/// `(None, Some(_))` is a join, `(Some(_), None)` a leave, and two different
/// channels a switch. Equal channels carry no state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceStateChanged {
    pub user: UserHandle,
    pub previous_channel: Option<String>,
    pub new_channel: Option<String>,
    pub observed_at: OffsetDateTime,
}

/// A user posted a chat message; only the length is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePosted {
    pub user: UserHandle,
    pub channel_name: String,
    pub content_length: i32,
    pub observed_at: OffsetDateTime,
}

/// Any of the three notification kinds, as routed through the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Presence(PresenceChanged),
    Voice(VoiceStateChanged),
    Message(MessagePosted),
}

impl Notification {
    /// External id of the user the notification belongs to; the dispatcher
    /// shards on this to keep one user's events in arrival order.
    pub fn external_user_id(&self) -> i64 {
        match self {
            Notification::Presence(n) => n.user.external_id,
            Notification::Voice(n) => n.user.external_id,
            Notification::Message(n) => n.user.external_id,
        }
    }
}

impl From<PresenceChanged> for Notification {
    fn from(n: PresenceChanged) -> Self {
        Notification::Presence(n)
    }
}

impl From<VoiceStateChanged> for Notification {
    fn from(n: VoiceStateChanged) -> Self {
        Notification::Voice(n)
    }
}

impl From<MessagePosted> for Notification {
    fn from(n: MessagePosted) -> Self {
        Notification::Message(n)
    }
}
