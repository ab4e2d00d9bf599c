use tracing::{debug, info};

use crate::error::Result;
use crate::event::{MessagePosted, Notification, PresenceChanged, VoiceStateChanged};
use crate::store::ActivityStore;

/// Translates normalized platform notifications into session-store mutations.
///
/// Each notification is handled independently; ordering only matters within
/// one user's own event stream, which the
/// [`EventDispatcher`](crate::EventDispatcher) guarantees by sharding. Every
/// operation resolves identity first, so a user row exists (with a fresh
/// display name) before any session row references it.
#[derive(Debug, Clone)]
pub struct EventRecorder {
    store: ActivityStore,
}

impl EventRecorder {
    pub fn new(store: ActivityStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ActivityStore {
        &self.store
    }

    /// Handles a presence update as a full replace of the user's activity set.
    ///
    /// All open activity events and game sessions are closed regardless of
    /// whether the new list still contains an equivalent activity; then each
    /// listed activity is opened fresh. Back-to-back updates that both list
    /// "playing X" therefore produce two separate sessions.
    pub async fn record_presence(&self, notification: &PresenceChanged) -> Result<()> {
        let user = self
            .store
            .resolve_user(&notification.user, notification.observed_at)
            .await?;

        self.store
            .replace_presence(user.id, &notification.activities, notification.observed_at)
            .await?;

        for activity in &notification.activities {
            if activity.kind.is_game() {
                info!(
                    user = %user.display_name,
                    game = %activity.name,
                    "started playing"
                );
            } else {
                debug!(
                    user = %user.display_name,
                    kind = activity.kind.as_str(),
                    name = %activity.name,
                    "activity started"
                );
            }
        }
        Ok(())
    }

    /// Handles a voice state change, decomposed from the (previous, new)
    /// channel pair.
    ///
    /// A switch is a leave followed by a join, executed as two independent
    /// operations since the channel identity changes. A leave with no open
    /// session is a no-op: late and duplicate leave events are expected.
    pub async fn record_voice(&self, notification: &VoiceStateChanged) -> Result<()> {
        let user = self
            .store
            .resolve_user(&notification.user, notification.observed_at)
            .await?;

        if let Some(previous) = notification.previous_channel.as_deref() {
            if notification.new_channel.as_deref() == Some(previous) {
                // Mute/deafen toggles arrive as state changes with the same
                // channel; they carry no session boundary.
                return Ok(());
            }

            let closed = self
                .store
                .close_voice_session(user.id, previous, notification.observed_at)
                .await?;
            if closed {
                info!(user = %user.display_name, channel = previous, "left voice");
            } else {
                debug!(
                    user = %user.display_name,
                    channel = previous,
                    "voice leave with no open session"
                );
            }
        }

        if let Some(new) = notification.new_channel.as_deref() {
            self.store
                .open_voice_session(user.id, new, notification.observed_at)
                .await?;
            info!(user = %user.display_name, channel = new, "joined voice");
        }

        Ok(())
    }

    /// Appends one message row.
    pub async fn record_message(&self, notification: &MessagePosted) -> Result<()> {
        let user = self
            .store
            .resolve_user(&notification.user, notification.observed_at)
            .await?;

        self.store
            .append_message(
                user.id,
                &notification.channel_name,
                notification.content_length,
                notification.observed_at,
            )
            .await
    }

    /// Dispatches over the notification enum; used by the worker pool.
    pub async fn record(&self, notification: &Notification) -> Result<()> {
        match notification {
            Notification::Presence(n) => self.record_presence(n).await,
            Notification::Voice(n) => self.record_voice(n).await,
            Notification::Message(n) => self.record_message(n).await,
        }
    }
}
