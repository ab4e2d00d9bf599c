use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, NotSet, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use time::OffsetDateTime;
use tracing::warn;

use crate::entity::{activity_event, game_session, message, user, voice_session};
use crate::error::Result;
use crate::event::{Activity, UserHandle};

/// The shared session store: the single source of truth for "what is
/// happening right now".
///
/// `ActivityStore` owns every open/close mutation of the transient tables
/// (`game_session`, `voice_session`, `message`, `activity_event`), so the
/// one-open-session invariants are enforced in one place rather than being
/// duplicated across call sites. The [`EventRecorder`](crate::EventRecorder)
/// translates platform notifications into calls on this type; the
/// [`Aggregator`](crate::Aggregator) is the only other writer and only ever
/// removes rows this store has finished with (closed rows).
///
/// All timestamps cross the API boundary as [`time::OffsetDateTime`] and are
/// stored as timezone-aware columns; durations are computed from the stored
/// `started_at` and the notification's observed instant, never from
/// processing time.
#[derive(Debug, Clone)]
pub struct ActivityStore {
    conn: DatabaseConnection,
}

impl ActivityStore {
    /// Creates a store over an established Sea-ORM connection.
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// The underlying connection, for wiring up the aggregator and reader.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Resolves an external user handle to its durable user row, creating the
    /// row on first sight and refreshing the display name otherwise.
    ///
    /// Last-write-wins on the name; the chat platform is the source of truth
    /// for identity, so no conflict detection is needed. Storage failure
    /// propagates to the caller and fails that operation only.
    pub async fn resolve_user(
        &self,
        handle: &UserHandle,
        observed_at: OffsetDateTime,
    ) -> Result<user::Model> {
        let now_db = to_db_time(observed_at);

        match user::Entity::find()
            .filter(user::Column::ExternalId.eq(handle.external_id))
            .one(&self.conn)
            .await?
        {
            Some(existing) => {
                let mut active = existing.into_active_model();
                active.display_name = Set(handle.display_name.clone());
                active.updated_at = Set(now_db);
                Ok(active.update(&self.conn).await?)
            }
            None => {
                let row = user::ActiveModel {
                    id: NotSet,
                    external_id: Set(handle.external_id),
                    display_name: Set(handle.display_name.clone()),
                    created_at: Set(now_db),
                    updated_at: Set(now_db),
                };
                Ok(row.insert(&self.conn).await?)
            }
        }
    }

    /// Applies a full-replace presence update for one user.
    ///
    /// Closes every open activity event and game session for the user, then
    /// opens one activity event per entry in `activities` (plus a game
    /// session for game-kind entries). The close-all-then-reopen pair runs in
    /// one transaction so a failure leaves the user's presence state
    /// unchanged.
    ///
    /// Note the deliberate consequence: two consecutive updates that both
    /// list the same activity produce two separate sessions, not one
    /// continuous one.
    pub async fn replace_presence(
        &self,
        user_id: i64,
        activities: &[Activity],
        observed_at: OffsetDateTime,
    ) -> Result<()> {
        let now_db = to_db_time(observed_at);
        let txn = self.conn.begin().await?;

        close_open_activity_events(&txn, user_id, now_db).await?;
        close_open_game_sessions(&txn, user_id, now_db).await?;

        for activity in activities {
            let event = activity_event::ActiveModel {
                id: NotSet,
                user_id: Set(user_id),
                activity_kind: Set(activity.kind.as_str().to_owned()),
                activity_name: Set(activity.name.clone()),
                activity_details: Set(activity.details.clone()),
                started_at: Set(now_db),
                ended_at: Set(None),
            };
            event.insert(&txn).await?;

            if activity.kind.is_game() {
                let session = game_session::ActiveModel {
                    id: NotSet,
                    user_id: Set(user_id),
                    game_name: Set(activity.name.clone()),
                    started_at: Set(now_db),
                    ended_at: Set(None),
                    duration_seconds: Set(0),
                };
                session.insert(&txn).await?;
            }
        }

        txn.commit().await?;
        Ok(())
    }

    /// Opens a voice session for (user, channel).
    ///
    /// An already-open session for the exact channel indicates a missed leave
    /// event; the duplicate open is tolerated (logged, not repaired) and
    /// reconciled at close time, which always closes the latest open row.
    pub async fn open_voice_session(
        &self,
        user_id: i64,
        channel_name: &str,
        observed_at: OffsetDateTime,
    ) -> Result<()> {
        let already_open = voice_session::Entity::find()
            .filter(voice_session::Column::UserId.eq(user_id))
            .filter(voice_session::Column::ChannelName.eq(channel_name))
            .filter(voice_session::Column::EndedAt.is_null())
            .one(&self.conn)
            .await?;

        if already_open.is_some() {
            warn!(
                user_id,
                channel = channel_name,
                "voice join with a session already open; missed leave event?"
            );
        }

        let session = voice_session::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            channel_name: Set(channel_name.to_owned()),
            started_at: Set(to_db_time(observed_at)),
            ended_at: Set(None),
            duration_seconds: Set(0),
        };
        session.insert(&self.conn).await?;
        Ok(())
    }

    /// Closes the most recent open voice session for (user, channel).
    ///
    /// Returns `false` without error when none is open; duplicate or late
    /// leave events are expected and must not fail.
    pub async fn close_voice_session(
        &self,
        user_id: i64,
        channel_name: &str,
        observed_at: OffsetDateTime,
    ) -> Result<bool> {
        let now_db = to_db_time(observed_at);

        let open = voice_session::Entity::find()
            .filter(voice_session::Column::UserId.eq(user_id))
            .filter(voice_session::Column::ChannelName.eq(channel_name))
            .filter(voice_session::Column::EndedAt.is_null())
            .order_by_desc(voice_session::Column::StartedAt)
            .order_by_desc(voice_session::Column::Id)
            .one(&self.conn)
            .await?;

        match open {
            Some(row) => {
                let duration = elapsed_seconds(&row.started_at, &now_db);
                let mut active = row.into_active_model();
                active.ended_at = Set(Some(now_db));
                active.duration_seconds = Set(duration);
                active.update(&self.conn).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Appends one immutable message row. No open/close state.
    pub async fn append_message(
        &self,
        user_id: i64,
        channel_name: &str,
        message_length: i32,
        observed_at: OffsetDateTime,
    ) -> Result<()> {
        let row = message::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            channel_name: Set(channel_name.to_owned()),
            message_length: Set(message_length),
            created_at: Set(to_db_time(observed_at)),
        };
        row.insert(&self.conn).await?;
        Ok(())
    }
}

async fn close_open_activity_events<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    now_db: DateTimeWithTimeZone,
) -> Result<()> {
    let open = activity_event::Entity::find()
        .filter(activity_event::Column::UserId.eq(user_id))
        .filter(activity_event::Column::EndedAt.is_null())
        .all(conn)
        .await?;

    for row in open {
        let mut active = row.into_active_model();
        active.ended_at = Set(Some(now_db));
        active.update(conn).await?;
    }
    Ok(())
}

async fn close_open_game_sessions<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    now_db: DateTimeWithTimeZone,
) -> Result<()> {
    let open = game_session::Entity::find()
        .filter(game_session::Column::UserId.eq(user_id))
        .filter(game_session::Column::EndedAt.is_null())
        .all(conn)
        .await?;

    for row in open {
        let duration = elapsed_seconds(&row.started_at, &now_db);
        let mut active = row.into_active_model();
        active.ended_at = Set(Some(now_db));
        active.duration_seconds = Set(duration);
        active.update(conn).await?;
    }
    Ok(())
}

/// Converts a `time::OffsetDateTime` into the chrono timestamp type Sea-ORM
/// stores. Out-of-range instants clamp to the epoch rather than panicking.
pub(crate) fn to_db_time(instant: OffsetDateTime) -> DateTimeWithTimeZone {
    DateTime::<Utc>::from_timestamp(instant.unix_timestamp(), instant.nanosecond())
        .unwrap_or_default()
        .into()
}

/// Whole seconds between two stored timestamps, clamped at zero so clock skew
/// in the event source can never produce a negative duration.
pub(crate) fn elapsed_seconds(
    started_at: &DateTimeWithTimeZone,
    ended_at: &DateTimeWithTimeZone,
) -> i64 {
    ended_at.signed_duration_since(started_at).num_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn db_time_round_trips_unix_timestamp() {
        let instant = datetime!(2025-06-01 12:30:45 UTC);
        let db = to_db_time(instant);
        assert_eq!(db.timestamp(), instant.unix_timestamp());
    }

    #[test]
    fn elapsed_is_clamped_at_zero() {
        let earlier = to_db_time(datetime!(2025-06-01 12:00:00 UTC));
        let later = to_db_time(datetime!(2025-06-01 13:00:00 UTC));
        assert_eq!(elapsed_seconds(&earlier, &later), 3600);
        assert_eq!(elapsed_seconds(&later, &earlier), 0);
    }
}
