use std::collections::BTreeMap;
use std::time::Duration;

use chrono::TimeDelta;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, NotSet, QueryFilter, Set, TransactionTrait,
};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::entity::{
    activity_event, game_session, game_statistic, message, user, user_statistic, voice_session,
};
use crate::error::Result;
use crate::store::to_db_time;

/// Periodic drain: folds closed session and message rows into the durable
/// counters and deletes exactly the rows it folded.
///
/// Each cycle runs in a single database transaction. The closed portion of
/// the transient tables is snapshotted first, the counters are upserted from
/// that snapshot, and then the snapshot's row ids are deleted; a failure
/// anywhere rolls the whole cycle back, leaving the store unchanged for the
/// next scheduled attempt. Rows still open (`ended_at IS NULL`) are never
/// part of the snapshot and survive untouched, so a session that closes
/// later is folded exactly once by a later cycle.
///
/// Rows that arrive and close *after* the snapshot is taken are simply left
/// for the next cycle; the id-set delete cannot touch them.
#[derive(Debug, Clone)]
pub struct Aggregator {
    conn: DatabaseConnection,
}

/// What one aggregation cycle folded, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub games_updated: usize,
    pub users_updated: usize,
    pub game_sessions_folded: usize,
    pub voice_sessions_folded: usize,
    pub messages_folded: usize,
    pub activity_events_folded: usize,
}

impl DrainSummary {
    /// True when the cycle found nothing to fold.
    pub fn is_empty(&self) -> bool {
        *self == DrainSummary::default()
    }
}

#[derive(Default)]
struct GameFold {
    total_seconds: i64,
    sessions: i64,
    week_seconds: i64,
    month_seconds: i64,
}

#[derive(Default)]
struct UserFold {
    gaming_seconds: i64,
    gaming_week: i64,
    gaming_month: i64,
    voice_seconds: i64,
    voice_week: i64,
    voice_month: i64,
    messages: i64,
    messages_week: i64,
    messages_month: i64,
}

impl Aggregator {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Runs one aggregation cycle against the current wall clock.
    pub async fn run_cycle(&self) -> Result<DrainSummary> {
        self.run_cycle_at(OffsetDateTime::now_utc()).await
    }

    /// Runs one aggregation cycle, evaluating the week/month windows against
    /// `now`.
    ///
    /// The windowed subtotals are recomputed from the snapshot and
    /// overwritten, not accumulated. Because folded rows are deleted, they
    /// approximate "activity since the previous drain clipped to the
    /// window", not a true trailing calendar window; see the field docs on
    /// [`game_statistic`](crate::entity::game_statistic).
    pub async fn run_cycle_at(&self, now: OffsetDateTime) -> Result<DrainSummary> {
        let now_db = to_db_time(now);
        let week_ago = now_db - TimeDelta::days(7);
        let month_ago = now_db - TimeDelta::days(30);

        let txn = self.conn.begin().await?;

        // Snapshot the closed portion of the store. Everything after this
        // point works off these rows and deletes only their ids.
        let game_rows = game_session::Entity::find()
            .filter(game_session::Column::EndedAt.is_not_null())
            .all(&txn)
            .await?;
        let voice_rows = voice_session::Entity::find()
            .filter(voice_session::Column::EndedAt.is_not_null())
            .all(&txn)
            .await?;
        let message_rows = message::Entity::find().all(&txn).await?;
        let event_rows = activity_event::Entity::find()
            .filter(activity_event::Column::EndedAt.is_not_null())
            .all(&txn)
            .await?;

        let mut summary = DrainSummary {
            game_sessions_folded: game_rows.len(),
            voice_sessions_folded: voice_rows.len(),
            messages_folded: message_rows.len(),
            activity_events_folded: event_rows.len(),
            ..DrainSummary::default()
        };

        // Per-game fold.
        let mut per_game: BTreeMap<&str, GameFold> = BTreeMap::new();
        for row in &game_rows {
            let Some(ended_at) = row.ended_at else {
                continue;
            };
            let fold = per_game.entry(row.game_name.as_str()).or_default();
            fold.total_seconds += row.duration_seconds;
            fold.sessions += 1;
            if ended_at > week_ago {
                fold.week_seconds += row.duration_seconds;
            }
            if ended_at > month_ago {
                fold.month_seconds += row.duration_seconds;
            }
        }

        for (game_name, fold) in &per_game {
            upsert_game_statistic(&txn, game_name, fold, now_db).await?;
        }
        summary.games_updated = per_game.len();

        // Per-user fold across all three sources.
        let mut per_user: BTreeMap<i64, UserFold> = BTreeMap::new();
        for row in &game_rows {
            let Some(ended_at) = row.ended_at else {
                continue;
            };
            let fold = per_user.entry(row.user_id).or_default();
            fold.gaming_seconds += row.duration_seconds;
            if ended_at > week_ago {
                fold.gaming_week += row.duration_seconds;
            }
            if ended_at > month_ago {
                fold.gaming_month += row.duration_seconds;
            }
        }
        for row in &voice_rows {
            let Some(ended_at) = row.ended_at else {
                continue;
            };
            let fold = per_user.entry(row.user_id).or_default();
            fold.voice_seconds += row.duration_seconds;
            if ended_at > week_ago {
                fold.voice_week += row.duration_seconds;
            }
            if ended_at > month_ago {
                fold.voice_month += row.duration_seconds;
            }
        }
        for row in &message_rows {
            let fold = per_user.entry(row.user_id).or_default();
            fold.messages += 1;
            if row.created_at > week_ago {
                fold.messages_week += 1;
            }
            if row.created_at > month_ago {
                fold.messages_month += 1;
            }
        }

        for (user_id, fold) in &per_user {
            // A user row always exists before any session row references it;
            // skip the fold rather than fail the cycle if one is missing.
            if user::Entity::find_by_id(*user_id).one(&txn).await?.is_none() {
                warn!(user_id, "sessions reference a missing user; skipped");
                continue;
            }
            upsert_user_statistic(&txn, *user_id, fold, now_db).await?;
            summary.users_updated += 1;
        }

        // Delete exactly the snapshot ids. Open rows are not in the snapshot
        // and are left intact for a later cycle.
        let game_ids: Vec<i64> = game_rows.iter().map(|r| r.id).collect();
        if !game_ids.is_empty() {
            game_session::Entity::delete_many()
                .filter(game_session::Column::Id.is_in(game_ids))
                .exec(&txn)
                .await?;
        }
        let voice_ids: Vec<i64> = voice_rows.iter().map(|r| r.id).collect();
        if !voice_ids.is_empty() {
            voice_session::Entity::delete_many()
                .filter(voice_session::Column::Id.is_in(voice_ids))
                .exec(&txn)
                .await?;
        }
        let message_ids: Vec<i64> = message_rows.iter().map(|r| r.id).collect();
        if !message_ids.is_empty() {
            message::Entity::delete_many()
                .filter(message::Column::Id.is_in(message_ids))
                .exec(&txn)
                .await?;
        }
        let event_ids: Vec<i64> = event_rows.iter().map(|r| r.id).collect();
        if !event_ids.is_empty() {
            activity_event::Entity::delete_many()
                .filter(activity_event::Column::Id.is_in(event_ids))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(summary)
    }

    /// Runs aggregation cycles forever on a fixed interval.
    ///
    /// Intended to be spawned as a background task next to the dispatcher. A
    /// failed cycle has already rolled back; it is logged and retried at the
    /// next tick.
    ///
    /// ```no_run
    /// # async fn example(conn: sea_orm::DatabaseConnection) {
    /// use guild_activity_store::Aggregator;
    ///
    /// let aggregator = Aggregator::new(conn);
    /// tokio::spawn(aggregator.run_periodic(std::time::Duration::from_secs(600)));
    /// # }
    /// ```
    pub async fn run_periodic(self, period: Duration) {
        loop {
            tokio::time::sleep(period).await;
            match self.run_cycle().await {
                Ok(summary) if summary.is_empty() => {
                    info!("aggregation cycle: nothing to fold");
                }
                Ok(summary) => {
                    info!(
                        games = summary.games_updated,
                        users = summary.users_updated,
                        game_sessions = summary.game_sessions_folded,
                        voice_sessions = summary.voice_sessions_folded,
                        messages = summary.messages_folded,
                        "aggregation cycle complete"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "aggregation cycle failed; will retry next tick");
                }
            }
        }
    }
}

async fn upsert_game_statistic<C: ConnectionTrait>(
    conn: &C,
    game_name: &str,
    fold: &GameFold,
    now_db: DateTimeWithTimeZone,
) -> Result<()> {
    match game_statistic::Entity::find()
        .filter(game_statistic::Column::GameName.eq(game_name))
        .one(conn)
        .await?
    {
        Some(existing) => {
            let total_seconds = existing.total_seconds + fold.total_seconds;
            let total_sessions = existing.total_sessions + fold.sessions;
            let mut active = existing.into_active_model();
            active.total_seconds = Set(total_seconds);
            active.total_sessions = Set(total_sessions);
            active.seconds_this_week = Set(fold.week_seconds);
            active.seconds_this_month = Set(fold.month_seconds);
            active.last_updated = Set(now_db);
            active.update(conn).await?;
        }
        None => {
            let row = game_statistic::ActiveModel {
                id: NotSet,
                game_name: Set(game_name.to_owned()),
                total_seconds: Set(fold.total_seconds),
                total_sessions: Set(fold.sessions),
                seconds_this_week: Set(fold.week_seconds),
                seconds_this_month: Set(fold.month_seconds),
                last_updated: Set(now_db),
            };
            row.insert(conn).await?;
        }
    }
    Ok(())
}

async fn upsert_user_statistic<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    fold: &UserFold,
    now_db: DateTimeWithTimeZone,
) -> Result<()> {
    match user_statistic::Entity::find()
        .filter(user_statistic::Column::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        Some(existing) => {
            let total_gaming = existing.total_gaming_seconds + fold.gaming_seconds;
            let total_voice = existing.total_voice_seconds + fold.voice_seconds;
            let total_messages = existing.total_messages + fold.messages;
            let mut active = existing.into_active_model();
            active.total_gaming_seconds = Set(total_gaming);
            active.total_voice_seconds = Set(total_voice);
            active.total_messages = Set(total_messages);
            active.gaming_seconds_this_week = Set(fold.gaming_week);
            active.gaming_seconds_this_month = Set(fold.gaming_month);
            active.voice_seconds_this_week = Set(fold.voice_week);
            active.voice_seconds_this_month = Set(fold.voice_month);
            active.messages_this_week = Set(fold.messages_week);
            active.messages_this_month = Set(fold.messages_month);
            active.last_updated = Set(now_db);
            active.update(conn).await?;
        }
        None => {
            let row = user_statistic::ActiveModel {
                id: NotSet,
                user_id: Set(user_id),
                total_gaming_seconds: Set(fold.gaming_seconds),
                total_voice_seconds: Set(fold.voice_seconds),
                total_messages: Set(fold.messages),
                gaming_seconds_this_week: Set(fold.gaming_week),
                gaming_seconds_this_month: Set(fold.gaming_month),
                voice_seconds_this_week: Set(fold.voice_week),
                voice_seconds_this_month: Set(fold.voice_month),
                messages_this_week: Set(fold.messages_week),
                messages_this_month: Set(fold.messages_month),
                last_updated: Set(now_db),
            };
            row.insert(conn).await?;
        }
    }
    Ok(())
}
