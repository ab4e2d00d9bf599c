use std::collections::BTreeMap;

use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::warn;

use crate::entity::{
    game_session, game_statistic, message, user, user_statistic, voice_session,
};
use crate::error::Result;
use crate::store::{elapsed_seconds, to_db_time};

/// Read-side queries: live totals and leaderboards for dashboards.
///
/// Every metric merges two sources: the durable counters (everything already
/// drained) and the transient session log (everything not yet drained).
/// Because the aggregator deletes a row in the same transaction that credits
/// it, any row still present in the log is guaranteed not to be reflected in
/// a counter, so summing both never double counts. An open row contributes
/// its elapsed time against the query instant; a closed-but-undrained row
/// contributes its final duration.
///
/// The reader never mutates state and needs no coordination with the writers
/// beyond the store's ordinary read consistency.
#[derive(Debug, Clone)]
pub struct StatReader {
    conn: DatabaseConnection,
}

/// Live per-user totals, durable plus in-flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserTotals {
    pub external_id: i64,
    pub display_name: String,
    pub gaming_seconds: i64,
    pub voice_seconds: i64,
    pub messages: i64,
}

/// Live per-game totals, durable plus in-flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameTotals {
    pub game_name: String,
    pub total_seconds: i64,
    /// Completed sessions only; an open session contributes seconds but is
    /// not counted until it closes.
    pub total_sessions: i64,
    pub open_sessions: i64,
}

/// One row of a top-N leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub value: i64,
}

/// Dashboard bundle: community-wide totals plus the top-5 leaderboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub total_users: u64,
    pub transient_game_sessions: u64,
    pub transient_voice_sessions: u64,
    pub transient_messages: u64,
    pub total_gaming_seconds: i64,
    pub total_voice_seconds: i64,
    pub total_messages: i64,
    pub top_players: Vec<LeaderboardEntry>,
    pub top_games: Vec<LeaderboardEntry>,
    pub top_voice: Vec<LeaderboardEntry>,
    pub top_chatters: Vec<LeaderboardEntry>,
    /// True when the live merge failed and the totals above reflect durable
    /// counters only.
    pub degraded: bool,
}

const LEADERBOARD_SIZE: usize = 5;

impl StatReader {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Live totals for one user, or `None` if the user has never been seen.
    pub async fn user_totals(
        &self,
        external_id: i64,
        now: OffsetDateTime,
    ) -> Result<Option<UserTotals>> {
        let Some(user_row) = user::Entity::find()
            .filter(user::Column::ExternalId.eq(external_id))
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };
        let now_db = to_db_time(now);

        let durable = user_statistic::Entity::find()
            .filter(user_statistic::Column::UserId.eq(user_row.id))
            .one(&self.conn)
            .await?;
        let (mut gaming, mut voice, mut messages) = match durable {
            Some(stat) => (
                stat.total_gaming_seconds,
                stat.total_voice_seconds,
                stat.total_messages,
            ),
            None => (0, 0, 0),
        };

        for row in game_session::Entity::find()
            .filter(game_session::Column::UserId.eq(user_row.id))
            .all(&self.conn)
            .await?
        {
            gaming += live_span(&row.started_at, row.ended_at.as_ref(), row.duration_seconds, &now_db);
        }
        for row in voice_session::Entity::find()
            .filter(voice_session::Column::UserId.eq(user_row.id))
            .all(&self.conn)
            .await?
        {
            voice += live_span(&row.started_at, row.ended_at.as_ref(), row.duration_seconds, &now_db);
        }
        messages += message::Entity::find()
            .filter(message::Column::UserId.eq(user_row.id))
            .count(&self.conn)
            .await? as i64;

        Ok(Some(UserTotals {
            external_id,
            display_name: user_row.display_name,
            gaming_seconds: gaming,
            voice_seconds: voice,
            messages,
        }))
    }

    /// Live totals for one game, or `None` if the game has never been played.
    pub async fn game_totals(
        &self,
        game_name: &str,
        now: OffsetDateTime,
    ) -> Result<Option<GameTotals>> {
        let now_db = to_db_time(now);

        let durable = game_statistic::Entity::find()
            .filter(game_statistic::Column::GameName.eq(game_name))
            .one(&self.conn)
            .await?;
        let transient = game_session::Entity::find()
            .filter(game_session::Column::GameName.eq(game_name))
            .all(&self.conn)
            .await?;

        if durable.is_none() && transient.is_empty() {
            return Ok(None);
        }

        let (mut seconds, mut sessions) = match &durable {
            Some(stat) => (stat.total_seconds, stat.total_sessions),
            None => (0, 0),
        };
        let mut open_sessions = 0;
        for row in &transient {
            seconds += live_span(&row.started_at, row.ended_at.as_ref(), row.duration_seconds, &now_db);
            if row.ended_at.is_some() {
                sessions += 1;
            } else {
                open_sessions += 1;
            }
        }

        Ok(Some(GameTotals {
            game_name: game_name.to_owned(),
            total_seconds: seconds,
            total_sessions: sessions,
            open_sessions,
        }))
    }

    /// Top `k` games by live total seconds.
    pub async fn top_games(&self, k: usize, now: OffsetDateTime) -> Result<Vec<LeaderboardEntry>> {
        let now_db = to_db_time(now);
        let mut per_game: BTreeMap<String, i64> = BTreeMap::new();

        for stat in game_statistic::Entity::find().all(&self.conn).await? {
            *per_game.entry(stat.game_name).or_default() += stat.total_seconds;
        }
        for row in game_session::Entity::find().all(&self.conn).await? {
            *per_game.entry(row.game_name.clone()).or_default() +=
                live_span(&row.started_at, row.ended_at.as_ref(), row.duration_seconds, &now_db);
        }

        Ok(top_k(per_game, k))
    }

    /// Top `k` players by live gaming seconds.
    pub async fn top_players(&self, k: usize, now: OffsetDateTime) -> Result<Vec<LeaderboardEntry>> {
        let now_db = to_db_time(now);
        let mut per_user: BTreeMap<i64, i64> = BTreeMap::new();

        for stat in user_statistic::Entity::find().all(&self.conn).await? {
            *per_user.entry(stat.user_id).or_default() += stat.total_gaming_seconds;
        }
        for row in game_session::Entity::find().all(&self.conn).await? {
            *per_user.entry(row.user_id).or_default() +=
                live_span(&row.started_at, row.ended_at.as_ref(), row.duration_seconds, &now_db);
        }

        self.named_top_k(per_user, k).await
    }

    /// Top `k` users by live voice seconds.
    pub async fn top_voice(&self, k: usize, now: OffsetDateTime) -> Result<Vec<LeaderboardEntry>> {
        let now_db = to_db_time(now);
        let mut per_user: BTreeMap<i64, i64> = BTreeMap::new();

        for stat in user_statistic::Entity::find().all(&self.conn).await? {
            *per_user.entry(stat.user_id).or_default() += stat.total_voice_seconds;
        }
        for row in voice_session::Entity::find().all(&self.conn).await? {
            *per_user.entry(row.user_id).or_default() +=
                live_span(&row.started_at, row.ended_at.as_ref(), row.duration_seconds, &now_db);
        }

        self.named_top_k(per_user, k).await
    }

    /// Top `k` users by live message count.
    pub async fn top_chatters(&self, k: usize) -> Result<Vec<LeaderboardEntry>> {
        let mut per_user: BTreeMap<i64, i64> = BTreeMap::new();

        for stat in user_statistic::Entity::find().all(&self.conn).await? {
            *per_user.entry(stat.user_id).or_default() += stat.total_messages;
        }
        for row in message::Entity::find().all(&self.conn).await? {
            *per_user.entry(row.user_id).or_default() += 1;
        }

        self.named_top_k(per_user, k).await
    }

    /// Full dashboard bundle.
    ///
    /// If the transient-log portion of the query fails, the dashboard
    /// degrades to durable-counter totals (with `degraded` set) instead of
    /// failing to render; only a failure reading the durable counters
    /// themselves is an error.
    pub async fn overview(&self, now: OffsetDateTime) -> Result<Overview> {
        let durable = self.durable_snapshot().await?;
        match self.transient_snapshot().await {
            Ok(transient) => Ok(build_overview(durable, Some(transient), to_db_time(now))),
            Err(e) => {
                warn!(error = %e, "live merge failed; dashboard degraded to durable counters");
                Ok(build_overview(durable, None, to_db_time(now)))
            }
        }
    }

    async fn durable_snapshot(&self) -> Result<DurableSnapshot> {
        Ok(DurableSnapshot {
            users: user::Entity::find().all(&self.conn).await?,
            user_stats: user_statistic::Entity::find().all(&self.conn).await?,
            game_stats: game_statistic::Entity::find().all(&self.conn).await?,
        })
    }

    async fn transient_snapshot(&self) -> Result<TransientSnapshot> {
        Ok(TransientSnapshot {
            game_sessions: game_session::Entity::find().all(&self.conn).await?,
            voice_sessions: voice_session::Entity::find().all(&self.conn).await?,
            messages: message::Entity::find().all(&self.conn).await?,
        })
    }

    async fn named_top_k(
        &self,
        per_user: BTreeMap<i64, i64>,
        k: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        let names: BTreeMap<i64, String> = user::Entity::find()
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|u| (u.id, u.display_name))
            .collect();
        Ok(resolve_names(per_user, &names, k))
    }
}

struct DurableSnapshot {
    users: Vec<user::Model>,
    user_stats: Vec<user_statistic::Model>,
    game_stats: Vec<game_statistic::Model>,
}

struct TransientSnapshot {
    game_sessions: Vec<game_session::Model>,
    voice_sessions: Vec<voice_session::Model>,
    messages: Vec<message::Model>,
}

fn build_overview(
    durable: DurableSnapshot,
    transient: Option<TransientSnapshot>,
    now_db: DateTimeWithTimeZone,
) -> Overview {
    let names: BTreeMap<i64, String> = durable
        .users
        .iter()
        .map(|u| (u.id, u.display_name.clone()))
        .collect();

    let mut gaming_by_user: BTreeMap<i64, i64> = BTreeMap::new();
    let mut voice_by_user: BTreeMap<i64, i64> = BTreeMap::new();
    let mut messages_by_user: BTreeMap<i64, i64> = BTreeMap::new();
    let mut seconds_by_game: BTreeMap<String, i64> = BTreeMap::new();

    for stat in &durable.user_stats {
        *gaming_by_user.entry(stat.user_id).or_default() += stat.total_gaming_seconds;
        *voice_by_user.entry(stat.user_id).or_default() += stat.total_voice_seconds;
        *messages_by_user.entry(stat.user_id).or_default() += stat.total_messages;
    }
    for stat in &durable.game_stats {
        *seconds_by_game.entry(stat.game_name.clone()).or_default() += stat.total_seconds;
    }

    let (degraded, transient_counts) = match &transient {
        Some(t) => {
            for row in &t.game_sessions {
                let span =
                    live_span(&row.started_at, row.ended_at.as_ref(), row.duration_seconds, &now_db);
                *gaming_by_user.entry(row.user_id).or_default() += span;
                *seconds_by_game.entry(row.game_name.clone()).or_default() += span;
            }
            for row in &t.voice_sessions {
                *voice_by_user.entry(row.user_id).or_default() +=
                    live_span(&row.started_at, row.ended_at.as_ref(), row.duration_seconds, &now_db);
            }
            for row in &t.messages {
                *messages_by_user.entry(row.user_id).or_default() += 1;
            }
            (
                false,
                (
                    t.game_sessions.len() as u64,
                    t.voice_sessions.len() as u64,
                    t.messages.len() as u64,
                ),
            )
        }
        None => (true, (0, 0, 0)),
    };

    Overview {
        total_users: durable.users.len() as u64,
        transient_game_sessions: transient_counts.0,
        transient_voice_sessions: transient_counts.1,
        transient_messages: transient_counts.2,
        total_gaming_seconds: gaming_by_user.values().sum(),
        total_voice_seconds: voice_by_user.values().sum(),
        total_messages: messages_by_user.values().sum(),
        top_players: resolve_names(gaming_by_user, &names, LEADERBOARD_SIZE),
        top_games: top_k(seconds_by_game, LEADERBOARD_SIZE),
        top_voice: resolve_names(voice_by_user, &names, LEADERBOARD_SIZE),
        top_chatters: resolve_names(messages_by_user, &names, LEADERBOARD_SIZE),
        degraded,
    }
}

/// Contribution of one session row at read time: final duration when closed,
/// elapsed-so-far when open.
fn live_span(
    started_at: &DateTimeWithTimeZone,
    ended_at: Option<&DateTimeWithTimeZone>,
    duration_seconds: i64,
    now_db: &DateTimeWithTimeZone,
) -> i64 {
    match ended_at {
        Some(_) => duration_seconds,
        None => elapsed_seconds(started_at, now_db),
    }
}

/// Sorts a metric map descending and keeps the first `k`. The sort is stable,
/// so ties keep the map's key order (not significant, just deterministic).
fn top_k(per_key: BTreeMap<String, i64>, k: usize) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = per_key
        .into_iter()
        .map(|(name, value)| LeaderboardEntry { name, value })
        .collect();
    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries.truncate(k);
    entries
}

fn resolve_names(
    per_user: BTreeMap<i64, i64>,
    names: &BTreeMap<i64, String>,
    k: usize,
) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = per_user
        .into_iter()
        .filter_map(|(user_id, value)| {
            names.get(&user_id).map(|name| LeaderboardEntry {
                name: name.clone(),
                value,
            })
        })
        .collect();
    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries.truncate(k);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn top_k_sorts_descending_and_truncates() {
        let entries = top_k(map(&[("a", 10), ("b", 30), ("c", 20)]), 2);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "b");
        assert_eq!(entries[1].name, "c");
    }

    #[test]
    fn top_k_ties_keep_key_order() {
        let entries = top_k(map(&[("zeta", 10), ("alpha", 10)]), 2);
        assert_eq!(entries[0].name, "alpha");
        assert_eq!(entries[1].name, "zeta");
    }
}
