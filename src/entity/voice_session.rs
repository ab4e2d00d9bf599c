//! Voice session entity: one continuous span of one user in one voice channel.
//!
//! Same open/close discipline as [`game_session`](super::game_session):
//! `ended_at IS NULL` while the user is in the channel, `duration_seconds`
//! filled in on close. A user may hold at most one open row per channel; a
//! duplicate open (missed leave event) is tolerated and reconciled at close
//! time by closing the latest open row.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "voice_session")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub user_id: i64,

    #[sea_orm(column_type = "Text")]
    pub channel_name: String,

    pub started_at: DateTimeWithTimeZone,

    /// NULL while the user is still in the channel.
    pub ended_at: Option<DateTimeWithTimeZone>,

    pub duration_seconds: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
