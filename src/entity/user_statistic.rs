//! Durable per-user counters, written only by the aggregator.
//!
//! Lifetime totals accumulate; the `*_this_week` / `*_this_month` fields are
//! overwritten each cycle (same windowed-subtotal semantics as
//! [`game_statistic`](super::game_statistic)).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_statistic")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique)]
    pub user_id: i64,

    pub total_gaming_seconds: i64,
    pub total_voice_seconds: i64,
    pub total_messages: i64,

    pub gaming_seconds_this_week: i64,
    pub gaming_seconds_this_month: i64,
    pub voice_seconds_this_week: i64,
    pub voice_seconds_this_month: i64,
    pub messages_this_week: i64,
    pub messages_this_month: i64,

    pub last_updated: DateTimeWithTimeZone,
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
