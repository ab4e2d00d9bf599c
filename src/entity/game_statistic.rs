//! Durable per-game counters, written only by the aggregator.
//!
//! `total_seconds` and `total_sessions` are lifetime totals and only ever
//! grow. The windowed fields are overwritten on every aggregation cycle from
//! whatever closed sessions were still in the transient log, so they
//! approximate "activity since the previous drain clipped to the window"
//! rather than a true trailing calendar window.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "game_statistic")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text", unique)]
    pub game_name: String,

    pub total_seconds: i64,
    pub total_sessions: i64,

    pub seconds_this_week: i64,
    pub seconds_this_month: i64,

    pub last_updated: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
