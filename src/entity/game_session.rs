//! Game session entity: one continuous span of one user playing one game.
//!
//! # Database Schema
//!
//! | Column           | Type                | Description                          |
//! |------------------|---------------------|--------------------------------------|
//! | id               | BIGINT (Primary Key)| Row id                               |
//! | user_id          | BIGINT (FK)         | Owning `guild_user` row              |
//! | game_name        | TEXT                | Name of the game being played        |
//! | started_at       | TIMESTAMPTZ         | When the session opened              |
//! | ended_at         | TIMESTAMPTZ (NULL)  | When it closed; NULL while open      |
//! | duration_seconds | BIGINT              | Elapsed seconds; 0 while open        |
//!
//! `ended_at IS NULL` is the sole authoritative liveness flag. A closed row
//! stays in this table until an aggregation cycle folds it into
//! [`game_statistic`](super::game_statistic) and deletes it; an open row is
//! never touched by aggregation.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "game_session")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub user_id: i64,

    #[sea_orm(column_type = "Text")]
    pub game_name: String,

    pub started_at: DateTimeWithTimeZone,

    /// NULL while the session is open.
    pub ended_at: Option<DateTimeWithTimeZone>,

    /// Zero until the session closes.
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
