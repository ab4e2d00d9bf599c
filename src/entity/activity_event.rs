//! Generic presence activity entity.
//!
//! A superset log mirroring [`game_session`](super::game_session): every
//! activity a user's presence lists (playing, listening, watching, ...) opens
//! one row here, with the same `ended_at IS NULL` open/close discipline.
//! Game-kind activities additionally open a `game_session` row.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "activity_event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub user_id: i64,

    /// Classification label, see [`ActivityKind`](crate::event::ActivityKind).
    #[sea_orm(column_type = "Text")]
    pub activity_kind: String,

    #[sea_orm(column_type = "Text")]
    pub activity_name: String,

    /// Platform-provided detail payload; `{}` when the platform sent none.
    pub activity_details: Json,

    pub started_at: DateTimeWithTimeZone,

    pub ended_at: Option<DateTimeWithTimeZone>,
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
