//! Community member identity entity.
//!
//! Rows are created the first time a user is observed in any notification and
//! are never deleted; the display name is refreshed on every event since the
//! chat platform is the source of truth for identity.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "guild_user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Stable identifier assigned by the chat platform.
    #[sea_orm(unique)]
    pub external_id: i64,

    #[sea_orm(column_type = "Text")]
    pub display_name: String,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::game_session::Entity")]
    GameSession,
    #[sea_orm(has_many = "super::voice_session::Entity")]
    VoiceSession,
    #[sea_orm(has_many = "super::message::Entity")]
    Message,
    #[sea_orm(has_many = "super::activity_event::Entity")]
    ActivityEvent,
}

impl Related<super::game_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GameSession.def()
    }
}

impl Related<super::voice_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VoiceSession.def()
    }
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Message.def()
    }
}

impl Related<super::activity_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
