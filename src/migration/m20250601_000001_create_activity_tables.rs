use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GuildUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GuildUser::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GuildUser::ExternalId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(GuildUser::DisplayName).text().not_null())
                    .col(
                        ColumnDef::new(GuildUser::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GuildUser::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GameSession::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameSession::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GameSession::UserId).big_integer().not_null())
                    .col(ColumnDef::new(GameSession::GameName).text().not_null())
                    .col(
                        ColumnDef::new(GameSession::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GameSession::EndedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(GameSession::DurationSeconds)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_session_user")
                            .from(GameSession::Table, GameSession::UserId)
                            .to(GuildUser::Table, GuildUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_session_user_open")
                    .table(GameSession::Table)
                    .col(GameSession::UserId)
                    .col(GameSession::EndedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VoiceSession::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VoiceSession::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VoiceSession::UserId).big_integer().not_null())
                    .col(ColumnDef::new(VoiceSession::ChannelName).text().not_null())
                    .col(
                        ColumnDef::new(VoiceSession::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VoiceSession::EndedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(VoiceSession::DurationSeconds)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_voice_session_user")
                            .from(VoiceSession::Table, VoiceSession::UserId)
                            .to(GuildUser::Table, GuildUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_voice_session_user_channel_open")
                    .table(VoiceSession::Table)
                    .col(VoiceSession::UserId)
                    .col(VoiceSession::ChannelName)
                    .col(VoiceSession::EndedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Message::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Message::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Message::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Message::ChannelName).text().not_null())
                    .col(ColumnDef::new(Message::MessageLength).integer().not_null())
                    .col(
                        ColumnDef::new(Message::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_user")
                            .from(Message::Table, Message::UserId)
                            .to(GuildUser::Table, GuildUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_message_user")
                    .table(Message::Table)
                    .col(Message::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ActivityEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityEvent::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivityEvent::UserId).big_integer().not_null())
                    .col(ColumnDef::new(ActivityEvent::ActivityKind).text().not_null())
                    .col(ColumnDef::new(ActivityEvent::ActivityName).text().not_null())
                    .col(ColumnDef::new(ActivityEvent::ActivityDetails).json().not_null())
                    .col(
                        ColumnDef::new(ActivityEvent::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ActivityEvent::EndedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_event_user")
                            .from(ActivityEvent::Table, ActivityEvent::UserId)
                            .to(GuildUser::Table, GuildUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_event_user_open")
                    .table(ActivityEvent::Table)
                    .col(ActivityEvent::UserId)
                    .col(ActivityEvent::EndedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GameStatistic::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameStatistic::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GameStatistic::GameName)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(GameStatistic::TotalSeconds)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GameStatistic::TotalSessions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GameStatistic::SecondsThisWeek)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GameStatistic::SecondsThisMonth)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GameStatistic::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserStatistic::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserStatistic::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserStatistic::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(UserStatistic::TotalGamingSeconds)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserStatistic::TotalVoiceSeconds)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserStatistic::TotalMessages)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserStatistic::GamingSecondsThisWeek)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserStatistic::GamingSecondsThisMonth)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserStatistic::VoiceSecondsThisWeek)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserStatistic::VoiceSecondsThisMonth)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserStatistic::MessagesThisWeek)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserStatistic::MessagesThisMonth)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserStatistic::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_statistic_user")
                            .from(UserStatistic::Table, UserStatistic::UserId)
                            .to(GuildUser::Table, GuildUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserStatistic::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GameStatistic::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ActivityEvent::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VoiceSession::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GameSession::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GuildUser::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum GuildUser {
    Table,
    Id,
    ExternalId,
    DisplayName,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum GameSession {
    Table,
    Id,
    UserId,
    GameName,
    StartedAt,
    EndedAt,
    DurationSeconds,
}

#[derive(DeriveIden)]
enum VoiceSession {
    Table,
    Id,
    UserId,
    ChannelName,
    StartedAt,
    EndedAt,
    DurationSeconds,
}

#[derive(DeriveIden)]
enum Message {
    Table,
    Id,
    UserId,
    ChannelName,
    MessageLength,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ActivityEvent {
    Table,
    Id,
    UserId,
    ActivityKind,
    ActivityName,
    ActivityDetails,
    StartedAt,
    EndedAt,
}

#[derive(DeriveIden)]
enum GameStatistic {
    Table,
    Id,
    GameName,
    TotalSeconds,
    TotalSessions,
    SecondsThisWeek,
    SecondsThisMonth,
    LastUpdated,
}

#[derive(DeriveIden)]
enum UserStatistic {
    Table,
    Id,
    UserId,
    TotalGamingSeconds,
    TotalVoiceSeconds,
    TotalMessages,
    GamingSecondsThisWeek,
    GamingSecondsThisMonth,
    VoiceSecondsThisWeek,
    VoiceSecondsThisMonth,
    MessagesThisWeek,
    MessagesThisMonth,
    LastUpdated,
}
