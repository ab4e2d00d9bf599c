mod common;

use guild_activity_store::entity::{activity_event, game_session, message, user, voice_session};
use guild_activity_store::event::{
    Activity, ActivityKind, MessagePosted, PresenceChanged, UserHandle, VoiceStateChanged,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use time::macros::datetime;
use time::OffsetDateTime;

const T0: OffsetDateTime = datetime!(2025-06-01 12:00:00 UTC);

fn alice() -> UserHandle {
    UserHandle::new(1001, "alice")
}

fn presence(
    user: UserHandle,
    activities: Vec<Activity>,
    observed_at: OffsetDateTime,
) -> PresenceChanged {
    PresenceChanged {
        user,
        activities,
        observed_at,
    }
}

fn voice(
    user: UserHandle,
    previous: Option<&str>,
    new: Option<&str>,
    observed_at: OffsetDateTime,
) -> VoiceStateChanged {
    VoiceStateChanged {
        user,
        previous_channel: previous.map(str::to_owned),
        new_channel: new.map(str::to_owned),
        observed_at,
    }
}

#[tokio::test]
async fn presence_full_replace_creates_two_sessions_for_same_game() {
    let recorder = common::recorder().await;
    let conn = recorder.store().connection();

    recorder
        .record_presence(&presence(alice(), vec![Activity::game("Chess")], T0))
        .await
        .unwrap();
    recorder
        .record_presence(&presence(
            alice(),
            vec![Activity::game("Chess")],
            T0 + time::Duration::seconds(600),
        ))
        .await
        .unwrap();

    let sessions = game_session::Entity::find().all(conn).await.unwrap();
    assert_eq!(sessions.len(), 2, "full replace opens a fresh session");

    let open: Vec<_> = sessions.iter().filter(|s| s.ended_at.is_none()).collect();
    assert_eq!(open.len(), 1, "at most one open game session per user");

    let closed: Vec<_> = sessions.iter().filter(|s| s.ended_at.is_some()).collect();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].duration_seconds, 600);
}

#[tokio::test]
async fn empty_presence_closes_everything() {
    let recorder = common::recorder().await;
    let conn = recorder.store().connection();

    recorder
        .record_presence(&presence(
            alice(),
            vec![
                Activity::game("Chess"),
                Activity::new(ActivityKind::Listening, "Radio"),
            ],
            T0,
        ))
        .await
        .unwrap();
    recorder
        .record_presence(&presence(
            alice(),
            vec![],
            T0 + time::Duration::seconds(120),
        ))
        .await
        .unwrap();

    let open_sessions = game_session::Entity::find()
        .filter(game_session::Column::EndedAt.is_null())
        .all(conn)
        .await
        .unwrap();
    assert!(open_sessions.is_empty());

    let open_events = activity_event::Entity::find()
        .filter(activity_event::Column::EndedAt.is_null())
        .all(conn)
        .await
        .unwrap();
    assert!(open_events.is_empty());

    let closed = game_session::Entity::find().all(conn).await.unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].duration_seconds, 120);
}

#[tokio::test]
async fn non_game_activity_opens_event_but_no_game_session() {
    let recorder = common::recorder().await;
    let conn = recorder.store().connection();

    recorder
        .record_presence(&presence(
            alice(),
            vec![Activity::new(ActivityKind::Watching, "A Movie")],
            T0,
        ))
        .await
        .unwrap();

    assert_eq!(
        activity_event::Entity::find().all(conn).await.unwrap().len(),
        1
    );
    assert!(game_session::Entity::find()
        .all(conn)
        .await
        .unwrap()
        .is_empty());

    let event = activity_event::Entity::find()
        .one(conn)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.activity_kind, "watching");
    assert_eq!(event.activity_name, "A Movie");
}

#[tokio::test]
async fn voice_join_then_leave_records_duration() {
    let recorder = common::recorder().await;
    let conn = recorder.store().connection();

    recorder
        .record_voice(&voice(alice(), None, Some("Lobby"), T0))
        .await
        .unwrap();
    recorder
        .record_voice(&voice(
            alice(),
            Some("Lobby"),
            None,
            T0 + time::Duration::seconds(300),
        ))
        .await
        .unwrap();

    let sessions = voice_session::Entity::find().all(conn).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].duration_seconds, 300);
    assert!(sessions[0].ended_at.is_some());
}

#[tokio::test]
async fn voice_leave_without_join_is_a_noop() {
    let recorder = common::recorder().await;
    let conn = recorder.store().connection();

    recorder
        .record_voice(&voice(alice(), Some("Lobby"), None, T0))
        .await
        .unwrap();

    assert!(voice_session::Entity::find()
        .all(conn)
        .await
        .unwrap()
        .is_empty());
    // The user row is still resolved; the leave itself just had nothing to
    // close.
    assert_eq!(user::Entity::find().all(conn).await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_voice_join_opens_second_session_and_leave_closes_latest() {
    let recorder = common::recorder().await;
    let conn = recorder.store().connection();

    recorder
        .record_voice(&voice(alice(), None, Some("Lobby"), T0))
        .await
        .unwrap();
    // Missed leave: another join for the same channel.
    recorder
        .record_voice(&voice(
            alice(),
            None,
            Some("Lobby"),
            T0 + time::Duration::seconds(100),
        ))
        .await
        .unwrap();
    recorder
        .record_voice(&voice(
            alice(),
            Some("Lobby"),
            None,
            T0 + time::Duration::seconds(250),
        ))
        .await
        .unwrap();

    let sessions = voice_session::Entity::find().all(conn).await.unwrap();
    assert_eq!(sessions.len(), 2);

    let closed: Vec<_> = sessions.iter().filter(|s| s.ended_at.is_some()).collect();
    assert_eq!(closed.len(), 1, "leave closes only the latest open row");
    assert_eq!(closed[0].duration_seconds, 150);
}

#[tokio::test]
async fn voice_switch_closes_old_channel_and_opens_new() {
    let recorder = common::recorder().await;
    let conn = recorder.store().connection();

    recorder
        .record_voice(&voice(alice(), None, Some("Lobby"), T0))
        .await
        .unwrap();
    recorder
        .record_voice(&voice(
            alice(),
            Some("Lobby"),
            Some("Gaming"),
            T0 + time::Duration::seconds(200),
        ))
        .await
        .unwrap();

    let lobby = voice_session::Entity::find()
        .filter(voice_session::Column::ChannelName.eq("Lobby"))
        .one(conn)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lobby.duration_seconds, 200);
    assert!(lobby.ended_at.is_some());

    let gaming = voice_session::Entity::find()
        .filter(voice_session::Column::ChannelName.eq("Gaming"))
        .one(conn)
        .await
        .unwrap()
        .unwrap();
    assert!(gaming.ended_at.is_none());
}

#[tokio::test]
async fn voice_state_change_within_same_channel_is_a_noop() {
    let recorder = common::recorder().await;
    let conn = recorder.store().connection();

    recorder
        .record_voice(&voice(alice(), None, Some("Lobby"), T0))
        .await
        .unwrap();
    // Mute/deafen toggle: same channel on both sides.
    recorder
        .record_voice(&voice(
            alice(),
            Some("Lobby"),
            Some("Lobby"),
            T0 + time::Duration::seconds(60),
        ))
        .await
        .unwrap();

    let sessions = voice_session::Entity::find().all(conn).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].ended_at.is_none());
}

#[tokio::test]
async fn messages_append_and_resolver_refreshes_display_name() {
    let recorder = common::recorder().await;
    let conn = recorder.store().connection();

    recorder
        .record_message(&MessagePosted {
            user: UserHandle::new(1001, "alice"),
            channel_name: "general".to_owned(),
            content_length: 24,
            observed_at: T0,
        })
        .await
        .unwrap();
    recorder
        .record_message(&MessagePosted {
            user: UserHandle::new(1001, "alice_renamed"),
            channel_name: "general".to_owned(),
            content_length: 7,
            observed_at: T0 + time::Duration::seconds(30),
        })
        .await
        .unwrap();

    let users = user::Entity::find().all(conn).await.unwrap();
    assert_eq!(users.len(), 1, "resolver upserts a single row per handle");
    assert_eq!(users[0].display_name, "alice_renamed");
    assert_eq!(users[0].external_id, 1001);

    let messages = message::Entity::find().all(conn).await.unwrap();
    assert_eq!(messages.len(), 2);
    let total_length: i32 = messages.iter().map(|m| m.message_length).sum();
    assert_eq!(total_length, 31);
}
