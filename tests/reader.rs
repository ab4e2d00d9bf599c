mod common;

use guild_activity_store::event::{
    Activity, MessagePosted, PresenceChanged, UserHandle, VoiceStateChanged,
};
use guild_activity_store::{Aggregator, StatReader};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const T0: OffsetDateTime = datetime!(2025-06-01 12:00:00 UTC);

fn handle(id: i64, name: &str) -> UserHandle {
    UserHandle::new(id, name)
}

fn playing(user: UserHandle, game: &str, observed_at: OffsetDateTime) -> PresenceChanged {
    PresenceChanged {
        user,
        activities: vec![Activity::game(game)],
        observed_at,
    }
}

fn idle(user: UserHandle, observed_at: OffsetDateTime) -> PresenceChanged {
    PresenceChanged {
        user,
        activities: vec![],
        observed_at,
    }
}

#[tokio::test]
async fn live_total_merges_durable_closed_and_open_contributions() {
    let recorder = common::recorder().await;
    let conn = recorder.store().connection().clone();
    let aggregator = Aggregator::new(conn.clone());
    let reader = StatReader::new(conn);

    // Durable part: a 1000s session, drained.
    recorder
        .record_presence(&playing(handle(1, "alice"), "Chess", T0))
        .await
        .unwrap();
    recorder
        .record_presence(&idle(handle(1, "alice"), T0 + Duration::seconds(1000)))
        .await
        .unwrap();
    aggregator
        .run_cycle_at(T0 + Duration::seconds(1100))
        .await
        .unwrap();

    // Closed-but-undrained part: a 200s session.
    recorder
        .record_presence(&playing(handle(1, "alice"), "Chess", T0 + Duration::seconds(2000)))
        .await
        .unwrap();
    recorder
        .record_presence(&idle(handle(1, "alice"), T0 + Duration::seconds(2200)))
        .await
        .unwrap();

    // Open part: started 300s before the query instant.
    recorder
        .record_presence(&playing(handle(1, "alice"), "Chess", T0 + Duration::seconds(3000)))
        .await
        .unwrap();

    let totals = reader
        .user_totals(1, T0 + Duration::seconds(3300))
        .await
        .unwrap()
        .expect("alice exists");
    assert_eq!(totals.gaming_seconds, 1000 + 200 + 300);
    assert_eq!(totals.display_name, "alice");

    let game = reader
        .game_totals("Chess", T0 + Duration::seconds(3300))
        .await
        .unwrap()
        .expect("Chess exists");
    assert_eq!(game.total_seconds, 1500);
    assert_eq!(game.total_sessions, 2, "the open session is not counted yet");
    assert_eq!(game.open_sessions, 1);
}

#[tokio::test]
async fn unknown_user_and_game_read_as_none() {
    let recorder = common::recorder().await;
    let reader = StatReader::new(recorder.store().connection().clone());

    assert!(reader.user_totals(42, T0).await.unwrap().is_none());
    assert!(reader.game_totals("Nothing", T0).await.unwrap().is_none());
}

#[tokio::test]
async fn leaderboards_rank_by_live_totals() {
    let recorder = common::recorder().await;
    let conn = recorder.store().connection().clone();
    let reader = StatReader::new(conn);

    // alice: 500s closed. bob: 900s still open at query time. carol: 100s.
    recorder
        .record_presence(&playing(handle(1, "alice"), "Chess", T0))
        .await
        .unwrap();
    recorder
        .record_presence(&idle(handle(1, "alice"), T0 + Duration::seconds(500)))
        .await
        .unwrap();
    recorder
        .record_presence(&playing(handle(2, "bob"), "Go", T0))
        .await
        .unwrap();
    recorder
        .record_presence(&playing(handle(3, "carol"), "Chess", T0))
        .await
        .unwrap();
    recorder
        .record_presence(&idle(handle(3, "carol"), T0 + Duration::seconds(100)))
        .await
        .unwrap();

    let now = T0 + Duration::seconds(900);
    let players = reader.top_players(3, now).await.unwrap();
    assert_eq!(players.len(), 3);
    assert_eq!(players[0].name, "bob");
    assert_eq!(players[0].value, 900);
    assert_eq!(players[1].name, "alice");
    assert_eq!(players[2].name, "carol");

    let games = reader.top_games(2, now).await.unwrap();
    assert_eq!(games[0].name, "Go");
    assert_eq!(games[0].value, 900);
    assert_eq!(games[1].name, "Chess");
    assert_eq!(games[1].value, 600);
}

#[tokio::test]
async fn chatter_and_voice_leaderboards() {
    let recorder = common::recorder().await;
    let reader = StatReader::new(recorder.store().connection().clone());

    for i in 0..3 {
        recorder
            .record_message(&MessagePosted {
                user: handle(1, "alice"),
                channel_name: "general".to_owned(),
                content_length: 5,
                observed_at: T0 + Duration::seconds(i),
            })
            .await
            .unwrap();
    }
    recorder
        .record_message(&MessagePosted {
            user: handle(2, "bob"),
            channel_name: "general".to_owned(),
            content_length: 5,
            observed_at: T0,
        })
        .await
        .unwrap();

    recorder
        .record_voice(&VoiceStateChanged {
            user: handle(2, "bob"),
            previous_channel: None,
            new_channel: Some("Lobby".to_owned()),
            observed_at: T0,
        })
        .await
        .unwrap();

    let chatters = reader.top_chatters(5).await.unwrap();
    assert_eq!(chatters[0].name, "alice");
    assert_eq!(chatters[0].value, 3);
    assert_eq!(chatters[1].name, "bob");
    assert_eq!(chatters[1].value, 1);

    let voice = reader
        .top_voice(5, T0 + Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(voice[0].name, "bob");
    assert_eq!(voice[0].value, 60);
}

#[tokio::test]
async fn overview_reflects_merged_state() {
    let recorder = common::recorder().await;
    let conn = recorder.store().connection().clone();
    let aggregator = Aggregator::new(conn.clone());
    let reader = StatReader::new(conn);

    recorder
        .record_presence(&playing(handle(1, "alice"), "Chess", T0))
        .await
        .unwrap();
    recorder
        .record_presence(&idle(handle(1, "alice"), T0 + Duration::seconds(600)))
        .await
        .unwrap();
    recorder
        .record_message(&MessagePosted {
            user: handle(2, "bob"),
            channel_name: "general".to_owned(),
            content_length: 5,
            observed_at: T0,
        })
        .await
        .unwrap();
    aggregator
        .run_cycle_at(T0 + Duration::seconds(700))
        .await
        .unwrap();

    // Undrained activity on top of the durable counters.
    recorder
        .record_presence(&playing(handle(1, "alice"), "Chess", T0 + Duration::seconds(800)))
        .await
        .unwrap();

    let overview = reader
        .overview(T0 + Duration::seconds(1000))
        .await
        .unwrap();
    assert!(!overview.degraded);
    assert_eq!(overview.total_users, 2);
    assert_eq!(overview.transient_game_sessions, 1);
    assert_eq!(overview.transient_messages, 0, "messages were drained");
    assert_eq!(overview.total_gaming_seconds, 600 + 200);
    assert_eq!(overview.total_messages, 1);
    assert_eq!(overview.top_players[0].name, "alice");
    assert_eq!(overview.top_games[0].name, "Chess");
    assert_eq!(overview.top_chatters[0].name, "bob");
}
