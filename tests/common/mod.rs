use std::time::Duration;

use guild_activity_store::migration::Migrator;
use guild_activity_store::{ActivityStore, EventRecorder};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

/// Fresh in-memory SQLite database with the schema applied.
///
/// Pinned to a single pooled connection: every pooled connection to
/// `sqlite::memory:` would otherwise be its own empty database.
pub async fn connect() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1)
        .min_connections(1)
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(600));

    let conn = Database::connect(opt)
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&conn, None).await.expect("apply migrations");
    conn
}

pub async fn recorder() -> EventRecorder {
    EventRecorder::new(ActivityStore::new(connect().await))
}
