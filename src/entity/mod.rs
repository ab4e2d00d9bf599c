//! Database entity models for guild-activity-store.
//!
//! One Sea-ORM entity per table. The transient tables (`game_session`,
//! `voice_session`, `message`, `activity_event`) hold the in-flight session log
//! and are periodically drained by the aggregator; the durable tables
//! (`game_statistic`, `user_statistic`) hold cumulative counters and are only
//! ever written by the aggregator. `guild_user` is the identity table every
//! other entity references.

pub mod activity_event;
pub mod game_session;
pub mod game_statistic;
pub mod message;
pub mod user;
pub mod user_statistic;
pub mod voice_session;
