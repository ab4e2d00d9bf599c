//! Error types for store, recorder, and aggregator operations.

use thiserror::Error;

/// Errors surfaced by [`ActivityStore`](crate::ActivityStore) and everything
/// built on top of it.
///
/// Database errors are passed through from Sea-ORM. Callers that run per
/// notification (the dispatcher workers) log these and drop the notification;
/// the aggregator relies on transaction rollback and retries on its next
/// scheduled cycle.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying relational store failed.
    #[error("database error: {0}")]
    Backend(#[from] sea_orm::DbErr),

    /// A notification was handed to a dispatcher whose workers have shut down.
    #[error("event dispatcher is shut down")]
    DispatcherClosed,
}

pub type Result<T> = std::result::Result<T, StoreError>;
