use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;

use crate::error::{Result, StoreError};
use crate::event::Notification;
use crate::recorder::EventRecorder;

/// Bounded worker pool that applies notifications with per-user ordering.
///
/// The platform client delivers one notification at a time; spawning a task
/// per notification would give neither ordering nor backpressure. Instead the
/// dispatcher runs a fixed set of workers, each owning a bounded queue, and
/// routes every notification for a given user to the same worker
/// (`external_id % workers`). Within one worker notifications apply strictly
/// in arrival order, so a leave can never overtake its matching join; events
/// for different users proceed concurrently on different workers.
///
/// A notification whose handling fails is logged and dropped, never retried:
/// redelivery belongs to the event source, which is outside this crate.
#[derive(Debug)]
pub struct EventDispatcher {
    senders: Vec<mpsc::Sender<Notification>>,
    handles: Vec<JoinHandle<()>>,
}

impl EventDispatcher {
    /// Spawns `workers` tasks, each with a queue holding up to `queue_depth`
    /// notifications. `dispatch` applies backpressure once a worker's queue
    /// is full.
    pub fn spawn(recorder: EventRecorder, workers: usize, queue_depth: usize) -> Self {
        let workers = workers.max(1);
        let queue_depth = queue_depth.max(1);

        let mut senders = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);

        for worker in 0..workers {
            let (tx, mut rx) = mpsc::channel::<Notification>(queue_depth);
            let recorder = recorder.clone();

            handles.push(tokio::spawn(async move {
                while let Some(notification) = rx.recv().await {
                    if let Err(e) = recorder.record(&notification).await {
                        error!(
                            worker,
                            user = notification.external_user_id(),
                            error = %e,
                            "failed to record notification; dropped"
                        );
                    }
                }
            }));
            senders.push(tx);
        }

        Self { senders, handles }
    }

    /// Routes a notification to its user's worker, waiting if that worker's
    /// queue is full.
    pub async fn dispatch(&self, notification: impl Into<Notification>) -> Result<()> {
        let notification = notification.into();
        let shard =
            (notification.external_user_id().unsigned_abs() % self.senders.len() as u64) as usize;

        self.senders[shard]
            .send(notification)
            .await
            .map_err(|_| StoreError::DispatcherClosed)
    }

    /// Closes the queues and waits for the workers to drain what is already
    /// enqueued.
    pub async fn shutdown(self) {
        drop(self.senders);
        for handle in self.handles {
            // A worker panicking is the only join failure; nothing to do
            // beyond surfacing it.
            if let Err(e) = handle.await {
                error!(error = %e, "dispatcher worker terminated abnormally");
            }
        }
    }
}
