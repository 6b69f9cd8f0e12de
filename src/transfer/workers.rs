//! Bounded pool of transfer tasks feeding a [`TransferTracker`].

use super::outcome::{TransferOutcome, TransferTracker};
use std::collections::HashMap;
use std::future::Future;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::warn;

/// Runs at most `max_concurrent` unit transfers at once.
///
/// Every spawned unit ends up in the tracker exactly once. A task that
/// panics or is cancelled is recorded as failed under the path it was
/// spawned for.
pub struct WorkerPool<'a> {
    join_set: JoinSet<TransferOutcome>,
    pending: HashMap<Id, String>,
    max_concurrent: usize,
    tracker: &'a TransferTracker,
}

impl<'a> WorkerPool<'a> {
    pub fn new(max_concurrent: usize, tracker: &'a TransferTracker) -> Self {
        Self {
            join_set: JoinSet::new(),
            pending: HashMap::new(),
            max_concurrent: max_concurrent.max(1),
            tracker,
        }
    }

    /// Spawn the transfer of `path`, first waiting for a free slot.
    pub async fn spawn<F>(&mut self, path: String, task: F)
    where
        F: Future<Output = TransferOutcome> + Send + 'static,
    {
        if self.join_set.len() >= self.max_concurrent {
            if let Some(result) = self.join_set.join_next_with_id().await {
                self.record(result);
            }
        }
        let handle = self.join_set.spawn(task);
        self.pending.insert(handle.id(), path);
    }

    /// Wait for every remaining task.
    pub async fn finish(mut self) {
        while let Some(result) = self.join_set.join_next_with_id().await {
            self.record(result);
        }
    }

    fn record(&mut self, result: Result<(Id, TransferOutcome), JoinError>) {
        match result {
            Ok((id, outcome)) => {
                self.pending.remove(&id);
                self.tracker.record(outcome);
            }
            Err(e) => {
                let path = self.pending.remove(&e.id()).unwrap_or_default();
                warn!("transfer task for {} did not complete: {}", path, e);
                self.tracker.record(TransferOutcome::Failed {
                    path,
                    error: format!("transfer task did not complete: {}", e),
                });
            }
        }
    }
}
