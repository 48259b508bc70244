//! Calls parked while a refresh is in flight

use std::collections::VecDeque;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::AuthFailure;

pub(crate) type RefreshResult = Result<String, AuthFailure>;

struct Waiter {
    call_id: Uuid,
    tx: oneshot::Sender<RefreshResult>,
}

/// FIFO of waiters. Drained exactly once per refresh.
#[derive(Default)]
pub(crate) struct PendingQueue {
    waiters: VecDeque<Waiter>,
}

impl PendingQueue {
    pub(crate) fn push(&mut self, call_id: Uuid) -> oneshot::Receiver<RefreshResult> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push_back(Waiter { call_id, tx });
        rx
    }

    pub(crate) fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Resolve every waiter in insertion order with the same outcome.
    /// A waiter whose call was dropped is skipped.
    pub(crate) fn drain(&mut self, outcome: &RefreshResult) -> usize {
        let mut delivered = 0;
        while let Some(waiter) = self.waiters.pop_front() {
            if waiter.tx.send(outcome.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(call_id = %waiter.call_id, "Queued call went away before refresh finished");
            }
        }
        delivered
    }
}
