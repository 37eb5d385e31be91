//! FIFO of requests that failed while offline.

use std::collections::VecDeque;
use std::future::Future;

use crate::request::Request;

/// Requests awaiting one replay attempt. Duplicates are kept; nothing is
/// persisted.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: VecDeque<Request>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, request: Request) {
        self.entries.push_back(request);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every entry, front first.
    pub fn take_all(&mut self) -> Vec<Request> {
        self.entries.drain(..).collect()
    }

    /// Run `handler` on each entry in FIFO order. The queue is empty
    /// afterwards whatever the handler does.
    pub async fn drain_all<F, Fut>(&mut self, mut handler: F)
    where
        F: FnMut(Request) -> Fut,
        Fut: Future<Output = ()>,
    {
        for request in self.take_all() {
            handler(request).await;
        }
    }
}
