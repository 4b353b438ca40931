//! Bounded worker pool for batch ingestion.
//!
//! A first-class scheduling object with a fixed capacity and a
//! submit/await-all contract: every submitted task runs to completion, each
//! task's error is captured in its own slot, and a failing task never
//! cancels its siblings.

use futures::stream::{self, StreamExt};
use std::future::Future;

use crate::error::{RagError, Result};

/// A fixed-capacity pool that runs at most `capacity` tasks concurrently.
///
/// Results are yielded in completion order, not submission order. Callers
/// that need a stable order must key results themselves.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    capacity: usize,
}

impl WorkerPool {
    /// Create a pool with the given capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1) }
    }

    /// The number of tasks this pool runs concurrently.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Run all tasks with bounded concurrency and await them all.
    ///
    /// Returns one `Result` per task, in completion order. Errors are
    /// captured per task; no task is cancelled because a sibling failed.
    pub async fn run_all<T, F>(
        &self,
        tasks: impl IntoIterator<Item = F>,
    ) -> Vec<std::result::Result<T, RagError>>
    where
        F: Future<Output = Result<T>>,
    {
        stream::iter(tasks).buffer_unordered(self.capacity).collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn capacity_is_clamped_to_one() {
        assert_eq!(WorkerPool::new(0).capacity(), 1);
        assert_eq!(WorkerPool::new(4).capacity(), 4);
    }

    #[tokio::test]
    async fn one_failing_task_does_not_cancel_siblings() {
        let pool = WorkerPool::new(2);
        let completed = AtomicUsize::new(0);

        let tasks = (0..8).map(|i| {
            let completed = &completed;
            async move {
                if i == 3 {
                    return Err(RagError::PipelineError("task 3 failed".into()));
                }
                completed.fetch_add(1, Ordering::SeqCst);
                Ok(i)
            }
        });

        let results = pool.run_all(tasks).await;
        assert_eq!(results.len(), 8);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 7);
        assert_eq!(completed.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_capacity() {
        let pool = WorkerPool::new(3);
        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let tasks = (0..12).map(|i| {
            let running = &running;
            let peak = &peak;
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(i)
            }
        });

        let results = pool.run_all(tasks).await;
        assert_eq!(results.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}
