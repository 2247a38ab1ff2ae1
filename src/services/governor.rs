use std::future::Future;

use futures::future::join_all;
use tokio::sync::Semaphore;

/// Bounds how many detail fetches run at the same time. A batch is submitted
/// as a whole and awaited as a whole; each task's outcome is returned in
/// submission order and one task failing never cancels its siblings.
pub struct Governor {
    permits: Semaphore,
    limit: usize,
}

impl Governor {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Governor {
            permits: Semaphore::new(limit),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn run_all<I, F, Fut>(&self, items: I, task: F) -> Vec<Fut::Output>
    where
        I: IntoIterator,
        F: Fn(I::Item) -> Fut,
        Fut: Future,
    {
        let task = &task;
        let batch = items.into_iter().map(|item| async move {
            let _permit = self
                .permits
                .acquire()
                .await
                .expect("governor semaphore is never closed");
            task(item).await
        });

        join_all(batch).await
    }
}
