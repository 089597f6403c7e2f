//! Background work that the response path must not wait for.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Set of spawned background tasks, awaited only by [`Background::settle`].
#[derive(Clone, Default)]
pub struct Background {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl Background {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` onto the current runtime and track it.
    pub async fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Number of tracked tasks that have not been reaped yet.
    pub async fn pending(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Wait until every tracked task, including ones spawned meanwhile, is done.
    pub async fn settle(&self) {
        loop {
            let mut drained = std::mem::take(&mut *self.tasks.lock().await);
            if drained.is_empty() {
                return;
            }
            while let Some(result) = drained.join_next().await {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "background task did not complete");
                }
            }
        }
    }
}
