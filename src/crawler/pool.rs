//! Bounded worker pool
//!
//! [`WorkerPool::reserve`] waits for one of `size` semaphore permits and the
//! task spawned into that slot holds it until it finishes, so at most `size`
//! run at once. [`WorkerPool::join`] is the join point: it returns only
//! after every spawned task has finished.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

/// A reserved place in a [`WorkerPool`]
#[derive(Debug)]
pub struct Slot(Option<OwnedSemaphorePermit>);

pub struct WorkerPool<T> {
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<T>,
    size: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Creates a pool running at most `size` tasks concurrently
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(size)),
            tasks: JoinSet::new(),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Waits until the pool has room for one more running task
    ///
    /// The caller can re-check its stop condition before handing the slot to
    /// [`WorkerPool::spawn_reserved`]; dropping the slot releases it.
    pub async fn reserve(&self) -> Slot {
        Slot(Arc::clone(&self.semaphore).acquire_owned().await.ok())
    }

    /// Spawns a task into a slot obtained from [`WorkerPool::reserve`]
    pub fn spawn_reserved<F>(&mut self, slot: Slot, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.tasks.spawn(async move {
            let _slot = slot;
            task.await
        });
    }

    /// Waits for every spawned task and returns their outputs
    ///
    /// Output order follows completion, not spawn order. A panicked task is
    /// logged and contributes no output.
    pub async fn join(mut self) -> Vec<T> {
        let mut outputs = Vec::with_capacity(self.tasks.len());
        while let Some(result) = self.tasks.join_next().await {
            match result {
                Ok(output) => outputs.push(output),
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }
        outputs
    }
}
