//! Shared-memory task queue on a rayon thread pool

use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

/// An independent unit of work
///
/// `compute` may only read shared state; each task returns its own output
/// buffer so tasks can run in any order and in parallel.
pub trait Task: Send + Sync {
    type Output: Send;

    fn compute(&self) -> Self::Output;
}

/// Ordered collection of constructed-but-not-yet-run tasks
pub struct TaskQueue<T: Task> {
    tasks: Vec<T>,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl<T: Task> TaskQueue<T> {
    /// Queue running on the global rayon pool
    pub fn new() -> Self {
        TaskQueue {
            tasks: Vec::new(),
            pool: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TaskQueue {
            tasks: Vec::with_capacity(capacity),
            pool: None,
        }
    }

    /// Queue running on a dedicated pool
    pub fn with_pool(pool: Arc<rayon::ThreadPool>) -> Self {
        TaskQueue {
            tasks: Vec::new(),
            pool: Some(pool),
        }
    }

    pub fn push(&mut self, task: T) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every task exactly once; outputs are returned in submission order
    pub fn compute(self) -> Vec<T::Output> {
        debug!("Dispatching {} tasks", self.tasks.len());
        let tasks = self.tasks;
        match self.pool {
            Some(pool) => pool.install(|| tasks.par_iter().map(Task::compute).collect()),
            None => tasks.par_iter().map(Task::compute).collect(),
        }
    }
}

impl<T: Task> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Task> Extend<T> for TaskQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.tasks.extend(iter);
    }
}

/// Dedicated worker pool with `nthreads` threads
pub fn build_pool(nthreads: usize) -> color_eyre::eyre::Result<Arc<rayon::ThreadPool>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(nthreads)
        .build()
        .map_err(|err| color_eyre::eyre::eyre!("Failed to build thread pool: {}", err))?;
    Ok(Arc::new(pool))
}
