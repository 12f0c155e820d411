//! Fixed-size worker pool for background work
//!
//! The pool is deliberately decoupled from the frame scheduler: jobs never run
//! inside a frame stage and no ordering is guaranteed relative to any frame.
//! Code that needs results on the main loop sends them back over a channel.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use thiserror::Error;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker pool errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The bounded job queue is full
    #[error("Worker queue is full (capacity {0})")]
    QueueFull(usize),

    /// The pool has been shut down
    #[error("Worker pool has been shut down")]
    ShutDown,

    /// A worker thread could not be spawned
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(String),
}

/// Bounded pool of worker threads
///
/// Every method takes `&self`, so the pool can be shared behind an `Arc`.
pub struct WorkerPool {
    workers: Mutex<Vec<Worker>>,
    sender: Mutex<Option<Sender<Job>>>,
    capacity: usize,
}

impl WorkerPool {
    /// Spawn `size` workers sharing a queue of `capacity` pending jobs
    pub fn new(size: usize, capacity: usize) -> Result<Self, PoolError> {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded::<Job>(capacity);

        let mut workers = Vec::with_capacity(size);
        for id in 0..size.max(1) {
            workers.push(Worker::spawn(id, receiver.clone())?);
        }

        log::debug!("Worker pool started with {} threads", workers.len());
        Ok(Self {
            workers: Mutex::new(workers),
            sender: Mutex::new(Some(sender)),
            capacity,
        })
    }

    /// Queue a job without blocking the caller
    pub fn submit<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = lock(&self.sender);
        let sender = guard.as_ref().ok_or(PoolError::ShutDown)?;
        sender.try_send(Box::new(job)).map_err(|e| match e {
            TrySendError::Full(_) => PoolError::QueueFull(self.capacity),
            TrySendError::Disconnected(_) => PoolError::ShutDown,
        })
    }

    /// Number of worker threads
    pub fn size(&self) -> usize {
        lock(&self.workers).len()
    }

    /// Maximum number of queued jobs
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether `shutdown` has run
    pub fn is_shut_down(&self) -> bool {
        lock(&self.sender).is_none()
    }

    /// Number of jobs waiting for a worker
    pub fn pending(&self) -> usize {
        lock(&self.sender).as_ref().map_or(0, Sender::len)
    }

    /// Stop accepting work, let queued jobs finish and join every worker
    pub fn shutdown(&self) {
        // Dropping the sender disconnects the channel once the queue drains
        if lock(&self.sender).take().is_none() {
            return;
        }
        let workers = std::mem::take(&mut *lock(&self.workers));
        for worker in workers {
            if worker.thread.join().is_err() {
                log::error!("Worker {} terminated abnormally", worker.id);
            }
        }
        log::debug!("Worker pool shut down");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Worker {
    id: usize,
    thread: thread::JoinHandle<()>,
}

impl Worker {
    fn spawn(id: usize, receiver: Receiver<Job>) -> Result<Self, PoolError> {
        let thread = thread::Builder::new()
            .name(format!("scene-engine-worker-{id}"))
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        log::error!("Background job panicked on worker {id}");
                    }
                }
            })
            .map_err(|e| PoolError::Spawn(e.to_string()))?;

        Ok(Self { id, thread })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_jobs_run_and_report_back() {
        let pool = WorkerPool::new(2, 16).expect("pool");
        let (tx, rx) = crossbeam_channel::unbounded();

        for i in 0..8 {
            let tx = tx.clone();
            pool.submit(move || {
                tx.send(i * 2).expect("send");
            })
            .expect("submit");
        }

        let mut results: Vec<i32> = (0..8)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).expect("result"))
            .collect();
        results.sort_unstable();
        assert_eq!(results, vec![0, 2, 4, 6, 8, 10, 12, 14]);
    }

    #[test]
    fn test_panicking_job_does_not_kill_worker() {
        let pool = WorkerPool::new(1, 4).expect("pool");
        let counter = Arc::new(AtomicUsize::new(0));

        pool.submit(|| panic!("boom")).expect("submit");
        let c = Arc::clone(&counter);
        let (tx, rx) = crossbeam_channel::bounded(1);
        pool.submit(move || {
            c.fetch_add(1, Ordering::SeqCst);
            tx.send(()).expect("send");
        })
        .expect("submit");

        rx.recv_timeout(Duration::from_secs(5)).expect("second job ran");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let pool = Arc::new(WorkerPool::new(1, 1).expect("pool"));
        let shared = Arc::clone(&pool);
        shared.shutdown();

        assert!(pool.is_shut_down());
        assert_eq!(pool.submit(|| {}), Err(PoolError::ShutDown));
        assert_eq!(pool.size(), 0);
        pool.shutdown();
    }
}
