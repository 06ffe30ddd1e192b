//! Worker threads lent out by an [`ObjectPool`].

use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use super::{ObjectPool, PoolConfig, Pooled, PooledObjectFactory};
use crate::error::{Error, Result};
use crate::failure;

type Job = Box<dyn FnOnce() + Send + 'static>;

type Lease = Pooled<Worker, WorkerFactory>;

struct Task {
    job: Job,
    lease: Lease,
}

/// A worker thread waiting for one task at a time.
pub struct Worker {
    id: usize,
    tasks: Sender<Task>,
}

impl Worker {
    /// Returns the worker's sequence number.
    pub const fn id(&self) -> usize {
        self.id
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Worker").field("id", &self.id).finish()
    }
}

/// Spawns worker threads and keeps their handles for joining.
pub struct WorkerFactory {
    next_id: AtomicUsize,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl PooledObjectFactory<Worker> for WorkerFactory {
    fn create(&self) -> Result<Worker> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tasks, queue) = channel::unbounded();
        let handle = thread::Builder::new()
            .name(format!("guarded-worker-{id}"))
            .spawn(move || run_worker(id, &queue))
            .map_err(|error| failure::raise(Error::creation(error.to_string())))?;

        let mut handles = self.handles.lock();
        handles.retain(|handle| !handle.is_finished());
        handles.push(handle);
        Ok(Worker { id, tasks })
    }

    fn destroy(&self, worker: Worker) {
        tracing::debug!(worker = worker.id, "retiring worker");
    }
}

fn run_worker(id: usize, queue: &Receiver<Task>) {
    tracing::debug!(worker = id, "worker started");
    while let Ok(Task { job, lease }) = queue.recv() {
        match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(()) => lease.give_back(),
            Err(payload) => {
                failure::report_panic("ThreadPool", &*payload);
                lease.invalidate();
            }
        }
    }
    tracing::debug!(worker = id, "worker stopped");
}

/// A fixed-size pool of worker threads.
///
/// Workers are objects of an [`ObjectPool`]: [`execute`](Self::execute)
/// borrows an idle worker (waiting if all are busy) and hands it the job;
/// the worker returns itself to the pool when the job ends. A job that
/// panics is reported through [`failure`](crate::failure) and its worker is
/// replaced.
///
/// # Examples
///
/// ```rust
/// use guarded::pool::ThreadPool;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let pool = ThreadPool::new(2).unwrap();
/// let done = Arc::new(AtomicUsize::new(0));
/// for _ in 0..8 {
///     let done = Arc::clone(&done);
///     pool.execute(move || {
///         done.fetch_add(1, Ordering::SeqCst);
///     })
///     .unwrap();
/// }
/// pool.shutdown();
/// assert_eq!(done.load(Ordering::SeqCst), 8);
/// ```
pub struct ThreadPool {
    workers: ObjectPool<Worker, WorkerFactory>,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl ThreadPool {
    /// Starts `threads` workers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for zero threads, or
    /// [`Error::Creation`] if a thread cannot be spawned.
    pub fn new(threads: usize) -> Result<Self> {
        Self::with_config(
            PoolConfig::default()
                .with_max_active(threads)
                .with_max_idle(threads)
                .with_min_idle(threads),
        )
    }

    /// Starts one worker per logical CPU.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_default_size() -> Result<Self> {
        Self::new(num_cpus::get())
    }

    /// Builds a pool whose workers follow `config`: `max_active` bounds the
    /// concurrent jobs and `min_idle` workers are started up front.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        let handles = Arc::new(Mutex::new(Vec::new()));
        let factory = WorkerFactory {
            next_id: AtomicUsize::new(0),
            handles: Arc::clone(&handles),
        };
        let workers = ObjectPool::new(factory, config)?;
        let pool = Self { workers, handles };
        pool.workers.prefill()?;
        Ok(pool)
    }

    /// Runs `job` on a worker, waiting for one to become free.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] after [`shutdown`](Self::shutdown), or
    /// [`Error::Creation`] if a replacement worker cannot be started.
    pub fn execute<J>(&self, job: J) -> Result<()>
    where
        J: FnOnce() + Send + 'static,
    {
        let lease = self.workers.borrow()?;
        Self::dispatch(lease, Box::new(job))
    }

    /// Runs `job` on a worker if one is free right now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhausted`] if every worker is busy, plus the errors
    /// of [`execute`](Self::execute).
    pub fn try_execute<J>(&self, job: J) -> Result<()>
    where
        J: FnOnce() + Send + 'static,
    {
        let lease = self.workers.try_borrow()?;
        Self::dispatch(lease, Box::new(job))
    }

    /// Returns the number of workers running a job.
    pub fn num_busy(&self) -> usize {
        self.workers.num_active()
    }

    /// Returns the number of workers waiting for a job.
    pub fn num_idle(&self) -> usize {
        self.workers.num_idle()
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.workers.is_closed()
    }

    /// Stops accepting jobs, lets running jobs finish and joins every
    /// worker thread.
    ///
    /// Called from inside a job, the calling worker is not joined.
    pub fn shutdown(&self) {
        self.workers.close();
        let handles = mem::take(&mut *self.handles.lock());
        let current = thread::current().id();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                tracing::debug!("worker thread ended with a panic");
            }
        }
    }

    fn dispatch(lease: Lease, job: Job) -> Result<()> {
        let tasks = lease.tasks.clone();
        tasks.send(Task { job, lease }).map_err(|returned| {
            returned.into_inner().lease.invalidate();
            failure::raise(Error::creation("worker thread is no longer running"))
        })
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ThreadPool")
            .field("busy", &self.num_busy())
            .field("idle", &self.num_idle())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
