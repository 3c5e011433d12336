use super::{
    errors::PoolError,
    handler::{ProcessFn, Processor},
    model::{Counters, PoolMetrics, PoolState, ShutdownPolicy},
    queue::WorkQueue,
    token::CancellationToken,
};
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};
use crossbeam::sync::WaitGroup;


/// Worker pool settings. `Default` mirrors a small I/O-style pool of two
/// workers.
#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: usize,
    /// Worker threads are named `{thread_name}-{index}`.
    pub thread_name: String,
    pub stack_size: Option<usize>,
    pub shutdown: ShutdownPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: 2,
            thread_name: "pool-worker".to_owned(),
            stack_size: None,
            shutdown: ShutdownPolicy::Drain,
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        Self {
            num_threads: num_cpus::get(),
            ..Default::default()
        }
    }

    pub fn io_bound() -> Self {
        Self {
            num_threads: num_cpus::get() * 2,
            ..Default::default()
        }
    }
}


struct Shared<T> {
    queue: Arc<WorkQueue<T>>,
    token: CancellationToken,
    counters: Counters,
    stopped: AtomicBool,
}

impl<T> Shared<T> {
    fn try_submit(&self, item: T) -> Result<(), PoolError> {
        match self.queue.push(item) {
            Ok(()) => {
                Counters::add(&self.counters.submitted, 1);
                Ok(())
            }
            Err(err) => {
                Counters::add(&self.counters.dropped, 1);
                Err(err)
            }
        }
    }

    fn submit(&self, item: T) {
        if let Err(err) = self.try_submit(item) {
            tracing::warn!(error = %err, "work item dropped on submit");
        }
    }

    fn state(&self) -> PoolState {
        if self.stopped.load(Ordering::Acquire) {
            PoolState::Stopped
        } else if self.token.is_signaled() {
            PoolState::Stopping
        } else {
            PoolState::Running
        }
    }
}


/// Producer-side handle to a [`WorkerPool`].
///
/// Clone it into as many producer threads as needed; the pool owner keeps
/// exclusive access to `grow` and `stop`.
pub struct Submitter<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Submitter<T> {
    /// Queues `item`. Failures are logged and the item is dropped.
    #[inline]
    pub fn submit(&self, item: T) {
        self.shared.submit(item)
    }

    /// Queues `item`, reporting why it was dropped if it could not be.
    #[inline]
    pub fn try_submit(&self, item: T) -> Result<(), PoolError> {
        self.shared.try_submit(item)
    }

    pub fn token(&self) -> CancellationToken {
        self.shared.token.clone()
    }

    pub fn state(&self) -> PoolState {
        self.shared.state()
    }
}

impl<T> Clone for Submitter<T> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T> fmt::Debug for Submitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submitter")
            .field("state", &self.shared.state())
            .finish()
    }
}


#[derive(Default)]
struct WorkerGroup {
    handles: Vec<JoinHandle<()>>,
    spawned: usize,
}

impl WorkerGroup {
    #[inline]
    fn len(&self) -> usize {
        self.handles.len()
    }

    fn next_id(&mut self) -> usize {
        let id = self.spawned;
        self.spawned += 1;
        id
    }

    /// Joins every worker; returns how many died from a panic.
    fn join_all(&mut self) -> usize {
        self.handles
            .drain(..)
            .map(JoinHandle::join)
            .filter(Result::is_err)
            .count()
    }
}


/// Fixed set of worker threads executing one processing function over a
/// shared FIFO queue of owned work items.
///
/// Shutdown is cooperative: [`stop`](Self::stop) signals the token that
/// every invocation receives and then waits for in-flight invocations to
/// return. A function that never looks at its token delays `stop` by its
/// full running time.
pub struct WorkerPool<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    processor: Processor<T>,
    workers: WorkerGroup,
    config: Config,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Starts `initial_workers` threads running `func`.
    pub fn new<F>(func: F, initial_workers: usize) -> Result<Self, PoolError>
    where
        F: ProcessFn<T>,
    {
        let config = Config {
            num_threads: initial_workers,
            ..Default::default()
        };
        Self::with_config(func, config)
    }

    pub fn with_config<F>(func: F, config: Config) -> Result<Self, PoolError>
    where
        F: ProcessFn<T>,
    {
        let queue = Arc::new(WorkQueue::new());
        let token = CancellationToken::new();

        // Whoever signals the token, the backlog is fixed right then and
        // idle workers wake to see it.
        let weak_queue = Arc::downgrade(&queue);
        token.on_signal(move || {
            if let Some(queue) = weak_queue.upgrade() {
                queue.begin_drain();
            }
        });

        let shared = Arc::new(Shared {
            queue,
            token,
            counters: Counters::default(),
            stopped: AtomicBool::new(false),
        });

        let initial = config.num_threads;
        let mut pool = Self {
            shared,
            processor: Processor::new(func),
            workers: WorkerGroup::default(),
            config,
        };
        pool.grow(initial)?;

        tracing::info!(
            workers = pool.worker_count(),
            policy = ?pool.config.shutdown,
            "worker pool started"
        );
        Ok(pool)
    }

    /// Queues `item`. Failures are logged and the item is dropped; they are
    /// never propagated to the caller.
    #[inline]
    pub fn submit(&self, item: T) {
        self.shared.submit(item)
    }

    #[inline]
    pub fn try_submit(&self, item: T) -> Result<(), PoolError> {
        self.shared.try_submit(item)
    }

    pub fn submitter(&self) -> Submitter<T> {
        Submitter { shared: Arc::clone(&self.shared) }
    }

    /// Spawns `additional` workers and returns once all of them are running.
    ///
    /// A stopped pool is never revived. If a thread cannot be created the
    /// workers spawned before it are kept and the error is returned.
    pub fn grow(&mut self, additional: usize) -> Result<(), PoolError> {
        if self.shared.stopped.load(Ordering::Acquire) {
            return Err(PoolError::Stopped);
        }

        let ready = WaitGroup::new();
        let mut result = Ok(());

        for _ in 0..additional {
            let id = self.workers.next_id();
            let mut builder = thread::Builder::new()
                .name(format!("{}-{}", self.config.thread_name, id));
            if let Some(size) = self.config.stack_size {
                builder = builder.stack_size(size);
            }

            let shared = Arc::clone(&self.shared);
            let processor = self.processor.clone();
            let policy = self.config.shutdown;
            let started = ready.clone();

            match builder.spawn(move || worker_loop(id, shared, processor, policy, started)) {
                Ok(handle) => self.workers.handles.push(handle),
                Err(err) => {
                    tracing::error!(worker = id, error = %err, "failed to spawn worker");
                    result = Err(PoolError::Spawn(err));
                    break;
                }
            }
        }

        ready.wait();
        tracing::debug!(workers = self.workers.len(), "worker pool grown");
        result
    }

    /// Signals the token, joins every worker and drops whatever is still
    /// queued. Safe to call again; later calls do nothing.
    pub fn stop(&mut self) {
        if self.shared.stopped.load(Ordering::Acquire) {
            return;
        }
        tracing::debug!(workers = self.workers.len(), "stopping worker pool");

        self.shared.token.signal();
        self.shared.queue.wake_all();

        let panicked = self.workers.join_all();
        if panicked > 0 {
            tracing::error!(panicked, "worker threads exited by panic");
        }

        let leftovers = self.shared.queue.close();
        if !leftovers.is_empty() {
            tracing::warn!(count = leftovers.len(), "dropping unprocessed work items");
            Counters::add(&self.shared.counters.dropped, leftovers.len());
        }
        drop(leftovers);

        self.shared.stopped.store(true, Ordering::Release);

        let metrics = self.metrics();
        tracing::info!(
            completed = metrics.completed,
            failed = metrics.failed,
            dropped = metrics.dropped,
            "worker pool stopped"
        );
    }

    pub fn token(&self) -> CancellationToken {
        self.shared.token.clone()
    }

    /// Live worker threads.
    #[inline]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn state(&self) -> PoolState {
        self.shared.state()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        let counters = &self.shared.counters;
        PoolMetrics {
            workers: self.workers.len(),
            queued: self.shared.queue.len(),
            submitted: Counters::get(&counters.submitted),
            completed: Counters::get(&counters.completed),
            failed: Counters::get(&counters.failed),
            dropped: Counters::get(&counters.dropped),
        }
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T: Send + 'static> fmt::Debug for WorkerPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("state", &self.state())
            .field("workers", &self.workers.len())
            .field("config", &self.config)
            .finish()
    }
}


fn worker_loop<T: 'static>(
    id: usize,
    shared: Arc<Shared<T>>,
    processor: Processor<T>,
    policy: ShutdownPolicy,
    started: WaitGroup,
) {
    drop(started);
    tracing::trace!(worker = id, "worker started");

    loop {
        if policy == ShutdownPolicy::Discard && shared.token.is_signaled() {
            break;
        }
        let Some(item) = shared.queue.pop_blocking(&shared.token) else {
            break;
        };

        match processor.invoke(item, &shared.token) {
            Ok(()) => Counters::add(&shared.counters.completed, 1),
            Err(err) => {
                Counters::add(&shared.counters.failed, 1);
                tracing::error!(worker = id, error = %err, "work item failed");
            }
        }
    }

    tracing::trace!(worker = id, "worker stopped");
}
