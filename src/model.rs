use std::sync::atomic::{AtomicUsize, Ordering};
use crossbeam::utils::CachePadded;


/// Point-in-time view of a pool's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetrics {
    pub workers: usize,
    pub queued: usize,
    pub submitted: usize,
    pub completed: usize,
    pub failed: usize,
    pub dropped: usize,
}

impl PoolMetrics {
    pub fn queue_pressure(&self) -> f64 {
        if self.workers == 0 {
            return self.queued as f64;
        }
        self.queued as f64 / self.workers as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed + self.failed;
        if total == 0 {
            return 1.0;
        }
        self.completed as f64 / total as f64
    }

    /// Items that reached a final outcome: processed, failed or discarded.
    pub fn settled(&self) -> usize {
        self.completed + self.failed + self.dropped
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Accepting and processing work.
    Running,
    /// Token signaled, workers finishing the backlog. Submissions are still
    /// accepted, but `stop` drops them.
    Stopping,
    /// Every worker joined. Terminal.
    Stopped,
}


/// What workers do with items still queued once the token is signaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    /// Process the items that were queued when the token was signaled, then
    /// exit. Anything submitted after the signal is dropped by `stop`.
    #[default]
    Drain,
    /// Exit after the current item; whatever is left is dropped by `stop`.
    Discard,
}


#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub submitted: CachePadded<AtomicUsize>,
    pub completed: CachePadded<AtomicUsize>,
    pub failed: CachePadded<AtomicUsize>,
    pub dropped: CachePadded<AtomicUsize>,
}

impl Counters {
    #[inline]
    pub fn add(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }
}
