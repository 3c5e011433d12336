use super::{
    errors::PoolError,
    token::CancellationToken,
};
use std::collections::VecDeque;
use parking_lot::{Condvar, Mutex};


struct State<T> {
    items: VecDeque<T>,
    closed: bool,
    /// Items still owed to consumers once shutdown began. `None` while
    /// running; fixed to the queue length at the moment of the signal.
    drain_budget: Option<usize>,
}

impl<T> State<T> {
    fn begin_drain(&mut self) {
        if self.drain_budget.is_none() {
            self.drain_budget = Some(self.items.len());
        }
    }
}

/// Unbounded FIFO of owned work items shared by producers and workers.
///
/// Every mutation happens under one mutex; idle consumers park on the
/// paired condvar until there is work, the token is signaled, or the queue
/// is closed.
///
/// A queue serves one token. Once it is signaled only the items that were
/// queued at that moment are handed out; later pushes are accepted but
/// stay queued until [`close`](Self::close) takes them.
pub struct WorkQueue<T> {
    state: Mutex<State<T>>,
    available: Condvar,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
                drain_budget: None,
            }),
            available: Condvar::new(),
        }
    }

    /// Appends `item` and wakes one waiting consumer.
    ///
    /// On failure the item is dropped here, it is never handed back.
    pub fn push(&self, item: T) -> Result<(), PoolError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(PoolError::Stopped);
        }
        state.items.try_reserve(1)?;
        state.items.push_back(item);
        drop(state);

        self.available.notify_one();
        Ok(())
    }

    /// Blocks until an item is available or the queue has nothing more to
    /// give. After `token` is signaled, items queued before the signal are
    /// still handed out, oldest first; `None` means that backlog is
    /// exhausted or the queue is closed.
    pub fn pop_blocking(&self, token: &CancellationToken) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if token.is_signaled() {
                state.begin_drain();
            }
            match state.drain_budget {
                Some(0) => return None,
                Some(budget) => {
                    let item = state.items.pop_front()?;
                    state.drain_budget = Some(budget - 1);
                    return Some(item);
                }
                None => {
                    if let Some(item) = state.items.pop_front() {
                        return Some(item);
                    }
                }
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Freezes the post-signal backlog at the current length and wakes every
    /// consumer. Later calls keep the first backlog.
    pub fn begin_drain(&self) {
        let mut state = self.state.lock();
        state.begin_drain();
        self.available.notify_all();
    }

    /// Wakes every parked consumer so it re-checks its wake condition.
    ///
    /// The lock is taken first: a consumer between its check and its wait
    /// cannot miss the notification.
    pub fn wake_all(&self) {
        let _guard = self.state.lock();
        self.available.notify_all();
    }

    /// Rejects further pushes, wakes all consumers and hands back whatever
    /// was still queued, oldest first.
    pub fn close(&self) -> Vec<T> {
        let mut state = self.state.lock();
        state.closed = true;
        let leftovers = state.items.drain(..).collect();
        self.available.notify_all();
        leftovers
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
