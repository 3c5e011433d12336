use std::{
    fmt,
    pin::pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use crossbeam::utils::CachePadded;
use parking_lot::Mutex;
use tokio::sync::Notify;


type WakeHook = Box<dyn Fn() + Send + Sync + 'static>;

struct Inner {
    signaled: CachePadded<AtomicBool>,
    notify: Notify,
    hooks: Mutex<Vec<WakeHook>>,
}

/// Shared shutdown flag handed to the pool, every worker and every
/// invocation of the processing function.
///
/// Clones share one cell. Once signaled the token stays signaled.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                signaled: CachePadded::new(AtomicBool::new(false)),
                notify: Notify::new(),
                hooks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Requests shutdown. Only the first call wakes anybody.
    pub fn signal(&self) {
        if self.inner.signaled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.notify.notify_waiters();
        for hook in self.inner.hooks.lock().iter() {
            hook();
        }
    }

    #[inline]
    pub fn is_signaled(&self) -> bool {
        self.inner.signaled.load(Ordering::Acquire)
    }

    /// Resolves once the token is signaled, immediately if it already is.
    pub async fn cancelled(&self) {
        loop {
            let mut notified = pin!(self.inner.notify.notified());
            notified.as_mut().enable();
            if self.is_signaled() {
                return;
            }
            notified.await;
        }
    }

    /// Registers `hook` to run on the first `signal()`. Runs it right away
    /// when the token is already signaled, so a hook may fire twice under a
    /// race and must be idempotent.
    pub(crate) fn on_signal<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let hook: WakeHook = Box::new(hook);
        let mut hooks = self.inner.hooks.lock();
        if self.is_signaled() {
            drop(hooks);
            hook();
            return;
        }
        hooks.push(hook);
    }

    /// Number of live handles to this token.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("signaled", &self.is_signaled())
            .finish()
    }
}
