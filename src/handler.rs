use super::{
    errors::PoolError,
    token::CancellationToken,
};
use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};


/// Shape every processing function must have: take ownership of one work
/// item plus a clone of the pool's token, return nothing.
///
/// Implemented for every matching closure and `fn` item. Anything else is
/// rejected when the pool is built, not when a worker first calls it:
///
/// ```compile_fail
/// use request_processor::WorkerPool;
///
/// // No token parameter.
/// fn incorrect_signature(_request: Box<u64>) {}
///
/// let _pool = WorkerPool::<Box<u64>>::new(incorrect_signature, 2);
/// ```
///
/// ```compile_fail
/// use request_processor::{CancellationToken, WorkerPool};
///
/// // Returns a value.
/// fn returns_status(_request: Box<u64>, _token: CancellationToken) -> bool { true }
///
/// let _pool = WorkerPool::<Box<u64>>::new(returns_status, 2);
/// ```
pub trait ProcessFn<T>: Send + Sync + 'static {
    fn process(&self, item: T, token: CancellationToken);
}

impl<T, F> ProcessFn<T> for F
where
    F: Fn(T, CancellationToken) + Send + Sync + 'static,
{
    #[inline(always)]
    fn process(&self, item: T, token: CancellationToken) {
        self(item, token)
    }
}

/// Uniform, cheaply clonable invoker around a checked processing function.
pub struct Processor<T> {
    func: Arc<dyn ProcessFn<T>>,
}

impl<T: 'static> Processor<T> {
    pub fn new<F>(func: F) -> Self
    where
        F: ProcessFn<T>,
    {
        Self { func: Arc::new(func) }
    }

    /// Runs the function on `item`. A panic is caught here and returned as
    /// [`PoolError::TaskPanicked`]; the item is dropped during unwinding.
    pub fn invoke(&self, item: T, token: &CancellationToken) -> Result<(), PoolError> {
        let func = &self.func;
        let token = token.clone();
        panic::catch_unwind(AssertUnwindSafe(move || func.process(item, token)))
            .map_err(|payload| PoolError::TaskPanicked(panic_message(payload.as_ref())))
    }
}

impl<T> Clone for Processor<T> {
    fn clone(&self) -> Self {
        Self { func: Arc::clone(&self.func) }
    }
}

impl<T> fmt::Debug for Processor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor").finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
