use std::collections::TryReserveError;

/// Errors surfaced by the pool. None of them ever crosses from one worker
/// into another or into the owning thread's control flow uninvited.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("worker pool is stopped")]
    Stopped,
    #[error("work queue could not grow: {0}")]
    QueueAlloc(#[from] TryReserveError),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("processing function panicked: {0}")]
    TaskPanicked(String),
}
