//! Generic worker thread pool with cooperative shutdown
//!
//! # Features
//! - Owned work items handed from any number of producers to exactly one worker, FIFO
//! - Processing-function shape checked at compile time
//! - Dynamic growth of the worker set
//! - Cooperative shutdown through a shared cancellation token
//! - Panics in the processing function isolated per item
//!
//! ```
//! use request_processor::{CancellationToken, WorkerPool};
//! use std::sync::{atomic::{AtomicUsize, Ordering}, Arc};
//!
//! let done = Arc::new(AtomicUsize::new(0));
//! let counter = done.clone();
//! let mut pool = WorkerPool::<Box<u32>>::new(
//!     move |request: Box<u32>, _token: CancellationToken| {
//!         counter.fetch_add(*request as usize, Ordering::Relaxed);
//!     },
//!     2,
//! )
//! .unwrap();
//!
//! for i in 1..=4 {
//!     pool.submit(Box::new(i));
//! }
//! pool.stop();
//! assert_eq!(done.load(Ordering::Relaxed), 10);
//! ```

pub mod errors;
pub mod handler;
pub mod model;
pub mod pool;
pub mod queue;
pub mod token;

pub use errors::PoolError;
pub use handler::{ProcessFn, Processor};
pub use model::{PoolMetrics, PoolState, ShutdownPolicy};
pub use pool::{Config, Submitter, WorkerPool};
pub use token::CancellationToken;
