use anyhow::Context;
use clap::{Parser, ValueEnum};
use request_processor::{CancellationToken, Config, ShutdownPolicy, WorkerPool};
use std::{
    thread,
    time::{Duration, Instant},
};
use tokio::runtime::Builder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};


/// Feeds dummy requests into a worker pool for a fixed time, then shuts
/// everything down.
#[derive(Debug, Parser)]
#[command(version, about)]
struct CliArgs {
    /// How long to keep producing requests.
    #[arg(long, env = "DRIVER_DURATION_SECS", default_value_t = 30)]
    duration_secs: u64,

    /// Workers started with the pool.
    #[arg(long, env = "DRIVER_WORKERS", default_value_t = 2)]
    workers: usize,

    /// Extra workers added right after start.
    #[arg(long, env = "DRIVER_GROW", default_value_t = 0)]
    grow: usize,

    /// Delay of the dummy request source.
    #[arg(long, env = "DRIVER_GENERATE_INTERVAL_MS", default_value_t = 100)]
    generate_interval_ms: u64,

    /// Time the dummy processing function spends on one request.
    #[arg(long, env = "DRIVER_PROCESS_MS", default_value_t = 200)]
    process_ms: u64,

    #[arg(long, env = "DRIVER_POLICY", value_enum, default_value_t = Policy::Drain)]
    policy: Policy,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    Drain,
    Discard,
}

impl From<Policy> for ShutdownPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Drain => ShutdownPolicy::Drain,
            Policy::Discard => ShutdownPolicy::Discard,
        }
    }
}


#[derive(Debug)]
struct Request {
    id: u64,
    created: Instant,
}

fn get_request(stopper: &CancellationToken, next_id: &mut u64, interval: Duration) -> Option<Box<Request>> {
    thread::sleep(interval);
    if stopper.is_signaled() {
        return None;
    }
    *next_id += 1;
    Some(Box::new(Request {
        id: *next_id,
        created: Instant::now(),
    }))
}

fn process_request(request: Box<Request>, token: CancellationToken, cost: Duration) {
    const POLL: Duration = Duration::from_millis(10);

    let deadline = Instant::now() + cost;
    loop {
        if token.is_signaled() {
            tracing::debug!(id = request.id, "request abandoned on shutdown");
            return;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining.min(POLL));
    }
    tracing::trace!(id = request.id, latency = ?request.created.elapsed(), "request processed");
}


fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_names(true)
                .with_thread_ids(true)
                .with_target(false),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_logging();

    let rt = Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    rt.block_on(run(args))
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    let cost = Duration::from_millis(args.process_ms);
    let config = Config {
        num_threads: args.workers,
        shutdown: args.policy.into(),
        ..Default::default()
    };
    let mut pool = WorkerPool::<Box<Request>>::with_config(
        move |request: Box<Request>, token: CancellationToken| process_request(request, token, cost),
        config,
    )
    .context("failed to start worker pool")?;

    if args.grow > 0 {
        pool.grow(args.grow).context("failed to grow worker pool")?;
    }

    // The request source has its own stopper, independent of the pool.
    let stopper = CancellationToken::new();
    let producer = {
        let stopper = stopper.clone();
        let submitter = pool.submitter();
        let interval = Duration::from_millis(args.generate_interval_ms);
        tokio::task::spawn_blocking(move || {
            let mut next_id = 0;
            while let Some(request) = get_request(&stopper, &mut next_id, interval) {
                submitter.submit(request);
            }
            next_id
        })
    };

    let started = Instant::now();
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(args.duration_secs)) => {
            tracing::info!("run time elapsed");
        }
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for ctrl-c")?;
            tracing::info!("interrupt received");
        }
    }

    stopper.signal();
    let produced = producer.await.context("producer task failed")?;

    // Joining workers blocks, keep it off the async threads.
    let metrics = tokio::task::spawn_blocking(move || {
        pool.stop();
        pool.metrics()
    })
    .await
    .context("pool shutdown task failed")?;

    tracing::info!(
        produced,
        submitted = metrics.submitted,
        completed = metrics.completed,
        failed = metrics.failed,
        dropped = metrics.dropped,
        elapsed = ?started.elapsed(),
        "driver finished"
    );
    Ok(())
}
