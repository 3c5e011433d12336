use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use request_processor::{CancellationToken, Config as PoolConfig, ShutdownPolicy, WorkerPool};
use std::{hint::black_box, thread, time::Duration};

fn noop_pool(config: PoolConfig) -> WorkerPool<Box<u64>> {
    WorkerPool::<Box<u64>>::with_config(
        |request: Box<u64>, _: CancellationToken| {
            black_box(request);
        },
        config,
    )
    .unwrap()
}

// Benchmark 1: submit + drain overhead
fn bench_submit_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_overhead");

    for size in [100u64, 1000, 10000] {
        group.throughput(Throughput::Elements(size));

        group.bench_with_input(BenchmarkId::new("submit_and_stop", size), &size, |b, &size| {
            b.iter(|| {
                let mut pool = noop_pool(PoolConfig::cpu_bound());
                for i in 0..size {
                    pool.submit(Box::new(i));
                }
                pool.stop();
            });
        });

        // std channel baseline, one consumer thread
        group.bench_with_input(BenchmarkId::new("std_mpsc", size), &size, |b, &size| {
            b.iter(|| {
                let (tx, rx) = std::sync::mpsc::channel::<Box<u64>>();
                let consumer = thread::spawn(move || {
                    for request in rx {
                        black_box(request);
                    }
                });
                for i in 0..size {
                    tx.send(Box::new(i)).unwrap();
                }
                drop(tx);
                consumer.join().unwrap();
            });
        });
    }

    group.finish();
}

const PER_PRODUCER: u64 = 5_000;

// Benchmark 2: many producers through cloned submitters
fn bench_multi_producer(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_producer");
    group.sample_size(20);

    for producers in [1u64, 4, 8] {
        group.throughput(Throughput::Elements(producers * PER_PRODUCER));
        group.bench_with_input(BenchmarkId::from_parameter(producers), &producers, |b, &producers| {
            b.iter(|| {
                let mut pool = noop_pool(PoolConfig::cpu_bound());
                let handles: Vec<_> = (0..producers)
                    .map(|_| {
                        let submitter = pool.submitter();
                        thread::spawn(move || {
                            for i in 0..PER_PRODUCER {
                                submitter.submit(Box::new(i));
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
                pool.stop();
            });
        });
    }

    group.finish();
}

// Benchmark 3: wall clock vs worker count for sleeping tasks
fn bench_thread_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("thread_scaling");
    group.sample_size(10);

    for workers in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            b.iter(|| {
                let mut pool = WorkerPool::<Box<u64>>::new(
                    |_: Box<u64>, _: CancellationToken| thread::sleep(Duration::from_millis(1)),
                    workers,
                )
                .unwrap();
                for i in 0..64 {
                    pool.submit(Box::new(i));
                }
                pool.stop();
            });
        });
    }

    group.finish();
}

// Benchmark 4: shutdown cost per policy with a full queue
fn bench_shutdown_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("shutdown_policy");

    for (name, policy) in [("drain", ShutdownPolicy::Drain), ("discard", ShutdownPolicy::Discard)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut pool = noop_pool(PoolConfig {
                    num_threads: 2,
                    shutdown: policy,
                    ..Default::default()
                });
                for i in 0..10_000 {
                    pool.submit(Box::new(i));
                }
                pool.stop();
                black_box(pool.metrics());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_submit_overhead,
    bench_multi_producer,
    bench_thread_scaling,
    bench_shutdown_policy,
);

criterion_main!(benches);
