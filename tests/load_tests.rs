#[cfg(test)]
mod tests {
    use request_processor::{
        pool::{Config, WorkerPool},
        token::CancellationToken,
    };
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::{Duration, Instant},
    };

    fn measure<F, T>(name: &str, f: F) -> (T, Duration)
    where
        F: FnOnce() -> T,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        println!("✓ {}: {:?}", name, elapsed);
        (result, elapsed)
    }

    fn sleeping_pool(workers: usize, cost: Duration) -> WorkerPool<Box<usize>> {
        WorkerPool::<Box<usize>>::new(
            move |_: Box<usize>, _: CancellationToken| thread::sleep(cost),
            workers,
        )
        .unwrap()
    }

    #[test]
    fn load_test_1_growth_shortens_wall_clock() {
        println!("\n=== LOAD TEST 1: 40 tasks @ 25ms, 2 workers vs 2+6 ===");
        let cost = Duration::from_millis(25);

        let (_, baseline) = measure("2 workers", || {
            let mut pool = sleeping_pool(2, cost);
            for i in 0..40 {
                pool.submit(Box::new(i));
            }
            pool.stop();
        });

        let (_, grown) = measure("2 workers + grow(6)", || {
            let mut pool = sleeping_pool(2, cost);
            pool.grow(6).unwrap();
            for i in 0..40 {
                pool.submit(Box::new(i));
            }
            pool.stop();
        });

        assert!(grown < baseline, "more workers must not be slower: {:?} vs {:?}", grown, baseline);
    }

    #[test]
    fn load_test_2_many_small_tasks() {
        println!("\n=== LOAD TEST 2: 100k trivial tasks ===");
        let sum = Arc::new(AtomicUsize::new(0));
        let acc = sum.clone();

        let mut pool = WorkerPool::<Box<usize>>::with_config(
            move |item: Box<usize>, _: CancellationToken| {
                acc.fetch_add(*item, Ordering::Relaxed);
            },
            Config::cpu_bound(),
        )
        .unwrap();
        assert_eq!(pool.config().num_threads, num_cpus::get());
        assert_eq!(pool.worker_count(), num_cpus::get());

        measure("100k tasks", || {
            for i in 0..100_000 {
                pool.submit(Box::new(i));
            }
            pool.stop();
        });

        let metrics = pool.metrics();
        println!("  completed: {}/{}", metrics.completed, metrics.submitted);
        assert_eq!(metrics.completed, 100_000);
        assert_eq!(sum.load(Ordering::Relaxed), (0..100_000).sum::<usize>());
    }

    #[test]
    fn load_test_3_producers_racing_stop() {
        println!("\n=== LOAD TEST 3: producers keep submitting through stop ===");
        let mut pool = WorkerPool::<Box<usize>>::with_config(
            |_: Box<usize>, token: CancellationToken| {
                if !token.is_signaled() {
                    thread::sleep(Duration::from_micros(200));
                }
            },
            Config::io_bound(),
        )
        .unwrap();

        let attempted = Arc::new(AtomicUsize::new(0));
        let producers: Vec<_> = (0..8)
            .map(|_| {
                let submitter = pool.submitter();
                let attempted = attempted.clone();
                thread::spawn(move || {
                    for i in 0..5_000 {
                        submitter.submit(Box::new(i));
                        attempted.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        measure("stop under load", || pool.stop());

        for producer in producers {
            producer.join().unwrap();
        }

        let metrics = pool.metrics();
        println!("  {:?}", metrics);
        assert_eq!(pool.worker_count(), 0);
        assert_eq!(metrics.settled(), attempted.load(Ordering::Relaxed));
    }

    #[test]
    fn load_test_4_stop_bounded_by_poll_interval() {
        println!("\n=== LOAD TEST 4: 64 long token-aware tasks ===");
        let poll = Duration::from_millis(50);
        let mut pool = WorkerPool::<Box<usize>>::new(
            move |_: Box<usize>, token: CancellationToken| {
                let deadline = Instant::now() + Duration::from_secs(10);
                while Instant::now() < deadline && !token.is_signaled() {
                    thread::sleep(poll);
                }
            },
            16,
        )
        .unwrap();

        for i in 0..64 {
            pool.submit(Box::new(i));
        }
        thread::sleep(Duration::from_millis(200));

        let (_, elapsed) = measure("stop", || pool.stop());
        let metrics = pool.metrics();
        assert!(elapsed < Duration::from_secs(2));
        assert_eq!(metrics.completed, 64, "queued items drain once the token is set");
    }
}
