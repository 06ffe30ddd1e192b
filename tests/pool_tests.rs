#![cfg(feature = "pool")]
//! Integration tests for the object pool and the thread pool.
//!
//! These drive the pools from several threads at once and check the sizing
//! limits of [`PoolConfig`] from the outside.

use guarded::Error;
use guarded::pool::{ObjectPool, PoolConfig, PooledObjectFactory, ThreadPool};
use rstest::rstest;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Routes pool logs to the test output; filter with `RUST_LOG=guarded=debug`.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Hands out connection ids and tracks how many are alive.
#[derive(Clone, Default)]
struct Connections {
    opened: Arc<AtomicUsize>,
    alive: Arc<AtomicUsize>,
    // Connections opened before this generation fail validation.
    generation: Arc<AtomicUsize>,
    checked: Arc<AtomicUsize>,
}

#[derive(Debug)]
struct Connection {
    id: usize,
    generation: usize,
}

impl PooledObjectFactory<Connection> for Connections {
    fn create(&self) -> guarded::Result<Connection> {
        self.alive.fetch_add(1, Ordering::SeqCst);
        Ok(Connection {
            id: self.opened.fetch_add(1, Ordering::SeqCst),
            generation: self.generation.load(Ordering::SeqCst),
        })
    }

    fn validate(&self, connection: &Connection) -> bool {
        self.checked.fetch_add(1, Ordering::SeqCst);
        connection.generation >= self.generation.load(Ordering::SeqCst)
    }

    fn destroy(&self, _: Connection) {
        self.alive.fetch_sub(1, Ordering::SeqCst);
    }
}

fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

// =============================================================================
// ObjectPool
// =============================================================================

#[rstest]
#[case::single(1)]
#[case::few(3)]
fn concurrent_borrowers_never_exceed_max_active(#[case] max_active: usize) {
    init_logging();
    let factory = Connections::default();
    let pool = ObjectPool::new(
        factory.clone(),
        PoolConfig::default()
            .with_max_active(max_active)
            .with_max_idle(max_active),
    )
    .unwrap();
    let out = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let borrowers: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            let out = Arc::clone(&out);
            let peak = Arc::clone(&peak);
            thread::spawn(move || {
                for _ in 0..25 {
                    let connection = pool.borrow().unwrap();
                    let now = out.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::yield_now();
                    out.fetch_sub(1, Ordering::SeqCst);
                    drop(connection);
                }
            })
        })
        .collect();
    for borrower in borrowers {
        borrower.join().unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= max_active);
    assert!(factory.opened.load(Ordering::SeqCst) <= max_active);
    assert_eq!(pool.num_active(), 0);
    assert!(pool.num_idle() <= max_active);
}

#[rstest]
fn idle_objects_stay_within_max_idle() {
    let factory = Connections::default();
    let pool = ObjectPool::new(
        factory.clone(),
        PoolConfig::default().with_max_active(6).with_max_idle(2),
    )
    .unwrap();

    let held: Vec<_> = (0..6).map(|_| pool.borrow().unwrap()).collect();
    for connection in held {
        pool.give_back(connection);
    }

    assert_eq!(pool.num_idle(), 2);
    assert_eq!(factory.alive.load(Ordering::SeqCst), 2);
}

#[rstest]
fn eviction_keeps_min_idle() {
    let factory = Connections::default();
    let pool = ObjectPool::new(
        factory.clone(),
        PoolConfig::default().with_min_idle(3).with_max_idle(5),
    )
    .unwrap();
    pool.prefill().unwrap();

    factory.generation.fetch_add(1, Ordering::SeqCst);
    assert_eq!(pool.evict().unwrap(), 3);
    assert_eq!(pool.num_idle(), 3);
    assert_eq!(factory.alive.load(Ordering::SeqCst), 3);

    let ids: Vec<usize> = (0..3).map(|_| pool.borrow().unwrap().detach().id).collect();
    assert!(ids.iter().all(|id| *id >= 3));
}

#[rstest]
fn background_evictor_refills_the_pool() {
    init_logging();
    let factory = Connections::default();
    let pool = ObjectPool::new(
        factory.clone(),
        PoolConfig::default()
            .with_min_idle(2)
            .with_max_idle(2)
            .with_eviction_interval(Duration::from_millis(10)),
    )
    .unwrap();

    assert!(wait_until(Duration::from_secs(5), || pool.num_idle() == 2));
    factory.generation.fetch_add(1, Ordering::SeqCst);
    assert!(wait_until(Duration::from_secs(5), || {
        factory.opened.load(Ordering::SeqCst) >= 4 && pool.num_idle() == 2
    }));

    pool.close();
    assert!(wait_until(Duration::from_secs(5), || {
        factory.alive.load(Ordering::SeqCst) == 0
    }));
}

/// Blocks validation until the test has seen it start.
#[derive(Clone)]
struct SlowCheck {
    started: Arc<Barrier>,
}

impl PooledObjectFactory<u32> for SlowCheck {
    fn create(&self) -> guarded::Result<u32> {
        Ok(42)
    }

    fn validate(&self, _: &u32) -> bool {
        self.started.wait();
        thread::sleep(Duration::from_millis(100));
        true
    }
}

#[rstest]
fn try_borrow_during_eviction_gets_the_examined_object() {
    let started = Arc::new(Barrier::new(2));
    let pool = ObjectPool::new(
        SlowCheck {
            started: Arc::clone(&started),
        },
        PoolConfig::default().with_max_active(1).with_min_idle(1),
    )
    .unwrap();
    assert_eq!(pool.prefill().unwrap(), 1);

    let evictor = {
        let pool = pool.clone();
        thread::spawn(move || pool.evict())
    };
    started.wait();
    assert_eq!(pool.num_active(), 0);
    assert_eq!(pool.num_idle(), 0);

    let object = pool.try_borrow().unwrap();
    assert_eq!(*object, 42);
    assert_eq!(pool.num_active(), 1);
    assert_eq!(evictor.join().unwrap().unwrap(), 0);
    drop(object);
    assert_eq!(pool.num_idle(), 1);
}

#[rstest]
fn background_eviction_never_exhausts_borrowers() {
    init_logging();
    let factory = Connections::default();
    let pool = ObjectPool::new(
        factory.clone(),
        PoolConfig::default()
            .with_max_active(4)
            .with_max_idle(4)
            .with_eviction_interval(Duration::from_millis(1)),
    )
    .unwrap();
    let warm: Vec<_> = (0..4).map(|_| pool.borrow().unwrap()).collect();
    drop(warm);

    let start = Arc::new(Barrier::new(4));
    let borrowers: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            let factory = factory.clone();
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                let deadline = Instant::now() + Duration::from_secs(5);
                while factory.checked.load(Ordering::SeqCst) < 200 && Instant::now() < deadline {
                    let connection = pool.try_borrow()?;
                    thread::yield_now();
                    drop(connection);
                }
                Ok::<(), Error>(())
            })
        })
        .collect();
    for borrower in borrowers {
        assert_eq!(borrower.join().unwrap(), Ok(()));
    }

    assert!(factory.checked.load(Ordering::SeqCst) >= 200);
    assert_eq!(pool.num_active(), 0);
    assert!(wait_until(Duration::from_secs(5), || pool.num_idle() == 4));
    assert_eq!(factory.opened.load(Ordering::SeqCst), 4);
}

#[rstest]
fn configuration_from_a_lookup() {
    let vars = HashMap::from([
        ("GUARDED_POOL_MAX_ACTIVE", "2"),
        ("GUARDED_POOL_MAX_IDLE", "2"),
        ("GUARDED_POOL_MIN_IDLE", "1"),
    ]);
    let config = PoolConfig::from_lookup(|name| vars.get(name).map(|value| (*value).to_owned()))
        .unwrap();
    let pool = ObjectPool::new(Connections::default(), config).unwrap();
    assert_eq!(pool.prefill().unwrap(), 1);

    let _first = pool.borrow().unwrap();
    let _second = pool.borrow().unwrap();
    assert_eq!(
        pool.try_borrow().unwrap_err(),
        Error::Exhausted { max_active: 2 }
    );
}

#[rstest]
fn failing_factory_frees_its_slot() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let factory = {
        let attempts = Arc::clone(&attempts);
        move || -> guarded::Result<u32> {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::creation("first attempt refused"))
            } else {
                Ok(7)
            }
        }
    };
    let pool = ObjectPool::new(factory, PoolConfig::default().with_max_active(1)).unwrap();

    assert!(matches!(pool.borrow(), Err(Error::Creation { .. })));
    assert_eq!(pool.num_active(), 0);
    assert_eq!(*pool.borrow().unwrap(), 7);
}

// =============================================================================
// ThreadPool
// =============================================================================

#[rstest]
fn thread_pool_runs_every_job() {
    init_logging();
    let pool = ThreadPool::new(4).unwrap();
    let sum = Arc::new(AtomicUsize::new(0));
    for value in 1..=100 {
        let sum = Arc::clone(&sum);
        pool.execute(move || {
            sum.fetch_add(value, Ordering::SeqCst);
        })
        .unwrap();
    }
    pool.shutdown();
    assert_eq!(sum.load(Ordering::SeqCst), 5050);
    assert_eq!(pool.num_busy(), 0);
}

#[rstest]
fn thread_pool_runs_jobs_in_parallel() {
    let pool = ThreadPool::new(3).unwrap();
    let barrier = Arc::new(Barrier::new(4));
    for _ in 0..3 {
        let barrier = Arc::clone(&barrier);
        pool.execute(move || {
            barrier.wait();
        })
        .unwrap();
    }
    barrier.wait();
    pool.shutdown();
}

#[rstest]
fn dropping_the_thread_pool_waits_for_running_jobs() {
    let finished = Arc::new(AtomicUsize::new(0));
    {
        let pool = ThreadPool::new(2).unwrap();
        for _ in 0..2 {
            let finished = Arc::clone(&finished);
            pool.execute(move || {
                thread::sleep(Duration::from_millis(20));
                finished.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
    }
    assert_eq!(finished.load(Ordering::SeqCst), 2);
}

#[rstest]
fn default_size_follows_the_cpu_count() {
    let pool = ThreadPool::with_default_size().unwrap();
    assert_eq!(pool.num_idle(), num_cpus::get());
}
