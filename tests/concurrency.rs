use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;
use tollgate::{Decision, ManualClock, Policy, PolicyLimiter, RateLimiter};

const THREADS: usize = 8;

#[test]
fn concurrent_burst_admits_exactly_limit() {
    let limit = 25u32;
    let extra = 39usize;
    let total = limit as usize + extra;

    let limiter = Arc::new(
        PolicyLimiter::new("burst", Policy::new(limit, Duration::from_secs(60)).unwrap())
            .with_clock(ManualClock::new()),
    );
    let admitted = Arc::new(AtomicUsize::new(0));
    let denied = Arc::new(AtomicUsize::new(0));
    let next = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    std::thread::scope(|s| {
        for _ in 0..THREADS {
            let limiter = limiter.clone();
            let admitted = admitted.clone();
            let denied = denied.clone();
            let next = next.clone();
            let barrier = barrier.clone();
            s.spawn(move || {
                barrier.wait();
                while next.fetch_add(1, Ordering::SeqCst) < total {
                    if limiter.is_allowed("shared-client") {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    } else {
                        denied.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(admitted.load(Ordering::SeqCst), limit as usize);
    assert_eq!(denied.load(Ordering::SeqCst), extra);
    assert_eq!(limiter.store().entries("shared-client"), limit as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_never_exceed_limit() {
    let limiter = Arc::new(
        PolicyLimiter::new("tasks", Policy::new(10, Duration::from_secs(60)).unwrap())
            .with_clock(ManualClock::new()),
    );

    let handles: Vec<_> = (0..40)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.check("task-client") })
        })
        .collect();

    let mut allowed = 0;
    for handle in handles {
        if let Decision::Allowed { .. } = handle.await.expect("task panicked") {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 10);
}

#[test]
fn concurrent_distinct_keys_each_get_full_budget() {
    let limiter = Arc::new(
        PolicyLimiter::new("keys", Policy::new(5, Duration::from_secs(60)).unwrap())
            .with_clock(ManualClock::new()),
    );

    std::thread::scope(|s| {
        for t in 0..THREADS {
            let limiter = limiter.clone();
            s.spawn(move || {
                let key = format!("client-{t}");
                let admitted = (0..20).filter(|_| limiter.is_allowed(&key)).count();
                assert_eq!(admitted, 5);
            });
        }
    });

    assert_eq!(limiter.store().tracked_keys(), THREADS);
}
