use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use accrual_client::{AccrualOutcome, AccrualStatus};
use tokio::time::{sleep, Instant};

use super::{authority::ScriptedAuthority, mocks::accepting_ledger};
use crate::{config::ReconcilerConfig, reconciliation::Reconciler};

const ORDER_A: &str = "79927398713";
const ORDER_B: &str = "12345678903";

fn config(workers: usize) -> ReconcilerConfig {
    ReconcilerConfig { workers, queue_capacity: 10, poll_interval: Duration::from_secs(1), ..Default::default() }
}

fn rate_limited(secs: u64) -> AccrualOutcome {
    AccrualOutcome::RateLimited { retry_after: Duration::from_secs(secs) }
}

fn processing() -> AccrualOutcome {
    AccrualOutcome::Resolved { status: AccrualStatus::Processing, accrual: None }
}

#[tokio::test(start_paused = true)]
async fn rate_limited_worker_pauses_before_next_call() {
    let _ = env_logger::try_init();
    let applied = Arc::new(AtomicUsize::new(0));
    let db = Arc::new(accepting_ledger(&[ORDER_A], applied.clone()));
    let authority = Arc::new(ScriptedAuthority::new());
    authority.script(ORDER_A, vec![rate_limited(5), processing()]);

    let reconciler = Reconciler::start(db.clone(), authority.clone(), &config(1));
    sleep(Duration::from_secs(12)).await;
    reconciler.shutdown().await;

    let calls = authority.calls_for(ORDER_A);
    assert!(calls.len() >= 2, "Expected at least two calls, got {}", calls.len());
    assert!(calls[1] - calls[0] >= Duration::from_secs(5), "Second call came after {:?}", calls[1] - calls[0]);
    assert!(applied.load(Ordering::SeqCst) >= 1);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_reply_does_not_touch_the_ledger() {
    let _ = env_logger::try_init();
    let applied = Arc::new(AtomicUsize::new(0));
    let db = Arc::new(accepting_ledger(&[ORDER_A], applied.clone()));
    let authority = Arc::new(ScriptedAuthority::new());
    authority.script(ORDER_A, vec![rate_limited(3)]);

    let reconciler = Reconciler::start(db.clone(), authority.clone(), &config(1));
    sleep(Duration::from_secs(10)).await;
    reconciler.shutdown().await;

    let calls = authority.calls_for(ORDER_A);
    assert!(calls.len() >= 3, "Expected at least three calls, got {}", calls.len());
    for pair in calls.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(3), "Calls only {:?} apart", pair[1] - pair[0]);
    }
    assert_eq!(applied.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn other_workers_keep_draining_while_one_is_paused() {
    let _ = env_logger::try_init();
    let applied = Arc::new(AtomicUsize::new(0));
    let db = Arc::new(accepting_ledger(&[ORDER_A, ORDER_B], applied.clone()));
    let authority = Arc::new(ScriptedAuthority::new());
    authority.script(ORDER_A, vec![rate_limited(5), processing()]);
    authority.script(ORDER_B, vec![processing()]);

    let start = Instant::now();
    let reconciler = Reconciler::start(db.clone(), authority.clone(), &config(2));
    sleep(Duration::from_millis(4_500)).await;
    reconciler.shutdown().await;

    let within_pause = |calls: Vec<Instant>| calls.into_iter().filter(|t| *t - start < Duration::from_secs(5)).count();
    // B is discovered on every tick (0s..4s) and handled by the worker that is not paused
    assert!(within_pause(authority.calls_for(ORDER_B)) >= 4);
    // A is re-offered on the next tick and answered by the free worker, well before the pause ends
    assert!(within_pause(authority.calls_for(ORDER_A)) >= 2);
    assert!(applied.load(Ordering::SeqCst) >= 5);
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_paused_workers() {
    let _ = env_logger::try_init();
    let applied = Arc::new(AtomicUsize::new(0));
    let db = Arc::new(accepting_ledger(&[ORDER_A, ORDER_B], applied.clone()));
    let authority = Arc::new(ScriptedAuthority::new());
    authority.script(ORDER_A, vec![rate_limited(600)]);
    authority.script(ORDER_B, vec![rate_limited(600)]);

    let reconciler = Reconciler::start(db.clone(), authority.clone(), &config(2));
    sleep(Duration::from_secs(1)).await;
    let before = Instant::now();
    reconciler.shutdown().await;
    assert!(Instant::now() - before < Duration::from_secs(1));
    assert_eq!(authority.total_calls(), 2);
    assert_eq!(applied.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_lets_in_flight_jobs_finish() {
    let _ = env_logger::try_init();
    let applied = Arc::new(AtomicUsize::new(0));
    let db = Arc::new(accepting_ledger(&[ORDER_A], applied.clone()));
    let authority = Arc::new(ScriptedAuthority::new().with_latency(Duration::from_secs(2)));
    authority.script(ORDER_A, vec![processing()]);

    let reconciler = Reconciler::start(db.clone(), authority.clone(), &config(1));
    sleep(Duration::from_millis(500)).await;
    assert_eq!(authority.total_calls(), 1);
    assert_eq!(applied.load(Ordering::SeqCst), 0);
    reconciler.shutdown().await;
    // The reply arrived after shutdown was requested, and was still applied
    assert_eq!(authority.total_calls(), 1);
    assert_eq!(applied.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_poll_interval_still_reconciles() {
    let _ = env_logger::try_init();
    let applied = Arc::new(AtomicUsize::new(0));
    let db = Arc::new(accepting_ledger(&[ORDER_A], applied.clone()));
    let authority = Arc::new(ScriptedAuthority::new());
    authority.script(ORDER_A, vec![processing()]);

    let config = ReconcilerConfig { poll_interval: Duration::ZERO, ..config(1) };
    let reconciler = Reconciler::start(db.clone(), authority.clone(), &config);
    sleep(Duration::from_secs(2)).await;
    reconciler.shutdown().await;
    assert!(authority.total_calls() > 0);
    assert!(applied.load(Ordering::SeqCst) > 0);
}
