use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use loyalty_common::OrderNumber;
use loyalty_engine::{
    db_types::{Order, OrderStatusType, Verdict, VerdictApplied},
    LedgerDatabase,
    LedgerError,
};
use tokio::{
    sync::mpsc,
    time::{sleep, Instant},
};
use tokio_util::sync::CancellationToken;

use super::mocks::{aged_order, order, MockLedger};
use crate::{config::ReconcilerConfig, reconciliation::BatchDiscoverer};

const NUMBERS: [&str; 5] = ["79927398713", "12345678903", "2377225624", "9278923470", "346436439"];

#[tokio::test]
async fn storage_errors_yield_an_empty_batch() {
    let mut db = MockLedger::new();
    db.expect_fetch_unresolved_orders().returning(|| Err(LedgerError::DatabaseError("disk on fire".into())));
    let mut discoverer = BatchDiscoverer::new(Arc::new(db), &ReconcilerConfig::default());
    assert!(discoverer.discover().await.is_empty());
}

/// A ledger whose discovery query never finishes in time.
struct StallingDiscovery;

#[async_trait]
impl LedgerDatabase for StallingDiscovery {
    async fn fetch_unresolved_orders(&self) -> Result<Vec<Order>, LedgerError> {
        sleep(Duration::from_secs(3600)).await;
        Ok(vec![order(NUMBERS[0], OrderStatusType::New)])
    }

    async fn fetch_order(&self, _number: &OrderNumber) -> Result<Option<Order>, LedgerError> {
        Ok(None)
    }

    async fn apply_verdict(&self, number: &OrderNumber, verdict: Verdict) -> Result<VerdictApplied, LedgerError> {
        Ok(VerdictApplied::StatusChanged(order(number.as_str(), verdict.target_status())))
    }
}

#[tokio::test(start_paused = true)]
async fn storage_timeouts_yield_an_empty_batch() {
    let config = ReconcilerConfig { storage_timeout: Duration::from_secs(2), ..Default::default() };
    let mut discoverer = BatchDiscoverer::new(Arc::new(StallingDiscovery), &config);
    let start = Instant::now();
    assert!(discoverer.discover().await.is_empty());
    let elapsed = Instant::now() - start;
    assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3), "Gave up after {elapsed:?}");
}

#[tokio::test]
async fn discovery_returns_order_numbers() {
    let mut db = MockLedger::new();
    db.expect_fetch_unresolved_orders().returning(|| {
        Ok(vec![order(NUMBERS[0], OrderStatusType::New), order(NUMBERS[1], OrderStatusType::Processing)])
    });
    let mut discoverer = BatchDiscoverer::new(Arc::new(db), &ReconcilerConfig::default());
    let batch = discoverer.discover().await;
    let batch = batch.iter().map(|n| n.as_str()).collect::<Vec<_>>();
    assert_eq!(batch, vec![NUMBERS[0], NUMBERS[1]]);
}

#[test]
fn stale_orders_are_reported_once() {
    let config = ReconcilerConfig::default();
    let mut discoverer = BatchDiscoverer::new(Arc::new(MockLedger::new()), &config);
    let old = aged_order(NUMBERS[0], OrderStatusType::Processing, chrono::Duration::hours(25));
    let fresh = aged_order(NUMBERS[1], OrderStatusType::New, chrono::Duration::hours(1));
    let now = Utc::now();

    let reported = discoverer.report_stale(&[old.clone(), fresh.clone()], now);
    assert_eq!(reported, vec![old.number.clone()]);
    assert!(discoverer.report_stale(&[old.clone(), fresh.clone()], now).is_empty());

    // Once the order leaves the unresolved set and comes back, it is reported again
    assert!(discoverer.report_stale(&[fresh.clone()], now).is_empty());
    assert_eq!(discoverer.report_stale(&[old.clone(), fresh], now), vec![old.number]);
}

#[test]
fn stale_threshold_is_configurable() {
    let config = ReconcilerConfig { stale_order_threshold: chrono::Duration::minutes(30), ..Default::default() };
    let mut discoverer = BatchDiscoverer::new(Arc::new(MockLedger::new()), &config);
    let order = aged_order(NUMBERS[0], OrderStatusType::New, chrono::Duration::hours(1));
    assert_eq!(discoverer.report_stale(&[order.clone()], Utc::now()), vec![order.number]);
}

#[tokio::test(start_paused = true)]
async fn full_queue_suspends_discovery_without_dropping_jobs() {
    let mut db = MockLedger::new();
    db.expect_fetch_unresolved_orders()
        .returning(|| Ok(NUMBERS.iter().map(|n| order(n, OrderStatusType::New)).collect()));
    let discoverer = BatchDiscoverer::new(Arc::new(db), &ReconcilerConfig::default());
    let (sender, mut receiver) = mpsc::channel(2);
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(discoverer.run(sender, Duration::from_secs(1), shutdown.clone()));

    sleep(Duration::from_millis(100)).await;
    assert_eq!(receiver.len(), 2);

    let mut received = vec![];
    for _ in 0..NUMBERS.len() {
        let number = receiver.recv().await.expect("queue closed early");
        received.push(number.as_str().to_string());
    }
    assert_eq!(received, NUMBERS.to_vec());

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn discovery_stops_when_cancelled() {
    let mut db = MockLedger::new();
    db.expect_fetch_unresolved_orders().returning(|| Ok(vec![]));
    let discoverer = BatchDiscoverer::new(Arc::new(db), &ReconcilerConfig::default());
    let (sender, mut receiver) = mpsc::channel(2);
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(discoverer.run(sender, Duration::from_secs(1), shutdown.clone()));
    sleep(Duration::from_secs(3)).await;
    shutdown.cancel();
    task.await.unwrap();
    // The sender was dropped with the task
    assert!(receiver.recv().await.is_none());
}
