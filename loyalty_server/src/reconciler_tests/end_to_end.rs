use std::{collections::HashSet, sync::Arc, time::Duration};

use accrual_client::{AccrualOutcome, AccrualStatus};
use loyalty_common::{luhn_valid, Points};
use loyalty_engine::{
    db_types::{OrderStatusType, UserAccount},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    AccountApi,
    LedgerDatabase,
    OrderFlowApi,
    SqliteDatabase,
};
use rand::{seq::SliceRandom, Rng};
use tokio::time::{sleep, Instant};

use super::authority::ScriptedAuthority;
use crate::{config::ReconcilerConfig, reconciliation::Reconciler};

fn fast_config() -> ReconcilerConfig {
    ReconcilerConfig {
        workers: 4,
        queue_capacity: 8,
        poll_interval: Duration::from_millis(25),
        retry_backoff: Duration::from_millis(10),
        ..Default::default()
    }
}

fn processed(points: i64) -> AccrualOutcome {
    AccrualOutcome::Resolved { status: AccrualStatus::Processed, accrual: Some(Points::from_points(points)) }
}

fn in_progress(status: AccrualStatus) -> AccrualOutcome {
    AccrualOutcome::Resolved { status, accrual: None }
}

/// Appends the check digit that makes `digits` a valid order number.
fn luhn_complete(digits: &str) -> String {
    (0..=9).map(|d| format!("{digits}{d}")).find(|n| luhn_valid(n)).expect("one check digit always fits")
}

async fn create_account(db: &SqliteDatabase, login: &str) -> UserAccount {
    AccountApi::new(db.clone()).create_account(login).await.expect("Could not create account")
}

async fn wait_until_resolved(db: &SqliteDatabase, deadline: Duration) {
    let start = Instant::now();
    loop {
        let pending = db.fetch_unresolved_orders().await.expect("Could not fetch unresolved orders");
        if pending.is_empty() {
            return;
        }
        assert!(start.elapsed() < deadline, "{} orders still unresolved after {deadline:?}", pending.len());
        sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_processed_order_credits_its_owner() {
    let db = prepare_test_env(&random_db_path()).await;
    let alice = create_account(&db, "alice").await;
    OrderFlowApi::new(db.clone()).submit_order(alice.id, "79927398713").await.expect("Could not submit order");

    let authority = Arc::new(ScriptedAuthority::new());
    authority.script("79927398713", vec![
        in_progress(AccrualStatus::Registered),
        in_progress(AccrualStatus::Processing),
        processed(500),
    ]);
    let reconciler = Reconciler::start(Arc::new(db.clone()), Arc::clone(&authority), &fast_config());
    wait_until_resolved(&db, Duration::from_secs(10)).await;
    reconciler.shutdown().await;

    let accounts = AccountApi::new(db.clone());
    let orders = accounts.orders_for_account(alice.id).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatusType::Processed);
    assert_eq!(orders[0].accrual, Some(Points::from_points(500)));
    let balance = accounts.balance(alice.id).await.unwrap();
    assert_eq!(balance.current, Points::from_points(500));
    assert_eq!(balance.withdrawn, Points::zero());
    assert!(authority.calls_for("79927398713").len() >= 3);
    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn noisy_authority_still_credits_every_order_exactly_once() {
    let db = prepare_test_env(&random_db_path()).await;
    let mut accounts = Vec::new();
    for login in ["alice", "bob", "carol"] {
        accounts.push(create_account(&db, login).await);
    }
    let authority = Arc::new(ScriptedAuthority::new().with_jitter(15));
    let orders = OrderFlowApi::new(db.clone());
    let mut rng = rand::thread_rng();
    let mut seen = HashSet::new();
    let mut expected = vec![Points::zero(); accounts.len()];
    while seen.len() < 30 {
        let digits = format!("{}{:09}", rng.gen_range(1..=9), rng.gen_range(0..1_000_000_000u64));
        let number = luhn_complete(&digits);
        if !seen.insert(number.clone()) {
            continue;
        }
        let owner = rng.gen_range(0..accounts.len());
        orders.submit_order(accounts[owner].id, &number).await.expect("Could not submit order");

        let noise = [
            AccrualOutcome::Unknown,
            AccrualOutcome::RateLimited { retry_after: Duration::from_millis(30) },
            AccrualOutcome::AuthorityUnavailable { status: 503 },
            AccrualOutcome::TransportFailure("connection reset by peer".into()),
            in_progress(AccrualStatus::Registered),
            in_progress(AccrualStatus::Processing),
        ];
        let mut script = (0..rng.gen_range(0..4))
            .map(|_| noise.choose(&mut rng).cloned().unwrap_or(AccrualOutcome::Unknown))
            .collect::<Vec<_>>();
        if rng.gen_bool(0.8) {
            let points = rng.gen_range(0..1_000);
            expected[owner] += Points::from_points(points);
            script.push(processed(points));
        } else {
            script.push(in_progress(AccrualStatus::Invalid));
        }
        authority.script(&number, script);
    }

    let reconciler = Reconciler::start(Arc::new(db.clone()), Arc::clone(&authority), &fast_config());
    wait_until_resolved(&db, Duration::from_secs(20)).await;
    reconciler.shutdown().await;

    let api = AccountApi::new(db.clone());
    for (account, want) in accounts.iter().zip(expected) {
        let balance = api.balance(account.id).await.unwrap();
        assert_eq!(balance.current, want, "Wrong balance for {}", account.login);
        let credited = api
            .orders_for_account(account.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|o| o.status == OrderStatusType::Processed)
            .filter_map(|o| o.accrual)
            .sum::<Points>();
        assert_eq!(credited, want);
    }
    db.close().await;
}
