use std::{collections::HashSet, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use log::*;
use loyalty_common::OrderNumber;
use loyalty_engine::{db_types::Order, LedgerDatabase};
use tokio::{
    sync::mpsc,
    time::{interval, timeout, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::config::ReconcilerConfig;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Finds the orders that still await a verdict.
pub struct BatchDiscoverer<B> {
    db: Arc<B>,
    storage_timeout: Duration,
    stale_threshold: chrono::Duration,
    // Stale orders already reported. Pruned to the current batch on every pass, so an order that drops out and comes
    // back is reported again.
    reported_stale: HashSet<OrderNumber>,
}

impl<B> BatchDiscoverer<B>
where B: LedgerDatabase
{
    pub fn new(db: Arc<B>, config: &ReconcilerConfig) -> Self {
        Self {
            db,
            storage_timeout: config.storage_timeout,
            stale_threshold: config.stale_order_threshold,
            reported_stale: HashSet::new(),
        }
    }

    /// One discovery pass. Storage errors and timeouts are logged and yield an empty batch.
    pub async fn discover(&mut self) -> Vec<OrderNumber> {
        let orders = match timeout(self.storage_timeout, self.db.fetch_unresolved_orders()).await {
            Ok(Ok(orders)) => orders,
            Ok(Err(e)) => {
                warn!("🔍️ Could not fetch unresolved orders. {e}");
                return vec![];
            },
            Err(_) => {
                warn!("🔍️ Fetching unresolved orders timed out after {}ms", self.storage_timeout.as_millis());
                return vec![];
            },
        };
        trace!("🔍️ {} unresolved orders discovered", orders.len());
        self.report_stale(&orders, Utc::now());
        orders.into_iter().map(|o| o.number).collect()
    }

    /// Warns once about every order that has been unresolved for longer than the stale threshold. Returns the orders
    /// reported on this pass.
    pub fn report_stale(&mut self, orders: &[Order], now: DateTime<Utc>) -> Vec<OrderNumber> {
        let current = orders.iter().map(|o| &o.number).collect::<HashSet<_>>();
        self.reported_stale.retain(|n| current.contains(n));
        let mut newly_reported = vec![];
        for order in orders {
            let age = now - order.uploaded_at;
            if age > self.stale_threshold && self.reported_stale.insert(order.number.clone()) {
                warn!(
                    "🔍️ Order {} has been {} for {} hrs without a final verdict from the accrual service",
                    order.number,
                    order.status,
                    age.num_hours()
                );
                newly_reported.push(order.number.clone());
            }
        }
        newly_reported
    }

    /// Runs discovery passes every `poll_interval` (at least 10ms) until `shutdown` is cancelled or every worker has
    /// gone away.
    pub async fn run(mut self, queue: mpsc::Sender<OrderNumber>, poll_interval: Duration, shutdown: CancellationToken) {
        if poll_interval < MIN_POLL_INTERVAL {
            warn!(
                "🔍️ A poll interval of {}ms is too short. Using {}ms instead",
                poll_interval.as_millis(),
                MIN_POLL_INTERVAL.as_millis()
            );
        }
        let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        let mut timer = interval(poll_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("🔍️ Order discovery started. Polling every {}ms", poll_interval.as_millis());
        'discovery: loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {},
            }
            let batch = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                batch = self.discover() => batch,
            };
            for number in batch {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break 'discovery,
                    sent = queue.send(number) => {
                        if sent.is_err() {
                            warn!("🔍️ The job queue has been closed");
                            break 'discovery;
                        }
                    },
                }
            }
        }
        info!("🔍️ Order discovery stopped");
    }
}
