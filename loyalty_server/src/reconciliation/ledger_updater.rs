use std::{sync::Arc, time::Duration};

use accrual_client::{AccrualOutcome, AccrualStatus};
use log::*;
use loyalty_common::{OrderNumber, Points};
use loyalty_engine::{
    db_types::{Verdict, VerdictApplied},
    LedgerDatabase,
    LedgerError,
};
use tokio::time::{sleep, timeout};

use crate::config::ReconcilerConfig;

/// What happened to a single accrual reply.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The verdict was committed (or found to be already applied).
    Applied(VerdictApplied),
    /// Nothing to apply: the reply carried no verdict, or the order does not exist.
    Skipped,
    /// Storage kept failing. The order stays unresolved and will be retried on a later discovery cycle.
    Deferred,
}

/// Applies accrual replies to the ledger.
pub struct LedgerUpdater<B> {
    db: Arc<B>,
    retry_attempts: u32,
    retry_backoff: Duration,
    storage_timeout: Duration,
}

impl<B> Clone for LedgerUpdater<B> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            retry_attempts: self.retry_attempts,
            retry_backoff: self.retry_backoff,
            storage_timeout: self.storage_timeout,
        }
    }
}

/// Maps an authority reply onto a ledger verdict. Replies that carry no decision map to `None`.
pub fn verdict_for(number: &OrderNumber, outcome: &AccrualOutcome) -> Option<Verdict> {
    match outcome {
        AccrualOutcome::Resolved { status: AccrualStatus::Registered | AccrualStatus::Processing, .. } => {
            Some(Verdict::Processing)
        },
        AccrualOutcome::Resolved { status: AccrualStatus::Invalid, .. } => Some(Verdict::Invalid),
        AccrualOutcome::Resolved { status: AccrualStatus::Processed, accrual } => {
            let amount = match accrual {
                Some(a) if *a >= Points::zero() => *a,
                Some(a) => {
                    warn!("🧾️ Order {number} was processed with a negative accrual of {a}. Nothing credited");
                    Points::zero()
                },
                None => {
                    warn!("🧾️ Order {number} was processed without an accrual amount. Nothing will be credited");
                    Points::zero()
                },
            };
            Some(Verdict::Processed(amount))
        },
        _ => None,
    }
}

impl<B> LedgerUpdater<B>
where B: LedgerDatabase
{
    pub fn new(db: Arc<B>, config: &ReconcilerConfig) -> Self {
        Self {
            db,
            retry_attempts: config.retry_attempts.max(1),
            retry_backoff: config.retry_backoff,
            storage_timeout: config.storage_timeout,
        }
    }

    pub async fn apply(&self, number: &OrderNumber, outcome: AccrualOutcome) -> UpdateOutcome {
        let Some(verdict) = verdict_for(number, &outcome) else {
            match outcome {
                AccrualOutcome::Unknown => info!("🧾️ The accrual service does not know order {number} yet"),
                AccrualOutcome::RateLimited { .. } => debug!("🧾️ Rate-limited reply for order {number} ignored"),
                other => warn!("🧾️ No verdict for order {number}: {other}. It will be retried later"),
            }
            return UpdateOutcome::Skipped;
        };
        for attempt in 1..=self.retry_attempts {
            match timeout(self.storage_timeout, self.db.apply_verdict(number, verdict)).await {
                Ok(Ok(applied)) => {
                    log_applied(number, &applied);
                    return UpdateOutcome::Applied(applied);
                },
                Ok(Err(LedgerError::OrderNotFound(_))) => {
                    warn!("🧾️ Order {number} no longer exists. Verdict {verdict} dropped");
                    return UpdateOutcome::Skipped;
                },
                Ok(Err(e)) => warn!(
                    "🧾️ Attempt {attempt}/{} to apply {verdict} to order {number} failed. {e}",
                    self.retry_attempts
                ),
                Err(_) => warn!(
                    "🧾️ Attempt {attempt}/{} to apply {verdict} to order {number} timed out after {}ms",
                    self.retry_attempts,
                    self.storage_timeout.as_millis()
                ),
            }
            if attempt < self.retry_attempts {
                sleep(self.retry_backoff * attempt).await;
            }
        }
        error!(
            "🧾️ Could not apply {verdict} to order {number} after {} attempts. It will be retried on the next discovery \
             cycle",
            self.retry_attempts
        );
        UpdateOutcome::Deferred
    }
}

fn log_applied(number: &OrderNumber, applied: &VerdictApplied) {
    match applied {
        VerdictApplied::Credited { order, amount } => {
            info!("🧾️ Order {number} processed. {amount} points credited to account #{}", order.user_id)
        },
        VerdictApplied::StatusChanged(order) => info!("🧾️ Order {number} is now {}", order.status),
        VerdictApplied::Unchanged(order) => trace!("🧾️ Order {number} unchanged ({})", order.status),
    }
}
