use std::fmt::Debug;

use log::*;
use loyalty_common::{OrderNumber, Points};

use crate::{
    db::traits::{AccountApiError, AccountManagement, InsertOrderResult},
    db_types::Withdrawal,
};

/// `OrderFlowApi` handles user-initiated ledger writes: submitting orders for reconciliation and withdrawing points.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: AccountManagement
{
    /// Submits a purchase-order number on behalf of an account.
    ///
    /// The number must pass the Luhn check; anything else is rejected before storage is touched. A new order starts
    /// out as `NEW` and is picked up by the reconciliation engine on its next discovery cycle.
    ///
    /// Re-submitting a number the account already owns returns [`InsertOrderResult::AlreadyExists`]. Submitting a
    /// number owned by another account fails with [`AccountApiError::OrderBelongsToAnotherAccount`].
    pub async fn submit_order(&self, account_id: i64, number: &str) -> Result<InsertOrderResult, AccountApiError> {
        let number = number.parse::<OrderNumber>().map_err(|e| {
            debug!("🔄️📦️ Account #{account_id} submitted an invalid order number. {e}");
            e
        })?;
        let result = self.db.insert_order(account_id, &number).await?;
        match &result {
            InsertOrderResult::Inserted(_) => info!("🔄️📦️ Order {number} accepted for account #{account_id}"),
            InsertOrderResult::AlreadyExists(_) => {
                debug!("🔄️📦️ Order {number} was already submitted by account #{account_id}")
            },
        }
        Ok(result)
    }

    /// Spends `sum` points from the account against the (Luhn-valid) order number `number`.
    ///
    /// The balance can never go negative: the debit and the withdrawal record are written in one transaction, and a
    /// withdrawal larger than the current balance fails with [`AccountApiError::InsufficientFunds`].
    pub async fn withdraw(&self, account_id: i64, number: &str, sum: Points) -> Result<Withdrawal, AccountApiError> {
        let number = number.parse::<OrderNumber>()?;
        if !sum.is_positive() {
            return Err(AccountApiError::InvalidAmount(sum));
        }
        let withdrawal = self.db.withdraw(account_id, &number, sum).await.map_err(|e| {
            warn!("🔄️💰️ Withdrawal of {sum} for account #{account_id} failed. {e}");
            e
        })?;
        info!("🔄️💰️ Account #{account_id} withdrew {sum} against order {number}");
        Ok(withdrawal)
    }
}
