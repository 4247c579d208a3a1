//! Order validator: the hard gate before the processing delay.
//!
//! Rules run in a fixed order and stop at the first failure:
//!
//! 1. price > 0
//! 2. business key not already committed
//! 3. supplier exists
//! 4. consumer exists
//! 5. consumer active
//! 6. consumer balance after the order stays at or above `min_profit`
//!
//! The validator only reads. Nothing it loads is locked, so the state it saw
//! may change before the ledger commit.

use std::sync::Arc;

use orderflow_store::{OrderStore, PartyStore};
use orderflow_types::{FailureReason, OrderSubmission, OrderflowError, Party};
use rust_decimal::Decimal;

/// Snapshot of both parties as seen by a passing validation.
///
/// Only [`OrderValidator::validate`] constructs one.
#[derive(Debug, Clone)]
pub struct ValidatedOrder {
    supplier: Party,
    consumer: Party,
}

impl ValidatedOrder {
    #[must_use]
    pub fn supplier(&self) -> &Party {
        &self.supplier
    }

    #[must_use]
    pub fn consumer(&self) -> &Party {
        &self.consumer
    }
}

/// Rule 1.
pub fn check_price(price: Decimal) -> Result<(), FailureReason> {
    if price <= Decimal::ZERO {
        return Err(FailureReason::InvalidPrice);
    }
    Ok(())
}

/// Rule 5. `reason` distinguishes the initial check from the post-delay recheck.
pub fn check_active(consumer: &Party, reason: FailureReason) -> Result<(), FailureReason> {
    if !consumer.active {
        return Err(reason);
    }
    Ok(())
}

/// Rule 6. A projected balance equal to the floor passes; one that cannot
/// be represented does not.
pub fn check_profit_limit(
    consumer: &Party,
    price: Decimal,
    min_profit: Decimal,
) -> Result<(), FailureReason> {
    match consumer.projected_profit(price) {
        Some(projected) if projected >= min_profit => Ok(()),
        _ => Err(FailureReason::ProfitLimitExceeded),
    }
}

/// Runs the six validation rules against the stores.
pub struct OrderValidator {
    parties: Arc<dyn PartyStore>,
    orders: Arc<dyn OrderStore>,
    min_profit: Decimal,
}

impl OrderValidator {
    #[must_use]
    pub fn new(
        parties: Arc<dyn PartyStore>,
        orders: Arc<dyn OrderStore>,
        min_profit: Decimal,
    ) -> Self {
        Self {
            parties,
            orders,
            min_profit,
        }
    }

    /// Validate `submission`, returning the parties it was checked against.
    ///
    /// # Errors
    /// The [`FailureReason`] of the first rule that failed, or
    /// `PersistenceFailure` if a store read errored.
    pub async fn validate(
        &self,
        submission: &OrderSubmission,
    ) -> Result<ValidatedOrder, FailureReason> {
        // 1. Price
        if let Err(reason) = check_price(submission.price) {
            tracing::warn!(
                consumer = %submission.consumer_id,
                price = %submission.price,
                "Price must be greater than zero"
            );
            return Err(reason);
        }

        // 2. Business key
        let key = submission.business_key();
        let exists = self
            .orders
            .exists_by_business_key(&key)
            .await
            .map_err(storage_failure)?;
        if exists {
            tracing::warn!(business_key = %key, "Order already exists with this business key");
            return Err(FailureReason::DuplicateBusinessKey);
        }

        // 3. Supplier
        let Some(supplier) = self
            .parties
            .find_party(submission.supplier_id)
            .await
            .map_err(storage_failure)?
        else {
            tracing::warn!(supplier = %submission.supplier_id, "Supplier not found");
            return Err(FailureReason::SupplierNotFound);
        };

        // 4. Consumer
        let Some(consumer) = self
            .parties
            .find_party(submission.consumer_id)
            .await
            .map_err(storage_failure)?
        else {
            tracing::warn!(consumer = %submission.consumer_id, "Consumer not found");
            return Err(FailureReason::ConsumerNotFound);
        };

        // 5. Consumer active
        if let Err(reason) = check_active(&consumer, FailureReason::ConsumerInactive) {
            tracing::warn!(consumer = %consumer.id, "Consumer is inactive");
            return Err(reason);
        }

        // 6. Profit floor
        if let Err(reason) = check_profit_limit(&consumer, submission.price, self.min_profit) {
            tracing::warn!(
                consumer = %consumer.id,
                profit = %consumer.profit,
                price = %submission.price,
                min_profit = %self.min_profit,
                "Consumer profit would fall below the limit"
            );
            return Err(reason);
        }

        Ok(ValidatedOrder { supplier, consumer })
    }
}

fn storage_failure(err: OrderflowError) -> FailureReason {
    tracing::error!(error = %err, "Store read failed during validation");
    FailureReason::PersistenceFailure
}
