//! Ledger updater: the only path that moves balances for an order.
//!
//! A commit is one [`LedgerStore::commit`] call:
//! 1. Business key still unique
//! 2. Both parties still exist
//! 3. Consumer still active
//! 4. Credit supplier by `price`, debit consumer by `price`
//! 5. Insert the order record
//!
//! Deltas are applied against the balances the store holds at commit time,
//! never against the snapshots read during validation, so concurrent
//! commits for the same party cannot overwrite each other.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use orderflow_store::LedgerStore;
use orderflow_types::{FailureReason, OrderId, OrderRecord, OrderSubmission, OrderflowError};

use crate::recheck::Rechecked;

pub struct LedgerUpdater {
    ledger: Arc<dyn LedgerStore>,
}

impl LedgerUpdater {
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Commit `submission` for a consumer that passed the recheck.
    ///
    /// # Errors
    /// - `DuplicateBusinessKey` if another submission committed the same key
    ///   while this one was in its delay
    /// - `ConsumerBecameInactive` if the consumer was deactivated after the
    ///   recheck
    /// - `PersistenceFailure` for anything else the store refuses
    pub async fn commit(
        &self,
        rechecked: Rechecked,
        submission: &OrderSubmission,
        processing_start_at: DateTime<Utc>,
        processing_end_at: DateTime<Utc>,
    ) -> Result<OrderId, FailureReason> {
        debug_assert_eq!(rechecked.consumer().id, submission.consumer_id);
        debug_assert_eq!(rechecked.supplier_id(), submission.supplier_id);

        let record =
            OrderRecord::from_submission(submission, processing_start_at, processing_end_at);
        let order_id = record.id;
        match self.ledger.commit(record).await {
            Ok(id) => {
                tracing::info!(
                    order_id = %id,
                    supplier = %submission.supplier_id,
                    consumer = %submission.consumer_id,
                    price = %submission.price,
                    "Order committed"
                );
                Ok(id)
            }
            Err(err) => Err(commit_failure(order_id, &err)),
        }
    }
}

fn commit_failure(order_id: OrderId, err: &OrderflowError) -> FailureReason {
    match err {
        OrderflowError::DuplicateBusinessKey(key) => {
            tracing::warn!(%order_id, business_key = %key, "Business key committed concurrently");
            FailureReason::DuplicateBusinessKey
        }
        OrderflowError::PartyInactive(party) => {
            tracing::warn!(%order_id, consumer = %party, "Consumer inactive at commit");
            FailureReason::ConsumerBecameInactive
        }
        other => {
            tracing::error!(%order_id, error = %other, "Ledger commit failed");
            FailureReason::PersistenceFailure
        }
    }
}
