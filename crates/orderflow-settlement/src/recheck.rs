//! Post-delay consistency recheck.
//!
//! Re-reads the consumer after the processing delay and re-applies the
//! active check only. The profit floor is not re-evaluated: balances can
//! move during the delay and the order commits against whatever the ledger
//! holds at commit time.

use std::sync::Arc;

use orderflow_ingress::{ValidatedOrder, check_active};
use orderflow_store::PartyStore;
use orderflow_types::{FailureReason, Party, PartyId};

/// A validated order whose consumer was still eligible after the delay.
///
/// Only [`ConsistencyRecheck::recheck`] constructs one, and the ledger
/// updater only commits one.
#[derive(Debug, Clone)]
pub struct Rechecked {
    validated: ValidatedOrder,
    consumer: Party,
}

impl Rechecked {
    /// Consumer as re-read after the delay.
    #[must_use]
    pub fn consumer(&self) -> &Party {
        &self.consumer
    }

    /// Snapshot taken by the validator before the delay.
    #[must_use]
    pub fn validated(&self) -> &ValidatedOrder {
        &self.validated
    }

    #[must_use]
    pub fn supplier_id(&self) -> PartyId {
        self.validated.supplier().id
    }
}

pub struct ConsistencyRecheck {
    parties: Arc<dyn PartyStore>,
}

impl ConsistencyRecheck {
    #[must_use]
    pub fn new(parties: Arc<dyn PartyStore>) -> Self {
        Self { parties }
    }

    /// Fresh read of the consumer; fails if it was deactivated meanwhile.
    ///
    /// # Errors
    /// `ConsumerBecameInactive`, `ConsumerNotFound` if the row vanished, or
    /// `PersistenceFailure` if the read errored.
    pub async fn recheck(&self, validated: ValidatedOrder) -> Result<Rechecked, FailureReason> {
        let consumer_id = validated.consumer().id;
        let fresh = match self.parties.find_party(consumer_id).await {
            Ok(Some(party)) => party,
            Ok(None) => {
                tracing::error!(consumer = %consumer_id, "Consumer vanished during processing");
                return Err(FailureReason::ConsumerNotFound);
            }
            Err(err) => {
                tracing::error!(consumer = %consumer_id, error = %err, "Consumer re-read failed");
                return Err(FailureReason::PersistenceFailure);
            }
        };

        if let Err(reason) = check_active(&fresh, FailureReason::ConsumerBecameInactive) {
            tracing::warn!(consumer = %consumer_id, "Consumer became inactive during processing");
            return Err(reason);
        }

        Ok(Rechecked {
            validated,
            consumer: fresh,
        })
    }
}
