//! Order types: the caller's submission and the persisted record.
//!
//! Orders reference their parties by [`PartyId`] only. Balances live on the
//! party records and are mutated by the ledger commit, never through an
//! order.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{IdempotencyToken, OrderId, PartyId};

/// The `(title, supplier, consumer)` triple. Unique across committed orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BusinessKey {
    pub title: String,
    pub supplier_id: PartyId,
    pub consumer_id: PartyId,
}

impl BusinessKey {
    #[must_use]
    pub fn new(title: impl Into<String>, supplier_id: PartyId, consumer_id: PartyId) -> Self {
        Self {
            title: title.into(),
            supplier_id,
            consumer_id,
        }
    }
}

impl fmt::Display for BusinessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.title, self.supplier_id, self.consumer_id)
    }
}

/// One attempt to create an order. Consumed once by the idempotency guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmission {
    pub idempotency_token: IdempotencyToken,
    pub supplier_id: PartyId,
    pub consumer_id: PartyId,
    pub title: String,
    pub price: Decimal,
}

impl OrderSubmission {
    #[must_use]
    pub fn business_key(&self) -> BusinessKey {
        BusinessKey::new(self.title.clone(), self.supplier_id, self.consumer_id)
    }
}

/// A committed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub title: String,
    pub supplier_id: PartyId,
    pub consumer_id: PartyId,
    /// Always strictly positive.
    pub price: Decimal,
    /// Taken just before the processing delay began.
    pub processing_start_at: DateTime<Utc>,
    /// Taken just after the post-delay recheck passed.
    pub processing_end_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Build the record for a submission that cleared every stage.
    #[must_use]
    pub fn from_submission(
        submission: &OrderSubmission,
        processing_start_at: DateTime<Utc>,
        processing_end_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderId::new(),
            title: submission.title.clone(),
            supplier_id: submission.supplier_id,
            consumer_id: submission.consumer_id,
            price: submission.price,
            processing_start_at,
            processing_end_at,
            created_at: processing_end_at,
        }
    }

    #[must_use]
    pub fn business_key(&self) -> BusinessKey {
        BusinessKey::new(self.title.clone(), self.supplier_id, self.consumer_id)
    }

    /// Whether `party` is the supplier or the consumer of this order.
    #[must_use]
    pub fn involves(&self, party: PartyId) -> bool {
        self.supplier_id == party || self.consumer_id == party
    }

    /// How long the order spent in processing.
    #[must_use]
    pub fn processing_time(&self) -> chrono::Duration {
        self.processing_end_at - self.processing_start_at
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl OrderSubmission {
    pub fn dummy(supplier_id: PartyId, consumer_id: PartyId, title: &str, price: Decimal) -> Self {
        Self {
            idempotency_token: IdempotencyToken::random(),
            supplier_id,
            consumer_id,
            title: title.to_string(),
            price,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.idempotency_token = IdempotencyToken::new(token);
        self
    }
}
