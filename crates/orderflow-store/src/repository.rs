//! Persistence contracts consumed by the workflow.
//!
//! Stores return owned copies. Nothing outside a store holds a reference to
//! its rows, so every read observes the authoritative state at call time.

use async_trait::async_trait;
use orderflow_types::{BusinessKey, OrderId, OrderRecord, Party, PartyId, PartyPatch, Result};
use rust_decimal::Decimal;

/// A party as it was immediately before and after one atomic patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedParty {
    pub before: Party,
    pub after: Party,
}

impl PatchedParty {
    /// How far the patch moved the balance. `None` if the difference is not
    /// representable.
    #[must_use]
    pub fn profit_delta(&self) -> Option<Decimal> {
        self.after.profit.checked_sub(self.before.profit)
    }
}

/// Party (client) persistence.
#[async_trait]
pub trait PartyStore: Send + Sync {
    async fn find_party(&self, id: PartyId) -> Result<Option<Party>>;

    /// Insert or replace a party. Rejects an email held by another party.
    async fn save_party(&self, party: Party) -> Result<PartyId>;

    /// Apply `patch` atomically. `Ok(None)` when the party does not exist.
    async fn patch_party(&self, id: PartyId, patch: PartyPatch) -> Result<Option<PatchedParty>>;

    async fn all_parties(&self) -> Result<Vec<Party>>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn exists_by_business_key(&self, key: &BusinessKey) -> Result<bool>;

    /// Insert a record without touching balances. Enforces the unique
    /// business-key index.
    async fn save_order(&self, order: OrderRecord) -> Result<OrderId>;

    async fn find_order(&self, id: OrderId) -> Result<Option<OrderRecord>>;

    /// Every record, oldest first.
    async fn all_orders(&self) -> Result<Vec<OrderRecord>>;

    /// Records where `party` is supplier or consumer, oldest first.
    async fn orders_for_party(&self, party: PartyId) -> Result<Vec<OrderRecord>>;
}

/// Atomic ledger commit.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Credit the supplier, debit the consumer, and insert `record` as one
    /// unit: either all three happen or nothing changes. Refused if the
    /// consumer is inactive at commit time.
    async fn commit(&self, record: OrderRecord) -> Result<OrderId>;
}
