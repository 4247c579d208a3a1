//! In-memory party, order, and ledger store.
//!
//! All tables sit behind a single mutex, so a ledger commit validates every
//! precondition first and only then mutates: either the full operation
//! succeeds or the tables are unchanged. The mutex is never held across an
//! `.await`.

use std::collections::{BTreeMap, HashMap};
#[cfg(any(test, feature = "test-helpers"))]
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use orderflow_types::{
    BusinessKey, OrderId, OrderRecord, OrderflowError, Party, PartyId, PartyPatch, Result,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::repository::{LedgerStore, OrderStore, PartyStore, PatchedParty};

#[derive(Debug, Default)]
struct Tables {
    parties: HashMap<PartyId, Party>,
    /// Unique email index.
    emails: HashMap<String, PartyId>,
    /// UUIDv7 keys keep this in insertion order.
    orders: BTreeMap<OrderId, OrderRecord>,
    /// Unique `(title, supplier, consumer)` index.
    business_keys: HashMap<BusinessKey, OrderId>,
}

impl Tables {
    fn email_taken_by_other(&self, email: &str, id: PartyId) -> bool {
        self.emails.get(email).is_some_and(|owner| *owner != id)
    }

    fn insert_order(&mut self, order: OrderRecord) -> Result<OrderId> {
        let key = order.business_key();
        if self.business_keys.contains_key(&key) {
            return Err(OrderflowError::DuplicateBusinessKey(key));
        }
        if self.orders.contains_key(&order.id) {
            return Err(OrderflowError::DuplicateOrder(order.id));
        }
        let id = order.id;
        self.business_keys.insert(key, id);
        self.orders.insert(id, order);
        Ok(id)
    }
}

/// Operations still to fail on purpose.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Default)]
struct Faults {
    commits: AtomicUsize,
    reads: AtomicUsize,
}

#[cfg(any(test, feature = "test-helpers"))]
impl Faults {
    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Party, order, and ledger store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    #[cfg(any(test, feature = "test-helpers"))]
    faults: Faults,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with `parties`.
    ///
    /// # Errors
    /// Returns [`OrderflowError::DuplicateEmail`] if two parties share an email.
    pub fn with_parties(parties: impl IntoIterator<Item = Party>) -> Result<Self> {
        let store = Self::new();
        {
            let mut tables = store.tables.lock();
            for party in parties {
                if tables.email_taken_by_other(&party.email, party.id) {
                    return Err(OrderflowError::DuplicateEmail(party.email));
                }
                tables.emails.insert(party.email.clone(), party.id);
                tables.parties.insert(party.id, party);
            }
        }
        Ok(store)
    }

    #[allow(clippy::unnecessary_wraps)]
    fn check_read(&self) -> Result<()> {
        #[cfg(any(test, feature = "test-helpers"))]
        if Faults::take(&self.faults.reads) {
            return Err(OrderflowError::Storage {
                reason: "injected read failure".to_string(),
            });
        }
        Ok(())
    }

    #[allow(clippy::unnecessary_wraps)]
    fn check_commit(&self) -> Result<()> {
        #[cfg(any(test, feature = "test-helpers"))]
        if Faults::take(&self.faults.commits) {
            return Err(OrderflowError::LedgerCommitFailed {
                reason: "injected commit failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl MemoryStore {
    /// Make the next `n` ledger commits fail with a storage error.
    pub fn inject_commit_failures(&self, n: usize) {
        self.faults.commits.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` reads fail with a storage error.
    pub fn inject_read_failures(&self, n: usize) {
        self.faults.reads.store(n, Ordering::SeqCst);
    }

    /// Σ profit over every party.
    pub fn total_profit(&self) -> Decimal {
        self.tables.lock().parties.values().map(|p| p.profit).sum()
    }

    pub fn order_count(&self) -> usize {
        self.tables.lock().orders.len()
    }
}

#[async_trait]
impl PartyStore for MemoryStore {
    async fn find_party(&self, id: PartyId) -> Result<Option<Party>> {
        self.check_read()?;
        Ok(self.tables.lock().parties.get(&id).cloned())
    }

    async fn save_party(&self, party: Party) -> Result<PartyId> {
        let mut tables = self.tables.lock();
        if tables.email_taken_by_other(&party.email, party.id) {
            return Err(OrderflowError::DuplicateEmail(party.email));
        }
        if let Some(previous) = tables.parties.get(&party.id) {
            let old_email = previous.email.clone();
            tables.emails.remove(&old_email);
        }
        let id = party.id;
        tables.emails.insert(party.email.clone(), id);
        tables.parties.insert(id, party);
        Ok(id)
    }

    async fn patch_party(&self, id: PartyId, patch: PartyPatch) -> Result<Option<PatchedParty>> {
        let mut tables = self.tables.lock();
        let Some(before) = tables.parties.get(&id).cloned() else {
            return Ok(None);
        };
        if let Some(email) = &patch.email {
            if tables.email_taken_by_other(email, id) {
                return Err(OrderflowError::DuplicateEmail(email.clone()));
            }
        }

        let mut after = before.clone();
        patch.apply(&mut after);
        if after.email != before.email {
            tables.emails.remove(&before.email);
            tables.emails.insert(after.email.clone(), id);
        }
        tables.parties.insert(id, after.clone());
        Ok(Some(PatchedParty { before, after }))
    }

    async fn all_parties(&self) -> Result<Vec<Party>> {
        self.check_read()?;
        let mut parties: Vec<Party> = self.tables.lock().parties.values().cloned().collect();
        parties.sort_by_key(|p| p.id);
        Ok(parties)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn exists_by_business_key(&self, key: &BusinessKey) -> Result<bool> {
        self.check_read()?;
        Ok(self.tables.lock().business_keys.contains_key(key))
    }

    async fn save_order(&self, order: OrderRecord) -> Result<OrderId> {
        self.tables.lock().insert_order(order)
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        self.check_read()?;
        Ok(self.tables.lock().orders.get(&id).cloned())
    }

    async fn all_orders(&self) -> Result<Vec<OrderRecord>> {
        self.check_read()?;
        Ok(self.tables.lock().orders.values().cloned().collect())
    }

    async fn orders_for_party(&self, party: PartyId) -> Result<Vec<OrderRecord>> {
        self.check_read()?;
        Ok(self
            .tables
            .lock()
            .orders
            .values()
            .filter(|o| o.involves(party))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn commit(&self, record: OrderRecord) -> Result<OrderId> {
        self.check_commit()?;

        let price = record.price;
        if price <= Decimal::ZERO {
            return Err(OrderflowError::InvalidOrder {
                reason: format!("price must be positive, got {price}"),
            });
        }

        let mut tables = self.tables.lock();

        // 1. Preconditions (no mutation yet)
        let key = record.business_key();
        if tables.business_keys.contains_key(&key) {
            return Err(OrderflowError::DuplicateBusinessKey(key));
        }
        let supplier = tables
            .parties
            .get(&record.supplier_id)
            .ok_or(OrderflowError::PartyNotFound(record.supplier_id))?;
        let consumer = tables
            .parties
            .get(&record.consumer_id)
            .ok_or(OrderflowError::PartyNotFound(record.consumer_id))?;
        if !consumer.active {
            return Err(OrderflowError::PartyInactive(consumer.id));
        }

        // 2. New balances, computed before anything is written
        let supplier_after =
            supplier
                .profit
                .checked_add(price)
                .ok_or(OrderflowError::BalanceOverflow {
                    party: supplier.id,
                    balance: supplier.profit,
                    delta: price,
                })?;
        let consumer_before = if record.supplier_id == record.consumer_id {
            supplier_after
        } else {
            consumer.profit
        };
        let consumer_after =
            consumer_before
                .checked_sub(price)
                .ok_or(OrderflowError::BalanceOverflow {
                    party: consumer.id,
                    balance: consumer_before,
                    delta: -price,
                })?;

        // 3. Apply
        let supplier_id = record.supplier_id;
        let consumer_id = record.consumer_id;
        let order_id = tables.insert_order(record)?;
        if let Some(party) = tables.parties.get_mut(&supplier_id) {
            party.profit = supplier_after;
        }
        if let Some(party) = tables.parties.get_mut(&consumer_id) {
            party.profit = consumer_after;
        }

        tracing::debug!(
            order = %order_id,
            supplier = %supplier_id,
            consumer = %consumer_id,
            %price,
            "Ledger entry committed"
        );
        Ok(order_id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use orderflow_types::OrderSubmission;

    use super::*;

    fn record(supplier: PartyId, consumer: PartyId, title: &str, price: Decimal) -> OrderRecord {
        let now = Utc::now();
        OrderRecord::from_submission(
            &OrderSubmission::dummy(supplier, consumer, title, price),
            now,
            now,
        )
    }

    fn two_parties() -> (MemoryStore, Party, Party) {
        let supplier = Party::dummy_active(Decimal::new(500, 0));
        let consumer = Party::dummy_active(Decimal::new(2000, 0));
        let store = MemoryStore::with_parties([supplier.clone(), consumer.clone()]).unwrap();
        (store, supplier, consumer)
    }

    #[tokio::test]
    async fn commit_moves_both_balances() {
        let (store, supplier, consumer) = two_parties();
        let entry = record(supplier.id, consumer.id, "Food", Decimal::new(100, 0));
        let id = store.commit(entry).await.unwrap();

        let s = store.find_party(supplier.id).await.unwrap().unwrap();
        let c = store.find_party(consumer.id).await.unwrap().unwrap();
        assert_eq!(s.profit, Decimal::new(600, 0));
        assert_eq!(c.profit, Decimal::new(1900, 0));
        assert!(store.find_order(id).await.unwrap().is_some());
        assert_eq!(store.total_profit(), Decimal::new(2500, 0));
    }

    #[tokio::test]
    async fn same_party_commit_nets_to_zero() {
        let party = Party::dummy_active(Decimal::new(-970, 0));
        let store = MemoryStore::with_parties([party.clone()]).unwrap();
        store
            .commit(record(party.id, party.id, "Self", Decimal::new(30, 0)))
            .await
            .unwrap();
        let after = store.find_party(party.id).await.unwrap().unwrap();
        assert_eq!(after.profit, Decimal::new(-970, 0));
        assert_eq!(store.order_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_business_key_leaves_no_trace() {
        let (store, supplier, consumer) = two_parties();
        store
            .commit(record(supplier.id, consumer.id, "Food", Decimal::ONE))
            .await
            .unwrap();

        let err = store
            .commit(record(supplier.id, consumer.id, "Food", Decimal::TEN))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderflowError::DuplicateBusinessKey(_)));
        assert_eq!(store.order_count(), 1);
        let c = store.find_party(consumer.id).await.unwrap().unwrap();
        assert_eq!(c.profit, Decimal::new(1999, 0));
    }

    #[tokio::test]
    async fn inactive_consumer_refused_at_commit() {
        let supplier = Party::dummy_active(Decimal::ZERO);
        let consumer = Party::dummy_inactive(Decimal::ZERO);
        let store = MemoryStore::with_parties([supplier.clone(), consumer.clone()]).unwrap();

        let err = store
            .commit(record(supplier.id, consumer.id, "Food", Decimal::ONE))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderflowError::PartyInactive(id) if id == consumer.id));
        assert_eq!(store.total_profit(), Decimal::ZERO);
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn missing_party_refused() {
        let supplier = Party::dummy_active(Decimal::ZERO);
        let store = MemoryStore::with_parties([supplier.clone()]).unwrap();
        let ghost = PartyId::new();
        let err = store
            .commit(record(supplier.id, ghost, "Food", Decimal::ONE))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderflowError::PartyNotFound(id) if id == ghost));
        assert_eq!(store.total_profit(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn overflow_leaves_balances_untouched() {
        let supplier = Party::dummy_active(Decimal::MAX);
        let consumer = Party::dummy_active(Decimal::ZERO);
        let store = MemoryStore::with_parties([supplier.clone(), consumer.clone()]).unwrap();
        let err = store
            .commit(record(supplier.id, consumer.id, "Food", Decimal::ONE))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderflowError::BalanceOverflow { .. }));
        assert_eq!(store.order_count(), 0);
        let c = store.find_party(consumer.id).await.unwrap().unwrap();
        assert_eq!(c.profit, Decimal::ZERO);
    }

    #[tokio::test]
    async fn injected_commit_failure_is_one_shot() {
        let (store, supplier, consumer) = two_parties();
        store.inject_commit_failures(1);
        let entry = record(supplier.id, consumer.id, "Food", Decimal::ONE);
        assert!(store.commit(entry.clone()).await.is_err());
        assert_eq!(store.order_count(), 0);
        assert!(store.commit(entry).await.is_ok());
    }

    #[tokio::test]
    async fn email_index_is_unique() {
        let a = Party::dummy_active(Decimal::ZERO);
        let mut b = Party::dummy_active(Decimal::ZERO);
        let store = MemoryStore::with_parties([a.clone()]).unwrap();

        b.email = a.email.clone();
        let err = store.save_party(b.clone()).await.unwrap_err();
        assert!(matches!(err, OrderflowError::DuplicateEmail(_)));

        b.email = "b@example.test".to_string();
        store.save_party(b.clone()).await.unwrap();
        let patch = PartyPatch {
            email: Some(a.email.clone()),
            ..PartyPatch::default()
        };
        assert!(store.patch_party(b.id, patch).await.is_err());
    }

    #[tokio::test]
    async fn patch_keeps_committed_balance() {
        let (store, supplier, consumer) = two_parties();
        store
            .commit(record(supplier.id, consumer.id, "Food", Decimal::TEN))
            .await
            .unwrap();
        let patched = store
            .patch_party(consumer.id, PartyPatch::deactivate(Utc::now()))
            .await
            .unwrap()
            .unwrap();
        assert!(patched.before.active);
        assert!(!patched.after.active);
        assert_eq!(patched.after.profit, Decimal::new(1990, 0));
        assert_eq!(patched.profit_delta(), Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn profit_patch_reports_its_delta() {
        let (store, _, consumer) = two_parties();
        let patched = store
            .patch_party(consumer.id, PartyPatch::profit(Decimal::new(-970, 0)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(patched.before.profit, Decimal::new(2000, 0));
        assert_eq!(patched.profit_delta(), Some(Decimal::new(-2970, 0)));
    }

    #[tokio::test]
    async fn patch_unknown_party_is_none() {
        let store = MemoryStore::new();
        let res = store
            .patch_party(PartyId::new(), PartyPatch::reactivate())
            .await
            .unwrap();
        assert!(res.is_none());
    }

    #[tokio::test]
    async fn orders_for_party_filters_both_sides() {
        let (store, supplier, consumer) = two_parties();
        let other = Party::dummy_active(Decimal::ZERO);
        store.save_party(other.clone()).await.unwrap();

        store
            .commit(record(supplier.id, consumer.id, "A", Decimal::ONE))
            .await
            .unwrap();
        store
            .commit(record(consumer.id, other.id, "B", Decimal::ONE))
            .await
            .unwrap();

        assert_eq!(store.orders_for_party(consumer.id).await.unwrap().len(), 2);
        assert_eq!(store.orders_for_party(supplier.id).await.unwrap().len(), 1);
        assert_eq!(store.orders_for_party(other.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn injected_read_failure_surfaces_storage_error() {
        let (store, supplier, _) = two_parties();
        store.inject_read_failures(1);
        let err = store.find_party(supplier.id).await.unwrap_err();
        assert!(matches!(err, OrderflowError::Storage { .. }));
        assert!(store.find_party(supplier.id).await.unwrap().is_some());
    }
}
