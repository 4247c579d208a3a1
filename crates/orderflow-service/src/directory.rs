//! Client administration.
//!
//! Every mutation goes through [`PartyStore::patch_party`], so an
//! administrative change never overwrites a balance committed by an order
//! running concurrently. Deactivation here is what in-flight submissions
//! observe at their recheck.
//!
//! The directory also owns the [`ProfitConservation`] tracker: profit
//! resets and overrides are the only operations allowed to move the sum of
//! all balances, and each records the exact delta its patch applied.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use orderflow_settlement::ProfitConservation;
use orderflow_store::{Clock, OrderStore, PartyStore, PatchedParty};
use orderflow_types::{
    AppResponse, OrderflowError, Party, PartyId, PartyPatch, Result, constants,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::orders::OrderView;

/// Registration or update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// On update, `Some(true)` reactivates an inactive client. Ignored on
    /// registration.
    #[serde(default)]
    pub active: Option<bool>,
}

/// A client with the orders it supplied and consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientView {
    pub id: PartyId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub active: bool,
    pub inactive_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub profit: Decimal,
    pub supplied_orders: Vec<OrderView>,
    pub consumed_orders: Vec<OrderView>,
}

pub struct ClientDirectory {
    parties: Arc<dyn PartyStore>,
    orders: Arc<dyn OrderStore>,
    clock: Arc<dyn Clock>,
    conservation: Mutex<ProfitConservation>,
}

impl ClientDirectory {
    /// Open a directory over existing stores, baselining conservation on
    /// the balances they already hold.
    ///
    /// # Errors
    /// Propagates a failed read of the party table.
    pub async fn open(
        parties: Arc<dyn PartyStore>,
        orders: Arc<dyn OrderStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let baseline = total_profit(parties.as_ref()).await?;
        tracing::info!(%baseline, "Client directory opened");
        Ok(Self {
            parties,
            orders,
            clock,
            conservation: Mutex::new(ProfitConservation::new(baseline)),
        })
    }

    pub async fn register(&self, request: ClientRequest) -> AppResponse<PartyId> {
        let party = Party::register(request.name, request.email, request.phone, self.clock.now());
        match self.parties.save_party(party).await {
            Ok(id) => {
                tracing::info!(client = %id, "Client registered");
                AppResponse::ok(id, constants::CLIENT_ADDED_MESSAGE)
            }
            Err(err) => admin_failure("register", &err),
        }
    }

    pub async fn get(&self, id: PartyId) -> AppResponse<ClientView> {
        let party = match self.parties.find_party(id).await {
            Ok(Some(party)) => party,
            Ok(None) => return not_found(id),
            Err(err) => return admin_failure("get", &err),
        };
        let orders = match self.orders.orders_for_party(id).await {
            Ok(orders) => orders,
            Err(err) => return admin_failure("get", &err),
        };

        let mut supplied_orders = Vec::new();
        let mut consumed_orders = Vec::new();
        for record in orders {
            // A self-order shows up on both sides.
            if record.supplier_id == id {
                supplied_orders.push(OrderView::from(record.clone()));
            }
            if record.consumer_id == id {
                consumed_orders.push(OrderView::from(record));
            }
        }

        AppResponse::ok(
            ClientView {
                id: party.id,
                name: party.name,
                email: party.email,
                phone: party.phone,
                active: party.active,
                inactive_at: party.inactive_at,
                created_at: party.created_at,
                profit: party.profit,
                supplied_orders,
                consumed_orders,
            },
            constants::SUCCESS_MESSAGE,
        )
    }

    /// Replace contact fields. An inactive client is reactivated only when
    /// the request asks for it; an active one is never deactivated here.
    pub async fn update(&self, id: PartyId, request: ClientRequest) -> AppResponse<PartyId> {
        let current = match self.parties.find_party(id).await {
            Ok(Some(party)) => party,
            Ok(None) => return not_found(id),
            Err(err) => return admin_failure("update", &err),
        };

        let mut patch = PartyPatch {
            name: Some(request.name),
            email: Some(request.email),
            phone: Some(request.phone),
            ..PartyPatch::default()
        };
        if !current.active && request.active == Some(true) {
            patch.active = Some(true);
            patch.inactive_at = Some(None);
            tracing::info!(client = %id, "Client reactivated");
        }

        match self.parties.patch_party(id, patch).await {
            Ok(Some(_)) => AppResponse::ok(id, constants::CLIENT_UPDATED_MESSAGE),
            Ok(None) => not_found(id),
            Err(err) => admin_failure("update", &err),
        }
    }

    pub async fn deactivate(&self, id: PartyId) -> AppResponse<PartyId> {
        let at = self.clock.now();
        match self.parties.patch_party(id, PartyPatch::deactivate(at)).await {
            Ok(Some(_)) => {
                tracing::info!(client = %id, inactive_at = %at, "Client deactivated");
                AppResponse::ok(id, constants::CLIENT_DEACTIVATED_MESSAGE)
            }
            Ok(None) => not_found(id),
            Err(err) => admin_failure("deactivate", &err),
        }
    }

    /// Zero every balance. Returns how many clients were reset.
    pub async fn reset_profits(&self) -> AppResponse<usize> {
        let parties = match self.parties.all_parties().await {
            Ok(parties) => parties,
            Err(err) => return admin_failure("reset_profits", &err),
        };
        let mut reset = 0;
        for party in parties {
            let patched = match self
                .parties
                .patch_party(party.id, PartyPatch::profit(Decimal::ZERO))
                .await
            {
                Ok(Some(patched)) => patched,
                Ok(None) => continue,
                Err(err) => return admin_failure("reset_profits", &err),
            };
            if let Err(err) = self.record_override(&patched) {
                return admin_failure("reset_profits", &err);
            }
            reset += 1;
        }
        tracing::info!(reset, "Client profits reset");
        AppResponse::ok(reset, constants::PROFITS_RESET_MESSAGE)
    }

    /// Override one balance, e.g. to pin a test client near the floor.
    pub async fn set_profit(&self, id: PartyId, value: Decimal) -> AppResponse<PartyId> {
        let patched = match self.parties.patch_party(id, PartyPatch::profit(value)).await {
            Ok(Some(patched)) => patched,
            Ok(None) => return not_found(id),
            Err(err) => return admin_failure("set_profit", &err),
        };
        if let Err(err) = self.record_override(&patched) {
            return admin_failure("set_profit", &err);
        }
        tracing::info!(client = %id, profit = %value, "Client profit overridden");
        AppResponse::ok(id, constants::PROFIT_SET_MESSAGE)
    }

    /// Check Σ profit against the tracked expectation.
    ///
    /// # Errors
    /// [`OrderflowError::ConservationViolation`] on drift, or the store's
    /// read error.
    pub async fn verify_conservation(&self) -> Result<Decimal> {
        let total = total_profit(self.parties.as_ref()).await?;
        if let Err(err) = self.conservation.lock().verify(total) {
            tracing::error!(error = %err, "Profit conservation violated");
            return Err(err);
        }
        Ok(total)
    }

    #[must_use]
    pub fn expected_total(&self) -> Decimal {
        self.conservation.lock().expected_total()
    }

    fn record_override(&self, patched: &PatchedParty) -> Result<()> {
        let delta = patched.profit_delta().ok_or_else(|| {
            OrderflowError::ConservationViolation {
                reason: format!(
                    "override of {} from {} to {} is out of range",
                    patched.after.id, patched.before.profit, patched.after.profit
                ),
            }
        })?;
        self.conservation.lock().record_adjustment(delta)
    }
}

async fn total_profit(parties: &dyn PartyStore) -> Result<Decimal> {
    parties
        .all_parties()
        .await?
        .iter()
        .try_fold(Decimal::ZERO, |total, p| total.checked_add(p.profit))
        .ok_or_else(|| OrderflowError::ConservationViolation {
            reason: "sum of balances is out of range".to_string(),
        })
}

fn not_found<T>(id: PartyId) -> AppResponse<T> {
    tracing::warn!(client = %id, "Client not found");
    AppResponse::fail(constants::CLIENT_NOT_FOUND_MESSAGE)
}

fn admin_failure<T>(operation: &str, err: &OrderflowError) -> AppResponse<T> {
    if let OrderflowError::DuplicateEmail(email) = err {
        tracing::warn!(operation, %email, "Email already registered");
        return AppResponse::fail(constants::EMAIL_TAKEN_MESSAGE);
    }
    tracing::error!(operation, error = %err, "Client operation failed");
    AppResponse::fail(constants::STORAGE_FAILURE_MESSAGE)
}
