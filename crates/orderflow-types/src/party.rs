//! Party (client) model.
//!
//! A party is a plain value record. Stores hand out copies and accept
//! replacements or field-wise patches; nothing holds a live reference.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::PartyId;

/// A client taking part in orders as supplier, consumer, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    pub name: String,
    /// Unique across all parties.
    pub email: String,
    pub phone: String,
    pub active: bool,
    /// Set only while `active` is false.
    pub inactive_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Signed running profit balance.
    pub profit: Decimal,
}

impl Party {
    /// A freshly registered party: active with a zero balance.
    #[must_use]
    pub fn register(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PartyId::new(),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            active: true,
            inactive_at: None,
            created_at: now,
            profit: Decimal::ZERO,
        }
    }

    /// Balance this party would hold after paying `price`. `None` if the
    /// result falls outside the decimal range.
    #[must_use]
    pub fn projected_profit(&self, price: Decimal) -> Option<Decimal> {
        self.profit.checked_sub(price)
    }

    /// Mark inactive at `at`.
    pub fn deactivate(&mut self, at: DateTime<Utc>) {
        self.active = false;
        self.inactive_at = Some(at);
    }

    /// Mark active again and clear the deactivation timestamp.
    pub fn reactivate(&mut self) {
        self.active = true;
        self.inactive_at = None;
    }
}

/// Field-wise update applied atomically by a party store.
///
/// `None` leaves the field untouched. Administrative operations go through
/// a patch so they never overwrite a balance committed concurrently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartyPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
    pub inactive_at: Option<Option<DateTime<Utc>>>,
    pub profit: Option<Decimal>,
}

impl PartyPatch {
    #[must_use]
    pub fn deactivate(at: DateTime<Utc>) -> Self {
        Self {
            active: Some(false),
            inactive_at: Some(Some(at)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn reactivate() -> Self {
        Self {
            active: Some(true),
            inactive_at: Some(None),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn profit(value: Decimal) -> Self {
        Self {
            profit: Some(value),
            ..Self::default()
        }
    }

    /// Apply this patch to `party` in place.
    pub fn apply(self, party: &mut Party) {
        if let Some(name) = self.name {
            party.name = name;
        }
        if let Some(email) = self.email {
            party.email = email;
        }
        if let Some(phone) = self.phone {
            party.phone = phone;
        }
        if let Some(active) = self.active {
            party.active = active;
        }
        if let Some(inactive_at) = self.inactive_at {
            party.inactive_at = inactive_at;
        }
        if let Some(profit) = self.profit {
            party.profit = profit;
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Party {
    pub fn dummy_active(profit: Decimal) -> Self {
        let id = PartyId::new();
        Self {
            id,
            name: format!("Client {}", &id.to_string()[..8]),
            email: format!("{id}@example.test"),
            phone: "212-658-3916".to_string(),
            active: true,
            inactive_at: None,
            created_at: Utc::now(),
            profit,
        }
    }

    pub fn dummy_inactive(profit: Decimal) -> Self {
        let mut party = Self::dummy_active(profit);
        party.deactivate(Utc::now());
        party
    }
}
