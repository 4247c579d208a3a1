//! Profit conservation invariant checker.
//!
//! Every committed order credits the supplier and debits the consumer by the
//! same price, so order flow never changes the sum of all balances:
//! ```text
//! Σ profit == baseline + Σ(administrative adjustments)
//! ```
//!
//! Only administrative operations (registration, profit resets, direct
//! profit overrides) may move the total, and they must be recorded here.

use orderflow_types::{OrderflowError, Result};
use rust_decimal::Decimal;

/// Tracks the expected total profit across all parties.
#[derive(Debug, Clone, Default)]
pub struct ProfitConservation {
    baseline: Decimal,
    adjustments: Decimal,
    adjustment_count: u64,
}

impl ProfitConservation {
    /// Start tracking from a known total.
    #[must_use]
    pub fn new(baseline: Decimal) -> Self {
        Self {
            baseline,
            adjustments: Decimal::ZERO,
            adjustment_count: 0,
        }
    }

    /// Record an administrative change of `delta` to the total.
    ///
    /// # Errors
    /// Returns [`OrderflowError::ConservationViolation`] if the running
    /// adjustment leaves the decimal range; the tracker is left unchanged.
    pub fn record_adjustment(&mut self, delta: Decimal) -> Result<()> {
        let adjustments = self.adjustments.checked_add(delta).ok_or_else(|| {
            OrderflowError::ConservationViolation {
                reason: format!("adjustment {delta} overflows running total {}", self.adjustments),
            }
        })?;
        self.adjustments = adjustments;
        self.adjustment_count += 1;
        Ok(())
    }

    /// Saturates at the decimal range.
    #[must_use]
    pub fn expected_total(&self) -> Decimal {
        self.baseline.saturating_add(self.adjustments)
    }

    #[must_use]
    pub fn adjustment_count(&self) -> u64 {
        self.adjustment_count
    }

    /// Verify the actual sum of balances against the expected total.
    ///
    /// # Errors
    /// Returns [`OrderflowError::ConservationViolation`] if they differ.
    pub fn verify(&self, actual_total: Decimal) -> Result<()> {
        let expected = self.expected_total();
        if actual_total != expected {
            return Err(OrderflowError::ConservationViolation {
                reason: format!(
                    "actual total {actual_total} != expected {expected} \
                     (baseline={}, adjustments={} over {} changes)",
                    self.baseline, self.adjustments, self.adjustment_count,
                ),
            });
        }
        Ok(())
    }
}
