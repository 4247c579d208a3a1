//! Process-wide configuration for the order workflow.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{OrderflowError, Result, constants};

/// Workflow settings shared by every submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Lowest projected consumer balance an order may leave behind.
    pub min_profit: Decimal,
    /// Lifetime of an idempotency lock entry.
    pub idempotency_ttl_secs: u64,
    /// Shortest simulated processing delay.
    pub delay_min_ms: u64,
    /// Longest simulated processing delay (inclusive).
    pub delay_max_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            min_profit: Decimal::from(constants::DEFAULT_MIN_PROFIT),
            idempotency_ttl_secs: constants::DEFAULT_IDEMPOTENCY_TTL_SECS,
            delay_min_ms: constants::DEFAULT_DELAY_MIN_MS,
            delay_max_ms: constants::DEFAULT_DELAY_MAX_MS,
        }
    }
}

impl WorkflowConfig {
    #[must_use]
    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_secs(self.idempotency_ttl_secs)
    }

    #[must_use]
    pub fn delay_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.delay_min_ms),
            Duration::from_millis(self.delay_max_ms),
        )
    }

    /// Reject settings the workflow cannot run with.
    ///
    /// # Errors
    /// Returns [`OrderflowError::Configuration`] for a zero TTL or an
    /// inverted delay range.
    pub fn validate(&self) -> Result<()> {
        if self.idempotency_ttl_secs == 0 {
            return Err(OrderflowError::Configuration(
                "idempotency_ttl_secs must be > 0".to_string(),
            ));
        }
        if self.delay_min_ms > self.delay_max_ms {
            return Err(OrderflowError::Configuration(format!(
                "delay_min_ms ({}) exceeds delay_max_ms ({})",
                self.delay_min_ms, self.delay_max_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = WorkflowConfig::default();
        assert_eq!(cfg.min_profit, Decimal::new(-1000, 0));
        assert_eq!(cfg.idempotency_ttl(), Duration::from_secs(60));
        assert_eq!(
            cfg.delay_range(),
            (Duration::from_secs(1), Duration::from_secs(10))
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_ttl_rejected() {
        let cfg = WorkflowConfig {
            idempotency_ttl_secs: 0,
            ..WorkflowConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, OrderflowError::Configuration(_)));
    }

    #[test]
    fn inverted_delay_range_rejected() {
        let cfg = WorkflowConfig {
            delay_min_ms: 500,
            delay_max_ms: 100,
            ..WorkflowConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: WorkflowConfig = serde_json::from_str(r#"{"min_profit": "-500"}"#).unwrap();
        assert_eq!(cfg.min_profit, Decimal::new(-500, 0));
        assert_eq!(cfg.idempotency_ttl_secs, 60);
    }
}
