//! # orderflow-ingress
//!
//! **Admission plane**: everything a submission passes through before the
//! processing delay.
//!
//! 1. **IdempotencyGuard**: one in-flight processor per idempotency token
//! 2. **OrderValidator**: price, business-key, party, and profit-floor rules
//!
//! ## Flow
//!
//! ```text
//! OrderSubmission → IdempotencyGuard.admit() → OrderValidator.validate()
//!     → ValidatedOrder → (processing delay)
//! ```

pub mod idempotency;
pub mod validator;

pub use idempotency::IdempotencyGuard;
pub use validator::{OrderValidator, ValidatedOrder, check_active, check_price, check_profit_limit};
