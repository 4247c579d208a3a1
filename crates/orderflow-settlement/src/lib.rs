//! # orderflow-settlement
//!
//! **Finality plane**: everything between an admitted, validated order and
//! its committed ledger effect.
//!
//! 1. **ProcessingSimulator**: cancellable processing delay (the race window)
//! 2. **ConsistencyRecheck**: fresh consumer read, active check only
//! 3. **LedgerUpdater**: atomic credit/debit/insert via the ledger store
//! 4. **ProfitConservation**: Σ profit invariant across all parties
//!
//! ## Flow
//!
//! ```text
//! ValidatedOrder → ProcessingSimulator.simulate() → ConsistencyRecheck.recheck()
//!     → Rechecked → LedgerUpdater.commit() → OrderId
//! ```

pub mod conservation;
pub mod ledger;
pub mod recheck;
pub mod simulator;

pub use conservation::ProfitConservation;
pub use ledger::LedgerUpdater;
pub use recheck::{ConsistencyRecheck, Rechecked};
pub use simulator::{
    CancelHandle, Cancellation, DelayStrategy, FixedDelay, Interrupted, NoDelay,
    ProcessingSimulator, RandomDelay, cancellation,
};

#[cfg(any(test, feature = "test-helpers"))]
pub use simulator::GatedDelay;
