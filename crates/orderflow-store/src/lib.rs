//! # orderflow-store
//!
//! Storage contracts the order workflow depends on, plus in-memory
//! implementations used by tests and single-process deployments.
//!
//! - [`Clock`]: wall-clock source ([`SystemClock`])
//! - [`LockStore`]: atomic set-if-absent with expiry ([`MemoryLockStore`])
//! - [`PartyStore`], [`OrderStore`], [`LedgerStore`]: party and order
//!   persistence and the atomic ledger commit ([`MemoryStore`])

pub mod clock;
pub mod lock;
pub mod memory;
pub mod repository;

pub use clock::{Clock, SystemClock};
pub use lock::{LockStore, MemoryLockStore};
pub use memory::MemoryStore;
pub use repository::{LedgerStore, OrderStore, PartyStore, PatchedParty};

#[cfg(any(test, feature = "test-helpers"))]
pub use clock::ManualClock;
