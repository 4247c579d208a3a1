//! # orderflow-types
//!
//! Shared types, errors, and configuration for the **orderflow** order
//! workflow.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`PartyId`], [`OrderId`], [`IdempotencyToken`]
//! - **Party model**: [`Party`], [`PartyPatch`]
//! - **Order model**: [`OrderSubmission`], [`OrderRecord`], [`BusinessKey`]
//! - **Outcomes**: [`FailureReason`], [`SubmissionOutcome`], [`AppResponse`]
//! - **Lifecycle**: [`SubmissionStage`]
//! - **Configuration**: [`WorkflowConfig`]
//! - **Errors**: [`OrderflowError`] with `OF_ERR_` prefix codes
//! - **Constants**: defaults and fixed strings

pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod order;
pub mod outcome;
pub mod party;
pub mod stage;

pub use config::*;
pub use error::*;
pub use ids::*;
pub use order::*;
pub use outcome::*;
pub use party::*;
pub use stage::*;

// Constants are accessed via `orderflow_types::constants::FOO`.
