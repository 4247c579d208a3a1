//! Submission outcomes and the response envelope handed to callers.
//!
//! Expected business failures are values, not errors: every submission ends
//! in a [`SubmissionOutcome`], which renders into an [`AppResponse`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{OrderId, constants};

/// Why a submission did not commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// Idempotency token empty or whitespace; never sent to the guard.
    MissingToken,
    /// Token already admitted and still locked.
    DuplicateSubmission,
    /// Price not strictly positive.
    InvalidPrice,
    /// `(title, supplier, consumer)` already committed.
    DuplicateBusinessKey,
    SupplierNotFound,
    ConsumerNotFound,
    /// Consumer inactive at initial validation.
    ConsumerInactive,
    /// Projected consumer balance below the configured minimum.
    ProfitLimitExceeded,
    /// Cancelled while waiting in the processing delay.
    ProcessingInterrupted,
    /// Consumer found inactive after the delay.
    ConsumerBecameInactive,
    /// Storage error while reading or committing.
    PersistenceFailure,
    /// Lock store unreachable; the submission was never admitted.
    GuardUnavailable,
}

impl FailureReason {
    /// Fixed, caller-visible message. No two reasons share one.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingToken => "Idempotency token is required.",
            Self::DuplicateSubmission => "This order is already being processed.",
            Self::InvalidPrice => "Price must be greater than zero.",
            Self::DuplicateBusinessKey => "Order already exists with this business key.",
            Self::SupplierNotFound => "Supplier not found.",
            Self::ConsumerNotFound => "Consumer not found.",
            Self::ConsumerInactive => "Consumer is inactive.",
            Self::ProfitLimitExceeded => "Profit limit exceeded.",
            Self::ProcessingInterrupted => "Processing was interrupted during the delay.",
            Self::ConsumerBecameInactive => "Consumer became inactive during processing.",
            Self::PersistenceFailure => "Failed to persist the order.",
            Self::GuardUnavailable => "Idempotency guard is unavailable.",
        }
    }

    /// Whether resubmitting the same payload (with a fresh token) may succeed.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::PersistenceFailure | Self::GuardUnavailable)
    }

    /// Every reason, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::MissingToken,
        Self::DuplicateSubmission,
        Self::InvalidPrice,
        Self::DuplicateBusinessKey,
        Self::SupplierNotFound,
        Self::ConsumerNotFound,
        Self::ConsumerInactive,
        Self::ProfitLimitExceeded,
        Self::ProcessingInterrupted,
        Self::ConsumerBecameInactive,
        Self::PersistenceFailure,
        Self::GuardUnavailable,
    ];
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Terminal result of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionOutcome {
    Committed { order_id: OrderId },
    Rejected { reason: FailureReason },
    /// Cancelled inside the processing delay.
    Aborted,
}

impl SubmissionOutcome {
    #[must_use]
    pub fn rejected(reason: FailureReason) -> Self {
        Self::Rejected { reason }
    }

    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    #[must_use]
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Self::Committed { order_id } => Some(*order_id),
            _ => None,
        }
    }

    /// The failure reason, if any. `Aborted` reports `ProcessingInterrupted`.
    #[must_use]
    pub fn failure(&self) -> Option<FailureReason> {
        match self {
            Self::Committed { .. } => None,
            Self::Rejected { reason } => Some(*reason),
            Self::Aborted => Some(FailureReason::ProcessingInterrupted),
        }
    }

    #[must_use]
    pub fn into_response(self) -> AppResponse<OrderId> {
        match self {
            Self::Committed { order_id } => AppResponse::ok(order_id, constants::SUCCESS_MESSAGE),
            Self::Rejected { reason } => AppResponse::fail(reason.message()),
            Self::Aborted => AppResponse::fail(FailureReason::ProcessingInterrupted.message()),
        }
    }
}

/// Generic response envelope: `{ success, data, message }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T> AppResponse<T> {
    #[must_use]
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn messages_are_distinct() {
        let messages: HashSet<&str> = FailureReason::ALL.iter().map(|r| r.message()).collect();
        assert_eq!(messages.len(), FailureReason::ALL.len());
    }

    #[test]
    fn only_storage_failures_are_retryable() {
        let retryable: Vec<FailureReason> = FailureReason::ALL
            .into_iter()
            .filter(|r| r.is_retryable())
            .collect();
        assert_eq!(
            retryable,
            vec![
                FailureReason::PersistenceFailure,
                FailureReason::GuardUnavailable
            ]
        );
    }

    #[test]
    fn committed_renders_success_envelope() {
        let order_id = OrderId::new();
        let resp = SubmissionOutcome::Committed { order_id }.into_response();
        assert!(resp.success);
        assert_eq!(resp.data, Some(order_id));
        assert_eq!(resp.message, "success");
    }

    #[test]
    fn rejected_renders_reason_message() {
        let resp = SubmissionOutcome::rejected(FailureReason::ProfitLimitExceeded).into_response();
        assert!(!resp.success);
        assert!(resp.data.is_none());
        assert_eq!(resp.message, "Profit limit exceeded.");
    }

    #[test]
    fn aborted_reports_interruption() {
        let outcome = SubmissionOutcome::Aborted;
        assert_eq!(outcome.failure(), Some(FailureReason::ProcessingInterrupted));
        assert!(outcome.order_id().is_none());
    }

    #[test]
    fn response_json_shape() {
        let resp: AppResponse<OrderId> = AppResponse::fail("Consumer is inactive.");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
        assert_eq!(json["message"], "Consumer is inactive.");
    }
}
