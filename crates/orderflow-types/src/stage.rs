//! Lifecycle of a single submission.
//!
//! **ADMITTED → VALIDATED → DELAYED → RECHECKED → COMMITTED**
//!
//! `REJECTED` is reachable from every non-terminal stage. `ABORTED` is
//! reachable only from `DELAYED`, when the caller cancels during the
//! processing delay. A refused idempotency token never enters the machine.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStage {
    /// Token admitted; this submission is the exclusive processor.
    Admitted,
    /// All six validation rules passed.
    Validated,
    /// Inside the processing delay.
    Delayed,
    /// Consumer re-read and still active.
    Rechecked,
    /// Ledger mutation and record insertion committed.
    Committed,
    Rejected,
    Aborted,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admitted => write!(f, "ADMITTED"),
            Self::Validated => write!(f, "VALIDATED"),
            Self::Delayed => write!(f, "DELAYED"),
            Self::Rechecked => write!(f, "RECHECKED"),
            Self::Committed => write!(f, "COMMITTED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Aborted => write!(f, "ABORTED"),
        }
    }
}

impl SubmissionStage {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Rejected | Self::Aborted)
    }

    /// The next stage on the success path, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Admitted => Some(Self::Validated),
            Self::Validated => Some(Self::Delayed),
            Self::Delayed => Some(Self::Rechecked),
            Self::Rechecked => Some(Self::Committed),
            Self::Committed | Self::Rejected | Self::Aborted => None,
        }
    }

    /// Whether `self → to` is a legal edge.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match to {
            Self::Rejected => true,
            Self::Aborted => self == Self::Delayed,
            _ => self.next() == Some(to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_edges() {
        let mut stage = SubmissionStage::Admitted;
        let mut path = vec![stage];
        while let Some(next) = stage.next() {
            assert!(stage.can_transition_to(next));
            stage = next;
            path.push(stage);
        }
        assert_eq!(
            path,
            vec![
                SubmissionStage::Admitted,
                SubmissionStage::Validated,
                SubmissionStage::Delayed,
                SubmissionStage::Rechecked,
                SubmissionStage::Committed,
            ]
        );
    }

    #[test]
    fn rejected_reachable_from_every_non_terminal() {
        for stage in [
            SubmissionStage::Admitted,
            SubmissionStage::Validated,
            SubmissionStage::Delayed,
            SubmissionStage::Rechecked,
        ] {
            assert!(stage.can_transition_to(SubmissionStage::Rejected), "{stage}");
        }
    }

    #[test]
    fn aborted_only_from_delayed() {
        assert!(SubmissionStage::Delayed.can_transition_to(SubmissionStage::Aborted));
        assert!(!SubmissionStage::Admitted.can_transition_to(SubmissionStage::Aborted));
        assert!(!SubmissionStage::Validated.can_transition_to(SubmissionStage::Aborted));
        assert!(!SubmissionStage::Rechecked.can_transition_to(SubmissionStage::Aborted));
    }

    #[test]
    fn terminal_stages_have_no_exits() {
        for stage in [
            SubmissionStage::Committed,
            SubmissionStage::Rejected,
            SubmissionStage::Aborted,
        ] {
            assert!(stage.is_terminal());
            assert!(!stage.can_transition_to(SubmissionStage::Rejected));
        }
    }

    #[test]
    fn stages_cannot_be_skipped() {
        assert!(!SubmissionStage::Admitted.can_transition_to(SubmissionStage::Delayed));
        assert!(!SubmissionStage::Validated.can_transition_to(SubmissionStage::Committed));
    }
}
