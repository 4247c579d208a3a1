//! Order-creation workflow.
//!
//! ```text
//! IdempotencyGuard → OrderValidator → ProcessingSimulator
//!     → ConsistencyRecheck → LedgerUpdater
//! ```
//!
//! Each submission runs as its own unit of work. No lock on the consumer or
//! the business key is held between validation and commit; the recheck and
//! the atomic commit are what catch state that moved during the delay.
//!
//! Every failure short-circuits into a [`SubmissionOutcome`]. The admitted
//! token is never released on the way out, so a failed submission must be
//! retried under a new token (or after the TTL).

use std::sync::Arc;

use orderflow_ingress::{IdempotencyGuard, OrderValidator};
use orderflow_settlement::{
    Cancellation, ConsistencyRecheck, DelayStrategy, LedgerUpdater, ProcessingSimulator,
    RandomDelay,
};
use orderflow_store::{
    Clock, LedgerStore, LockStore, MemoryStore, OrderStore, PartyStore, SystemClock,
};
use orderflow_types::{
    FailureReason, IdempotencyToken, OrderSubmission, Result, SubmissionOutcome, SubmissionStage,
    WorkflowConfig,
};

/// The full submission pipeline.
pub struct OrderWorkflow {
    guard: IdempotencyGuard,
    validator: OrderValidator,
    simulator: ProcessingSimulator,
    recheck: ConsistencyRecheck,
    ledger: LedgerUpdater,
    clock: Arc<dyn Clock>,
}

/// Stores the workflow runs against.
#[derive(Clone)]
pub struct WorkflowStores {
    pub locks: Arc<dyn LockStore>,
    pub parties: Arc<dyn PartyStore>,
    pub orders: Arc<dyn OrderStore>,
    pub ledger: Arc<dyn LedgerStore>,
}

impl WorkflowStores {
    /// One [`MemoryStore`] serving parties, orders, and the ledger.
    #[must_use]
    pub fn memory(store: &Arc<MemoryStore>, locks: Arc<dyn LockStore>) -> Self {
        Self {
            locks,
            parties: store.clone(),
            orders: store.clone(),
            ledger: store.clone(),
        }
    }
}

impl OrderWorkflow {
    /// Build a workflow with a random delay and the system clock.
    ///
    /// # Errors
    /// Returns [`orderflow_types::OrderflowError::Configuration`] if `config`
    /// does not validate.
    pub fn new(config: &WorkflowConfig, stores: WorkflowStores) -> Result<Self> {
        config.validate()?;
        let (min, max) = config.delay_range();
        Ok(Self {
            guard: IdempotencyGuard::new(stores.locks, config.idempotency_ttl()),
            validator: OrderValidator::new(
                stores.parties.clone(),
                stores.orders,
                config.min_profit,
            ),
            simulator: ProcessingSimulator::new(Arc::new(RandomDelay::new(min, max))),
            recheck: ConsistencyRecheck::new(stores.parties),
            ledger: LedgerUpdater::new(stores.ledger),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the processing delay.
    #[must_use]
    pub fn with_delay(mut self, strategy: Arc<dyn DelayStrategy>) -> Self {
        self.simulator = ProcessingSimulator::new(strategy);
        self
    }

    /// Replace the clock used to stamp processing times.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one submission to completion.
    pub async fn submit(&self, submission: &OrderSubmission) -> SubmissionOutcome {
        self.submit_with_cancel(submission, &Cancellation::never()).await
    }

    /// Run one submission; `cancel` may interrupt the processing delay.
    pub async fn submit_with_cancel(
        &self,
        submission: &OrderSubmission,
        cancel: &Cancellation,
    ) -> SubmissionOutcome {
        let token = &submission.idempotency_token;
        tracing::info!(
            %token,
            supplier = %submission.supplier_id,
            consumer = %submission.consumer_id,
            title = %submission.title,
            price = %submission.price,
            "Order submission received"
        );

        if token.is_blank() {
            tracing::warn!(consumer = %submission.consumer_id, "Idempotency token is missing");
            return SubmissionOutcome::rejected(FailureReason::MissingToken);
        }

        match self.guard.admit(token).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    %token,
                    consumer = %submission.consumer_id,
                    "Order is already being processed"
                );
                return SubmissionOutcome::rejected(FailureReason::DuplicateSubmission);
            }
            Err(err) => {
                tracing::error!(%token, error = %err, "Idempotency guard unavailable");
                return SubmissionOutcome::rejected(FailureReason::GuardUnavailable);
            }
        }
        let mut progress = Progress::admitted(token);

        let validated = match self.validator.validate(submission).await {
            Ok(validated) => validated,
            Err(reason) => return progress.reject(reason),
        };
        progress.advance(SubmissionStage::Validated);

        progress.advance(SubmissionStage::Delayed);
        let processing_start_at = self.clock.now();
        if self.simulator.simulate(cancel).await.is_err() {
            return progress.abort();
        }

        let rechecked = match self.recheck.recheck(validated).await {
            Ok(rechecked) => rechecked,
            Err(reason) => return progress.reject(reason),
        };
        progress.advance(SubmissionStage::Rechecked);

        let processing_end_at = self.clock.now();
        match self
            .ledger
            .commit(rechecked, submission, processing_start_at, processing_end_at)
            .await
        {
            Ok(order_id) => {
                progress.advance(SubmissionStage::Committed);
                SubmissionOutcome::Committed { order_id }
            }
            Err(reason) => progress.reject(reason),
        }
    }

    /// Drop the lock on `token` before its TTL. Compensating cleanup only.
    ///
    /// # Errors
    /// Propagates the lock store's error.
    pub async fn release_token(&self, token: &IdempotencyToken) -> Result<bool> {
        self.guard.release(token).await
    }
}

/// Stage tracking for one submission.
struct Progress<'a> {
    token: &'a IdempotencyToken,
    stage: SubmissionStage,
}

impl<'a> Progress<'a> {
    fn admitted(token: &'a IdempotencyToken) -> Self {
        tracing::debug!(%token, stage = %SubmissionStage::Admitted, "Submission stage");
        Self {
            token,
            stage: SubmissionStage::Admitted,
        }
    }

    fn advance(&mut self, to: SubmissionStage) {
        debug_assert!(
            self.stage.can_transition_to(to),
            "illegal submission transition {} -> {to}",
            self.stage
        );
        tracing::debug!(token = %self.token, from = %self.stage, to = %to, "Submission stage");
        self.stage = to;
    }

    fn reject(&mut self, reason: FailureReason) -> SubmissionOutcome {
        let at = self.stage;
        self.advance(SubmissionStage::Rejected);
        tracing::info!(token = %self.token, stage = %at, %reason, "Order submission rejected");
        SubmissionOutcome::rejected(reason)
    }

    fn abort(&mut self) -> SubmissionOutcome {
        self.advance(SubmissionStage::Aborted);
        tracing::warn!(token = %self.token, "Order submission aborted during processing delay");
        SubmissionOutcome::Aborted
    }
}
