//! Processing delay standing in for an external step (e.g. payment
//! clearing) whose latency is not ours.
//!
//! The delay is the workflow's race window: the longer it runs, the more
//! likely concurrent submissions interleave between their validation reads
//! and their commits. How long it lasts is decided by an injectable
//! [`DelayStrategy`], so tests can shrink it to nothing or hold it open on
//! demand.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::watch;
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Receiving side of a cancellation signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

/// Sending side of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// A linked handle / signal pair.
#[must_use]
pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, Cancellation { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Cancellation {
    /// A signal that never fires.
    #[must_use]
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Pends forever if the handle was dropped
    /// without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Delay strategies
// ---------------------------------------------------------------------------

/// Decides how long one processing step takes, and waits it out.
#[async_trait]
pub trait DelayStrategy: Send + Sync {
    /// Wait for one processing step. Returns the planned duration.
    async fn pause(&self) -> Duration;
}

/// Uniformly random delay in `[min, max]`, millisecond granularity.
#[derive(Debug, Clone, Copy)]
pub struct RandomDelay {
    min_ms: u64,
    max_ms: u64,
}

impl RandomDelay {
    /// Bounds are reordered if given inverted.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        let a = duration_ms(min);
        let b = duration_ms(max);
        Self {
            min_ms: a.min(b),
            max_ms: a.max(b),
        }
    }

    fn pick(&self) -> Duration {
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }
}

#[async_trait]
impl DelayStrategy for RandomDelay {
    async fn pause(&self) -> Duration {
        let planned = self.pick();
        tracing::info!(delay_ms = duration_ms(planned), "Generated processing delay");
        tokio::time::sleep(planned).await;
        planned
    }
}

/// Always the same delay.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl DelayStrategy for FixedDelay {
    async fn pause(&self) -> Duration {
        tokio::time::sleep(self.0).await;
        self.0
    }
}

/// No delay at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl DelayStrategy for NoDelay {
    async fn pause(&self) -> Duration {
        tokio::task::yield_now().await;
        Duration::ZERO
    }
}

/// Holds every caller inside the delay until [`GatedDelay::open`] is called.
///
/// Tests use it to pin submissions inside the race window and mutate state
/// underneath them.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug)]
pub struct GatedDelay {
    gate: watch::Sender<bool>,
    arrivals: watch::Sender<usize>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl GatedDelay {
    pub fn new() -> Self {
        Self {
            gate: watch::Sender::new(false),
            arrivals: watch::Sender::new(0),
        }
    }

    /// Release everyone currently waiting, and every future caller.
    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    /// Number of callers that have entered the delay so far.
    pub fn arrived(&self) -> usize {
        *self.arrivals.borrow()
    }

    /// Wait until at least `n` callers have entered the delay.
    pub async fn wait_for_arrivals(&self, n: usize) {
        let mut rx = self.arrivals.subscribe();
        let _reached = rx.wait_for(|count| *count >= n).await.is_ok();
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Default for GatedDelay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
#[async_trait]
impl DelayStrategy for GatedDelay {
    async fn pause(&self) -> Duration {
        let started = Instant::now();
        let mut rx = self.gate.subscribe();
        self.arrivals.send_modify(|count| *count += 1);
        let _opened = rx.wait_for(|open| *open).await.is_ok();
        started.elapsed()
    }
}

// ---------------------------------------------------------------------------
// ProcessingSimulator
// ---------------------------------------------------------------------------

/// The delay was cut short by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Runs the processing delay, honouring cancellation.
pub struct ProcessingSimulator {
    strategy: Arc<dyn DelayStrategy>,
}

impl ProcessingSimulator {
    #[must_use]
    pub fn new(strategy: Arc<dyn DelayStrategy>) -> Self {
        Self { strategy }
    }

    /// Block this unit of work for one processing step.
    ///
    /// # Errors
    /// [`Interrupted`] if `cancel` fires before the delay ends, including
    /// when it had already fired on entry.
    pub async fn simulate(&self, cancel: &Cancellation) -> Result<Duration, Interrupted> {
        if cancel.is_cancelled() {
            return Err(Interrupted);
        }
        let started = Instant::now();
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                tracing::error!(
                    elapsed_ms = duration_ms(started.elapsed()),
                    "Processing delay interrupted"
                );
                Err(Interrupted)
            }

            planned = self.strategy.pause() => {
                let elapsed = started.elapsed();
                tracing::debug!(
                    planned_ms = duration_ms(planned),
                    elapsed_ms = duration_ms(elapsed),
                    "Processing delay elapsed"
                );
                Ok(elapsed)
            }
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
