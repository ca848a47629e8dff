//! Retry with exponential backoff.
//!
//! The executor is a pure control-flow combinator: it does not know what the
//! wrapped operation does, only whether its error is worth another attempt
//! (see [`PlotweaveError::is_retryable`]).

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::PlotweaveError;

/// Backoff parameters. Delay before attempt `n + 1` is
/// `initial_delay_ms * multiplier^(n - 1)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        Duration::from_millis(millis.round() as u64)
    }
}

/// Sender half used to abort an in-flight retry sequence.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Receivers may all be gone already; nothing left to cancel then.
        let _ = self.tx.send(true);
    }
}

/// Receiver half checked before each attempt and raced against backoff sleeps.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Create a linked handle/signal pair.
    pub fn new() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelSignal { rx })
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Never resolves if the handle is dropped uncancelled.
    async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Runs an async operation, retrying transient failures with exponential backoff.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Returns the last error when all attempts are exhausted.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, PlotweaveError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PlotweaveError>>,
    {
        self.execute(op, None).await
    }

    /// Like [`run`](Self::run), but aborts with [`PlotweaveError::Cancelled`]
    /// as soon as `cancel` fires, including mid-backoff.
    pub async fn run_cancellable<T, F, Fut>(
        &self,
        op: F,
        cancel: &CancelSignal,
    ) -> Result<T, PlotweaveError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PlotweaveError>>,
    {
        self.execute(op, Some(cancel)).await
    }

    async fn execute<T, F, Fut>(
        &self,
        mut op: F,
        cancel: Option<&CancelSignal>,
    ) -> Result<T, PlotweaveError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PlotweaveError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(PlotweaveError::Cancelled);
            }

            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Operation succeeded on attempt {}", attempt);
                    }
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(
                        "Attempt {}/{} failed: {}. Retrying in {}ms",
                        attempt,
                        max_attempts,
                        err,
                        delay.as_millis()
                    );

                    match cancel {
                        Some(signal) => {
                            tokio::select! {
                                _ = tokio::time::sleep(delay) => {}
                                _ = signal.cancelled() => return Err(PlotweaveError::Cancelled),
                            }
                        }
                        None => tokio::time::sleep(delay).await,
                    }
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        warn!("Giving up after {} attempts: {}", attempt, err);
                    } else {
                        debug!("Permanent failure on attempt {}: {}", attempt, err);
                    }
                    return Err(err);
                }
            }
        }
    }
}
