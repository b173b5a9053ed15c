//! Bounded exponential-backoff polling of a long-running operation.
//!
//! The poller is a small state machine:
//!
//! ```text
//! Pending --(query)--> Pending | Done | Failed | TimedOut
//! ```
//!
//! Every attempt sleeps `min(backoff, max_backoff) + U(0, 1)` seconds and then
//! queries the status once. The backoff variable grows by `backoff_factor`
//! after each pending status without bound; only the individual sleeps are
//! capped. The poller knows nothing about investigations: it drives any status
//! type implementing [`PollableStatus`].

use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::errors::{ErrorDetails, InvestigationError, InvestigationResult};
use crate::domain::models::{Operation, PollingConfig};
use crate::domain::ports::{Sleeper, TokioSleeper};

/// Completion capability of a polled status.
pub trait PollableStatus {
    fn is_done(&self) -> bool;

    /// Remote error payload, if the operation finished with one.
    fn error(&self) -> Option<&Value>;

    /// Identifier used in logs and errors.
    fn handle(&self) -> &str;
}

impl PollableStatus for Operation {
    fn is_done(&self) -> bool {
        self.done
    }

    fn error(&self) -> Option<&Value> {
        self.error.as_ref()
    }

    fn handle(&self) -> &str {
        &self.name
    }
}

/// Poller state between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState<S> {
    /// Waiting for `attempt` (1-based) with the current backoff variable.
    Pending { attempt: u32, backoff_secs: f64 },
    Done(S),
    Failed { handle: String, error: Value },
    TimedOut { attempts: u32, last: Option<S> },
}

/// Drives a status check until it reports completion or the attempt budget
/// runs out.
#[derive(Clone)]
pub struct OperationPoller {
    config: PollingConfig,
    sleeper: Arc<dyn Sleeper>,
    jitter: fn() -> f64,
}

impl std::fmt::Debug for OperationPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationPoller")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn random_jitter() -> f64 {
    rand::thread_rng().gen_range(0.0..1.0)
}

/// Seconds to a `Duration`, saturating instead of panicking on values a
/// `Duration` cannot hold.
fn saturating_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

impl OperationPoller {
    /// Poller sleeping on the tokio timer.
    pub fn new(config: PollingConfig) -> Self {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(config: PollingConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            config,
            sleeper,
            jitter: random_jitter,
        }
    }

    /// Replace the jitter source. Must return values in `[0, 1)`.
    #[must_use]
    pub fn with_jitter(mut self, jitter: fn() -> f64) -> Self {
        self.jitter = jitter;
        self
    }

    pub const fn config(&self) -> &PollingConfig {
        &self.config
    }

    /// Delay before the given 1-based attempt, without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let backoff = self.config.initial_backoff_secs * self.config.backoff_factor.powi(exponent);
        saturating_secs(backoff.min(self.config.max_backoff_secs).max(0.0))
    }

    /// Poll `check` until the status is terminal.
    ///
    /// Returns the final status on success. The caller should re-fetch the
    /// authoritative resource rather than trust any payload embedded in it.
    pub async fn poll<S, F, Fut>(&self, mut check: F) -> InvestigationResult<S>
    where
        S: PollableStatus + Serialize,
        F: FnMut() -> Fut,
        Fut: Future<Output = InvestigationResult<S>>,
    {
        let mut state = PollState::Pending {
            attempt: 1,
            backoff_secs: self.config.initial_backoff_secs,
        };
        let mut last: Option<S> = None;

        loop {
            state = match state {
                PollState::Pending { attempt, .. } if attempt > self.config.max_attempts => {
                    PollState::TimedOut {
                        attempts: attempt - 1,
                        last: last.take(),
                    }
                }
                PollState::Pending {
                    attempt,
                    backoff_secs,
                } => {
                    let capped = backoff_secs.min(self.config.max_backoff_secs).max(0.0);
                    let delay = saturating_secs(capped + (self.jitter)());
                    debug!(attempt, delay_secs = delay.as_secs_f64(), "waiting before status check");
                    self.sleeper.sleep(delay).await;

                    let status = check().await?;
                    if status.is_done() {
                        if let Some(error) = status.error().cloned() {
                            PollState::Failed {
                                handle: status.handle().to_string(),
                                error,
                            }
                        } else {
                            PollState::Done(status)
                        }
                    } else {
                        debug!(attempt, operation = status.handle(), "operation still pending");
                        last = Some(status);
                        PollState::Pending {
                            attempt: attempt + 1,
                            backoff_secs: backoff_secs * self.config.backoff_factor,
                        }
                    }
                }
                PollState::Done(status) => {
                    info!(operation = status.handle(), "operation completed");
                    return Ok(status);
                }
                PollState::Failed { handle, error } => {
                    warn!(operation = %handle, "operation finished with an error");
                    return Err(InvestigationError::OperationError {
                        operation: handle,
                        details: ErrorDetails::Backend(error),
                    });
                }
                PollState::TimedOut { attempts, last } => {
                    warn!(attempts, "operation polling exhausted its attempt budget");
                    let details = last
                        .as_ref()
                        .and_then(|s| serde_json::to_value(s).ok())
                        .map(|v| ErrorDetails::Description(serde_json::json!({ "lastStatus": v })));
                    return Err(InvestigationError::Timeout { attempts, details });
                }
            };
        }
    }
}
