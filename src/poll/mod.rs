//! Readiness polling for long-running cloud transitions.
//!
//! A wait sleeps for a fixed interval, describes the resource, and compares
//! the observed status with the target. The loop ends when the target is
//! observed, the deadline passes, the run is cancelled, or the describe call
//! fails in a way the caller did not ask to tolerate.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::{ClusterObservation, InstanceObservation, ResourceStatus, SnapshotObservation};
use crate::fault::{Classify, FaultKind};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(4 * 60 * 60);

/// Interval, deadline and retry budget applied to every wait.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollPolicy {
    /// Pause before each describe call.
    pub interval: Duration,
    /// Total time allowed before the wait gives up.
    pub timeout: Duration,
    /// Transient describe failures tolerated per wait.
    pub transient_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
            transient_retries: 0,
        }
    }
}

/// Whether the resource may legitimately be invisible when the wait starts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Visibility {
    /// The resource was just created; not-found is tolerated until the first
    /// successful describe.
    AfterCreate,
    /// The resource already exists; not-found is fatal.
    Existing,
}

/// Progress of a single wait.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WaitState {
    /// No describe call has completed yet.
    Pending,
    /// The provider does not report the resource yet.
    NotVisible,
    /// The resource was observed in a non-target status.
    Observed(ResourceStatus),
    /// The target status was observed.
    Ready(ResourceStatus),
}

impl WaitState {
    /// Folds a successful observation into the state.
    #[must_use]
    pub fn observe(status: &ResourceStatus, target: &str) -> Self {
        if status.is(target) {
            Self::Ready(status.clone())
        } else {
            Self::Observed(status.clone())
        }
    }

    /// Returns `true` once any describe call has returned the resource.
    #[must_use]
    pub const fn has_observed(&self) -> bool {
        matches!(self, Self::Observed(_) | Self::Ready(_))
    }

    /// Returns the last status seen, if any.
    #[must_use]
    pub fn last_status(&self) -> Option<String> {
        match self {
            Self::Observed(status) | Self::Ready(status) => Some(status.as_str().to_owned()),
            Self::Pending | Self::NotVisible => None,
        }
    }
}

/// Observations that expose a lifecycle status.
pub trait Observed {
    /// Returns the lifecycle status.
    fn status(&self) -> &ResourceStatus;
}

impl Observed for SnapshotObservation {
    fn status(&self) -> &ResourceStatus {
        &self.status
    }
}

impl Observed for ClusterObservation {
    fn status(&self) -> &ResourceStatus {
        &self.status
    }
}

impl Observed for InstanceObservation {
    fn status(&self) -> &ResourceStatus {
        &self.status
    }
}

/// Errors raised while waiting for a resource.
#[derive(Debug, Error)]
pub enum PollError<E>
where
    E: std::error::Error + 'static,
{
    /// The describe call failed and the failure was not tolerated.
    #[error("failed to describe {resource}: {source}")]
    Describe {
        /// Resource being waited on.
        resource: String,
        /// Provider error.
        #[source]
        source: E,
    },
    /// The target status was not observed before the deadline.
    #[error(
        "timed out after {attempts} attempts waiting for {resource} to become {target} (last status: {})",
        .last_status.as_deref().unwrap_or("not visible")
    )]
    Timeout {
        /// Resource being waited on.
        resource: String,
        /// Status the wait expected.
        target: String,
        /// Describe calls made.
        attempts: u32,
        /// Last status observed, if the resource was ever visible.
        last_status: Option<String>,
    },
    /// The run was cancelled while waiting.
    #[error("wait for {resource} was cancelled")]
    Cancelled {
        /// Resource being waited on.
        resource: String,
    },
}

impl<E> Classify for PollError<E>
where
    E: std::error::Error + Classify + 'static,
{
    fn fault(&self) -> FaultKind {
        match self {
            Self::Describe { source, .. } => source.fault(),
            Self::Timeout { .. } | Self::Cancelled { .. } => FaultKind::Unclassified,
        }
    }
}

/// Converts an asynchronous transition into a bounded, cancellable wait.
#[derive(Clone, Debug)]
pub struct ReadinessPoller {
    policy: PollPolicy,
    cancel: CancellationToken,
}

impl ReadinessPoller {
    /// Creates a poller that stops early when `cancel` fires.
    #[must_use]
    pub const fn new(policy: PollPolicy, cancel: CancellationToken) -> Self {
        Self { policy, cancel }
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Returns the cancellation token shared with the caller.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Sleeps for `delay` unless the run is cancelled first.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Cancelled`] when cancellation wins the race.
    pub async fn pause<E>(&self, resource: &str, delay: Duration) -> Result<(), PollError<E>>
    where
        E: std::error::Error + 'static,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(PollError::Cancelled {
                resource: resource.to_owned(),
            }),
            () = sleep(delay) => Ok(()),
        }
    }

    /// Waits until `describe` reports `target`, returning that observation.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Describe`] for untolerated describe failures,
    /// [`PollError::Timeout`] when the deadline passes, and
    /// [`PollError::Cancelled`] when the run is cancelled.
    pub async fn wait_until<T, E, F, Fut>(
        &self,
        resource: &str,
        target: &str,
        visibility: Visibility,
        mut describe: F,
    ) -> Result<T, PollError<E>>
    where
        T: Observed,
        E: std::error::Error + Classify + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // A timeout too large to represent never expires.
        let deadline = Instant::now().checked_add(self.policy.timeout);
        let mut state = WaitState::Pending;
        let mut attempts: u32 = 0;
        let mut retries_left = self.policy.transient_retries;

        loop {
            self.pause::<E>(resource, self.policy.interval).await?;
            attempts = attempts.saturating_add(1);

            let described = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    return Err(PollError::Cancelled {
                        resource: resource.to_owned(),
                    });
                }
                result = describe() => result,
                () = expiry(deadline) => {
                    return Err(timed_out(resource, target, attempts, &state));
                }
            };

            match described {
                Ok(observation) => {
                    state = WaitState::observe(observation.status(), target);
                    if matches!(state, WaitState::Ready(_)) {
                        debug!(resource, target, attempts, "resource reached target status");
                        return Ok(observation);
                    }
                    debug!(
                        resource,
                        status = %observation.status(),
                        target,
                        attempts,
                        "resource not ready yet"
                    );
                }
                Err(err)
                    if err.fault() == FaultKind::NotFound
                        && visibility == Visibility::AfterCreate
                        && !state.has_observed() =>
                {
                    warn!(resource, attempts, "resource not visible yet: {err}");
                    state = WaitState::NotVisible;
                }
                Err(err) if err.fault().is_retryable() && retries_left > 0 => {
                    retries_left -= 1;
                    warn!(resource, retries_left, "transient describe failure: {err}");
                }
                Err(err) => {
                    return Err(PollError::Describe {
                        resource: resource.to_owned(),
                        source: err,
                    });
                }
            }

            if deadline.is_some_and(|at| Instant::now() >= at) {
                return Err(timed_out(resource, target, attempts, &state));
            }
        }
    }
}

async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn timed_out<E>(resource: &str, target: &str, attempts: u32, state: &WaitState) -> PollError<E>
where
    E: std::error::Error + 'static,
{
    PollError::Timeout {
        resource: resource.to_owned(),
        target: target.to_owned(),
        attempts,
        last_status: state.last_status(),
    }
}
