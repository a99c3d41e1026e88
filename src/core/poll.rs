//! Bounded poll-until-ready helper.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::errors::{ActionError, ActionResult};

/// Fixed-delay retry budget for polling a remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Total number of probes, including the first one
    pub max_attempts: u32,
    /// Pause between two probes
    pub delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            delay: Duration::from_secs(1),
        }
    }
}

impl PollPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Check if another probe is allowed after `attempt` probes.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Probe until it yields a value or the budget runs out.
///
/// `probe` receives the 1-based attempt number. `Ok(None)` and `Err(_)` both count as "not
/// ready yet". Exhaustion yields [`ActionError::PollingExhausted`].
pub async fn poll_until<T, F, Fut>(policy: &PollPolicy, mut probe: F) -> ActionResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ActionResult<Option<T>>>,
{
    let mut attempt = 0;
    while policy.should_retry(attempt) {
        attempt += 1;
        match probe(attempt).await {
            Ok(Some(value)) => {
                debug!(attempt, "Poll succeeded");
                return Ok(value);
            }
            Ok(None) => debug!(attempt, "Poll target not ready"),
            Err(e) => debug!(attempt, error = %e, "Poll attempt failed"),
        }
        if policy.should_retry(attempt) {
            tokio::time::sleep(policy.delay).await;
        }
    }
    Err(ActionError::PollingExhausted(attempt))
}
