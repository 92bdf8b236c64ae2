//! Bounded retry with a per-attempt delay, shared by every provisioning stage.

use tracing::debug;

use crate::domain::{ApplianceError, RetryPolicy, Stage};

/// Poll `check` under `policy` until it yields a value.
///
/// `Ok(None)` means "not ready yet". Transient errors (see
/// [`ApplianceError::is_transient`]) consume an attempt exactly like a
/// not-ready answer; every other error aborts immediately. No sleep follows
/// the final attempt.
///
/// # Errors
///
/// `Timeout(stage)` once `policy.max_attempts` checks have failed, or the
/// first non-transient error returned by `check`.
pub async fn poll_until<T, F, Fut>(
    stage: Stage,
    policy: RetryPolicy,
    mut check: F,
) -> Result<T, ApplianceError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, ApplianceError>>,
{
    for attempt in 1..=policy.max_attempts {
        if let Some(delay) = policy.delay_before(attempt) {
            tokio::time::sleep(delay).await;
        }
        match check(attempt).await {
            Ok(Some(value)) => {
                debug!(?stage, attempt, "stage satisfied");
                return Ok(value);
            }
            Ok(None) => debug!(?stage, attempt, "not ready"),
            Err(e) if e.is_transient() => debug!(?stage, attempt, error = %e, "transient failure"),
            Err(e) => return Err(e),
        }
    }
    Err(ApplianceError::Timeout(stage))
}
