//! Provisioning stages and their bounded retry schedules.

use std::time::Duration;

/// Attempts allowed per polling stage.
pub const MAX_STAGE_ATTEMPTS: u32 = 29;

/// Exits zero once the daemon container exists.
pub const CONTAINER_INSPECT_COMMAND: &str = "docker container inspect -f {{.Id}} acroboxd";

/// Exits zero once the daemon answers; prints its status document.
pub const SERVICE_STATUS_COMMAND: &str = "docker exec acroboxd acroboxd status";

/// Readiness reached by a freshly requested appliance.
///
/// Held only on the orchestrator's stack; an interrupted run re-derives it
/// from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProvisioningState {
    Requested,
    NetworkAssigned,
    SshReachable,
    ServiceContainerPresent,
    ServiceReady,
}

/// A polled step of the readiness sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NetworkAssigned,
    SshReachable,
    ServiceContainerPresent,
    ServiceReady,
}

impl Stage {
    /// All stages in the order they are polled.
    pub const SEQUENCE: [Stage; 4] = [
        Stage::NetworkAssigned,
        Stage::SshReachable,
        Stage::ServiceContainerPresent,
        Stage::ServiceReady,
    ];

    /// State reached once this stage's check succeeds.
    #[must_use]
    pub fn reached(self) -> ProvisioningState {
        match self {
            Self::NetworkAssigned => ProvisioningState::NetworkAssigned,
            Self::SshReachable => ProvisioningState::SshReachable,
            Self::ServiceContainerPresent => ProvisioningState::ServiceContainerPresent,
            Self::ServiceReady => ProvisioningState::ServiceReady,
        }
    }

    /// Retry schedule for this stage.
    ///
    /// Network assignment sleeps before every check; the other stages check
    /// immediately and back off between attempts.
    #[must_use]
    pub fn policy(self) -> RetryPolicy {
        match self {
            Self::NetworkAssigned => RetryPolicy::delay_first(MAX_STAGE_ATTEMPTS, linear_seconds),
            _ => RetryPolicy::attempt_first(MAX_STAGE_ATTEMPTS, linear_seconds),
        }
    }

    /// Progress line shown while the stage is polled.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::NetworkAssigned => "Provisioning machine and associated resources.",
            Self::SshReachable => "Waiting for SSH connectivity.",
            Self::ServiceContainerPresent => "Waiting for machine setup.",
            Self::ServiceReady => "Waiting for service setup.",
        }
    }

    /// Message carried by the stage's timeout error.
    #[must_use]
    pub fn timeout_message(self) -> &'static str {
        match self {
            Self::NetworkAssigned => "Timeout exceeded while provisioning machine.",
            Self::SshReachable => "Timeout exceeded while waiting for SSH connectivity.",
            Self::ServiceContainerPresent => "Timeout exceeded while waiting for machine setup.",
            Self::ServiceReady => "Timeout exceeded while waiting for service setup.",
        }
    }
}

/// Whether the first check runs before or after the first delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstAttempt {
    AfterDelay,
    Immediate,
}

/// Bounded attempt count plus a per-attempt delay function.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub first_attempt: FirstAttempt,
    pub delay: fn(u32) -> Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn delay_first(max_attempts: u32, delay: fn(u32) -> Duration) -> Self {
        Self {
            max_attempts,
            first_attempt: FirstAttempt::AfterDelay,
            delay,
        }
    }

    #[must_use]
    pub fn attempt_first(max_attempts: u32, delay: fn(u32) -> Duration) -> Self {
        Self {
            max_attempts,
            first_attempt: FirstAttempt::Immediate,
            delay,
        }
    }

    /// Sleep to take before the 1-based `attempt`, if any.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        match self.first_attempt {
            FirstAttempt::AfterDelay => Some((self.delay)(attempt)),
            FirstAttempt::Immediate if attempt <= 1 => None,
            FirstAttempt::Immediate => Some((self.delay)(attempt - 1)),
        }
    }
}

/// `n` seconds for the n-th delay.
#[must_use]
pub fn linear_seconds(n: u32) -> Duration {
    Duration::from_secs(u64::from(n))
}
