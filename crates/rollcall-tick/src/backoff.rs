use std::time::Duration;

use rand::Rng;
use tracing::debug;

/// What to do after the connection drops.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReconnectPolicy {
    /// Reconnect at once, forever.
    #[default]
    Immediate,
    /// Wait an exponentially growing delay between attempts and give up
    /// after `max_attempts` consecutive failures.
    Backoff(BackoffConfig),
}

/// Parameters for [`ReconnectPolicy::Backoff`].
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    pub initial: Duration,
    /// Upper bound for any single delay (before jitter).
    pub max: Duration,
    /// Growth factor applied after each attempt.
    pub multiplier: f64,
    /// Consecutive attempts before giving up. `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Random extra delay as a fraction of the base delay (0.0–1.0).
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
            multiplier: 2.0,
            max_attempts: Some(10),
            jitter: 0.1,
        }
    }
}

/// Running reconnect state for one connection owner.
///
/// Call [`next_delay`](Self::next_delay) before each attempt and
/// [`reset`](Self::reset) once the connection is confirmed healthy.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    attempts: u32,
    current: Duration,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        let current = match &policy {
            ReconnectPolicy::Immediate => Duration::ZERO,
            ReconnectPolicy::Backoff(config) => config.initial,
        };
        Self {
            policy,
            attempts: 0,
            current,
        }
    }

    /// Delay to wait before the next attempt, or `None` to give up.
    pub fn next_delay(&mut self) -> Option<Duration> {
        let config = match &self.policy {
            ReconnectPolicy::Immediate => {
                self.attempts = self.attempts.saturating_add(1);
                return Some(Duration::ZERO);
            }
            ReconnectPolicy::Backoff(config) => config,
        };

        if config.max_attempts.is_some_and(|max| self.attempts >= max) {
            debug!(attempts = self.attempts, "reconnect attempts exhausted");
            return None;
        }

        let base = self.current.min(config.max);
        let jitter = config.jitter.clamp(0.0, 1.0);
        let extra = if jitter > 0.0 && !base.is_zero() {
            base.mul_f64(rand::rng().random_range(0.0..jitter))
        } else {
            Duration::ZERO
        };

        self.attempts += 1;
        self.current = base.mul_f64(config.multiplier.clamp(1.0, 1_000.0)).min(config.max);

        debug!(
            attempt = self.attempts,
            delay_ms = u64::try_from((base + extra).as_millis()).unwrap_or(u64::MAX),
            "reconnect scheduled"
        );
        Some(base + extra)
    }

    /// Forget previous failures.
    pub fn reset(&mut self) {
        if self.attempts > 0 {
            debug!(attempts = self.attempts, "reconnect backoff reset");
        }
        *self = Self::new(self.policy.clone());
    }

    /// Attempts made since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }
}
