use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{trace, warn};

/// Resettable one-period timer.
///
/// [`wait`](Self::wait) resolves once `period` has elapsed since the last
/// [`reset`](Self::reset) (or since creation) and immediately re-arms for
/// another period. A disabled keepalive pends forever.
#[derive(Debug)]
pub struct Keepalive {
    period: Option<Duration>,
    deadline: Option<Instant>,
}

impl Keepalive {
    /// Create a keepalive armed for `period` from now.
    ///
    /// A zero period would fire in a busy loop, so it disables the timer.
    pub fn new(period: Duration) -> Self {
        if period.is_zero() {
            warn!("keepalive period is zero, keepalive disabled");
            return Self::disabled();
        }
        Self {
            period: Some(period),
            deadline: Some(Instant::now() + period),
        }
    }

    /// A keepalive that never fires.
    pub fn disabled() -> Self {
        Self {
            period: None,
            deadline: None,
        }
    }

    /// Push the deadline back to one full period from now.
    pub fn reset(&mut self) {
        if let Some(period) = self.period {
            self.deadline = Some(Instant::now() + period);
        }
    }

    /// Wait for the deadline, then re-arm.
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the
    /// deadline untouched.
    pub async fn wait(&mut self) {
        let (Some(deadline), Some(period)) = (self.deadline, self.period) else {
            std::future::pending::<()>().await;
            return;
        };

        time::sleep_until(deadline).await;
        trace!(period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX), "keepalive due");
        self.deadline = Some(Instant::now() + period);
    }

    /// The configured period, or `None` when disabled.
    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Whether the timer can fire at all.
    pub fn is_enabled(&self) -> bool {
        self.period.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_zero_period_is_disabled() {
        let keepalive = Keepalive::new(Duration::ZERO);
        assert!(!keepalive.is_enabled());
        assert_eq!(keepalive.period(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_resolves_after_period() {
        let start = Instant::now();
        let mut keepalive = Keepalive::new(Duration::from_secs(45));

        keepalive.wait().await;

        assert_eq!(start.elapsed(), Duration::from_secs(45));
    }
}
