use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Repeating activity tick that can be revoked once.
pub struct PulseTimer {
    interval: Option<Interval>,
}

impl PulseTimer {
    /// Must be called from within a tokio runtime.
    pub fn start(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval: Some(interval),
        }
    }

    pub fn is_active(&self) -> bool {
        self.interval.is_some()
    }

    /// Waits for the next tick. Never resolves once stopped.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Returns `true` only for the call that actually stopped the timer.
    pub fn stop(&mut self) -> bool {
        self.interval.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ticks_until_stopped() {
        let mut pulse = PulseTimer::start(Duration::from_millis(5));
        pulse.tick().await;
        pulse.tick().await;
        assert!(pulse.is_active());

        assert!(pulse.stop());
        assert!(!pulse.is_active());
        assert!(!pulse.stop());
    }

    #[tokio::test]
    async fn test_stopped_timer_never_ticks() {
        let mut pulse = PulseTimer::start(Duration::from_millis(5));
        pulse.stop();

        let waited = time::timeout(Duration::from_millis(30), pulse.tick()).await;
        assert!(waited.is_err());
    }
}
