use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-spacing gate for upstream calls: each `acquire` waits until at
/// least `interval` has elapsed since the previous caller was admitted.
///
/// Not a token bucket — there is no burst allowance. The lock is held across
/// the sleep so concurrent callers serialize and the aggregate request rate
/// honors the spacing.
pub struct FixedIntervalGate {
    interval: Duration,
    last_admitted: Mutex<Option<Instant>>,
}

impl FixedIntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: Mutex::new(None),
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Block until the spacing constraint allows another upstream call.
    pub async fn acquire(&self) {
        let mut last = self.last_admitted.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn consecutive_acquires_are_spaced_by_the_interval() {
        let gate = FixedIntervalGate::from_millis(100);
        let start = Instant::now();

        gate.acquire().await;
        gate.acquire().await;
        gate.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let gate = FixedIntervalGate::from_millis(100);
        let start = Instant::now();
        gate.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
