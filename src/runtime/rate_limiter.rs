//! # Global Rate Limiter
//!
//! Paces reconciles across every kind controller so the Magento API sees at
//! most `max_reconcile_rate` reconciles per second in total.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Hands out evenly spaced start slots to concurrent reconciles
#[derive(Debug)]
pub struct GlobalRateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl GlobalRateLimiter {
    /// A rate of zero disables pacing
    #[must_use]
    pub fn new(per_second: u32) -> Self {
        let interval = if per_second == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1) / per_second
        };
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the caller may start a reconcile
    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }
        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(next) if next > now => next,
                _ => now,
            };
            *next_slot = Some(slot + self.interval);
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}
