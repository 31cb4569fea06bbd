use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Sliding-window rate limiter gating every call to the content-conversion
/// service.
///
/// Admission is tracked as grant timestamps: a call goes through only when
/// fewer than `capacity` grants happened in the last `period`, so no window
/// of that length ever sees more than `capacity` requests, however the
/// grants cluster around window boundaries. Shared across all concurrent
/// jobs, since the external quota is global. All mutation happens under one
/// lock so grants are never over-issued.
pub struct RateLimiter {
    capacity: u32,
    period: Duration,
    grants: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(capacity: u32, period: Duration) -> Self {
        assert!(capacity > 0, "rate limiter capacity must be positive");
        assert!(!period.is_zero(), "rate limiter period must be positive");
        Self {
            capacity,
            period,
            grants: Mutex::new(VecDeque::with_capacity(capacity as usize)),
        }
    }

    /// Waits until admission is allowed, then records the grant.
    ///
    /// Cannot fail, only delay. Admission order under contention is not
    /// FIFO; throughput never exceeds `capacity` per any `period`-long span.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut grants = self.grants.lock().await;
                let now = Instant::now();
                while grants
                    .front()
                    .is_some_and(|&oldest| now.duration_since(oldest) >= self.period)
                {
                    grants.pop_front();
                }
                if (grants.len() as u32) < self.capacity {
                    grants.push_back(now);
                    log::trace!("rate limiter grant issued, {} in window", grants.len());
                    return;
                }
                // Window full: sleep until the oldest grant ages out.
                self.period - now.duration_since(grants[0])
            };
            tokio::time::sleep(wait).await;
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
