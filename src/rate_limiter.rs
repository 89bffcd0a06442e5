use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::RateLimitConfig;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LimiterError {
    #[error("wait for an outbound slot was cancelled")]
    Cancelled,
}

/// Token bucket shared by every outbound call of the process.
///
/// Implemented as a generic cell rate algorithm: `tat` is the theoretical
/// arrival time of the next request. A request may go once `tat` is no more
/// than `burst - 1` emission intervals ahead of the current time.
pub struct RateLimiter {
    interval: Duration,
    burst: u32,
    tat: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// `requests` evenly spaced over `window`, at most `burst` back to back
    pub fn new(requests: u32, window: Duration, burst: u32) -> Self {
        Self {
            interval: window / requests.max(1),
            burst: burst.max(1),
            tat: Mutex::new(None),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests, config.window(), config.burst)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until a slot is available or `cancel` fires.
    ///
    /// Cancelling, or dropping the returned future before it completes,
    /// gives the slot back when no later caller has reserved behind it.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), LimiterError> {
        if cancel.is_cancelled() {
            return Err(LimiterError::Cancelled);
        }

        let now = Instant::now();
        let reservation = self.reserve(now);
        if reservation.ready_at <= now {
            reservation.commit();
            return Ok(());
        }

        debug!(
            wait_ms = reservation.ready_at.duration_since(now).as_millis() as u64,
            "Waiting for outbound rate limit slot"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LimiterError::Cancelled),
            _ = sleep_until(reservation.ready_at) => {
                reservation.commit();
                Ok(())
            }
        }
    }

    fn reserve(&self, now: Instant) -> Reservation<'_> {
        let mut tat = self.tat.lock().unwrap_or_else(PoisonError::into_inner);
        let start = match *tat {
            Some(t) if t > now => t,
            _ => now,
        };
        let end = start + self.interval;
        *tat = Some(end);

        let slack = self.interval * (self.burst - 1);
        Reservation {
            limiter: self,
            start,
            end,
            ready_at: now + start.duration_since(now).saturating_sub(slack),
            committed: false,
        }
    }

    /// Undo the reservation `[start, end)` if it is still the newest one.
    fn release(&self, start: Instant, end: Instant) {
        let mut tat = self.tat.lock().unwrap_or_else(PoisonError::into_inner);
        if *tat == Some(end) {
            *tat = Some(start);
        }
    }
}

/// A reserved slot, handed back on drop unless committed.
struct Reservation<'a> {
    limiter: &'a RateLimiter,
    start: Instant,
    end: Instant,
    ready_at: Instant,
    committed: bool,
}

impl Reservation<'_> {
    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.limiter.release(self.start, self.end);
        }
    }
}
