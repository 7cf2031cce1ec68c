// src/supervisor/backoff.rs

use std::time::Duration;

/// Capped exponential backoff: `min(base * 2^attempt, cap)`.
///
/// With the defaults (100ms base, 1s cap) the delays are
/// 100, 200, 400, 800, 1000, 1000, ... milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_millis(1000))
    }
}

impl Backoff {
    /// `base` larger than `cap` is clamped down to `cap`.
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base: base.min(cap),
            cap,
        }
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn cap(&self) -> Duration {
        self.cap
    }

    /// Delay to wait after the `attempt`-th failed probe (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        // 2^31 already overflows any sane base; saturate instead of wrapping.
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .map_or(self.cap, |d| d.min(self.cap))
    }

    /// Infinite iterator over successive delays.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0u32..).map(move |attempt| self.delay(attempt))
    }
}
