use crate::types::MAX_RECONNECT_DELAY;
use std::time::Duration;

/// Attempt counter and delay schedule for reconnection with exponential backoff.
///
/// The delay for attempt `n` (1-based) is `base * 2^(n-1)`, capped at
/// [`MAX_RECONNECT_DELAY`].
#[derive(Debug, Clone)]
pub struct ReconnectTimer {
    attempts: u32,
    base: Duration,
    max_delay: Duration,
}

impl ReconnectTimer {
    pub fn new(base: Duration) -> Self {
        Self {
            attempts: 0,
            base,
            max_delay: Duration::from_millis(MAX_RECONNECT_DELAY),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Count a failed attempt and return the new total
    pub fn record_attempt(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }

    /// Delay before retrying after `attempt` failures
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Reset the timer
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

impl Default for ReconnectTimer {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::types::RECONNECT_INTERVAL))
    }
}
