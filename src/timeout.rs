//! Communication watchdog counter.
//!
//! Counts timer overflows since the last sign of life on the watch link.
//! Any successful transmit to the watch and every `'H'` handshake reset it.
//! Once it reaches its threshold the charge/LED cycle shuts down until the
//! next handshake.

/// Overflow counter with an expiry threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommTimeout {
    count: u16,
    threshold: u16,
}

impl CommTimeout {
    /// Creates a counter at zero that expires after `threshold` ticks.
    pub const fn new(threshold: u16) -> Self {
        Self {
            count: 0,
            threshold,
        }
    }

    /// Counts one overflow tick.
    #[inline]
    pub fn increment(&mut self) {
        self.count = self.count.wrapping_add(1);
    }

    /// Restarts the window.
    #[inline]
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Returns true once the threshold has been reached.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.count >= self.threshold
    }

    /// Ticks counted since the last reset.
    #[inline]
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Expiry threshold in ticks.
    #[inline]
    pub fn threshold(&self) -> u16 {
        self.threshold
    }
}

impl Default for CommTimeout {
    fn default() -> Self {
        Self::new(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_exactly_at_threshold() {
        let mut timeout = CommTimeout::new(3);
        timeout.increment();
        timeout.increment();
        assert!(!timeout.is_expired());
        timeout.increment();
        assert!(timeout.is_expired());
    }

    #[test]
    fn reset_restarts_window() {
        let mut timeout = CommTimeout::default();
        for _ in 0..499 {
            timeout.increment();
        }
        timeout.reset();
        assert_eq!(timeout.count(), 0);
        timeout.increment();
        assert!(!timeout.is_expired());
    }

    #[test]
    fn counter_wraps_instead_of_panicking() {
        let mut timeout = CommTimeout::new(u16::MAX);
        for _ in 0..u32::from(u16::MAX) + 1 {
            timeout.increment();
        }
        assert_eq!(timeout.count(), 0);
    }
}
