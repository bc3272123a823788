//! Period boundary accounting.

/// Accumulates transferred bytes and reports period boundary crossings.
///
/// The consuming framework is notified once per crossed boundary, which
/// stands in for the period interrupt of real hardware. A single advance
/// cannot legitimately span more than one period at the configured tick
/// rate and minimum period size, but the modulo keeps the position sane
/// regardless.
#[derive(Debug)]
pub struct PeriodClock {
    period_pos: usize,
    period_bytes: usize,
}

impl PeriodClock {
    /// Create a clock for the given period length. A zero length
    /// disables boundary reporting.
    pub fn new(period_bytes: usize) -> Self {
        Self {
            period_pos: 0,
            period_bytes,
        }
    }

    /// Bytes accumulated since the last boundary.
    pub fn period_pos(&self) -> usize {
        self.period_pos
    }

    /// Account for `n` transferred bytes. Returns true when a period
    /// boundary was crossed and the owner should notify the framework.
    pub fn advance(&mut self, n: usize) -> bool {
        if self.period_bytes == 0 {
            return false;
        }
        self.period_pos += n;
        if self.period_pos >= self.period_bytes {
            self.period_pos %= self.period_bytes;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_boundary_below_threshold() {
        let mut clock = PeriodClock::new(4096);
        assert!(!clock.advance(4095));
        assert_eq!(clock.period_pos(), 4095);
    }

    #[test]
    fn boundary_at_threshold() {
        let mut clock = PeriodClock::new(4096);
        assert!(clock.advance(4096));
        assert_eq!(clock.period_pos(), 0);
    }

    #[test]
    fn remainder_carries_over() {
        let mut clock = PeriodClock::new(4096);
        assert!(!clock.advance(3200));
        assert!(clock.advance(3200));
        assert_eq!(clock.period_pos(), 2304);
    }

    #[test]
    fn oversized_advance_reduces_modulo() {
        let mut clock = PeriodClock::new(4096);
        assert!(clock.advance(4096 * 2 + 10));
        assert_eq!(clock.period_pos(), 10);
    }

    #[test]
    fn zero_period_never_fires() {
        let mut clock = PeriodClock::new(0);
        assert!(!clock.advance(100_000));
    }
}
