//! Test-result inspection surface.
//!
//! The equivalent of the driver's debug file directory: a handful of
//! bytes a test harness polls to learn how the last session went, plus
//! read/write access to the fill pattern. Everything here is card-wide;
//! opening any stream clears the result bytes for the new run.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::pattern::PatternStore;

/// Published test results and pattern access.
pub struct Inspect {
    pc_test: AtomicU8,
    ioctl_test: AtomicU8,
    pattern: Arc<PatternStore>,
}

impl Inspect {
    pub(crate) fn new(pattern: Arc<PatternStore>) -> Self {
        Self {
            pc_test: AtomicU8::new(0),
            ioctl_test: AtomicU8::new(0),
            pattern,
        }
    }

    /// Playback/capture verdict of the most recently closed session:
    /// `1` when the transferred data matched the pattern end to end,
    /// `0` otherwise (or before any session closed).
    pub fn pc_test(&self) -> u8 {
        self.pc_test.load(Ordering::Relaxed)
    }

    /// `1` when a reset control operation ran during the current or last
    /// session, `0` otherwise. Cleared on the next open.
    pub fn ioctl_test(&self) -> u8 {
        self.ioctl_test.load(Ordering::Relaxed)
    }

    /// Effective fill pattern length in bytes.
    pub fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    /// Read pattern bytes; see [`PatternStore::read`].
    pub fn read_pattern(&self, offset: usize, out: &mut [u8]) -> usize {
        self.pattern.read(offset, out)
    }

    /// Replace pattern bytes; see [`PatternStore::write`].
    pub fn write_pattern(&self, offset: usize, data: &[u8]) -> usize {
        self.pattern.write(offset, data)
    }

    pub(crate) fn clear_for_open(&self) {
        self.pc_test.store(0, Ordering::Relaxed);
        self.ioctl_test.store(0, Ordering::Relaxed);
    }

    pub(crate) fn publish_pc_test(&self, passed: bool) {
        self.pc_test.store(u8::from(passed), Ordering::Relaxed);
    }

    pub(crate) fn mark_reset(&self) {
        self.ioctl_test.store(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_bytes_default_to_zero() {
        let inspect = Inspect::new(Arc::new(PatternStore::new()));
        assert_eq!(inspect.pc_test(), 0);
        assert_eq!(inspect.ioctl_test(), 0);
    }

    #[test]
    fn publish_and_clear() {
        let inspect = Inspect::new(Arc::new(PatternStore::new()));
        inspect.publish_pc_test(true);
        inspect.mark_reset();
        assert_eq!(inspect.pc_test(), 1);
        assert_eq!(inspect.ioctl_test(), 1);
        inspect.clear_for_open();
        assert_eq!(inspect.pc_test(), 0);
        assert_eq!(inspect.ioctl_test(), 0);
    }

    #[test]
    fn pattern_passthrough() {
        let inspect = Inspect::new(Arc::new(PatternStore::new()));
        assert_eq!(inspect.pattern_len(), 7);
        assert_eq!(inspect.write_pattern(0, b"zzz"), 3);
        assert_eq!(inspect.pattern_len(), 3);
        let mut out = [0u8; 8];
        assert_eq!(inspect.read_pattern(0, &mut out), 3);
        assert_eq!(&out[..3], b"zzz");
    }
}
