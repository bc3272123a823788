//! Card-wide configuration toggles.
//!
//! These mirror the module parameters of a real driver: they can flip at
//! any moment and the stream machinery reads them at the point of use
//! rather than caching them at open time. Only quantities derived at
//! trigger time (tick budget, period length, layout) are fixed for the
//! life of a running stream.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::time::Duration;

/// How capture buffers are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// Random bytes.
    Random,
    /// The repeating pattern from the card's `PatternStore`.
    Pattern,
}

/// Shared, mutable configuration read by every stream of a card.
pub struct SimConfig {
    fill_mode: AtomicU8,
    inject_delay_ms: AtomicU64,
    inject_hwpars_err: AtomicBool,
    inject_prepare_err: AtomicBool,
    inject_trigger_err: AtomicBool,
}

impl SimConfig {
    /// Defaults: pattern fill, no delay, no injected errors.
    pub fn new() -> Self {
        Self {
            fill_mode: AtomicU8::new(FillMode::Pattern as u8),
            inject_delay_ms: AtomicU64::new(0),
            inject_hwpars_err: AtomicBool::new(false),
            inject_prepare_err: AtomicBool::new(false),
            inject_trigger_err: AtomicBool::new(false),
        }
    }

    /// Current capture fill mode.
    pub fn fill_mode(&self) -> FillMode {
        if self.fill_mode.load(Ordering::Relaxed) == FillMode::Random as u8 {
            FillMode::Random
        } else {
            FillMode::Pattern
        }
    }

    /// Select the capture fill mode.
    pub fn set_fill_mode(&self, mode: FillMode) {
        self.fill_mode.store(mode as u8, Ordering::Relaxed);
    }

    /// Extra delay added to every tick interval.
    pub fn inject_delay(&self) -> Duration {
        Duration::from_millis(self.inject_delay_ms.load(Ordering::Relaxed))
    }

    /// Set the extra per-tick delay (millisecond granularity).
    pub fn set_inject_delay(&self, delay: Duration) {
        self.inject_delay_ms
            .store(delay.as_millis() as u64, Ordering::Relaxed);
    }

    /// True when `hw_params` should fail with a busy error.
    pub fn inject_hwpars_err(&self) -> bool {
        self.inject_hwpars_err.load(Ordering::Relaxed)
    }

    /// Arm or disarm the `hw_params` failure.
    pub fn set_inject_hwpars_err(&self, on: bool) {
        self.inject_hwpars_err.store(on, Ordering::Relaxed);
    }

    /// True when `prepare` should fail with an invalid-state error.
    pub fn inject_prepare_err(&self) -> bool {
        self.inject_prepare_err.load(Ordering::Relaxed)
    }

    /// Arm or disarm the `prepare` failure.
    pub fn set_inject_prepare_err(&self, on: bool) {
        self.inject_prepare_err.store(on, Ordering::Relaxed);
    }

    /// True when `trigger` should fail with an invalid-argument error.
    pub fn inject_trigger_err(&self) -> bool {
        self.inject_trigger_err.load(Ordering::Relaxed)
    }

    /// Arm or disarm the `trigger` failure.
    pub fn set_inject_trigger_err(&self, on: bool) {
        self.inject_trigger_err.store(on, Ordering::Relaxed);
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}
