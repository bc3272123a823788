//! Virtual card: the process-wide device object.
//!
//! Owns the state every substream shares (configuration toggles, fill
//! pattern, inspection surface) and hands out sessions. Substreams are
//! capped per direction like the real device; each open session holds a
//! slot that is returned when the session goes away.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::buffer::SharedBuffer;
use crate::config::SimConfig;
use crate::error::PcmError;
use crate::inspect::Inspect;
use crate::pattern::PatternStore;
use crate::session::{Direction, PeriodSink, StreamSession};

/// Playback substreams per card.
pub const PLAYBACK_SUBSTREAMS: usize = 8;
/// Capture substreams per card.
pub const CAPTURE_SUBSTREAMS: usize = 8;
/// Simulated hardware-progress ticks per second.
pub const DEFAULT_TICKS_PER_SECOND: u32 = 5;

/// The virtual PCM test device.
pub struct VirtualCard {
    config: Arc<SimConfig>,
    pattern: Arc<PatternStore>,
    inspect: Arc<Inspect>,
    ticks_per_second: u32,
    playback_open: Arc<AtomicUsize>,
    capture_open: Arc<AtomicUsize>,
}

impl VirtualCard {
    /// Create a card with the default tick rate.
    pub fn new() -> Self {
        Self::with_ticks_per_second(DEFAULT_TICKS_PER_SECOND)
    }

    /// Create a card with a custom tick rate. Tests use fast clocks to
    /// cover more buffer per wall-clock second; zero is clamped to one.
    pub fn with_ticks_per_second(ticks_per_second: u32) -> Self {
        let pattern = Arc::new(PatternStore::new());
        Self {
            config: Arc::new(SimConfig::new()),
            inspect: Arc::new(Inspect::new(Arc::clone(&pattern))),
            pattern,
            ticks_per_second: ticks_per_second.max(1),
            playback_open: Arc::new(AtomicUsize::new(0)),
            capture_open: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared configuration toggles.
    pub fn config(&self) -> &Arc<SimConfig> {
        &self.config
    }

    /// Shared fill/verify pattern.
    pub fn pattern(&self) -> &Arc<PatternStore> {
        &self.pattern
    }

    /// Test-result inspection surface.
    pub fn inspect(&self) -> &Arc<Inspect> {
        &self.inspect
    }

    /// Open a playback substream on the given buffer. `sink` is invoked
    /// from the tick thread once per crossed period boundary, after the
    /// buffer lock has been released, so it may access the buffer
    /// through its own handle.
    pub fn open_playback(
        &self,
        buffer: SharedBuffer,
        sink: PeriodSink,
    ) -> Result<StreamSession, PcmError> {
        let slot = SubstreamSlot::acquire(&self.playback_open, PLAYBACK_SUBSTREAMS)?;
        Ok(self.open(Direction::Playback, buffer, sink, slot))
    }

    /// Open a capture substream on the given buffer.
    pub fn open_capture(
        &self,
        buffer: SharedBuffer,
        sink: PeriodSink,
    ) -> Result<StreamSession, PcmError> {
        let slot = SubstreamSlot::acquire(&self.capture_open, CAPTURE_SUBSTREAMS)?;
        Ok(self.open(Direction::Capture, buffer, sink, slot))
    }

    fn open(
        &self,
        direction: Direction,
        buffer: SharedBuffer,
        sink: PeriodSink,
        slot: SubstreamSlot,
    ) -> StreamSession {
        // Every open starts a fresh test run.
        self.inspect.clear_for_open();
        StreamSession::new(
            direction,
            buffer,
            sink,
            Arc::clone(&self.config),
            Arc::clone(&self.pattern),
            Arc::clone(&self.inspect),
            self.ticks_per_second,
            slot,
        )
    }
}

impl Default for VirtualCard {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds one substream slot; returned to the card when dropped.
pub(crate) struct SubstreamSlot {
    count: Arc<AtomicUsize>,
}

impl SubstreamSlot {
    fn acquire(count: &Arc<AtomicUsize>, cap: usize) -> Result<Self, PcmError> {
        count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < cap).then_some(n + 1)
            })
            .map_err(|_| PcmError::NoFreeSubstream)?;
        Ok(Self {
            count: Arc::clone(count),
        })
    }
}

impl Drop for SubstreamSlot {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}
