//! Stream session lifecycle.
//!
//! One `StreamSession` covers one open/close cycle of a playback or
//! capture substream: parameter negotiation, prepare, trigger, the tick
//! thread that simulates hardware progress, and the verdict published at
//! close. Control calls arrive on the caller's thread and may race an
//! in-flight tick; everything the tick touches lives behind the shared
//! tick-state lock, and trigger/stop/close use the tick driver's
//! synchronous cancellation so position state is never reinitialized
//! under a live callback. The period sink is invoked only after the
//! tick has released the buffer and state locks, so a sink may read or
//! write the stream buffer through its own handle.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::buffer::SharedBuffer;
use crate::caps::StreamParams;
use crate::card::SubstreamSlot;
use crate::config::{FillMode, SimConfig};
use crate::error::PcmError;
use crate::inspect::Inspect;
use crate::iter::BufferIterator;
use crate::pattern::PatternStore;
use crate::period::PeriodClock;
use crate::tick::TickDriver;

/// Stream direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The framework writes data; the device verifies it.
    Playback,
    /// The device produces data; the framework reads it.
    Capture,
}

/// Result of one closed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// All verified data matched the pattern. Capture sessions always
    /// pass; nothing checks them against a target.
    Pass,
    /// At least one playback byte deviated from the pattern.
    Fail,
}

/// Lifecycle states between open and close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Open, parameters not yet accepted by `prepare`.
    Opened,
    /// Prepared and ready to trigger.
    Prepared,
    /// Tick thread running.
    Running,
    /// Stopped after running; must be re-prepared to restart.
    Stopped,
}

/// Callback invoked from the tick thread once per crossed period
/// boundary. It runs with no internal lock held, so it may access the
/// stream's [`SharedBuffer`] through its own handle.
pub type PeriodSink = Box<dyn FnMut() + Send>;

struct TickState {
    iter: BufferIterator,
    clock: PeriodClock,
    rng: SmallRng,
}

/// One open substream of a [`VirtualCard`](crate::card::VirtualCard).
pub struct StreamSession {
    direction: Direction,
    state: SessionState,
    params: Option<StreamParams>,
    buffer: SharedBuffer,
    config: Arc<SimConfig>,
    pattern: Arc<PatternStore>,
    inspect: Arc<Inspect>,
    ticks_per_second: u32,
    tick: Option<TickDriver>,
    shared: Arc<Mutex<TickState>>,
    sink: Arc<Mutex<PeriodSink>>,
    _slot: SubstreamSlot,
}

impl StreamSession {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        direction: Direction,
        buffer: SharedBuffer,
        sink: PeriodSink,
        config: Arc<SimConfig>,
        pattern: Arc<PatternStore>,
        inspect: Arc<Inspect>,
        ticks_per_second: u32,
        slot: SubstreamSlot,
    ) -> Self {
        debug!("open {:?} substream, buffer {} bytes", direction, buffer.len());
        Self {
            direction,
            state: SessionState::Opened,
            params: None,
            buffer,
            config,
            pattern,
            inspect,
            ticks_per_second,
            tick: None,
            shared: Arc::new(Mutex::new(TickState {
                iter: BufferIterator::new(),
                clock: PeriodClock::new(0),
                rng: SmallRng::from_entropy(),
            })),
            sink: Arc::new(Mutex::new(sink)),
            _slot: slot,
        }
    }

    /// Stream direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Negotiate stream parameters. Fails busy when the corresponding
    /// error injection is armed, and rejects parameters outside the
    /// capability table or mismatched with the buffer length.
    pub fn hw_params(&mut self, params: StreamParams) -> Result<(), PcmError> {
        if self.config.inject_hwpars_err() {
            return Err(PcmError::Busy);
        }
        if self.state == SessionState::Running {
            return Err(PcmError::InvalidState);
        }
        params.validate(self.buffer.len())?;
        debug!("{:?} hw_params {:?}", self.direction, params);
        self.params = Some(params);
        Ok(())
    }

    /// Move to the prepared state. Mutates nothing else; fails when the
    /// prepare error injection is armed or no parameters were
    /// negotiated.
    pub fn prepare(&mut self) -> Result<(), PcmError> {
        if self.config.inject_prepare_err() {
            return Err(PcmError::InvalidState);
        }
        if self.state == SessionState::Running || self.params.is_none() {
            return Err(PcmError::InvalidState);
        }
        self.state = SessionState::Prepared;
        Ok(())
    }

    /// Start the stream: fix the tick-derived quantities from the
    /// negotiated parameters and launch the tick thread. Buffer content
    /// is produced by the ticks, never synchronously here.
    pub fn trigger_start(&mut self) -> Result<(), PcmError> {
        if self.config.inject_trigger_err() {
            return Err(PcmError::InvalidArgument);
        }
        if self.state != SessionState::Prepared {
            return Err(PcmError::InvalidState);
        }
        let params = self.params.ok_or(PcmError::InvalidState)?;

        // Reject degenerate budgets before touching any stream state; a
        // failed trigger leaves the session exactly as it was.
        let b_rw = params.bytes_per_tick(self.ticks_per_second);
        if b_rw == 0 || b_rw > self.buffer.len() {
            return Err(PcmError::InvalidArgument);
        }

        // A stale driver must be fully stopped before the iterator is
        // reconfigured; its callback may still be mid-tick.
        if let Some(stale) = self.tick.take() {
            stale.stop();
        }

        {
            let mut st = self.shared.lock();
            st.iter
                .configure(&params, self.buffer.len(), self.ticks_per_second);
            st.clock = PeriodClock::new(params.period_bytes);
        }

        let interval = Duration::from_secs(1) / self.ticks_per_second;
        let delay_config = Arc::clone(&self.config);
        let shared = Arc::clone(&self.shared);
        let buffer = self.buffer.clone();
        let pattern = Arc::clone(&self.pattern);
        let config = Arc::clone(&self.config);
        let sink = Arc::clone(&self.sink);
        let direction = self.direction;

        let step = move || {
            let boundary = {
                let mut st = shared.lock();
                let mut buf = buffer.lock();
                let TickState { iter, clock, rng } = &mut *st;
                match direction {
                    Direction::Playback if !iter.corrupted() => {
                        pattern.with_bytes(|p| iter.verify_block(&buf, p));
                        if iter.corrupted() {
                            warn!("playback data mismatch at byte {}", iter.total_bytes());
                        }
                    }
                    Direction::Playback => iter.skip_block(buf.len()),
                    Direction::Capture => match config.fill_mode() {
                        FillMode::Pattern => {
                            pattern.with_bytes(|p| iter.fill_block_pattern(&mut buf, p))
                        }
                        FillMode::Random => iter.fill_block_random(&mut buf, rng),
                    },
                }
                clock.advance(iter.bytes_per_tick())
            };
            // Buffer and state locks are released here; the sink may
            // re-enter the buffer through its own handle.
            if boundary {
                (sink.lock())();
            }
        };

        let driver = TickDriver::start(interval, move || delay_config.inject_delay(), step)
            .map_err(|_| PcmError::Alloc)?;
        self.tick = Some(driver);
        self.state = SessionState::Running;
        debug!("{:?} stream running", self.direction);
        Ok(())
    }

    /// Stop the stream. Returns after any in-flight tick has completed.
    pub fn trigger_stop(&mut self) -> Result<(), PcmError> {
        if self.config.inject_trigger_err() {
            return Err(PcmError::InvalidArgument);
        }
        if self.state != SessionState::Running {
            return Err(PcmError::InvalidState);
        }
        if let Some(driver) = self.tick.take() {
            driver.stop();
        }
        self.state = SessionState::Stopped;
        debug!("{:?} stream stopped", self.direction);
        Ok(())
    }

    /// Reset control operation: records the reset signal for the
    /// inspection interface, nothing else.
    pub fn reset(&mut self) {
        self.inspect.mark_reset();
    }

    /// Simulated hardware pointer in frames.
    pub fn pointer(&self) -> usize {
        let buf_pos = self.shared.lock().iter.buf_pos();
        match self.params {
            Some(params) => params.bytes_to_frames(buf_pos),
            None => 0,
        }
    }

    /// Total bytes the simulated hardware has processed since open.
    pub fn total_bytes(&self) -> usize {
        self.shared.lock().iter.total_bytes()
    }

    /// Close the session: stop the tick thread synchronously, publish
    /// the verdict to the inspection interface and release the
    /// substream.
    pub fn close(mut self) -> Verdict {
        if let Some(driver) = self.tick.take() {
            driver.stop();
        }
        let corrupted = self.shared.lock().iter.corrupted();
        let verdict = match self.direction {
            Direction::Playback if corrupted => Verdict::Fail,
            _ => Verdict::Pass,
        };
        self.inspect.publish_pc_test(verdict == Verdict::Pass);
        debug!("{:?} substream closed: {:?}", self.direction, verdict);
        verdict
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        // Dropped without close: still shut the tick thread down before
        // the shared state goes away.
        if let Some(driver) = self.tick.take() {
            driver.stop();
        }
    }
}
