//! Device capability table and stream parameter negotiation.

use crate::error::PcmError;

/// Maximum number of channels the device advertises.
pub const MAX_CHANNELS: usize = 4;
/// Minimum supported frame rate in Hz.
pub const RATE_MIN: usize = 8_000;
/// Maximum supported frame rate in Hz.
pub const RATE_MAX: usize = 48_000;
/// Maximum DMA buffer size in bytes.
pub const BUFFER_BYTES_MAX: usize = 128 * 1024;
/// Minimum period length in bytes.
pub const PERIOD_BYTES_MIN: usize = 4096;
/// Maximum period length in bytes.
pub const PERIOD_BYTES_MAX: usize = 32768;
/// Maximum number of periods per buffer.
pub const PERIODS_MAX: usize = 1024;

/// Sample formats the device supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Unsigned 8-bit.
    U8,
    /// Signed 16-bit little-endian.
    S16Le,
}

impl SampleFormat {
    /// Sample width in bits.
    pub fn bits(self) -> usize {
        match self {
            SampleFormat::U8 => 8,
            SampleFormat::S16Le => 16,
        }
    }

    /// Sample width in bytes.
    pub fn bytes(self) -> usize {
        self.bits() / 8
    }
}

/// Channel layout of the DMA buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Frames store one sample per channel adjacently: C0, C1, C0, C1, ...
    Interleaved,
    /// Each channel occupies one contiguous sub-region of the buffer.
    NonInterleaved,
}

/// Negotiated stream parameters.
///
/// The DMA buffer itself is supplied by the caller at open time, so its
/// byte length is not part of the parameter set; `validate` checks the
/// parameters against both the capability table and the buffer length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    /// Frame rate in Hz.
    pub rate: usize,
    /// Channel count.
    pub channels: usize,
    /// Sample format.
    pub format: SampleFormat,
    /// Channel layout.
    pub access: Access,
    /// Period length in bytes.
    pub period_bytes: usize,
}

impl StreamParams {
    /// Bytes in one frame (one sample for every channel).
    pub fn frame_bytes(&self) -> usize {
        self.channels * self.format.bytes()
    }

    /// Convert a frame count to bytes.
    pub fn frames_to_bytes(&self, frames: usize) -> usize {
        frames * self.frame_bytes()
    }

    /// Convert a byte count to frames, rounding down.
    pub fn bytes_to_frames(&self, bytes: usize) -> usize {
        bytes / self.frame_bytes()
    }

    /// Bytes the simulated hardware moves in one tick. The per-channel
    /// rate is divided by the tick rate before the channel multiply, so
    /// the budget stays a whole multiple of the channel count.
    pub fn bytes_per_tick(&self, ticks_per_second: u32) -> usize {
        self.rate * self.format.bits() / 8 / ticks_per_second as usize * self.channels
    }

    /// Validate against the capability table and the supplied buffer
    /// length.
    pub fn validate(&self, buffer_bytes: usize) -> Result<(), PcmError> {
        if !(RATE_MIN..=RATE_MAX).contains(&self.rate) {
            return Err(PcmError::InvalidArgument);
        }
        if !(1..=MAX_CHANNELS).contains(&self.channels) {
            return Err(PcmError::InvalidArgument);
        }
        if buffer_bytes == 0 || buffer_bytes > BUFFER_BYTES_MAX {
            return Err(PcmError::InvalidArgument);
        }
        if !(PERIOD_BYTES_MIN..=PERIOD_BYTES_MAX).contains(&self.period_bytes) {
            return Err(PcmError::InvalidArgument);
        }
        if self.period_bytes > buffer_bytes || buffer_bytes / self.period_bytes > PERIODS_MAX {
            return Err(PcmError::InvalidArgument);
        }
        if buffer_bytes % self.frame_bytes() != 0 {
            return Err(PcmError::InvalidArgument);
        }
        // Non-interleaved channel blocks must tile the buffer exactly.
        if self.access == Access::NonInterleaved && buffer_bytes % self.channels != 0 {
            return Err(PcmError::InvalidArgument);
        }
        Ok(())
    }
}
