//! Circular buffer iterator: the simulated hardware pointer.
//!
//! A `BufferIterator` walks a flat circular DMA buffer the way real PCM
//! hardware would, one tick at a time. For capture streams it produces
//! data (a repeating pattern or random bytes); for playback streams it
//! verifies that the framework wrote the expected repeating pattern.
//!
//! Two addressing schemes are supported. In interleaved mode the frames
//! are stored as C0, C1, ..., C0, C1, ... and the buffer position simply
//! advances byte by byte. In non-interleaved mode each channel owns a
//! contiguous `chan_block`-byte sub-region and the per-channel position
//! is derived from the flat position, so the flat pointer still moves at
//! the nominal hardware rate.
//!
//! Verification stops early at the first zero byte, which is read as
//! "nothing written here yet". The pattern therefore must not contain
//! zero bytes; a legitimate zero would be indistinguishable from the end
//! of the written data.

// Keep this hot path free of locks, allocation and logging; it runs on
// every tick under the session's buffer lock.

use rand::rngs::SmallRng;
use rand::RngCore;

use crate::caps::StreamParams;

/// Per-stream position tracker and fill/verify engine.
#[derive(Debug)]
pub struct BufferIterator {
    buf_pos: usize,
    total_bytes: usize,
    b_rw: usize,
    sample_bytes: usize,
    channels: usize,
    interleaved: bool,
    chan_block: usize,
    corrupted: bool,
}

impl BufferIterator {
    /// Create an idle iterator: position zero, nothing corrupted, no
    /// per-tick budget until [`configure`](Self::configure) is called.
    pub fn new() -> Self {
        Self {
            buf_pos: 0,
            total_bytes: 0,
            b_rw: 0,
            sample_bytes: 0,
            channels: 0,
            interleaved: true,
            chan_block: 0,
            corrupted: false,
        }
    }

    /// Install the layout negotiated at trigger time.
    ///
    /// The per-tick byte budget comes from
    /// [`StreamParams::bytes_per_tick`]. Positions are not reset here:
    /// they belong to the open/close lifecycle, not to the trigger.
    pub fn configure(&mut self, params: &StreamParams, buffer_len: usize, ticks_per_second: u32) {
        self.sample_bytes = params.format.bytes();
        self.channels = params.channels;
        self.interleaved = params.access == crate::caps::Access::Interleaved;
        self.chan_block = if self.interleaved {
            0
        } else {
            buffer_len / params.channels
        };
        self.b_rw = params.bytes_per_tick(ticks_per_second);
    }

    /// Current byte offset into the circular buffer.
    pub fn buf_pos(&self) -> usize {
        self.buf_pos
    }

    /// Total bytes processed since open; never decreases.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Bytes advanced on every tick.
    pub fn bytes_per_tick(&self) -> usize {
        self.b_rw
    }

    /// Sticky playback mismatch flag.
    pub fn corrupted(&self) -> bool {
        self.corrupted
    }

    fn advance(&mut self, by: usize, buffer_len: usize) {
        self.total_bytes += by;
        self.buf_pos = (self.buf_pos + by) % buffer_len;
    }

    /// Flat buffer position of the next byte of channel `chan` in
    /// non-interleaved mode.
    fn pos_nint(&self, chan: usize) -> usize {
        self.buf_pos / self.channels + self.chan_block * chan
    }

    /// Pattern index for the current byte in interleaved mode: the count
    /// of whole samples already written to one channel, in bytes, plus
    /// the position within the current sample. Every channel replays the
    /// same pattern.
    fn ch_pos_int(total_bytes: usize, channels: usize, sample_bytes: usize) -> usize {
        total_bytes / channels / sample_bytes * sample_bytes + total_bytes % sample_bytes
    }

    /// Advance one tick without touching the buffer. Used for playback
    /// streams that are already known corrupted.
    pub fn skip_block(&mut self, buffer_len: usize) {
        self.advance(self.b_rw, buffer_len);
    }

    /// Verify one tick's worth of playback data against the repeating
    /// pattern.
    ///
    /// The scan stops at the first zero byte (end of written data) or at
    /// the first mismatch, which latches [`corrupted`](Self::corrupted).
    /// Either way the position advances by the full tick budget so the
    /// simulated pointer keeps the nominal hardware rate.
    pub fn verify_block(&mut self, buf: &[u8], pattern: &[u8]) {
        if pattern.is_empty() || self.b_rw == 0 {
            return;
        }
        if self.interleaved {
            self.verify_block_int(buf, pattern);
        } else {
            self.verify_block_nint(buf, pattern);
        }
    }

    fn verify_block_int(&mut self, buf: &[u8], pattern: &[u8]) {
        let mut scanned = 0;
        while scanned < self.b_rw {
            let current = buf[self.buf_pos];
            if current == 0 {
                break;
            }
            let idx = Self::ch_pos_int(self.total_bytes, self.channels, self.sample_bytes)
                % pattern.len();
            if current != pattern[idx] {
                self.corrupted = true;
                break;
            }
            self.advance(1, buf.len());
            scanned += 1;
        }
        // On early stop, account for the bytes that were not compared.
        self.advance(self.b_rw - scanned, buf.len());
    }

    fn verify_block_nint(&mut self, buf: &[u8], pattern: &[u8]) {
        let mut scanned = 0;
        while scanned < self.b_rw {
            let current = buf[self.pos_nint(scanned % self.channels)];
            if current == 0 {
                break;
            }
            if current != pattern[(self.total_bytes / self.channels) % pattern.len()] {
                self.corrupted = true;
                break;
            }
            self.advance(1, buf.len());
            scanned += 1;
        }
        self.advance(self.b_rw - scanned, buf.len());
    }

    /// Fill one tick's worth of capture data with the repeating pattern.
    pub fn fill_block_pattern(&mut self, buf: &mut [u8], pattern: &[u8]) {
        if pattern.is_empty() || self.b_rw == 0 {
            return;
        }
        if self.interleaved {
            self.fill_block_pattern_int(buf, pattern);
        } else {
            self.fill_block_pattern_nint(buf, pattern);
        }
    }

    fn fill_block_pattern_int(&mut self, buf: &mut [u8], pattern: &[u8]) {
        for _ in 0..self.b_rw {
            let pos_in_ch =
                Self::ch_pos_int(self.total_bytes, self.channels, self.sample_bytes);
            buf[self.buf_pos] = pattern[pos_in_ch % pattern.len()];
            self.advance(1, buf.len());
        }
    }

    /// Non-interleaved fill writes the channel sub-regions round-robin,
    /// one byte per channel, while the flat position advances by one for
    /// every byte written to any channel. That keeps the simulated
    /// hardware pointer moving at the same rate as interleaved mode.
    fn fill_block_pattern_nint(&mut self, buf: &mut [u8], pattern: &[u8]) {
        for i in 0..self.b_rw {
            buf[self.pos_nint(i % self.channels)] =
                pattern[(self.total_bytes / self.channels) % pattern.len()];
            self.advance(1, buf.len());
        }
    }

    /// Fill one tick's worth of capture data with random bytes.
    pub fn fill_block_random(&mut self, buf: &mut [u8], rng: &mut SmallRng) {
        if self.b_rw == 0 {
            return;
        }
        if self.interleaved {
            self.fill_block_rand_int(buf, rng);
        } else {
            self.fill_block_rand_nint(buf, rng);
        }
    }

    fn fill_block_rand_int(&mut self, buf: &mut [u8], rng: &mut SmallRng) {
        let in_cur_block = buf.len() - self.buf_pos;
        if self.b_rw <= in_cur_block {
            rng.fill_bytes(&mut buf[self.buf_pos..self.buf_pos + self.b_rw]);
        } else {
            // Wraparound: tail of the buffer first, then the head.
            let head = self.b_rw - in_cur_block;
            rng.fill_bytes(&mut buf[self.buf_pos..]);
            rng.fill_bytes(&mut buf[..head]);
        }
        self.advance(self.b_rw, buf.len());
    }

    fn fill_block_rand_nint(&mut self, buf: &mut [u8], rng: &mut SmallRng) {
        let channels = self.channels;
        // Remaining space across all channel sub-regions.
        let bytes_remain = buf.len() - self.buf_pos;
        for chan in 0..channels {
            let start = self.pos_nint(chan);
            if self.b_rw <= bytes_remain {
                rng.fill_bytes(&mut buf[start..start + self.b_rw / channels]);
            } else {
                let tail = bytes_remain / channels;
                let head = (self.b_rw - bytes_remain) / channels;
                rng.fill_bytes(&mut buf[start..start + tail]);
                let block = self.chan_block * chan;
                rng.fill_bytes(&mut buf[block..block + head]);
            }
        }
        self.advance(self.b_rw, buf.len());
    }
}

impl Default for BufferIterator {
    fn default() -> Self {
        Self::new()
    }
}
