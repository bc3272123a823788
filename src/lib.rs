//! Virtual PCM streaming device for audio-stack testing and fuzzing.
//!
//! `pcmsim` emulates a PCM device without hardware: a timer thread
//! stands in for the DMA engine, advancing a simulated hardware pointer
//! through a circular buffer at the negotiated data rate. The device
//! can:
//!
//! - simulate playback and capture substreams (up to 8 of each),
//! - generate random or pattern-based capture data,
//! - check playback buffers for the looped fill pattern and publish the
//!   verdict through the inspection interface,
//! - inject delays into the simulated transfer and errors into the
//!   `hw_params`/`prepare`/`trigger` callbacks,
//! - record reset control operations,
//! - work in interleaved and non-interleaved layouts with up to 4
//!   channels at 8-48 kHz.
//!
//! With multiple channels the looped pattern is duplicated into every
//! channel: two U8 channels of pattern `abacaba` produce the interleaved
//! stream `aabbaaccaabbaa...`, so each channel independently reads
//! `abacaba...`. The same holds in non-interleaved mode.
//!
//! The playback verifier treats a zero byte as "end of written data",
//! so fill patterns must not contain zeros; see [`pattern`].

pub mod buffer;
pub mod caps;
pub mod card;
pub mod config;
pub mod error;
pub mod inspect;
pub mod iter;
pub mod pattern;
pub mod period;
pub mod session;
pub mod tick;

pub use buffer::SharedBuffer;
pub use caps::{Access, SampleFormat, StreamParams};
pub use card::{VirtualCard, CAPTURE_SUBSTREAMS, DEFAULT_TICKS_PER_SECOND, PLAYBACK_SUBSTREAMS};
pub use config::{FillMode, SimConfig};
pub use error::PcmError;
pub use inspect::Inspect;
pub use iter::BufferIterator;
pub use pattern::{PatternStore, DEFAULT_PATTERN, MAX_PATTERN_LEN};
pub use period::PeriodClock;
pub use session::{Direction, PeriodSink, SessionState, StreamSession, Verdict};
pub use tick::TickDriver;
