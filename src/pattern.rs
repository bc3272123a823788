//! Shared repeating fill/verify pattern.
//!
//! One `PatternStore` is shared by every stream of a card. Writes come
//! from the inspection interface while verify/fill steps read it, so the
//! bytes live behind a lock. A verify that races a pattern update may
//! compare against a half-updated pattern and spuriously fail; that is a
//! known limitation of the device, not something the store guards
//! against.
//!
//! The playback verifier treats a zero byte in the DMA buffer as
//! "no data written yet", so a usable pattern must never contain zero
//! bytes. The store does not reject them; choosing a zero-free pattern
//! is the caller's responsibility.

use parking_lot::RwLock;

/// Capacity of the pattern buffer in bytes.
pub const MAX_PATTERN_LEN: usize = 4096;

/// Pattern installed at card creation.
pub const DEFAULT_PATTERN: &[u8] = b"abacaba";

struct PatternBuf {
    bytes: Box<[u8; MAX_PATTERN_LEN]>,
    len: usize,
}

/// Process-wide repeating byte pattern with truncating write semantics.
pub struct PatternStore {
    inner: RwLock<PatternBuf>,
}

impl PatternStore {
    /// Create a store holding the default pattern.
    pub fn new() -> Self {
        let mut bytes = Box::new([0u8; MAX_PATTERN_LEN]);
        bytes[..DEFAULT_PATTERN.len()].copy_from_slice(DEFAULT_PATTERN);
        Self {
            inner: RwLock::new(PatternBuf {
                bytes,
                len: DEFAULT_PATTERN.len(),
            }),
        }
    }

    /// Copy `data` into the pattern starting at `offset`, silently
    /// cropping everything that falls beyond the capacity. Returns the
    /// number of bytes actually accepted.
    ///
    /// A successful write moves the effective pattern length to
    /// `offset + accepted`, so writing a short pattern after a long one
    /// truncates the old tail.
    pub fn write(&self, offset: usize, data: &[u8]) -> usize {
        if offset >= MAX_PATTERN_LEN {
            return 0;
        }
        let to_write = data.len().min(MAX_PATTERN_LEN - offset);
        if to_write == 0 {
            return 0;
        }
        let mut buf = self.inner.write();
        buf.bytes[offset..offset + to_write].copy_from_slice(&data[..to_write]);
        buf.len = offset + to_write;
        to_write
    }

    /// Copy up to `out.len()` pattern bytes starting at `offset` into
    /// `out`, capped at the stored length. Returns the number of bytes
    /// copied; zero at end-of-pattern.
    pub fn read(&self, offset: usize, out: &mut [u8]) -> usize {
        let buf = self.inner.read();
        if offset >= buf.len {
            return 0;
        }
        let to_read = out.len().min(buf.len - offset);
        out[..to_read].copy_from_slice(&buf.bytes[offset..offset + to_read]);
        to_read
    }

    /// Effective pattern length in bytes.
    pub fn len(&self) -> usize {
        self.inner.read().len
    }

    /// True when the stored pattern is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` with the current pattern bytes under the read lock.
    ///
    /// Used by the tick step so one fill/verify block sees a single
    /// consistent pattern snapshot without copying it.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let buf = self.inner.read();
        f(&buf.bytes[..buf.len])
    }
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new()
    }
}
