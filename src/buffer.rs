//! Shared DMA buffer handle.
//!
//! The buffer is owned by the surrounding framework: it hands one in at
//! stream-open time and keeps its own handle to write playback data or
//! read captured data while the tick thread works on the other side.
//! Cloning is cheap; all clones refer to the same bytes.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// A clonable handle to one stream's circular byte buffer.
#[derive(Clone)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
    len: usize,
}

impl SharedBuffer {
    /// Allocate a zeroed buffer of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self {
            bytes: Arc::new(Mutex::new(vec![0u8; len])),
            len,
        }
    }

    /// Wrap existing contents. The length is fixed for the lifetime of
    /// the buffer, like a real DMA region.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        Self {
            bytes: Arc::new(Mutex::new(bytes)),
            len,
        }
    }

    /// Byte length of the buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length buffer.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy `data` into the buffer at `offset`, as the framework does
    /// when the application writes playback frames. Bytes that would
    /// land past the end are cropped; returns the number of bytes
    /// accepted.
    pub fn write_at(&self, offset: usize, data: &[u8]) -> usize {
        if offset >= self.len {
            return 0;
        }
        let to_write = data.len().min(self.len - offset);
        self.bytes.lock()[offset..offset + to_write].copy_from_slice(&data[..to_write]);
        to_write
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock()
    }
}
