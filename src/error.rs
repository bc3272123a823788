//! Error taxonomy for card and stream operations.

use thiserror::Error;

/// Errors returned by card and stream operations.
///
/// Every failure here is synchronous and one-shot: nothing retries
/// internally, and a failed operation leaves the session in its prior
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PcmError {
    /// The device is busy. Raised by `hw_params` when the corresponding
    /// error-injection toggle is set.
    #[error("device busy")]
    Busy,
    /// The operation is not valid in the current stream state. Also
    /// raised by `prepare` when its error-injection toggle is set.
    #[error("invalid stream state")]
    InvalidState,
    /// Rejected stream parameters, or an injected trigger failure.
    #[error("invalid argument")]
    InvalidArgument,
    /// All substreams of the requested direction are already open.
    #[error("no free substream")]
    NoFreeSubstream,
    /// A session resource (tick thread) could not be allocated.
    #[error("allocation failed")]
    Alloc,
}
