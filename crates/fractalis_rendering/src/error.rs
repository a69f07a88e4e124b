//! Rendering error types.

use thiserror::Error;

use crate::backend::BufferHandle;
use fractalis_core::ConfigError;

/// Failures reported by a backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The handle was never created or was already released.
    #[error("unknown buffer {0:?}")]
    UnknownBuffer(BufferHandle),

    /// An upload did not match the buffer size exactly.
    #[error("write of {actual} bytes to {handle:?}, which holds {expected} bytes")]
    SizeMismatch {
        /// Target buffer.
        handle: BufferHandle,
        /// Buffer size in bytes.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },

    /// A buffer with no elements or a zero stride was requested.
    #[error("buffer '{label}' requested with zero capacity")]
    ZeroCapacity {
        /// Debug label of the buffer.
        label: String,
    },

    /// The device rejected an operation.
    #[error("device error: {0}")]
    Device(String),
}

/// Errors from renderer setup and per-frame work.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Configuration rejected before anything was allocated.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Backend failure.
    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),
}
