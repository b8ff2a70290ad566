use thiserror::Error;

use crate::types::DeviceId;

/// Error type for device backend operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to initialize the backend (SDL2 or subsystems).
    #[error("Backend init failed: {0}")]
    BackendInit(String),
    /// The joystick at the given enumeration index could not be opened.
    #[error("Failed to open joystick #{index}: {reason}")]
    OpenFailed { index: u32, reason: String },
    /// Requested device is not open.
    #[error("Device not found: {0}")]
    NotFound(DeviceId),
    /// A generic backend error.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Convenient result alias for device operations.
pub type Result<T> = std::result::Result<T, Error>;
