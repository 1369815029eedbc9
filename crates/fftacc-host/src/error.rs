//! Error types for the host access layer

use thiserror::Error;

/// Host layer errors
#[derive(Debug, Error)]
pub enum HostError {
    /// Backend name not recognized
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    /// Malformed or unsupported backend parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No accelerator is attached under this instance id
    #[error("No accelerator instance {0}")]
    NoSuchInstance(u32),

    /// An accelerator is already attached under this instance id
    #[error("Accelerator instance {0} is already attached")]
    DuplicateInstance(u32),

    /// Another session holds the instance
    #[error("Accelerator instance {0} is busy")]
    Busy(u32),

    /// Request code not part of the driver interface
    #[error("Unknown request code 0x{0:02X}")]
    UnknownRequest(u32),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the register file or protocol
    #[error(transparent)]
    Core(#[from] fftacc_core::Error),
}

/// Result type for host operations
pub type Result<T> = std::result::Result<T, HostError>;
