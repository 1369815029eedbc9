//! Error types for fftacc-core
//!
//! Every error is non-fatal to the accelerator instance: the state machine
//! validates a request before mutating anything, so the caller may reset and
//! retry after any of these.

use thiserror::Error;

/// Core error type - Copy so it can be carried through register calls cheaply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Register access at an unmapped or misaligned offset
    #[error("invalid register offset 0x{offset:X}")]
    InvalidOffset {
        /// Offset as presented on the bus
        offset: u32,
    },

    /// Register exists but does not support this direction (e.g. writing STATUS)
    #[error("access denied at register offset 0x{offset:X}")]
    AccessDenied {
        /// Offset as presented on the bus
        offset: u32,
    },

    /// SAM or PRC triggered before CFG0 established the sample count
    #[error("accelerator not configured (write CFG0 first)")]
    NotConfigured,

    /// Ingestion past `n_samples` or drain past `n_samples / 2`
    #[error("cursor at {index} would exceed its bound of {limit}")]
    OverCapacity {
        /// Cursor position at the time of the request
        index: u16,
        /// Bound the cursor may not pass
        limit: u16,
    },

    /// Sample count outside 16..=2048 or not a power of two
    #[error("unsupported sample count {0} (must be a power of two in 16..=2048)")]
    UnsupportedSampleCount(u32),

    /// CFG0 rewritten while ingestion or drain is in flight
    #[error("CFG0 cannot change while a session is in progress")]
    SessionInProgress,

    /// A STATUS poll did not observe the expected bits in time
    #[error("timed out waiting for STATUS bits 0x{waiting_for:02X}")]
    Timeout {
        /// STATUS mask the caller was waiting for
        waiting_for: u32,
    },
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            Error::InvalidOffset { offset: 0x18 }.to_string(),
            "invalid register offset 0x18"
        );
        assert_eq!(
            Error::OverCapacity { index: 16, limit: 16 }.to_string(),
            "cursor at 16 would exceed its bound of 16"
        );
        assert_eq!(
            Error::Timeout { waiting_for: 0x4 }.to_string(),
            "timed out waiting for STATUS bits 0x04"
        );
    }
}
