//! Protocol-level errors for framing and payload encoding.

use thiserror::Error;

/// Result alias used throughout the protocol crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while parsing or building frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer is shorter than a frame header
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum number of bytes required
        expected: usize,
        /// Number of bytes available
        actual: usize,
    },

    /// Header claims more payload than the buffer holds
    #[error("frame truncated: header claims {expected} payload bytes, got {actual}")]
    FrameTruncated {
        /// Payload size claimed by the header
        expected: usize,
        /// Payload bytes actually present
        actual: usize,
    },

    /// Magic number does not match "CBRK"
    #[error("invalid magic number")]
    InvalidMagic,

    /// Protocol version is not supported
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Payload exceeds the protocol limit
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Actual payload size
        size: usize,
        /// Maximum allowed payload size
        max: usize,
    },

    /// Opcode is not part of the protocol
    #[error("unknown opcode: {0:#06x}")]
    UnknownOpcode(u16),

    /// CBOR serialization failed
    #[error("CBOR encode error: {0}")]
    CborEncode(String),

    /// CBOR deserialization failed
    #[error("CBOR decode error: {0}")]
    CborDecode(String),
}
