//! Error types for the Codebreak core.
//!
//! One enum per failure category:
//!
//! - [`ValidationError`]: a code the caller supplied is unusable
//! - [`SessionError`]: a local action was rejected by the state machine
//! - [`ProtocolViolation`]: an inbound message was dropped
//! - [`TransportError`]: the byte channel to the peer failed
//! - [`ConfigError`], [`ScoreError`]: construction and scoring preconditions
//!
//! None of these are fatal to the state machine. A rejected action or a
//! dropped message leaves the session record exactly as it was.

use std::io;

use codebreak_proto::{Color, Opcode, ParseCodeError, ProtocolError};
use thiserror::Error;

use crate::session::{Role, SessionStatus};

/// A code failed validation against the game configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Code length differs from the configured number of holes
    #[error("code has {actual} colors, expected {expected}")]
    BadLength {
        /// Configured number of holes
        expected: usize,
        /// Length of the rejected code
        actual: usize,
    },

    /// No colors were selected at all
    #[error("no colors selected")]
    EmptySelection,

    /// Color is outside the palette in use for this game
    #[error("{color} is not among the first {total_colors} colors")]
    ColorOutOfPalette {
        /// Offending color
        color: Color,
        /// Number of colors in play
        total_colors: usize,
    },

    /// Text did not name a color
    #[error("unknown color: {0:?}")]
    UnknownColor(String),
}

impl From<ParseCodeError> for ValidationError {
    fn from(err: ParseCodeError) -> Self {
        match err {
            ParseCodeError::UnknownColor(token) => Self::UnknownColor(token),
        }
    }
}

/// A local action was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The supplied code is invalid
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The secret is write-once
    #[error("secret already locked")]
    AlreadyLocked,

    /// Every attempt has been used
    #[error("all {max} attempts used")]
    AttemptsExhausted {
        /// Configured attempt limit
        max: usize,
    },

    /// Previous attempt has not been scored yet
    #[error("previous attempt is still awaiting feedback")]
    AttemptPending,

    /// Action is not legal for the current role and status
    #[error("cannot {operation} as {role:?} while {status:?}")]
    InvalidState {
        /// Action that was attempted
        operation: &'static str,
        /// Local role at the time
        role: Role,
        /// Local status at the time
        status: SessionStatus,
    },

    /// Peer identifier equals our own
    #[error("cannot connect to self")]
    SelfConnection,

    /// Channel to the peer is gone
    #[error("disconnected: {reason}")]
    Disconnected {
        /// Why the channel closed
        reason: String,
    },
}

impl SessionError {
    /// Returns true if the same action may succeed later or with other input.
    ///
    /// Bad input, an outstanding attempt, or a not-yet-reached state can be
    /// corrected by the caller. Everything else is final for this session.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::AttemptPending | Self::InvalidState { .. })
    }
}

/// An inbound message was dropped without changing the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// Message is not legal for the current role and status
    #[error("unexpected {opcode} as {role:?} while {status:?}")]
    UnexpectedMessage {
        /// Kind of message received
        opcode: Opcode,
        /// Local role at the time
        role: Role,
        /// Local status at the time
        status: SessionStatus,
    },

    /// Opcode is not part of the protocol
    #[error("unknown opcode {0:#06x}")]
    UnknownOpcode(u16),

    /// Frame or payload could not be decoded, or is structurally wrong
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Code carried by the message fails validation
    #[error("invalid code in message: {0}")]
    InvalidCode(ValidationError),

    /// Feedback does not answer the outstanding attempt
    #[error("feedback does not match any outstanding attempt")]
    UnsolicitedResult,
}

impl From<ProtocolError> for ProtocolViolation {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::UnknownOpcode(opcode) => Self::UnknownOpcode(opcode),
            other => Self::Malformed(other.to_string()),
        }
    }
}

/// The channel to the peer failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Nobody answers at that identifier
    #[error("peer unreachable: {0}")]
    PeerUnreachable(String),

    /// Channel closed by either side
    #[error("channel closed")]
    Closed,

    /// Underlying I/O failure
    #[error("transport I/O error: {0}")]
    Io(String),

    /// Byte stream carried something that is not a frame
    #[error("framing error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::Closed,
            _ => Self::Io(err.to_string()),
        }
    }
}

/// A game configuration value is out of range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Value outside its allowed inclusive range
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Name of the setting
        field: &'static str,
        /// Rejected value
        value: usize,
        /// Smallest allowed value
        min: usize,
        /// Largest allowed value
        max: usize,
    },
}

/// Scoring precondition failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// Secret and attempt differ in length
    #[error("secret has {secret} positions, attempt has {attempt}")]
    LengthMismatch {
        /// Secret length
        secret: usize,
        /// Attempt length
        attempt: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_mistakes_are_retryable() {
        assert!(SessionError::AttemptPending.is_retryable());
        assert!(SessionError::Validation(ValidationError::EmptySelection).is_retryable());
        assert!(
            SessionError::InvalidState {
                operation: "submit_attempt",
                role: Role::CodeBreaker,
                status: SessionStatus::AwaitingSecret,
            }
            .is_retryable()
        );
    }

    #[test]
    fn terminal_errors_are_not_retryable() {
        assert!(!SessionError::AlreadyLocked.is_retryable());
        assert!(!SessionError::AttemptsExhausted { max: 10 }.is_retryable());
        assert!(!SessionError::SelfConnection.is_retryable());
        assert!(!SessionError::Disconnected { reason: "peer left".into() }.is_retryable());
    }

    #[test]
    fn unknown_opcode_keeps_its_value() {
        let violation = ProtocolViolation::from(ProtocolError::UnknownOpcode(0x0007));
        assert_eq!(violation, ProtocolViolation::UnknownOpcode(0x0007));

        let violation = ProtocolViolation::from(ProtocolError::CborDecode("eof".into()));
        assert!(matches!(violation, ProtocolViolation::Malformed(_)));
    }

    #[test]
    fn eof_maps_to_closed() {
        let err = TransportError::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert_eq!(err, TransportError::Closed);

        let err = TransportError::from(io::Error::other("boom"));
        assert!(matches!(err, TransportError::Io(_)));
    }

    #[test]
    fn messages_read_naturally() {
        insta::assert_snapshot!(
            ValidationError::BadLength { expected: 4, actual: 3 }.to_string(),
            @"code has 3 colors, expected 4"
        );
        insta::assert_snapshot!(
            ConfigError::OutOfRange { field: "total_holes", value: 9, min: 4, max: 6 }.to_string(),
            @"total_holes must be between 4 and 6, got 9"
        );
    }
}
