//! Message opcodes.
//!
//! The numeric values are stable on the wire. An opcode outside this set is
//! reported as [`crate::ProtocolError::UnknownOpcode`] and dropped by the
//! receiving session.

use std::fmt;

/// Operation code identifying the payload carried by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    /// Codebreaker announces itself after the channel opens
    Connect = 0x0000,
    /// Codemaker returns the scored attempt
    AttemptVerified = 0x0001,
    /// Codemaker has locked the secret
    SecretSet = 0x0002,
    /// Codebreaker asks for an attempt to be scored
    AttemptVerify = 0x0003,
}

impl Opcode {
    /// Wire representation.
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Parse a wire value. `None` for values outside the protocol.
    #[must_use]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0000 => Some(Self::Connect),
            0x0001 => Some(Self::AttemptVerified),
            0x0002 => Some(Self::SecretSet),
            0x0003 => Some(Self::AttemptVerify),
            _ => None,
        }
    }

    /// Human-readable name used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Connect => "Connect",
            Self::AttemptVerified => "AttemptVerified",
            Self::SecretSet => "SecretSet",
            Self::AttemptVerify => "AttemptVerify",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
