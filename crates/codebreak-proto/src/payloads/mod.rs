//! CBOR-encoded protocol messages.
//!
//! Frame headers are raw binary, payloads use CBOR for type safety and forward
//! compatibility. The `Payload` enum covers every message the two peers
//! exchange.
//!
//! # Invariants
//!
//! Each payload variant maps to exactly one opcode (enforced by match
//! exhaustiveness). Round-trip encoding must produce identical values.

pub mod game;

use bytes::BufMut;

use crate::{
    Frame, FrameHeader, Opcode,
    errors::{ProtocolError, Result},
};

/// All possible frame payloads
///
/// The payload type is determined by the `Opcode` in the frame header, so we
/// serialize only the inner struct content (no variant tag in CBOR).
///
/// # Security
///
/// - No Variant Tag: The frame header's `opcode` field already identifies the
///   payload type. A peer cannot send an opcode/payload pair that disagrees.
///
/// - Exhaustive Matching: Adding a new variant causes compile errors in
///   `encode()`, `decode()`, and `opcode()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Codebreaker announces itself
    Connect,
    /// Codemaker locked the secret
    SecretSet,
    /// Request scoring of a guess
    AttemptVerify(game::AttemptVerify),
    /// Scored guess
    AttemptVerified(game::AttemptVerified),
}

impl Payload {
    /// Opcode corresponding to this payload type.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Connect => Opcode::Connect,
            Self::SecretSet => Opcode::SecretSet,
            Self::AttemptVerify(_) => Opcode::AttemptVerify,
            Self::AttemptVerified(_) => Opcode::AttemptVerified,
        }
    }

    /// Encode payload to buffer
    ///
    /// Serializes only the inner struct, NOT the variant tag.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let mut writer = dst.writer();

        match self {
            Self::Connect | Self::SecretSet => Ok(()), // Zero-byte payloads
            Self::AttemptVerify(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::AttemptVerified(inner) => ciborium::ser::into_writer(inner, &mut writer),
        }
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))
    }

    /// Decode payload from bytes based on opcode
    ///
    /// The size check happens BEFORE CBOR parsing begins.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if bytes exceed `MAX_PAYLOAD_SIZE`
    /// - `ProtocolError::CborDecode` if CBOR deserialization fails
    pub fn decode(opcode: Opcode, bytes: &[u8]) -> Result<Self> {
        if bytes.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: bytes.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        let payload = match opcode {
            Opcode::Connect => Self::Connect,
            Opcode::SecretSet => Self::SecretSet,
            Opcode::AttemptVerify => Self::AttemptVerify(
                ciborium::de::from_reader(bytes)
                    .map_err(|e| ProtocolError::CborDecode(e.to_string()))?,
            ),
            Opcode::AttemptVerified => Self::AttemptVerified(
                ciborium::de::from_reader(bytes)
                    .map_err(|e| ProtocolError::CborDecode(e.to_string()))?,
            ),
        };

        Ok(payload)
    }

    /// Convert payload into a transport frame
    ///
    /// Encodes the payload to CBOR and builds a header with the matching
    /// opcode and payload size.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn into_frame(self) -> Result<Frame> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(Frame::new(FrameHeader::new(self.opcode()), buf))
    }

    /// Parse payload from a raw transport frame
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownOpcode` if the opcode is not part of the
    ///   protocol
    /// - `ProtocolError::CborDecode` if CBOR deserialization fails
    /// - `ProtocolError::PayloadTooLarge` if payload exceeds maximum size
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let opcode = frame
            .header
            .opcode_enum()
            .ok_or(ProtocolError::UnknownOpcode(frame.header.opcode()))?;
        Self::decode(opcode, &frame.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Code, Color, Feedback, Peg};

    #[test]
    fn connect_is_zero_bytes() {
        let frame = Payload::Connect.into_frame().expect("should create frame");
        assert_eq!(frame.header.opcode_enum(), Some(Opcode::Connect));
        assert!(frame.payload.is_empty());

        let decoded = Payload::from_frame(&frame).expect("should parse payload");
        assert_eq!(decoded, Payload::Connect);
    }

    #[test]
    fn attempt_verified_round_trip() {
        let payload = Payload::AttemptVerified(game::AttemptVerified {
            code: Code::new(vec![Color::White, Color::White, Color::White, Color::Blue]),
            feedback: Feedback::new(vec![Peg::Exact, Peg::Exact, Peg::Miss, Peg::Exact]),
        });

        let frame = payload.clone().into_frame().expect("should create frame");
        assert_eq!(frame.header.opcode_enum(), Some(Opcode::AttemptVerified));

        let decoded = Payload::from_frame(&frame).expect("should parse payload");
        assert_eq!(payload, decoded);
    }

    #[test]
    fn unknown_opcode_is_reported() {
        let mut header = FrameHeader::new(Opcode::Connect);
        header.set_opcode(0x0042);
        let frame = Frame::new(header, Vec::new());

        assert_eq!(Payload::from_frame(&frame), Err(ProtocolError::UnknownOpcode(0x0042)));
    }

    #[test]
    fn garbage_payload_is_decode_error() {
        let frame = Frame::new(FrameHeader::new(Opcode::AttemptVerify), vec![0xFF, 0x00, 0x13]);
        assert!(matches!(Payload::from_frame(&frame), Err(ProtocolError::CborDecode(_))));
    }
}
