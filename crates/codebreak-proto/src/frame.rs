//! Frame type combining header and payload.
//!
//! A `Frame` is the transport-layer packet consisting of:
//! - 16-byte raw binary header (Big Endian)
//! - Variable-length raw bytes (already CBOR-encoded)
//!
//! This is a pure data holder. For the typed message, see
//! `Payload::into_frame()` and `Payload::from_frame()`.

use bytes::{BufMut, Bytes};

use crate::{
    FrameHeader,
    errors::{ProtocolError, Result},
};

/// Complete protocol frame (transport layer)
///
/// Layout on the wire:
/// `[FrameHeader: 16 bytes, raw binary] + [payload: variable bytes]`
///
/// # Invariants
///
/// - Size Consistency: `payload.len()` matches `header.payload_size()`. This
///   invariant is enforced by [`Frame::new`] and verified by [`Frame::decode`].
///
/// - Size Limit: `payload.len()` MUST NOT exceed
///   [`FrameHeader::MAX_PAYLOAD_SIZE`]. Violations are rejected during
///   encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame header (16 bytes)
    pub header: FrameHeader,

    /// Raw payload bytes (already CBOR-encoded)
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame with automatic `payload_size` calculation.
    ///
    /// Does NOT validate the size limit; oversized frames are rejected by
    /// [`Frame::encode`].
    #[must_use]
    pub fn new(mut header: FrameHeader, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();

        // Anything that does not fit in u32 is far above MAX_PAYLOAD_SIZE and
        // fails in encode() regardless of the recorded value.
        let payload_len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
        header.payload_size = payload_len.to_be_bytes();

        Self { header, payload }
    }

    /// Total encoded length (header plus payload).
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        FrameHeader::SIZE + self.payload.len()
    }

    /// Encode frame into buffer.
    ///
    /// Writes: `[header (16 bytes)] + [payload (variable)]`
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if payload exceeds `MAX_PAYLOAD_SIZE`
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        if self.payload.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.payload.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        debug_assert_eq!(self.payload.len(), self.header.payload_size() as usize);

        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.payload);

        Ok(())
    }

    /// Decode frame from wire format.
    ///
    /// Returns a Frame with raw bytes (does NOT deserialize the payload).
    /// Trailing bytes after the payload are ignored.
    ///
    /// # Errors
    ///
    /// - `ProtocolError` if header parsing fails (invalid magic, version, or
    ///   size limits)
    /// - `ProtocolError::FrameTruncated` if the payload is shorter than the
    ///   header claims
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::from_bytes(bytes)?;

        let payload_size = header.payload_size() as usize;
        let total_size = FrameHeader::SIZE + payload_size;

        let payload = bytes.get(FrameHeader::SIZE..total_size).ok_or_else(|| {
            ProtocolError::FrameTruncated {
                expected: payload_size,
                actual: bytes.len().saturating_sub(FrameHeader::SIZE),
            }
        })?;

        Ok(Self { header: *header, payload: Bytes::copy_from_slice(payload) })
    }
}
