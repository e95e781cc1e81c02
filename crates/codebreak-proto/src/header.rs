//! Frame header implementation with zero-copy parsing.
//!
//! The `FrameHeader` is a fixed 16-byte structure serialized as raw binary
//! (Big Endian). A peer can reject garbage and learn the message kind and
//! payload length before touching the CBOR body.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    Opcode,
    errors::{ProtocolError, Result},
};

/// Fixed 16-byte frame header (Big Endian network byte order)
///
/// Fields are stored as raw byte arrays to avoid alignment issues.
///
/// # Security
///
/// The `#[repr(C, packed)]` layout with zerocopy traits ensures this struct can
/// be safely cast from untrusted network bytes: all 16-byte patterns are valid
/// representations. Semantic checks (magic, version, size limit) happen in
/// [`FrameHeader::from_bytes`].
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    magic: [u8; 4],                   // 0x4342524B ("CBRK" in ASCII)
    version: u8,                      // 0x01
    flags: u8,                        // reserved, zero
    pub(crate) opcode: [u8; 2],       // u16 operation code
    pub(crate) payload_size: [u8; 4], // u32 payload length
    reserved: [u8; 4],
}

impl FrameHeader {
    /// Size of the serialized header (16 bytes)
    pub const SIZE: usize = 16;

    /// Magic number: "CBRK" in ASCII (0x4342524B)
    pub const MAGIC: u32 = 0x4342_524B;

    /// Current protocol version
    pub const VERSION: u8 = 0x01;

    /// Maximum payload size (64 KiB)
    pub const MAX_PAYLOAD_SIZE: u32 = 64 * 1024;

    /// Create a new header with the specified opcode and an empty payload.
    #[must_use]
    pub fn new(opcode: Opcode) -> Self {
        Self {
            magic: Self::MAGIC.to_be_bytes(),
            version: Self::VERSION,
            flags: 0,
            opcode: opcode.to_u16().to_be_bytes(),
            payload_size: [0; 4],
            reserved: [0; 4],
        }
    }

    /// Parse header from network bytes (zero-copy, safe)
    ///
    /// Trailing bytes after the header are ignored.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::FrameTooShort` if buffer is shorter than 16 bytes
    /// - `ProtocolError::InvalidMagic` if magic number is invalid
    /// - `ProtocolError::UnsupportedVersion` if protocol version is unsupported
    /// - `ProtocolError::PayloadTooLarge` if payload size exceeds maximum
    ///
    /// The opcode is NOT validated here. Unknown opcodes still frame correctly
    /// so the receiver can skip the payload and keep the stream in sync.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let header = Self::ref_from_prefix(bytes)
            .map_err(|_| ProtocolError::FrameTooShort {
                expected: Self::SIZE,
                actual: bytes.len(),
            })?
            .0;

        if u32::from_be_bytes(header.magic) != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }

        if header.version != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(header.version));
        }

        let payload_size = u32::from_be_bytes(header.payload_size);
        if payload_size > Self::MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_size as usize,
                max: Self::MAX_PAYLOAD_SIZE as usize,
            });
        }

        Ok(header)
    }

    /// Serialize header to bytes
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }

    /// Magic number (always [`Self::MAGIC`] for parsed headers).
    #[must_use]
    pub fn magic(&self) -> u32 {
        u32::from_be_bytes(self.magic)
    }

    /// Protocol version.
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Reserved flag byte.
    #[must_use]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Raw opcode value.
    #[must_use]
    pub fn opcode(&self) -> u16 {
        u16::from_be_bytes(self.opcode)
    }

    /// Opcode as enum. `None` if the value is not part of the protocol.
    #[must_use]
    pub fn opcode_enum(&self) -> Option<Opcode> {
        Opcode::from_u16(self.opcode())
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn payload_size(&self) -> u32 {
        u32::from_be_bytes(self.payload_size)
    }

    /// Overwrite the raw opcode value.
    pub fn set_opcode(&mut self, opcode: u16) {
        self.opcode = opcode.to_be_bytes();
    }
}

// Manual Debug implementation (can't derive due to packed repr)
impl std::fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHeader")
            .field("magic", &format!("{:#010x}", self.magic()))
            .field("version", &self.version())
            .field("opcode", &format!("{:#06x}", self.opcode()))
            .field("payload_size", &self.payload_size())
            .finish_non_exhaustive()
    }
}

// Manual PartialEq implementation (can't derive due to packed repr)
impl PartialEq for FrameHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FrameHeader {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    impl Arbitrary for FrameHeader {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
            (any::<u16>(), 0u32..=Self::MAX_PAYLOAD_SIZE)
                .prop_map(|(opcode, payload_size)| {
                    let mut header = Self::new(Opcode::Connect);
                    header.set_opcode(opcode);
                    header.payload_size = payload_size.to_be_bytes();
                    header
                })
                .boxed()
        }
    }

    #[test]
    fn header_size() {
        assert_eq!(std::mem::size_of::<FrameHeader>(), FrameHeader::SIZE);
        assert_eq!(FrameHeader::SIZE, 16);
    }

    proptest! {
        #[test]
        fn header_round_trip(header in any::<FrameHeader>()) {
            let bytes = header.to_bytes();
            let parsed = FrameHeader::from_bytes(&bytes).expect("should parse");
            prop_assert_eq!(&header, parsed);
        }
    }

    #[test]
    fn new_header_carries_opcode() {
        let header = FrameHeader::new(Opcode::AttemptVerify);
        assert_eq!(header.magic(), FrameHeader::MAGIC);
        assert_eq!(header.version(), FrameHeader::VERSION);
        assert_eq!(header.flags(), 0);
        assert_eq!(header.opcode_enum(), Some(Opcode::AttemptVerify));
        assert_eq!(header.payload_size(), 0);
    }

    #[test]
    fn unknown_opcode_still_parses() {
        let mut header = FrameHeader::new(Opcode::Connect);
        header.set_opcode(0x00FE);
        let bytes = header.to_bytes();

        let parsed = FrameHeader::from_bytes(&bytes).expect("should parse");
        assert_eq!(parsed.opcode(), 0x00FE);
        assert_eq!(parsed.opcode_enum(), None);
    }

    #[test]
    fn reject_short_buffer() {
        let short_buf = [0u8; 10];
        let result = FrameHeader::from_bytes(&short_buf);
        assert_eq!(result, Err(ProtocolError::FrameTooShort { expected: 16, actual: 10 }));
    }

    #[test]
    fn reject_invalid_magic() {
        let mut buf = [0u8; 16];
        buf[0..4].copy_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
        buf[4] = FrameHeader::VERSION;

        let result = FrameHeader::from_bytes(&buf);
        assert_eq!(result, Err(ProtocolError::InvalidMagic));
    }

    #[test]
    fn reject_invalid_version() {
        let mut buf = [0u8; 16];
        buf[0..4].copy_from_slice(&FrameHeader::MAGIC.to_be_bytes());
        buf[4] = 0xFF;

        let result = FrameHeader::from_bytes(&buf);
        assert_eq!(result, Err(ProtocolError::UnsupportedVersion(0xFF)));
    }

    #[test]
    fn reject_oversized_payload() {
        let mut buf = [0u8; 16];
        buf[0..4].copy_from_slice(&FrameHeader::MAGIC.to_be_bytes());
        buf[4] = FrameHeader::VERSION;

        // payload_size lives at offset 8-11
        let oversized = FrameHeader::MAX_PAYLOAD_SIZE + 1;
        buf[8..12].copy_from_slice(&oversized.to_be_bytes());

        let result = FrameHeader::from_bytes(&buf);
        assert!(matches!(result, Err(ProtocolError::PayloadTooLarge { .. })));
    }
}
