//! Wire format for the Codebreak session protocol.
//!
//! Frames consist of a fixed 16-byte header (zero-copy binary) followed by a
//! variable-length CBOR payload. The header identifies the message kind; the
//! payload carries the codes and feedback exchanged between the two peers.
//!
//! The game vocabulary ([`Color`], [`Code`], [`Peg`], [`Feedback`]) lives here
//! because every message that carries game data is built from it. Both peers
//! and the scoring engine share these types by value.
//!
//! # Security
//!
//! All header parsing uses compile-time verified layouts via `zerocopy`. We
//! enforce a 64 KiB payload limit; a legitimate message is a few dozen bytes.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod code;
pub mod errors;
pub mod frame;
pub mod header;
pub mod opcodes;
pub mod payloads;

pub use code::{Code, Color, Feedback, ParseCodeError, Peg, PegCounts};
pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use header::FrameHeader;
pub use opcodes::Opcode;
pub use payloads::Payload;
