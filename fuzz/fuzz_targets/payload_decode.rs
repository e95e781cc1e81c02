//! Fuzz target for CBOR payload decoding
//!
//! Wraps arbitrary bytes in a well-formed header for every opcode, including
//! ones outside the protocol, so the fuzzer spends its time in the payload
//! decoder rather than failing the magic check.
//!
//! # Invariants
//!
//! - decoding never panics
//! - a payload that decodes carries the opcode it was framed with

#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use codebreak_proto::{Frame, FrameHeader, Opcode, Payload};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    opcode: u16,
    body: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let mut header = FrameHeader::new(Opcode::Connect);
    header.set_opcode(input.opcode);
    let frame = Frame::new(header, Bytes::from(input.body));

    if let Ok(payload) = Payload::from_frame(&frame) {
        assert_eq!(payload.opcode().to_u16(), input.opcode);
    }
});
