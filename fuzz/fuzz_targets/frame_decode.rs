//! Fuzz target for Frame::decode
//!
//! Arbitrary bytes must never panic the header or frame parser. Anything that
//! does decode must re-encode to the exact bytes it was read from.

#![no_main]

use codebreak_proto::Frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = Frame::decode(data) else {
        return;
    };

    let mut out = Vec::with_capacity(frame.encoded_len());
    frame.encode(&mut out).expect("decoded frame must re-encode");
    assert_eq!(&out[..], &data[..frame.encoded_len()]);
});
