//! Fuzz target for scoring
//!
//! # Invariants
//!
//! - `score` never panics, and fails only on a length mismatch
//! - one peg per hole; exact plus partial never exceeds the hole count
//! - feedback is all exact iff the guess equals the secret
//! - exact and partial counts are symmetric in secret and guess

#![no_main]

use arbitrary::Arbitrary;
use codebreak_core::{is_winning, score};
use codebreak_proto::{Code, Color};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    secret: Vec<u8>,
    guess: Vec<u8>,
}

fn code(raw: &[u8]) -> Code {
    raw.iter().take(8).map(|b| Color::PALETTE[usize::from(*b) % Color::PALETTE.len()]).collect()
}

fuzz_target!(|input: Input| {
    let secret = code(&input.secret);
    let guess = code(&input.guess);

    let Ok(feedback) = score(&secret, &guess) else {
        assert_ne!(secret.len(), guess.len());
        return;
    };

    assert_eq!(feedback.len(), secret.len());
    let counts = feedback.counts();
    assert!(counts.exact + counts.partial <= secret.len());
    assert_eq!(is_winning(&feedback, secret.len()), secret == guess);

    let mirrored = score(&guess, &secret).expect("same length scores both ways");
    assert_eq!(mirrored.counts(), counts);
});
