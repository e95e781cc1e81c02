//! Fuzz target for session message handling
//!
//! Brings a codemaker and a codebreaker to `Playing`, then feeds both sides an
//! arbitrary mix of honest traffic, raw bytes and crafted payloads.
//!
//! # Invariants
//!
//! - no input panics either session
//! - a rejected frame leaves the session exactly as it was
//! - the codebreaker never learns the secret
//! - the codemaker's recorded feedback is always the true score

#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use codebreak_core::{PeerId, Role, Session, SessionAction, SessionConfig, score};
use codebreak_proto::{
    Code, Color, Feedback, Frame, Payload, Peg,
    payloads::game::{AttemptVerified, AttemptVerify},
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Target {
    Maker,
    Breaker,
}

#[derive(Debug, Arbitrary)]
enum Op {
    Guess(Vec<u8>),
    Reply,
    RawBytes(Target, Vec<u8>),
    Connect(Target),
    SecretSet(Target),
    Verify(Target, Vec<u8>),
    Verified(Target, Vec<u8>, Vec<u8>),
    Tick(u8),
}

fn code(raw: &[u8]) -> Code {
    raw.iter().take(8).map(|b| Color::PALETTE[usize::from(*b) % Color::PALETTE.len()]).collect()
}

fn feedback(raw: &[u8]) -> Feedback {
    const PEGS: [Peg; 3] = [Peg::Exact, Peg::Partial, Peg::Miss];
    Feedback::new(raw.iter().take(8).map(|b| PEGS[usize::from(*b) % PEGS.len()]).collect())
}

fn sent(actions: Vec<SessionAction>) -> Vec<Frame> {
    actions
        .into_iter()
        .filter_map(|action| match action {
            SessionAction::Send(payload) => payload.into_frame().ok(),
            _ => None,
        })
        .collect()
}

fn deliver(session: &mut Session, frame: &Frame) -> Vec<Frame> {
    let before = session.view();
    match session.handle_frame(frame) {
        Ok(actions) => sent(actions),
        Err(_) => {
            let after = session.view();
            assert_eq!(after.violations, before.violations + 1);
            assert_eq!(after.status, before.status);
            assert_eq!(after.attempts, before.attempts);
            assert_eq!(after.pending, before.pending);
            Vec::new()
        },
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let start = Instant::now();
    let mut now = start;
    let secret = code(&[0, 1, 2, 4]);

    let mut maker = Session::new(PeerId::from("maker"), SessionConfig::default());
    let mut breaker = Session::new(PeerId::from("breaker"), SessionConfig::default());

    breaker.initiate_connection(PeerId::from("maker")).expect("fresh session connects");
    maker.connection_accepted(PeerId::from("breaker")).expect("fresh session accepts");
    for frame in sent(breaker.channel_opened().expect("channel opens")) {
        deliver(&mut maker, &frame);
    }
    for frame in sent(maker.submit_secret(secret.clone()).expect("valid secret")) {
        deliver(&mut breaker, &frame);
    }

    let mut to_maker: Vec<Frame> = Vec::new();
    let mut to_breaker: Vec<Frame> = Vec::new();

    for op in ops {
        let (target, payload) = match op {
            Op::Guess(raw) => {
                if let Ok(actions) = breaker.submit_attempt(code(&raw), now) {
                    to_maker.extend(sent(actions));
                }
                continue;
            },
            Op::Reply => {
                for frame in std::mem::take(&mut to_maker) {
                    to_breaker.extend(deliver(&mut maker, &frame));
                }
                for frame in std::mem::take(&mut to_breaker) {
                    to_maker.extend(deliver(&mut breaker, &frame));
                }
                continue;
            },
            Op::RawBytes(target, bytes) => {
                if let Ok(frame) = Frame::decode(&bytes) {
                    match target {
                        Target::Maker => to_breaker.extend(deliver(&mut maker, &frame)),
                        Target::Breaker => to_maker.extend(deliver(&mut breaker, &frame)),
                    }
                }
                continue;
            },
            Op::Tick(secs) => {
                now = start + Duration::from_secs(u64::from(secs));
                maker.tick(now);
                breaker.tick(now);
                continue;
            },
            Op::Connect(target) => (target, Payload::Connect),
            Op::SecretSet(target) => (target, Payload::SecretSet),
            Op::Verify(target, raw) => (target, Payload::AttemptVerify(AttemptVerify { code: code(&raw) })),
            Op::Verified(target, raw, pegs) => (
                target,
                Payload::AttemptVerified(AttemptVerified { code: code(&raw), feedback: feedback(&pegs) }),
            ),
        };

        let Ok(frame) = payload.into_frame() else {
            continue;
        };
        match target {
            Target::Maker => to_breaker.extend(deliver(&mut maker, &frame)),
            Target::Breaker => to_maker.extend(deliver(&mut breaker, &frame)),
        }
    }

    assert_eq!(maker.role(), Role::CodeMaker);
    assert_eq!(breaker.role(), Role::CodeBreaker);
    assert!(breaker.view().secret.is_none());
    for attempt in maker.attempts() {
        assert_eq!(score(&secret, &attempt.code).ok().as_ref(), Some(&attempt.feedback));
    }
});
