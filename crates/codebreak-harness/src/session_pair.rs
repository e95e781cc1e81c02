//! Sans-IO driver for a codemaker and a codebreaker.
//!
//! Executes [`SessionAction`]s between two in-process sessions without any
//! runtime. Frames queue per direction and are only delivered when the test
//! says so, which makes every interleaving reachable: hold a reply back, drop
//! it, forge one, or let virtual time run past the verify timeout.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use codebreak_core::{
    PeerId, ProtocolViolation, Session, SessionAction, SessionConfig, SessionError, TransportError,
};
use codebreak_proto::{Code, Frame, Payload, ProtocolError};

use crate::invariants::{SessionSnapshot, SystemSnapshot};

/// One end of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The listening side
    Maker,
    /// The connecting side
    Breaker,
}

impl Side {
    /// The opposite end.
    pub fn other(self) -> Self {
        match self {
            Self::Maker => Self::Breaker,
            Self::Breaker => Self::Maker,
        }
    }
}

/// Two sessions wired back to back.
pub struct SessionPair {
    maker: Session,
    breaker: Session,
    to_maker: VecDeque<Frame>,
    to_breaker: VecDeque<Frame>,
    epoch: Instant,
    elapsed: Duration,
    tampered: bool,
}

impl SessionPair {
    /// Fresh, unconnected pair sharing `config`.
    #[allow(clippy::disallowed_methods)]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            maker: Session::new(PeerId::from("maker"), config.clone()),
            breaker: Session::new(PeerId::from("breaker"), config),
            to_maker: VecDeque::new(),
            to_breaker: VecDeque::new(),
            epoch: Instant::now(),
            elapsed: Duration::ZERO,
            tampered: false,
        }
    }

    /// The session on `side`.
    pub fn session(&self, side: Side) -> &Session {
        match side {
            Side::Maker => &self.maker,
            Side::Breaker => &self.breaker,
        }
    }

    /// The codemaker's session.
    pub fn maker(&self) -> &Session {
        &self.maker
    }

    /// The codebreaker's session.
    pub fn breaker(&self) -> &Session {
        &self.breaker
    }

    /// Virtual time.
    pub fn now(&self) -> Instant {
        self.epoch + self.elapsed
    }

    /// Breaker connects to maker. The `Connect` frame is left in flight.
    pub fn connect(&mut self) -> Result<(), SessionError> {
        let maker_id = self.maker.local_id().clone();
        let actions = self.breaker.initiate_connection(maker_id)?;
        self.execute(Side::Breaker, actions);
        Ok(())
    }

    /// Maker commits a secret.
    pub fn submit_secret(&mut self, code: Code) -> Result<(), SessionError> {
        let actions = self.maker.submit_secret(code)?;
        self.execute(Side::Maker, actions);
        Ok(())
    }

    /// Breaker sends a guess.
    pub fn submit_attempt(&mut self, code: Code) -> Result<(), SessionError> {
        let now = self.now();
        let actions = self.breaker.submit_attempt(code, now)?;
        self.execute(Side::Breaker, actions);
        Ok(())
    }

    /// Deliver the oldest frame queued for `side`.
    ///
    /// `None` if nothing is queued.
    pub fn deliver(&mut self, side: Side) -> Option<Result<(), ProtocolViolation>> {
        let frame = self.queue_mut(side).pop_front()?;

        let result = match side {
            Side::Maker => self.maker.handle_frame(&frame),
            Side::Breaker => self.breaker.handle_frame(&frame),
        };

        Some(result.map(|actions| self.execute(side, actions)))
    }

    /// Deliver until both queues are empty, alternating directions.
    ///
    /// Returns the violations raised along the way.
    pub fn deliver_all(&mut self) -> Vec<ProtocolViolation> {
        let mut violations = Vec::new();

        while !self.is_quiet() {
            for side in [Side::Maker, Side::Breaker] {
                if let Some(Err(violation)) = self.deliver(side) {
                    violations.push(violation);
                }
            }
        }

        violations
    }

    /// Lose the oldest frame queued for `side`.
    ///
    /// A lost frame can leave the peers disagreeing for good, so the pair no
    /// longer counts as settled.
    pub fn drop_next(&mut self, side: Side) -> Option<Frame> {
        let frame = self.queue_mut(side).pop_front()?;
        self.tampered = true;
        Some(frame)
    }

    /// Queue a forged message for `side`.
    ///
    /// Once anything is forged the pair no longer counts as settled.
    pub fn inject(&mut self, side: Side, payload: Payload) -> Result<(), ProtocolError> {
        let frame = payload.into_frame()?;
        self.tampered = true;
        self.queue_mut(side).push_back(frame);
        Ok(())
    }

    /// Queue raw bytes for `side` as if they came off the wire.
    pub fn inject_frame(&mut self, side: Side, frame: Frame) {
        self.tampered = true;
        self.queue_mut(side).push_back(frame);
    }

    /// Advance virtual time and tick both sessions.
    pub fn advance(&mut self, by: Duration) {
        self.elapsed += by;
        let now = self.now();

        let actions = self.maker.tick(now);
        self.execute(Side::Maker, actions);

        let actions = self.breaker.tick(now);
        self.execute(Side::Breaker, actions);
    }

    /// `side` hangs up. Frames in flight are lost.
    pub fn hang_up(&mut self, side: Side) {
        self.execute(side, vec![SessionAction::Close { reason: "hung up".into() }]);
    }

    /// Frames queued for `side`.
    pub fn in_flight(&self, side: Side) -> usize {
        match side {
            Side::Maker => self.to_maker.len(),
            Side::Breaker => self.to_breaker.len(),
        }
    }

    /// True when nothing is in flight in either direction.
    pub fn is_quiet(&self) -> bool {
        self.to_maker.is_empty() && self.to_breaker.is_empty()
    }

    /// Snapshot of both sessions.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::from_sessions(
            vec![SessionSnapshot::from(&self.maker), SessionSnapshot::from(&self.breaker)],
            self.is_quiet() && !self.tampered,
        )
    }

    fn session_mut(&mut self, side: Side) -> &mut Session {
        match side {
            Side::Maker => &mut self.maker,
            Side::Breaker => &mut self.breaker,
        }
    }

    fn queue_mut(&mut self, side: Side) -> &mut VecDeque<Frame> {
        match side {
            Side::Maker => &mut self.to_maker,
            Side::Breaker => &mut self.to_breaker,
        }
    }

    fn execute(&mut self, side: Side, actions: Vec<SessionAction>) {
        let mut queue: VecDeque<_> = actions.into_iter().map(|action| (side, action)).collect();

        while let Some((side, action)) = queue.pop_front() {
            match action {
                SessionAction::Open { peer } => {
                    let from = self.session(side).local_id().clone();
                    let target = side.other();

                    let accepted = if self.session(target).local_id() == &peer {
                        self.session_mut(target).connection_accepted(from).is_ok()
                    } else {
                        false
                    };

                    if accepted {
                        match self.session_mut(side).channel_opened() {
                            Ok(more) => queue.extend(more.into_iter().map(|a| (side, a))),
                            Err(err) => tracing::warn!(%err, "channel opened in unexpected state"),
                        }
                    } else {
                        let err = TransportError::PeerUnreachable(peer.to_string());
                        self.session_mut(side).transport_failed(&err);
                    }
                },
                SessionAction::Send(payload) => match payload.into_frame() {
                    Ok(frame) => self.queue_mut(side.other()).push_back(frame),
                    Err(err) => {
                        self.session_mut(side).transport_failed(&TransportError::Protocol(err));
                    },
                },
                SessionAction::Close { reason } => {
                    self.to_maker.clear();
                    self.to_breaker.clear();
                    self.session_mut(side).channel_closed(reason);
                    self.session_mut(side.other()).channel_closed("peer closed the channel");
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use codebreak_core::{ChannelState, Role, SessionStatus};

    use super::*;
    use crate::InvariantRegistry;

    fn code(s: &str) -> Code {
        s.parse().unwrap()
    }

    #[test]
    fn full_game_to_win() {
        let registry = InvariantRegistry::standard();
        let mut pair = SessionPair::new(SessionConfig::default());

        pair.connect().unwrap();
        assert_eq!(pair.in_flight(Side::Maker), 1);
        assert!(pair.deliver_all().is_empty());
        assert_eq!(pair.maker().role(), Role::CodeMaker);
        assert_eq!(pair.breaker().role(), Role::CodeBreaker);

        pair.submit_secret(code("r g b y")).unwrap();
        pair.deliver_all();
        registry.assert_all(&pair.snapshot(), "after secret");

        pair.submit_attempt(code("r r g g")).unwrap();
        pair.deliver_all();
        registry.assert_all(&pair.snapshot(), "after first attempt");

        pair.submit_attempt(code("r g b y")).unwrap();
        pair.deliver_all();
        registry.assert_all(&pair.snapshot(), "after winning attempt");

        assert_eq!(pair.maker().status(), SessionStatus::Won);
        assert_eq!(pair.breaker().status(), SessionStatus::Won);
        assert_eq!(pair.breaker().attempts().len(), 2);
    }

    #[test]
    fn lost_reply_times_out() {
        let mut pair = SessionPair::new(SessionConfig::default());
        pair.connect().unwrap();
        pair.deliver_all();
        pair.submit_secret(code("r g b y")).unwrap();
        pair.deliver_all();

        pair.submit_attempt(code("r r r r")).unwrap();
        pair.deliver(Side::Maker);
        assert!(pair.drop_next(Side::Breaker).is_some());

        pair.advance(Duration::from_secs(10));
        assert_eq!(pair.breaker().channel(), &ChannelState::Open);

        pair.advance(Duration::from_secs(30));
        assert!(pair.breaker().channel().is_closed());
        assert!(pair.maker().channel().is_closed());
        assert_eq!(pair.breaker().pending_attempt(), Some(&code("r r r r")));
    }

    #[test]
    fn forged_feedback_is_dropped() {
        let mut pair = SessionPair::new(SessionConfig::default());
        pair.connect().unwrap();
        pair.deliver_all();
        pair.submit_secret(code("r g b y")).unwrap();
        pair.deliver_all();

        pair.inject(Side::Breaker, Payload::SecretSet).unwrap();
        let violations = pair.deliver_all();

        assert_eq!(violations.len(), 1);
        assert_eq!(pair.breaker().violations(), 1);
        assert_eq!(pair.breaker().status(), SessionStatus::Playing);
        assert!(!pair.snapshot().settled);
    }

    #[test]
    fn hang_up_reaches_both_sides() {
        let mut pair = SessionPair::new(SessionConfig::default());
        pair.connect().unwrap();

        pair.hang_up(Side::Breaker);

        assert!(pair.is_quiet());
        assert!(pair.maker().channel().is_closed());
        assert!(matches!(
            pair.breaker().channel(),
            ChannelState::Closed { reason } if reason == "hung up"
        ));
    }
}
