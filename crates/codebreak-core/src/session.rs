//! Session state machine.
//!
//! Owns one participant's view of a game: role, status, channel phase, the
//! secret (codemaker only) and the attempt list. Uses the action pattern:
//! methods take time as input where they need it and return actions for the
//! driver to execute. Nothing here performs I/O or blocks.
//!
//! # State Machine
//!
//! ```text
//!                 initiate_connection + channel_opened (breaker)
//! ┌─────────────┐       or Connect received (maker)       ┌────────────────┐
//! │ Unconnected │────────────────────────────────────────>│ AwaitingSecret │
//! └─────────────┘                                         └────────────────┘
//!                                                                 │
//!                                 submit_secret / SecretSet       │
//!                                                                 ↓
//!                      ┌─────┐    winning feedback          ┌─────────┐
//!                      │ Won │<─────────────────────────────│ Playing │
//!                      └─────┘                              └─────────┘
//!                                 last attempt not winning        │
//!                   ┌───────────┐                                 │
//!                   │ Exhausted │<────────────────────────────────┘
//!                   └───────────┘
//! ```
//!
//! The channel phase ([`ChannelState`]) runs alongside the status. Once the
//! channel is closed the session is over: local actions fail with
//! [`SessionError::Disconnected`] and inbound messages are violations.
//!
//! # Invariants
//!
//! - Every operation validates before it mutates. A rejected action or a
//!   dropped message leaves the record unchanged (apart from the violation
//!   counter).
//! - The secret is write-once.
//! - At most one attempt is outstanding, so both attempt lists grow in
//!   lock-step.
//! - [`SessionView`] only carries the secret on the codemaker side.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use codebreak_proto::{
    Code, Feedback, Frame, Opcode, Payload,
    payloads::game::{AttemptVerified, AttemptVerify},
};

use crate::{
    config::{GameConfig, SessionConfig},
    error::{ProtocolViolation, SessionError, TransportError},
    peer::PeerId,
    scoring,
};

/// Actions returned by the session state machine.
///
/// The driver (runtime or test harness) executes these:
/// - `Open`: ask the transport for a channel to `peer`, then report the
///   outcome via [`Session::channel_opened`] or [`Session::transport_failed`]
/// - `Send`: encode the payload and write it to the channel
/// - `Close`: close the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open a channel to this peer
    Open {
        /// Peer to connect to
        peer: PeerId,
    },

    /// Send this message to the peer
    Send(Payload),

    /// Close the channel with this reason
    Close {
        /// Reason for closing the channel
        reason: String,
    },
}

/// Local role in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// No role yet
    Unassigned,
    /// Holds the secret and scores attempts
    CodeMaker,
    /// Guesses
    CodeBreaker,
}

/// Game progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// No game yet
    Unconnected,
    /// Roles assigned, secret not locked
    AwaitingSecret,
    /// Secret locked, attempts being exchanged
    Playing,
    /// An attempt matched the secret
    Won,
    /// Every attempt used without a match
    Exhausted,
}

impl SessionStatus {
    /// True for `Won` and `Exhausted`.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Exhausted)
    }
}

/// Connection phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    /// Nothing requested
    Idle,
    /// Open requested, waiting for the transport
    Opening,
    /// Frames can flow
    Open,
    /// Channel is gone for good
    Closed {
        /// Why it closed
        reason: String,
    },
}

impl ChannelState {
    /// True once the channel has closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

/// Write-once secret slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secret {
    code: Option<Code>,
}

impl Secret {
    /// True once a code has been committed.
    pub fn is_locked(&self) -> bool {
        self.code.is_some()
    }

    /// The committed code, if any.
    pub fn code(&self) -> Option<&Code> {
        self.code.as_ref()
    }
}

/// One scored guess.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attempt {
    /// Guessed code
    pub code: Code,
    /// Positional feedback
    pub feedback: Feedback,
}

/// Snapshot of a session for observers.
///
/// Built by [`Session::view`]. The codebreaker's snapshot never contains the
/// secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Our own identifier
    pub local_id: PeerId,
    /// The other participant, once known
    pub peer: Option<PeerId>,
    /// Local role
    pub role: Role,
    /// Game progress
    pub status: SessionStatus,
    /// Connection phase
    pub channel: ChannelState,
    /// Scored attempts in submission order
    pub attempts: Vec<Attempt>,
    /// Attempt sent and not yet scored (codebreaker only)
    pub pending: Option<Code>,
    /// The secret (codemaker only)
    pub secret: Option<Code>,
    /// Inbound messages dropped so far
    pub violations: u64,
    /// Board dimensions
    pub config: GameConfig,
}

impl SessionView {
    /// Attempts the codebreaker may still make.
    pub fn attempts_left(&self) -> usize {
        self.config.max_attempts().saturating_sub(self.attempts.len())
    }
}

#[derive(Debug, Clone)]
struct PendingAttempt<I> {
    code: Code,
    sent_at: I,
}

/// Session state machine
///
/// One instance per participant per game. A finished game is not reset; the
/// application creates a fresh session for the next one.
///
/// Generic over `Instant` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug, Clone)]
pub struct Session<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    local_id: PeerId,
    config: SessionConfig,
    role: Role,
    status: SessionStatus,
    channel: ChannelState,
    peer: Option<PeerId>,
    secret: Secret,
    attempts: Vec<Attempt>,
    pending: Option<PendingAttempt<I>>,
    violations: u64,
}

impl<I> Session<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a session in [`SessionStatus::Unconnected`] with no role.
    pub fn new(local_id: PeerId, config: SessionConfig) -> Self {
        Self {
            local_id,
            config,
            role: Role::Unassigned,
            status: SessionStatus::Unconnected,
            channel: ChannelState::Idle,
            peer: None,
            secret: Secret::default(),
            attempts: Vec::new(),
            pending: None,
            violations: 0,
        }
    }

    /// Our own identifier.
    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    /// Session settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Local role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Game progress.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Connection phase.
    pub fn channel(&self) -> &ChannelState {
        &self.channel
    }

    /// The other participant, once known.
    pub fn peer(&self) -> Option<&PeerId> {
        self.peer.as_ref()
    }

    /// Secret slot. Only ever locked on the codemaker side.
    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    /// Scored attempts in submission order.
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// Attempt sent and not yet scored.
    ///
    /// Still reported after a verify timeout closed the channel, so the UI
    /// can show which guess was lost.
    pub fn pending_attempt(&self) -> Option<&Code> {
        self.pending.as_ref().map(|pending| &pending.code)
    }

    /// Number of inbound messages dropped as violations.
    pub fn violations(&self) -> u64 {
        self.violations
    }

    /// Snapshot for observers.
    pub fn view(&self) -> SessionView {
        SessionView {
            local_id: self.local_id.clone(),
            peer: self.peer.clone(),
            role: self.role,
            status: self.status,
            channel: self.channel.clone(),
            attempts: self.attempts.clone(),
            pending: self.pending_attempt().cloned(),
            secret: match self.role {
                Role::CodeMaker => self.secret.code().cloned(),
                Role::Unassigned | Role::CodeBreaker => None,
            },
            violations: self.violations,
            config: self.config.game,
        }
    }

    /// Start a game as codebreaker by connecting to `peer`.
    ///
    /// Returns `Open { peer }`. Report the transport outcome through
    /// [`Session::channel_opened`] or [`Session::transport_failed`].
    ///
    /// # Errors
    ///
    /// - `SessionError::Disconnected` if the channel already closed
    /// - `SessionError::InvalidState` unless unconnected, unassigned and idle
    /// - `SessionError::SelfConnection` if `peer` is our own identifier
    pub fn initiate_connection(&mut self, peer: PeerId) -> Result<Vec<SessionAction>, SessionError> {
        self.ensure_not_closed()?;

        if self.status != SessionStatus::Unconnected
            || self.role != Role::Unassigned
            || self.channel != ChannelState::Idle
        {
            return Err(self.invalid_state("initiate_connection"));
        }

        if peer == self.local_id {
            return Err(SessionError::SelfConnection);
        }

        tracing::debug!(local = %self.local_id, %peer, "connecting as codebreaker");

        self.role = Role::CodeBreaker;
        self.channel = ChannelState::Opening;
        self.peer = Some(peer.clone());

        Ok(vec![SessionAction::Open { peer }])
    }

    /// The transport opened the channel requested by `Open`.
    ///
    /// Announces ourselves with `Connect` and moves to `AwaitingSecret`.
    ///
    /// # Errors
    ///
    /// - `SessionError::Disconnected` if the channel already closed
    /// - `SessionError::InvalidState` if no open was requested
    pub fn channel_opened(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        self.ensure_not_closed()?;

        if self.role != Role::CodeBreaker || self.channel != ChannelState::Opening {
            return Err(self.invalid_state("channel_opened"));
        }

        self.channel = ChannelState::Open;
        self.status = SessionStatus::AwaitingSecret;

        tracing::debug!(local = %self.local_id, "channel open, sent Connect");

        Ok(vec![SessionAction::Send(Payload::Connect)])
    }

    /// The transport accepted an inbound channel from `peer`.
    ///
    /// Records the peer. The role is assigned when its `Connect` arrives.
    ///
    /// # Errors
    ///
    /// - `SessionError::Disconnected` if the channel already closed
    /// - `SessionError::InvalidState` unless unconnected, unassigned and idle
    pub fn connection_accepted(&mut self, peer: PeerId) -> Result<(), SessionError> {
        self.ensure_not_closed()?;

        if self.status != SessionStatus::Unconnected
            || self.role != Role::Unassigned
            || self.channel != ChannelState::Idle
        {
            return Err(self.invalid_state("accept_connection"));
        }

        tracing::debug!(local = %self.local_id, %peer, "accepted inbound channel");

        self.peer = Some(peer);
        self.channel = ChannelState::Open;

        Ok(())
    }

    /// Commit the secret (codemaker).
    ///
    /// # Errors
    ///
    /// - `SessionError::AlreadyLocked` if a secret was committed before
    /// - `SessionError::Disconnected` if the channel already closed
    /// - `SessionError::InvalidState` unless codemaker in `AwaitingSecret`
    /// - `SessionError::Validation` if `code` does not fit the configuration
    pub fn submit_secret(&mut self, code: Code) -> Result<Vec<SessionAction>, SessionError> {
        if self.secret.is_locked() {
            return Err(SessionError::AlreadyLocked);
        }

        self.ensure_not_closed()?;

        if self.role != Role::CodeMaker || self.status != SessionStatus::AwaitingSecret {
            return Err(self.invalid_state("submit_secret"));
        }

        self.config.game.validate_code(&code)?;

        self.secret = Secret { code: Some(code) };
        self.status = SessionStatus::Playing;

        tracing::debug!(local = %self.local_id, "secret locked");

        Ok(vec![SessionAction::Send(Payload::SecretSet)])
    }

    /// Send a guess to the codemaker (codebreaker).
    ///
    /// # Errors
    ///
    /// - `SessionError::AttemptsExhausted` once every attempt is used
    /// - `SessionError::Disconnected` if the channel already closed
    /// - `SessionError::InvalidState` unless codebreaker in `Playing`
    /// - `SessionError::AttemptPending` while the previous guess is unscored
    /// - `SessionError::Validation` if `code` does not fit the configuration
    pub fn submit_attempt(
        &mut self,
        code: Code,
        now: I,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let max = self.config.game.max_attempts();
        if self.attempts.len() >= max {
            return Err(SessionError::AttemptsExhausted { max });
        }

        self.ensure_not_closed()?;

        if self.role != Role::CodeBreaker || self.status != SessionStatus::Playing {
            return Err(self.invalid_state("submit_attempt"));
        }

        if self.pending.is_some() {
            return Err(SessionError::AttemptPending);
        }

        self.config.game.validate_code(&code)?;

        tracing::debug!(local = %self.local_id, attempt = self.attempts.len() + 1, %code, "attempt sent");

        self.pending = Some(PendingAttempt { code: code.clone(), sent_at: now });

        Ok(vec![SessionAction::Send(Payload::AttemptVerify(AttemptVerify { code }))])
    }

    /// Process an incoming frame.
    ///
    /// # Errors
    ///
    /// Any `ProtocolViolation`. The frame is dropped, the violation counted
    /// and logged, and the session is otherwise unchanged.
    pub fn handle_frame(&mut self, frame: &Frame) -> Result<Vec<SessionAction>, ProtocolViolation> {
        match Payload::from_frame(frame) {
            Ok(payload) => self.handle_payload(payload),
            Err(err) => Err(self.reject(err.into())),
        }
    }

    /// Process an incoming message.
    ///
    /// # Errors
    ///
    /// - `ProtocolViolation::UnexpectedMessage` if illegal for the current
    ///   role, status or channel phase
    /// - `ProtocolViolation::InvalidCode` if a guessed code does not fit the
    ///   configuration
    /// - `ProtocolViolation::UnsolicitedResult` if feedback does not answer
    ///   the outstanding attempt
    /// - `ProtocolViolation::Malformed` if feedback has the wrong length
    pub fn handle_payload(
        &mut self,
        payload: Payload,
    ) -> Result<Vec<SessionAction>, ProtocolViolation> {
        if self.channel.is_closed() {
            return Err(self.reject(self.unexpected(payload.opcode())));
        }

        match payload {
            Payload::Connect => self.on_connect(),
            Payload::SecretSet => self.on_secret_set(),
            Payload::AttemptVerify(msg) => self.on_attempt_verify(msg),
            Payload::AttemptVerified(msg) => self.on_attempt_verified(msg),
        }
    }

    /// Process periodic maintenance (verify timeout).
    ///
    /// Closes the channel if the outstanding attempt has waited longer than
    /// `verify_timeout`. The attempt stays visible via
    /// [`Session::pending_attempt`].
    pub fn tick(&mut self, now: I) -> Vec<SessionAction> {
        if self.channel.is_closed() {
            return Vec::new();
        }

        let Some(pending) = &self.pending else {
            return Vec::new();
        };

        let elapsed = now - pending.sent_at;
        if elapsed <= self.config.verify_timeout {
            return Vec::new();
        }

        let reason = format!("attempt unanswered after {elapsed:?}");
        tracing::warn!(local = %self.local_id, "{reason}");

        self.channel = ChannelState::Closed { reason: reason.clone() };

        vec![SessionAction::Close { reason }]
    }

    /// The channel closed (peer hung up or the driver shut it).
    ///
    /// Idempotent. The first reason wins.
    pub fn channel_closed(&mut self, reason: impl Into<String>) {
        if self.channel.is_closed() {
            return;
        }

        let reason = reason.into();
        tracing::info!(local = %self.local_id, status = ?self.status, "channel closed: {reason}");

        self.channel = ChannelState::Closed { reason };
    }

    /// The transport failed to open the channel or broke mid-session.
    pub fn transport_failed(&mut self, error: &TransportError) {
        tracing::warn!(local = %self.local_id, %error, "transport failed");
        self.channel_closed(error.to_string());
    }

    fn on_connect(&mut self) -> Result<Vec<SessionAction>, ProtocolViolation> {
        let channel_ready = matches!(self.channel, ChannelState::Idle | ChannelState::Open);
        if self.status != SessionStatus::Unconnected
            || self.role != Role::Unassigned
            || !channel_ready
        {
            return Err(self.reject(self.unexpected(Opcode::Connect)));
        }

        self.role = Role::CodeMaker;
        self.status = SessionStatus::AwaitingSecret;
        self.channel = ChannelState::Open;

        tracing::debug!(local = %self.local_id, "peer connected, acting as codemaker");

        Ok(Vec::new())
    }

    fn on_secret_set(&mut self) -> Result<Vec<SessionAction>, ProtocolViolation> {
        if self.role != Role::CodeBreaker || self.status != SessionStatus::AwaitingSecret {
            return Err(self.reject(self.unexpected(Opcode::SecretSet)));
        }

        self.status = SessionStatus::Playing;

        tracing::debug!(local = %self.local_id, "secret set, game on");

        Ok(Vec::new())
    }

    fn on_attempt_verify(
        &mut self,
        msg: AttemptVerify,
    ) -> Result<Vec<SessionAction>, ProtocolViolation> {
        if self.role != Role::CodeMaker
            || self.status != SessionStatus::Playing
            || !self.secret.is_locked()
            || self.attempts.len() >= self.config.game.max_attempts()
        {
            return Err(self.reject(self.unexpected(Opcode::AttemptVerify)));
        }

        if let Err(err) = self.config.game.validate_code(&msg.code) {
            return Err(self.reject(ProtocolViolation::InvalidCode(err)));
        }

        let scored = self.secret.code().map(|secret| scoring::score(secret, &msg.code));
        let feedback = match scored {
            Some(Ok(feedback)) => feedback,
            Some(Err(err)) => return Err(self.reject(ProtocolViolation::Malformed(err.to_string()))),
            None => return Err(self.reject(self.unexpected(Opcode::AttemptVerify))),
        };

        tracing::debug!(local = %self.local_id, code = %msg.code, %feedback, "attempt scored");

        let winning = scoring::is_winning(&feedback, self.config.game.total_holes());
        self.attempts.push(Attempt { code: msg.code.clone(), feedback: feedback.clone() });
        self.status = self.status_after_attempt(winning);

        Ok(vec![SessionAction::Send(Payload::AttemptVerified(AttemptVerified {
            code: msg.code,
            feedback,
        }))])
    }

    fn on_attempt_verified(
        &mut self,
        msg: AttemptVerified,
    ) -> Result<Vec<SessionAction>, ProtocolViolation> {
        if self.role != Role::CodeBreaker || self.status != SessionStatus::Playing {
            return Err(self.reject(self.unexpected(Opcode::AttemptVerified)));
        }

        let answers_pending = self.pending.as_ref().is_some_and(|pending| pending.code == msg.code);
        if !answers_pending {
            return Err(self.reject(ProtocolViolation::UnsolicitedResult));
        }

        let holes = self.config.game.total_holes();
        if msg.feedback.len() != holes {
            return Err(self.reject(ProtocolViolation::Malformed(format!(
                "feedback has {} pegs, expected {holes}",
                msg.feedback.len()
            ))));
        }

        let winning = scoring::is_winning(&msg.feedback, holes);
        self.pending = None;
        self.attempts.push(Attempt { code: msg.code, feedback: msg.feedback });
        self.status = self.status_after_attempt(winning);

        tracing::debug!(
            local = %self.local_id,
            attempts = self.attempts.len(),
            status = ?self.status,
            "feedback received"
        );

        Ok(Vec::new())
    }

    fn status_after_attempt(&self, winning: bool) -> SessionStatus {
        if winning {
            SessionStatus::Won
        } else if self.attempts.len() >= self.config.game.max_attempts() {
            SessionStatus::Exhausted
        } else {
            SessionStatus::Playing
        }
    }

    fn ensure_not_closed(&self) -> Result<(), SessionError> {
        match &self.channel {
            ChannelState::Closed { reason } => {
                Err(SessionError::Disconnected { reason: reason.clone() })
            },
            ChannelState::Idle | ChannelState::Opening | ChannelState::Open => Ok(()),
        }
    }

    fn invalid_state(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState { operation, role: self.role, status: self.status }
    }

    fn unexpected(&self, opcode: Opcode) -> ProtocolViolation {
        ProtocolViolation::UnexpectedMessage { opcode, role: self.role, status: self.status }
    }

    fn reject(&mut self, violation: ProtocolViolation) -> ProtocolViolation {
        self.violations += 1;
        tracing::warn!(
            local = %self.local_id,
            role = ?self.role,
            status = ?self.status,
            %violation,
            "dropping inbound message"
        );
        violation
    }
}
