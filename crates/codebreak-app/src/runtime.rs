//! Async runtime for one session.
//!
//! The [`Runtime`] owns a [`Session`] and is the only thing that touches it.
//! Local commands, inbound frames, inbound connections and timer ticks are
//! funnelled through one `select!` loop and applied one at a time, so no two
//! transitions ever interleave. After every event the runtime republishes the
//! session snapshot on a `watch` channel and emits [`Notice`]s for anything
//! an observer must not miss.
//!
//! An accepted inbound channel is only handed to the session once its first
//! frame is `Connect`. A channel that stays silent past `connect_timeout`, or
//! opens with anything else, is closed and the runtime keeps listening.

use std::{collections::VecDeque, time::Duration};

use codebreak_core::{
    Channel, ChannelState, Environment, PeerId, Role, Session, SessionAction, SessionConfig,
    SessionError, SessionStatus, SessionView, Transport, TransportError,
};
use codebreak_proto::{Frame, Opcode, Payload};
use tokio::sync::{mpsc, watch};

use crate::{
    Notice, SessionHandle,
    handle::{Command, Reply},
};

/// Default interval between timeout checks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Default time an inbound channel has to send `Connect`.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Session settings, identical on both peers
    pub session: SessionConfig,
    /// Interval between timeout checks
    pub tick_interval: Duration,
    /// How long an inbound channel may stay silent before it is dropped
    pub connect_timeout: Duration,
    /// Capacity of the command queue
    pub command_buffer: usize,
    /// Capacity of the notice queue; notices beyond it are dropped
    pub notice_buffer: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_buffer: 16,
            notice_buffer: 64,
        }
    }
}

enum Event<C> {
    Command(Option<Command>),
    Frame(Result<Option<Frame>, TransportError>),
    Accepted(Result<(PeerId, C), TransportError>),
    Greeting(Result<Option<Frame>, TransportError>),
    Tick,
}

/// Accepted channel that has not sent `Connect` yet.
struct Inbound<C, I> {
    peer: PeerId,
    channel: C,
    since: I,
}

/// Drives one session over a transport.
///
/// # Type Parameters
///
/// - `T`: Transport used to open and accept channels
/// - `E`: Environment providing time and sleeps
pub struct Runtime<T, E>
where
    T: Transport,
    E: Environment,
{
    transport: T,
    env: E,
    session: Session<E::Instant>,
    channel: Option<T::Channel>,
    inbound: Option<Inbound<T::Channel, E::Instant>>,
    commands: mpsc::Receiver<Command>,
    views: watch::Sender<SessionView>,
    notices: mpsc::Sender<Notice>,
    tick_interval: Duration,
    connect_timeout: Duration,
}

impl<T, E> Runtime<T, E>
where
    T: Transport,
    E: Environment,
{
    /// Create a runtime for the participant `local_id`.
    ///
    /// Returns the runtime (spawn [`Runtime::run`]), a handle for local
    /// actions and snapshots, and the notice stream.
    pub fn new(
        transport: T,
        env: E,
        local_id: PeerId,
        config: RuntimeConfig,
    ) -> (Self, SessionHandle, mpsc::Receiver<Notice>) {
        let session = Session::new(local_id, config.session);
        let (command_tx, commands) = mpsc::channel(config.command_buffer.max(1));
        let (views, view_rx) = watch::channel(session.view());
        let (notices, notice_rx) = mpsc::channel(config.notice_buffer.max(1));

        let runtime = Self {
            transport,
            env,
            session,
            channel: None,
            inbound: None,
            commands,
            views,
            notices,
            tick_interval: config.tick_interval,
            connect_timeout: config.connect_timeout,
        };

        (runtime, SessionHandle::new(command_tx, view_rx), notice_rx)
    }

    /// Run until every [`SessionHandle`] is dropped.
    ///
    /// A closed channel does not stop the loop: later commands are answered
    /// with `SessionError::Disconnected`.
    pub async fn run(mut self) {
        tracing::info!(local = %self.session.local_id(), "session runtime started");

        // One deadline across iterations; traffic must not push it back
        let env = self.env.clone();
        let tick = env.sleep(self.tick_interval);
        tokio::pin!(tick);

        loop {
            let accepting = self.accepting();

            let event = tokio::select! {
                command = self.commands.recv() => Event::Command(command),
                frame = recv_from(&mut self.channel) => Event::Frame(frame),
                greeting = recv_greeting(&mut self.inbound) => Event::Greeting(greeting),
                accepted = accept_when(&self.transport, accepting) => Event::Accepted(accepted),
                () = &mut tick => Event::Tick,
            };

            match event {
                Event::Command(None) => break,
                Event::Command(Some(command)) => self.handle_command(command).await,
                Event::Frame(frame) => self.handle_recv(frame).await,
                Event::Accepted(accepted) => self.handle_accept(accepted),
                Event::Greeting(greeting) => self.handle_greeting(greeting).await,
                Event::Tick => {
                    tick.set(env.sleep(self.tick_interval));
                    self.expire_inbound().await;
                    let actions = self.session.tick(self.env.now());
                    self.execute(actions).await;
                },
            }

            self.publish();
        }

        self.drop_inbound("runtime stopped").await;
        self.drop_channel().await;
        tracing::info!(local = %self.session.local_id(), "session runtime stopped");
    }

    /// Inbound channels are only useful before anyone has claimed a role.
    fn accepting(&self) -> bool {
        self.channel.is_none()
            && self.inbound.is_none()
            && self.session.role() == Role::Unassigned
            && self.session.status() == SessionStatus::Unconnected
            && *self.session.channel() == ChannelState::Idle
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect { peer, reply } => {
                let result = self.session.initiate_connection(peer);
                self.apply(result, reply).await;
            },
            Command::SubmitSecret { code, reply } => {
                let result = self.session.submit_secret(code);
                self.apply(result, reply).await;
            },
            Command::SubmitAttempt { code, reply } => {
                let result = self.session.submit_attempt(code, self.env.now());
                self.apply(result, reply).await;
            },
        }
    }

    /// Execute the actions of an accepted command, then answer the caller.
    async fn apply(&mut self, result: Result<Vec<SessionAction>, SessionError>, reply: Reply) {
        let outcome = match result {
            Ok(actions) => {
                self.execute(actions).await;
                match self.session.channel() {
                    ChannelState::Closed { reason } => {
                        Err(SessionError::Disconnected { reason: reason.clone() })
                    },
                    ChannelState::Idle | ChannelState::Opening | ChannelState::Open => Ok(()),
                }
            },
            Err(err) => {
                tracing::debug!(%err, "local action rejected");
                Err(err)
            },
        };

        // The caller may have given up waiting
        let _ = reply.send(outcome);
    }

    async fn handle_recv(&mut self, frame: Result<Option<Frame>, TransportError>) {
        match frame {
            Ok(Some(frame)) => match self.session.handle_frame(&frame) {
                Ok(actions) => self.execute(actions).await,
                Err(violation) => self.notify(Notice::Violation(violation)),
            },
            Ok(None) => {
                self.channel = None;
                self.session.channel_closed("peer closed the channel");
            },
            Err(err) => self.fail(&err).await,
        }
    }

    fn handle_accept(&mut self, accepted: Result<(PeerId, T::Channel), TransportError>) {
        match accepted {
            Ok((peer, channel)) => {
                tracing::debug!(%peer, "inbound channel waiting for Connect");
                self.inbound = Some(Inbound { peer, channel, since: self.env.now() });
            },
            Err(err) => self.session.transport_failed(&err),
        }
    }

    /// First frame on an accepted channel.
    async fn handle_greeting(&mut self, greeting: Result<Option<Frame>, TransportError>) {
        let frame = match greeting {
            Ok(Some(frame)) if frame.header.opcode_enum() == Some(Opcode::Connect) => frame,
            Ok(Some(frame)) => {
                let reason = format!("opened with opcode {:#06x}", frame.header.opcode());
                self.drop_inbound(&reason).await;
                return;
            },
            Ok(None) => {
                self.drop_inbound("closed before Connect").await;
                return;
            },
            Err(err) => {
                self.drop_inbound(&err.to_string()).await;
                return;
            },
        };

        let Some(Inbound { peer, mut channel, .. }) = self.inbound.take() else {
            return;
        };

        match self.session.connection_accepted(peer.clone()) {
            Ok(()) => {
                self.channel = Some(channel);
                self.handle_recv(Ok(Some(frame))).await;
            },
            Err(err) => {
                tracing::warn!(%peer, %err, "refusing inbound channel");
                let _ = channel.close().await;
            },
        }
    }

    async fn expire_inbound(&mut self) {
        let expired = self
            .inbound
            .as_ref()
            .is_some_and(|inbound| self.env.now() - inbound.since > self.connect_timeout);

        if expired {
            self.drop_inbound("no Connect before the deadline").await;
        }
    }

    async fn drop_inbound(&mut self, reason: &str) {
        let Some(Inbound { peer, mut channel, .. }) = self.inbound.take() else {
            return;
        };

        tracing::warn!(%peer, "dropping inbound channel: {reason}");
        if let Err(err) = channel.close().await {
            tracing::debug!(%err, "error while closing inbound channel");
        }
    }

    async fn execute(&mut self, actions: Vec<SessionAction>) {
        let mut queue = VecDeque::from(actions);

        while let Some(action) = queue.pop_front() {
            match action {
                SessionAction::Open { peer } => match self.transport.open(&peer).await {
                    Ok(channel) => {
                        self.drop_inbound("local connection opened").await;
                        self.channel = Some(channel);
                        match self.session.channel_opened() {
                            Ok(more) => queue.extend(more),
                            Err(err) => tracing::warn!(%err, "channel opened in unexpected state"),
                        }
                    },
                    Err(err) => self.fail(&err).await,
                },
                SessionAction::Send(payload) => self.send(payload).await,
                SessionAction::Close { reason } => {
                    self.drop_channel().await;
                    self.session.channel_closed(reason);
                },
            }
        }
    }

    async fn send(&mut self, payload: Payload) {
        let Some(channel) = self.channel.as_mut() else {
            tracing::warn!(opcode = %payload.opcode(), "no channel to send on");
            return;
        };

        let result = match payload.into_frame() {
            Ok(frame) => channel.send(frame).await,
            Err(err) => Err(TransportError::Protocol(err)),
        };

        if let Err(err) = result {
            self.fail(&err).await;
        }
    }

    async fn fail(&mut self, err: &TransportError) {
        self.drop_channel().await;
        self.session.transport_failed(err);
    }

    async fn drop_channel(&mut self) {
        if let Some(mut channel) = self.channel.take()
            && let Err(err) = channel.close().await
        {
            tracing::debug!(%err, "error while closing channel");
        }
    }

    fn publish(&mut self) {
        let view = self.session.view();

        let (was_finished, was_closed) = {
            let current = self.views.borrow();
            (current.status.is_finished(), current.channel.is_closed())
        };

        if !was_finished && view.status.is_finished() {
            self.notify(Notice::GameOver { status: view.status, attempts: view.attempts.len() });
        }

        if let ChannelState::Closed { reason } = &view.channel
            && !was_closed
            && !view.status.is_finished()
        {
            self.notify(Notice::Disconnected { reason: reason.clone() });
        }

        self.views.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }

    fn notify(&self, notice: Notice) {
        if let Err(err) = self.notices.try_send(notice) {
            tracing::debug!(%err, "notice dropped");
        }
    }
}

async fn recv_from<C: Channel>(channel: &mut Option<C>) -> Result<Option<Frame>, TransportError> {
    match channel {
        Some(channel) => channel.recv().await,
        None => std::future::pending().await,
    }
}

async fn recv_greeting<C: Channel, I>(
    inbound: &mut Option<Inbound<C, I>>,
) -> Result<Option<Frame>, TransportError> {
    match inbound {
        Some(inbound) => inbound.channel.recv().await,
        None => std::future::pending().await,
    }
}

async fn accept_when<T: Transport>(
    transport: &T,
    enabled: bool,
) -> Result<(PeerId, T::Channel), TransportError> {
    if enabled { transport.accept().await } else { std::future::pending().await }
}
