//! Caller side of the runtime.
//!
//! A [`SessionHandle`] turns local actions into [`Command`]s and waits for
//! the runtime's reply, so a rejected action comes back as a plain `Err`
//! instead of crossing the event loop.

use codebreak_core::{PeerId, SessionError, SessionView};
use codebreak_proto::Code;
use tokio::sync::{mpsc, oneshot, watch};

use crate::HandleError;

/// Reply slot for one command.
pub(crate) type Reply = oneshot::Sender<Result<(), SessionError>>;

/// Local action queued for the runtime.
#[derive(Debug)]
pub(crate) enum Command {
    Connect { peer: PeerId, reply: Reply },
    SubmitSecret { code: Code, reply: Reply },
    SubmitAttempt { code: Code, reply: Reply },
}

/// Cloneable handle to a running session.
///
/// The runtime stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    pub(crate) fn new(commands: mpsc::Sender<Command>, view: watch::Receiver<SessionView>) -> Self {
        Self { commands, view }
    }

    /// Connect to `peer` as codebreaker.
    ///
    /// Resolves after the transport answered. An unreachable peer comes back
    /// as `SessionError::Disconnected`.
    pub async fn connect(&self, peer: PeerId) -> Result<(), HandleError> {
        self.request(|reply| Command::Connect { peer, reply }).await
    }

    /// Lock the secret (codemaker).
    pub async fn submit_secret(&self, code: Code) -> Result<(), HandleError> {
        self.request(|reply| Command::SubmitSecret { code, reply }).await
    }

    /// Send a guess (codebreaker).
    ///
    /// Resolves once the guess is on the wire, not when it is scored. Watch
    /// the view for the feedback.
    pub async fn submit_attempt(&self, code: Code) -> Result<(), HandleError> {
        self.request(|reply| Command::SubmitAttempt { code, reply }).await
    }

    /// Latest snapshot.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// A receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Wait until the published snapshot satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// - `HandleError::Stopped` if the runtime exits first
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&SessionView) -> bool,
    ) -> Result<SessionView, HandleError> {
        let mut view = self.view.clone();
        let found = view.wait_for(|snapshot| predicate(snapshot)).await;
        found.map(|snapshot| snapshot.clone()).map_err(|_| HandleError::Stopped)
    }

    async fn request(&self, command: impl FnOnce(Reply) -> Command) -> Result<(), HandleError> {
        let (reply, response) = oneshot::channel();
        self.commands.send(command(reply)).await.map_err(|_| HandleError::Stopped)?;
        response.await.map_err(|_| HandleError::Stopped)?.map_err(HandleError::Session)
    }
}
