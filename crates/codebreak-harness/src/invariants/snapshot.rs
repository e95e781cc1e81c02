//! Observable state snapshots for invariant checking.
//!
//! Invariants run against snapshots rather than live sessions so that a
//! check always sees one consistent moment.

use std::{ops::Sub, time::Duration};

use codebreak_core::{Attempt, PeerId, Role, Session, SessionStatus, SessionView};
use codebreak_proto::Code;

/// Snapshot of every participant.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-participant snapshots.
    pub sessions: Vec<SessionSnapshot>,
    /// No frames in flight, none ever forged or lost.
    ///
    /// Cross-peer agreement is only required of settled systems.
    pub settled: bool,
}

impl SystemSnapshot {
    /// No participants.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot of several participants.
    pub fn from_sessions(sessions: Vec<SessionSnapshot>, settled: bool) -> Self {
        Self { sessions, settled }
    }

    /// Snapshot of two runtime views taken once both have gone quiet.
    pub fn from_views(a: &SessionView, b: &SessionView) -> Self {
        Self::from_sessions(vec![SessionSnapshot::from(a), SessionSnapshot::from(b)], true)
    }

    /// The codemaker, if any participant took that role.
    pub fn maker(&self) -> Option<&SessionSnapshot> {
        self.sessions.iter().find(|s| s.role == Role::CodeMaker)
    }

    /// The codebreaker, if any participant took that role.
    pub fn breaker(&self) -> Option<&SessionSnapshot> {
        self.sessions.iter().find(|s| s.role == Role::CodeBreaker)
    }
}

/// One participant's observable state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Participant identifier.
    pub id: PeerId,
    /// Local role.
    pub role: Role,
    /// Game progress.
    pub status: SessionStatus,
    /// True once the channel closed.
    pub channel_closed: bool,
    /// Scored attempts.
    pub attempts: Vec<Attempt>,
    /// Unscored attempt.
    pub pending: Option<Code>,
    /// Secret as exposed to observers of this participant.
    pub exposed_secret: Option<Code>,
    /// Configured attempt limit.
    pub max_attempts: usize,
    /// Configured code length.
    pub total_holes: usize,
}

impl From<&SessionView> for SessionSnapshot {
    fn from(view: &SessionView) -> Self {
        Self {
            id: view.local_id.clone(),
            role: view.role,
            status: view.status,
            channel_closed: view.channel.is_closed(),
            attempts: view.attempts.clone(),
            pending: view.pending.clone(),
            exposed_secret: view.secret.clone(),
            max_attempts: view.config.max_attempts(),
            total_holes: view.config.total_holes(),
        }
    }
}

impl<I> From<&Session<I>> for SessionSnapshot
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    fn from(session: &Session<I>) -> Self {
        Self::from(&session.view())
    }
}
