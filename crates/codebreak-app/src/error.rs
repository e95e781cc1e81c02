//! Errors surfaced to callers of a [`crate::SessionHandle`].

use codebreak_core::SessionError;
use thiserror::Error;

/// A command sent through a [`crate::SessionHandle`] failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// The session rejected the action
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The runtime task is no longer running
    #[error("session runtime stopped")]
    Stopped,
}

impl HandleError {
    /// The session error, if the session itself rejected the action.
    pub fn session(&self) -> Option<&SessionError> {
        match self {
            Self::Session(err) => Some(err),
            Self::Stopped => None,
        }
    }
}
