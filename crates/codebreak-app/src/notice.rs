//! Discrete session notifications.
//!
//! The view channel carries the latest [`codebreak_core::SessionView`];
//! notices carry the things an observer must not miss between two snapshots.

use codebreak_core::{ProtocolViolation, SessionStatus};

/// One-off event published by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// An inbound message was dropped.
    Violation(ProtocolViolation),

    /// The channel closed before the game finished.
    Disconnected {
        /// Why it closed
        reason: String,
    },

    /// The game reached `Won` or `Exhausted`.
    GameOver {
        /// Final status
        status: SessionStatus,
        /// Attempts played
        attempts: usize,
    },
}
