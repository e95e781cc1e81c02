//! Codebreak protocol core logic
//!
//! Pure logic for a two-party code-breaking game, completely decoupled from
//! I/O: the scoring engine and the per-participant session state machine.
//!
//! # Architecture
//!
//! The session is a deterministic state machine isolated from I/O, time,
//! randomness, and scheduling. Time is passed in by the caller; transitions
//! return declarative [`session::SessionAction`]s that a runtime or test
//! harness executes. The same code therefore runs unchanged in production,
//! in unit tests, and inside a network simulation with fault injection.
//!
//! # Components
//!
//! - [`scoring`]: feedback computation and win detection
//! - [`session`]: session state machine (roles, turns, attempts, timeout)
//! - [`config`]: game dimensions and session settings
//! - [`peer`]: peer identifiers
//! - [`mod@env`]: environment abstraction (time, RNG)
//! - [`transport`]: transport adapter traits
//! - [`error`]: error taxonomy

pub mod config;
pub mod env;
pub mod error;
pub mod peer;
pub mod scoring;
pub mod session;
pub mod transport;

pub use config::{GameConfig, SessionConfig};
pub use env::Environment;
pub use error::{
    ConfigError, ProtocolViolation, ScoreError, SessionError, TransportError, ValidationError,
};
pub use peer::PeerId;
pub use scoring::{is_winning, score};
pub use session::{
    Attempt, ChannelState, Role, Secret, Session, SessionAction, SessionStatus, SessionView,
};
pub use transport::{Channel, Transport};
