//! Deterministic simulation harness for Codebreak sessions.
//!
//! Seeded implementations of the Environment and Transport traits for
//! reproducible testing, from a pure in-process session pair up to the full
//! runtime over turmoil's simulated network.
//!
//! # Layers
//!
//! - [`SessionPair`]: two sessions driven step by step, no runtime at all
//! - [`MemoryNetwork`]: in-process transport for the real [`codebreak_app::Runtime`]
//! - [`SimTcpTransport`]: turmoil TCP for the runtime under network faults
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioral properties (complementary roles,
//! secret confinement, truthful feedback, converging histories) against
//! snapshots of either layer. Use [`InvariantRegistry::standard()`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod memory_transport;
pub mod session_pair;
pub mod sim_env;
pub mod sim_transport;

pub use invariants::{
    AttemptsBounded, AttemptsConverge, FeedbackMatchesSecret, Invariant, InvariantRegistry,
    InvariantResult, RolesComplementary, SecretConfined, SessionSnapshot, SystemSnapshot,
    Violation,
};
pub use memory_transport::{MemoryChannel, MemoryNetwork, MemoryTransport};
pub use session_pair::{SessionPair, Side};
pub use sim_env::SimEnv;
pub use sim_transport::SimTcpTransport;
