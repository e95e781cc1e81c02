//! Application layer for Codebreak
//!
//! Async orchestration around the sans-IO session: a generic runtime that
//! executes session actions against a transport, typed observer channels for
//! the UI, and the production pieces (stream framing, system environment).
//! The same runtime runs in production and inside the simulation harness.
//!
//! # Components
//!
//! - [`Runtime`]: event loop owning one session
//! - [`SessionHandle`]: local actions and snapshots for the UI
//! - [`Notice`]: one-off notifications (violations, disconnect, game over)
//! - [`FramedChannel`]: frame channel over any byte stream
//! - [`SystemEnv`]: wall-clock time and OS randomness

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod framed;
mod handle;
mod notice;
mod runtime;
mod system_env;

pub use error::HandleError;
pub use framed::FramedChannel;
pub use handle::SessionHandle;
pub use notice::Notice;
pub use runtime::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_TICK_INTERVAL, Runtime, RuntimeConfig};
pub use system_env::SystemEnv;
