//! Terminal front-end for Codebreak
//!
//! A thin shell over [`codebreak_app::Runtime`]: a TCP transport, a
//! line-oriented console that turns typed codes into session commands, and
//! plain-text rendering of the session view. All game logic lives in
//! `codebreak-core`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod console;
pub mod render;
pub mod tcp;

pub use console::{Console, ConsoleError};
pub use tcp::TcpTransport;
