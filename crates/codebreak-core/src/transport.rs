//! Transport adapter abstraction.
//!
//! The session never touches sockets. A [`Transport`] opens or accepts a
//! [`Channel`] to a peer; the channel moves whole frames in order, without
//! loss or duplication, until it closes. Production uses TCP, tests use an
//! in-memory mock or turmoil's simulated network.

use async_trait::async_trait;
use codebreak_proto::Frame;

use crate::{error::TransportError, peer::PeerId};

/// Opens and accepts channels to peers.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Channel type produced by this transport.
    type Channel: Channel;

    /// Open a channel to `peer`.
    ///
    /// Resolving successfully is the "open" event.
    ///
    /// # Errors
    ///
    /// - `TransportError::PeerUnreachable` if nobody answers at `peer`
    async fn open(&self, peer: &PeerId) -> Result<Self::Channel, TransportError>;

    /// Wait for an inbound channel.
    ///
    /// Returns the remote identifier together with the channel.
    async fn accept(&self) -> Result<(PeerId, Self::Channel), TransportError>;
}

/// An open, ordered, reliable frame channel to one peer.
#[async_trait]
pub trait Channel: Send + 'static {
    /// Send one frame.
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Receive the next frame.
    ///
    /// Returns `Ok(None)` once the peer has closed the channel cleanly.
    async fn recv(&mut self) -> Result<Option<Frame>, TransportError>;

    /// Close the channel. Idempotent.
    async fn close(&mut self) -> Result<(), TransportError>;
}
