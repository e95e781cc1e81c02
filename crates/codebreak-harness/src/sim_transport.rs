//! Turmoil-backed transport.
//!
//! Real TCP semantics inside the simulated network: partitions, latency and
//! host crashes all surface as they would in production. Channels are the
//! production [`FramedChannel`] over turmoil streams, so the stream framing
//! is exercised too. Peer identifiers are `host:port` strings.

use async_trait::async_trait;
use codebreak_app::FramedChannel;
use codebreak_core::{PeerId, Transport, TransportError};
use turmoil::net::{TcpListener, TcpStream};

/// Transport over turmoil's simulated TCP.
pub struct SimTcpTransport {
    listener: Option<TcpListener>,
}

impl SimTcpTransport {
    /// Listen on `addr` (for example `0.0.0.0:7070`).
    ///
    /// Must run inside a turmoil host.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        tracing::debug!(%addr, "sim listener bound");
        Ok(Self { listener: Some(listener) })
    }

    /// Transport that can only open channels.
    pub fn outbound_only() -> Self {
        Self { listener: None }
    }
}

#[async_trait]
impl Transport for SimTcpTransport {
    type Channel = FramedChannel<TcpStream>;

    async fn open(&self, peer: &PeerId) -> Result<Self::Channel, TransportError> {
        let stream = TcpStream::connect(peer.as_str())
            .await
            .map_err(|err| TransportError::PeerUnreachable(format!("{peer}: {err}")))?;

        Ok(FramedChannel::new(stream))
    }

    async fn accept(&self) -> Result<(PeerId, Self::Channel), TransportError> {
        let Some(listener) = &self.listener else {
            return std::future::pending().await;
        };

        let (stream, addr) = listener.accept().await?;
        Ok((PeerId::new(addr.to_string()), FramedChannel::new(stream)))
    }
}
