//! TCP transport.
//!
//! Peer identifiers are `host:port` strings. Each channel is a
//! [`FramedChannel`] over one TCP stream.

use std::net::SocketAddr;

use async_trait::async_trait;
use codebreak_app::FramedChannel;
use codebreak_core::{PeerId, Transport, TransportError};
use tokio::net::{TcpListener, TcpStream};

/// Transport over real TCP sockets.
pub struct TcpTransport {
    listener: Option<TcpListener>,
}

impl TcpTransport {
    /// Listen on `addr` for an incoming codebreaker.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        Ok(Self { listener: Some(listener) })
    }

    /// Transport that only dials out.
    pub fn outbound_only() -> Self {
        Self { listener: None }
    }

    /// Bound address, if listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|listener| listener.local_addr().ok())
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type Channel = FramedChannel<TcpStream>;

    async fn open(&self, peer: &PeerId) -> Result<Self::Channel, TransportError> {
        let stream = TcpStream::connect(peer.as_str())
            .await
            .map_err(|err| TransportError::PeerUnreachable(format!("{peer}: {err}")))?;
        stream.set_nodelay(true)?;

        tracing::info!(%peer, "connected");
        Ok(FramedChannel::new(stream))
    }

    async fn accept(&self) -> Result<(PeerId, Self::Channel), TransportError> {
        let Some(listener) = &self.listener else {
            return std::future::pending().await;
        };

        let (stream, addr) = listener.accept().await?;
        stream.set_nodelay(true)?;

        tracing::info!(peer = %addr, "accepted");
        Ok((PeerId::new(addr.to_string()), FramedChannel::new(stream)))
    }
}

#[cfg(test)]
mod tests {
    use codebreak_core::Channel;
    use codebreak_proto::{Opcode, Payload};

    use super::*;

    #[tokio::test]
    async fn frames_cross_a_socket() {
        let maker = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = maker.local_addr().unwrap();
        let breaker = TcpTransport::outbound_only();

        let mut outbound = breaker.open(&PeerId::new(addr.to_string())).await.unwrap();
        let (_, mut inbound) = maker.accept().await.unwrap();

        outbound.send(Payload::Connect.into_frame().unwrap()).await.unwrap();
        let frame = inbound.recv().await.unwrap().unwrap();
        assert_eq!(frame.header.opcode_enum(), Some(Opcode::Connect));

        outbound.close().await.unwrap();
        assert_eq!(inbound.recv().await, Ok(None));
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let vacated = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = vacated.local_addr().unwrap();
        drop(vacated);

        let result = TcpTransport::outbound_only().open(&PeerId::new(addr.to_string())).await;
        assert!(matches!(result, Err(TransportError::PeerUnreachable(_))));
    }
}
