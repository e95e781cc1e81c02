//! In-process mock transport.
//!
//! A [`MemoryNetwork`] is a registry of listening peers. Each bound
//! [`MemoryTransport`] can open channels to any other registered identifier;
//! unknown identifiers fail with `PeerUnreachable`. Frames are encoded to
//! bytes on send and decoded on receive, so the wire format is exercised
//! exactly as over a socket.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use codebreak_core::{Channel, PeerId, Transport, TransportError};
use codebreak_proto::Frame;
use tokio::sync::{Mutex as AsyncMutex, mpsc};

type Incoming = (PeerId, MemoryChannel);

/// Registry of in-memory peers.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    listeners: Arc<Mutex<HashMap<PeerId, mpsc::UnboundedSender<Incoming>>>>,
}

impl MemoryNetwork {
    /// Empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` and return its transport.
    ///
    /// Binding an identifier again replaces the previous listener.
    pub fn bind(&self, id: impl Into<PeerId>) -> MemoryTransport {
        let id = id.into();
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().insert(id.clone(), tx);

        MemoryTransport { id, network: self.clone(), incoming: AsyncMutex::new(rx) }
    }

    /// Remove `id` from the registry. Later opens to it fail.
    pub fn unbind(&self, id: &PeerId) {
        self.lock().remove(id);
    }

    fn listener(&self, id: &PeerId) -> Option<mpsc::UnboundedSender<Incoming>> {
        self.lock().get(id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PeerId, mpsc::UnboundedSender<Incoming>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One peer's endpoint on a [`MemoryNetwork`].
pub struct MemoryTransport {
    id: PeerId,
    network: MemoryNetwork,
    incoming: AsyncMutex<mpsc::UnboundedReceiver<Incoming>>,
}

impl MemoryTransport {
    /// Identifier this transport is bound to.
    pub fn id(&self) -> &PeerId {
        &self.id
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    type Channel = MemoryChannel;

    async fn open(&self, peer: &PeerId) -> Result<MemoryChannel, TransportError> {
        let listener = self
            .network
            .listener(peer)
            .ok_or_else(|| TransportError::PeerUnreachable(peer.to_string()))?;

        let (local, remote) = MemoryChannel::pair();
        listener
            .send((self.id.clone(), remote))
            .map_err(|_| TransportError::PeerUnreachable(peer.to_string()))?;

        tracing::debug!(from = %self.id, to = %peer, "memory channel opened");
        Ok(local)
    }

    async fn accept(&self) -> Result<(PeerId, MemoryChannel), TransportError> {
        self.incoming.lock().await.recv().await.ok_or(TransportError::Closed)
    }
}

/// One end of an in-memory channel.
pub struct MemoryChannel {
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MemoryChannel {
    /// Two connected ends.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();

        (Self { tx: Some(a_tx), rx: b_rx }, Self { tx: Some(b_tx), rx: a_rx })
    }
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;

        let mut wire = Vec::with_capacity(frame.encoded_len());
        frame.encode(&mut wire)?;

        tx.send(wire).map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Result<Option<Frame>, TransportError> {
        match self.rx.recv().await {
            Some(wire) => Ok(Some(Frame::decode(&wire)?)),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        self.rx.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use codebreak_proto::{Opcode, Payload};

    use super::*;

    #[tokio::test]
    async fn open_reaches_the_listener() {
        let network = MemoryNetwork::new();
        let maker = network.bind("maker");
        let breaker = network.bind("breaker");

        let mut outbound = breaker.open(&PeerId::from("maker")).await.unwrap();
        let (from, mut inbound) = maker.accept().await.unwrap();
        assert_eq!(from, PeerId::from("breaker"));

        outbound.send(Payload::Connect.into_frame().unwrap()).await.unwrap();
        let frame = inbound.recv().await.unwrap().unwrap();
        assert_eq!(frame.header.opcode_enum(), Some(Opcode::Connect));
    }

    #[tokio::test]
    async fn unknown_peer_is_unreachable() {
        let network = MemoryNetwork::new();
        let breaker = network.bind("breaker");

        let result = breaker.open(&PeerId::from("nobody")).await;
        assert!(matches!(result, Err(TransportError::PeerUnreachable(_))));

        network.bind("maker");
        network.unbind(&PeerId::from("maker"));
        let result = breaker.open(&PeerId::from("maker")).await;
        assert!(matches!(result, Err(TransportError::PeerUnreachable(_))));
    }

    #[tokio::test]
    async fn close_ends_the_other_side() {
        let (mut a, mut b) = MemoryChannel::pair();

        a.close().await.unwrap();
        assert_eq!(b.recv().await, Ok(None));
        assert_eq!(a.send(Payload::SecretSet.into_frame().unwrap()).await, Err(TransportError::Closed));
    }
}
