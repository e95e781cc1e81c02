//! Frame channel over any byte stream.
//!
//! Frames are self-delimiting (the header carries the payload length), so a
//! stream only needs to preserve order. Used over TCP in production and over
//! turmoil's simulated TCP in tests.

use async_trait::async_trait;
use bytes::BytesMut;
use codebreak_core::{Channel, TransportError};
use codebreak_proto::{Frame, FrameHeader};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const READ_CHUNK: usize = 4 * 1024;

/// [`Channel`] over an ordered byte stream.
///
/// `recv` is cancel safe: partially read frames stay buffered, so it can sit
/// in a `select!` next to other branches.
pub struct FramedChannel<S> {
    stream: S,
    buffer: BytesMut,
    closed: bool,
}

impl<S> FramedChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wrap a connected stream.
    pub fn new(stream: S) -> Self {
        Self { stream, buffer: BytesMut::with_capacity(READ_CHUNK), closed: false }
    }

    /// Split off the next complete frame, if the buffer holds one.
    fn take_frame(&mut self) -> Result<Option<Frame>, TransportError> {
        if self.buffer.len() < FrameHeader::SIZE {
            return Ok(None);
        }

        let header = FrameHeader::from_bytes(&self.buffer)?;
        let total = FrameHeader::SIZE + header.payload_size() as usize;

        if self.buffer.len() < total {
            self.buffer.reserve(total - self.buffer.len());
            return Ok(None);
        }

        let bytes = self.buffer.split_to(total);
        Ok(Some(Frame::decode(&bytes)?))
    }
}

#[async_trait]
impl<S> Channel for FramedChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        let mut wire = Vec::with_capacity(frame.encoded_len());
        frame.encode(&mut wire)?;

        self.stream.write_all(&wire).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Frame>, TransportError> {
        loop {
            if let Some(frame) = self.take_frame()? {
                return Ok(Some(frame));
            }

            if self.closed {
                return Ok(None);
            }

            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                self.closed = true;
                return if self.buffer.is_empty() { Ok(None) } else { Err(TransportError::Closed) };
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }

        self.closed = true;
        match self.stream.shutdown().await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use codebreak_proto::{Code, Color, Opcode, Payload, payloads::game::AttemptVerify};
    use proptest::prelude::*;
    use tokio::io::duplex;

    use super::*;

    fn attempt_frame() -> Frame {
        Payload::AttemptVerify(AttemptVerify {
            code: Code::new(vec![Color::Red, Color::Green, Color::Blue, Color::Yellow]),
        })
        .into_frame()
        .unwrap()
    }

    #[tokio::test]
    async fn frames_cross_the_stream() {
        let (a, b) = duplex(1024);
        let mut left = FramedChannel::new(a);
        let mut right = FramedChannel::new(b);

        left.send(Payload::Connect.into_frame().unwrap()).await.unwrap();
        left.send(attempt_frame()).await.unwrap();

        let first = right.recv().await.unwrap().unwrap();
        assert_eq!(first.header.opcode_enum(), Some(Opcode::Connect));

        let second = right.recv().await.unwrap().unwrap();
        assert_eq!(second, attempt_frame());
    }

    #[tokio::test]
    async fn clean_close_yields_none() {
        let (a, b) = duplex(1024);
        let mut left = FramedChannel::new(a);
        let mut right = FramedChannel::new(b);

        left.close().await.unwrap();
        left.close().await.unwrap();
        assert_eq!(right.recv().await, Ok(None));
        assert_eq!(left.send(attempt_frame()).await, Err(TransportError::Closed));
    }

    #[tokio::test]
    async fn close_mid_frame_is_an_error() {
        let (mut a, b) = duplex(1024);
        let mut right = FramedChannel::new(b);

        let wire = attempt_frame();
        let mut bytes = Vec::new();
        wire.encode(&mut bytes).unwrap();
        a.write_all(&bytes[..bytes.len() - 1]).await.unwrap();
        drop(a);

        assert_eq!(right.recv().await, Err(TransportError::Closed));
    }

    #[tokio::test]
    async fn garbage_is_a_framing_error() {
        let (mut a, b) = duplex(1024);
        let mut right = FramedChannel::new(b);

        a.write_all(&[0xFF; FrameHeader::SIZE]).await.unwrap();

        assert!(matches!(right.recv().await, Err(TransportError::Protocol(_))));
    }

    proptest! {
        #[test]
        fn reassembles_arbitrary_chunking(cuts in prop::collection::vec(1usize..8, 1..16)) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();

            runtime.block_on(async {
                let mut wire = Vec::new();
                attempt_frame().encode(&mut wire).unwrap();
                Payload::SecretSet.into_frame().unwrap().encode(&mut wire).unwrap();

                let (mut a, b) = duplex(16);
                let mut right = FramedChannel::new(b);

                let writer = tokio::spawn(async move {
                    let mut rest = wire.as_slice();
                    for cut in cuts.iter().cycle() {
                        if rest.is_empty() {
                            break;
                        }
                        let (chunk, tail) = rest.split_at((*cut).min(rest.len()));
                        a.write_all(chunk).await.unwrap();
                        rest = tail;
                    }
                });

                assert_eq!(right.recv().await.unwrap(), Some(attempt_frame()));
                let second = right.recv().await.unwrap().unwrap();
                assert_eq!(second.header.opcode_enum(), Some(Opcode::SecretSet));
                writer.await.unwrap();
            });
        }
    }
}
