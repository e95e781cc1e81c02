//! Peer identifiers.

use std::fmt;

use crate::env::Environment;

/// Opaque identifier of one participant.
///
/// The session only compares identifiers for equality. What they mean (a
/// socket address, a registry handle) is up to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(String);

impl PeerId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh identifier: 128 random bits as 32 lowercase hex digits.
    pub fn random<E: Environment>(env: &E) -> Self {
        Self(format!("{:032x}", env.random_u128()))
    }

    /// Identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PeerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[derive(Clone)]
    struct CountingEnv;

    impl Environment for CountingEnv {
        type Instant = Instant;

        fn now(&self) -> Instant {
            Instant::now()
        }

        fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            async {}
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = i as u8;
            }
        }
    }

    #[test]
    fn random_ids_are_32_hex_digits() {
        let id = PeerId::random(&CountingEnv);
        insta::assert_snapshot!(id.as_str(), @"000102030405060708090a0b0c0d0e0f");
    }

    #[test]
    fn display_is_the_raw_identifier() {
        let id = PeerId::from("127.0.0.1:7070");
        assert_eq!(id.to_string(), "127.0.0.1:7070");
    }
}
