//! Production Environment implementation using system time and RNG.
//!
//! Real `std::time::Instant`, tokio sleeps, and OS randomness via getrandom.
//! Behavior is therefore not reproducible; use the harness `SimEnv` for
//! deterministic runs.

use std::time::Duration;

use codebreak_core::Environment;

/// Production environment using system time and OS randomness.
///
/// # Panics
///
/// Panics if the OS RNG fails. Without entropy no fresh peer identifier can
/// be produced, and the failure indicates a broken host.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}

#[cfg(test)]
mod tests {
    use codebreak_core::PeerId;

    use super::*;

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn time_advances() {
        let env = SystemEnv::new();

        let t1 = env.now();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = env.now();

        assert!(t2 > t1, "Time should advance");
    }

    #[test]
    fn random_peer_ids_differ() {
        let env = SystemEnv::new();

        let a = PeerId::random(&env);
        let b = PeerId::random(&env);

        assert_eq!(a.as_str().len(), 32);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn sleep_waits() {
        let env = SystemEnv::new();

        let start = env.now();
        env.sleep(Duration::from_millis(20)).await;

        assert!(env.now() - start >= Duration::from_millis(20));
    }
}
