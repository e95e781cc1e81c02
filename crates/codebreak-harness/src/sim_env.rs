//! Simulation environment: virtual time and seeded randomness.
//!
//! Time comes from tokio's clock, which turmoil (and `start_paused` tests)
//! drive virtually. Randomness comes from a ChaCha RNG, so a given seed always
//! produces the same peer identifiers.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use codebreak_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic [`Environment`] for simulations.
///
/// Clones share one RNG stream.
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Environment seeded with zero.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment with a specific seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))) }
    }
}

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use codebreak_core::PeerId;

    use super::*;

    #[test]
    fn same_seed_same_ids() {
        let a = SimEnv::with_seed(42);
        let b = SimEnv::with_seed(42);

        assert_eq!(PeerId::random(&a), PeerId::random(&b));
        assert_eq!(PeerId::random(&a), PeerId::random(&b));
    }

    #[test]
    fn clones_share_the_stream() {
        let env = SimEnv::with_seed(7);
        let clone = env.clone();

        assert_ne!(PeerId::random(&env), PeerId::random(&clone));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_uses_virtual_time() {
        let env = SimEnv::new();
        let start = env.now();

        env.sleep(Duration::from_secs(3600)).await;

        assert!(env.now() - start >= Duration::from_secs(3600));
    }
}
