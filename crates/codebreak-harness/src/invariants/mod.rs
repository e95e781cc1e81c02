//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must hold after every step of a game, no
//! matter how local actions and message deliveries interleave. Example-based
//! tests check one scenario; invariants check every path a property test or
//! simulation happens to explore.
//!
//! # Architecture
//!
//! Observable state of each participant is extracted into a
//! [`SystemSnapshot`] (from a [`codebreak_core::SessionView`] or a
//! [`codebreak_core::Session`]), then every registered [`Invariant`] runs
//! against it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = pair.snapshot();
//! registry.check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

pub use checks::{
    AttemptsBounded, AttemptsConverge, FeedbackMatchesSecret, RolesComplementary, SecretConfined,
};
pub use snapshot::{SessionSnapshot, SystemSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// What went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property checked against system state.
pub trait Invariant: Send + Sync {
    /// Name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Registry with every game invariant.
    ///
    /// - [`RolesComplementary`]: never two codemakers or two codebreakers
    /// - [`SecretConfined`]: the secret only shows on the codemaker side
    /// - [`FeedbackMatchesSecret`]: recorded feedback is the true score
    /// - [`AttemptsBounded`]: attempt count and status agree
    /// - [`AttemptsConverge`]: settled peers hold identical histories
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(RolesComplementary);
        registry.add(SecretConfined);
        registry.add(FeedbackMatchesSecret);
        registry.add(AttemptsBounded);
        registry.add(AttemptsConverge);
        registry
    }

    /// Add an invariant.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Run every invariant, collecting all violations.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Run every invariant and panic with all violations.
    ///
    /// For tests that want immediate failure with context.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
