//! Game payload types.
//!
//! Only the two attempt messages carry data. `Connect` and `SecretSet` are
//! zero-byte payloads and have no struct here.

use serde::{Deserialize, Serialize};

use crate::{Code, Feedback};

/// Codebreaker asks the codemaker to score a guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptVerify {
    /// The guessed code
    pub code: Code,
}

/// Codemaker's answer to [`AttemptVerify`].
///
/// Echoes the guessed code so the codebreaker can match the answer to its
/// outstanding attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptVerified {
    /// The guessed code, as received
    pub code: Code,
    /// Positional feedback for the guess
    pub feedback: Feedback,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Peg};

    #[test]
    fn attempt_verified_round_trip() {
        let original = AttemptVerified {
            code: Code::new(vec![Color::Red, Color::Blue, Color::Green, Color::Yellow]),
            feedback: Feedback::new(vec![Peg::Exact, Peg::Partial, Peg::Partial, Peg::Exact]),
        };

        let mut encoded = Vec::new();
        ciborium::ser::into_writer(&original, &mut encoded).unwrap();

        let decoded: AttemptVerified = ciborium::de::from_reader(&encoded[..]).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn attempt_verify_rejects_unknown_color_name() {
        #[derive(Serialize)]
        struct Raw {
            code: Vec<&'static str>,
        }

        let mut encoded = Vec::new();
        ciborium::ser::into_writer(&Raw { code: vec!["red", "mauve"] }, &mut encoded).unwrap();

        let decoded: Result<AttemptVerify, _> = ciborium::de::from_reader(&encoded[..]);
        assert!(decoded.is_err());
    }
}
