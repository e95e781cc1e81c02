//! Scoring engine.
//!
//! Two passes over the attempt. The first credits exact matches and consumes
//! both slots. The second walks the remaining attempt slots in order and
//! credits a partial match while unconsumed secret slots of that color
//! remain. A color therefore never earns more pegs than it appears in the
//! secret.

use codebreak_proto::{Code, Color, Feedback, Peg};

use crate::error::ScoreError;

/// Feedback for `attempt` against `secret`.
///
/// The result has one peg per position: peg `i` describes `attempt[i]`.
///
/// # Errors
///
/// - `ScoreError::LengthMismatch` if the codes differ in length
pub fn score(secret: &Code, attempt: &Code) -> Result<Feedback, ScoreError> {
    if secret.len() != attempt.len() {
        return Err(ScoreError::LengthMismatch { secret: secret.len(), attempt: attempt.len() });
    }

    let mut pegs: Vec<Option<Peg>> = vec![None; attempt.len()];
    let mut remaining = [0usize; Color::PALETTE.len()];

    for (i, (s, a)) in secret.iter().zip(attempt.iter()).enumerate() {
        if s == a {
            pegs[i] = Some(Peg::Exact);
        } else {
            remaining[s.index()] += 1;
        }
    }

    let feedback = pegs
        .into_iter()
        .zip(attempt.iter())
        .map(|(peg, color)| match peg {
            Some(peg) => peg,
            None if remaining[color.index()] > 0 => {
                remaining[color.index()] -= 1;
                Peg::Partial
            },
            None => Peg::Miss,
        })
        .collect();

    Ok(feedback)
}

/// True iff `feedback` has exactly `total_holes` pegs and all are exact.
#[must_use]
pub fn is_winning(feedback: &Feedback, total_holes: usize) -> bool {
    feedback.len() == total_holes && feedback.pegs().iter().all(|peg| *peg == Peg::Exact)
}
