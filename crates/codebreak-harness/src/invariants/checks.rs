//! Standard game invariants.

use codebreak_core::{Role, SessionStatus, is_winning, score};

use super::{Invariant, InvariantResult, SessionSnapshot, SystemSnapshot, Violation};

/// Never two codemakers, never two codebreakers.
pub struct RolesComplementary;

impl Invariant for RolesComplementary {
    fn name(&self) -> &'static str {
        "RolesComplementary"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let count = |role: Role| state.sessions.iter().filter(|s| s.role == role).count();

        for role in [Role::CodeMaker, Role::CodeBreaker] {
            if count(role) > 1 {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{} participants are {role:?}", count(role)),
                });
            }
        }
        Ok(())
    }
}

/// Only the codemaker's view carries the secret.
pub struct SecretConfined;

impl Invariant for SecretConfined {
    fn name(&self) -> &'static str {
        "SecretConfined"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            if session.role != Role::CodeMaker && session.exposed_secret.is_some() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{} ({:?}) exposes the secret", session.id, session.role),
                });
            }
        }
        Ok(())
    }
}

/// Every feedback the codemaker recorded is the true score of its attempt.
///
/// Attempts exist only once the secret is locked.
pub struct FeedbackMatchesSecret;

impl Invariant for FeedbackMatchesSecret {
    fn name(&self) -> &'static str {
        "FeedbackMatchesSecret"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(maker) = state.maker() else {
            return Ok(());
        };

        let Some(secret) = &maker.exposed_secret else {
            if maker.attempts.is_empty() {
                return Ok(());
            }
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} scored attempts without a secret", maker.id),
            });
        };

        for (index, attempt) in maker.attempts.iter().enumerate() {
            let expected = score(secret, &attempt.code).map_err(|err| Violation {
                invariant: self.name(),
                message: format!("attempt {} unscorable: {err}", index + 1),
            })?;

            if expected != attempt.feedback {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "attempt {} ({}) recorded {} but scores {expected}",
                        index + 1,
                        attempt.code,
                        attempt.feedback
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Attempt count and status agree.
///
/// - never more attempts than the configured limit
/// - only the last attempt may be winning, and then the game is `Won`
/// - `Exhausted` means every attempt was used
pub struct AttemptsBounded;

impl AttemptsBounded {
    fn check_session(&self, session: &SessionSnapshot) -> InvariantResult {
        let fail = |message: String| Err(Violation { invariant: self.name(), message });
        let attempts = &session.attempts;

        if attempts.len() > session.max_attempts {
            return fail(format!(
                "{}: {} attempts exceed limit {}",
                session.id,
                attempts.len(),
                session.max_attempts
            ));
        }

        let winning: Vec<bool> =
            attempts.iter().map(|a| is_winning(&a.feedback, session.total_holes)).collect();
        let won_early = winning.iter().rev().skip(1).any(|&w| w);
        let last_wins = winning.last().copied().unwrap_or(false);

        if won_early {
            return fail(format!("{}: attempts continued after a win", session.id));
        }

        let consistent = match session.status {
            SessionStatus::Won => last_wins,
            SessionStatus::Exhausted => !last_wins && attempts.len() == session.max_attempts,
            SessionStatus::Playing => !last_wins && attempts.len() < session.max_attempts,
            SessionStatus::Unconnected | SessionStatus::AwaitingSecret => attempts.is_empty(),
        };

        if consistent {
            Ok(())
        } else {
            fail(format!(
                "{}: status {:?} with {} attempts (last winning: {last_wins})",
                session.id,
                session.status,
                attempts.len()
            ))
        }
    }
}

impl Invariant for AttemptsBounded {
    fn name(&self) -> &'static str {
        "AttemptsBounded"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        state.sessions.iter().try_for_each(|session| self.check_session(session))
    }
}

/// Settled peers on a live channel hold the same history.
///
/// Once nothing is in flight both sides have the same attempts in the same
/// order, the same status, and no unscored attempt.
pub struct AttemptsConverge;

impl Invariant for AttemptsConverge {
    fn name(&self) -> &'static str {
        "AttemptsConverge"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        if !state.settled {
            return Ok(());
        }

        let (Some(maker), Some(breaker)) = (state.maker(), state.breaker()) else {
            return Ok(());
        };

        if maker.channel_closed || breaker.channel_closed {
            return Ok(());
        }

        if maker.attempts != breaker.attempts {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "maker holds {} attempts, breaker holds {}",
                    maker.attempts.len(),
                    breaker.attempts.len()
                ),
            });
        }

        if maker.status != breaker.status {
            return Err(Violation {
                invariant: self.name(),
                message: format!("maker is {:?}, breaker is {:?}", maker.status, breaker.status),
            });
        }

        if let Some(code) = &breaker.pending {
            return Err(Violation {
                invariant: self.name(),
                message: format!("attempt {code} still unscored"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use codebreak_core::{Attempt, PeerId, score};
    use codebreak_proto::{Code, Feedback, Peg};

    use super::*;

    fn code(s: &str) -> Code {
        s.parse().unwrap()
    }

    fn snapshot(role: Role, status: SessionStatus) -> SessionSnapshot {
        SessionSnapshot {
            id: PeerId::from(format!("{role:?}")),
            role,
            status,
            channel_closed: false,
            attempts: Vec::new(),
            pending: None,
            exposed_secret: None,
            max_attempts: 10,
            total_holes: 4,
        }
    }

    fn scored(secret: &Code, guess: &str) -> Attempt {
        let guess = code(guess);
        let feedback = score(secret, &guess).unwrap();
        Attempt { code: guess, feedback }
    }

    #[test]
    fn two_makers_violate_roles() {
        let state = SystemSnapshot::from_sessions(
            vec![
                snapshot(Role::CodeMaker, SessionStatus::AwaitingSecret),
                snapshot(Role::CodeMaker, SessionStatus::AwaitingSecret),
            ],
            true,
        );
        assert!(RolesComplementary.check(&state).is_err());
    }

    #[test]
    fn breaker_with_secret_is_a_leak() {
        let mut breaker = snapshot(Role::CodeBreaker, SessionStatus::Playing);
        breaker.exposed_secret = Some(code("r g b y"));

        let state = SystemSnapshot::from_sessions(vec![breaker], true);
        let violation = SecretConfined.check(&state).unwrap_err();
        insta::assert_snapshot!(violation, @"SecretConfined: CodeBreaker (CodeBreaker) exposes the secret");
    }

    #[test]
    fn forged_feedback_is_caught() {
        let secret = code("r g b y");
        let mut maker = snapshot(Role::CodeMaker, SessionStatus::Playing);
        maker.exposed_secret = Some(secret.clone());
        maker.attempts.push(scored(&secret, "r r r r"));
        assert!(FeedbackMatchesSecret.check(&SystemSnapshot::from_sessions(vec![maker.clone()], true)).is_ok());

        maker.attempts[0].feedback = Feedback::new(vec![Peg::Miss; 4]);
        assert!(FeedbackMatchesSecret.check(&SystemSnapshot::from_sessions(vec![maker], true)).is_err());
    }

    #[test]
    fn won_requires_winning_last_attempt() {
        let secret = code("r g b y");
        let mut maker = snapshot(Role::CodeMaker, SessionStatus::Won);
        maker.attempts.push(scored(&secret, "r r r r"));
        assert!(AttemptsBounded.check(&SystemSnapshot::from_sessions(vec![maker.clone()], true)).is_err());

        maker.attempts.push(scored(&secret, "r g b y"));
        assert!(AttemptsBounded.check(&SystemSnapshot::from_sessions(vec![maker.clone()], true)).is_ok());

        maker.attempts.push(scored(&secret, "r r r r"));
        assert!(AttemptsBounded.check(&SystemSnapshot::from_sessions(vec![maker], true)).is_err());
    }

    #[test]
    fn divergence_only_matters_once_settled() {
        let secret = code("r g b y");
        let mut maker = snapshot(Role::CodeMaker, SessionStatus::Playing);
        maker.attempts.push(scored(&secret, "r r r r"));
        let breaker = snapshot(Role::CodeBreaker, SessionStatus::Playing);

        let in_flight = SystemSnapshot::from_sessions(vec![maker.clone(), breaker.clone()], false);
        assert!(AttemptsConverge.check(&in_flight).is_ok());

        let settled = SystemSnapshot::from_sessions(vec![maker, breaker], true);
        assert!(AttemptsConverge.check(&settled).is_err());
    }
}
