//! Plain-text rendering of session state.
//!
//! Pure functions from [`SessionView`] / [`Notice`] to strings, so the
//! console only decides *when* to print.

use std::fmt::Write as _;

use codebreak_app::Notice;
use codebreak_core::{ChannelState, GameConfig, Role, SessionStatus, SessionView};
use codebreak_proto::Peg;

/// Palette and peg legend for a board.
pub fn legend(config: &GameConfig) -> String {
    let colors: Vec<String> = config
        .palette()
        .iter()
        .map(|color| format!("{}({})", color.name(), color.abbreviation()))
        .collect();

    format!(
        "colors: {}\npegs: {} right color and place, {} right color wrong place, {} miss",
        colors.join(" "),
        Peg::Exact.symbol(),
        Peg::Partial.symbol(),
        Peg::Miss.symbol()
    )
}

/// One line describing where the game stands and what to do next.
pub fn status_line(view: &SessionView) -> String {
    if let ChannelState::Closed { reason } = &view.channel
        && !view.status.is_finished()
    {
        return format!("disconnected: {reason}");
    }

    let holes = view.config.total_holes();
    let left = view.attempts_left();
    let peer = view.peer.as_ref().map_or_else(|| "peer".to_string(), ToString::to_string);

    match (view.role, view.status) {
        (Role::Unassigned, _) => "waiting for a codebreaker".to_string(),
        (Role::CodeBreaker, SessionStatus::Unconnected) => format!("connecting to {peer}"),
        (Role::CodeMaker, SessionStatus::Unconnected) => "waiting for a codebreaker".to_string(),
        (Role::CodeMaker, SessionStatus::AwaitingSecret) => {
            format!("{peer} joined; enter a secret of {holes} colors")
        },
        (Role::CodeBreaker, SessionStatus::AwaitingSecret) => {
            format!("connected to {peer}; waiting for the secret")
        },
        (Role::CodeMaker, SessionStatus::Playing) => {
            format!("secret locked; {left} attempts left")
        },
        (Role::CodeBreaker, SessionStatus::Playing) => match &view.pending {
            Some(code) => format!("waiting for feedback on {code}"),
            None => format!("enter a guess of {holes} colors ({left} attempts left)"),
        },
        (_, SessionStatus::Won) => format!("code cracked in {} attempts", view.attempts.len()),
        (Role::CodeMaker, SessionStatus::Exhausted) => "the code held".to_string(),
        (Role::CodeBreaker, SessionStatus::Exhausted) => "out of attempts".to_string(),
    }
}

/// Every scored attempt, one per line, oldest first.
pub fn board(view: &SessionView) -> String {
    let width = view.attempts.iter().map(|a| a.code.to_string().len()).max().unwrap_or(0);

    let mut out = String::new();
    for (index, attempt) in view.attempts.iter().enumerate() {
        let code = attempt.code.to_string();
        let _ = writeln!(out, "{:>2}. {code:<width$}  {}", index + 1, attempt.feedback);
    }

    if let Some(secret) = &view.secret {
        let _ = writeln!(out, "secret: {secret}");
    }

    out
}

/// What changed between two views, or `None` if nothing worth printing did.
pub fn changes(previous: &SessionView, next: &SessionView) -> Option<String> {
    let board_changed = previous.attempts != next.attempts
        || (previous.secret.is_none() && next.secret.is_some());
    let status_changed = previous.role != next.role
        || previous.status != next.status
        || previous.channel != next.channel
        || previous.pending != next.pending;

    if !board_changed && !status_changed {
        return None;
    }

    let mut out = String::new();
    if board_changed {
        out.push_str(&board(next));
    }
    out.push_str(&status_line(next));
    Some(out)
}

/// A notice as one line.
pub fn notice(notice: &Notice) -> String {
    match notice {
        Notice::Violation(violation) => format!("ignored message from peer: {violation}"),
        Notice::Disconnected { reason } => format!("connection lost: {reason}"),
        Notice::GameOver { status: SessionStatus::Won, attempts } => {
            format!("game over: cracked after {attempts} attempts")
        },
        Notice::GameOver { status, attempts } => {
            format!("game over: {status:?} after {attempts} attempts")
        },
    }
}
