//! Engine evaluation model and line parser.
//!
//! Translates raw engine output lines into a structured evaluation. Parsing
//! is stateless per line and is applied against the side to move *at the
//! time the search was requested*, never at parse time — a position may
//! have changed since the engine started talking.

use std::cmp::Ordering;

use cozy_chess::Color;
use serde::Serialize;

/// What a parsed line contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// A centipawn score update.
    Score,
    /// A forced-mate distance update.
    Mate,
    /// The final move suggestion; the only trigger that should surface a
    /// best move to the UI.
    BestMove,
    /// Anything else; kept only as the latest raw message.
    Other,
}

/// Structured evaluation of the current search. Replaced wholesale when a
/// new search starts, field-by-field as lines arrive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Centipawn score, always from White's perspective.
    pub score_cp: Option<i32>,
    /// Signed forced-mate distance as reported by the engine.
    pub mate_in: Option<i32>,
    /// Side the evaluation favours; `None` when dead level.
    pub favored: Option<Color>,
    /// Final move suggestion in engine notation.
    pub best_move: Option<String>,
    /// Most recent raw line, for diagnostics.
    pub last_message: Option<String>,
}

impl Evaluation {
    /// Apply one engine output line. `side_to_move` must be the mover of
    /// the position the search was issued for.
    pub fn absorb(&mut self, line: &str, side_to_move: Color) -> LineKind {
        let line = line.trim();
        let kind = self.apply(line, side_to_move);
        self.last_message = Some(line.to_string());
        kind
    }

    fn apply(&mut self, line: &str, side_to_move: Color) -> LineKind {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.first() == Some(&"bestmove") {
            self.best_move = tokens
                .get(1)
                .filter(|mv| **mv != "(none)")
                .map(|mv| mv.to_string());
            return LineKind::BestMove;
        }

        let Some(at) = tokens.iter().position(|&t| t == "score") else {
            return LineKind::Other;
        };
        let value = tokens.get(at + 2).and_then(|v| v.parse::<i32>().ok());
        match (tokens.get(at + 1), value) {
            (Some(&"cp"), Some(raw)) => {
                let white_cp = if side_to_move == Color::Black {
                    -raw
                } else {
                    raw
                };
                self.score_cp = Some(white_cp);
                self.favored = match white_cp.cmp(&0) {
                    Ordering::Greater => Some(Color::White),
                    Ordering::Less => Some(Color::Black),
                    Ordering::Equal => None,
                };
                LineKind::Score
            }
            (Some(&"mate"), Some(n)) => {
                self.mate_in = Some(n);
                self.favored = Some(if n > 0 { side_to_move } else { !side_to_move });
                LineKind::Mate
            }
            _ => LineKind::Other,
        }
    }

    /// UI-facing view of this evaluation.
    pub fn snapshot(&self, is_ready: bool) -> EvaluationSnapshot {
        EvaluationSnapshot {
            score_text: self
                .score_cp
                .map(format_score)
                .unwrap_or_else(|| "0.00".to_string()),
            mate_in: self.mate_in.map(|n| n.to_string()),
            favored: self.favored.map(color_char),
            best_move: self.best_move.clone(),
            is_ready,
            game_over: false,
        }
    }
}

/// Render a White-perspective centipawn score as signed pawns (`+0.35`).
pub fn format_score(white_cp: i32) -> String {
    let pawns = (white_cp.abs() as f64) / 100.0;
    match white_cp.cmp(&0) {
        Ordering::Greater => format!("+{pawns:.2}"),
        Ordering::Less => format!("-{pawns:.2}"),
        Ordering::Equal => "0.00".to_string(),
    }
}

fn color_char(color: Color) -> char {
    match color {
        Color::White => 'w',
        Color::Black => 'b',
    }
}

/// Snapshot handed to the front-end after every parsed line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSnapshot {
    /// Signed pawn score from White's perspective, e.g. `+0.35`.
    pub score_text: String,
    /// Forced-mate distance as text, when one was reported.
    pub mate_in: Option<String>,
    /// `'w'` or `'b'`; `None` when no side is favoured.
    pub favored: Option<char>,
    /// Engine's final move suggestion for the analysed position.
    pub best_move: Option<String>,
    /// False until the engine has produced its first line.
    pub is_ready: bool,
    /// The analysed position is checkmate/stalemate/drawn; no further
    /// analysis will arrive.
    pub game_over: bool,
}

impl Default for EvaluationSnapshot {
    fn default() -> Self {
        Self {
            score_text: "0.00".to_string(),
            mate_in: None,
            favored: None,
            best_move: None,
            is_ready: false,
            game_over: false,
        }
    }
}

impl EvaluationSnapshot {
    /// Terminal snapshot for a finished game; `winner` is `None` for
    /// stalemates and draws.
    pub fn finished(winner: Option<Color>) -> Self {
        Self {
            score_text: "-".to_string(),
            mate_in: None,
            favored: winner.map(color_char),
            best_move: None,
            is_ready: true,
            game_over: true,
        }
    }

    /// Share of an evaluation bar that should show as White's, in `0..=1`.
    /// Mirrors the display rule of the reference front-end: a finished game
    /// or a forced mate saturates the bar, otherwise the score is clamped
    /// to ±10 pawns around the midpoint.
    pub fn white_bar_fraction(&self) -> f32 {
        if self.game_over || self.mate_in.is_some() {
            return match self.favored {
                Some('w') => 1.0,
                Some('b') => 0.0,
                _ => 0.5,
            };
        }
        let pawns: f32 = self.score_text.parse().unwrap_or(0.0);
        0.5 + pawns.clamp(-10.0, 10.0) / 20.0
    }
}

#[cfg(test)]
#[path = "evaluation_tests.rs"]
mod evaluation_tests;
