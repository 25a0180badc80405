//! Move timeline: an append-only log with a navigable cursor.
//!
//! The cursor counts applied plies: `0` shows the starting position and
//! `len()` shows the tip. Positions are reconstructed by replaying the log
//! prefix through the rules oracle, which keeps the log itself trivially
//! simple; games are short enough that O(cursor) replay is fine.

use crate::error::GameError;
use crate::rules::{PlayedMove, RulesBoard};

/// A navigation request relative to the current cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStep {
    First,
    Prev,
    Next,
    Last,
}

#[derive(Debug, Clone)]
pub struct Timeline {
    start_fen: String,
    history: Vec<PlayedMove>,
    cursor: usize,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Empty timeline from the standard starting position.
    pub fn new() -> Self {
        Self {
            start_fen: RulesBoard::startpos().fen(),
            history: Vec::new(),
            cursor: 0,
        }
    }

    /// Empty timeline from an arbitrary starting position.
    pub fn with_start(fen: &str) -> Result<Self, GameError> {
        let board = RulesBoard::from_fen(fen)?;
        Ok(Self {
            start_fen: board.fen(),
            history: Vec::new(),
            cursor: 0,
        })
    }

    /// Timeline holding an already-replayed game, cursor at the tip.
    pub fn from_game(start_fen: String, moves: Vec<PlayedMove>) -> Self {
        let cursor = moves.len();
        Self {
            start_fen,
            history: moves,
            cursor,
        }
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    pub fn history(&self) -> &[PlayedMove] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Number of plies currently shown; `0` is the starting position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn at_tip(&self) -> bool {
        self.cursor == self.history.len()
    }

    /// Append a move at the cursor. When the cursor is rewound this
    /// discards the redo tail first, so the log never diverges from what
    /// the user sees.
    pub fn record(&mut self, mv: PlayedMove) {
        if !self.at_tip() {
            self.history.truncate(self.cursor);
        }
        self.history.push(mv);
        self.cursor = self.history.len();
    }

    /// Cursor a navigation step would land on; always in bounds.
    pub fn target_for(&self, step: NavStep) -> usize {
        match step {
            NavStep::First => 0,
            NavStep::Prev => self.cursor.saturating_sub(1),
            NavStep::Next => (self.cursor + 1).min(self.history.len()),
            NavStep::Last => self.history.len(),
        }
    }

    /// Move the cursor; `history` is untouched.
    pub fn navigate(&mut self, step: NavStep) -> usize {
        self.cursor = self.target_for(step);
        self.cursor
    }

    /// Jump to an absolute ply count. Out-of-range targets are rejected
    /// without moving the cursor.
    pub fn seek(&mut self, ply: usize) -> Result<(), GameError> {
        if ply > self.history.len() {
            return Err(GameError::NavigationOutOfRange {
                index: ply,
                len: self.history.len(),
            });
        }
        self.cursor = ply;
        Ok(())
    }

    /// Reconstruct the position at the cursor by replaying the log prefix.
    pub fn position(&self) -> Result<RulesBoard, GameError> {
        self.position_at(self.cursor)
    }

    /// Reconstruct the position after `ply` moves.
    pub fn position_at(&self, ply: usize) -> Result<RulesBoard, GameError> {
        if ply > self.history.len() {
            return Err(GameError::NavigationOutOfRange {
                index: ply,
                len: self.history.len(),
            });
        }
        let mut board = RulesBoard::from_fen(&self.start_fen)?;
        for (index, mv) in self.history[..ply].iter().enumerate() {
            board.apply_recorded(mv, index)?;
        }
        Ok(board)
    }

    /// The move that produced the currently shown position, if any.
    pub fn last_shown(&self) -> Option<&PlayedMove> {
        self.cursor.checked_sub(1).map(|i| &self.history[i])
    }
}

#[cfg(test)]
#[path = "timeline_tests.rs"]
mod timeline_tests;
