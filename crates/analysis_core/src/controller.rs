//! Interaction controller: the single mutation gate for game state.
//!
//! Every board input (drop, click, navigation, load, reset) goes through
//! `BoardController`. Moves are validated against the rules oracle before
//! anything is committed; a rejected operation leaves the timeline and the
//! shown position exactly as they were.

use cozy_chess::Square;

use crate::error::GameError;
use crate::pgn;
use crate::rules::{GameEnd, MoveInput, PlayedMove, RulesBoard};
use crate::timeline::{NavStep, Timeline};

/// Result of a click-to-move interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The click completed a move.
    Moved(PlayedMove),
    /// The click selected one of the mover's pieces.
    Selected {
        square: Square,
        targets: Vec<Square>,
    },
    /// The click cleared a previous selection.
    Cleared,
    /// The click hit nothing actionable.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct BoardController {
    timeline: Timeline,
    /// Position at the timeline cursor; kept in lockstep with it.
    board: RulesBoard,
    /// Pending origin square for click-to-move.
    selection: Option<Square>,
}

impl Default for BoardController {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardController {
    pub fn new() -> Self {
        Self {
            timeline: Timeline::new(),
            board: RulesBoard::startpos(),
            selection: None,
        }
    }

    pub fn board(&self) -> &RulesBoard {
        &self.board
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn fen(&self) -> String {
        self.board.fen()
    }

    pub fn game_end(&self) -> Option<GameEnd> {
        self.board.game_end()
    }

    /// From/to of the move that produced the shown position, for highlights.
    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.timeline.last_shown().map(|mv| (mv.from, mv.to))
    }

    /// Validate and play a proposed move. The move is recorded on the
    /// timeline (truncating any redo tail when rewound) and the shown
    /// position advances. Moves in a finished game are illegal.
    pub fn try_move(&mut self, input: MoveInput) -> Result<PlayedMove, GameError> {
        self.selection = None;
        if self.board.is_terminal() {
            return Err(GameError::IllegalMove {
                from: input.from,
                to: input.to,
            });
        }
        let mut next = self.board.clone();
        let played = next.try_move(input).ok_or(GameError::IllegalMove {
            from: input.from,
            to: input.to,
        })?;
        self.board = next;
        self.timeline.record(played.clone());
        Ok(played)
    }

    /// Click-to-move: select an own piece, then click a legal target to
    /// play (promotions default to queen). Clicking elsewhere clears the
    /// selection.
    pub fn click_square(&mut self, square: Square) -> Result<ClickOutcome, GameError> {
        if let Some(from) = self.selection {
            if self.board.legal_targets(from).contains(&square) {
                let played = self.try_move(MoveInput::new(from, square))?;
                return Ok(ClickOutcome::Moved(played));
            }
        }

        if let Some((color, _)) = self.board.piece_at(square) {
            if color == self.board.side_to_move() {
                let targets = self.board.legal_targets(square);
                self.selection = Some(square);
                return Ok(ClickOutcome::Selected { square, targets });
            }
        }

        if self.selection.take().is_some() {
            Ok(ClickOutcome::Cleared)
        } else {
            Ok(ClickOutcome::Ignored)
        }
    }

    pub fn selection(&self) -> Option<Square> {
        self.selection
    }

    /// Move the cursor and rebuild the shown position by replay.
    pub fn navigate(&mut self, step: NavStep) -> Result<(), GameError> {
        let target = self.timeline.target_for(step);
        self.seek(target)
    }

    /// Jump to an absolute ply. Fails without side effects when out of
    /// range or when the log fails to replay.
    pub fn seek(&mut self, ply: usize) -> Result<(), GameError> {
        let board = self.timeline.position_at(ply)?;
        self.timeline.seek(ply)?;
        self.board = board;
        self.selection = None;
        Ok(())
    }

    /// Back to the standard starting position with an empty history.
    pub fn reset(&mut self) {
        self.timeline = Timeline::new();
        self.board = RulesBoard::startpos();
        self.selection = None;
    }

    /// Replace the game with a bare position. Prior state survives a
    /// malformed FEN untouched.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), GameError> {
        let board = RulesBoard::from_fen(fen)?;
        self.timeline = Timeline::with_start(&board.fen())?;
        self.board = board;
        self.selection = None;
        Ok(())
    }

    /// Replace the game with a replayed PGN, cursor at the final position.
    /// Prior state survives a malformed PGN untouched.
    pub fn load_pgn(&mut self, text: &str) -> Result<(), GameError> {
        let game = pgn::load_pgn(text)?;
        self.timeline = Timeline::from_game(game.start_fen, game.moves);
        self.board = game.board;
        self.selection = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
