//! Rules oracle adapter.
//!
//! Wraps `cozy_chess::Board` behind the small surface the rest of the crate
//! needs: move validation, legal-target queries, game-end detection and FEN
//! in/out. The oracle encodes castling as king-takes-rook; this adapter
//! accepts and reports the standard king-to-destination form as well, so
//! callers and the engine wire protocol never see the internal encoding.

use cozy_chess::{Board, Color, File, GameStatus, Move, Piece, Square};

use crate::error::GameError;
use crate::notation;

/// Standard chess starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A move as proposed by the user (drag target or click pair).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveInput {
    pub from: Square,
    pub to: Square,
    /// Promotion choice. `None` defaults to queen when the move promotes.
    pub promotion: Option<Piece>,
}

impl MoveInput {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(from: Square, to: Square, promotion: Piece) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// Parse user move text: two squares plus an optional promotion letter
    /// (`e2e4`, `e7e8q`).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_ascii_lowercase();
        if text.len() < 4 || text.len() > 5 {
            return None;
        }
        let from = text[0..2].parse().ok()?;
        let to = text[2..4].parse().ok()?;
        let promotion = match text.as_bytes().get(4) {
            Some(b'q') => Some(Piece::Queen),
            Some(b'r') => Some(Piece::Rook),
            Some(b'b') => Some(Piece::Bishop),
            Some(b'n') => Some(Piece::Knight),
            Some(_) => return None,
            None => None,
        };
        Some(Self {
            from,
            to,
            promotion,
        })
    }
}

/// A move that was accepted by the oracle, recorded with everything the
/// timeline and presentation layers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
    /// Standard algebraic notation, including `+`/`#` suffix.
    pub san: String,
    pub is_capture: bool,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_castle: bool,
}

impl PlayedMove {
    /// The move in standard UCI text (`e2e4`, `e7e8q`, `e1g1`).
    pub fn uci(&self) -> String {
        notation::standard_uci(self.from, self.to, self.promotion, self.is_castle)
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnd {
    Checkmate { winner: Color },
    Stalemate,
    Draw,
}

/// Position handle backed by the rules oracle, plus the hash history needed
/// for threefold-repetition detection.
#[derive(Debug, Clone)]
pub struct RulesBoard {
    board: Board,
    seen_hashes: Vec<u64>,
}

impl Default for RulesBoard {
    fn default() -> Self {
        Self::startpos()
    }
}

pub(crate) fn collect_legal(board: &Board) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    board.generate_moves(|piece_moves| {
        moves.extend(piece_moves);
        false
    });
    moves
}

impl RulesBoard {
    pub fn startpos() -> Self {
        let board = Board::default();
        let hash = board.hash();
        Self {
            board,
            seen_hashes: vec![hash],
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let board = Board::from_fen(fen.trim(), false)
            .map_err(|e| GameError::MalformedLoad(format!("invalid FEN {fen:?}: {e}")))?;
        let hash = board.hash();
        Ok(Self {
            board,
            seen_hashes: vec![hash],
        })
    }

    pub fn fen(&self) -> String {
        self.board.to_string()
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        match (self.board.color_on(sq), self.board.piece_on(sq)) {
            (Some(color), Some(piece)) => Some((color, piece)),
            _ => None,
        }
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        collect_legal(&self.board)
    }

    /// Legal destination squares from `from`, in the standard convention
    /// (castling reported as the king's two-square hop, not the rook square).
    pub fn legal_targets(&self, from: Square) -> Vec<Square> {
        self.legal_moves()
            .into_iter()
            .filter(|mv| mv.from == from)
            .map(|mv| {
                if self.is_castling(mv) {
                    standard_castle_target(mv)
                } else {
                    mv.to
                }
            })
            .collect()
    }

    /// True when `mv` is the oracle's king-takes-own-rook castling encoding.
    fn is_castling(&self, mv: Move) -> bool {
        self.board.piece_on(mv.from) == Some(Piece::King)
            && self.board.color_on(mv.to) == Some(self.board.side_to_move())
            && self.board.piece_on(mv.to) == Some(Piece::Rook)
    }

    /// Resolve a proposed move against the legal-move list. Accepts both the
    /// standard castling target (`g1`/`c1`) and the oracle's rook-square
    /// form. Promotion defaults to queen when the move promotes and no
    /// choice was given. Returns `None` for illegal proposals.
    pub fn resolve(&self, input: MoveInput) -> Option<Move> {
        let legal = self.legal_moves();
        let mut fallback = None;
        for mv in &legal {
            if mv.from != input.from {
                continue;
            }
            let target = if self.is_castling(*mv) {
                standard_castle_target(*mv)
            } else {
                mv.to
            };
            if mv.to != input.to && target != input.to {
                continue;
            }
            match (mv.promotion, input.promotion) {
                // The oracle ignores a promotion choice on non-promoting
                // moves, so we do too.
                (None, _) => return Some(*mv),
                (Some(p), Some(q)) if p == q => return Some(*mv),
                (Some(Piece::Queen), None) => fallback = Some(*mv),
                _ => continue,
            }
        }
        fallback
    }

    /// Validate and play a proposed move, returning the recorded form.
    /// `None` means the oracle rejected it; the position is unchanged.
    pub fn try_move(&mut self, input: MoveInput) -> Option<PlayedMove> {
        let mv = self.resolve(input)?;
        Some(self.commit(mv))
    }

    /// Play a SAN token (used by the PGN reader).
    pub fn apply_san(&mut self, san: &str) -> Result<PlayedMove, GameError> {
        let mv = notation::parse_san(&self.board, san)
            .ok_or_else(|| GameError::MalformedLoad(format!("unmatched SAN token {san:?}")))?;
        Ok(self.commit(mv))
    }

    /// Re-apply a previously recorded move during timeline replay.
    pub fn apply_recorded(&mut self, played: &PlayedMove, index: usize) -> Result<(), GameError> {
        let mv = Move {
            from: played.from,
            to: played.to,
            promotion: played.promotion,
        };
        if !self.board.is_legal(mv) {
            // A recorded move failing to replay means the log is corrupt.
            return Err(GameError::NavigationOutOfRange {
                index,
                len: self.seen_hashes.len(),
            });
        }
        self.play_and_track(mv);
        Ok(())
    }

    fn commit(&mut self, mv: Move) -> PlayedMove {
        let san = notation::san(&self.board, mv);
        let is_castle = self.is_castling(mv);
        let stm = self.board.side_to_move();
        let moved = self.board.piece_on(mv.from);
        let is_capture = !is_castle
            && (self.board.colors(!stm).has(mv.to)
                || (moved == Some(Piece::Pawn) && mv.from.file() != mv.to.file()));

        self.play_and_track(mv);

        let is_check = !self.board.checkers().is_empty();
        let is_checkmate = is_check && self.legal_moves().is_empty();
        PlayedMove {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
            san,
            is_capture,
            is_check,
            is_checkmate,
            is_castle,
        }
    }

    fn play_and_track(&mut self, mv: Move) {
        self.board.play(mv);
        self.seen_hashes.push(self.board.hash());
    }

    pub fn is_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    pub fn is_checkmate(&self) -> bool {
        self.board.status() == GameStatus::Won
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_check() && self.legal_moves().is_empty()
    }

    /// Drawn by rule: fifty-move counter, threefold repetition or
    /// insufficient material. Stalemate is reported separately.
    pub fn is_draw(&self) -> bool {
        self.board.halfmove_clock() >= 100
            || self.is_threefold_repetition()
            || self.is_insufficient_material()
    }

    pub fn game_end(&self) -> Option<GameEnd> {
        if self.is_checkmate() {
            return Some(GameEnd::Checkmate {
                winner: !self.board.side_to_move(),
            });
        }
        if self.is_stalemate() {
            return Some(GameEnd::Stalemate);
        }
        if self.is_draw() {
            return Some(GameEnd::Draw);
        }
        None
    }

    pub fn is_terminal(&self) -> bool {
        self.game_end().is_some()
    }

    fn is_threefold_repetition(&self) -> bool {
        let current = self.board.hash();
        self.seen_hashes.iter().filter(|&&h| h == current).count() >= 3
    }

    fn is_insufficient_material(&self) -> bool {
        let heavy = self.board.pieces(Piece::Pawn)
            | self.board.pieces(Piece::Rook)
            | self.board.pieces(Piece::Queen);
        if !heavy.is_empty() {
            return false;
        }
        let minors = self.board.pieces(Piece::Knight) | self.board.pieces(Piece::Bishop);
        minors.len() <= 1
    }
}

/// Where the king lands in the standard encoding of a castling move.
pub(crate) fn standard_castle_target(mv: Move) -> Square {
    let file = if (mv.to.file() as usize) > (mv.from.file() as usize) {
        File::G
    } else {
        File::C
    };
    Square::new(file, mv.from.rank())
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod rules_tests;
