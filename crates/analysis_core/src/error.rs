//! Error taxonomy for board and timeline operations.
//!
//! Every mutating operation in this crate is all-or-nothing: when one of
//! these errors is returned, the caller's state is exactly what it was
//! before the call.

use cozy_chess::Square;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The rules oracle rejected a proposed move. Recovered locally; the
    /// position and history are untouched.
    #[error("illegal move {from}{to}")]
    IllegalMove { from: Square, to: Square },

    /// A FEN or PGN input could not be parsed. The previous game state is
    /// preserved.
    #[error("could not load position: {0}")]
    MalformedLoad(String),

    /// A navigation target fell outside the recorded history. Normal
    /// navigation clamps, so hitting this means the cursor and history
    /// desynchronised.
    #[error("navigation target {index} outside history of length {len}")]
    NavigationOutOfRange { index: usize, len: usize },
}
