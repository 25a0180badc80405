//! Core state for the continuous-analysis chess board.
//!
//! This crate owns everything that must stay consistent while an external
//! engine analyses positions in the background:
//! - the rules adapter over the move-legality oracle (`rules`, `notation`)
//! - the append-only move timeline with a navigable cursor (`timeline`)
//! - the interaction controller that gates all mutations (`controller`)
//! - the engine-output evaluation model and line parser (`evaluation`)
//!
//! The engine process itself lives in the `engine_client` crate; nothing in
//! here is async.

pub mod controller;
pub mod error;
pub mod evaluation;
pub mod notation;
pub mod pgn;
pub mod rules;
pub mod timeline;

pub use controller::{BoardController, ClickOutcome};
pub use error::GameError;
pub use evaluation::{format_score, Evaluation, EvaluationSnapshot, LineKind};
pub use rules::{GameEnd, MoveInput, PlayedMove, RulesBoard};
pub use timeline::{NavStep, Timeline};

// Oracle vocabulary used throughout the public API.
pub use cozy_chess::{Color, Piece, Square};
