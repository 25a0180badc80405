//! Asynchronous client for a UCI analysis engine.
//!
//! Owns the engine process end to end: spawn and handshake (`transport`),
//! at-most-one-active-search scheduling with debounced position changes
//! (`scheduler`), session identity and reuse (`session`), and the settings
//! surface (`config`). Evaluations flow out as
//! [`analysis_core::EvaluationSnapshot`] values on a watch channel.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod session;
pub mod transport;

pub use analyzer::Analyzer;
pub use config::{EngineSettings, MAX_DEPTH};
pub use error::EngineError;
pub use scheduler::{AnalysisRequest, QUIESCENCE};
pub use session::EngineSession;
pub use transport::{EngineLink, UciProcess};
