//! Engine client errors.
//!
//! Analysis failures are fatal to analysis only: the board keeps working in
//! manual mode when the engine cannot be started.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine process could not be started. Not retried automatically.
    #[error("engine {path:?} unavailable: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine started but never completed the protocol handshake.
    #[error("engine {path:?} did not answer the handshake within {timeout_ms}ms")]
    HandshakeTimeout { path: String, timeout_ms: u64 },

    /// The engine exited while the handshake was still in progress.
    #[error("engine {path:?} closed its output during the handshake")]
    HandshakeEof { path: String },
}
