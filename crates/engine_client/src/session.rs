//! Engine session identity and reuse.
//!
//! One live engine handle at a time, keyed by executable path and thread
//! count. Asking for the same pair again reuses the running session; any
//! change tears the old one down first and starts fresh.

use tracing::info;

use crate::analyzer::Analyzer;
use crate::config::EngineSettings;
use crate::error::EngineError;

#[derive(Default)]
pub struct EngineSession {
    path: String,
    threads: u16,
    analyzer: Option<Analyzer>,
}

impl EngineSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a session matching `settings` is running. Idempotent for
    /// an unchanged (path, threads) pair; otherwise the previous session is
    /// fully torn down before the new engine is spawned.
    pub async fn ensure(&mut self, settings: &EngineSettings) -> Result<(), EngineError> {
        if self.analyzer.is_some() && self.path == settings.path && self.threads == settings.threads
        {
            return Ok(());
        }
        self.teardown().await;
        info!(path = %settings.path, threads = settings.threads, "starting engine session");
        let analyzer = Analyzer::spawn(settings).await?;
        self.path = settings.path.clone();
        self.threads = settings.threads;
        self.analyzer = Some(analyzer);
        Ok(())
    }

    pub fn analyzer(&self) -> Option<&Analyzer> {
        self.analyzer.as_ref()
    }

    /// Stop the running session, if any. Safe to call repeatedly.
    pub async fn teardown(&mut self) {
        if let Some(analyzer) = self.analyzer.take() {
            analyzer.shutdown().await;
        }
    }
}
