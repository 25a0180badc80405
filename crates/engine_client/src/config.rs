//! Engine settings: executable, search bounds and UCI options.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Hard ceiling on the search depth the scheduler will request.
pub const MAX_DEPTH: u8 = 25;

/// Everything needed to start and drive one analysis engine. Loaded from a
/// TOML file and/or overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Engine executable to spawn.
    pub path: String,
    /// Extra arguments passed to the executable.
    pub args: Vec<String>,
    /// Requested search depth, clamped to `1..=MAX_DEPTH`.
    pub depth: u8,
    /// `Threads` UCI option; also re-sent before every search.
    pub threads: u16,
    /// `Skill Level` UCI option.
    pub skill_level: u8,
    /// `MultiPV` UCI option.
    pub multipv: u8,
    /// `Hash` UCI option, in MiB.
    pub hash_mb: u32,
    /// Wall-clock budget per search, in milliseconds.
    pub movetime_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            path: "stockfish".to_string(),
            args: Vec::new(),
            depth: 10,
            threads: 12,
            skill_level: 20,
            multipv: 3,
            hash_mb: 128,
            movetime_ms: 6000,
        }
    }
}

impl EngineSettings {
    /// Read settings from a TOML file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        let settings: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing settings file {}", path.display()))?;
        Ok(settings)
    }

    /// Depth bounded to what the scheduler will actually request.
    pub fn clamped_depth(&self) -> u8 {
        self.depth.clamp(1, MAX_DEPTH)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
