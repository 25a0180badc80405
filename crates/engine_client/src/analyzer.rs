//! Public handle to a running analysis pipeline.

use analysis_core::EvaluationSnapshot;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::EngineSettings;
use crate::error::EngineError;
use crate::scheduler::{AnalysisRequest, Command, Scheduler};
use crate::transport::{EngineLink, UciProcess};

/// Drives one engine session. Position changes go in through [`analyze`];
/// evaluation snapshots come out on a watch channel. Dropping the handle
/// shuts the scheduler down, which closes the engine.
///
/// [`analyze`]: Analyzer::analyze
pub struct Analyzer {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<EvaluationSnapshot>,
    task: JoinHandle<()>,
}

impl Analyzer {
    /// Spawn the configured engine and start scheduling on it.
    pub async fn spawn(settings: &EngineSettings) -> Result<Self, EngineError> {
        let link = UciProcess::spawn(settings).await?;
        Ok(Self::with_link(link, settings))
    }

    /// Start scheduling on an already-open link. Used by tests to drive the
    /// scheduler against a scripted peer.
    pub fn with_link<L: EngineLink + 'static>(link: L, settings: &EngineSettings) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(EvaluationSnapshot::default());
        let task = tokio::spawn(Scheduler::new(link, settings, snapshot_tx).run(command_rx));
        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        }
    }

    /// Schedule analysis of a new position, cancelling anything in flight.
    pub fn analyze(&self, request: AnalysisRequest) {
        let _ = self.commands.send(Command::Analyze(request));
    }

    /// Change the search depth; re-runs the latest position.
    pub fn set_depth(&self, depth: u8) {
        let _ = self.commands.send(Command::SetDepth(depth));
    }

    /// Change the engine thread count; re-runs the latest position.
    pub fn set_threads(&self, threads: u16) {
        let _ = self.commands.send(Command::SetThreads(threads));
    }

    /// Watch channel carrying the latest evaluation snapshot.
    pub fn snapshots(&self) -> watch::Receiver<EvaluationSnapshot> {
        self.snapshots.clone()
    }

    /// Stop scheduling and close the engine, waiting for teardown.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        let _ = self.task.await;
    }
}
