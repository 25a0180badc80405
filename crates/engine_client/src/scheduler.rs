//! Analysis scheduler: turns a stream of position changes into a bounded
//! stream of engine searches.
//!
//! Invariants it enforces:
//! - at most one search is intended at any time; a `stop` always precedes
//!   the next `go`
//! - rapid position changes coalesce — only the position standing after a
//!   100ms quiet window is searched
//! - output lines are attributed to the search that was current when it was
//!   issued; everything a stopped search still emits (through its final
//!   `bestmove`) is dropped deterministically
//! - finished games publish a terminal snapshot instead of a search

use std::pin::Pin;
use std::time::Duration;

use analysis_core::{
    BoardController, Color, Evaluation, EvaluationSnapshot, GameEnd, LineKind, RulesBoard,
};
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, Sleep};
use tracing::{debug, info, warn};

use crate::config::EngineSettings;
use crate::transport::EngineLink;

/// Quiet window a position must survive before a search is issued.
pub const QUIESCENCE: Duration = Duration::from_millis(100);

/// A position change as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub fen: String,
    /// Mover of `fen` at request time; evaluation lines are interpreted
    /// against this, never against a later position.
    pub side_to_move: Color,
    /// Set when the position is checkmate/stalemate/drawn, in which case no
    /// search is issued at all.
    pub game_end: Option<GameEnd>,
}

impl AnalysisRequest {
    pub fn from_board(board: &RulesBoard) -> Self {
        Self {
            fen: board.fen(),
            side_to_move: board.side_to_move(),
            game_end: board.game_end(),
        }
    }

    pub fn from_controller(controller: &BoardController) -> Self {
        Self::from_board(controller.board())
    }
}

/// Commands accepted by the scheduler task. Depth and thread changes count
/// as position changes: they re-schedule the latest request.
#[derive(Debug)]
pub(crate) enum Command {
    Analyze(AnalysisRequest),
    SetDepth(u8),
    SetThreads(u16),
    Shutdown,
}

struct ActiveSearch {
    id: u64,
    side_to_move: Color,
}

pub(crate) struct Scheduler<L: EngineLink> {
    link: L,
    snapshots: watch::Sender<EvaluationSnapshot>,
    depth: u8,
    threads: u16,
    movetime_ms: u64,
    /// Request waiting out the quiet window.
    pending: Option<AnalysisRequest>,
    /// Latest request, re-scheduled when depth or thread count change.
    last_request: Option<AnalysisRequest>,
    /// Search the engine is currently running for us, if any.
    active: Option<ActiveSearch>,
    /// `bestmove` lines still owed by searches we stopped; all output is
    /// dropped until they have drained.
    stale_bestmoves: u32,
    eval: Evaluation,
    next_id: u64,
    engine_spoke: bool,
}

impl<L: EngineLink> Scheduler<L> {
    pub(crate) fn new(
        link: L,
        settings: &EngineSettings,
        snapshots: watch::Sender<EvaluationSnapshot>,
    ) -> Self {
        Self {
            link,
            snapshots,
            depth: settings.clamped_depth(),
            threads: settings.threads,
            movetime_ms: settings.movetime_ms,
            pending: None,
            last_request: None,
            active: None,
            stale_bestmoves: 0,
            eval: Evaluation::default(),
            next_id: 0,
            engine_spoke: false,
        }
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut lines = self.link.take_lines();
        let debounce = time::sleep(Duration::ZERO);
        tokio::pin!(debounce);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(Command::Shutdown) => break,
                    Some(Command::Analyze(request)) => {
                        self.stop_active();
                        self.pending = Some(request);
                        debounce.as_mut().reset(Instant::now() + QUIESCENCE);
                    }
                    Some(Command::SetDepth(depth)) => {
                        self.depth = depth.clamp(1, crate::config::MAX_DEPTH);
                        self.reschedule(debounce.as_mut());
                    }
                    Some(Command::SetThreads(threads)) => {
                        self.threads = threads.max(1);
                        self.reschedule(debounce.as_mut());
                    }
                },
                () = &mut debounce, if self.pending.is_some() => {
                    if let Some(request) = self.pending.take() {
                        self.issue(request);
                    }
                },
                line = lines.recv() => match line {
                    Some(line) => self.handle_line(&line),
                    None => {
                        warn!("engine output ended unexpectedly");
                        break;
                    }
                },
            }
        }

        // Unconditional teardown: stop, quit, release the handle. Pending
        // timers die with this task.
        self.link.close().await;
    }

    /// Advisory cancellation of the in-flight search. The engine will
    /// still emit output up to a final `bestmove`; all of it is stale.
    fn stop_active(&mut self) {
        if self.active.take().is_some() {
            self.link.send("stop");
            self.stale_bestmoves += 1;
        }
    }

    /// Treat a parameter change as a position change for the latest
    /// position.
    fn reschedule(&mut self, debounce: Pin<&mut Sleep>) {
        if let Some(request) = self.last_request.clone() {
            self.stop_active();
            self.pending = Some(request);
            debounce.reset(Instant::now() + QUIESCENCE);
        }
    }

    /// The quiet window elapsed: issue the search, or publish a terminal
    /// snapshot for a finished game.
    fn issue(&mut self, request: AnalysisRequest) {
        self.last_request = Some(request.clone());
        self.eval = Evaluation::default();

        if let Some(end) = request.game_end {
            info!(fen = %request.fen, "position is final; skipping analysis");
            self.active = None;
            let winner = match end {
                GameEnd::Checkmate { winner } => Some(winner),
                GameEnd::Stalemate | GameEnd::Draw => None,
            };
            self.snapshots
                .send_replace(EvaluationSnapshot::finished(winner));
            return;
        }

        self.next_id += 1;
        debug!(id = self.next_id, fen = %request.fen, depth = self.depth, "issuing search");
        self.link.send("ucinewgame");
        self.link
            .send(&format!("setoption name Threads value {}", self.threads));
        self.link.send(&format!("position fen {}", request.fen));
        self.link.send(&format!(
            "go depth {} searchmovetime {}",
            self.depth, self.movetime_ms
        ));
        self.active = Some(ActiveSearch {
            id: self.next_id,
            side_to_move: request.side_to_move,
        });
        self.snapshots
            .send_replace(self.eval.snapshot(self.engine_spoke));
    }

    fn handle_line(&mut self, line: &str) {
        self.engine_spoke = true;

        // Trailing output of a stopped search, up to and including its
        // final bestmove, is dropped wholesale.
        if self.stale_bestmoves > 0 {
            if line.trim_start().starts_with("bestmove") {
                self.stale_bestmoves -= 1;
                debug!(remaining = self.stale_bestmoves, "drained stale bestmove");
            }
            return;
        }

        let Some(active) = &self.active else {
            // Chatter outside any search (e.g. option echo); nothing to do.
            return;
        };
        let side_to_move = active.side_to_move;
        let id = active.id;

        match self.eval.absorb(line, side_to_move) {
            LineKind::BestMove => {
                debug!(id, best = ?self.eval.best_move, "search finished");
                self.active = None;
                self.snapshots.send_replace(self.eval.snapshot(true));
            }
            LineKind::Score | LineKind::Mate => {
                self.snapshots.send_replace(self.eval.snapshot(true));
            }
            LineKind::Other => {}
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod scheduler_tests;
