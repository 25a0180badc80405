use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use analysis_core::RulesBoard;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{self, Duration, Instant};

use super::*;
use crate::analyzer::Analyzer;
use crate::transport::EngineLink;

/// Scripted engine peer: records every command with its timestamp and
/// replays whatever lines the test feeds in.
struct MockLink {
    started: Instant,
    sent: Arc<Mutex<Vec<(Duration, String)>>>,
    lines: Option<mpsc::UnboundedReceiver<String>>,
    closes: Arc<AtomicUsize>,
}

struct MockHandle {
    sent: Arc<Mutex<Vec<(Duration, String)>>>,
    line_tx: mpsc::UnboundedSender<String>,
    closes: Arc<AtomicUsize>,
}

fn mock() -> (MockLink, MockHandle) {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let closes = Arc::new(AtomicUsize::new(0));
    let (line_tx, lines) = mpsc::unbounded_channel();
    (
        MockLink {
            started: Instant::now(),
            sent: sent.clone(),
            lines: Some(lines),
            closes: closes.clone(),
        },
        MockHandle {
            sent,
            line_tx,
            closes,
        },
    )
}

#[async_trait]
impl EngineLink for MockLink {
    fn send(&self, command: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((self.started.elapsed(), command.to_string()));
    }

    fn take_lines(&mut self) -> mpsc::UnboundedReceiver<String> {
        self.lines.take().unwrap_or_else(|| {
            let (_tx, rx) = mpsc::unbounded_channel();
            rx
        })
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl MockHandle {
    fn feed(&self, line: &str) {
        self.line_tx.send(line.to_string()).unwrap();
    }

    fn commands(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }

    fn commands_matching(&self, prefix: &str) -> Vec<(Duration, String)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, c)| c.starts_with(prefix))
            .cloned()
            .collect()
    }
}

/// Request for an opaque position with White to move and the game running.
fn req(fen: &str) -> AnalysisRequest {
    AnalysisRequest {
        fen: fen.to_string(),
        side_to_move: Color::White,
        game_end: None,
    }
}

fn start() -> (Analyzer, MockHandle) {
    let (link, handle) = mock();
    (Analyzer::with_link(link, &EngineSettings::default()), handle)
}

#[tokio::test(start_paused = true)]
async fn bursts_coalesce_into_one_search_for_the_last_position() {
    let (analyzer, handle) = start();

    analyzer.analyze(req("P1"));
    time::sleep(Duration::from_millis(20)).await;
    analyzer.analyze(req("P2"));
    time::sleep(Duration::from_millis(20)).await;
    analyzer.analyze(req("P3"));
    time::sleep(Duration::from_millis(200)).await;

    let gos = handle.commands_matching("go ");
    assert_eq!(gos.len(), 1, "burst must produce exactly one search");
    // Fired one quiet window after the last change: 40ms + 100ms.
    assert_eq!(gos[0].0.as_millis(), 140);

    let positions = handle.commands_matching("position fen");
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].1, "position fen P3");

    // Nothing was in flight, so nothing needed stopping.
    assert!(handle.commands_matching("stop").is_empty());
}

#[tokio::test(start_paused = true)]
async fn search_command_sequence_and_bounds() {
    let (analyzer, handle) = start();
    analyzer.analyze(req("P1"));
    time::sleep(Duration::from_millis(150)).await;

    let commands = handle.commands();
    assert_eq!(
        commands,
        vec![
            "ucinewgame".to_string(),
            "setoption name Threads value 12".to_string(),
            "position fen P1".to_string(),
            "go depth 10 searchmovetime 6000".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn new_position_stops_inflight_search_and_drops_its_output() {
    let (analyzer, handle) = start();
    let mut snapshots = analyzer.snapshots();

    analyzer.analyze(req("P1"));
    time::sleep(Duration::from_millis(150)).await;
    handle.feed("info depth 5 score cp 21");
    time::sleep(Duration::from_millis(1)).await;
    assert_eq!(snapshots.borrow_and_update().score_text, "+0.21");

    analyzer.analyze(req("P2"));
    time::sleep(Duration::from_millis(1)).await;
    // Trailing output of the stopped search, ending in its bestmove.
    handle.feed("info depth 9 score cp 999");
    handle.feed("bestmove d2d4");
    time::sleep(Duration::from_millis(200)).await;

    handle.feed("info depth 3 score cp 50");
    time::sleep(Duration::from_millis(1)).await;

    let snapshot = snapshots.borrow_and_update().clone();
    assert_eq!(snapshot.score_text, "+0.50");
    assert_eq!(snapshot.best_move, None, "stale bestmove must not surface");

    let commands = handle.commands();
    let stop_at = commands.iter().position(|c| c == "stop").expect("stop sent");
    let second_go = commands
        .iter()
        .rposition(|c| c.starts_with("go "))
        .expect("second go sent");
    assert!(stop_at < second_go, "stop must precede the next go");
    assert_eq!(handle.commands_matching("go ").len(), 2);
}

#[tokio::test(start_paused = true)]
async fn finished_positions_skip_the_search() {
    let (analyzer, handle) = start();
    let mut snapshots = analyzer.snapshots();

    // Scholar's mate: White has already won.
    let board =
        RulesBoard::from_fen("r1bqkbnr/pppp1Qpp/2n5/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 1")
            .unwrap();
    analyzer.analyze(AnalysisRequest::from_board(&board));
    time::sleep(Duration::from_millis(150)).await;

    assert!(handle.commands().is_empty(), "no search for a finished game");
    let snapshot = snapshots.borrow_and_update().clone();
    assert!(snapshot.game_over);
    assert_eq!(snapshot.favored, Some('w'));
    assert_eq!(snapshot.best_move, None);
}

#[tokio::test(start_paused = true)]
async fn depth_change_reruns_the_latest_position_clamped() {
    let (analyzer, handle) = start();
    analyzer.analyze(req("P1"));
    time::sleep(Duration::from_millis(150)).await;

    analyzer.set_depth(99);
    time::sleep(Duration::from_millis(150)).await;

    let gos = handle.commands_matching("go ");
    assert_eq!(gos.len(), 2);
    assert_eq!(gos[1].1, "go depth 25 searchmovetime 6000");
    // The unchanged position is searched again, after stopping the old run.
    assert_eq!(handle.commands_matching("position fen P1").len(), 2);
    assert_eq!(handle.commands_matching("stop").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn thread_change_reruns_with_the_new_option() {
    let (analyzer, handle) = start();
    analyzer.analyze(req("P1"));
    time::sleep(Duration::from_millis(150)).await;

    analyzer.set_threads(4);
    time::sleep(Duration::from_millis(150)).await;

    let options = handle.commands_matching("setoption name Threads");
    assert_eq!(options.last().unwrap().1, "setoption name Threads value 4");
    assert_eq!(handle.commands_matching("go ").len(), 2);
}

#[tokio::test(start_paused = true)]
async fn bestmove_completes_the_search_without_a_stop() {
    let (analyzer, handle) = start();
    let mut snapshots = analyzer.snapshots();

    analyzer.analyze(req("P1"));
    time::sleep(Duration::from_millis(150)).await;
    handle.feed("info depth 10 score cp 10 pv e2e4");
    handle.feed("bestmove e2e4 ponder e7e5");
    time::sleep(Duration::from_millis(1)).await;
    assert_eq!(
        snapshots.borrow_and_update().best_move.as_deref(),
        Some("e2e4")
    );

    // The search already finished; the next position needs no stop.
    analyzer.analyze(req("P2"));
    time::sleep(Duration::from_millis(150)).await;
    assert!(handle.commands_matching("stop").is_empty());

    handle.feed("info depth 2 score cp -30");
    time::sleep(Duration::from_millis(1)).await;
    let snapshot = snapshots.borrow_and_update().clone();
    assert_eq!(snapshot.score_text, "-0.30");
    assert_eq!(snapshot.favored, Some('b'));
}

#[tokio::test(start_paused = true)]
async fn snapshot_starts_unready() {
    let (analyzer, _handle) = start();
    let snapshot = analyzer.snapshots().borrow().clone();
    assert!(!snapshot.is_ready);
    assert_eq!(snapshot.score_text, "0.00");
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_the_link_exactly_once() {
    let (analyzer, handle) = start();
    analyzer.analyze(req("P1"));
    time::sleep(Duration::from_millis(150)).await;

    analyzer.shutdown().await;
    assert_eq!(handle.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn engine_death_tears_the_scheduler_down() {
    let (analyzer, handle) = start();
    analyzer.analyze(req("P1"));
    time::sleep(Duration::from_millis(150)).await;

    // Dropping the handle's sender closes the line stream.
    drop(handle);
    time::sleep(Duration::from_millis(10)).await;

    // The scheduler exited and closed the link; commands are ignored from
    // here on, which must not panic.
    analyzer.set_depth(5);
    time::sleep(Duration::from_millis(150)).await;
}
