//! Analysis board for the terminal.
//!
//! Drives the core crates end to end: you play or replay a game with text
//! commands while the configured engine continuously evaluates the current
//! position in the background. Board drawing is intentionally left to
//! richer front-ends; this one prints FEN, the move list and evaluations.

use analysis_core::{BoardController, ClickOutcome, EvaluationSnapshot, MoveInput, NavStep, Square};
use anyhow::Result;
use engine_client::{AnalysisRequest, EngineSession, EngineSettings};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!("analyst - continuous-analysis chess board");
    println!();
    println!("Usage:");
    println!("  analyst [--engine PATH] [--depth D] [--threads N] [--config FILE] [--fen FEN]");
    println!();
    println!("Options default to the settings file, then to stockfish on PATH,");
    println!("depth 10, 12 engine threads.");
}

fn print_help() {
    println!("Commands:");
    println!("  move <uci>        play a move (e2e4, e7e8q)");
    println!("  click <square>    click-to-move: select a piece, then a target");
    println!("  first|prev|next|last   walk the move list");
    println!("  goto <ply>        jump to a half-move number");
    println!("  fen <fen>         load a position");
    println!("  pgn               load a game; paste PGN, end with a blank line");
    println!("  reset             back to the starting position");
    println!("  show              print position and move list");
    println!("  eval              print the latest engine evaluation");
    println!("  depth <1-25>      change search depth");
    println!("  threads <n>       change engine threads (restarts the engine)");
    println!("  engine <path>     switch engine executable (restarts the engine)");
    println!("  quit");
}

struct CliOptions {
    settings: EngineSettings,
    start_fen: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Option<CliOptions>> {
    let mut config_path = None;
    let mut engine = None;
    let mut depth = None;
    let mut threads = None;
    let mut start_fen = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => return Ok(None),
            "--config" => {
                i += 1;
                config_path = Some(args.get(i).cloned().unwrap_or_default());
            }
            "--engine" => {
                i += 1;
                engine = args.get(i).cloned();
            }
            "--depth" | "-d" => {
                i += 1;
                depth = args.get(i).and_then(|v| v.parse::<u8>().ok());
            }
            "--threads" | "-t" => {
                i += 1;
                threads = args.get(i).and_then(|v| v.parse::<u16>().ok());
            }
            "--fen" => {
                i += 1;
                start_fen = args.get(i).cloned();
            }
            other => {
                anyhow::bail!("unknown argument: {other}");
            }
        }
        i += 1;
    }

    let mut settings = match config_path {
        Some(path) => EngineSettings::load(std::path::Path::new(&path))?,
        None => EngineSettings::default(),
    };
    if let Some(engine) = engine {
        settings.path = engine;
    }
    if let Some(depth) = depth {
        settings.depth = depth;
    }
    if let Some(threads) = threads {
        settings.threads = threads;
    }

    Ok(Some(CliOptions {
        settings,
        start_fen,
    }))
}

struct App {
    controller: BoardController,
    settings: EngineSettings,
    session: EngineSession,
    snapshots: Option<watch::Receiver<EvaluationSnapshot>>,
    printer: Option<JoinHandle<()>>,
}

impl App {
    fn new(settings: EngineSettings) -> Self {
        Self {
            controller: BoardController::new(),
            settings,
            session: EngineSession::new(),
            snapshots: None,
            printer: None,
        }
    }

    /// (Re)start the engine session for the current settings and hook up
    /// evaluation printing. Analysis is optional: on failure the board
    /// keeps working in manual mode.
    async fn connect_engine(&mut self) {
        if let Some(printer) = self.printer.take() {
            printer.abort();
        }
        match self.session.ensure(&self.settings).await {
            Ok(()) => {
                if let Some(analyzer) = self.session.analyzer() {
                    let receiver = analyzer.snapshots();
                    self.snapshots = Some(receiver.clone());
                    self.printer = Some(tokio::spawn(print_final_evaluations(receiver)));
                }
            }
            Err(e) => {
                warn!("analysis unavailable: {e}");
                println!("(analysis disabled: {e})");
                self.snapshots = None;
            }
        }
    }

    /// Hand the shown position to the scheduler.
    fn request_analysis(&self) {
        if let Some(analyzer) = self.session.analyzer() {
            analyzer.analyze(AnalysisRequest::from_controller(&self.controller));
        }
    }

    fn show(&self) {
        println!("fen: {}", self.controller.fen());
        let history = self.controller.timeline().history();
        let cursor = self.controller.timeline().cursor();
        for (i, pair) in history.chunks(2).enumerate() {
            let white = pair[0].san.as_str();
            let black = pair.get(1).map(|m| m.san.as_str()).unwrap_or("");
            println!("{:>3}. {:<8} {}", i + 1, white, black);
        }
        println!("at ply {cursor} of {}", history.len());
        match self.controller.game_end() {
            Some(analysis_core::GameEnd::Checkmate { winner }) => {
                println!("checkmate, {winner:?} wins")
            }
            Some(analysis_core::GameEnd::Stalemate) => println!("stalemate"),
            Some(analysis_core::GameEnd::Draw) => println!("drawn"),
            None => println!("{:?} to move", self.controller.board().side_to_move()),
        }
    }

    fn print_eval(&self) {
        match &self.snapshots {
            Some(receiver) => {
                let snapshot = receiver.borrow().clone();
                if !snapshot.is_ready {
                    println!("engine is still warming up");
                    return;
                }
                print_snapshot(&snapshot);
            }
            None => println!("analysis is disabled"),
        }
    }

    async fn handle(&mut self, command: &str, rest: &str, input: &mut Lines<BufReader<Stdin>>) {
        match command {
            "help" => print_help(),
            "move" => match MoveInput::parse(rest) {
                Some(mv) => match self.controller.try_move(mv) {
                    Ok(played) => {
                        println!("played {}", played.san);
                        self.request_analysis();
                    }
                    Err(e) => println!("rejected: {e}"),
                },
                None => println!("cannot read move {rest:?}; use e2e4 or e7e8q"),
            },
            "click" => match rest.trim().to_ascii_lowercase().parse::<Square>() {
                Ok(square) => match self.controller.click_square(square) {
                    Ok(ClickOutcome::Moved(played)) => {
                        println!("played {}", played.san);
                        self.request_analysis();
                    }
                    Ok(ClickOutcome::Selected { square, targets }) => {
                        let targets: Vec<String> =
                            targets.iter().map(|t| t.to_string()).collect();
                        println!("selected {square}: {}", targets.join(" "));
                    }
                    Ok(ClickOutcome::Cleared) => println!("selection cleared"),
                    Ok(ClickOutcome::Ignored) => println!("nothing to do there"),
                    Err(e) => println!("rejected: {e}"),
                },
                Err(_) => println!("cannot read square {rest:?}"),
            },
            "first" | "prev" | "next" | "last" => {
                let step = match command {
                    "first" => NavStep::First,
                    "prev" => NavStep::Prev,
                    "next" => NavStep::Next,
                    _ => NavStep::Last,
                };
                match self.controller.navigate(step) {
                    Ok(()) => {
                        println!("at ply {}: {}",
                            self.controller.timeline().cursor(),
                            self.controller.fen());
                        self.request_analysis();
                    }
                    Err(e) => println!("navigation failed: {e}"),
                }
            }
            "goto" => match rest.trim().parse::<usize>() {
                Ok(ply) => match self.controller.seek(ply) {
                    Ok(()) => {
                        println!("at ply {ply}: {}", self.controller.fen());
                        self.request_analysis();
                    }
                    Err(e) => println!("rejected: {e}"),
                },
                Err(_) => println!("cannot read ply {rest:?}"),
            },
            "fen" => match self.controller.load_fen(rest) {
                Ok(()) => {
                    println!("loaded position");
                    self.request_analysis();
                }
                Err(e) => println!("rejected: {e}"),
            },
            "pgn" => {
                println!("paste PGN, end with a blank line:");
                let mut text = String::new();
                while let Ok(Some(line)) = input.next_line().await {
                    if line.trim().is_empty() {
                        break;
                    }
                    text.push_str(&line);
                    text.push('\n');
                }
                match self.controller.load_pgn(&text) {
                    Ok(()) => {
                        println!(
                            "loaded game with {} moves",
                            self.controller.timeline().len()
                        );
                        self.request_analysis();
                    }
                    Err(e) => println!("rejected: {e}"),
                }
            }
            "reset" => {
                self.controller.reset();
                println!("reset to the starting position");
                self.request_analysis();
            }
            "show" => self.show(),
            "eval" => self.print_eval(),
            "depth" => match rest.trim().parse::<u8>() {
                Ok(depth) => {
                    self.settings.depth = depth;
                    if let Some(analyzer) = self.session.analyzer() {
                        analyzer.set_depth(depth);
                    }
                    println!("depth set to {}", self.settings.clamped_depth());
                }
                Err(_) => println!("cannot read depth {rest:?}"),
            },
            "threads" => match rest.trim().parse::<u16>() {
                Ok(threads) => {
                    self.settings.threads = threads;
                    self.connect_engine().await;
                    self.request_analysis();
                }
                Err(_) => println!("cannot read thread count {rest:?}"),
            },
            "engine" => {
                self.settings.path = rest.trim().to_string();
                self.connect_engine().await;
                self.request_analysis();
            }
            "" => {}
            other => println!("unknown command {other:?}; try help"),
        }
    }
}

fn print_snapshot(snapshot: &EvaluationSnapshot) {
    if snapshot.game_over {
        match snapshot.favored {
            Some('w') => println!("[analysis] game over, white wins"),
            Some(_) => println!("[analysis] game over, black wins"),
            None => println!("[analysis] game over, drawn"),
        }
        return;
    }
    let mut line = format!("[analysis] score {}", snapshot.score_text);
    if let Some(mate) = &snapshot.mate_in {
        line.push_str(&format!(", mate in {mate}"));
    }
    if let Some(best) = &snapshot.best_move {
        line.push_str(&format!(", best move {best}"));
    }
    println!("{line}");
}

/// Print each search's outcome as it lands: the final best move, or the
/// terminal state of a finished game. Intermediate score lines are left to
/// the `eval` command to keep the prompt usable.
async fn print_final_evaluations(mut receiver: watch::Receiver<EvaluationSnapshot>) {
    let mut last = EvaluationSnapshot::default();
    while receiver.changed().await.is_ok() {
        let snapshot = receiver.borrow_and_update().clone();
        if snapshot == last {
            continue;
        }
        if snapshot.game_over || snapshot.best_move.is_some() {
            print_snapshot(&snapshot);
        }
        last = snapshot;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args)? {
        Some(options) => options,
        None => {
            print_usage();
            return Ok(());
        }
    };

    let mut app = App::new(options.settings);
    if let Some(fen) = &options.start_fen {
        app.controller.load_fen(fen)?;
    }

    app.connect_engine().await;
    app.request_analysis();

    println!("analysis board ready; type help for commands");
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = input.next_line().await? {
        let line = line.trim().to_string();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line.as_str(), ""),
        };
        if command == "quit" || command == "exit" {
            break;
        }
        app.handle(command, rest, &mut input).await;
    }

    if let Some(printer) = app.printer.take() {
        printer.abort();
    }
    app.session.teardown().await;
    Ok(())
}
