//! Engine process transport.
//!
//! `UciProcess` owns one engine child process as a line-oriented channel:
//! spawn, `uci`/`uciok` handshake, one-time option configuration, raw line
//! exchange and teardown. The scheduler talks to it through the
//! [`EngineLink`] trait so tests can substitute a scripted peer.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, warn};

use crate::config::EngineSettings;
use crate::error::EngineError;

/// How long the engine may take to answer the handshake, per line.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a closing engine gets to exit after `quit` before being killed.
const QUIT_GRACE: Duration = Duration::from_secs(1);

/// Bidirectional line channel to an analysis engine.
///
/// Writes are best-effort and never block the caller. Output is a single
/// stream of raw lines with at most one consumer at a time.
#[async_trait]
pub trait EngineLink: Send {
    /// Enqueue one protocol line. A no-op (not an error) once the link is
    /// closed or the engine is gone.
    fn send(&self, command: &str);

    /// Take the output line stream. There is one stream per link; a second
    /// take detaches the first consumer and yields an already-closed
    /// stream.
    fn take_lines(&mut self) -> mpsc::UnboundedReceiver<String>;

    /// Graceful stop/quit, then release the underlying resources. Safe to
    /// call any number of times.
    async fn close(&mut self);
}

fn closed_line_stream() -> mpsc::UnboundedReceiver<String> {
    let (_tx, rx) = mpsc::unbounded_channel();
    rx
}

/// A spawned engine process speaking the UCI wire protocol.
pub struct UciProcess {
    child: Child,
    commands: mpsc::UnboundedSender<String>,
    lines: Option<mpsc::UnboundedReceiver<String>>,
    path: String,
    closed: bool,
}

impl UciProcess {
    /// Spawn the engine, complete the handshake and apply the configured
    /// options exactly once. Construction failure is reported as
    /// [`EngineError::Unavailable`] and is not retried here.
    pub async fn spawn(settings: &EngineSettings) -> Result<Self, EngineError> {
        let path = settings.path.clone();
        let unavailable = |source: std::io::Error| EngineError::Unavailable {
            path: path.clone(),
            source,
        };

        let mut child = Command::new(&settings.path)
            .args(&settings.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(unavailable)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| unavailable(std::io::Error::other("engine stdin not captured")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| unavailable(std::io::Error::other("engine stdout not captured")))?;

        let (command_tx, mut command_rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(command) = command_rx.recv().await {
                debug!(%command, "engine <-");
                if stdin.write_all(command.as_bytes()).await.is_err()
                    || stdin.write_all(b"\n").await.is_err()
                    || stdin.flush().await.is_err()
                {
                    break;
                }
            }
        });

        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(%line, "engine ->");
                if line_tx.send(line).is_err() {
                    break;
                }
            }
        });

        // Handshake, then configure the session exactly once.
        if let Err(e) = handshake(&command_tx, &mut line_rx, &path).await {
            let _ = child.kill().await;
            return Err(e);
        }
        let send = |command: String| {
            let _ = command_tx.send(command);
        };
        send(format!(
            "setoption name Skill Level value {}",
            settings.skill_level
        ));
        send(format!("setoption name MultiPV value {}", settings.multipv));
        send(format!("setoption name Hash value {}", settings.hash_mb));
        send(format!("setoption name Threads value {}", settings.threads));

        info!(path = %settings.path, "engine ready");
        Ok(Self {
            child,
            commands: command_tx,
            lines: Some(line_rx),
            path,
            closed: false,
        })
    }
}

async fn handshake(
    commands: &mpsc::UnboundedSender<String>,
    lines: &mut mpsc::UnboundedReceiver<String>,
    path: &str,
) -> Result<(), EngineError> {
    let _ = commands.send("uci".to_string());
    loop {
        match time::timeout(HANDSHAKE_TIMEOUT, lines.recv()).await {
            Err(_) => {
                return Err(EngineError::HandshakeTimeout {
                    path: path.to_string(),
                    timeout_ms: HANDSHAKE_TIMEOUT.as_millis() as u64,
                })
            }
            Ok(None) => {
                return Err(EngineError::HandshakeEof {
                    path: path.to_string(),
                })
            }
            Ok(Some(line)) if line.trim() == "uciok" => return Ok(()),
            Ok(Some(_)) => continue,
        }
    }
}

#[async_trait]
impl EngineLink for UciProcess {
    fn send(&self, command: &str) {
        if self.closed {
            return;
        }
        // The writer task may already be gone; that just makes this a no-op.
        let _ = self.commands.send(command.to_string());
    }

    fn take_lines(&mut self) -> mpsc::UnboundedReceiver<String> {
        self.lines.take().unwrap_or_else(closed_line_stream)
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.send("stop");
        self.send("quit");
        self.closed = true;
        match time::timeout(QUIT_GRACE, self.child.wait()).await {
            Ok(status) => debug!(?status, "engine exited"),
            Err(_) => {
                warn!(path = %self.path, "engine ignored quit; killing");
                let _ = self.child.kill().await;
            }
        }
        info!(path = %self.path, "engine closed");
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod transport_tests;
