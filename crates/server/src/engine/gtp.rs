//! GTP engine session over a child process (async I/O)
//!
//! One session per request: `Created → Initialized → Replayed → Analyzing →
//! Terminated`. The process is killed on [`GtpSession::terminate`] and, as a
//! fallback, when the session is dropped.

use std::process::Stdio;
use std::time::Duration;

use go_core::{BoardSize, Color, Policy, RowOrigin};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use super::error::EngineError;
use super::EngineCommand;

/// How long `terminate` waits for the killed process to be reaped.
const REAP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Initialized,
    Replayed,
    Analyzing,
    Terminated,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Bound on every single read from the engine
    pub timeout: Duration,
    /// Log all traffic at info instead of debug
    pub trace: bool,
}

/// A parsed `=` / `?` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GtpReply {
    Success(String),
    Failure(String),
}

pub struct GtpSession {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    state: SessionState,
    size: Option<BoardSize>,
    options: SessionOptions,
}

impl GtpSession {
    /// Spawn the engine process. No command is sent yet.
    pub async fn spawn(command: &EngineCommand, options: SessionOptions) -> Result<Self, EngineError> {
        let mut process = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Spawn {
                program: command.program.clone(),
                source: e,
            })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Crashed("engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Crashed("engine stdout not captured".into()))?;

        debug!(program = %command.program, pid = ?process.id(), "Engine started");

        Ok(Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            state: SessionState::Created,
            size: None,
            options,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn require(&self, expected: SessionState, operation: &'static str) -> Result<(), EngineError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(EngineError::State {
                state: self.state,
                operation,
            })
        }
    }

    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        if self.options.trace {
            info!(cmd, "GTP <");
        } else {
            debug!(cmd, "GTP <");
        }
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| EngineError::Crashed(format!("failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| EngineError::Crashed(format!("failed to flush engine stdin: {e}")))?;
        Ok(())
    }

    /// Next output line without its line ending. `None` on end of stream.
    async fn read_line(&mut self) -> Result<Option<String>, EngineError> {
        let timeout = self.options.timeout;
        let mut line = String::new();
        let n = tokio::time::timeout(timeout, self.stdout.read_line(&mut line))
            .await
            .map_err(|_| EngineError::Timeout(timeout))?
            .map_err(|e| EngineError::Crashed(format!("failed to read from engine: {e}")))?;
        if n == 0 {
            return Ok(None);
        }

        let line = line.trim_end_matches(['\r', '\n']).to_string();
        if self.options.trace {
            info!(line = %line, "GTP >");
        } else {
            debug!(line = %line, "GTP >");
        }
        Ok(Some(line))
    }

    async fn expect_line(&mut self) -> Result<String, EngineError> {
        self.read_line()
            .await?
            .ok_or_else(|| EngineError::Crashed("engine closed its output".into()))
    }

    /// First line of a response: `=`/`?`, optional id, then text.
    async fn read_header(&mut self) -> Result<GtpReply, EngineError> {
        loop {
            let line = self.expect_line().await?;
            if line.trim().is_empty() {
                continue;
            }
            return parse_reply_header(&line).ok_or_else(|| {
                EngineError::Crashed(format!("unexpected engine output {line:?}"))
            });
        }
    }

    /// Send a command and read its full response (up to the blank line).
    pub async fn command(&mut self, cmd: &str) -> Result<GtpReply, EngineError> {
        self.send(cmd).await?;
        let mut reply = self.read_header().await?;

        loop {
            let line = self.expect_line().await?;
            if line.trim().is_empty() {
                break;
            }
            match &mut reply {
                GtpReply::Success(text) | GtpReply::Failure(text) => {
                    text.push('\n');
                    text.push_str(line.trim());
                }
            }
        }
        Ok(reply)
    }

    async fn command_ok(&mut self, cmd: &str) -> Result<String, EngineError> {
        match self.command(cmd).await? {
            GtpReply::Success(text) => Ok(text),
            GtpReply::Failure(message) => Err(EngineError::Rejected {
                command: cmd.to_string(),
                message,
            }),
        }
    }

    /// `boardsize` + `clear_board`.
    pub async fn setup(&mut self, size: BoardSize) -> Result<(), EngineError> {
        self.require(SessionState::Created, "set up the board")?;
        self.command_ok(&format!("boardsize {size}")).await?;
        self.command_ok("clear_board").await?;
        self.size = Some(size);
        self.state = SessionState::Initialized;
        Ok(())
    }

    /// Play every move in order. Moves the engine refuses are skipped.
    /// Returns how many were accepted.
    pub async fn replay(&mut self, plays: &[(Color, String)]) -> Result<usize, EngineError> {
        self.require(SessionState::Initialized, "replay moves")?;
        let mut accepted = 0;
        for (color, vertex) in plays {
            let cmd = format!("play {} {vertex}", color.gtp());
            match self.command(&cmd).await? {
                GtpReply::Success(_) => accepted += 1,
                GtpReply::Failure(message) => {
                    warn!(cmd = %cmd, message = %message, "Engine refused move, skipping");
                }
            }
        }
        self.state = SessionState::Replayed;
        Ok(accepted)
    }

    /// `genmove`: a vertex, `pass` or `resign`.
    pub async fn genmove(&mut self, color: Color) -> Result<String, EngineError> {
        self.require(SessionState::Replayed, "generate a move")?;
        self.state = SessionState::Analyzing;

        let reply = self.command_ok(&format!("genmove {}", color.gtp())).await?;
        let vertex = reply.trim().to_string();
        let valid = match self.size {
            Some(size) => is_engine_move(&vertex, size),
            None => false,
        };
        if !valid {
            return Err(EngineError::Crashed(format!(
                "unexpected genmove reply {vertex:?}"
            )));
        }
        Ok(vertex)
    }

    /// Stream `kata-analyze` and collect priors until `max_candidates`
    /// entries have been reported or the engine closes its output.
    pub async fn analyze(
        &mut self,
        interval: u32,
        max_candidates: usize,
    ) -> Result<Policy, EngineError> {
        self.require(SessionState::Replayed, "analyze")?;
        self.state = SessionState::Analyzing;

        let cmd = format!("kata-analyze interval {interval}");
        self.send(&cmd).await?;
        if let GtpReply::Failure(message) = self.read_header().await? {
            return Err(EngineError::Rejected {
                command: cmd,
                message,
            });
        }

        let mut policy = Policy::new();
        let mut reported = 0;
        'stream: while let Some(line) = self.read_line().await? {
            if !line.starts_with("info") {
                continue;
            }
            for (label, prior) in parse_info_moves(&line) {
                if let Some(prior) = prior {
                    policy.insert(label, prior);
                }
                reported += 1;
                if reported >= max_candidates {
                    break 'stream;
                }
            }
        }

        debug!(reported, candidates = policy.len(), "Analysis collected");
        Ok(policy)
    }

    /// Kill the engine and wait (briefly) for it to exit.
    pub async fn terminate(&mut self) {
        if self.state == SessionState::Terminated {
            return;
        }
        self.state = SessionState::Terminated;
        let _ = self.process.start_kill();
        if tokio::time::timeout(REAP_TIMEOUT, self.process.wait()).await.is_err() {
            warn!(pid = ?self.process.id(), "Engine did not exit after kill");
        }
        debug!("Engine terminated");
    }
}

impl Drop for GtpSession {
    fn drop(&mut self) {
        if self.state != SessionState::Terminated {
            let _ = self.process.start_kill();
        }
    }
}

/// Parse `=` / `?` with an optional numeric id.
fn parse_reply_header(line: &str) -> Option<GtpReply> {
    let line = line.trim();
    let mut chars = line.chars();
    let success = match chars.next()? {
        '=' => true,
        '?' => false,
        _ => return None,
    };
    let text = chars
        .as_str()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim()
        .to_string();
    Some(if success {
        GtpReply::Success(text)
    } else {
        GtpReply::Failure(text)
    })
}

/// Split a `kata-analyze` line into `(move, prior)` pairs. One line carries
/// one `info move ...` segment per candidate.
fn parse_info_moves(line: &str) -> Vec<(&str, Option<f64>)> {
    line.split("info move")
        .filter_map(|segment| {
            let parts: Vec<&str> = segment.split_whitespace().collect();
            let label = *parts.first()?;
            let prior = parts
                .iter()
                .position(|p| *p == "prior")
                .and_then(|i| parts.get(i + 1))
                .and_then(|v| v.parse().ok());
            Some((label, prior))
        })
        .collect()
}

/// A move `genmove` may legitimately answer with on this board.
fn is_engine_move(reply: &str, size: BoardSize) -> bool {
    reply.eq_ignore_ascii_case("pass")
        || reply.eq_ignore_ascii_case("resign")
        || RowOrigin::Bottom.point(reply, size).is_some()
}
