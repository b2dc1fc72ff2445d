//! Persistent conversion session.
//!
//! Reads `text|basename` requests line by line, writes one WAV file per sentence and
//! reports progress on a line-oriented stdout protocol:
//!
//! - `READY` once the model is loaded and input is accepted
//! - `DONE:<file>` after each file is written
//!
//! Any other output line is free-text diagnostics.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::audio::write_wav;
use crate::config::resolve_output;
use crate::tts::{SpeechPipeline, render, split_sentences};

/// Separates the text from the output base name on an input line.
pub const DELIMITER: char = '|';

/// Base name used when a line carries no delimiter.
pub const DEFAULT_BASE_NAME: &str = "output";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub text: String,
    pub base_name: String,
}

impl Request {
    /// Parse an input line; blank lines yield `None`.
    ///
    /// The line is split at the first delimiter. The delimiter cannot be escaped, so
    /// text containing it is cut short.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (text, base_name) = line.split_once(DELIMITER).unwrap_or((line, DEFAULT_BASE_NAME));
        if base_name.contains(DELIMITER) {
            warn!("Input contains more than one '{}'; text was split at the first one", DELIMITER);
        }

        Some(Self { text: text.to_string(), base_name: base_name.to_string() })
    }

    /// File name for the 1-based sentence `index`.
    pub fn file_name(&self, index: usize) -> String {
        format!("{}_{}.wav", self.base_name, index)
    }
}

/// Writer for the stdout line protocol. Every line is flushed immediately.
pub struct Protocol<W: Write> {
    out: W,
}

impl<W: Write> Protocol<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Announce that requests are accepted.
    pub fn ready(&mut self) -> io::Result<()> {
        self.line("READY")
    }

    /// Announce a finished file.
    pub fn done(&mut self, file: &str) -> io::Result<()> {
        self.line(&format!("DONE:{}", file))
    }

    /// Free-text diagnostic line; consumers must not parse these.
    pub fn note(&mut self, message: &str) -> io::Result<()> {
        self.line(message)
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Ready,
    Processing,
    ShuttingDown,
}

/// Why a session stopped.
#[derive(Debug)]
pub enum SessionEnd {
    /// Input stream closed.
    EndOfInput,
    /// Shutdown was requested through the cancellation token.
    Interrupted,
    /// A request failed; remaining input was not read.
    Failed(anyhow::Error),
}

impl SessionEnd {
    /// Process exit status for this end.
    ///
    /// A failed request has already been reported with an `Error:` line, so every end
    /// is a clean exit.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::SUCCESS
    }
}

/// Print the closing protocol lines for `end`.
pub fn report_shutdown<W: Write>(protocol: &mut Protocol<W>, end: &SessionEnd) {
    let message = match end {
        SessionEnd::EndOfInput => "EOF received, shutting down...".to_string(),
        SessionEnd::Interrupted => "Shutting down persistent TTS...".to_string(),
        SessionEnd::Failed(e) => {
            error!("❌ Session failed: {:#}", e);
            format!("Error: {:#}", e)
        }
    };

    // stdout may already be gone; nothing left to report to.
    let _ = protocol.note(&message);
    let _ = protocol.note("Persistent TTS shutdown complete");
}

enum Outcome {
    Completed,
    Cancelled,
}

/// A conversion session over a loaded pipeline.
pub struct Session<'p, P: SpeechPipeline + ?Sized> {
    pipeline: &'p mut P,            // Loaded model, lent for the session's lifetime
    voice: String,                  // Voice for every request
    speed: f32,                     // Speech speed multiplier
    output_dir: Option<PathBuf>,    // Base for relative output names
    state: SessionState,            // Current lifecycle state
}

impl<'p, P: SpeechPipeline + ?Sized> Session<'p, P> {
    pub fn new(pipeline: &'p mut P, voice: impl Into<String>, speed: f32) -> Self {
        Self { pipeline, voice: voice.into(), speed, output_dir: None, state: SessionState::Starting }
    }

    /// Resolve relative output names against `dir` instead of the working directory.
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Serve requests from `input` until it closes, `cancel` fires or a request fails.
    ///
    /// Emits `READY` first, unless already cancelled, and a shutdown message last. A
    /// request error ends the whole session; no further lines are read.
    pub async fn run<R, W>(&mut self, input: R, protocol: &mut Protocol<W>, cancel: &CancellationToken) -> SessionEnd
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let end = match self.serve(input, protocol, cancel).await {
            Ok(end) => end,
            Err(e) => SessionEnd::Failed(e),
        };
        self.transition(SessionState::ShuttingDown);
        report_shutdown(protocol, &end);
        end
    }

    async fn serve<R, W>(&mut self, input: R, protocol: &mut Protocol<W>, cancel: &CancellationToken) -> Result<SessionEnd>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();

        // Interrupted while the model was loading
        if cancel.is_cancelled() {
            return Ok(SessionEnd::Interrupted);
        }

        self.transition(SessionState::Ready);
        protocol.ready()?;

        loop {
            let line = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(SessionEnd::Interrupted),
                line = lines.next_line() => line?,
            };

            let Some(line) = line else {
                return Ok(SessionEnd::EndOfInput);
            };

            let Some(request) = Request::parse(&line) else {
                continue;
            };

            self.transition(SessionState::Processing);
            if let Outcome::Cancelled = self.process(&request, protocol, cancel).await? {
                return Ok(SessionEnd::Interrupted);
            }
            self.transition(SessionState::Ready);
        }
    }

    /// Synthesize every sentence of one request into its own file.
    async fn process<W: Write>(&mut self, request: &Request, protocol: &mut Protocol<W>, cancel: &CancellationToken) -> Result<Outcome> {
        let sentences = split_sentences(&request.text);
        info!("Processing {} sentence(s) for '{}'", sentences.len(), request.base_name);

        for (index, sentence) in (1..).zip(sentences.iter()) {
            // Synthesis blocks the thread; give pending wakeups a turn first
            tokio::task::yield_now().await;
            if cancel.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }

            let sample_rate = self.pipeline.sample_rate();
            let samples = render(&mut *self.pipeline, sentence, &self.voice, self.speed)?;
            if samples.is_empty() {
                debug!("No audio for sentence {}, skipping", index);
                continue;
            }

            let path = resolve_output(self.output_dir.as_deref(), &request.file_name(index));
            write_wav(&path, &samples, sample_rate)?;
            protocol.done(&path.display().to_string())?;
        }

        Ok(Outcome::Completed)
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Cancel `token` on Ctrl+C or SIGTERM.
pub async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("🛑 Received Ctrl+C, shutting down..."),
                Err(e) => {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                    return;
                }
            }
        }
        _ = terminate() => {
            info!("🛑 Received SIGTERM, shutting down...");
        }
    }

    token.cancel();
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
