//! Error conditions that callers need to tell apart.
//!
//! Everything else travels as `anyhow::Error` with context attached.

use std::path::PathBuf;

use thiserror::Error;

/// Failures with a distinct meaning for the command-line tools.
#[derive(Debug, Error)]
pub enum TtsError {
    /// The voice name is not part of the Kokoro v1.0 catalogue.
    #[error("Voice '{0}' not found. Run with --list-voices to see available voices")]
    UnknownVoice(String),

    /// A speed value that is not a positive finite number.
    #[error("Invalid speed '{0}': must be a positive number")]
    InvalidSpeed(String),

    /// A model file is missing and downloading was not allowed.
    #[error("Required model file not found: {}", .0.display())]
    MissingModelFile(PathBuf),

    /// The pipeline finished without yielding any audio.
    #[error("Pipeline produced no audio for \"{0}\"")]
    NoAudio(String),
}
