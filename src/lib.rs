//! Kokoro text-to-speech converters.
//!
//! Two command-line front ends share this library:
//!
//! - `kokoro-tts` converts one text into one WAV file and exits.
//! - `kokoro-tts-persistent` keeps the model loaded and turns `text|basename` lines
//!   from stdin into one WAV file per sentence.
//!
//! Synthesis runs on Kokoro through sherpa-rs; output is 16-bit mono WAV at 22050 Hz.

pub mod audio;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod oneshot;
pub mod session;
pub mod tts;
