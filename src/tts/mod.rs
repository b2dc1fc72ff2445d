//! Text-to-speech module using sherpa-rs.
//!
//! Provides the Kokoro pipeline and the sentence splitter used by the persistent converter.

mod pipeline;
mod sentences;

pub use pipeline::{KOKORO_SAMPLE_RATE, KokoroPipeline, Segment, Segments, SpeechPipeline, SynthesisRequest, first_segment, render};
pub use sentences::split_sentences;

#[cfg(test)]
pub(crate) use pipeline::testing;
