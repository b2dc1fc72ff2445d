//! Audio output: resampling to the fixed output rate and WAV encoding.

pub mod resampler;
pub mod wav;

pub use wav::{OUTPUT_SAMPLE_RATE, write_wav};
