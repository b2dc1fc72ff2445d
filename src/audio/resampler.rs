//! Audio resampling using the rubato FFT-based resampler.

use anyhow::{Context, Result};
use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler};

/// Requested chunk size for FFT-based resampling. rubato may round it up to fit the ratio.
const CHUNK_SIZE: usize = 1024;

/// Number of sub-chunks for FFT processing (higher = better quality but more CPU).
const SUB_CHUNKS: usize = 2;

/// Resample mono audio from one sample rate to another.
///
/// The whole buffer is processed at once. The resampler's output delay is removed and
/// the result holds exactly `ceil(len * to_rate / from_rate)` samples, so the audio is
/// neither shifted nor cut short.
///
/// # Example
/// ```no_run
/// use kokoro_tts::audio::resampler::resample;
///
/// let kokoro_audio = vec![0.0; 24000]; // 1 second at 24kHz
/// let output = resample(&kokoro_audio, 24000, 22050).unwrap();
/// assert_eq!(output.len(), 22050);
/// ```
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = Fft::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        1, // mono
        FixedSync::Input,
    )
    .context("Failed to create resampler")?;

    let chunk_size = resampler.input_frames_next();
    let output_frames_max = resampler.output_frames_max();
    let mut output_buffer = vec![0.0f32; output_frames_max];

    let expected_len = (samples.len() as f64 * to_rate as f64 / from_rate as f64).ceil() as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(delay + expected_len + output_frames_max);

    // Keep feeding (zeros once the input runs out) until the delayed tail is flushed
    let mut position = 0;
    while output.len() < delay + expected_len {
        let end = (position + chunk_size).min(samples.len());
        let mut input_chunk = samples[position..end].to_vec();
        input_chunk.resize(chunk_size, 0.0);
        position = end;

        let input_adapter = InterleavedSlice::new(&input_chunk, 1, chunk_size).context("Failed to create input adapter")?;
        let mut output_adapter = InterleavedSlice::new_mut(&mut output_buffer, 1, output_frames_max).context("Failed to create output adapter")?;

        let (_, frames_written) =
            resampler.process_into_buffer(&input_adapter, &mut output_adapter, None).map_err(|e| anyhow::anyhow!("Resampling error: {}", e))?;
        output.extend_from_slice(&output_buffer[..frames_written]);
    }

    output.drain(..delay);
    output.truncate(expected_len);
    Ok(output)
}
