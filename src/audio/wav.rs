//! WAV file output.

use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::debug;

use super::resampler::resample;

/// Sample rate of every file written.
pub const OUTPUT_SAMPLE_RATE: u32 = 22050;

/// Write mono samples to a 16-bit PCM WAV file at [`OUTPUT_SAMPLE_RATE`].
///
/// Samples are resampled from `source_rate` first and clipped to [-1.0, 1.0].
pub fn write_wav(path: &Path, samples: &[f32], source_rate: u32) -> Result<()> {
    let samples = resample(samples, source_rate, OUTPUT_SAMPLE_RATE)?;

    let spec = WavSpec { channels: 1, sample_rate: OUTPUT_SAMPLE_RATE, bits_per_sample: 16, sample_format: SampleFormat::Int };
    let mut writer = WavWriter::create(path, spec).with_context(|| format!("Failed to create {}", path.display()))?;

    for sample in &samples {
        writer.write_sample(to_pcm16(*sample)).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    writer.finalize().with_context(|| format!("Failed to finalize {}", path.display()))?;

    debug!("Wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_at_output_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speech.wav");

        write_wav(&path, &[0.0, 0.5, -0.5, 2.0], OUTPUT_SAMPLE_RATE).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 16383, -16383, i16::MAX]);
    }

    #[test]
    fn test_kokoro_rate_is_converted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speech.wav");

        write_wav(&path, &vec![0.0; 24000], 24000).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 22050);
        assert_eq!(reader.duration(), 22050);
    }

    #[test]
    fn test_unwritable_path_reports_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("speech.wav");
        let err = write_wav(&path, &[0.0], OUTPUT_SAMPLE_RATE).unwrap_err();
        assert!(err.to_string().contains("speech.wav"));
    }
}
