//! Single-shot conversion: one request, one file.

use anyhow::Result;
use tracing::{debug, info};

use crate::audio::write_wav;
use crate::error::TtsError;
use crate::tts::{SpeechPipeline, SynthesisRequest, first_segment};

/// Synthesize the request and write the first segment to `request.output`.
///
/// Only the first segment the pipeline yields is kept; the remaining chunks are
/// never generated.
///
/// # Errors
/// Returns [`TtsError::NoAudio`] if the pipeline yields nothing, or the synthesis or
/// write error.
pub fn convert<P: SpeechPipeline + ?Sized>(pipeline: &mut P, request: &SynthesisRequest) -> Result<()> {
    let sample_rate = pipeline.sample_rate();

    info!("Synthesizing {} characters with voice {} at {}x", request.text.chars().count(), request.voice, request.speed);
    let segment = first_segment(pipeline, &request.text, &request.voice, request.speed)?.ok_or_else(|| TtsError::NoAudio(request.text.clone()))?;

    debug!("Keeping first chunk: \"{}\"", segment.text);
    write_wav(&request.output, &segment.samples, sample_rate)?;
    info!("🎵 Wrote {} ({} samples)", request.output.display(), segment.samples.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::testing::ScriptedPipeline;

    fn request(text: &str, output: std::path::PathBuf) -> SynthesisRequest {
        SynthesisRequest { text: text.to_string(), voice: "af_heart".to_string(), speed: 1.3, output }
    }

    #[test]
    fn test_writes_exactly_the_first_segment() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output.wav");
        let mut pipeline = ScriptedPipeline::new();

        convert(&mut pipeline, &request("Hello world. Goodbye.", output.clone())).unwrap();

        let reader = hound::WavReader::open(&output).unwrap();
        assert_eq!(reader.spec().sample_rate, 22050);
        assert_eq!(reader.duration(), 100);
        assert_eq!(pipeline.pulled, 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_no_audio_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output.wav");
        let mut pipeline = ScriptedPipeline::new();

        let err = convert(&mut pipeline, &request("silence", output.clone())).unwrap_err();
        assert!(matches!(err.downcast_ref::<TtsError>(), Some(TtsError::NoAudio(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_synthesis_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output.wav");
        let mut pipeline = ScriptedPipeline::new();

        assert!(convert(&mut pipeline, &request("explode", output.clone())).is_err());
        assert!(!output.exists());
    }
}
