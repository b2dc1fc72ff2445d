//! Kokoro synthesis pipeline.

use std::iter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use regex::Regex;
use sherpa_rs::OnnxConfig;
use sherpa_rs::tts::{CommonTtsConfig, KokoroTts, KokoroTtsConfig};
use tracing::{debug, info};

use crate::config::{EngineConfig, voices};
use crate::error::TtsError;

/// Kokoro always produces 24 kHz audio.
pub const KOKORO_SAMPLE_RATE: u32 = 24000;

/// One piece of synthesized speech.
#[derive(Debug, Clone)]
pub struct Segment {
    pub text: String,      // Text chunk this audio was generated from
    pub samples: Vec<f32>, // Mono samples at the pipeline's sample rate
}

/// Lazily generated segments of one pipeline call.
///
/// Nothing is synthesized until the iterator is pulled; dropping it early skips the
/// remaining chunks.
pub type Segments<'a> = Box<dyn Iterator<Item = Result<Segment>> + 'a>;

/// Text in, audio segments out.
pub trait SpeechPipeline {
    /// Sample rate of every segment this pipeline yields.
    fn sample_rate(&self) -> u32;

    /// Start synthesizing `text` with the given voice and speed.
    fn synthesize<'a>(&'a mut self, text: &'a str, voice: &str, speed: f32) -> Segments<'a>;
}

/// Everything needed for one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
    pub speed: f32,
    pub output: PathBuf,
}

/// Pipeline backed by the sherpa-onnx Kokoro engine.
pub struct KokoroPipeline {
    tts: KokoroTts,      // Kokoro TTS engine
    split_pattern: Regex, // Splits input text into chunks
}

impl KokoroPipeline {
    /// Load the model onto the configured device.
    ///
    /// `voice` decides which lexicon or espeak-ng language the engine is built with;
    /// per-call voices should share its language.
    ///
    /// # Errors
    /// Returns an error if the voice is unknown or the split pattern is not a valid regex.
    pub fn new(config: &EngineConfig, voice: &str) -> Result<Self> {
        let voice = voices::get_voice(voice).ok_or_else(|| TtsError::UnknownVoice(voice.to_string()))?;
        let split_pattern = Regex::new(&config.split_pattern).with_context(|| format!("Invalid split pattern {:?}", config.split_pattern))?;

        info!("Initializing Kokoro pipeline with {} provider", config.provider);
        info!("Voice: {} (speaker ID: {}, {})", voice.name, voice.speaker_id, voice.language.label());

        let tts_config = KokoroTtsConfig {
            model: config.tts_model_path().to_string_lossy().to_string(),
            voices: config.tts_voices_path().to_string_lossy().to_string(),
            tokens: config.tts_tokens_path().to_string_lossy().to_string(),
            data_dir: config.tts_data_dir().to_string_lossy().to_string(),
            dict_dir: config.tts_dict_dir().to_string_lossy().to_string(),
            lexicon: config.tts_lexicon(voice.language),
            lang: voice.language.sherpa_lang().to_string(),
            length_scale: 1.0, // speed is applied per call
            onnx_config: OnnxConfig {
                provider: config.provider.as_sherpa_provider().to_string(),
                num_threads: config.threads.try_into().unwrap_or(1),
                debug: config.verbose,
            },
            common_config: CommonTtsConfig { max_num_sentences: 1, ..Default::default() }, // Kokoro only supports 1
        };

        let tts = KokoroTts::new(tts_config);
        info!("Model loaded on {} device ({} Hz)", config.provider, KOKORO_SAMPLE_RATE);

        Ok(Self { tts, split_pattern })
    }
}

impl SpeechPipeline for KokoroPipeline {
    fn sample_rate(&self) -> u32 {
        KOKORO_SAMPLE_RATE
    }

    fn synthesize<'a>(&'a mut self, text: &'a str, voice: &str, speed: f32) -> Segments<'a> {
        let Some(voice) = voices::get_voice(voice) else {
            return Box::new(iter::once(Err::<Segment, _>(TtsError::UnknownVoice(voice.to_string()).into())));
        };
        let speaker_id = voice.speaker_id;
        let tts = &mut self.tts;

        let chunks = self.split_pattern.split(text).map(str::trim).filter(|chunk| !chunk.is_empty());

        Box::new(chunks.map(move |chunk| -> Result<Segment> {
            debug!("Synthesizing chunk: \"{}\"", chunk);
            let audio = tts.create(chunk, speaker_id, speed).map_err(|e| anyhow::anyhow!("TTS generation failed: {}", e))?;
            debug!("Generated {} samples", audio.samples.len());
            Ok(Segment { text: chunk.to_string(), samples: audio.samples })
        }))
    }
}

/// Synthesize `text` and return only the first segment, abandoning the rest.
pub fn first_segment<P: SpeechPipeline + ?Sized>(pipeline: &mut P, text: &str, voice: &str, speed: f32) -> Result<Option<Segment>> {
    pipeline.synthesize(text, voice, speed).next().transpose()
}

/// Synthesize `text` and concatenate every segment in yield order.
///
/// An empty result means the pipeline yielded nothing.
pub fn render<P: SpeechPipeline + ?Sized>(pipeline: &mut P, text: &str, voice: &str, speed: f32) -> Result<Vec<f32>> {
    let mut samples = Vec::new();
    for segment in pipeline.synthesize(text, voice, speed) {
        samples.extend_from_slice(&segment?.samples);
    }
    Ok(samples)
}

#[cfg(test)]
pub(crate) mod testing {
    use tokio_util::sync::CancellationToken;

    use super::*;

    /// Deterministic pipeline for tests.
    ///
    /// Every text yields two chunks (100 samples of 0.25, then 50 of -0.25) unless it
    /// contains "silence" (no chunks) or "explode" (an error). A text containing "stop"
    /// cancels the token given to [`ScriptedPipeline::cancel_on_stop`] mid-synthesis.
    pub(crate) struct ScriptedPipeline {
        pub sample_rate: u32,
        pub calls: Vec<String>,              // Texts passed to synthesize
        pub pulled: usize,                   // Chunks actually generated
        stop: Option<CancellationToken>,     // Cancelled on "stop"
    }

    impl ScriptedPipeline {
        pub(crate) fn new() -> Self {
            Self { sample_rate: 22050, calls: Vec::new(), pulled: 0, stop: None }
        }

        pub(crate) fn cancel_on_stop(mut self, token: CancellationToken) -> Self {
            self.stop = Some(token);
            self
        }
    }

    impl SpeechPipeline for ScriptedPipeline {
        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn synthesize<'a>(&'a mut self, text: &'a str, _voice: &str, _speed: f32) -> Segments<'a> {
            self.calls.push(text.to_string());
            if let Some(stop) = self.stop.as_ref().filter(|_| text.contains("stop")) {
                stop.cancel();
            }
            if text.contains("explode") {
                return Box::new(iter::once(Err::<Segment, _>(anyhow::anyhow!("synthesis exploded"))));
            }
            let chunks: Vec<(f32, usize)> = if text.contains("silence") { Vec::new() } else { vec![(0.25, 100), (-0.25, 50)] };
            let pulled = &mut self.pulled;

            Box::new(chunks.into_iter().map(move |(value, len)| -> Result<Segment> {
                *pulled += 1;
                Ok(Segment { text: text.to_string(), samples: vec![value; len] })
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedPipeline;
    use super::*;

    #[test]
    fn test_render_concatenates_in_order() {
        let mut pipeline = ScriptedPipeline::new();
        let samples = render(&mut pipeline, "Hello.", "af_heart", 1.0).unwrap();
        assert_eq!(samples.len(), 150);
        assert_eq!(samples[0], 0.25);
        assert_eq!(samples[149], -0.25);
        assert_eq!(pipeline.pulled, 2);
    }

    #[test]
    fn test_first_segment_abandons_the_rest() {
        let mut pipeline = ScriptedPipeline::new();
        let segment = first_segment(&mut pipeline, "Hello.", "af_heart", 1.0).unwrap().unwrap();
        assert_eq!(segment.samples.len(), 100);
        assert_eq!(pipeline.pulled, 1);
    }

    #[test]
    fn test_empty_and_failing_pipelines() {
        let mut pipeline = ScriptedPipeline::new();
        assert!(render(&mut pipeline, "silence", "af_heart", 1.0).unwrap().is_empty());
        assert!(first_segment(&mut pipeline, "silence", "af_heart", 1.0).unwrap().is_none());
        assert!(render(&mut pipeline, "explode", "af_heart", 1.0).is_err());
    }
}
