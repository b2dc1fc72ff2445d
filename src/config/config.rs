//! Command-line configuration for both converters.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Args, Parser};
use tracing::{debug, info};

use super::device::{Provider, select_device};
use super::voices::{self, Language};
use crate::error::TtsError;
use crate::tts::SynthesisRequest;

/// Voice used by the single-shot converter when none is given.
pub const DEFAULT_VOICE: &str = "af_heart";

/// Speech speed multiplier used when none is given.
pub const DEFAULT_SPEED: f32 = 1.3;

/// Output file of the single-shot converter when none is given.
pub const DEFAULT_OUTPUT: &str = "output.wav";

/// Environment variable that overrides the persistent converter's speed argument.
pub const SPEED_ENV: &str = "TTS_SPEED";

/// Directory name of the sherpa-onnx Kokoro release inside `<model-dir>/tts`.
pub const MODEL_NAME: &str = "kokoro-multi-lang-v1_0";

/// Options shared by both converters.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// List all available voices and exit
    #[arg(long)]
    pub list_voices: bool,

    /// Directory containing the Kokoro model files
    #[arg(long, short = 'd', env = "KOKORO_MODEL_DIR", default_value_os_t = default_model_dir())]
    pub model_dir: PathBuf,

    /// Hardware acceleration provider (auto-detected if not specified)
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// Inference threads (0 = auto-detect based on CPU cores)
    #[arg(long, default_value = "0")]
    pub threads: usize,

    /// Regex that splits input text into pipeline chunks
    #[arg(long, default_value = r"\n+")]
    pub split_pattern: String,

    /// Never download missing model files
    #[arg(long)]
    pub offline: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// Single-shot converter: one text in, one WAV file out.
#[derive(Parser, Debug, Clone)]
#[command(name = "kokoro-tts")]
#[command(author, version, about = "Convert text to a WAV file with Kokoro TTS", long_about = None)]
pub struct OneShotArgs {
    /// Text to speak
    #[arg(required_unless_present = "list_voices")]
    pub text: Option<String>,

    /// Voice name (see --list-voices)
    #[arg(default_value = DEFAULT_VOICE)]
    pub voice: String,

    /// Speech speed multiplier
    #[arg(default_value_t = DEFAULT_SPEED, value_parser = parse_speed)]
    pub speed: f32,

    /// Output WAV file
    #[arg(default_value = DEFAULT_OUTPUT)]
    pub filename: PathBuf,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Persistent converter: keeps the model loaded and serves requests from stdin.
#[derive(Parser, Debug, Clone)]
#[command(name = "kokoro-tts-persistent")]
#[command(author, version, about = "Keep Kokoro TTS loaded and convert `text|basename` lines from stdin", long_about = None)]
pub struct PersistentArgs {
    /// Voice name (see --list-voices)
    #[arg(required_unless_present = "list_voices")]
    pub voice: Option<String>,

    /// Speech speed multiplier (TTS_SPEED takes precedence)
    #[arg(value_parser = parse_speed)]
    pub speed: Option<f32>,

    /// Directory that relative output names are resolved against
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

impl OneShotArgs {
    /// Parse arguments, exiting on usage errors and after `--list-voices`.
    pub fn from_args() -> Self {
        let args: Self = parse_or_exit();
        args.engine.handle_list_voices();
        args
    }

    /// Build the synthesis request described by the arguments.
    pub fn request(&self) -> Result<SynthesisRequest> {
        let text = self.text.clone().ok_or_else(|| anyhow::anyhow!("No text given"))?;
        voices::get_voice(&self.voice).ok_or_else(|| TtsError::UnknownVoice(self.voice.clone()))?;

        Ok(SynthesisRequest { text, voice: self.voice.clone(), speed: self.speed, output: self.filename.clone() })
    }
}

impl PersistentArgs {
    /// Parse arguments, exiting on usage errors and after `--list-voices`.
    pub fn from_args() -> Self {
        let args: Self = parse_or_exit();
        args.engine.handle_list_voices();
        args
    }

    /// The requested voice, checked against the catalogue.
    pub fn voice(&self) -> Result<&str> {
        let voice = self.voice.as_deref().ok_or_else(|| anyhow::anyhow!("No voice given"))?;
        voices::get_voice(voice).ok_or_else(|| TtsError::UnknownVoice(voice.to_string()))?;
        Ok(voice)
    }

    /// Effective speed: `TTS_SPEED`, then the positional argument, then the default.
    pub fn speed(&self) -> Result<f32, TtsError> {
        resolve_speed(std::env::var(SPEED_ENV).ok().as_deref(), self.speed)
    }
}

impl EngineArgs {
    fn handle_list_voices(&self) {
        if self.list_voices {
            voices::print_voices();
            std::process::exit(0);
        }
    }

    /// Select the device and size the thread pool.
    pub fn resolve(&self) -> EngineConfig {
        let provider = select_device(self.provider);
        let threads = normalize_threads(self.threads, provider, num_cpus::get());
        debug!("Inference threads: {} ({} provider)", threads, provider);

        EngineConfig {
            model_dir: self.model_dir.clone(),
            provider,
            threads,
            split_pattern: self.split_pattern.clone(),
            offline: self.offline,
            verbose: self.verbose,
        }
    }
}

/// Engine settings after device selection.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub model_dir: PathBuf,
    pub provider: Provider,
    pub threads: usize,
    pub split_pattern: String,
    pub offline: bool,
    pub verbose: bool,
}

impl EngineConfig {
    /// Directory of the unpacked Kokoro release.
    pub fn model_root(&self) -> PathBuf {
        self.model_dir.join("tts").join(MODEL_NAME)
    }

    pub fn tts_model_path(&self) -> PathBuf {
        self.model_root().join("model.onnx")
    }

    pub fn tts_voices_path(&self) -> PathBuf {
        self.model_root().join("voices.bin")
    }

    pub fn tts_tokens_path(&self) -> PathBuf {
        self.model_root().join("tokens.txt")
    }

    /// espeak-ng data used for languages without a lexicon.
    pub fn tts_data_dir(&self) -> PathBuf {
        self.model_root().join("espeak-ng-data")
    }

    /// Dictionary for Chinese word segmentation.
    pub fn tts_dict_dir(&self) -> PathBuf {
        self.model_root().join("dict")
    }

    /// Comma-separated lexicon paths for a language, empty when it uses espeak-ng instead.
    pub fn tts_lexicon(&self, language: Language) -> String {
        let root = self.model_root();
        language.lexicon_files().iter().map(|file| root.join(file).to_string_lossy().to_string()).collect::<Vec<_>>().join(",")
    }

    /// Files that must exist before the engine can be built.
    pub fn required_files(&self) -> Vec<PathBuf> {
        vec![self.tts_model_path(), self.tts_voices_path(), self.tts_tokens_path(), self.tts_data_dir()]
    }

    /// Required files that are not on disk.
    pub fn missing_files(&self) -> Vec<PathBuf> {
        self.required_files().into_iter().filter(|path| !path.exists()).collect()
    }

    /// Fail on the first missing model file.
    pub fn validate(&self) -> Result<(), TtsError> {
        match self.missing_files().into_iter().next() {
            Some(path) => Err(TtsError::MissingModelFile(path)),
            None => Ok(()),
        }
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!("Configuration:");
        info!("  Model directory: {}", self.model_dir.display());
        info!("  Provider: {}", self.provider);
        info!("  Threads: {}", self.threads);
        info!("  Split pattern: {:?}", self.split_pattern);
    }
}

/// Parse arguments, mapping usage errors to exit code 1.
///
/// Help and version output still exit successfully.
fn parse_or_exit<T: Parser>() -> T {
    match T::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = usage_exit_code(e.kind());
            // Printing can only fail if the terminal is gone.
            let _ = e.print();
            std::process::exit(code);
        }
    }
}

/// Exit code for a clap error.
pub fn usage_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// Resolve the speed from the environment value and the command-line value.
///
/// A set but malformed environment value is an error, not a fallback.
pub fn resolve_speed(env_value: Option<&str>, arg: Option<f32>) -> Result<f32, TtsError> {
    match env_value {
        Some(value) => parse_speed(value).map_err(|_| TtsError::InvalidSpeed(value.to_string())),
        None => Ok(arg.unwrap_or(DEFAULT_SPEED)),
    }
}

/// Parse and validate a speed multiplier (positive and finite).
fn parse_speed(s: &str) -> Result<f32, String> {
    let value: f32 = s.trim().parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if value.is_finite() && value > 0.0 { Ok(value) } else { Err(format!("speed must be positive, got {}", value)) }
}

/// One thread on CUDA (the GPU parallelizes), otherwise half the cores.
fn normalize_threads(requested: usize, provider: Provider, cpu_cores: usize) -> usize {
    if requested > 0 {
        requested
    } else if provider == Provider::Cuda {
        1
    } else {
        (cpu_cores / 2).max(1)
    }
}

/// Default model directory (~/.kokoro-tts/models).
fn default_model_dir() -> PathBuf {
    if let Some(home_dir) = dirs::home_dir() {
        home_dir.join(".kokoro-tts").join("models")
    } else {
        PathBuf::from("models")
    }
}

/// Resolve `name` against an optional base directory.
pub fn resolve_output(dir: Option<&Path>, name: &str) -> PathBuf {
    match dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_defaults() {
        let args = OneShotArgs::try_parse_from(["kokoro-tts", "Hello there."]).unwrap();
        let request = args.request().unwrap();
        assert_eq!(request.text, "Hello there.");
        assert_eq!(request.voice, "af_heart");
        assert_eq!(request.speed, 1.3);
        assert_eq!(request.output, PathBuf::from("output.wav"));
    }

    #[test]
    fn test_one_shot_positionals() {
        let args = OneShotArgs::try_parse_from(["kokoro-tts", "Hi", "bf_emma", "0.9", "hi.wav", "--provider", "cpu"]).unwrap();
        let request = args.request().unwrap();
        assert_eq!(request.voice, "bf_emma");
        assert_eq!(request.speed, 0.9);
        assert_eq!(request.output, PathBuf::from("hi.wav"));
        assert_eq!(args.engine.provider, Some(Provider::Cpu));
    }

    #[test]
    fn test_missing_text_is_usage_error() {
        let err = OneShotArgs::try_parse_from(["kokoro-tts"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(usage_exit_code(err.kind()), 1);

        let err = PersistentArgs::try_parse_from(["kokoro-tts-persistent"]).unwrap_err();
        assert_eq!(usage_exit_code(err.kind()), 1);
    }

    #[test]
    fn test_list_voices_needs_no_positionals() {
        let args = OneShotArgs::try_parse_from(["kokoro-tts", "--list-voices"]).unwrap();
        assert!(args.engine.list_voices);
        assert!(args.text.is_none());
    }

    #[test]
    fn test_bad_speed_rejected() {
        let err = OneShotArgs::try_parse_from(["kokoro-tts", "Hi", "af_heart", "fast"]).unwrap_err();
        assert_eq!(usage_exit_code(err.kind()), 1);
        assert!(parse_speed("-1").is_err());
        assert!(parse_speed("0").is_err());
    }

    #[test]
    fn test_unknown_voice_rejected() {
        let args = OneShotArgs::try_parse_from(["kokoro-tts", "Hi", "xx_nobody"]).unwrap();
        let err = args.request().unwrap_err();
        assert!(matches!(err.downcast_ref::<TtsError>(), Some(TtsError::UnknownVoice(v)) if v == "xx_nobody"));
    }

    #[test]
    fn test_speed_resolution_order() {
        assert_eq!(resolve_speed(Some("1.7"), Some(0.8)).unwrap(), 1.7);
        assert_eq!(resolve_speed(None, Some(0.8)).unwrap(), 0.8);
        assert_eq!(resolve_speed(None, None).unwrap(), DEFAULT_SPEED);
        assert!(matches!(resolve_speed(Some("abc"), Some(0.8)), Err(TtsError::InvalidSpeed(_))));
    }

    #[test]
    fn test_thread_normalization() {
        assert_eq!(normalize_threads(3, Provider::Cuda, 8), 3);
        assert_eq!(normalize_threads(0, Provider::Cuda, 8), 1);
        assert_eq!(normalize_threads(0, Provider::Cpu, 8), 4);
        assert_eq!(normalize_threads(0, Provider::Cpu, 1), 1);
    }

    #[test]
    fn test_model_paths_and_lexicon() {
        let args = OneShotArgs::try_parse_from(["kokoro-tts", "Hi", "--model-dir", "/models", "--provider", "cpu"]).unwrap();
        let config = args.engine.resolve();
        assert_eq!(config.tts_model_path(), PathBuf::from("/models/tts/kokoro-multi-lang-v1_0/model.onnx"));
        assert_eq!(config.tts_lexicon(Language::BritishEnglish), "/models/tts/kokoro-multi-lang-v1_0/lexicon-gb-en.txt");
        assert_eq!(
            config.tts_lexicon(Language::MandarinChinese),
            "/models/tts/kokoro-multi-lang-v1_0/lexicon-us-en.txt,/models/tts/kokoro-multi-lang-v1_0/lexicon-zh.txt"
        );
        assert_eq!(config.tts_lexicon(Language::French), "");
    }

    #[test]
    fn test_resolve_output() {
        assert_eq!(resolve_output(None, "take1_1.wav"), PathBuf::from("take1_1.wav"));
        assert_eq!(resolve_output(Some(Path::new("/tmp/out")), "take1_1.wav"), PathBuf::from("/tmp/out/take1_1.wav"));
    }
}
