//! Kokoro model provisioning.
//!
//! Missing model files are fetched from the sherpa-onnx release page on first use,
//! unless running offline.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use bzip2::read::BzDecoder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{EngineConfig, MODEL_NAME};
use crate::error::TtsError;

/// Release archive containing `kokoro-multi-lang-v1_0/`.
pub const MODEL_ARCHIVE_URL: &str = "https://github.com/k2-fsa/sherpa-onnx/releases/download/tts-models/kokoro-multi-lang-v1_0.tar.bz2";

/// Staging directory name under `<model-dir>/tts` while extracting.
const STAGING_DIR: &str = ".download";

/// Make sure every model file is on disk, downloading the release if needed.
///
/// A download stops early once `cancel` fires.
///
/// # Errors
/// Returns [`TtsError::MissingModelFile`] when files are missing and `offline` is set,
/// or the download/extraction error otherwise.
pub fn ensure_model(config: &EngineConfig, cancel: &CancellationToken) -> Result<()> {
    let missing = config.missing_files();
    let Some(first) = missing.first() else {
        debug!("Model files present in {}", config.model_root().display());
        return Ok(());
    };

    if config.offline {
        return Err(TtsError::MissingModelFile(first.clone()).into());
    }

    info!("{} model file(s) missing, downloading {}", missing.len(), MODEL_NAME);
    download_model(&config.model_dir.join("tts"), MODEL_ARCHIVE_URL, cancel)?;

    config.validate()?;
    info!("Model ready in {}", config.model_root().display());
    Ok(())
}

/// Download and unpack the release archive into `tts_dir`.
///
/// Extraction happens in a staging directory that is renamed into place once
/// complete, so an interrupted download never leaves a half-populated model.
fn download_model(tts_dir: &Path, url: &str, cancel: &CancellationToken) -> Result<()> {
    let staging = tts_dir.join(STAGING_DIR);
    if staging.exists() {
        fs::remove_dir_all(&staging).with_context(|| format!("Failed to clear {}", staging.display()))?;
    }
    fs::create_dir_all(&staging).with_context(|| format!("Failed to create {}", staging.display()))?;

    info!("Downloading {}", url);
    let client = reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Option::<Duration>::None) // the archive is several hundred MB
        .build()
        .context("Failed to create HTTP client")?;

    let response = client.get(url).send().and_then(|r| r.error_for_status()).with_context(|| format!("Failed to download {}", url))?;

    let body = Cancellable { inner: response, cancel: cancel.clone() };
    let mut archive = tar::Archive::new(BzDecoder::new(body));
    archive.unpack(&staging).context("Failed to extract model archive")?;

    install_staged(tts_dir, &staging)
}

/// Reader that fails once its token is cancelled.
struct Cancellable<R> {
    inner: R,
    cancel: CancellationToken,
}

impl<R: Read> Read for Cancellable<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cancel.is_cancelled() {
            return Err(io::Error::other("download cancelled"));
        }
        self.inner.read(buf)
    }
}

/// Move the unpacked model from the staging directory to its final location.
fn install_staged(tts_dir: &Path, staging: &Path) -> Result<()> {
    let unpacked = staging.join(MODEL_NAME);
    if !unpacked.is_dir() {
        anyhow::bail!("Model archive did not contain {}", MODEL_NAME);
    }

    let target = tts_dir.join(MODEL_NAME);
    if target.exists() {
        fs::remove_dir_all(&target).with_context(|| format!("Failed to replace {}", target.display()))?;
    }
    fs::rename(&unpacked, &target).with_context(|| format!("Failed to move model into {}", target.display()))?;
    fs::remove_dir_all(staging).with_context(|| format!("Failed to remove {}", staging.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::Provider;

    fn engine(model_dir: PathBuf, offline: bool) -> EngineConfig {
        EngineConfig { model_dir, provider: Provider::Cpu, threads: 1, split_pattern: r"\n+".to_string(), offline, verbose: false }
    }

    fn populate(root: &Path) {
        fs::create_dir_all(root.join("espeak-ng-data")).unwrap();
        for file in ["model.onnx", "voices.bin", "tokens.txt"] {
            fs::write(root.join(file), b"x").unwrap();
        }
    }

    #[test]
    fn test_offline_missing_model_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = engine(dir.path().to_path_buf(), true);

        let err = ensure_model(&config, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err.downcast_ref::<TtsError>(), Some(TtsError::MissingModelFile(path)) if path.ends_with("model.onnx")));
    }

    #[test]
    fn test_present_model_needs_no_download() {
        let dir = tempfile::tempdir().unwrap();
        let config = engine(dir.path().to_path_buf(), true);
        populate(&config.model_root());

        assert!(config.missing_files().is_empty());
        ensure_model(&config, &CancellationToken::new()).unwrap();
    }

    #[test]
    fn test_cancelled_download_stops_reading() {
        let cancel = CancellationToken::new();
        let mut body = Cancellable { inner: &b"archive bytes"[..], cancel: cancel.clone() };

        let mut buf = [0u8; 7];
        assert_eq!(body.read(&mut buf).unwrap(), 7);

        cancel.cancel();
        let err = body.read(&mut buf).unwrap_err();
        assert_eq!(err.to_string(), "download cancelled");
    }

    #[test]
    fn test_install_staged_replaces_previous_model() {
        let dir = tempfile::tempdir().unwrap();
        let tts_dir = dir.path().join("tts");
        let staging = tts_dir.join(STAGING_DIR);
        populate(&staging.join(MODEL_NAME));
        fs::create_dir_all(tts_dir.join(MODEL_NAME)).unwrap();
        fs::write(tts_dir.join(MODEL_NAME).join("stale.txt"), b"old").unwrap();

        install_staged(&tts_dir, &staging).unwrap();

        assert!(tts_dir.join(MODEL_NAME).join("model.onnx").exists());
        assert!(!tts_dir.join(MODEL_NAME).join("stale.txt").exists());
        assert!(!staging.exists());
    }

    #[test]
    fn test_install_staged_rejects_unexpected_archive() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join(STAGING_DIR);
        fs::create_dir_all(staging.join("something-else")).unwrap();

        assert!(install_staged(dir.path(), &staging).is_err());
    }
}
