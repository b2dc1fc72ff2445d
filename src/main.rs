//! Kokoro TTS - single-shot converter.
//!
//! Usage: `kokoro-tts <text> [voice] [speed] [filename]`

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use kokoro_tts::config::OneShotArgs;
use kokoro_tts::tts::KokoroPipeline;
use kokoro_tts::{logging, model, oneshot};

fn main() -> Result<()> {
    let args = OneShotArgs::from_args();
    logging::init(args.engine.verbose);

    info!("🔊 Kokoro TTS v{}", env!("CARGO_PKG_VERSION"));

    let request = args.request()?;
    let engine = args.engine.resolve();
    engine.log_config();

    model::ensure_model(&engine, &CancellationToken::new())?;
    let mut pipeline = KokoroPipeline::new(&engine, &request.voice)?;

    oneshot::convert(&mut pipeline, &request)?;
    Ok(())
}
