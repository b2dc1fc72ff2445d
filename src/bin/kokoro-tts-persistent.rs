//! Kokoro TTS - persistent converter.
//!
//! Loads the model once, prints `READY`, then converts `text|basename` lines from
//! stdin into `<basename>_<n>.wav` files, printing `DONE:<file>` for each.
//!
//! Usage: `kokoro-tts-persistent <voice> [speed]`

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use kokoro_tts::config::PersistentArgs;
use kokoro_tts::session::{Protocol, Session, SessionEnd, cancel_on_signal, report_shutdown};
use kokoro_tts::tts::KokoroPipeline;
use kokoro_tts::{logging, model};

fn main() -> Result<ExitCode> {
    let args = PersistentArgs::from_args();
    logging::init(args.engine.verbose);

    info!("🔊 Kokoro TTS (persistent) v{}", env!("CARGO_PKG_VERSION"));

    let voice = args.voice()?.to_string();
    let speed = args.speed()?;
    let engine = args.engine.resolve();
    engine.log_config();

    // One worker runs the signal watcher, so signals are seen during model download and
    // load. The session itself runs on this thread and blocks it while synthesizing.
    let runtime = tokio::runtime::Builder::new_multi_thread().worker_threads(1).enable_all().build()?;
    let cancel = CancellationToken::new();
    runtime.spawn(cancel_on_signal(cancel.clone()));

    let mut protocol = Protocol::new(io::stdout());
    protocol.note(&format!("Using device: {}", engine.provider))?;
    protocol.note(&format!("Starting persistent TTS with voice: {}, speed: {}", voice, speed))?;

    if let Err(e) = model::ensure_model(&engine, &cancel) {
        if !cancel.is_cancelled() {
            return Err(e);
        }
        debug!("Model download abandoned: {:#}", e);
        let end = SessionEnd::Interrupted;
        report_shutdown(&mut protocol, &end);
        return Ok(end.exit_code());
    }
    let mut pipeline = KokoroPipeline::new(&engine, &voice)?;

    let end = runtime.block_on(async {
        let mut session = Session::new(&mut pipeline, voice, speed).with_output_dir(args.output_dir.clone());
        session.run(BufReader::new(tokio::io::stdin()), &mut protocol, &cancel).await
    });

    // A pending stdin read would otherwise hold up runtime shutdown.
    runtime.shutdown_background();

    Ok(end.exit_code())
}
