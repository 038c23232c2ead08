use anyhow::{anyhow, Context};
use clap::Parser;
use tokio::sync::oneshot;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use nightwatch::audio::capture::Microphone;
use nightwatch::audio::processing::CaptureLoop;
use nightwatch::config::ServerConfig;
use nightwatch::{History, NoiseMonitor, QueryServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let config = ServerConfig::parse();
    config.validate().context("invalid configuration")?;
    tracing::info!("Nightwatch Booting...");

    // 2. Shared history
    let history = History::for_duration(config.buffer_hours, config.sample_time)?;

    // 3. Capture worker. The microphone is opened on the thread that reads it.
    let capture = config.capture();
    let writer = history.clone();
    let (done_tx, done_rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("capture".to_string())
        .spawn(move || {
            let window = capture.window_samples;
            let result = Microphone::open(&capture)
                .and_then(|source| CaptureLoop::new(source, writer, window).run());
            let _ = done_tx.send(result);
        })
        .context("failed to spawn capture thread")?;

    // 4. Query server
    let server = QueryServer::bind(
        config.listen.as_str(),
        history,
        NoiseMonitor::new(config.engine()),
        config.io_timeout(),
    )
    .await
    .with_context(|| format!("failed to bind query server on '{}'", config.listen))?;

    tracing::info!("Nightwatch Active. Press Ctrl+C to stop.");

    // Losing the capture worker means every later answer would be stale.
    tokio::select! {
        _ = server.run() => Ok(()),
        finished = done_rx => match finished {
            Ok(Err(e)) => Err(anyhow::Error::new(e).context("audio capture failed")),
            Ok(Ok(())) => Err(anyhow!("audio capture stopped")),
            Err(_) => Err(anyhow!("capture thread exited unexpectedly")),
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            Ok(())
        }
    }
}
