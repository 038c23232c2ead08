use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use nightwatch::config::FeedConfig;
use nightwatch::dashboard::broadcaster::Broadcaster;
use nightwatch::dashboard::poller::Poller;
use nightwatch::server::client::QueryClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging (stderr; stdout carries frames)
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let config = FeedConfig::parse();
    config.request().validate().context("invalid query parameters")?;

    // 2. Broadcaster + one stdout viewer
    let broadcaster = Broadcaster::default();
    let (viewer, mut frames) = broadcaster.add();

    let client = QueryClient::new(config.audio_server.clone(), config.timeout());
    let poller = Poller::new(client, config.request(), broadcaster.clone(), config.interval());
    tracing::info!(server = %config.audio_server, "Polling every {:?}", config.interval());
    tokio::spawn(poller.run());

    // 3. Print frames until stdout goes away
    let mut stdout = tokio::io::stdout();
    while let Some(frame) = frames.recv().await {
        let mut line = serde_json::to_vec(frame.as_ref())?;
        line.push(b'\n');
        if let Err(e) = stdout.write_all(&line).await {
            tracing::warn!("stdout closed: {}", e);
            break;
        }
        stdout.flush().await?;
    }

    broadcaster.remove(&viewer);
    Ok(())
}
