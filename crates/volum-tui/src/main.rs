mod app;
mod detector;
mod ingest;
mod model;
mod netinfo;
mod scroller;
mod shutdown;
mod source;
mod surface;
mod theme;
mod widgets;

use std::time::Duration;

use volum_proto::config::Config;

use crate::detector::ChangeDetector;
use crate::netinfo::SystemProbe;
use crate::shutdown::{listen_for_signals, Shutdown};
use crate::surface::TerminalSurface;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = volum_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = volum_proto::platform::log_path();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr before the alternate screen hides it.
    eprintln!("volumtui log: {}", log_path.display());

    tracing::info!("volumtui starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("config: {:#}, using defaults", e);
            Config::default()
        }
    };

    // ── Shutdown coordinator + OS signals ────────────────────────────────────
    let shutdown = Shutdown::new();
    shutdown.spawn(listen_for_signals(shutdown.clone()));

    // ── Render surface (fatal if the terminal can't be set up) ──────────────
    let surface = TerminalSurface::init()?;

    // ── Source → ingest → change detector ────────────────────────────────────
    let (detector, updates) = ChangeDetector::new();
    let source = source::from_config(&config.source);
    tracing::info!(
        "source: {} (poll every {} ms)",
        source.name(),
        config.polling.interval_ms
    );
    shutdown.spawn(ingest::run(
        source,
        detector,
        Duration::from_millis(config.polling.interval_ms.max(1)),
        shutdown.clone(),
    ));

    // ── Network details for the footer ───────────────────────────────────────
    let network = netinfo::spawn_monitor(
        Box::new(SystemProbe),
        Duration::from_millis(config.polling.network_interval_ms.max(1)),
        &shutdown,
    );

    // ── Display refresh loop ─────────────────────────────────────────────────
    let feeds = app::Feeds {
        inputs: surface::spawn_input_reader(&shutdown),
        updates,
        network,
    };
    let mut app = app::App::new(surface, &config, shutdown.clone());
    app.run(feeds).await?;

    tracing::info!("volumtui exited cleanly");
    Ok(())
}
