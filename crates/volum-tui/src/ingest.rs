//! Ingest task. Drives a `PlayerSource` on a fixed interval and feeds every
//! snapshot it produces (polled or pushed) through the change detector.
//!
//! Transport errors end here: they are logged and the next tick retries.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use volum_proto::state::PlayerState;

use crate::detector::ChangeDetector;
use crate::shutdown::Shutdown;
use crate::source::PlayerSource;

pub async fn run(
    mut source: Box<dyn PlayerSource>,
    mut detector: ChangeDetector,
    interval: Duration,
    shutdown: Shutdown,
) {
    let name = source.name();
    let mut pushed = source.take_state_stream();

    if let Err(e) = source.connect().await {
        warn!("{} source: initial connect failed: {}", name, e);
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut failing = false;

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            Some(state) = next_pushed(&mut pushed) => {
                detector.accept(state);
            }

            _ = ticker.tick() => {
                // An in-flight poll is allowed to finish before shutdown completes.
                let _work = shutdown.track_work();
                match source.fetch_state().await {
                    Ok(state) => {
                        if failing {
                            info!("{} source: player reachable again", name);
                            failing = false;
                        }
                        if let Some(state) = state {
                            detector.accept(state);
                        }
                    }
                    Err(e) if failing => debug!("{} source: poll failed: {}", name, e),
                    Err(e) => {
                        warn!("{} source: poll failed: {}", name, e);
                        failing = true;
                    }
                }
            }
        }
    }

    if let Err(e) = source.disconnect().await {
        warn!("{} source: disconnect failed: {}", name, e);
    }
    info!("{} source: ingest stopped", name);
}

async fn next_pushed(rx: &mut Option<mpsc::Receiver<PlayerState>>) -> Option<PlayerState> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
