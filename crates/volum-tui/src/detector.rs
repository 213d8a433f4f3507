//! Change detector: the gate between a player source and the display loop.
//!
//! Owns the single last-known `PlayerState`. A candidate snapshot is emitted
//! only if it differs from that value, so neither the renderer nor the title
//! scroller ever sees a no-op update. Emission is lossless and FIFO; any
//! coalescing of stale states happens on the consumer side.

use tokio::sync::mpsc;
use tracing::{debug, warn};
use volum_proto::state::PlayerState;

pub struct ChangeDetector {
    current: PlayerState,
    updates_tx: mpsc::UnboundedSender<PlayerState>,
}

impl ChangeDetector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlayerState>) {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let detector = Self {
            current: PlayerState::default(),
            updates_tx,
        };
        (detector, updates_rx)
    }

    /// Record `candidate` and emit it iff it differs from the current state.
    pub fn accept(&mut self, candidate: PlayerState) -> bool {
        for violation in candidate.invariant_violations() {
            warn!("player state: {}", violation);
        }

        if candidate == self.current {
            return false;
        }

        debug!(
            "player state changed: {:?} {:?} seek={}ms",
            candidate.status, candidate.title, candidate.seek
        );
        self.current = candidate.clone();
        if self.updates_tx.send(candidate).is_err() {
            debug!("change detector: display loop gone, update dropped");
        }
        true
    }

    #[cfg(test)]
    pub fn current(&self) -> &PlayerState {
        &self.current
    }
}
