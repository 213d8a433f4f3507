//! Title scroller. Rotates the current title on its own clock so the title
//! field keeps moving between (infrequent) state updates.
//!
//! `ScrollState` is the pure state machine; `TitleScroller` runs it in a
//! task that ticks every `interval_ms` and sends each rotated string to the
//! display loop.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use volum_proto::config::ScrollerConfig;

use crate::shutdown::Shutdown;

/// Rotation state for one title.
///
/// `current` is always `original + padding` rotated left by `offset`
/// characters, or empty while idle.
#[derive(Debug, Clone)]
pub struct ScrollState {
    original: String,
    current: String,
    padding: String,
    offset: usize,
    increment: usize,
}

impl ScrollState {
    pub fn new(padding: &str, increment: usize) -> Self {
        Self {
            original: String::new(),
            current: String::new(),
            padding: padding.to_string(),
            offset: 0,
            increment,
        }
    }

    /// Switch to `title`. Returns `false` when it is already the one being
    /// scrolled, so a repeated title never makes the field jump.
    pub fn update(&mut self, title: &str) -> bool {
        if title == self.original {
            return false;
        }
        self.original = title.to_string();
        self.offset = 0;
        self.current = if title.is_empty() {
            String::new()
        } else {
            format!("{}{}", title, self.padding)
        };
        true
    }

    /// Rotate left by `increment` characters. `None` while idle.
    pub fn tick(&mut self) -> Option<&str> {
        if self.original.is_empty() {
            return None;
        }
        let padded: Vec<char> = self.original.chars().chain(self.padding.chars()).collect();
        let len = padded.len();
        self.offset = (self.offset + self.increment) % len;
        self.current = padded[self.offset..]
            .iter()
            .chain(&padded[..self.offset])
            .collect();
        Some(&self.current)
    }

    #[cfg(test)]
    pub fn current(&self) -> &str {
        &self.current
    }

    #[cfg(test)]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Handle to the scroller task. Owned by the display loop.
pub struct TitleScroller {
    titles_tx: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TitleScroller {
    /// Start the ticker. The returned receiver yields one rotated title per
    /// tick and ends when the scroller is closed.
    pub fn spawn(config: &ScrollerConfig, shutdown: &Shutdown) -> (Self, mpsc::Receiver<String>) {
        let (titles_tx, titles_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::channel(8);
        let cancel = shutdown.child_token();
        let state = ScrollState::new(&config.padding, config.increment.max(1));
        let period = Duration::from_millis(config.interval_ms.max(1));

        let handle = shutdown.spawn(run(state, titles_rx, out_tx, period, cancel.clone()));

        let scroller = Self {
            titles_tx,
            cancel,
            handle: Some(handle),
        };
        (scroller, out_rx)
    }

    pub fn update(&self, title: &str) {
        if self.titles_tx.send(title.to_string()).is_err() {
            debug!("scroller: update after close ignored");
        }
    }

    /// Stop the ticker and close the output channel. Safe to call twice.
    pub async fn close(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("scroller: task ended abnormally: {}", e);
            }
        }
    }
}

async fn run(
    mut state: ScrollState,
    mut titles_rx: mpsc::UnboundedReceiver<String>,
    out_tx: mpsc::Sender<String>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        // Queued titles go first so a tick never rotates a title that has
        // already been replaced.
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            title = titles_rx.recv() => match title {
                Some(title) => {
                    if state.update(&title) {
                        debug!("scroller: now scrolling {:?}", title);
                    }
                }
                None => break,
            },

            _ = ticker.tick() => {
                let Some(rotated) = state.tick().map(str::to_owned) else {
                    continue;
                };
                // Never block on a consumer that has stopped reading.
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    sent = out_tx.send(rotated) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
    debug!("scroller: stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::ShutdownReason;

    #[test]
    fn test_rotation_preserves_length() {
        let mut s = ScrollState::new("  *  ", 1);
        s.update("White Room");
        let expected = "White Room".chars().count() + 5;
        for _ in 0..100 {
            let rotated = s.tick().unwrap();
            assert_eq!(rotated.chars().count(), expected);
        }
    }

    #[test]
    fn test_rotation_is_a_cyclic_left_shift() {
        let mut s = ScrollState::new("--", 2);
        s.update("abc");
        assert_eq!(s.current(), "abc--");
        assert_eq!(s.tick(), Some("c--ab"));
        assert_eq!(s.offset(), 2);
        assert_eq!(s.tick(), Some("-abc-"));
        assert_eq!(s.tick(), Some("bc--a"));
        assert_eq!(s.offset(), 1);
    }

    #[test]
    fn test_rotation_counts_characters_not_bytes() {
        let mut s = ScrollState::new(" ", 1);
        s.update("Björk");
        assert_eq!(s.tick(), Some("jörk B"));
        assert_eq!(s.tick(), Some("örk Bj"));
    }

    #[test]
    fn test_new_title_resets_rotation() {
        let mut s = ScrollState::new("   ", 1);
        s.update("A");
        s.tick();
        s.tick();
        assert_ne!(s.offset(), 0);

        assert!(s.update("B"));
        assert_eq!(s.offset(), 0);
        assert_eq!(s.current(), "B   ");
        assert_eq!(s.original, "B");
    }

    #[test]
    fn test_same_title_keeps_rotation() {
        let mut s = ScrollState::new("   ", 1);
        s.update("Crossroads");
        s.tick();
        let before = s.current().to_string();
        assert!(!s.update("Crossroads"));
        assert_eq!(s.current(), before);
        assert_eq!(s.offset(), 1);
    }

    #[test]
    fn test_idle_ticks_do_nothing() {
        let mut s = ScrollState::new("   ", 1);
        assert!(s.current().is_empty());
        assert_eq!(s.tick(), None);

        s.update("x");
        s.update("");
        assert!(s.current().is_empty());
        assert_eq!(s.tick(), None);
    }

    #[test]
    fn test_increment_larger_than_text_wraps() {
        let mut s = ScrollState::new("", 7);
        s.update("abc");
        assert_eq!(s.tick(), Some("bca"));
    }

    fn config() -> ScrollerConfig {
        ScrollerConfig {
            interval_ms: 500,
            padding: "--".to_string(),
            increment: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_emits_rotations_and_resets() {
        let shutdown = Shutdown::new();
        let (mut scroller, mut rx) = TitleScroller::spawn(&config(), &shutdown);

        scroller.update("abc");
        assert_eq!(rx.recv().await.as_deref(), Some("bc--a"));
        assert_eq!(rx.recv().await.as_deref(), Some("c--ab"));

        scroller.update("xyz");
        assert_eq!(rx.recv().await.as_deref(), Some("yz--x"));

        scroller.close().await;
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_title_wins_over_due_tick() {
        let shutdown = Shutdown::new();
        let (mut scroller, mut rx) = TitleScroller::spawn(&config(), &shutdown);

        // Both titles are queued before the task first runs, while its
        // first tick is already due.
        scroller.update("abc");
        scroller.update("xyz");
        let begun = tokio::time::Instant::now();
        assert_eq!(rx.recv().await.as_deref(), Some("yz--x"));
        assert!(begun.elapsed() < Duration::from_millis(500));

        scroller.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_is_idempotent_and_does_not_block() {
        let shutdown = Shutdown::new();
        let (mut scroller, rx) = TitleScroller::spawn(&config(), &shutdown);
        scroller.update("a title nobody reads");
        // Let the output buffer fill up with nobody reading.
        tokio::time::sleep(Duration::from_secs(30)).await;

        scroller.close().await;
        scroller.close().await;
        scroller.update("ignored");
        drop(rx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_shutdown() {
        let shutdown = Shutdown::new();
        let (_scroller, mut rx) = TitleScroller::spawn(&config(), &shutdown);
        shutdown.request(ShutdownReason::QuitKey);
        shutdown.await_drain().await;
        assert_eq!(rx.recv().await, None);
    }
}
