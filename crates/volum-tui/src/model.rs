//! Display model: every string and number the widgets draw, derived from the
//! last accepted `PlayerState` plus the clock and the network probe.
//!
//! The display loop owns one `DisplayModel` and mutates it only through the
//! entry points below, one per event kind.

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use volum_proto::config::DisplayConfig;
use volum_proto::state::{PlaybackStatus, PlayerState};

use crate::netinfo::NetworkInfo;

#[derive(Debug, Clone)]
pub struct DisplayModel {
    clock_format: String,
    pub label: String,
    pub clock: String,

    pub status: PlaybackStatus,
    /// Title as reported by the player; `title` may be a rotation of it.
    source_title: String,
    pub title: String,
    pub album: String,
    pub artist: String,

    pub bit_depth: String,
    pub sample_rate: String,
    pub track_type: String,
    pub service: String,

    pub elapsed_percent: u64,
    pub playback_label: String,

    pub network: String,
    pub volume: i32,
    pub mute: bool,
}

impl DisplayModel {
    pub fn new(config: &DisplayConfig) -> Self {
        let mut model = Self {
            clock_format: config.clock_format.clone(),
            label: config.label.clone(),
            clock: String::new(),
            status: PlaybackStatus::default(),
            source_title: String::new(),
            title: String::new(),
            album: String::new(),
            artist: String::new(),
            bit_depth: String::new(),
            sample_rate: String::new(),
            track_type: String::new(),
            service: String::new(),
            elapsed_percent: elapsed_percent(0, 0),
            playback_label: playback_label(0, 0),
            network: String::new(),
            volume: 0,
            mute: false,
        };
        model.set_clock(Local::now());
        model
    }

    /// Recompute everything derived from a new snapshot.
    ///
    /// The title field keeps its current rotation while the player reports
    /// the same title; only a new title replaces it.
    pub fn apply_state(&mut self, state: &PlayerState) {
        if state.title != self.source_title {
            self.source_title = state.title.clone();
            self.title = state.title.clone();
        }
        self.status = state.status;
        self.album = state.album.clone();
        self.artist = state.artist.clone();

        self.bit_depth = state.bit_depth.clone();
        self.sample_rate = state.sample_rate.clone();
        self.track_type = state.track_type.clone();
        self.service = state.service.clone();

        self.elapsed_percent = elapsed_percent(state.seek, state.duration);
        self.playback_label = playback_label(state.seek, state.duration);

        self.volume = state.volume;
        self.mute = state.mute;
    }

    pub fn set_network(&mut self, network: &NetworkInfo) {
        self.network = network.summary();
    }

    pub fn set_scrolled_title(&mut self, rotated: String) {
        self.title = rotated;
    }

    pub fn set_clock(&mut self, now: DateTime<Local>) {
        let mut clock = String::new();
        // chrono reports a bad format string as a fmt error rather than
        // rendering it.
        if write!(clock, "{}", now.format(&self.clock_format)).is_err() {
            clock.clear();
            let _ = write!(clock, "{}", now.format("%Y-%m-%d %H:%M"));
        }
        self.clock = clock;
    }

    pub fn track_rows(&self) -> [&str; 4] {
        [
            &self.bit_depth,
            &self.sample_rate,
            &self.track_type,
            &self.service,
        ]
    }

    pub fn volume_label(&self) -> String {
        if self.mute {
            "muted".to_string()
        } else {
            self.volume.to_string()
        }
    }

    /// Gauge fill for the volume, clamped to `0.0..=1.0`.
    pub fn volume_ratio(&self) -> f64 {
        (self.volume as f64 / 100.0).clamp(0.0, 1.0)
    }

    /// Gauge fill for playback progress, clamped to `0.0..=1.0`.
    pub fn elapsed_ratio(&self) -> f64 {
        (self.elapsed_percent as f64 / 100.0).clamp(0.0, 1.0)
    }
}

/// Whole percent of the track played, counted in whole elapsed seconds.
/// Streams (duration 0) read as 100.
pub fn elapsed_percent(seek_ms: u64, duration_s: u64) -> u64 {
    if duration_s == 0 {
        return 100;
    }
    let elapsed_s = seek_ms / 1000;
    (elapsed_s as f64 / duration_s as f64 * 100.0).floor() as u64
}

/// `MM:SS`, or `HH:MM:SS` from one hour on.
pub fn fmt_duration(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{:02}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

pub fn playback_label(seek_ms: u64, duration_s: u64) -> String {
    let elapsed = fmt_duration(seek_ms / 1000);
    if duration_s == 0 {
        elapsed
    } else {
        format!("{} - {}", elapsed, fmt_duration(duration_s))
    }
}
