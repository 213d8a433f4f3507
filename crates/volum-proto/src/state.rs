use serde::{Deserialize, Deserializer, Serialize};

/// Player status as reported by Volumio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Play,
    Pause,
    #[default]
    Stop,
    /// Anything the player reports that we don't know about.
    #[serde(other)]
    Unknown,
}

impl PlaybackStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            PlaybackStatus::Play => "▶",
            PlaybackStatus::Pause => "⏸",
            PlaybackStatus::Stop => "■",
            PlaybackStatus::Unknown => "?",
        }
    }
}

/// One snapshot of the player, as decoded from a `status` reply or a
/// `pushState` event.
///
/// Snapshots are never patched in place: every poll or push produces a new
/// value, and two snapshots are "the same" only when every field matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PlayerState {
    #[serde(deserialize_with = "null_default")]
    pub status: PlaybackStatus,
    /// Index of the current track in the play queue.
    #[serde(deserialize_with = "null_default")]
    pub position: u32,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub artist: String,
    #[serde(deserialize_with = "null_default")]
    pub album: String,
    #[serde(rename = "albumart", deserialize_with = "null_default")]
    pub album_art: String,
    /// Elapsed time in milliseconds.
    #[serde(deserialize_with = "null_default")]
    pub seek: u64,
    /// Track length in seconds; 0 for streams and unknown lengths.
    #[serde(deserialize_with = "null_default")]
    pub duration: u64,
    #[serde(rename = "samplerate", deserialize_with = "null_default")]
    pub sample_rate: String,
    #[serde(rename = "bitdepth", deserialize_with = "null_default")]
    pub bit_depth: String,
    #[serde(deserialize_with = "null_default")]
    pub channels: u32,
    /// Signed so an out-of-range value from the player still decodes.
    #[serde(deserialize_with = "null_default")]
    pub volume: i32,
    #[serde(deserialize_with = "null_default")]
    pub mute: bool,
    /// Playback backend, e.g. `mpd` or `webradio`.
    #[serde(deserialize_with = "null_default")]
    pub service: String,
    #[serde(rename = "trackType", deserialize_with = "null_default")]
    pub track_type: String,
}

impl PlayerState {
    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    /// Describe every broken invariant of this snapshot. Empty when valid.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !(0..=100).contains(&self.volume) {
            out.push(format!("volume {} outside 0..=100", self.volume));
        }
        out
    }
}

/// Volumio sends explicit `null`s for fields it has no value for.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
