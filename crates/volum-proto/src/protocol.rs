use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::PlayerState;

/// Event name the player uses to push a fresh state snapshot.
pub const PUSH_STATE: &str = "pushState";

/// Transport commands understood by both player transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetState,
    Play,
    Pause,
    Stop,
    Next,
    Prev,
    Mute,
    Unmute,
    Volume(i32),
}

impl Command {
    /// Arguments for the command-line control utility (`volumio <args>`).
    pub fn cli_args(&self) -> Vec<String> {
        let args: &[&str] = match self {
            Command::GetState => &["status"],
            Command::Play => &["play"],
            Command::Pause => &["pause"],
            Command::Stop => &["stop"],
            Command::Next => &["next"],
            Command::Prev => &["previous"],
            Command::Mute => &["volume", "mute"],
            Command::Unmute => &["volume", "unmute"],
            Command::Volume(v) => return vec!["volume".to_string(), v.to_string()],
        };
        args.iter().map(|s| s.to_string()).collect()
    }

    /// Event frame for the push transport.
    pub fn frame(&self) -> EventFrame {
        match self {
            Command::GetState => EventFrame::new("getState"),
            Command::Play => EventFrame::new("play"),
            Command::Pause => EventFrame::new("pause"),
            Command::Stop => EventFrame::new("stop"),
            Command::Next => EventFrame::new("next"),
            Command::Prev => EventFrame::new("prev"),
            Command::Mute => EventFrame::new("mute"),
            Command::Unmute => EventFrame::new("unmute"),
            Command::Volume(v) => EventFrame::with_data("volume", Value::from(*v)),
        }
    }
}

/// A single newline-delimited JSON frame on the push transport:
/// `{"event": "<name>", "data": <payload>}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventFrame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl EventFrame {
    pub fn new(event: &str) -> Self {
        Self {
            event: event.to_string(),
            data: None,
        }
    }

    pub fn with_data(event: &str, data: Value) -> Self {
        Self {
            event: event.to_string(),
            data: Some(data),
        }
    }

    /// Serialise to a single line, terminator included.
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim())
    }

    /// Decode the payload of a `pushState` frame. `None` for any other event.
    pub fn pushed_state(&self) -> Option<Result<PlayerState, serde_json::Error>> {
        if self.event != PUSH_STATE {
            return None;
        }
        let data = self.data.clone().unwrap_or(Value::Null);
        Some(serde_json::from_value(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args() {
        assert_eq!(Command::GetState.cli_args(), vec!["status"]);
        assert_eq!(Command::Prev.cli_args(), vec!["previous"]);
        assert_eq!(Command::Unmute.cli_args(), vec!["volume", "unmute"]);
        assert_eq!(Command::Volume(35).cli_args(), vec!["volume", "35"]);
    }

    #[test]
    fn test_frame_encoding() {
        let line = Command::GetState.frame().encode().unwrap();
        assert_eq!(line, "{\"event\":\"getState\"}\n");

        let line = Command::Volume(60).frame().encode().unwrap();
        assert_eq!(line, "{\"event\":\"volume\",\"data\":60}\n");
    }

    #[test]
    fn test_pushed_state() {
        let frame =
            EventFrame::decode(r#"{"event":"pushState","data":{"title":"Dazed","volume":12}}"#)
                .unwrap();
        let state = frame.pushed_state().unwrap().unwrap();
        assert_eq!(state.title, "Dazed");
        assert_eq!(state.volume, 12);

        let other = EventFrame::decode(r#"{"event":"pushQueue","data":[]}"#).unwrap();
        assert!(other.pushed_state().is_none());
    }

    #[test]
    fn test_pushed_state_with_bad_payload() {
        let frame = EventFrame::decode(r#"{"event":"pushState","data":{"seek":"soon"}}"#).unwrap();
        assert!(matches!(frame.pushed_state(), Some(Err(_))));
    }
}
