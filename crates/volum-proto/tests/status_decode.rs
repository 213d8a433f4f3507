//! Decoding of real-world Volumio status replies.

use volum_proto::protocol::EventFrame;
use volum_proto::state::{PlaybackStatus, PlayerState};

const WEBRADIO_STATUS: &str = r#"{
  "status": "play",
  "position": 0,
  "title": "Radio Paradise - Main Mix",
  "artist": null,
  "album": null,
  "albumart": "/albumart",
  "uri": "http://stream.radioparadise.com/flac",
  "trackType": "webradio",
  "seek": 3725000,
  "duration": 0,
  "samplerate": "44.1 KHz",
  "bitdepth": "16 bit",
  "channels": 2,
  "random": false,
  "repeat": false,
  "repeatSingle": false,
  "consume": false,
  "volume": 42,
  "dbVolume": null,
  "disableVolumeControl": false,
  "mute": false,
  "stream": "webradio",
  "updatedb": false,
  "volatile": false,
  "service": "webradio"
}"#;

#[test]
fn webradio_status_ignores_extra_fields() {
    let state = PlayerState::from_json(WEBRADIO_STATUS.as_bytes()).unwrap();
    assert_eq!(state.status, PlaybackStatus::Play);
    assert_eq!(state.artist, "");
    assert_eq!(state.duration, 0);
    assert_eq!(state.seek, 3_725_000);
    assert_eq!(state.service, "webradio");
    assert_eq!(state.track_type, "webradio");
}

#[test]
fn pushed_and_polled_states_compare_equal() {
    let polled = PlayerState::from_json(WEBRADIO_STATUS.as_bytes()).unwrap();
    let line = format!(
        "{{\"event\":\"pushState\",\"data\":{}}}",
        WEBRADIO_STATUS.replace('\n', "")
    );
    let pushed = EventFrame::decode(&line)
        .unwrap()
        .pushed_state()
        .unwrap()
        .unwrap();
    assert_eq!(polled, pushed);
}

#[test]
fn empty_reply_is_an_error() {
    assert!(PlayerState::from_json(b"").is_err());
}
