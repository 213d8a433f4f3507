//! Player sources: the transports that produce `PlayerState` snapshots.
//!
//! Both variants sit behind `PlayerSource` and are chosen from config at
//! startup. A source either answers `fetch_state()` directly (command-line
//! variant) or fires a request whose answer arrives later on the channel
//! returned by `take_state_stream()` (socket variant). Everything a source
//! produces goes through the change detector; errors stop at the ingest task.

pub mod cmd;
pub mod socket;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use volum_proto::config::{SourceConfig, SourceKind};
use volum_proto::protocol::Command;
use volum_proto::state::PlayerState;

pub use cmd::CmdSource;
pub use socket::SocketSource;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("malformed player state: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not connected to the player")]
    NotConnected,
    #[error("encode error: {0}")]
    Encode(String),
}

#[async_trait]
#[allow(dead_code)]
pub trait PlayerSource: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn connect(&mut self) -> Result<(), TransportError>;

    async fn disconnect(&mut self) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    /// Send one transport command to the player.
    async fn send(&mut self, command: Command) -> Result<(), TransportError>;

    /// Ask the player for its state. `Ok(None)` means the reply is delivered
    /// asynchronously on the state stream.
    async fn fetch_state(&mut self) -> Result<Option<PlayerState>, TransportError>;

    /// Channel of pushed states, for sources that have one. Can be taken once.
    fn take_state_stream(&mut self) -> Option<mpsc::Receiver<PlayerState>> {
        None
    }

    /// Set the volume and the mute flag in one go.
    async fn set_volume(&mut self, volume: i32, mute: bool) -> Result<(), TransportError>;

    async fn play(&mut self) -> Result<(), TransportError> {
        self.send(Command::Play).await
    }

    async fn pause(&mut self) -> Result<(), TransportError> {
        self.send(Command::Pause).await
    }

    async fn stop(&mut self) -> Result<(), TransportError> {
        self.send(Command::Stop).await
    }

    async fn next(&mut self) -> Result<(), TransportError> {
        self.send(Command::Next).await
    }

    async fn prev(&mut self) -> Result<(), TransportError> {
        self.send(Command::Prev).await
    }

    async fn mute(&mut self) -> Result<(), TransportError> {
        self.send(Command::Mute).await
    }

    async fn unmute(&mut self) -> Result<(), TransportError> {
        self.send(Command::Unmute).await
    }
}

/// Build the source selected in config.
pub fn from_config(config: &SourceConfig) -> Box<dyn PlayerSource> {
    match config.kind {
        SourceKind::Cmd => Box::new(CmdSource::new(&config.command)),
        SourceKind::Socket => Box::new(SocketSource::new(&config.socket_addr)),
    }
}
