//! Command-line source: runs the player's control utility for every request
//! and decodes its JSON reply.

use std::process::Stdio;

use async_trait::async_trait;
use tracing::{debug, error};
use volum_proto::protocol::Command;
use volum_proto::state::PlayerState;

use super::{PlayerSource, TransportError};

pub struct CmdSource {
    program: String,
    /// Leading arguments from the configured command line (e.g. `ssh host volumio`).
    base_args: Vec<String>,
}

impl CmdSource {
    pub fn new(command_line: &str) -> Self {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "volumio".to_string());
        Self {
            program,
            base_args: parts.collect(),
        }
    }

    fn describe(&self, args: &[String]) -> String {
        let mut s = self.program.clone();
        for a in self.base_args.iter().chain(args) {
            s.push(' ');
            s.push_str(a);
        }
        s
    }

    /// Run one command to completion and return its stdout.
    async fn run(&self, command: &Command) -> Result<Vec<u8>, TransportError> {
        let args = command.cli_args();
        let described = self.describe(&args);
        debug!("cmd source: running `{}`", described);

        let output = tokio::process::Command::new(&self.program)
            .args(&self.base_args)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| TransportError::Spawn {
                command: described.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TransportError::CommandFailed {
                command: described,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl PlayerSource for CmdSource {
    fn name(&self) -> &'static str {
        "cmd"
    }

    async fn connect(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn send(&mut self, command: Command) -> Result<(), TransportError> {
        self.run(&command).await.map(|_| ())
    }

    async fn fetch_state(&mut self) -> Result<Option<PlayerState>, TransportError> {
        let raw = self.run(&Command::GetState).await?;
        Ok(Some(PlayerState::from_json(&raw)?))
    }

    async fn set_volume(&mut self, volume: i32, mute: bool) -> Result<(), TransportError> {
        if !(0..=100).contains(&volume) {
            error!("cmd source: illegal volume value: {}", volume);
        }
        if mute {
            self.send(Command::Mute).await?;
        } else {
            self.send(Command::Unmute).await?;
        }
        self.send(Command::Volume(volume)).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_is_split() {
        let src = CmdSource::new("ssh volumio.local volumio");
        assert_eq!(src.program, "ssh");
        assert_eq!(src.base_args, vec!["volumio.local", "volumio"]);
        assert_eq!(
            src.describe(&Command::GetState.cli_args()),
            "ssh volumio.local volumio status"
        );
    }

    #[tokio::test]
    async fn test_fetch_state_decodes_stdout() {
        // printf echoes its first argument and ignores the trailing `status`.
        let mut src = CmdSource::new(r#"printf {"title":"Spoonful","volume":33,"status":"play"}"#);
        let state = src.fetch_state().await.unwrap().unwrap();
        assert_eq!(state.title, "Spoonful");
        assert_eq!(state.volume, 33);
    }

    #[tokio::test]
    async fn test_non_json_reply_is_a_decode_error() {
        let mut src = CmdSource::new("echo");
        let err = src.fetch_state().await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)), "{err}");
    }

    #[tokio::test]
    async fn test_failing_command_reports_status() {
        let mut src = CmdSource::new("false");
        let err = src.fetch_state().await.unwrap_err();
        assert!(matches!(err, TransportError::CommandFailed { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let mut src = CmdSource::new("/nonexistent/volumio-ctl");
        let err = src.fetch_state().await.unwrap_err();
        assert!(matches!(err, TransportError::Spawn { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_transport_commands_run_the_utility() {
        let mut src = CmdSource::new("true");
        src.play().await.unwrap();
        src.next().await.unwrap();
        src.set_volume(150, true).await.unwrap();
        assert!(src.is_connected());
    }
}
