//! Push source over a persistent socket.
//!
//! Architecture:
//!
//! ```text
//!   SocketSource::connect()
//!         │
//!         ├── writer_task  ← event frames via mpsc, one JSON line each → socket
//!         └── reader_task  ← JSON lines from socket
//!                                ├── pushState → decoded PlayerState → state channel
//!                                └── anything else → ignored
//! ```
//!
//! `fetch_state()` only emits `getState`; the reply comes back as a pushed
//! state like any unsolicited update. If the socket drops, the source marks
//! itself disconnected and the next `fetch_state()` reconnects.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use volum_proto::protocol::{Command, EventFrame};
use volum_proto::state::PlayerState;

use super::{PlayerSource, TransportError};

pub struct SocketSource {
    addr: String,
    writer_tx: Option<mpsc::Sender<String>>,
    connected: Arc<AtomicBool>,
    state_tx: mpsc::Sender<PlayerState>,
    state_rx: Option<mpsc::Receiver<PlayerState>>,
    tasks: Vec<JoinHandle<()>>,
}

impl SocketSource {
    pub fn new(addr: &str) -> Self {
        let (state_tx, state_rx) = mpsc::channel(64);
        Self {
            addr: addr.to_string(),
            writer_tx: None,
            connected: Arc::new(AtomicBool::new(false)),
            state_tx,
            state_rx: Some(state_rx),
            tasks: Vec::new(),
        }
    }

    async fn emit(&self, frame: EventFrame) -> Result<(), TransportError> {
        let line = frame
            .encode()
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        let tx = self.writer_tx.as_ref().ok_or(TransportError::NotConnected)?;
        tx.send(line)
            .await
            .map_err(|_| TransportError::NotConnected)
    }

    fn stop_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.writer_tx = None;
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl Drop for SocketSource {
    fn drop(&mut self) {
        self.stop_tasks();
    }
}

#[async_trait]
impl PlayerSource for SocketSource {
    fn name(&self) -> &'static str {
        "socket"
    }

    async fn connect(&mut self) -> Result<(), TransportError> {
        self.stop_tasks();

        let stream = TcpStream::connect(&self.addr).await?;
        info!("socket source: connected to {}", self.addr);
        let (read_half, write_half) = stream.into_split();

        let (writer_tx, writer_rx) = mpsc::channel::<String>(64);
        self.connected.store(true, Ordering::SeqCst);
        self.tasks.push(tokio::spawn(writer_task(
            write_half,
            writer_rx,
            self.connected.clone(),
        )));
        self.tasks.push(tokio::spawn(reader_task(
            BufReader::new(read_half),
            self.state_tx.clone(),
            self.connected.clone(),
        )));
        self.writer_tx = Some(writer_tx);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        if self.writer_tx.is_some() {
            info!("socket source: disconnecting from {}", self.addr);
        }
        self.stop_tasks();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.writer_tx.is_some() && self.connected.load(Ordering::SeqCst)
    }

    async fn send(&mut self, command: Command) -> Result<(), TransportError> {
        self.emit(command.frame()).await
    }

    async fn fetch_state(&mut self) -> Result<Option<PlayerState>, TransportError> {
        if !self.is_connected() {
            self.connect().await?;
        }
        self.send(Command::GetState).await?;
        Ok(None)
    }

    fn take_state_stream(&mut self) -> Option<mpsc::Receiver<PlayerState>> {
        self.state_rx.take()
    }

    async fn set_volume(&mut self, volume: i32, mute: bool) -> Result<(), TransportError> {
        let data = if mute {
            Value::Bool(true)
        } else {
            Value::from(volume)
        };
        self.emit(EventFrame::with_data("volume", data)).await
    }
}

// ── reader task ───────────────────────────────────────────────────────────────

async fn reader_task<R>(
    mut reader: BufReader<R>,
    state_tx: mpsc::Sender<PlayerState>,
    connected: Arc<AtomicBool>,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                warn!("socket source: connection closed by player");
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let frame = match EventFrame::decode(trimmed) {
                    Ok(f) => f,
                    Err(e) => {
                        warn!("socket source: invalid frame '{}': {}", trimmed, e);
                        continue;
                    }
                };
                match frame.pushed_state() {
                    Some(Ok(state)) => {
                        if state_tx.send(state).await.is_err() {
                            debug!("socket source: state channel closed");
                            break;
                        }
                    }
                    Some(Err(e)) => warn!("socket source: malformed pushState: {}", e),
                    None => debug!("socket source: ignoring event {}", frame.event),
                }
            }
            Err(e) => {
                warn!("socket source: read error: {}", e);
                break;
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
}

// ── writer task ───────────────────────────────────────────────────────────────

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<String>, connected: Arc<AtomicBool>)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        debug!("socket source: send {}", line.trim());
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            warn!("socket source: write error: {}", e);
            connected.store(false, Ordering::SeqCst);
            break;
        }
    }
    debug!("socket source: writer exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    async fn next_line<R: tokio::io::AsyncRead + Unpin>(r: &mut BufReader<R>) -> String {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(2), r.read_line(&mut line))
            .await
            .expect("timed out waiting for a line")
            .unwrap();
        line.trim().to_string()
    }

    #[tokio::test]
    async fn test_fetch_state_emits_get_state_and_receives_push() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let mut src = SocketSource::new(&addr);
        let mut states = src.take_state_stream().unwrap();
        assert!(src.take_state_stream().is_none());

        assert!(src.fetch_state().await.unwrap().is_none());
        let (conn, _) = listener.accept().await.unwrap();
        let (r, mut w) = conn.into_split();
        let mut r = BufReader::new(r);
        assert_eq!(next_line(&mut r).await, r#"{"event":"getState"}"#);

        w.write_all(b"{\"event\":\"pushQueue\",\"data\":[]}\n").await.unwrap();
        w.write_all(b"not json\n").await.unwrap();
        w.write_all(b"{\"event\":\"pushState\",\"data\":{\"title\":\"Badge\",\"volume\":55}}\n")
            .await
            .unwrap();

        let state = tokio::time::timeout(Duration::from_secs(2), states.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.title, "Badge");
        assert_eq!(state.volume, 55);
    }

    #[tokio::test]
    async fn test_transport_commands_are_framed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let mut src = SocketSource::new(&addr);
        src.connect().await.unwrap();
        let (conn, _) = listener.accept().await.unwrap();
        let mut r = BufReader::new(conn);

        src.prev().await.unwrap();
        src.set_volume(30, false).await.unwrap();
        src.set_volume(30, true).await.unwrap();
        src.unmute().await.unwrap();

        assert_eq!(next_line(&mut r).await, r#"{"event":"prev"}"#);
        assert_eq!(next_line(&mut r).await, r#"{"event":"volume","data":30}"#);
        assert_eq!(next_line(&mut r).await, r#"{"event":"volume","data":true}"#);
        assert_eq!(next_line(&mut r).await, r#"{"event":"unmute"}"#);
    }

    #[tokio::test]
    async fn test_reconnects_after_player_hangs_up() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let mut src = SocketSource::new(&addr);
        src.connect().await.unwrap();
        let (first, _) = listener.accept().await.unwrap();
        drop(first);

        // Wait for the reader to notice the hang-up.
        tokio::time::timeout(Duration::from_secs(2), async {
            while src.is_connected() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("source should notice the closed socket");

        assert!(src.fetch_state().await.unwrap().is_none());
        let (second, _) = listener.accept().await.unwrap();
        let mut r = BufReader::new(second);
        assert_eq!(next_line(&mut r).await, r#"{"event":"getState"}"#);
        assert!(src.is_connected());
    }

    #[tokio::test]
    async fn test_send_without_connection_fails() {
        let mut src = SocketSource::new("127.0.0.1:1");
        assert!(matches!(
            src.play().await,
            Err(TransportError::NotConnected)
        ));
        src.disconnect().await.unwrap();
    }
}
