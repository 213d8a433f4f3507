//! Render surface: the terminal the dashboard draws into, plus the raw
//! input stream that comes with it.
//!
//! `TerminalSurface` wraps a ratatui `Terminal`. Its double buffer means a
//! draw only flushes the cells that changed since the previous frame. The
//! crossterm variant also owns raw mode and the alternate screen and gives
//! them back on `close()` (or on drop, if nobody called it).

use std::io::{self, Stdout};
use std::time::Duration;

use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Frame, Terminal};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::shutdown::Shutdown;

/// How long the input reader blocks before re-checking for shutdown.
const INPUT_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to initialise the terminal: {0}")]
    Init(#[from] io::Error),
    #[error("terminal backend error: {0}")]
    Backend(String),
}

pub trait RenderSurface {
    fn render<F>(&mut self, draw: F) -> Result<(), SurfaceError>
    where
        F: FnOnce(&mut Frame);

    /// Release the surface. Safe to call more than once.
    fn close(&mut self) -> Result<(), SurfaceError>;
}

pub struct TerminalSurface<B: Backend> {
    terminal: Terminal<B>,
    /// Raw mode and the alternate screen are ours to undo.
    owns_tty: bool,
    closed: bool,
}

impl TerminalSurface<CrosstermBackend<Stdout>> {
    pub fn init() -> Result<Self, SurfaceError> {
        debug!("surface: enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(t) => t,
            Err(e) => {
                let mut stdout = io::stdout();
                let _ = execute!(stdout, LeaveAlternateScreen);
                let _ = disable_raw_mode();
                return Err(e.into());
            }
        };
        debug!("surface: terminal ready, size={:?}", terminal.size());
        Ok(Self {
            terminal,
            owns_tty: true,
            closed: false,
        })
    }
}

#[cfg(test)]
impl<B: Backend> TerminalSurface<B> {
    /// Wrap an arbitrary backend without touching the controlling terminal.
    pub fn headless(backend: B) -> Result<Self, SurfaceError> {
        let terminal = Terminal::new(backend).map_err(|e| SurfaceError::Backend(e.to_string()))?;
        Ok(Self {
            terminal,
            owns_tty: false,
            closed: false,
        })
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<B: Backend> RenderSurface for TerminalSurface<B> {
    fn render<F>(&mut self, draw: F) -> Result<(), SurfaceError>
    where
        F: FnOnce(&mut Frame),
    {
        if self.closed {
            return Ok(());
        }
        self.terminal
            .draw(draw)
            .map(|_| ())
            .map_err(|e| SurfaceError::Backend(e.to_string()))
    }

    fn close(&mut self) -> Result<(), SurfaceError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.owns_tty {
            info!("surface: restoring terminal");
            disable_raw_mode()?;
            let mut stdout = io::stdout();
            execute!(stdout, LeaveAlternateScreen)?;
        }
        self.terminal
            .show_cursor()
            .map_err(|e| SurfaceError::Backend(e.to_string()))
    }
}

impl<B: Backend> Drop for TerminalSurface<B> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("surface: failed to restore terminal: {}", e);
        }
    }
}

/// Read terminal events on the blocking pool and forward them. The channel
/// closes when the terminal stops producing events or shutdown fires.
pub fn spawn_input_reader(shutdown: &Shutdown) -> mpsc::Receiver<Event> {
    let (tx, rx) = mpsc::channel(64);
    let token = shutdown.child_token();
    shutdown.spawn_blocking(move || {
        while !token.is_cancelled() {
            match event::poll(INPUT_POLL) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if tx.blocking_send(ev).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("input: read failed: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    warn!("input: poll failed: {}", e);
                    break;
                }
            }
        }
        debug!("input: reader exiting");
    });
    rx
}
