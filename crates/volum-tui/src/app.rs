//! The display refresh loop.
//!
//! Architecture:
//! - `App` owns the render surface, the `DisplayModel` and the title scroller.
//! - Shutdown, raw terminal input, accepted state updates, scroller output,
//!   network changes and the 1 s clock all feed one `tokio::select!`.
//! - Each event mutates only its slice of the model, then the frame is
//!   redrawn; the terminal's double buffer keeps the flush to changed cells.
//! - Queued state updates are drained in FIFO order and rendered once.
//! - A failed draw requests shutdown and still goes through the full
//!   teardown before the error is returned.

use std::time::Duration;

use chrono::{DateTime, Local};
use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Layout};
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use volum_proto::config::Config;
use volum_proto::state::PlayerState;

use crate::model::DisplayModel;
use crate::netinfo::NetworkInfo;
use crate::scroller::TitleScroller;
use crate::shutdown::{Shutdown, ShutdownReason};
use crate::surface::{RenderSurface, SurfaceError};
use crate::widgets::{details, footer, header, progress_bar};

const CLOCK_PERIOD: Duration = Duration::from_secs(1);
const MAX_DRAIN: usize = 256;
const TRACK_WIDTH: u16 = 14;

type Clock = Box<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Event sources the loop reads from, besides its own timers.
pub struct Feeds {
    pub inputs: mpsc::Receiver<Event>,
    pub updates: mpsc::UnboundedReceiver<PlayerState>,
    pub network: mpsc::Receiver<NetworkInfo>,
}

pub struct App<S: RenderSurface> {
    surface: S,
    model: DisplayModel,
    scroller: TitleScroller,
    scroller_rx: mpsc::Receiver<String>,
    clock: Clock,
    shutdown: Shutdown,
}

impl<S: RenderSurface> App<S> {
    /// Must be called inside a runtime: the title scroller starts here.
    pub fn new(surface: S, config: &Config, shutdown: Shutdown) -> Self {
        let (scroller, scroller_rx) = TitleScroller::spawn(&config.scroller, &shutdown);
        Self {
            surface,
            model: DisplayModel::new(&config.display),
            scroller,
            scroller_rx,
            clock: Box::new(Local::now),
            shutdown,
        }
    }

    #[cfg(test)]
    fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Fn() -> DateTime<Local> + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub async fn run(&mut self, mut feeds: Feeds) -> Result<(), SurfaceError> {
        let mut outcome = self.draw();
        if outcome.is_ok() {
            outcome = self.event_loop(&mut feeds).await;
        }
        if let Err(e) = &outcome {
            error!("display: {}", e);
            self.shutdown.request(ShutdownReason::RenderFailed);
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        let reason = self
            .shutdown
            .reason()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        info!("display: stopping ({})", reason);

        self.scroller.close().await;
        // The input reader may be blocked handing us an event.
        drop(feeds);
        self.shutdown.await_drain().await;
        let closed = self.surface.close();
        info!("display: stopped");
        outcome.and(closed)
    }

    /// Runs until shutdown is requested or a draw fails.
    async fn event_loop(&mut self, feeds: &mut Feeds) -> Result<(), SurfaceError> {
        let mut clock = tokio::time::interval(CLOCK_PERIOD);
        clock.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut inputs_open = true;

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => return Ok(()),

                ev = feeds.inputs.recv(), if inputs_open => match ev {
                    Some(ev) => self.handle_input(ev)?,
                    None => {
                        inputs_open = false;
                        self.shutdown.request(ShutdownReason::SurfaceClosed);
                    }
                },

                Some(state) = feeds.updates.recv() => {
                    let mut newest = state;
                    self.scroller.update(&newest.title);
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        match feeds.updates.try_recv() {
                            Ok(next) => {
                                self.scroller.update(&next.title);
                                newest = next;
                                drained += 1;
                            }
                            Err(_) => break,
                        }
                    }
                    if drained > 0 {
                        debug!("display: coalesced {} queued update(s)", drained);
                    }
                    self.model.apply_state(&newest);
                    self.draw()?;
                }

                Some(rotated) = self.scroller_rx.recv() => {
                    self.model.set_scrolled_title(rotated);
                    self.draw()?;
                }

                Some(network) = feeds.network.recv() => {
                    self.model.set_network(&network);
                    self.draw()?;
                }

                _ = clock.tick() => {
                    self.model.set_clock((self.clock)());
                    self.draw()?;
                }
            }
        }
    }

    fn handle_input(&mut self, ev: Event) -> Result<(), SurfaceError> {
        match ev {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                if is_quit_key(&key) {
                    self.shutdown.request(ShutdownReason::QuitKey);
                }
                Ok(())
            }
            Event::Resize(w, h) => {
                debug!("display: resized to {}x{}", w, h);
                self.draw()
            }
            _ => Ok(()),
        }
    }

    fn draw(&mut self) -> Result<(), SurfaceError> {
        let model = &self.model;
        self.surface.render(|frame| draw(frame, model))
    }
}

fn is_quit_key(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn draw(frame: &mut Frame, model: &DisplayModel) {
    let [head, body, gauge, foot] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());
    let [playback, track] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(TRACK_WIDTH)]).areas(body);

    header::draw_header(frame, head, model);
    details::draw_playback_details(frame, playback, model);
    details::draw_track_details(frame, track, model);
    progress_bar::draw_playback_gauge(frame, gauge, model);
    footer::draw_footer(frame, foot, model);
}
