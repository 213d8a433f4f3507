//! Shutdown coordination.
//!
//! One latched cancellation token observed by every task, plus a counted
//! barrier of in-flight work. The sequence is always:
//!
//! ```text
//!   request(reason)      ← OS signal, quit key, terminal gone, render failure
//!        │
//!        ├── every loop sees `cancelled()` at its next await and stops
//!        ├── await_drain()  waits for outstanding WorkGuards and tracked tasks
//!        └── caller releases the terminal and exits
//! ```

use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tokio_util::task::task_tracker::TaskTrackerToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

/// Why the process is going down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / SIGTERM.
    Signal(&'static str),
    /// `q` or Ctrl-C inside the UI.
    QuitKey,
    /// The input stream of the render surface ended.
    SurfaceClosed,
    /// Drawing a frame failed.
    RenderFailed,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal(name) => write!(f, "signal {}", name),
            ShutdownReason::QuitKey => write!(f, "quit key"),
            ShutdownReason::SurfaceClosed => write!(f, "render surface closed"),
            ShutdownReason::RenderFailed => write!(f, "render failure"),
        }
    }
}

/// Cheaply cloneable; all clones share the same latch and barrier.
#[derive(Clone)]
pub struct Shutdown {
    token: CancellationToken,
    tracker: TaskTracker,
    reason: Arc<OnceLock<ShutdownReason>>,
}

/// One unit of in-flight work. Completes when dropped.
pub struct WorkGuard {
    _token: TaskTrackerToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            reason: Arc::new(OnceLock::new()),
        }
    }

    /// Fire the cancellation signal. Only the first call has any effect;
    /// returns `true` for that call.
    pub fn request(&self, reason: ShutdownReason) -> bool {
        if self.reason.set(reason.clone()).is_err() {
            debug!("shutdown: already requested, ignoring {}", reason);
            return false;
        }
        info!("shutdown: requested by {}", reason);
        self.token.cancel();
        true
    }

    #[cfg(test)]
    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.get().cloned()
    }

    /// Resolves once shutdown has been requested.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// A token that is cancelled with the shutdown signal but can also be
    /// cancelled on its own (used to stop a single component early).
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Count one unit of work that must finish before shutdown completes.
    pub fn track_work(&self) -> WorkGuard {
        WorkGuard {
            _token: self.tracker.token(),
        }
    }

    /// Spawn a task the drain will wait for.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(task)
    }

    pub fn spawn_blocking<F, T>(&self, task: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.tracker.spawn_blocking(task)
    }

    /// Outstanding work units and tracked tasks.
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop admitting tracked work and wait until everything in flight is done.
    pub async fn await_drain(&self) {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            info!("shutdown: waiting for {} unit(s) of in-flight work", pending);
        }
        self.tracker.wait().await;
        info!("shutdown: drained");
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for SIGINT or SIGTERM and turn it into a shutdown request.
pub async fn listen_for_signals(shutdown: Shutdown) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("shutdown: cannot listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let term = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("shutdown: cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let term = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { shutdown.request(ShutdownReason::Signal("SIGINT")); }
        _ = term => { shutdown.request(ShutdownReason::Signal("SIGTERM")); }
        _ = shutdown.cancelled() => {}
    }
}
