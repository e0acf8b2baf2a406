// src/engine/lifecycle.rs

//! Starting the event loop in the background and stopping it again.

use std::fmt;
use std::time::Duration;

use anyhow::anyhow;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::errors::{BackwatchError, Result};
use crate::watch::ChangeSource;

use super::LoopExit;
use super::runtime::EventLoop;

/// How long [`Controller::stop`] waits for the loop to finish.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of stopping or joining the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The loop was never started, or has already been joined.
    NotRunning,
    /// The loop exited for the given reason.
    Stopped(LoopExit),
    /// The loop did not exit in time. It was left to finish on its own.
    TimedOut,
}

/// Callbacks a host service manager drives.
///
/// Both must return promptly: `on_start` spawns the watch loop without
/// waiting for it to subscribe, and `on_stop` only signals it.
pub trait HostService {
    fn on_start(&mut self) -> Result<()>;
    fn on_stop(&mut self) -> Result<()>;
}

struct Running {
    shutdown: CancellationToken,
    handle: JoinHandle<Result<LoopExit>>,
}

/// Owns the event loop task.
///
/// `start` spawns the loop on the current Tokio runtime and returns at once.
/// A controller starts at most once; stopping one that never started is a
/// no-op.
pub struct Controller<S: ChangeSource> {
    pending: Option<EventLoop<S>>,
    running: Option<Running>,
    stop_timeout: Duration,
}

impl<S: ChangeSource> fmt::Debug for Controller<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("started", &self.pending.is_none())
            .field("running", &self.is_running())
            .field("stop_timeout", &self.stop_timeout)
            .finish()
    }
}

impl<S: ChangeSource> Controller<S> {
    pub fn new(event_loop: EventLoop<S>) -> Self {
        Self {
            pending: Some(event_loop),
            running: None,
            stop_timeout: STOP_TIMEOUT,
        }
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Spawn the event loop. Must be called from within a Tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        let event_loop = self.pending.take().ok_or(BackwatchError::AlreadyStarted)?;
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(event_loop.run(shutdown.clone()));

        self.running = Some(Running { shutdown, handle });
        info!("event loop spawned");
        Ok(())
    }

    /// Whether a spawned loop has not finished yet.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Ask the loop to stop without waiting for it.
    pub fn signal_stop(&self) {
        if let Some(running) = &self.running {
            running.shutdown.cancel();
        }
    }

    /// Signal the loop and wait up to the stop timeout for it to exit.
    pub async fn stop(&mut self) -> Result<StopOutcome> {
        let Some(mut running) = self.running.take() else {
            return Ok(StopOutcome::NotRunning);
        };

        running.shutdown.cancel();

        match tokio::time::timeout(self.stop_timeout, &mut running.handle).await {
            Ok(joined) => flatten(joined).map(StopOutcome::Stopped),
            Err(_) => {
                warn!(
                    timeout = ?self.stop_timeout,
                    "event loop did not stop in time; leaving it to finish in the background"
                );
                Ok(StopOutcome::TimedOut)
            }
        }
    }

    /// Wait for the loop to exit on its own (source closed or startup
    /// failure). Cancel-safe: dropping the future leaves the loop running
    /// and `stop` still usable.
    pub async fn join(&mut self) -> Result<StopOutcome> {
        let Some(running) = self.running.as_mut() else {
            return Ok(StopOutcome::NotRunning);
        };

        let joined = (&mut running.handle).await;
        self.running = None;
        flatten(joined).map(StopOutcome::Stopped)
    }
}

impl<S: ChangeSource> HostService for Controller<S> {
    fn on_start(&mut self) -> Result<()> {
        self.start()
    }

    fn on_stop(&mut self) -> Result<()> {
        self.signal_stop();
        Ok(())
    }
}

fn flatten(joined: std::result::Result<Result<LoopExit>, JoinError>) -> Result<LoopExit> {
    match joined {
        Ok(res) => res,
        Err(err) => Err(BackwatchError::Other(anyhow!("event loop task failed: {err}"))),
    }
}
