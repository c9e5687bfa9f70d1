//! Presence lifecycle - visible window vs. tray-resident
//!
//! Tracks whether the application is Visible or TrayResident and owns the
//! tray background task. The single invariant: never more than one tray
//! task alive. All transitions run under one async lock, so stop-before-
//! start is atomic even under rapid minimize/show cycling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::error::ControlError;
use crate::surface::WindowSurface;
use crate::tray::{TrayCommand, TrayHost, TrayTaskHandle};

/// Where the application currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    /// Normal window is on screen; no tray task
    Visible,
    /// Window hidden; reachable through the tray task
    TrayResident,
}

struct Inner {
    state: PresenceState,
    tray_task: Option<TrayTaskHandle>,
}

/// Owns the Visible/TrayResident state and the tray task lifecycle
pub struct PresenceManager {
    window: Arc<dyn WindowSurface>,
    tray: Arc<dyn TrayHost>,
    command_tx: mpsc::UnboundedSender<TrayCommand>,
    inner: Mutex<Inner>,
    stop_timeout: Duration,
}

impl PresenceManager {
    pub fn new(
        window: Arc<dyn WindowSurface>,
        tray: Arc<dyn TrayHost>,
        command_tx: mpsc::UnboundedSender<TrayCommand>,
        stop_timeout: Duration,
    ) -> Self {
        Self {
            window,
            tray,
            command_tx,
            inner: Mutex::new(Inner {
                state: PresenceState::Visible,
                tray_task: None,
            }),
            stop_timeout,
        }
    }

    pub async fn presence_state(&self) -> PresenceState {
        self.inner.lock().await.state
    }

    /// True while a tray background task is alive.
    pub async fn tray_task_alive(&self) -> bool {
        self.inner.lock().await.tray_task.is_some()
    }

    /// Hide the window and go tray-resident.
    ///
    /// Tolerant of being called while already TrayResident: the existing
    /// tray task is stopped first, then a fresh one is started, so duplicate
    /// tray icons cannot accumulate.
    pub async fn minimize_to_tray(&self) -> Result<(), ControlError> {
        let mut inner = self.inner.lock().await;

        Self::stop_task(inner.tray_task.take(), self.stop_timeout).await;
        self.window.hide();

        match self.tray.start(self.command_tx.clone()) {
            Ok(handle) => {
                inner.tray_task = Some(handle);
                inner.state = PresenceState::TrayResident;
                info!("Presence → TrayResident");
                Ok(())
            }
            Err(e) => {
                // Without a tray there is no way back; keep the window up
                warn!("Tray start failed ({}), keeping window visible", e);
                self.window.show_foreground();
                inner.state = PresenceState::Visible;
                Err(e)
            }
        }
    }

    /// Stop the tray task and bring the window back to the foreground.
    pub async fn show_window(&self) -> Result<(), ControlError> {
        let mut inner = self.inner.lock().await;

        Self::stop_task(inner.tray_task.take(), self.stop_timeout).await;
        self.window.show_foreground();
        inner.state = PresenceState::Visible;
        info!("Presence → Visible");
        Ok(())
    }

    /// Window-close gesture: hides to tray, never terminates the process.
    /// The explicit stop command is the only way to fully exit.
    pub async fn close_requested(&self) -> Result<(), ControlError> {
        self.minimize_to_tray().await
    }

    /// Stop the tray task if one is running. Idempotent; part of the
    /// application shutdown sequence.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        Self::stop_task(inner.tray_task.take(), self.stop_timeout).await;
        inner.state = PresenceState::Visible;
    }

    async fn stop_task(task: Option<TrayTaskHandle>, timeout: Duration) {
        if let Some(handle) = task {
            if let Err(e) = handle.stop(timeout).await {
                // Orphaned tray thread; accepted degraded outcome
                warn!("{}", e);
            }
        }
    }
}
