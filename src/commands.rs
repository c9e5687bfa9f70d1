//! Command surface - translates UI gestures and tray selections into
//! controller / presence calls
//!
//! No business logic lives here; every branch is a one-line delegation plus
//! error reporting. `stop_application` is the only composite: it owns the
//! shutdown ordering.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::controller::ModeController;
use crate::presence::PresenceManager;
use crate::surface::UiGesture;
use crate::tray::TrayCommand;

/// Entry point for every externally triggered action
pub struct CommandSurface {
    controller: Arc<ModeController>,
    presence: Arc<PresenceManager>,
    /// Flipped to `true` exactly once to end the process event loop
    shutdown_tx: watch::Sender<bool>,
    stopping: AtomicBool,
}

impl CommandSurface {
    pub fn new(
        controller: Arc<ModeController>,
        presence: Arc<PresenceManager>,
        shutdown_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            controller,
            presence,
            shutdown_tx,
            stopping: AtomicBool::new(false),
        }
    }

    /// Dispatch a gesture from the window surface.
    pub async fn handle_gesture(&self, gesture: UiGesture) {
        match gesture {
            UiGesture::SliderChanged(value) => {
                if let Err(e) = self.controller.set_manual(value).await {
                    // Reported to the display; previous value stays committed
                    warn!("Manual brightness change failed: {}", e);
                }
            }
            UiGesture::AutoToggled(enabled) => {
                if let Err(e) = self.controller.set_auto(enabled).await {
                    warn!("Auto toggle failed: {}", e);
                }
            }
            UiGesture::MinimizePressed => {
                if let Err(e) = self.presence.minimize_to_tray().await {
                    warn!("Minimize to tray failed: {}", e);
                }
            }
            UiGesture::CloseRequested => {
                if let Err(e) = self.presence.close_requested().await {
                    warn!("Close-to-tray failed: {}", e);
                }
            }
            UiGesture::StopPressed => self.stop_application().await,
        }
    }

    /// Dispatch a selection delivered by the tray task.
    pub async fn handle_tray_command(&self, command: TrayCommand) {
        match command {
            TrayCommand::Show => {
                if let Err(e) = self.presence.show_window().await {
                    warn!("Show from tray failed: {}", e);
                }
            }
            TrayCommand::Exit => self.stop_application().await,
        }
    }

    /// Full application stop: sampling loop → tray task → terminate.
    ///
    /// Idempotent and safe to race (e.g. a Stop button press concurrent with
    /// a tray Exit): only the first caller runs the teardown. Each step's
    /// failure is logged and never blocks the next step, so this always
    /// returns within the configured bounds.
    pub async fn stop_application(&self) {
        if self.stopping.swap(true, Ordering::SeqCst) {
            debug!("Stop already in progress, ignoring");
            return;
        }

        info!("🛑 Stopping application...");
        self.controller.shutdown().await;
        self.presence.shutdown().await;
        let _ = self.shutdown_tx.send(true);
        info!("Shutdown sequence complete");
    }
}
