//! Native tray host - system tray integration
//!
//! Runs on a dedicated OS thread to handle the native message loop. The
//! menu carries exactly two entries, Show and Exit; selections are forwarded
//! to the runtime over an unbounded channel so the tray thread never blocks
//! on the foreground.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{icons, TrayCommand, TrayHost, TrayTaskHandle};
use crate::config::TrayConfig;
use crate::error::ControlError;

/// Tray host backed by `tray-icon` + `muda`
pub struct NativeTrayHost {
    config: TrayConfig,
}

impl NativeTrayHost {
    pub fn new(config: TrayConfig) -> Self {
        Self { config }
    }
}

impl TrayHost for NativeTrayHost {
    fn start(
        &self,
        command_tx: mpsc::UnboundedSender<TrayCommand>,
    ) -> Result<TrayTaskHandle, ControlError> {
        let (stop_tx, stop_rx) = crossbeam::channel::bounded::<()>(1);
        let (done_tx, done_rx) = crossbeam::channel::bounded::<()>(1);
        let config = self.config.clone();

        let thread = std::thread::Builder::new()
            .name("tray".to_string())
            .spawn(move || {
                if let Err(e) = run_tray(config, command_tx, stop_rx) {
                    warn!("Tray task failed: {}", e);
                }
                let _ = done_tx.send(());
            })
            .map_err(|e| ControlError::Tray(format!("cannot spawn tray thread: {}", e)))?;

        Ok(TrayTaskHandle::new(stop_tx, done_rx, thread))
    }
}

/// Run the tray event loop (blocks until a stop request)
fn run_tray(
    config: TrayConfig,
    command_tx: mpsc::UnboundedSender<TrayCommand>,
    stop_rx: crossbeam::channel::Receiver<()>,
) -> Result<(), ControlError> {
    debug!("Starting tray task (poll interval {}ms)", config.poll_interval_ms);

    let icon = tray_icon::Icon::from_rgba(icons::sun_icon_bytes(), icons::ICON_SIZE, icons::ICON_SIZE)
        .map_err(|e| ControlError::Tray(format!("failed to create icon: {}", e)))?;

    let menu = build_menu()?;

    let tray_icon = tray_icon::TrayIconBuilder::new()
        .with_icon(icon)
        .with_tooltip(&config.tooltip)
        .with_menu(Box::new(menu))
        .build()
        .map_err(|e| ControlError::Tray(format!("failed to create tray icon: {}", e)))?;

    debug!("Tray icon created");

    let menu_channel = muda::MenuEvent::receiver();
    let poll_interval = Duration::from_millis(config.poll_interval_ms);

    loop {
        // Pump native messages (required for tray/menu events on Windows)
        pump_platform_messages();

        // Drain menu events (non-blocking)
        while let Ok(event) = menu_channel.try_recv() {
            debug!("Tray menu event: {:?}", event.id);
            match event.id.as_ref() {
                "show" => {
                    if command_tx.send(TrayCommand::Show).is_err() {
                        warn!("Runtime gone, stopping tray task");
                        remove_icon(&tray_icon);
                        return Ok(());
                    }
                }
                "exit" => {
                    // Delivery only; teardown is driven by the lifecycle
                    let _ = command_tx.send(TrayCommand::Exit);
                }
                other => {
                    debug!("Unknown tray menu item: {:?}", other);
                }
            }
        }

        match stop_rx.recv_timeout(poll_interval) {
            Ok(()) => break,
            Err(crossbeam::channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam::channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    remove_icon(&tray_icon);
    debug!("Tray task exited");
    Ok(())
}

fn build_menu() -> Result<muda::Menu, ControlError> {
    let menu = muda::Menu::new();

    let show = muda::MenuItem::with_id("show", "Show", true, None);
    menu.append(&show)
        .map_err(|e| ControlError::Tray(format!("failed to append Show: {}", e)))?;

    menu.append(&muda::PredefinedMenuItem::separator())
        .map_err(|e| ControlError::Tray(format!("failed to append separator: {}", e)))?;

    let exit = muda::MenuItem::with_id("exit", "Exit", true, None);
    menu.append(&exit)
        .map_err(|e| ControlError::Tray(format!("failed to append Exit: {}", e)))?;

    Ok(menu)
}

/// Explicitly remove the tray icon to prevent ghost icons
fn remove_icon(tray_icon: &tray_icon::TrayIcon) {
    if let Err(e) = tray_icon.set_visible(false) {
        warn!("Failed to hide tray icon: {}", e);
    }
}

/// Pump native messages to process tray/menu events
#[cfg(target_os = "windows")]
fn pump_platform_messages() {
    use windows::Win32::UI::WindowsAndMessaging::*;

    unsafe {
        let mut msg = std::mem::zeroed();
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

/// No-op on non-Windows platforms
#[cfg(not(target_os = "windows"))]
fn pump_platform_messages() {}
