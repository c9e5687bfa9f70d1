//! Window surface seam and UI gesture events
//!
//! The rendering surface (widgets, layout, theming) is an external
//! collaborator. The core only needs to hide/show the window and to receive
//! discrete gesture events; both cross this seam.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// The application window, as far as the core is concerned
pub trait WindowSurface: Send + Sync {
    /// Remove the window from the normal window list.
    fn hide(&self);

    /// Un-hide the window and bring it to the foreground.
    fn show_foreground(&self);
}

/// Discrete gestures the external UI emits into the command surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiGesture {
    /// Slider dragged to a value (unclamped, as the widget reports it)
    SliderChanged(i64),
    /// Auto-brightness switch toggled
    AutoToggled(bool),
    /// "Minimize to Tray" button pressed
    MinimizePressed,
    /// Window-close gesture (title bar X)
    CloseRequested,
    /// "Stop Application" button pressed
    StopPressed,
}

/// Window stand-in for headless runs: logs transitions and tracks
/// visibility.
#[derive(Default)]
pub struct HeadlessWindow {
    visible: AtomicBool,
}

impl HeadlessWindow {
    pub fn new() -> Self {
        Self {
            visible: AtomicBool::new(true),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

impl WindowSurface for HeadlessWindow {
    fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
        info!("🪟 Window hidden");
    }

    fn show_foreground(&self) {
        self.visible.store(true, Ordering::SeqCst);
        info!("🪟 Window shown and raised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_window_tracks_visibility() {
        let window = HeadlessWindow::new();
        assert!(window.is_visible());
        window.hide();
        assert!(!window.is_visible());
        window.show_foreground();
        assert!(window.is_visible());
    }
}
