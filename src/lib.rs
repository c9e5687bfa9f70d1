//! luxtray - ambient-light driven display brightness with a tray presence
//!
//! The core is a brightness-control coordinator: an auto-sampling loop maps
//! camera luminance to display brightness, manual overrides atomically
//! suspend it, and a presence lifecycle moves the application between a
//! visible window and a tray-resident background state with bounded-time
//! shutdown. Hardware and the rendering surface sit behind trait seams in
//! [`drivers`], [`surface`] and [`tray`].

pub mod commands;
pub mod config;
pub mod controller;
pub mod drivers;
pub mod error;
pub mod presence;
pub mod sampler;
pub mod state;
pub mod surface;
pub mod tray;

pub use commands::CommandSurface;
pub use config::AppConfig;
pub use controller::ModeController;
pub use error::ControlError;
pub use presence::{PresenceManager, PresenceState};
pub use state::{BrightnessLevel, ControllerState, Mode};
