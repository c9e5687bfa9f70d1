//! Hardware seams: display brightness and ambient-light capture
//!
//! The coordinator never talks to hardware directly; it goes through these
//! traits so backends can be swapped (sysfs backlight, console/simulated,
//! test doubles).
//!
//! All methods take `&self` to support `Arc<dyn …>`. Implementations use
//! interior mutability (RwLock, Mutex, atomics) for mutable state.

use async_trait::async_trait;

use crate::error::ControlError;
use crate::state::BrightnessLevel;

pub mod console;

#[cfg(target_os = "linux")]
pub mod backlight;

pub use console::{ConsoleBrightnessDriver, SimulatedSampler};

#[cfg(target_os = "linux")]
pub use backlight::SysfsBacklight;

/// Opaque handle to an opened capture device.
///
/// Returned by [`LightSampler::open`] and consumed by [`LightSampler::close`];
/// the sampling loop releases it unconditionally on exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureHandle(pub u32);

/// Physical display brightness, 0–100 scale
#[async_trait]
pub trait BrightnessDriver: Send + Sync {
    /// Backend name for logs (e.g. "sysfs", "console")
    fn name(&self) -> &str;

    /// Read the current hardware brightness.
    async fn get(&self) -> Result<BrightnessLevel, ControlError>;

    /// Apply a brightness level to the hardware.
    ///
    /// Fails with [`ControlError::Driver`] on hardware/permission failure;
    /// the caller keeps its previously committed value in that case.
    async fn set(&self, level: BrightnessLevel) -> Result<(), ControlError>;
}

/// Successive luminance frames from a capture device
#[async_trait]
pub trait LightSampler: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Open the capture device.
    ///
    /// Fails with [`ControlError::DeviceUnavailable`] when no device can be
    /// acquired; auto mode then does not start.
    async fn open(&self) -> Result<CaptureHandle, ControlError>;

    /// Read one frame of luminance samples (0–255 grayscale).
    ///
    /// Fails with [`ControlError::Capture`] on a transient read error; the
    /// current sampling cycle is skipped and the loop retries next interval.
    async fn read_frame(&self, handle: &CaptureHandle) -> Result<Vec<u8>, ControlError>;

    /// Release the capture device. Must be safe to call on a handle whose
    /// device already went away.
    async fn close(&self, handle: CaptureHandle);
}

/// Mean luminance of a frame on the 0–255 scale.
///
/// An empty frame reads as 0 (treated like a dark frame rather than an
/// error).
pub fn mean_luminance(samples: &[u8]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: u64 = samples.iter().map(|&s| s as u64).sum();
    sum as f64 / samples.len() as f64
}
