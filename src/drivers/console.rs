//! Console backends - log all hardware actions for testing and debugging
//!
//! `ConsoleBrightnessDriver` stands in for a real display and
//! `SimulatedSampler` for a real camera. Useful for:
//! - Running the coordinator without hardware dependencies
//! - Debugging the sampling/override flow
//! - Exercising the full lifecycle in tests and demos

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::drivers::{BrightnessDriver, CaptureHandle, LightSampler};
use crate::error::ControlError;
use crate::state::BrightnessLevel;

/// Brightness driver that logs every write and remembers the last value
pub struct ConsoleBrightnessDriver {
    /// Last applied level, also what `get()` reports
    level: RwLock<BrightnessLevel>,
    /// Write counter for debugging
    writes: AtomicU64,
}

impl ConsoleBrightnessDriver {
    pub fn new(initial: BrightnessLevel) -> Self {
        Self {
            level: RwLock::new(initial),
            writes: AtomicU64::new(0),
        }
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl Default for ConsoleBrightnessDriver {
    fn default() -> Self {
        Self::new(BrightnessLevel::clamped(50))
    }
}

#[async_trait]
impl BrightnessDriver for ConsoleBrightnessDriver {
    fn name(&self) -> &str {
        "console"
    }

    async fn get(&self) -> Result<BrightnessLevel, ControlError> {
        Ok(*self.level.read().await)
    }

    async fn set(&self, level: BrightnessLevel) -> Result<(), ControlError> {
        *self.level.write().await = level;
        let n = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        info!("🖥️  Display brightness → {} [write #{}]", level, n);
        Ok(())
    }
}

/// Light sampler producing uniform frames at a configurable luminance.
///
/// The luminance can be changed at runtime, which makes the auto loop's
/// reaction observable without a camera.
pub struct SimulatedSampler {
    luminance: AtomicU32,
    camera_index: u32,
    opens: AtomicU64,
}

impl SimulatedSampler {
    pub fn new(camera_index: u32, luminance: u8) -> Self {
        Self {
            luminance: AtomicU32::new(luminance as u32),
            camera_index,
            opens: AtomicU64::new(0),
        }
    }

    /// Change the luminance of subsequently produced frames
    pub fn set_luminance(&self, luminance: u8) {
        self.luminance.store(luminance as u32, Ordering::Relaxed);
    }

    /// Number of times the device has been opened
    pub fn open_count(&self) -> u64 {
        self.opens.load(Ordering::Relaxed)
    }
}

impl Default for SimulatedSampler {
    fn default() -> Self {
        Self::new(0, 128)
    }
}

#[async_trait]
impl LightSampler for SimulatedSampler {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn open(&self) -> Result<CaptureHandle, ControlError> {
        let n = self.opens.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            "📷 Simulated capture device {} opened (open #{})",
            self.camera_index, n
        );
        Ok(CaptureHandle(self.camera_index))
    }

    async fn read_frame(&self, _handle: &CaptureHandle) -> Result<Vec<u8>, ControlError> {
        let luminance = self.luminance.load(Ordering::Relaxed) as u8;
        // A small frame is enough; the loop only takes the mean
        Ok(vec![luminance; 64])
    }

    async fn close(&self, handle: CaptureHandle) {
        if handle.0 != self.camera_index {
            warn!("Closing a handle for unknown device {}", handle.0);
        }
        debug!("📷 Simulated capture device {} closed", handle.0);
    }
}
