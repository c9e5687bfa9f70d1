//! Linux sysfs backlight driver
//!
//! Drives `/sys/class/backlight/<device>/brightness`, scaling between the
//! device's raw range (read once from `max_brightness`) and the 0–100
//! percent scale the coordinator works in.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::drivers::BrightnessDriver;
use crate::error::ControlError;
use crate::state::BrightnessLevel;

const SYSFS_BACKLIGHT_ROOT: &str = "/sys/class/backlight";

/// Brightness driver backed by a sysfs backlight device
pub struct SysfsBacklight {
    device_dir: PathBuf,
    /// Raw device maximum, read once at construction
    max_brightness: u32,
}

impl SysfsBacklight {
    /// Open a specific backlight device directory.
    pub async fn new(device_dir: impl AsRef<Path>) -> Result<Self, ControlError> {
        let device_dir = device_dir.as_ref().to_path_buf();

        let raw = fs::read_to_string(device_dir.join("max_brightness"))
            .await
            .map_err(|e| {
                ControlError::Driver(format!(
                    "cannot read max_brightness in {}: {}",
                    device_dir.display(),
                    e
                ))
            })?;
        let max_brightness = parse_sysfs_value(&raw)?;
        if max_brightness == 0 {
            return Err(ControlError::Driver(format!(
                "device {} reports max_brightness 0",
                device_dir.display()
            )));
        }

        info!(
            "💡 Backlight device {} (max raw {})",
            device_dir.display(),
            max_brightness
        );

        Ok(Self {
            device_dir,
            max_brightness,
        })
    }

    /// Pick the first device under `/sys/class/backlight`.
    pub async fn discover() -> Result<Self, ControlError> {
        let mut entries = fs::read_dir(SYSFS_BACKLIGHT_ROOT).await.map_err(|e| {
            ControlError::Driver(format!("cannot list {}: {}", SYSFS_BACKLIGHT_ROOT, e))
        })?;

        let entry = entries
            .next_entry()
            .await
            .map_err(|e| ControlError::Driver(format!("cannot read backlight entry: {}", e)))?
            .ok_or_else(|| ControlError::Driver("no backlight devices found".to_string()))?;

        Self::new(entry.path()).await
    }

    fn raw_for_level(&self, level: BrightnessLevel) -> u32 {
        // Round-to-nearest keeps 100% mapping to the exact device maximum
        ((level.value() as u64 * self.max_brightness as u64 + 50) / 100) as u32
    }

    fn level_for_raw(&self, raw: u32) -> BrightnessLevel {
        let percent = (raw as u64 * 100 + self.max_brightness as u64 / 2) / self.max_brightness as u64;
        BrightnessLevel::clamped(percent as i64)
    }
}

#[async_trait]
impl BrightnessDriver for SysfsBacklight {
    fn name(&self) -> &str {
        "sysfs"
    }

    async fn get(&self) -> Result<BrightnessLevel, ControlError> {
        let raw = fs::read_to_string(self.device_dir.join("brightness"))
            .await
            .map_err(|e| ControlError::Driver(format!("brightness read failed: {}", e)))?;
        Ok(self.level_for_raw(parse_sysfs_value(&raw)?))
    }

    async fn set(&self, level: BrightnessLevel) -> Result<(), ControlError> {
        let raw = self.raw_for_level(level);
        debug!("Backlight write: {} → raw {}", level, raw);
        fs::write(self.device_dir.join("brightness"), raw.to_string())
            .await
            .map_err(|e| ControlError::Driver(format!("brightness write failed: {}", e)))
    }
}

fn parse_sysfs_value(raw: &str) -> Result<u32, ControlError> {
    raw.trim()
        .parse()
        .map_err(|e| ControlError::Driver(format!("bad sysfs value {:?}: {}", raw.trim(), e)))
}
