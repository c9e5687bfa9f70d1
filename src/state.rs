//! Shared controller state types
//!
//! `ControllerState` is the single record shared between the foreground and
//! the sampling loop. It lives behind one mutex owned by the mode controller;
//! everything here is plain data.

use std::fmt;
use std::sync::Arc;

/// Brightness on the 0–100 display scale.
///
/// Every constructor clamps, so a `BrightnessLevel` is in range by
/// construction and can be handed to drivers and observers as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BrightnessLevel(u8);

impl BrightnessLevel {
    pub const MIN: BrightnessLevel = BrightnessLevel(0);
    pub const MAX: BrightnessLevel = BrightnessLevel(100);

    /// Clamp an arbitrary requested value into [0, 100].
    ///
    /// Out-of-range requests (slider glitches, bad config) are clamped, not
    /// rejected.
    pub fn clamped(value: i64) -> Self {
        BrightnessLevel(value.clamp(0, 100) as u8)
    }

    /// Map a mean luminance (0–255 scale) to a brightness level.
    ///
    /// Linear scaling: `round(luminance / 255 * 100)`.
    pub fn from_luminance(mean: f64) -> Self {
        let scaled = (mean / 255.0 * 100.0).round();
        BrightnessLevel::clamped(scaled as i64)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for BrightnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Who is driving the display brightness right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Brightness follows ambient-light sampling
    Auto,
    /// Brightness follows direct user input only
    Manual,
}

/// The shared mode/brightness record.
///
/// Mutated only through the mode controller's operations; read by the
/// sampling loop and by display observers. Snapshots are returned by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    pub mode: Mode,
    pub brightness: BrightnessLevel,
}

impl ControllerState {
    pub fn new(mode: Mode, brightness: BrightnessLevel) -> Self {
        Self { mode, brightness }
    }
}

/// Callback receiving `(mode, brightness)` snapshots for the display surface.
///
/// Observers run outside any controller lock and must not block.
pub type StateObserver = Arc<dyn Fn(Mode, BrightnessLevel) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamps_out_of_range_requests() {
        assert_eq!(BrightnessLevel::clamped(-5), BrightnessLevel::MIN);
        assert_eq!(BrightnessLevel::clamped(0).value(), 0);
        assert_eq!(BrightnessLevel::clamped(73).value(), 73);
        assert_eq!(BrightnessLevel::clamped(100).value(), 100);
        assert_eq!(BrightnessLevel::clamped(400), BrightnessLevel::MAX);
    }

    #[test]
    fn luminance_mapping_anchors() {
        assert_eq!(BrightnessLevel::from_luminance(0.0).value(), 0);
        assert_eq!(BrightnessLevel::from_luminance(128.0).value(), 50);
        assert_eq!(BrightnessLevel::from_luminance(255.0).value(), 100);
    }

    proptest! {
        #[test]
        fn clamped_always_in_range(v in proptest::num::i64::ANY) {
            let level = BrightnessLevel::clamped(v);
            prop_assert!(level.value() <= 100);
        }

        #[test]
        fn luminance_mapping_matches_linear_scale(l in 0u16..=255) {
            let level = BrightnessLevel::from_luminance(l as f64);
            let expected = (l as f64 / 255.0 * 100.0).round() as u8;
            prop_assert_eq!(level.value(), expected);
            prop_assert!(level.value() <= 100);
        }
    }
}
