//! Error taxonomy for the brightness coordinator
//!
//! Hardware failures are isolated to the operation that triggered them and
//! surfaced to the caller; none of them terminate the process.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by the control core and its hardware seams
#[derive(Debug, Error)]
pub enum ControlError {
    /// The display brightness write (or read) failed.
    ///
    /// The previous committed brightness is retained when this is returned
    /// from a set operation.
    #[error("brightness driver failure: {0}")]
    Driver(String),

    /// The capture device could not be opened; auto mode cannot start.
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A single frame read failed. Transient: the sampling cycle is skipped
    /// and the loop keeps running.
    #[error("frame capture failed: {0}")]
    Capture(String),

    /// A background task did not honor cancellation within the bound.
    /// Lifecycle proceeds anyway; the task may be left orphaned.
    #[error("{task} did not stop within {timeout:?}")]
    TimeoutOnStop {
        task: &'static str,
        timeout: Duration,
    },

    /// Tray icon or menu construction failed.
    #[error("tray error: {0}")]
    Tray(String),
}

impl ControlError {
    /// True for errors a sampling cycle may absorb without stopping the loop.
    pub fn is_transient(&self) -> bool {
        matches!(self, ControlError::Capture(_))
    }
}
