//! Auto-sampling loop - ambient light to display brightness
//!
//! A cancellable background task that, once per sampling interval, reads a
//! frame from the light sampler, maps its mean luminance to a brightness
//! level and applies it through the brightness driver. Cancellation is
//! cooperative: the watch channel is observed at the top of each iteration,
//! inside the interval sleep and inside the frame read, so a stop request
//! never waits longer than one interval.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::drivers::{mean_luminance, BrightnessDriver, CaptureHandle, LightSampler};
use crate::error::ControlError;
use crate::state::{BrightnessLevel, ControllerState, Mode, StateObserver};

/// Everything one loop run needs, captured at spawn time
pub(crate) struct LoopContext {
    pub sampler: Arc<dyn LightSampler>,
    pub driver: Arc<dyn BrightnessDriver>,
    pub state: Arc<Mutex<ControllerState>>,
    pub notify: StateObserver,
    pub interval: Duration,
}

/// Lifecycle handle for a running sampling loop.
///
/// Created when auto mode starts; consumed by [`LoopHandle::stop`] once the
/// loop has confirmed its exit (or blown the bound).
pub struct LoopHandle {
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LoopHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Request cancellation and wait up to `timeout` for the loop to exit.
    ///
    /// On expiry the task is aborted and [`ControlError::TimeoutOnStop`] is
    /// returned; the caller logs it and proceeds.
    pub async fn stop(mut self, timeout: Duration) -> Result<(), ControlError> {
        let _ = self.cancel_tx.send(true);
        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(_) => {
                debug!("Sampling loop confirmed stopped");
                Ok(())
            }
            Err(_) => {
                self.task.abort();
                Err(ControlError::TimeoutOnStop {
                    task: "sampling loop",
                    timeout,
                })
            }
        }
    }
}

/// Spawn the sampling loop over an already-opened capture device.
///
/// The loop owns `capture` and releases it unconditionally on exit.
pub(crate) fn spawn(ctx: LoopContext, capture: CaptureHandle) -> LoopHandle {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let task = tokio::spawn(run(ctx, capture, cancel_rx));
    LoopHandle { cancel_tx, task }
}

async fn run(ctx: LoopContext, capture: CaptureHandle, mut cancel: watch::Receiver<bool>) {
    info!(
        "🔆 Auto-sampling loop started ({}ms interval, sampler '{}')",
        ctx.interval.as_millis(),
        ctx.sampler.name()
    );

    let mut ticker = tokio::time::interval(ctx.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        if *cancel.borrow() {
            break;
        }
        tokio::select! {
            _ = cancel.changed() => break,
            _ = ticker.tick() => {}
        }

        // One frame, bounded by the sampling interval so a stuck capture
        // cannot delay cancellation past one interval.
        let frame = tokio::select! {
            _ = cancel.changed() => break,
            read = tokio::time::timeout(ctx.interval, ctx.sampler.read_frame(&capture)) => {
                match read {
                    Ok(Ok(frame)) => frame,
                    Ok(Err(e)) => {
                        warn!("Skipping sampling cycle: {}", e);
                        continue;
                    }
                    Err(_) => {
                        warn!("Frame read exceeded the sampling interval, skipping cycle");
                        continue;
                    }
                }
            }
        };

        let mean = mean_luminance(&frame);
        let level = BrightnessLevel::from_luminance(mean);

        // A manual override may have landed while we were sampling. The
        // override wins: discard the computed value without touching the
        // driver.
        if ctx.state.lock().mode != Mode::Auto {
            debug!("Mode left Auto mid-cycle, discarding sampled {}", level);
            continue;
        }

        if let Err(e) = ctx.driver.set(level).await {
            warn!("Auto brightness apply failed: {}", e);
            continue;
        }

        // Re-validate under the lock before committing; the driver write
        // happened without the lock held.
        {
            let mut state = ctx.state.lock();
            if state.mode != Mode::Auto {
                debug!("Mode left Auto during apply, not committing {}", level);
                continue;
            }
            state.brightness = level;
        }
        (ctx.notify)(Mode::Auto, level);
        debug!("Sampling cycle: mean luminance {:.1} → {}", mean, level);
    }

    // Device handle released unconditionally, including on the failure path
    ctx.sampler.close(capture).await;
    info!("Auto-sampling loop exited");
}
