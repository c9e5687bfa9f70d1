//! Mode controller - single source of truth for mode and brightness
//!
//! Owns the shared `ControllerState` record and the sampling loop's
//! lifecycle. Manual overrides and auto toggles go through here; the
//! invariants are that mode flips are atomic for any concurrent reader and
//! that no hardware call ever happens while the state lock is held.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::SamplingConfig;
use crate::drivers::{BrightnessDriver, LightSampler};
use crate::error::ControlError;
use crate::sampler::{self, LoopContext, LoopHandle};
use crate::state::{BrightnessLevel, ControllerState, Mode, StateObserver};

/// Owns the Auto/Manual flag and the current brightness value
pub struct ModeController {
    state: Arc<Mutex<ControllerState>>,
    driver: Arc<dyn BrightnessDriver>,
    sampler: Arc<dyn LightSampler>,
    observers: Arc<RwLock<Vec<StateObserver>>>,
    /// Slot for the running sampling loop; `None` while Idle.
    /// An async mutex so a bounded stop can be awaited while held.
    loop_slot: tokio::sync::Mutex<Option<LoopHandle>>,
    interval: Duration,
    stop_timeout: Duration,
}

impl ModeController {
    /// Build the controller, seeding brightness from the hardware.
    ///
    /// Starts in Manual mode; a failed hardware read falls back to 50% with
    /// a warning instead of failing startup.
    pub async fn new(
        driver: Arc<dyn BrightnessDriver>,
        sampler: Arc<dyn LightSampler>,
        sampling: &SamplingConfig,
    ) -> Self {
        let initial = match driver.get().await {
            Ok(level) => {
                debug!("Seeded brightness from '{}' driver: {}", driver.name(), level);
                level
            }
            Err(e) => {
                warn!("Could not read current brightness ({}), assuming 50%", e);
                BrightnessLevel::clamped(50)
            }
        };

        Self {
            state: Arc::new(Mutex::new(ControllerState::new(Mode::Manual, initial))),
            driver,
            sampler,
            observers: Arc::new(RwLock::new(Vec::new())),
            loop_slot: tokio::sync::Mutex::new(None),
            interval: sampling.interval(),
            stop_timeout: sampling.stop_timeout(),
        }
    }

    /// Register a display-facing observer for `(mode, brightness)` snapshots.
    pub fn subscribe(&self, observer: StateObserver) {
        self.observers.write().push(observer);
    }

    /// Consistent snapshot of the shared state.
    pub fn current_state(&self) -> ControllerState {
        *self.state.lock()
    }

    /// True while a sampling loop is alive.
    pub async fn loop_running(&self) -> bool {
        self.loop_slot
            .lock()
            .await
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Manual override: force Manual mode and apply a user-requested level.
    ///
    /// Values outside [0, 100] are clamped, not rejected. The sampling loop
    /// (if any) is stopped with a bounded wait before the driver write. On a
    /// driver failure the previously committed brightness is retained and
    /// the error is returned to the caller.
    pub async fn set_manual(&self, requested: i64) -> Result<BrightnessLevel, ControlError> {
        let level = BrightnessLevel::clamped(requested);

        // Flip the mode first so any in-flight auto cycle discards its
        // sample instead of clobbering this override.
        {
            let mut state = self.state.lock();
            if state.mode != Mode::Manual {
                info!("Mode → Manual (user override)");
            }
            state.mode = Mode::Manual;
        }

        self.stop_loop().await;

        // Driver I/O happens without the state lock held
        self.driver.set(level).await?;

        {
            let mut state = self.state.lock();
            state.brightness = level;
        }
        self.notify(Mode::Manual, level);
        debug!("Manual brightness applied: {}", level);
        Ok(level)
    }

    /// Toggle auto mode.
    ///
    /// Enabling is idempotent: a second call while the loop is running is a
    /// no-op and does not open the capture device again. If the device
    /// cannot be opened the mode stays Manual and
    /// [`ControlError::DeviceUnavailable`] is returned. Disabling flips to
    /// Manual and waits (bounded) for the loop to fully exit.
    pub async fn set_auto(&self, enabled: bool) -> Result<(), ControlError> {
        if !enabled {
            {
                let mut state = self.state.lock();
                if state.mode != Mode::Manual {
                    info!("Mode → Manual (auto disabled)");
                }
                state.mode = Mode::Manual;
            }
            self.stop_loop().await;
            let snapshot = self.current_state();
            self.notify(snapshot.mode, snapshot.brightness);
            return Ok(());
        }

        let mut slot = self.loop_slot.lock().await;
        if slot.as_ref().map(|h| !h.is_finished()).unwrap_or(false) {
            debug!("Auto already enabled, ignoring start request");
            return Ok(());
        }

        // Open before flipping the mode: a missing camera must leave the
        // controller in Manual.
        let capture = self.sampler.open().await?;

        {
            let mut state = self.state.lock();
            state.mode = Mode::Auto;
        }
        info!("Mode → Auto");

        let ctx = LoopContext {
            sampler: Arc::clone(&self.sampler),
            driver: Arc::clone(&self.driver),
            state: Arc::clone(&self.state),
            notify: self.fanout(),
            interval: self.interval,
        };
        *slot = Some(sampler::spawn(ctx, capture));
        drop(slot);

        let snapshot = self.current_state();
        self.notify(snapshot.mode, snapshot.brightness);
        Ok(())
    }

    /// Stop the sampling loop if one is running (used at shutdown).
    pub async fn shutdown(&self) {
        self.stop_loop().await;
    }

    async fn stop_loop(&self) {
        let handle = self.loop_slot.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.stop(self.stop_timeout).await {
                // Accepted degraded outcome; lifecycle proceeds
                warn!("{}", e);
            }
        }
    }

    /// Single observer fan-out closure handed to the sampling loop.
    fn fanout(&self) -> StateObserver {
        let observers = Arc::clone(&self.observers);
        Arc::new(move |mode, level| {
            for observer in observers.read().iter() {
                observer(mode, level);
            }
        })
    }

    fn notify(&self, mode: Mode, level: BrightnessLevel) {
        for observer in self.observers.read().iter() {
            observer(mode, level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{CaptureHandle, ConsoleBrightnessDriver, SimulatedSampler};
    use async_trait::async_trait;

    fn fast_config() -> SamplingConfig {
        SamplingConfig {
            interval_ms: 10,
            stop_timeout_ms: 500,
            camera_index: 0,
            auto_on_start: false,
        }
    }

    async fn controller_with(
        driver: Arc<dyn BrightnessDriver>,
        sampler: Arc<dyn LightSampler>,
    ) -> ModeController {
        ModeController::new(driver, sampler, &fast_config()).await
    }

    async fn wait_for_brightness(controller: &ModeController, expected: u8) {
        for _ in 0..100 {
            if controller.current_state().brightness.value() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "brightness never reached {} (stuck at {})",
            expected,
            controller.current_state().brightness
        );
    }

    #[tokio::test]
    async fn manual_override_clamps_and_commits() {
        let driver = Arc::new(ConsoleBrightnessDriver::default());
        let controller = controller_with(driver.clone(), Arc::new(SimulatedSampler::default())).await;

        assert_eq!(controller.set_manual(130).await.unwrap().value(), 100);
        assert_eq!(controller.current_state().brightness.value(), 100);

        assert_eq!(controller.set_manual(-7).await.unwrap().value(), 0);
        let snapshot = controller.current_state();
        assert_eq!(snapshot.mode, Mode::Manual);
        assert_eq!(snapshot.brightness.value(), 0);
        assert_eq!(driver.get().await.unwrap().value(), 0);
    }

    #[tokio::test]
    async fn driver_failure_retains_previous_brightness() {
        /// Driver that always refuses writes.
        struct BrokenDriver;

        #[async_trait]
        impl BrightnessDriver for BrokenDriver {
            fn name(&self) -> &str {
                "broken"
            }
            async fn get(&self) -> Result<BrightnessLevel, ControlError> {
                Ok(BrightnessLevel::clamped(42))
            }
            async fn set(&self, _level: BrightnessLevel) -> Result<(), ControlError> {
                Err(ControlError::Driver("write refused".into()))
            }
        }

        let controller =
            controller_with(Arc::new(BrokenDriver), Arc::new(SimulatedSampler::default())).await;
        assert_eq!(controller.current_state().brightness.value(), 42);

        let err = controller.set_manual(80).await.unwrap_err();
        assert!(matches!(err, ControlError::Driver(_)));
        // Previous value retained, process alive
        assert_eq!(controller.current_state().brightness.value(), 42);
    }

    #[tokio::test]
    async fn enabling_auto_twice_opens_one_device() {
        let sampler = Arc::new(SimulatedSampler::new(0, 128));
        let controller =
            controller_with(Arc::new(ConsoleBrightnessDriver::default()), sampler.clone()).await;

        controller.set_auto(true).await.unwrap();
        controller.set_auto(true).await.unwrap();

        assert_eq!(sampler.open_count(), 1);
        assert!(controller.loop_running().await);

        controller.set_auto(false).await.unwrap();
        assert!(!controller.loop_running().await);
    }

    #[tokio::test]
    async fn missing_camera_falls_back_to_manual() {
        /// Sampler with no device behind it.
        struct NoCamera;

        #[async_trait]
        impl LightSampler for NoCamera {
            fn name(&self) -> &str {
                "none"
            }
            async fn open(&self) -> Result<CaptureHandle, ControlError> {
                Err(ControlError::DeviceUnavailable("no capture device".into()))
            }
            async fn read_frame(&self, _h: &CaptureHandle) -> Result<Vec<u8>, ControlError> {
                unreachable!("open never succeeds")
            }
            async fn close(&self, _h: CaptureHandle) {}
        }

        let controller =
            controller_with(Arc::new(ConsoleBrightnessDriver::default()), Arc::new(NoCamera)).await;

        let err = controller.set_auto(true).await.unwrap_err();
        assert!(matches!(err, ControlError::DeviceUnavailable(_)));
        assert_eq!(controller.current_state().mode, Mode::Manual);
        assert!(!controller.loop_running().await);
    }

    #[tokio::test]
    async fn observers_see_manual_updates() {
        let controller = controller_with(
            Arc::new(ConsoleBrightnessDriver::default()),
            Arc::new(SimulatedSampler::default()),
        )
        .await;

        let seen: Arc<Mutex<Vec<(Mode, u8)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        controller.subscribe(Arc::new(move |mode, level| {
            sink.lock().push((mode, level.value()));
        }));

        controller.set_manual(30).await.unwrap();
        assert_eq!(seen.lock().last(), Some(&(Mode::Manual, 30)));
    }

    #[tokio::test]
    async fn manual_override_during_auto_wins_the_race() {
        /// Sampler whose reads take most of an interval, widening the race
        /// window between sampling and applying.
        struct SlowSampler {
            inner: SimulatedSampler,
        }

        #[async_trait]
        impl LightSampler for SlowSampler {
            fn name(&self) -> &str {
                "slow"
            }
            async fn open(&self) -> Result<CaptureHandle, ControlError> {
                self.inner.open().await
            }
            async fn read_frame(&self, handle: &CaptureHandle) -> Result<Vec<u8>, ControlError> {
                tokio::time::sleep(Duration::from_millis(8)).await;
                self.inner.read_frame(handle).await
            }
            async fn close(&self, handle: CaptureHandle) {
                self.inner.close(handle).await;
            }
        }

        let sampler = Arc::new(SlowSampler {
            inner: SimulatedSampler::new(0, 255),
        });
        let controller =
            controller_with(Arc::new(ConsoleBrightnessDriver::default()), sampler).await;

        controller.set_auto(true).await.unwrap();
        // Land the override while cycles are in flight
        tokio::time::sleep(Duration::from_millis(12)).await;
        controller.set_manual(10).await.unwrap();

        let snapshot = controller.current_state();
        assert_eq!(snapshot.mode, Mode::Manual);
        assert_eq!(snapshot.brightness.value(), 10);
        assert!(!controller.loop_running().await);

        // Nothing sampled before the switch may land afterwards
        tokio::time::sleep(Duration::from_millis(50)).await;
        let snapshot = controller.current_state();
        assert_eq!(snapshot.mode, Mode::Manual);
        assert_eq!(snapshot.brightness.value(), 10);
    }

    #[tokio::test]
    async fn auto_manual_auto_scenario() {
        let sampler = Arc::new(SimulatedSampler::new(0, 128));
        let driver = Arc::new(ConsoleBrightnessDriver::default());
        let controller = controller_with(driver, sampler.clone()).await;

        // Auto with luminance 128 settles at 50
        controller.set_auto(true).await.unwrap();
        wait_for_brightness(&controller, 50).await;
        assert_eq!(controller.current_state().mode, Mode::Auto);

        // Manual slider to 10 while auto is active
        controller.set_manual(10).await.unwrap();
        let snapshot = controller.current_state();
        assert_eq!(snapshot.mode, Mode::Manual);
        assert_eq!(snapshot.brightness.value(), 10);
        assert!(!controller.loop_running().await);

        // Re-enable auto with bright ambient light
        sampler.set_luminance(255);
        controller.set_auto(true).await.unwrap();
        wait_for_brightness(&controller, 100).await;
        assert_eq!(sampler.open_count(), 2);

        controller.set_auto(false).await.unwrap();
    }
}
