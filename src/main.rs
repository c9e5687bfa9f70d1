//! luxtray - ambient brightness control with a system tray presence
//!
//! Wires the hardware backends to the mode controller, presence manager and
//! command surface, then runs the foreground event loop until an explicit
//! stop command arrives.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use luxtray::commands::CommandSurface;
use luxtray::config::AppConfig;
use luxtray::controller::ModeController;
use luxtray::drivers::{BrightnessDriver, ConsoleBrightnessDriver, LightSampler, SimulatedSampler};
use luxtray::presence::PresenceManager;
use luxtray::surface::{HeadlessWindow, UiGesture, WindowSurface};
use luxtray::tray::{NativeTrayHost, TrayCommand, TrayHost};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // No command-line surface: configuration comes from the environment and
    // the config file only
    let config_path = AppConfig::resolve_path();
    let config = AppConfig::load(&config_path).await?;

    init_logging(&config.log.level)?;

    info!("Starting luxtray...");
    info!("Configuration file: {}", config_path);

    let driver = select_brightness_driver().await;
    info!("Brightness driver: {}", driver.name());

    let sampler: Arc<dyn LightSampler> =
        Arc::new(SimulatedSampler::new(config.sampling.camera_index, 128));
    info!("Light sampler: {}", sampler.name());

    let controller = Arc::new(ModeController::new(driver, sampler, &config.sampling).await);

    // Display-facing observer: the external surface renders these snapshots
    controller.subscribe(Arc::new(|mode, level| {
        info!("Brightness: {} ({:?})", level, mode);
    }));

    // Tray selections flow back into the runtime over this channel
    let (tray_tx, tray_rx) = mpsc::unbounded_channel::<TrayCommand>();

    let window: Arc<dyn WindowSurface> = Arc::new(HeadlessWindow::new());
    let tray: Arc<dyn TrayHost> = Arc::new(NativeTrayHost::new(config.tray.clone()));
    let presence = Arc::new(PresenceManager::new(
        window,
        tray,
        tray_tx,
        config.sampling.stop_timeout(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let surface = Arc::new(CommandSurface::new(
        Arc::clone(&controller),
        Arc::clone(&presence),
        shutdown_tx,
    ));

    // The original behavior: auto brightness is on from the start. A missing
    // capture device degrades to manual mode.
    if config.sampling.auto_on_start {
        if let Err(e) = controller.set_auto(true).await {
            warn!("Auto brightness not started ({}), staying in manual mode", e);
        }
    }

    // The embedding UI sends its gestures here; keep the sender alive for
    // the lifetime of the loop
    let (gesture_tx, gesture_rx) = mpsc::unbounded_channel::<UiGesture>();

    run_app(surface, gesture_rx, tray_rx, shutdown_rx).await;

    drop(gesture_tx);
    info!("luxtray shutdown complete");
    Ok(())
}

/// Foreground event loop: gestures, tray commands, stop signals.
///
/// Long-running work never happens here; every branch delegates to the
/// command surface and returns to the select.
async fn run_app(
    surface: Arc<CommandSurface>,
    mut gesture_rx: mpsc::UnboundedReceiver<UiGesture>,
    mut tray_rx: mpsc::UnboundedReceiver<TrayCommand>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!("Ready, entering event loop");

    loop {
        tokio::select! {
            Some(gesture) = gesture_rx.recv() => {
                surface.handle_gesture(gesture).await;
            }

            Some(command) = tray_rx.recv() => {
                surface.handle_tray_command(command).await;
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, stopping");
                surface.stop_application().await;
            }

            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("Shutdown signal received, leaving event loop");
                    break;
                }
            }
        }
    }
}

/// Pick the best available brightness backend for this platform.
async fn select_brightness_driver() -> Arc<dyn BrightnessDriver> {
    #[cfg(target_os = "linux")]
    {
        match luxtray::drivers::SysfsBacklight::discover().await {
            Ok(backlight) => return Arc::new(backlight),
            Err(e) => warn!("No sysfs backlight ({}), using console driver", e),
        }
    }

    Arc::new(ConsoleBrightnessDriver::default())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
