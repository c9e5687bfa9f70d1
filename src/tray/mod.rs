//! System tray module
//!
//! The tray is a background task on a dedicated OS thread (it must own the
//! native message pump). This module defines the commands it delivers, the
//! host seam used to start it, and the handle used to stop it with a bounded
//! wait.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::ControlError;

pub mod icons;
pub mod manager;

pub use manager::NativeTrayHost;

/// Commands delivered from the tray menu to the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    /// "Show" menu item: restore the window
    Show,
    /// "Exit" menu item: terminate the application
    Exit,
}

/// Something that can run a tray background task.
///
/// The native implementation is [`NativeTrayHost`]; tests substitute their
/// own.
pub trait TrayHost: Send + Sync {
    /// Start a tray task delivering menu selections over `command_tx`.
    ///
    /// Fails with [`ControlError::Tray`] when the icon or menu cannot be
    /// created.
    fn start(
        &self,
        command_tx: mpsc::UnboundedSender<TrayCommand>,
    ) -> Result<TrayTaskHandle, ControlError>;
}

/// Handle to a running tray task.
///
/// The task confirms its exit over the `done` channel; `stop` waits for that
/// confirmation with a bound, since an OS thread cannot be aborted.
pub struct TrayTaskHandle {
    stop_tx: crossbeam::channel::Sender<()>,
    done_rx: crossbeam::channel::Receiver<()>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl TrayTaskHandle {
    pub fn new(
        stop_tx: crossbeam::channel::Sender<()>,
        done_rx: crossbeam::channel::Receiver<()>,
        thread: std::thread::JoinHandle<()>,
    ) -> Self {
        Self {
            stop_tx,
            done_rx,
            thread: Some(thread),
        }
    }

    /// Request the tray task to stop and wait up to `timeout` for it.
    ///
    /// Safe against a task that already exited on its own (the exit
    /// confirmation is buffered). On expiry the thread is left orphaned and
    /// [`ControlError::TimeoutOnStop`] is returned.
    pub async fn stop(mut self, timeout: Duration) -> Result<(), ControlError> {
        let _ = self.stop_tx.send(());

        // The confirmation wait is blocking; keep it off the runtime workers.
        let done_rx = self.done_rx.clone();
        let confirmed = tokio::task::spawn_blocking(move || done_rx.recv_timeout(timeout).is_ok())
            .await
            .unwrap_or(false);

        if confirmed {
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
            debug!("Tray task confirmed stopped");
            Ok(())
        } else {
            Err(ControlError::TimeoutOnStop {
                task: "tray task",
                timeout,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_fake_task(honors_stop: bool) -> TrayTaskHandle {
        let (stop_tx, stop_rx) = crossbeam::channel::bounded::<()>(1);
        let (done_tx, done_rx) = crossbeam::channel::bounded::<()>(1);
        let thread = std::thread::spawn(move || {
            if honors_stop {
                let _ = stop_rx.recv();
                let _ = done_tx.send(());
            } else {
                // Ignores cancellation entirely
                std::thread::sleep(Duration::from_secs(5));
            }
        });
        TrayTaskHandle::new(stop_tx, done_rx, thread)
    }

    #[tokio::test]
    async fn stop_joins_a_cooperative_task() {
        let handle = spawn_fake_task(true);
        handle.stop(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn stop_returns_within_bound_when_task_ignores_cancellation() {
        let handle = spawn_fake_task(false);
        let started = std::time::Instant::now();
        let err = handle.stop(Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, ControlError::TimeoutOnStop { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn stop_after_self_exit_still_succeeds() {
        let (stop_tx, _stop_rx) = crossbeam::channel::bounded::<()>(1);
        let (done_tx, done_rx) = crossbeam::channel::bounded::<()>(1);
        let worker = std::thread::spawn(move || {
            // Task exits on its own before stop is called
            let _ = done_tx.send(());
        });
        worker.join().unwrap();

        let handle = TrayTaskHandle::new(stop_tx, done_rx, std::thread::spawn(|| {}));
        handle.stop(Duration::from_millis(100)).await.unwrap();
    }
}
