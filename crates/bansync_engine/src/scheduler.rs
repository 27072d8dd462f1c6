//! Background thread driving the sync cycle.

use crate::engine::SyncEngine;
use crate::host::BanHost;
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

#[derive(Debug, Default)]
struct Shutdown {
    requested: Mutex<bool>,
    signal: Condvar,
}

impl Shutdown {
    /// Waits up to `delay`. Returns true if shutdown was requested.
    fn wait(&self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        let mut requested = self.requested.lock();
        while !*requested {
            if self.signal.wait_until(&mut requested, deadline).timed_out() {
                break;
            }
        }
        *requested
    }

    fn request(&self) {
        *self.requested.lock() = true;
        self.signal.notify_all();
    }
}

/// Runs [`SyncEngine::tick`] on a dedicated thread.
///
/// The first tick runs immediately; each later tick starts the configured
/// push delay after the previous one finished. The loop exits when the
/// scheduler is shut down or the engine unloads. Dropping the scheduler
/// shuts it down and joins the thread, abandoning any pending wait.
#[derive(Debug)]
pub struct SyncScheduler {
    shutdown: Arc<Shutdown>,
    handle: Option<JoinHandle<()>>,
}

impl SyncScheduler {
    /// Spawns the sync thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn start<H: BanHost + 'static>(engine: Arc<SyncEngine<H>>) -> io::Result<Self> {
        let shutdown = Arc::new(Shutdown::default());
        let delay = engine.config().push_delay();
        let signal = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("bansync".into())
            .spawn(move || {
                info!(delay_ms = delay.as_millis() as u64, "ban sync started");
                loop {
                    // Failures are logged and recorded by the engine.
                    if let Ok(report) = engine.tick() {
                        debug!(?report, "tick complete");
                    }
                    if engine.is_unloaded() || signal.wait(delay) {
                        break;
                    }
                }
                info!("ban sync stopped");
            })?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Asks the thread to stop after the current phase.
    pub fn shutdown(&self) {
        self.shutdown.request();
    }

    /// Returns true if the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stops the thread and waits for it to exit.
    pub fn join(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.shutdown.request();
        if let Some(handle) = self.handle.take() {
            if let Err(payload) = handle.join() {
                error!(panic = panic_message(payload.as_ref()), "ban sync thread panicked");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
