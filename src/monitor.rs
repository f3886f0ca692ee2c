//! Background maintenance
//!
//! A periodic task that calls the engine's two maintenance entry points:
//! `flush_check` then `check_and_compact`. The first failure ends the task
//! and is handed back by [`MonitorHandle::stop`]. The engine itself never starts
//! background work; the embedding application owns the [`MonitorHandle`].

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Sender};

use crate::engine::Engine;
use crate::error::{LsmError, Result};

/// Periodic flush/compaction driver
pub struct Monitor;

/// Handle to a running monitor thread.
/// Dropping this handle signals the thread to stop.
pub struct MonitorHandle {
    /// Signal the background thread to stop
    shutdown: Option<Sender<()>>,
    /// Background thread join handle; yields the error that stopped it
    thread: Option<thread::JoinHandle<Result<()>>>,
}

impl Monitor {
    /// Start ticking at the engine's configured check interval
    pub fn start(engine: Arc<Engine>) -> Result<MonitorHandle> {
        let interval = engine.config().check_interval();
        Self::start_with_interval(engine, interval)
    }

    /// Start ticking at `interval`
    ///
    /// The first maintenance error stops the thread; nothing is retried.
    /// [`MonitorHandle::stop`] returns that error.
    pub fn start_with_interval(engine: Arc<Engine>, interval: Duration) -> Result<MonitorHandle> {
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
        let ticker = channel::tick(interval);

        let thread = thread::Builder::new()
            .name("lsmkv-monitor".to_string())
            .spawn(move || {
                tracing::info!(?interval, "monitor started");
                loop {
                    crossbeam::select! {
                        recv(ticker) -> _ => {
                            if let Err(e) = Self::run_once(&engine) {
                                tracing::error!(error = %e, "monitor stopped by maintenance failure");
                                return Err(e);
                            }
                        }
                        // A message or a dropped sender both mean stop
                        recv(shutdown_rx) -> _ => break,
                    }
                }
                tracing::info!("monitor stopped");
                Ok(())
            })?;

        Ok(MonitorHandle {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    /// One maintenance pass
    fn run_once(engine: &Engine) -> Result<()> {
        if let Some(info) = engine.flush_check()? {
            tracing::debug!(seq = info.seq, "monitor flushed memtable");
        }
        let written = engine.check_and_compact()?;
        if !written.is_empty() {
            tracing::debug!(levels = written.len(), "monitor compacted levels");
        }
        Ok(())
    }
}

impl MonitorHandle {
    /// Request shutdown and wait for the background thread to finish.
    ///
    /// Returns the maintenance error that stopped the thread early, if any.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown_and_join()
    }

    /// Check if the monitor thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn shutdown_and_join(&mut self) -> Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        match self.thread.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| LsmError::Background("monitor thread panicked".to_string()))?,
            None => Ok(()),
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_and_join();
    }
}
