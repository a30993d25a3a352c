//! Dedicated dispatch thread for a [`Scheduler`].

use super::Scheduler;
use crate::SluiceError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Upper bound on a single wait inside the dispatch loop.
const MAX_DISPATCH_WAIT: Duration = Duration::from_secs(60);

const THREAD_NAME: &str = "sluice-scheduler";

/// Runs a scheduler's dispatch loop on its own thread.
///
/// Created stopped; call [`start`](Self::start). Stop it through
/// [`make_deleter`](Self::make_deleter), or by dropping it.
#[derive(Debug)]
pub struct SchedulerThread {
    scheduler: Arc<Scheduler>,
    quit: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SchedulerThread {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self {
            scheduler,
            quit: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Spawn the dispatch thread.
    pub fn start(&mut self) -> Result<(), SluiceError> {
        if self.handle.is_some() {
            return Err(SluiceError::SchedulerError(
                "scheduler thread already started".to_string(),
            ));
        }
        if self.quit.load(Ordering::SeqCst) {
            return Err(SluiceError::SchedulerError(
                "scheduler thread was shut down".to_string(),
            ));
        }
        let scheduler = Arc::clone(&self.scheduler);
        let quit = Arc::clone(&self.quit);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || Self::run(&scheduler, &quit))
            .map_err(|e| SluiceError::SchedulerError(e.to_string()))?;
        self.handle = Some(handle);
        tracing::debug!(thread = THREAD_NAME, "Scheduler thread started");
        Ok(())
    }

    fn run(scheduler: &Scheduler, quit: &AtomicBool) {
        while !quit.load(Ordering::SeqCst) {
            scheduler.dispatch(MAX_DISPATCH_WAIT, Some(quit));
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// A unit of work that stops and joins this thread when run.
    ///
    /// Meant to be handed to a [`DeferredCleanup`](super::DeferredCleanup)
    /// and run late in teardown, once alarms no longer need to fire.
    #[must_use]
    pub fn make_deleter(self) -> SchedulerShutdown {
        SchedulerShutdown { thread: Some(self) }
    }

    /// Stop the loop and join the thread. Later calls do nothing.
    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            self.quit.store(true, Ordering::SeqCst);
            return;
        };
        let quit = Arc::clone(&self.quit);
        self.scheduler
            .signal_with(move || quit.store(true, Ordering::SeqCst));
        if handle.join().is_err() {
            tracing::error!(thread = THREAD_NAME, "Scheduler thread panicked");
        } else {
            tracing::debug!(thread = THREAD_NAME, "Scheduler thread stopped");
        }
    }
}

impl Drop for SchedulerThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Deferred shutdown of a [`SchedulerThread`]: signal, join, drop.
#[derive(Debug)]
pub struct SchedulerShutdown {
    thread: Option<SchedulerThread>,
}

impl SchedulerShutdown {
    pub fn run(mut self) {
        if let Some(mut thread) = self.thread.take() {
            thread.shutdown();
        }
    }
}

impl Drop for SchedulerShutdown {
    fn drop(&mut self) {
        if let Some(mut thread) = self.thread.take() {
            thread.shutdown();
        }
    }
}
