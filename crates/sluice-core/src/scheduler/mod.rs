//! # Scheduler
//!
//! A timed alarm queue plus the pieces needed to drive it from a dedicated
//! thread in hosts that have no natural place to dispatch from.
//!
//! ```text
//! Scheduler          alarm queue guarded by one mutex + condvar
//! SchedulerThread    owns the dispatch loop (start / run)
//! SchedulerShutdown  deferred unit that stops and joins the thread once
//! DeferredCleanup    FIFO list of teardown units run at shutdown
//! ```
//!
//! Alarm callbacks run outside the lock, so a callback may add further
//! alarms (periodic work) without deadlocking.

mod thread;

pub use thread::{SchedulerShutdown, SchedulerThread};

use crate::property::Clock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// Work run when an alarm fires.
pub type AlarmCallback = Box<dyn FnOnce() + Send + 'static>;

/// Handle for cancelling a pending alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmId(u64);

#[derive(Default)]
struct AlarmQueue {
    /// (wake time ms, id) -> callback; ties fire in insertion order.
    alarms: BTreeMap<(i64, u64), AlarmCallback>,
    next_id: u64,
}

/// Alarm queue driven by [`process_alarms`](Scheduler::process_alarms).
pub struct Scheduler {
    clock: Arc<dyn Clock>,
    queue: Mutex<AlarmQueue>,
    wakeup: Condvar,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending_alarms", &self.pending_alarms())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            queue: Mutex::new(AlarmQueue::default()),
            wakeup: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AlarmQueue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `callback` once `delay_ms` has elapsed.
    pub fn add_alarm(&self, delay_ms: i64, callback: AlarmCallback) -> AlarmId {
        let wake_ms = self.clock.now_ms().saturating_add(delay_ms.max(0));
        let id = {
            let mut queue = self.lock();
            let id = queue.next_id;
            queue.next_id += 1;
            queue.alarms.insert((wake_ms, id), callback);
            id
        };
        self.wakeup.notify_all();
        AlarmId(id)
    }

    /// Drop a pending alarm. Returns false if it already fired or was cancelled.
    pub fn cancel_alarm(&self, id: AlarmId) -> bool {
        let mut queue = self.lock();
        let key = queue.alarms.keys().find(|(_, alarm)| *alarm == id.0).copied();
        key.and_then(|k| queue.alarms.remove(&k)).is_some()
    }

    #[must_use]
    pub fn pending_alarms(&self) -> usize {
        self.lock().alarms.len()
    }

    /// Run `f` under the scheduler lock, then wake waiters.
    ///
    /// Flags that a waiting dispatcher checks must be flipped through here;
    /// the dispatcher checks them under the same lock before it sleeps.
    pub fn signal_with(&self, f: impl FnOnce()) {
        let _queue = self.lock();
        f();
        self.wakeup.notify_all();
    }

    /// Wait at most `max_wait` for alarms to come due, then run every due
    /// alarm. Returns the number of alarms run.
    pub fn process_alarms(&self, max_wait: Duration) -> usize {
        self.dispatch(max_wait, None)
    }

    pub(crate) fn dispatch(&self, max_wait: Duration, quit: Option<&AtomicBool>) -> usize {
        let due = {
            let mut queue = self.lock();
            let quitting = || quit.is_some_and(|q| q.load(Ordering::SeqCst));
            if quitting() {
                return 0;
            }

            let now = self.clock.now_ms();
            let until_next = queue
                .alarms
                .keys()
                .next()
                .map(|(wake, _)| Duration::from_millis(wake.saturating_sub(now).max(0) as u64));
            let wait = until_next.map_or(max_wait, |d| d.min(max_wait));
            if !wait.is_zero() {
                queue = self
                    .wakeup
                    .wait_timeout(queue, wait)
                    .map(|(guard, _)| guard)
                    .unwrap_or_else(|e| e.into_inner().0);
                if quitting() {
                    return 0;
                }
            }

            let now = self.clock.now_ms();
            let later = queue.alarms.split_off(&(now.saturating_add(1), 0));
            std::mem::replace(&mut queue.alarms, later)
        };

        let ran = due.len();
        for (_, callback) in due {
            callback();
        }
        ran
    }
}

// =============================================================================
// DEFERRED CLEANUP
// =============================================================================

/// Teardown work, run in the order it was added.
#[derive(Default)]
pub struct DeferredCleanup {
    tasks: Vec<Box<dyn FnOnce() + Send>>,
}

impl fmt::Debug for DeferredCleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredCleanup")
            .field("pending", &self.tasks.len())
            .finish()
    }
}

impl DeferredCleanup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, task: impl FnOnce() + Send + 'static) {
        self.tasks.push(Box::new(task));
    }

    /// Defer a scheduler thread's shutdown.
    pub fn defer_shutdown(&mut self, shutdown: SchedulerShutdown) {
        self.defer(move || shutdown.run());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run and discard every pending task.
    pub fn run_all(&mut self) {
        for task in self.tasks.drain(..) {
            task();
        }
    }
}

impl Drop for DeferredCleanup {
    fn drop(&mut self) {
        self.run_all();
    }
}
