//! Single-threaded cooperative scheduler.
//!
//! All placement work runs on one thread: posted jobs and named timers are
//! queued by [`Priority`] and executed by [`Dispatcher::pump`]. Nothing here
//! blocks; the async [`Dispatcher::run`] loop only sleeps until the next timer
//! deadline or until new work is posted.
//!
//! Each timer carries a generation counter. Stopping or restarting a timer
//! bumps it, so an expiry that was already queued for the old generation is
//! dropped instead of running a stale callback.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
    time::Duration,
};

use tokio::{
    sync::Notify,
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Execution priority; higher runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Runs when nothing else is queued.
    Background,
    /// Input-idle work; never preempts layout or rendering.
    Input,
    /// Render pass work.
    Render,
    /// Regular posted work.
    Normal,
}

/// What a queued job does when it runs.
enum JobKind {
    /// A one-shot closure.
    Post(Box<dyn FnOnce()>),
    /// A timer fire, valid only while the generation matches.
    Fire { id: u64, generation: u64 },
}

/// One queued job.
struct Job {
    /// Scheduling priority.
    priority: Priority,
    /// Insertion order, for FIFO within a priority.
    seq: u64,
    /// Payload.
    kind: JobKind,
}

/// Registered timer.
struct TimerSlot {
    /// Name used in logs.
    name: &'static str,
    /// Delay between fires.
    interval: Duration,
    /// Priority the fire is queued at.
    priority: Priority,
    /// Bumped on every start and stop.
    generation: u64,
    /// Next deadline; `None` while stopped.
    due: Option<Instant>,
    /// Fire handler.
    callback: Rc<dyn Fn()>,
}

/// Scheduler state behind the shared handle.
#[derive(Default)]
struct Inner {
    /// Pending jobs.
    queue: Vec<Job>,
    /// Timers by id.
    timers: HashMap<u64, TimerSlot>,
    /// Next job sequence number.
    next_seq: u64,
    /// Next timer id.
    next_timer: u64,
    /// Set by `shutdown`.
    closed: bool,
}

impl Inner {
    /// Queue a job.
    fn push(&mut self, priority: Priority, kind: JobKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Job {
            priority,
            seq,
            kind,
        });
    }

    /// Remove the highest-priority job, FIFO within one priority.
    fn pop(&mut self) -> Option<Job> {
        let idx = self
            .queue
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.priority.cmp(&b.priority).then(b.seq.cmp(&a.seq)))
            .map(|(i, _)| i)?;
        Some(self.queue.swap_remove(idx))
    }
}

/// Cooperative UI-thread scheduler. Cloning yields another handle.
#[derive(Clone)]
pub struct Dispatcher {
    /// Shared state.
    inner: Rc<RefCell<Inner>>,
    /// Wakes `run` when work arrives.
    wake: Rc<Notify>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Dispatcher")
            .field("queued", &inner.queue.len())
            .field("timers", &inner.timers.len())
            .field("closed", &inner.closed)
            .finish()
    }
}

impl Dispatcher {
    /// Create an idle dispatcher.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner::default())),
            wake: Rc::new(Notify::new()),
        }
    }

    /// Queue `job` at `priority`. Ignored after [`Dispatcher::shutdown`].
    pub fn post<F>(&self, priority: Priority, job: F)
    where
        F: FnOnce() + 'static,
    {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                trace!("dispatcher_post_after_shutdown");
                return;
            }
            inner.push(priority, JobKind::Post(Box::new(job)));
        }
        self.wake.notify_one();
    }

    /// Register a stopped repeating timer.
    pub fn timer<F>(
        &self,
        name: &'static str,
        interval: Duration,
        priority: Priority,
        callback: F,
    ) -> Timer
    where
        F: Fn() + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_timer;
        inner.next_timer += 1;
        inner.timers.insert(
            id,
            TimerSlot {
                name,
                interval,
                priority,
                generation: 0,
                due: None,
                callback: Rc::new(callback),
            },
        );
        trace!(timer = name, id, "timer_register");
        Timer {
            id,
            name,
            dispatcher: Rc::downgrade(&self.inner),
            wake: self.wake.clone(),
        }
    }

    /// Run everything that is ready now; returns the number of jobs executed.
    ///
    /// The clock is sampled once, so a timer restarted during the pump
    /// never fires within the same pump.
    pub fn pump(&self) -> usize {
        let now = Instant::now();
        {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let mut due: Vec<(u64, u64, Priority)> = Vec::new();
            for (id, slot) in inner.timers.iter_mut() {
                if slot.due.is_some_and(|d| d <= now) {
                    slot.due = Some(now + slot.interval);
                    due.push((*id, slot.generation, slot.priority));
                }
            }
            due.sort_by_key(|(id, _, _)| *id);
            for (id, generation, priority) in due {
                inner.push(priority, JobKind::Fire { id, generation });
            }
        }

        let mut ran = 0;
        loop {
            let Some(job) = self.inner.borrow_mut().pop() else {
                break;
            };
            match job.kind {
                JobKind::Post(f) => {
                    f();
                    ran += 1;
                }
                JobKind::Fire { id, generation } => {
                    let callback = {
                        let inner = self.inner.borrow();
                        match inner.timers.get(&id) {
                            Some(slot) if slot.generation == generation && slot.due.is_some() => {
                                trace!(timer = slot.name, generation, "timer_fire");
                                Some(slot.callback.clone())
                            }
                            _ => {
                                trace!(id, generation, "timer_fire_stale");
                                None
                            }
                        }
                    };
                    if let Some(cb) = callback {
                        cb();
                        ran += 1;
                    }
                }
            }
        }
        ran
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner
            .borrow()
            .timers
            .values()
            .filter_map(|s| s.due)
            .min()
    }

    /// True when posted work is waiting for a pump.
    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().queue.is_empty()
    }

    /// Number of timers currently running.
    pub fn active_timers(&self) -> usize {
        self.inner
            .borrow()
            .timers
            .values()
            .filter(|s| s.due.is_some())
            .count()
    }

    /// Drive the scheduler until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        trace!("dispatcher_run_start");
        loop {
            self.pump();
            if shutdown.is_cancelled() || self.inner.borrow().closed {
                break;
            }
            let deadline = self.next_deadline();
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = self.wake.notified() => {}
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {}
            }
        }
        trace!("dispatcher_run_stop");
    }

    /// Drive the scheduler for `span` of (possibly virtual) time.
    ///
    /// Under a paused tokio clock this steps deterministically from deadline
    /// to deadline.
    pub async fn run_for(&self, span: Duration) {
        let end = Instant::now() + span;
        loop {
            self.pump();
            match self.next_deadline() {
                Some(d) if d <= end => sleep_until(d).await,
                _ => break,
            }
        }
        sleep_until(end).await;
        self.pump();
    }

    /// Stop every timer and drop queued work; later posts are ignored.
    pub fn shutdown(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.closed = true;
        inner.queue.clear();
        for slot in inner.timers.values_mut() {
            slot.due = None;
            slot.generation += 1;
        }
        trace!("dispatcher_shutdown");
    }
}

/// Handle to a named dispatcher timer. Dropping it unregisters the timer.
pub struct Timer {
    /// Slot id.
    id: u64,
    /// Name used in logs.
    name: &'static str,
    /// Owning scheduler; dead after shutdown.
    dispatcher: Weak<RefCell<Inner>>,
    /// Wakes `run` after rescheduling.
    wake: Rc<Notify>,
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("name", &self.name)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl Timer {
    /// Run `f` on the slot with a flag telling whether the scheduler is closed.
    fn with_slot<R>(&self, f: impl FnOnce(&mut TimerSlot, bool) -> R) -> Option<R> {
        let inner = self.dispatcher.upgrade()?;
        let mut inner = inner.borrow_mut();
        let closed = inner.closed;
        inner.timers.get_mut(&self.id).map(|slot| f(slot, closed))
    }

    /// Timer name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// (Re)arm the timer one interval from now.
    pub fn start(&self) {
        let armed = self.with_slot(|slot, closed| {
            if closed {
                return false;
            }
            slot.generation += 1;
            slot.due = Some(Instant::now() + slot.interval);
            trace!(timer = slot.name, generation = slot.generation, interval_ms = slot.interval.as_millis() as u64, "timer_start");
            true
        });
        if armed == Some(true) {
            self.wake.notify_one();
        }
    }

    /// Disarm the timer; a queued expiry is discarded.
    pub fn stop(&self) {
        self.with_slot(|slot, _| {
            if slot.due.take().is_some() {
                trace!(timer = slot.name, "timer_stop");
            }
            slot.generation += 1;
        });
    }

    /// True while armed.
    pub fn is_enabled(&self) -> bool {
        self.with_slot(|slot, _| slot.due.is_some()).unwrap_or(false)
    }

    /// Current interval.
    pub fn interval(&self) -> Duration {
        self.with_slot(|slot, _| slot.interval)
            .unwrap_or(Duration::ZERO)
    }

    /// Change the interval; takes effect from the next arm or expiry.
    pub fn set_interval(&self, interval: Duration) {
        self.with_slot(|slot, _| slot.interval = interval);
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if let Some(inner) = self.dispatcher.upgrade() {
            if let Ok(mut inner) = inner.try_borrow_mut() {
                inner.timers.remove(&self.id);
                trace!(timer = self.name, "timer_unregister");
            }
        }
    }
}
