//! Periodic one-unit width nudge that forces a full repaint.
//!
//! Some compositors leave stale black regions after a window spent a while
//! minimized or in the background. Shrinking the window by one unit and
//! restoring it, with resize handling suspended, makes the toolkit redraw
//! everything without the placement engine ever seeing the change. The
//! nudge is skipped while a user resize is still settling, so it never
//! fights a border drag.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
    time::Duration,
};

use tracing::{debug, trace};

use crate::{
    debounce::{DebounceState, ResizeDebouncer},
    dispatcher::{Dispatcher, Priority, Timer},
    engine::PlacementObserver,
    host::{SizingMode, WindowHost},
};

/// Name of the watchdog timer.
pub const REDRAW_WATCHDOG_TIMER: &str = "redraw-watchdog";

/// State shared between the handle and the timer callback.
struct Shared {
    /// Window to nudge.
    host: Rc<dyn WindowHost>,
    /// Suspended during the nudge.
    debouncer: ResizeDebouncer,
    /// Scheduler the refresh is posted to.
    dispatcher: Dispatcher,
    /// Optional activity hook.
    observer: Option<Rc<dyn PlacementObserver>>,
    /// Regular interval.
    period: Duration,
    /// Narrower windows are not nudged.
    min_width: f64,
    /// Periodic timer; released on close.
    timer: RefCell<Option<Timer>>,
    /// Completed ticks.
    ticks: Cell<u64>,
}

impl Shared {
    /// Queue a refresh at render priority.
    fn post_refresh(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.dispatcher.post(Priority::Render, move || {
            if let Some(shared) = weak.upgrade() {
                shared.refresh();
            }
        });
    }

    /// Run one nudge and report it.
    fn refresh(&self) {
        let nudged = nudge_width(&*self.host, &self.debouncer, self.min_width);
        self.ticks.set(self.ticks.get() + 1);
        trace!(nudged, tick = self.ticks.get(), "redraw_tick");
        if let Some(obs) = &self.observer {
            obs.on_redraw_tick(nudged);
        }
    }
}

/// Shrink the window by one unit and restore it with resize handling off.
///
/// Returns false when the window is too narrow to nudge, or when a resize
/// is still pending in `debouncer`.
pub fn nudge_width(host: &dyn WindowHost, debouncer: &ResizeDebouncer, min_width: f64) -> bool {
    if debouncer.state() == DebounceState::Pending {
        trace!("redraw_skipped_resize_pending");
        return false;
    }
    let initial = host.actual_size().width;
    if !(initial >= min_width) {
        return false;
    }
    debouncer.set_enabled(false);
    let old = host.sizing();
    host.set_width(initial - 1.0);
    host.set_sizing(SizingMode::Manual);
    host.update_layout();
    host.set_width(initial);
    host.set_sizing(old);
    host.update_layout();
    debouncer.set_enabled(true);
    true
}

/// Timer-driven redraw nudger. Cloning yields another handle.
#[derive(Clone)]
pub struct RedrawWatchdog {
    /// Shared state.
    shared: Rc<Shared>,
    /// Interval applied once after activation.
    activation: Duration,
}

impl fmt::Debug for RedrawWatchdog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedrawWatchdog")
            .field("period", &self.shared.period)
            .field("activation", &self.activation)
            .field("ticks", &self.shared.ticks.get())
            .finish()
    }
}

impl RedrawWatchdog {
    /// Create a stopped watchdog.
    pub fn new(
        dispatcher: &Dispatcher,
        host: Rc<dyn WindowHost>,
        debouncer: ResizeDebouncer,
        period: Duration,
        activation: Duration,
        min_width: f64,
        observer: Option<Rc<dyn PlacementObserver>>,
    ) -> Self {
        let shared = Rc::new(Shared {
            host,
            debouncer,
            dispatcher: dispatcher.clone(),
            observer,
            period,
            min_width,
            timer: RefCell::new(None),
            ticks: Cell::new(0),
        });
        let weak: Weak<Shared> = Rc::downgrade(&shared);
        let timer = dispatcher.timer(
            REDRAW_WATCHDOG_TIMER,
            period,
            Priority::Background,
            move || {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                shared.post_refresh();
                // Any shortened activation interval lasts for one tick only.
                if let Some(t) = shared.timer.borrow().as_ref() {
                    if t.interval() != shared.period {
                        t.set_interval(shared.period);
                        t.start();
                    }
                }
            },
        );
        *shared.timer.borrow_mut() = Some(timer);
        Self { shared, activation }
    }

    /// Arm the periodic timer.
    pub fn start(&self) {
        if let Some(t) = self.shared.timer.borrow().as_ref() {
            debug!(period_ms = self.shared.period.as_millis() as u64, "watchdog_start");
            t.start();
        }
    }

    /// Window came to the foreground: refresh now and once more shortly after.
    pub fn on_activated(&self) {
        let armed = self.shared.timer.borrow().as_ref().map(|t| {
            t.set_interval(self.activation);
            t.start();
        });
        if armed.is_some() {
            trace!(activation_ms = self.activation.as_millis() as u64, "watchdog_activated");
            self.shared.post_refresh();
        }
    }

    /// Completed refresh ticks.
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.get()
    }

    /// Interval until the next tick.
    pub fn interval(&self) -> Duration {
        self.shared
            .timer
            .borrow()
            .as_ref()
            .map_or(Duration::ZERO, Timer::interval)
    }

    /// True while the timer is armed.
    pub fn is_running(&self) -> bool {
        self.shared
            .timer
            .borrow()
            .as_ref()
            .is_some_and(Timer::is_enabled)
    }

    /// Stop and release the timer.
    pub fn close(&self) {
        let timer = self.shared.timer.borrow_mut().take();
        if let Some(t) = timer {
            t.stop();
            trace!("watchdog_closed");
        }
    }
}
