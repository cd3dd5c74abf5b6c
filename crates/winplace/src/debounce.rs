//! Coalesces bursts of size notifications into one settled callback.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
    time::Duration,
};

use tracing::trace;

use crate::dispatcher::{Dispatcher, Priority, Timer};

/// Name of the debounce timer.
pub const RESIZE_DEBOUNCE_TIMER: &str = "resize-debounce";

/// Debouncer lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No change pending.
    Idle,
    /// A change arrived; the quiet period is running.
    Pending,
    /// Shut down; notifications are ignored.
    Closed,
}

/// Mutable debouncer state.
struct Inner {
    /// Lifecycle state.
    state: DebounceState,
    /// False while a synthetic resize is running.
    enabled: bool,
    /// Quiet-period timer; released on close.
    timer: Option<Timer>,
}

/// Restartable one-shot delay in front of a recompute.
///
/// Cloning yields another handle to the same debouncer.
#[derive(Clone)]
pub struct ResizeDebouncer {
    /// Shared state.
    inner: Rc<RefCell<Inner>>,
}

impl fmt::Debug for ResizeDebouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ResizeDebouncer")
            .field("state", &inner.state)
            .field("enabled", &inner.enabled)
            .finish()
    }
}

impl ResizeDebouncer {
    /// Create an idle debouncer calling `on_settled` once `delay` passes
    /// without a new notification.
    ///
    /// The timer runs at input priority so it never fires ahead of pending
    /// layout or render work.
    pub fn new<F>(dispatcher: &Dispatcher, delay: Duration, on_settled: F) -> Self
    where
        F: Fn() + 'static,
    {
        let inner = Rc::new(RefCell::new(Inner {
            state: DebounceState::Idle,
            enabled: true,
            timer: None,
        }));
        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&inner);
        let timer = dispatcher.timer(RESIZE_DEBOUNCE_TIMER, delay, Priority::Input, move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            {
                let mut i = inner.borrow_mut();
                if i.state != DebounceState::Pending {
                    return;
                }
                i.state = DebounceState::Idle;
                if let Some(t) = &i.timer {
                    t.stop();
                }
            }
            trace!("debounce_settled");
            on_settled();
        });
        inner.borrow_mut().timer = Some(timer);
        Self { inner }
    }

    /// Record a size change; (re)starts the quiet period.
    pub fn notify(&self) {
        let mut i = self.inner.borrow_mut();
        if i.state == DebounceState::Closed || !i.enabled {
            trace!(state = ?i.state, enabled = i.enabled, "debounce_ignored");
            return;
        }
        if let Some(t) = &i.timer {
            t.start();
        }
        i.state = DebounceState::Pending;
    }

    /// Suspend or resume handling of notifications.
    ///
    /// A quiet period already running keeps running.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.borrow_mut().enabled = enabled;
    }

    /// True while notifications are handled.
    pub fn is_enabled(&self) -> bool {
        self.inner.borrow().enabled
    }

    /// Current state.
    pub fn state(&self) -> DebounceState {
        self.inner.borrow().state
    }

    /// Stop and release the timer; later notifications are ignored.
    pub fn close(&self) {
        let timer = {
            let mut i = self.inner.borrow_mut();
            i.state = DebounceState::Closed;
            i.timer.take()
        };
        if let Some(t) = timer {
            t.stop();
            trace!("debounce_closed");
        }
    }
}
