//! Window notification hub.
//!
//! The toolkit adapter owns a [`WindowEvents`] hub and emits into it; the
//! placement layer registers listeners and receives a [`Subscription`] guard.
//! Dropping the guard deregisters the listener, so handler lifetime is always
//! explicit.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use tracing::trace;

use crate::geom::Size;

/// Notifications raised by the window surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEvent {
    /// The measured window size changed.
    SizeChanged(Size),
    /// The window moved.
    LocationChanged,
    /// The window regained focus after being in the background.
    Activated,
    /// The first full content render finished.
    ContentRendered,
    /// The window was closed.
    Closed,
}

/// Registered callback.
type Listener = Rc<dyn Fn(&WindowEvent)>;

/// Listener table shared by hub clones and subscriptions.
struct Registry {
    /// Next subscription id.
    next_id: Cell<u64>,
    /// Listeners in subscription order.
    listeners: RefCell<Vec<(u64, Listener)>>,
}

/// Observer hub for [`WindowEvent`]s.
#[derive(Clone)]
pub struct WindowEvents {
    /// Shared listener table.
    registry: Rc<Registry>,
}

impl Default for WindowEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WindowEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl WindowEvents {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self {
            registry: Rc::new(Registry {
                next_id: Cell::new(1),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Register `listener`; it stays registered until the guard is dropped.
    #[must_use = "dropping the subscription deregisters the listener immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&WindowEvent) + 'static,
    {
        let id = self.registry.next_id.get();
        self.registry.next_id.set(id + 1);
        self.registry
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        trace!(id, "window_events_subscribe");
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Deliver `event` to every registered listener.
    ///
    /// Listeners may subscribe, unsubscribe or emit re-entrantly; the
    /// delivery list is snapshotted before the first call.
    pub fn emit(&self, event: &WindowEvent) {
        let snapshot: Vec<Listener> = self
            .registry
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.listeners.borrow().len()
    }
}

/// Registration guard returned by [`WindowEvents::subscribe`].
pub struct Subscription {
    /// Listener id.
    id: u64,
    /// Table to deregister from.
    registry: Weak<Registry>,
}

impl Subscription {
    /// Deregister now (same as dropping).
    pub fn cancel(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .listeners
                .borrow_mut()
                .retain(|(id, _)| *id != self.id);
            trace!(id = self.id, "window_events_unsubscribe");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_deregisters() {
        let hub = WindowEvents::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let sub = hub.subscribe(move |_| h.set(h.get() + 1));
        hub.emit(&WindowEvent::Activated);
        assert_eq!(hub.listener_count(), 1);
        drop(sub);
        hub.emit(&WindowEvent::Activated);
        assert_eq!(hits.get(), 1);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn reentrant_unsubscribe_is_safe() {
        let hub = WindowEvents::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let s = slot.clone();
        let sub = hub.subscribe(move |_| {
            s.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);
        hub.emit(&WindowEvent::Closed);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn guard_outliving_hub_is_harmless() {
        let hub = WindowEvents::new();
        let sub = hub.subscribe(|_| {});
        drop(hub);
        drop(sub);
    }
}
