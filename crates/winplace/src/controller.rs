//! Wires a window to the placement engine, debouncer and watchdog.
//!
//! Event handlers never borrow the engine directly: size changes go through
//! the debouncer, the first render posts the restore step to the dispatcher.
//! This keeps every engine call out of the toolkit's notification stack.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use tracing::{debug, info, warn};

use crate::{
    Result,
    aspects::WindowAspects,
    cfg::PlacementCfg,
    context::{RelocationFlag, ScreenContext},
    debounce::ResizeDebouncer,
    dispatcher::{Dispatcher, Priority},
    engine::{PlacementEngine, PlacementObserver, Recompute},
    events::{Subscription, WindowEvent},
    host::{Viewer, WindowHost, WindowState},
    notice::{InfoPublisher, LayoutSink, TracingPublisher},
    screen::ScreenResolver,
    watchdog::RedrawWatchdog,
};

/// Builder for [`WindowController`].
pub struct WindowControllerBuilder {
    /// Window being managed.
    host: Rc<dyn WindowHost>,
    /// Monitor lookup.
    screens: Rc<dyn ScreenResolver>,
    /// Receiver of user-facing advisories.
    publisher: Rc<dyn InfoPublisher>,
    /// Optional activity hook.
    observer: Option<Rc<dyn PlacementObserver>>,
    /// Target of `save_layout`.
    sink: Option<Rc<dyn LayoutSink>>,
    /// Screen context shared with other windows.
    context: Option<ScreenContext>,
    /// Tunables.
    cfg: PlacementCfg,
    /// Number of tabs.
    tabs: usize,
}

impl WindowControllerBuilder {
    /// Configuration (defaults otherwise).
    #[must_use]
    pub fn cfg(mut self, cfg: PlacementCfg) -> Self {
        self.cfg = cfg;
        self
    }

    /// Number of tabs (one otherwise).
    #[must_use]
    pub fn tabs(mut self, tabs: usize) -> Self {
        self.tabs = tabs;
        self
    }

    /// Advisory receiver (logging only otherwise).
    #[must_use]
    pub fn publisher(mut self, publisher: Rc<dyn InfoPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Activity observer.
    #[must_use]
    pub fn observer(mut self, observer: Rc<dyn PlacementObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Target of [`WindowController::save_layout`].
    #[must_use]
    pub fn layout_sink(mut self, sink: Rc<dyn LayoutSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Share an existing screen context.
    #[must_use]
    pub fn context(mut self, context: ScreenContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Create the controller, subscribe to window events and start the watchdog.
    pub fn build(self, dispatcher: &Dispatcher) -> WindowController {
        let mut engine = PlacementEngine::new(
            self.host.clone(),
            self.screens.clone(),
            self.publisher,
            self.cfg.clone(),
            self.tabs,
        );
        if let Some(ctx) = self.context {
            engine = engine.with_context(ctx);
        }
        if let Some(obs) = &self.observer {
            engine.set_observer(obs.clone());
        }
        let context = engine.screen_context();
        let engine = Rc::new(RefCell::new(engine));

        let weak_engine = Rc::downgrade(&engine);
        let debouncer = ResizeDebouncer::new(dispatcher, self.cfg.debounce(), move || {
            with_engine(&weak_engine, |e| {
                e.recompute_measures();
            });
        });

        let watchdog = RedrawWatchdog::new(
            dispatcher,
            self.host.clone(),
            debouncer.clone(),
            self.cfg.watchdog_period(),
            self.cfg.watchdog_activation(),
            self.cfg.min_redraw_width,
            self.observer,
        );

        let subscription: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let sub = {
            let debouncer = debouncer.clone();
            let watchdog = watchdog.clone();
            let dispatcher = dispatcher.clone();
            let weak_engine = Rc::downgrade(&engine);
            let weak_host: Weak<dyn WindowHost> = Rc::downgrade(&self.host);
            let screens = self.screens.clone();
            let slot = Rc::downgrade(&subscription);
            self.host.events().subscribe(move |ev| match ev {
                WindowEvent::SizeChanged(_) => debouncer.notify(),
                WindowEvent::LocationChanged => {
                    if let Some(host) = weak_host.upgrade() {
                        if let Some(screen) = screens.current_screen(&*host) {
                            context.update(screen.bounds);
                        }
                    }
                }
                WindowEvent::Activated => watchdog.on_activated(),
                WindowEvent::ContentRendered => {
                    let weak_engine = weak_engine.clone();
                    dispatcher.post(Priority::Normal, move || {
                        with_engine(&weak_engine, PlacementEngine::activate_restored_aspects);
                    });
                    debouncer.notify();
                }
                WindowEvent::Closed => {
                    debouncer.close();
                    watchdog.close();
                    if let Some(slot) = slot.upgrade() {
                        slot.borrow_mut().take();
                    }
                    debug!("window_closed");
                }
            })
        };
        *subscription.borrow_mut() = Some(sub);
        watchdog.start();

        WindowController {
            engine,
            debouncer,
            watchdog,
            host: self.host,
            sink: self.sink,
            subscription,
            closed: Cell::new(false),
        }
    }
}

/// Run `f` on the engine if it is alive and not already borrowed.
fn with_engine<R>(
    engine: &Weak<RefCell<PlacementEngine>>,
    f: impl FnOnce(&mut PlacementEngine) -> R,
) -> Option<R> {
    let engine = engine.upgrade()?;
    match engine.try_borrow_mut() {
        Ok(mut e) => Some(f(&mut e)),
        Err(_) => {
            warn!("engine_busy");
            None
        }
    }
}

/// Owns the placement machinery for one window.
///
/// Dropping the controller (or calling [`WindowController::close`]) stops
/// both timers and removes the event subscription.
pub struct WindowController {
    /// Engine shared with timer callbacks through weak handles.
    engine: Rc<RefCell<PlacementEngine>>,
    /// Coalesces size notifications.
    debouncer: ResizeDebouncer,
    /// Periodic redraw nudger.
    watchdog: RedrawWatchdog,
    /// Window being managed.
    host: Rc<dyn WindowHost>,
    /// Target of `save_layout`.
    sink: Option<Rc<dyn LayoutSink>>,
    /// Event subscription; taken on close.
    subscription: Rc<RefCell<Option<Subscription>>>,
    /// Set once `close` ran.
    closed: Cell<bool>,
}

impl WindowController {
    /// Start building a controller for `host` using `screens`.
    pub fn builder(
        host: Rc<dyn WindowHost>,
        screens: Rc<dyn ScreenResolver>,
    ) -> WindowControllerBuilder {
        WindowControllerBuilder {
            host,
            screens,
            publisher: Rc::new(TracingPublisher),
            observer: None,
            sink: None,
            context: None,
            cfg: PlacementCfg::default(),
            tabs: 1,
        }
    }

    /// Run `f` with the engine borrowed mutably.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut PlacementEngine) -> R) -> R {
        f(&mut self.engine.borrow_mut())
    }

    /// Restore a saved record before the window is shown.
    pub fn apply_persisted_aspects(&self, aspects: Option<WindowAspects>) {
        self.with_engine(|e| e.apply_persisted_aspects(aspects));
    }

    /// Switch to auto-fit and recompute now.
    pub fn force_recalculate(&self) -> Recompute {
        self.with_engine(PlacementEngine::force_recalculate)
    }

    /// Recompute now without changing the sizing mode.
    pub fn recompute_measures(&self) -> Recompute {
        self.with_engine(PlacementEngine::recompute_measures)
    }

    /// Centre the window on its monitor.
    pub fn move_to_start_position(&self) {
        self.with_engine(PlacementEngine::move_to_start_position);
    }

    /// Snapshot of the current window state.
    pub fn capture_current_aspects(&self) -> WindowAspects {
        self.engine.borrow().capture_current_aspects()
    }

    /// True until the window was placed once.
    pub fn is_relocating(&self) -> bool {
        self.engine.borrow().is_relocating()
    }

    /// Shareable handle to the relocation flag.
    pub fn relocation_flag(&self) -> RelocationFlag {
        self.engine.borrow().relocation_flag()
    }

    /// Shareable handle to the current-screen bounds.
    pub fn screen_context(&self) -> ScreenContext {
        self.engine.borrow().screen_context()
    }

    /// Register the viewer of `tab`.
    pub fn attach_viewer(&self, tab: usize, viewer: Rc<dyn Viewer>) {
        self.with_engine(|e| e.attach_viewer(tab, viewer));
    }

    /// The user picked another tab.
    pub fn select_tab(&self, tab: usize) -> Recompute {
        self.with_engine(|e| e.select_tab(tab))
    }

    /// Content inside the window changed its extent; recompute after the quiet period.
    pub fn content_changed(&self) {
        self.debouncer.notify();
    }

    /// Capture the current aspects and hand them to the layout sink.
    pub fn save_layout(&self) -> Result<WindowAspects> {
        let aspects = self.capture_current_aspects();
        match &self.sink {
            Some(sink) => {
                sink.save_tree_state(&aspects)?;
                info!(
                    width = aspects.width,
                    height = aspects.height,
                    tab = aspects.active_tab,
                    "layout_saved"
                );
            }
            None => debug!("save_layout_without_sink"),
        }
        Ok(aspects)
    }

    /// Bring the window back from the task bar and to the foreground.
    pub fn show_me(&self) {
        if self.host.state() == WindowState::Minimized {
            self.host.set_state(WindowState::Normal);
        }
        self.host.activate();
    }

    /// Debouncer handle.
    pub fn debouncer(&self) -> &ResizeDebouncer {
        &self.debouncer
    }

    /// Watchdog handle.
    pub fn watchdog(&self) -> &RedrawWatchdog {
        &self.watchdog
    }

    /// True once closed.
    pub fn is_closed(&self) -> bool {
        self.closed.get() || self.subscription.borrow().is_none()
    }

    /// Stop timers and unsubscribe. Idempotent.
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.debouncer.close();
        self.watchdog.close();
        let sub = self.subscription.borrow_mut().take();
        drop(sub);
        debug!("controller_closed");
    }
}

impl Drop for WindowController {
    fn drop(&mut self) {
        self.close();
    }
}
