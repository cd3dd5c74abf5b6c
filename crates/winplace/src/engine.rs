//! Placement engine: size limits, recentring, clamping and tab sizing.
//!
//! The engine never fails. Missing monitors, hidden windows and degenerate
//! measurements turn an operation into a logged no-op.

use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::{
    aspects::WindowAspects,
    cfg::PlacementCfg,
    context::{RelocationFlag, ScreenContext},
    geom::{Point, Rect, Size},
    host::{SizingMode, Viewer, WindowHost, WindowState},
    notice::{InfoPublisher, SCREEN_NOT_AVAILABLE},
    screen::{ScreenGeometry, ScreenResolver},
    tabs::TabSizeMemory,
};

/// Start position divisor: slightly above two, so the window sits a little
/// left of and above the exact centre.
pub const HUMAN_FEEL_GOOD_DIVISOR: f64 = 1.7;

/// Limits derived from one monitor (or the virtual desktop) for one computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementBounds {
    /// Widest allowed window.
    pub max_width: f64,
    /// Tallest allowed window.
    pub max_height: f64,
    /// Leftmost allowed x.
    pub min_left: f64,
    /// Topmost allowed y.
    pub min_top: f64,
}

impl PlacementBounds {
    /// Limits for the working area of `screen`.
    pub fn from_screen(screen: &ScreenGeometry) -> Self {
        let wa = screen.working_area;
        Self {
            max_width: wa.w,
            max_height: wa.h,
            min_left: wa.x,
            min_top: wa.y,
        }
    }

    /// Right edge of the usable area.
    pub fn max_right(&self) -> f64 {
        self.min_left + self.max_width
    }

    /// Bottom edge of the usable area.
    pub fn max_bottom(&self) -> f64 {
        self.min_top + self.max_height
    }

    /// Pull a window of `size` at `pos` back into the usable area.
    ///
    /// Oversized windows are pinned to the top-left edge; in every case at
    /// least `reach_x` by `reach_y` of the title bar stays inside.
    pub fn clamp(&self, pos: Point, size: Size, reach_x: f64, reach_y: f64) -> Point {
        let mut x = pos.x;
        let mut y = pos.y;
        if x + size.width > self.max_right() {
            x = self.max_right() - size.width;
        }
        if y + size.height > self.max_bottom() {
            y = self.max_bottom() - size.height;
        }
        if x < self.min_left {
            x = self.min_left;
        }
        if y < self.min_top {
            y = self.min_top;
        }
        if x > self.max_right() - reach_x {
            x = self.max_right() - reach_x;
        }
        if y > self.max_bottom() - reach_y {
            y = self.max_bottom() - reach_y;
        }
        Point { x, y }
    }
}

/// Why a recompute did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No monitor geometry was available.
    NoScreen,
    /// The window is minimized or maximized.
    NotNormal,
    /// Content has not been rendered yet.
    NotRendered,
    /// The measured size is zero or not finite.
    Degenerate,
}

/// Result of [`PlacementEngine::recompute_measures`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recompute {
    /// Nothing changed.
    Skipped(SkipReason),
    /// The window was committed at this frame.
    Placed(Rect),
}

/// Hooks for observing engine and watchdog activity.
///
/// All methods default to no-ops; implement only what you need.
pub trait PlacementObserver {
    /// Called after every recompute attempt.
    fn on_recompute(&self, _outcome: &Recompute) {}
    /// Called after every watchdog tick; `nudged` is false when skipped.
    fn on_redraw_tick(&self, _nudged: bool) {}
}

/// Computes and commits window size limits and position.
pub struct PlacementEngine {
    /// Window being placed.
    host: Rc<dyn WindowHost>,
    /// Monitor lookup.
    screens: Rc<dyn ScreenResolver>,
    /// Receiver of the screen advisory.
    publisher: Rc<dyn InfoPublisher>,
    /// Optional activity hook.
    observer: Option<Rc<dyn PlacementObserver>>,
    /// Tunables.
    cfg: PlacementCfg,
    /// Per-tab sizing memory.
    tabs: TabSizeMemory,
    /// Viewer per tab, once attached.
    viewers: Vec<Option<Rc<dyn Viewer>>>,
    /// Selected tab.
    active_tab: usize,
    /// Restored record, if it was valid.
    aspects: Option<WindowAspects>,
    /// Last-seen monitor bounds.
    context: ScreenContext,
    /// Cleared on the first committed placement.
    relocating: RelocationFlag,
    /// Limits of the last computation.
    last_bounds: Option<PlacementBounds>,
    /// The screen advisory goes out at most once.
    advisory_sent: bool,
}

impl PlacementEngine {
    /// Create an engine for a window with `tabs` tabs.
    pub fn new(
        host: Rc<dyn WindowHost>,
        screens: Rc<dyn ScreenResolver>,
        publisher: Rc<dyn InfoPublisher>,
        cfg: PlacementCfg,
        tabs: usize,
    ) -> Self {
        let tabs = TabSizeMemory::new(tabs);
        let viewers = vec![None; tabs.len()];
        Self {
            host,
            screens,
            publisher,
            observer: None,
            cfg,
            tabs,
            viewers,
            active_tab: 0,
            aspects: None,
            context: ScreenContext::new(),
            relocating: RelocationFlag::new(),
            last_bounds: None,
            advisory_sent: false,
        }
    }

    /// Use `context` instead of the engine's own screen context.
    #[must_use]
    pub fn with_context(mut self, context: ScreenContext) -> Self {
        self.context = context;
        self
    }

    /// Install an activity observer.
    pub fn set_observer(&mut self, observer: Rc<dyn PlacementObserver>) {
        self.observer = Some(observer);
    }

    /// Active configuration.
    pub fn cfg(&self) -> &PlacementCfg {
        &self.cfg
    }

    /// Handle to the "not yet placed" flag.
    pub fn relocation_flag(&self) -> RelocationFlag {
        self.relocating.clone()
    }

    /// True until the first successful placement.
    pub fn is_relocating(&self) -> bool {
        self.relocating.is_relocating()
    }

    /// Handle to the shared current-screen bounds.
    pub fn screen_context(&self) -> ScreenContext {
        self.context.clone()
    }

    /// Currently selected tab.
    pub fn active_tab(&self) -> usize {
        self.active_tab
    }

    /// Per-tab sizing memory.
    pub fn tab_memory(&self) -> &TabSizeMemory {
        &self.tabs
    }

    /// Valid record handed to [`PlacementEngine::apply_persisted_aspects`].
    pub fn aspects(&self) -> Option<&WindowAspects> {
        self.aspects.as_ref()
    }

    /// Limits used by the most recent computation.
    pub fn last_bounds(&self) -> Option<PlacementBounds> {
        self.last_bounds
    }

    /// Register the viewer hosted by `tab` once its content is loaded.
    pub fn attach_viewer(&mut self, tab: usize, viewer: Rc<dyn Viewer>) {
        let tab = self.tabs.clamp_index(tab);
        trace!(tab, "viewer_attach");
        self.viewers[tab] = Some(viewer);
    }

    /// Viewer of `tab`, if attached.
    fn viewer(&self, tab: usize) -> Option<&Rc<dyn Viewer>> {
        self.viewers.get(tab).and_then(Option::as_ref)
    }

    /// Geometry used for size limits: the virtual desktop or the current monitor.
    fn resolve_screen(&self) -> Option<ScreenGeometry> {
        let screen = if self.cfg.size_on_virtual_screen {
            Some(self.screens.virtual_desktop())
        } else {
            self.screens.current_screen(&*self.host)
        };
        screen.filter(ScreenGeometry::is_usable)
    }

    /// Restore size, position and tab from a saved record, before first show.
    ///
    /// The saved tab is always brought up. A record that fails
    /// [`WindowAspects::validate`] contributes nothing else and is treated as
    /// absent by later recomputes.
    pub fn apply_persisted_aspects(&mut self, aspects: Option<WindowAspects>) {
        self.aspects = None;
        let Some(a) = aspects else {
            debug!("apply_aspects_none");
            return;
        };
        self.active_tab = self.tabs.clamp_index(a.active_tab);
        self.host.select_tab(self.active_tab);
        if let Err(e) = a.validate() {
            warn!(error = %e, tab = self.active_tab, "apply_aspects_invalid");
            return;
        }
        self.aspects = Some(a);
        let frame = a.frame();
        debug!(frame = %frame, tab = self.active_tab, "apply_aspects");
        self.host.set_sizing(SizingMode::Manual);
        self.host.set_size(a.size());
        self.host.set_position(frame.origin());
    }

    /// Apply saved zoom and scroll once content is rendered.
    pub fn activate_restored_aspects(&mut self) {
        let Some(a) = self.aspects else {
            return;
        };
        if let Some(v) = self.viewer(self.active_tab) {
            v.set_scale(a.zoom);
            v.scroll_to_horizontal(a.scroll_left);
            v.scroll_to_vertical(a.scroll_top);
        }
        if !a.is_scrollbar_visible {
            self.force_recalculate();
        }
    }

    /// Switch to auto-fit permanently, then recompute.
    pub fn force_recalculate(&mut self) -> Recompute {
        self.host.set_sizing(SizingMode::Auto);
        self.recompute_measures()
    }

    /// Recompute limits and position for the current measurement.
    pub fn recompute_measures(&mut self) -> Recompute {
        let outcome = self.recompute_inner();
        trace!(?outcome, "recompute");
        if let Some(obs) = &self.observer {
            obs.on_recompute(&outcome);
        }
        outcome
    }

    /// Body of [`PlacementEngine::recompute_measures`].
    fn recompute_inner(&mut self) -> Recompute {
        let Some(screen) = self.resolve_screen() else {
            debug!("recompute_no_screen");
            return Recompute::Skipped(SkipReason::NoScreen);
        };
        let bounds = PlacementBounds::from_screen(&screen);
        self.last_bounds = Some(bounds);
        self.host
            .set_max_size(Size::new(bounds.max_width, bounds.max_height));
        let current = self.screens.current_screen(&*self.host);
        if let Some(cur) = current {
            self.context.update(cur.bounds);
        }

        if self.host.state() != WindowState::Normal {
            return Recompute::Skipped(SkipReason::NotNormal);
        }
        if !self.host.is_rendered() {
            return Recompute::Skipped(SkipReason::NotRendered);
        }
        let actual = self.host.actual_size();
        if !actual.is_positive() {
            return Recompute::Skipped(SkipReason::Degenerate);
        }

        let caption = self.host.caption_height();
        let effective = Size::new(actual.width, actual.height + caption);
        let tab = self.active_tab;
        let mut pos = self.host.position();
        if let (None, Some(a)) = (self.tabs.last_size(tab), self.aspects) {
            self.check_saved_screen(&a);
        }

        if self.host.sizing() == SizingMode::Auto {
            if let Some(last) = self.tabs.last_size(tab) {
                pos.x += (last.width - actual.width) / 2.0;
                pos.y += (last.height - actual.height) / 2.0;
            } else if let Some(a) = self.aspects {
                let wa = current.map_or(screen.working_area, |c| c.working_area);
                let (fx, fy) = resolution_factors(a.working_area, wa.size());
                let cx = pos.x + actual.width / 2.0;
                let cy = pos.y + effective.height / 2.0;
                pos.x = wa.x + (cx - wa.x) * fx - actual.width / 2.0;
                pos.y = wa.y + (cy - wa.y) * fy - effective.height / 2.0;
                pos.x += (a.width - actual.width) / 2.0;
                pos.y += (a.height - actual.height) / 2.0;
            }
        }

        let pos = bounds.clamp(
            pos,
            effective,
            self.cfg.reach_margin_x,
            self.cfg.reach_margin_y,
        );
        self.host.set_position(pos);
        let manual = self.host.sizing() == SizingMode::Manual;
        self.tabs.record(tab, manual, actual);
        self.relocating.set(false);
        let frame = Rect::from_parts(pos, effective);
        debug!(tab, manual, frame = %frame, "placement_commit");
        Recompute::Placed(frame)
    }

    /// Publish the advisory if the saved monitor is gone or not the current one.
    fn check_saved_screen(&mut self, a: &WindowAspects) {
        if self.advisory_sent {
            return;
        }
        let resolves = self.screens.screen_by_index(a.screen_index).is_ok();
        let current = self.screens.current_screen_index(&*self.host);
        if !resolves || current != Some(a.screen_index) {
            warn!(
                saved = a.screen_index,
                current = ?current,
                resolves,
                "saved_screen_unavailable"
            );
            self.publisher.publish(SCREEN_NOT_AVAILABLE);
            self.advisory_sent = true;
        }
    }

    /// Centre the window on its monitor, nudged up and left.
    pub fn move_to_start_position(&mut self) {
        let screen = self
            .screens
            .current_screen(&*self.host)
            .filter(ScreenGeometry::is_usable)
            .or_else(|| self.resolve_screen());
        let Some(screen) = screen else {
            debug!("start_position_no_screen");
            return;
        };
        let b = PlacementBounds::from_screen(&screen);
        let requested = self.host.requested_size();
        let size = if requested.is_positive() {
            requested
        } else {
            self.host.actual_size()
        };
        let w = size.width;
        let h = (size.height + self.host.caption_height()).min(b.max_height);
        let left = b.min_left + b.max_width / 2.0 - w / HUMAN_FEEL_GOOD_DIVISOR;
        let top = b.min_top + b.max_height / 2.0 - h / HUMAN_FEEL_GOOD_DIVISOR;
        let pos = Point {
            x: left.max(b.min_left),
            y: top.max(b.min_top),
        };
        debug!(x = pos.x, y = pos.y, "start_position");
        self.host.set_position(pos);
    }

    /// Snapshot of the current window for persistence.
    pub fn capture_current_aspects(&self) -> WindowAspects {
        let size = self.host.actual_size();
        let pos = self.host.position();
        let mut a = WindowAspects {
            width: size.width,
            height: size.height,
            center_x: pos.x + size.width / 2.0,
            center_y: pos.y + size.height / 2.0,
            active_tab: self.active_tab,
            screen_index: self
                .screens
                .current_screen_index(&*self.host)
                .unwrap_or(0),
            working_area: self
                .screens
                .current_screen(&*self.host)
                .map(|s| s.working_area.size()),
            ..WindowAspects::default()
        };
        if let Some(v) = self.viewer(self.active_tab) {
            a.scroll_left = v.horizontal_offset();
            a.scroll_top = v.vertical_offset();
            a.zoom = v.scale();
            a.is_scrollbar_visible = v.is_scrollbar_visible();
        }
        a
    }

    /// Switch tabs: carry zoom and scroll over, restore the tab's sizing, recompute.
    ///
    /// Reselecting the active tab only recomputes.
    pub fn select_tab(&mut self, tab: usize) -> Recompute {
        let tab = self.tabs.clamp_index(tab);
        let prev = self.active_tab;
        if tab == prev {
            return self.recompute_measures();
        }
        if let (Some(from), Some(to)) = (self.viewer(prev), self.viewer(tab)) {
            to.set_scale(from.scale());
            to.scroll_to_horizontal(from.horizontal_offset());
            to.scroll_to_vertical(from.vertical_offset());
        }
        if self.host.sizing() != SizingMode::Auto {
            self.tabs.record(prev, true, self.host.actual_size());
        } else {
            self.tabs.set_manual(prev, false);
        }
        self.active_tab = tab;
        debug!(from = prev, to = tab, "tab_switch");

        match (self.tabs.is_manual(tab), self.tabs.last_size(tab)) {
            (true, Some(last)) => {
                self.host.set_sizing(SizingMode::Manual);
                self.host.set_size(last);
            }
            (true, None) => self.host.set_sizing(SizingMode::Manual),
            (false, _) => self.host.set_sizing(SizingMode::Auto),
        }
        self.recompute_measures()
    }
}

/// Scale factors between the saved and the current working area.
fn resolution_factors(saved: Option<Size>, current: Size) -> (f64, f64) {
    match saved {
        Some(s) if s.is_positive() && current.is_positive() => {
            (current.width / s.width, current.height / s.height)
        }
        _ => (1.0, 1.0),
    }
}
