//! In-memory window and viewer used by tests and the simulator.
//!
//! `SimWindow` behaves like a toolkit window that can size itself to its
//! content: in auto mode the measured size follows the active tab's content,
//! in manual mode it follows the requested size. Both are capped by the
//! maximum size, which covers the caption. Size and location changes are
//! emitted synchronously, like a real layout pass would.

use std::{
    cell::{Cell, RefCell},
    fmt, mem,
};

use tracing::trace;

use crate::{
    events::{WindowEvent, WindowEvents},
    geom::{Point, Size},
    host::{SizingMode, Viewer, WindowHost, WindowState},
};

/// Mutable window state.
#[derive(Debug)]
struct SimState {
    /// Top-left corner.
    position: Point,
    /// Size requested in manual mode.
    requested: Size,
    /// Size measured by the last layout.
    actual: Size,
    /// Sizing mode.
    sizing: SizingMode,
    /// Visibility state.
    state: WindowState,
    /// Title bar height.
    caption: f64,
    /// Size cap set by the engine.
    max: Size,
    /// Set by `render`.
    rendered: bool,
    /// Content size per tab.
    contents: Vec<Size>,
    /// Shown tab.
    tab: usize,
    /// Layout passes run.
    layouts: u64,
    /// Activations so far.
    activations: u64,
}

impl SimState {
    /// Size a layout pass would produce.
    fn measure(&self) -> Size {
        let want = match self.sizing {
            SizingMode::Auto => self.contents.get(self.tab).copied().unwrap_or_default(),
            SizingMode::Manual => self.requested,
        };
        Size::new(
            want.width.min(self.max.width),
            want.height.min(self.max.height - self.caption).max(0.0),
        )
    }
}

/// Simulated top-level window.
pub struct SimWindow {
    /// Window state.
    state: RefCell<SimState>,
    /// Notification hub.
    events: WindowEvents,
}

impl fmt::Debug for SimWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimWindow")
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl SimWindow {
    /// Window at the origin, auto-sized to the first entry of `contents`
    /// (one content size per tab).
    pub fn new(contents: Vec<Size>, caption: f64) -> Self {
        let contents = if contents.is_empty() {
            vec![Size::default()]
        } else {
            contents
        };
        let first = contents[0];
        Self {
            state: RefCell::new(SimState {
                position: Point::default(),
                requested: first,
                actual: first,
                sizing: SizingMode::Auto,
                state: WindowState::Normal,
                caption,
                max: Size::new(f64::INFINITY, f64::INFINITY),
                rendered: false,
                contents,
                tab: 0,
                layouts: 0,
                activations: 0,
            }),
            events: WindowEvents::new(),
        }
    }

    /// Re-measure and emit `SizeChanged` if the size moved.
    fn relayout(&self) {
        let changed = {
            let mut s = self.state.borrow_mut();
            let measured = s.measure();
            if measured == s.actual {
                None
            } else {
                s.actual = measured;
                Some(measured)
            }
        };
        if let Some(size) = changed {
            trace!(%size, "sim_size_changed");
            self.events.emit(&WindowEvent::SizeChanged(size));
        }
    }

    /// Finish the first content render.
    pub fn render(&self) {
        let first = {
            let mut s = self.state.borrow_mut();
            !mem::replace(&mut s.rendered, true)
        };
        if first {
            self.events.emit(&WindowEvent::ContentRendered);
        }
    }

    /// Show the content of `tab`.
    pub fn show_tab(&self, tab: usize) {
        {
            let mut s = self.state.borrow_mut();
            s.tab = tab.min(s.contents.len() - 1);
        }
        self.relayout();
    }

    /// Change the content size of `tab`.
    pub fn set_content(&self, tab: usize, size: Size) {
        {
            let mut s = self.state.borrow_mut();
            if tab >= s.contents.len() {
                s.contents.resize(tab + 1, Size::default());
            }
            s.contents[tab] = size;
        }
        self.relayout();
    }

    /// Resize by dragging the border: switches to manual sizing.
    pub fn user_resize(&self, size: Size) {
        {
            let mut s = self.state.borrow_mut();
            s.sizing = SizingMode::Manual;
            s.requested = size;
        }
        self.relayout();
    }

    /// Close the window.
    pub fn close(&self) {
        self.events.emit(&WindowEvent::Closed);
    }

    /// Layout passes run so far.
    pub fn layout_passes(&self) -> u64 {
        self.state.borrow().layouts
    }

    /// Activations so far.
    pub fn activations(&self) -> u64 {
        self.state.borrow().activations
    }

    /// Current maximum size.
    pub fn max_size(&self) -> Size {
        self.state.borrow().max
    }
}

impl WindowHost for SimWindow {
    fn position(&self) -> Point {
        self.state.borrow().position
    }

    fn set_position(&self, position: Point) {
        let moved = {
            let mut s = self.state.borrow_mut();
            mem::replace(&mut s.position, position) != position
        };
        if moved {
            self.events.emit(&WindowEvent::LocationChanged);
        }
    }

    fn requested_size(&self) -> Size {
        self.state.borrow().requested
    }

    fn set_size(&self, size: Size) {
        self.state.borrow_mut().requested = size;
        self.relayout();
    }

    fn set_width(&self, width: f64) {
        {
            let mut s = self.state.borrow_mut();
            if s.sizing == SizingMode::Auto {
                s.requested.height = s.actual.height;
            }
            s.requested.width = width;
        }
        self.relayout();
    }

    fn actual_size(&self) -> Size {
        self.state.borrow().actual
    }

    fn sizing(&self) -> SizingMode {
        self.state.borrow().sizing
    }

    fn set_sizing(&self, mode: SizingMode) {
        self.state.borrow_mut().sizing = mode;
        self.relayout();
    }

    fn state(&self) -> WindowState {
        self.state.borrow().state
    }

    fn set_state(&self, state: WindowState) {
        self.state.borrow_mut().state = state;
    }

    fn activate(&self) {
        self.state.borrow_mut().activations += 1;
        self.events.emit(&WindowEvent::Activated);
    }

    fn caption_height(&self) -> f64 {
        self.state.borrow().caption
    }

    fn set_max_size(&self, size: Size) {
        self.state.borrow_mut().max = size;
        self.relayout();
    }

    fn update_layout(&self) {
        self.state.borrow_mut().layouts += 1;
        self.relayout();
    }

    fn select_tab(&self, tab: usize) {
        self.show_tab(tab);
    }

    fn is_rendered(&self) -> bool {
        self.state.borrow().rendered
    }

    fn events(&self) -> &WindowEvents {
        &self.events
    }
}

/// Simulated zoom/scroll viewer.
#[derive(Debug)]
pub struct SimViewer {
    /// Zoom factor.
    scale: Cell<f64>,
    /// Horizontal offset.
    horizontal: Cell<f64>,
    /// Vertical offset.
    vertical: Cell<f64>,
    /// Scrollbar visibility.
    scrollbars: Cell<bool>,
}

impl Default for SimViewer {
    fn default() -> Self {
        Self {
            scale: Cell::new(1.0),
            horizontal: Cell::new(0.0),
            vertical: Cell::new(0.0),
            scrollbars: Cell::new(false),
        }
    }
}

impl SimViewer {
    /// Viewer at scale 1 with no scrollbars.
    pub fn new() -> Self {
        Self::default()
    }

    /// Show or hide the scrollbars.
    pub fn set_scrollbar_visible(&self, visible: bool) {
        self.scrollbars.set(visible);
    }
}

impl Viewer for SimViewer {
    fn scale(&self) -> f64 {
        self.scale.get()
    }

    fn set_scale(&self, scale: f64) {
        self.scale.set(scale);
    }

    fn horizontal_offset(&self) -> f64 {
        self.horizontal.get()
    }

    fn vertical_offset(&self) -> f64 {
        self.vertical.get()
    }

    fn scroll_to_horizontal(&self, offset: f64) {
        self.horizontal.set(offset.max(0.0));
    }

    fn scroll_to_vertical(&self, offset: f64) {
        self.vertical.set(offset.max(0.0));
    }

    fn is_scrollbar_visible(&self) -> bool {
        self.scrollbars.get()
    }
}
