//! Collaborator traits for the window surface and the per-tab viewers.
//!
//! Both traits take `&self`: adapters live on the single UI thread and keep
//! their mutable state behind interior mutability, so the engine can hold
//! them as `Rc<dyn ...>` next to event handlers that also reference them.

use crate::{
    events::WindowEvents,
    geom::{Point, Rect, Size},
};

/// How the window derives its size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizingMode {
    /// The window fits itself to its content.
    #[default]
    Auto,
    /// The window keeps the size set explicitly.
    Manual,
}

/// Visibility state of the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowState {
    /// Shown at its own size and position.
    #[default]
    Normal,
    /// Iconified.
    Minimized,
    /// Filling its monitor.
    Maximized,
}

/// The toolkit window the engine positions and sizes.
pub trait WindowHost {
    /// Current top-left corner.
    fn position(&self) -> Point;
    /// Move the window.
    fn set_position(&self, position: Point);

    /// Requested size (may differ from the measured one in auto-fit mode).
    fn requested_size(&self) -> Size;
    /// Request a size.
    fn set_size(&self, size: Size);
    /// Request only a width, keeping the requested height.
    fn set_width(&self, width: f64);
    /// Size measured by the last layout pass, excluding the caption.
    fn actual_size(&self) -> Size;

    /// Current sizing mode.
    fn sizing(&self) -> SizingMode;
    /// Switch the sizing mode.
    fn set_sizing(&self, mode: SizingMode);

    /// Current visibility state.
    fn state(&self) -> WindowState;
    /// Change the visibility state.
    fn set_state(&self, state: WindowState);
    /// Bring the window to the foreground.
    fn activate(&self);

    /// Height of the title bar.
    fn caption_height(&self) -> f64;
    /// Upper bound for the window size.
    fn set_max_size(&self, size: Size);
    /// Run a synchronous layout pass.
    fn update_layout(&self);

    /// Bring up the content of `tab`, as if the user had picked it.
    fn select_tab(&self, tab: usize);

    /// True once the first full content render completed.
    fn is_rendered(&self) -> bool;

    /// Notification hub the host emits into.
    fn events(&self) -> &WindowEvents;

    /// Outer frame in screen coordinates, caption included.
    fn frame(&self) -> Rect {
        let size = self.actual_size();
        Rect::from_parts(
            self.position(),
            Size::new(size.width, size.height + self.caption_height()),
        )
    }
}

/// Zoomable, scrollable content viewer hosted by one tab.
pub trait Viewer {
    /// Current scale factor.
    fn scale(&self) -> f64;
    /// Set the scale factor.
    fn set_scale(&self, scale: f64);
    /// Horizontal scroll offset.
    fn horizontal_offset(&self) -> f64;
    /// Vertical scroll offset.
    fn vertical_offset(&self) -> f64;
    /// Scroll horizontally to `offset`.
    fn scroll_to_horizontal(&self, offset: f64);
    /// Scroll vertically to `offset`.
    fn scroll_to_vertical(&self, offset: f64);
    /// True when either scrollbar is currently shown.
    fn is_scrollbar_visible(&self) -> bool;
}
