//! Persisted window aspects.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    geom::{Rect, Size},
};

/// Persisted window state: size, center, viewer zoom/scroll and tab selection.
///
/// `screen_index` is advisory only; the monitor it names may have been
/// unplugged since the record was written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowAspects {
    /// Content width in logical units.
    pub width: f64,
    /// Content height in logical units.
    pub height: f64,
    /// Window center (x) in screen coordinates at save time.
    pub center_x: f64,
    /// Window center (y) in screen coordinates at save time.
    pub center_y: f64,
    /// Horizontal scroll offset of the active viewer.
    pub scroll_left: f64,
    /// Vertical scroll offset of the active viewer.
    pub scroll_top: f64,
    /// Scale factor of the active viewer.
    pub zoom: f64,
    /// True when the active viewer showed at least one scrollbar.
    pub is_scrollbar_visible: bool,
    /// Selected tab.
    pub active_tab: usize,
    /// Ordinal of the monitor the window was on.
    pub screen_index: usize,
    /// Working area size of that monitor, used to rescale on a different resolution.
    #[serde(default)]
    pub working_area: Option<Size>,
}

impl Default for WindowAspects {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            center_x: 0.0,
            center_y: 0.0,
            scroll_left: 0.0,
            scroll_top: 0.0,
            zoom: 1.0,
            is_scrollbar_visible: false,
            active_tab: 0,
            screen_index: 0,
            working_area: None,
        }
    }
}

impl WindowAspects {
    /// Size recorded in the aspects.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// True when the record carries a usable window size.
    pub fn has_size(&self) -> bool {
        self.size().is_positive()
    }

    /// Window frame implied by the stored center and size.
    pub fn frame(&self) -> Rect {
        Rect::new(
            self.center_x - self.width / 2.0,
            self.center_y - self.height / 2.0,
            self.width,
            self.height,
        )
    }

    /// Check the `width > 0, height > 0, zoom > 0` invariant.
    pub fn validate(&self) -> Result<()> {
        if !self.has_size() {
            return Err(Error::InvalidAspects(format!(
                "size must be positive, got {}",
                self.size()
            )));
        }
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(Error::InvalidAspects(format!(
                "zoom must be positive, got {}",
                self.zoom
            )));
        }
        if !(self.center_x.is_finite() && self.center_y.is_finite()) {
            return Err(Error::InvalidAspects("center must be finite".into()));
        }
        Ok(())
    }
}
