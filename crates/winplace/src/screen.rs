//! Monitor geometry lookup.
//!
//! [`ScreenResolver`] is the seam to the platform's display enumeration.
//! [`DisplayLayout`] is the in-repo adapter: a hot-pluggable monitor list
//! guarded by a lock so a display watcher can replace it while the UI thread
//! queries it.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    Error, Result,
    geom::{Point, Rect},
    host::WindowHost,
};

/// Bounds and usable area of one monitor (or of the virtual desktop).
///
/// Coordinates may be negative for monitors left of or above the primary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    /// Full monitor rectangle.
    pub bounds: Rect,
    /// Bounds minus task bars and docks.
    pub working_area: Rect,
}

impl ScreenGeometry {
    /// True when the working area can hold a window.
    pub fn is_usable(&self) -> bool {
        self.working_area.size().is_positive()
    }
}

/// Answers "which monitor is this window on" and related queries.
pub trait ScreenResolver {
    /// Monitor currently holding the window, if any monitor is attached.
    fn current_screen(&self, window: &dyn WindowHost) -> Option<ScreenGeometry>;
    /// Monitor by ordinal; fails when the monitor is gone.
    fn screen_by_index(&self, index: usize) -> Result<ScreenGeometry>;
    /// Union of all monitors.
    fn virtual_desktop(&self) -> ScreenGeometry;
    /// Ordinal of the monitor currently holding the window.
    fn current_screen_index(&self, window: &dyn WindowHost) -> Option<usize>;
}

/// One attached monitor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Monitor {
    /// Primary display flag.
    #[serde(default)]
    pub primary: bool,
    /// Full monitor rectangle.
    pub bounds: Rect,
    /// Usable area; defaults to `bounds` when omitted.
    #[serde(default)]
    pub working_area: Option<Rect>,
}

impl Monitor {
    /// Monitor whose working area equals its bounds.
    pub fn new(bounds: Rect) -> Self {
        Self {
            primary: false,
            bounds,
            working_area: None,
        }
    }

    /// Set the usable area.
    #[must_use]
    pub fn with_working_area(mut self, area: Rect) -> Self {
        self.working_area = Some(area);
        self
    }

    /// Mark as the primary display.
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Geometry as seen by the engine.
    pub fn geometry(&self) -> ScreenGeometry {
        ScreenGeometry {
            bounds: self.bounds,
            working_area: self.working_area.unwrap_or(self.bounds),
        }
    }
}

/// Shared, mutable monitor list implementing [`ScreenResolver`].
///
/// Cloning yields another handle to the same list.
#[derive(Debug, Clone, Default)]
pub struct DisplayLayout {
    /// Monitors in ordinal order.
    monitors: Arc<RwLock<Vec<Monitor>>>,
}

impl DisplayLayout {
    /// Create a layout from an ordered monitor list.
    pub fn new(monitors: Vec<Monitor>) -> Self {
        Self {
            monitors: Arc::new(RwLock::new(monitors)),
        }
    }

    /// Snapshot of the attached monitors.
    pub fn monitors(&self) -> Vec<Monitor> {
        self.monitors.read().clone()
    }

    /// Number of attached monitors.
    pub fn len(&self) -> usize {
        self.monitors.read().len()
    }

    /// True when no monitor is attached.
    pub fn is_empty(&self) -> bool {
        self.monitors.read().is_empty()
    }

    /// Attach a monitor at the end of the list.
    pub fn plug(&self, monitor: Monitor) {
        debug!(bounds = %monitor.bounds, "display_plug");
        self.monitors.write().push(monitor);
    }

    /// Detach the monitor at `index`; later ordinals shift down.
    pub fn unplug(&self, index: usize) -> Result<Monitor> {
        let mut guard = self.monitors.write();
        if index >= guard.len() {
            return Err(Error::ScreenNotFound { index });
        }
        let removed = guard.remove(index);
        debug!(index, bounds = %removed.bounds, "display_unplug");
        Ok(removed)
    }

    /// Replace the whole list (e.g. after a display reconfiguration).
    pub fn replace(&self, monitors: Vec<Monitor>) {
        *self.monitors.write() = monitors;
    }

    /// Monitor with the largest overlap, else nearest to the frame centre, else primary.
    fn index_for_frame(monitors: &[Monitor], frame: &Rect) -> Option<usize> {
        if monitors.is_empty() {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for (i, m) in monitors.iter().enumerate() {
            let area = m.bounds.overlap_area(frame);
            if area > 0.0 && best.is_none_or(|(_, a)| area > a) {
                best = Some((i, area));
            }
        }
        if let Some((i, _)) = best {
            return Some(i);
        }
        // Off every monitor: pick the nearest one, then the primary.
        let center = frame.center();
        let nearest = Self::nearest(monitors, center);
        nearest.or_else(|| monitors.iter().position(|m| m.primary).or(Some(0)))
    }

    /// Monitor whose bounds are closest to `p`.
    fn nearest(monitors: &[Monitor], p: Point) -> Option<usize> {
        monitors
            .iter()
            .enumerate()
            .filter(|(_, m)| p.x.is_finite() && p.y.is_finite() && m.bounds.w > 0.0)
            .map(|(i, m)| (i, m.bounds.distance_sq_to(p)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

impl ScreenResolver for DisplayLayout {
    fn current_screen(&self, window: &dyn WindowHost) -> Option<ScreenGeometry> {
        let guard = self.monitors.read();
        let i = Self::index_for_frame(&guard, &window.frame())?;
        guard.get(i).map(Monitor::geometry)
    }

    fn screen_by_index(&self, index: usize) -> Result<ScreenGeometry> {
        self.monitors
            .read()
            .get(index)
            .map(Monitor::geometry)
            .ok_or(Error::ScreenNotFound { index })
    }

    fn virtual_desktop(&self) -> ScreenGeometry {
        let guard = self.monitors.read();
        let mut iter = guard.iter().map(Monitor::geometry);
        let Some(first) = iter.next() else {
            warn!("virtual_desktop_without_monitors");
            return ScreenGeometry::default();
        };
        iter.fold(first, |acc, g| ScreenGeometry {
            bounds: acc.bounds.union(&g.bounds),
            working_area: acc.working_area.union(&g.working_area),
        })
    }

    fn current_screen_index(&self, window: &dyn WindowHost) -> Option<usize> {
        Self::index_for_frame(&self.monitors.read(), &window.frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dual() -> DisplayLayout {
        DisplayLayout::new(vec![
            Monitor::new(Rect::new(0.0, 0.0, 1920.0, 1080.0))
                .with_working_area(Rect::new(0.0, 0.0, 1920.0, 1040.0))
                .primary(),
            Monitor::new(Rect::new(-1280.0, 0.0, 1280.0, 1024.0)),
        ])
    }

    #[test]
    fn frame_picks_largest_overlap() {
        let layout = dual();
        let m = layout.monitors();
        // Mostly on the left monitor.
        let frame = Rect::new(-900.0, 100.0, 1000.0, 400.0);
        assert_eq!(DisplayLayout::index_for_frame(&m, &frame), Some(1));
        let frame = Rect::new(-100.0, 100.0, 1000.0, 400.0);
        assert_eq!(DisplayLayout::index_for_frame(&m, &frame), Some(0));
    }

    #[test]
    fn off_screen_frame_falls_back_to_nearest() {
        let m = dual().monitors();
        let frame = Rect::new(2500.0, 200.0, 100.0, 100.0);
        assert_eq!(DisplayLayout::index_for_frame(&m, &frame), Some(0));
        let frame = Rect::new(-3000.0, 200.0, 100.0, 100.0);
        assert_eq!(DisplayLayout::index_for_frame(&m, &frame), Some(1));
    }

    #[test]
    fn virtual_desktop_is_union_with_negative_origin() {
        let vd = dual().virtual_desktop();
        assert_eq!(vd.bounds, Rect::new(-1280.0, 0.0, 3200.0, 1080.0));
        assert_eq!(vd.working_area, Rect::new(-1280.0, 0.0, 3200.0, 1040.0));
    }

    #[test]
    fn unplugged_index_is_not_found() {
        let layout = dual();
        assert!(layout.screen_by_index(1).is_ok());
        layout.unplug(1).expect("unplug");
        assert!(matches!(
            layout.screen_by_index(1),
            Err(Error::ScreenNotFound { index: 1 })
        ));
        assert!(layout.unplug(5).is_err());
    }

    #[test]
    fn empty_layout_yields_unusable_desktop() {
        let layout = DisplayLayout::default();
        assert!(!layout.virtual_desktop().is_usable());
        assert!(layout.is_empty());
    }
}
