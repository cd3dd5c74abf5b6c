//! Per-tab sizing memory.
//!
//! Each tab remembers whether the user sized it by hand and the last size
//! measured while it was active. A tab with no measurement yet reports `None`
//! from [`TabSizeMemory::last_size`].

use crate::geom::Size;

/// Sizing record for one tab.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TabSizeRecord {
    /// The tab was left in manual sizing mode.
    pub is_manual_size: bool,
    /// Last measured width (0 when never measured).
    pub last_width: f64,
    /// Last measured height (0 when never measured).
    pub last_height: f64,
}

impl TabSizeRecord {
    /// Recorded size, if any.
    fn last_size(&self) -> Option<Size> {
        (self.last_width + self.last_height > 0.0)
            .then(|| Size::new(self.last_width, self.last_height))
    }
}

/// Fixed-size table of [`TabSizeRecord`]s, one per tab.
#[derive(Debug, Clone)]
pub struct TabSizeMemory {
    /// One record per tab.
    records: Vec<TabSizeRecord>,
}

impl TabSizeMemory {
    /// Create a table for `tabs` tabs (at least one).
    pub fn new(tabs: usize) -> Self {
        Self {
            records: vec![TabSizeRecord::default(); tabs.max(1)],
        }
    }

    /// Number of tabs tracked.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false; the table holds at least one tab.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Clamp an arbitrary index into the valid tab range.
    pub fn clamp_index(&self, tab: usize) -> usize {
        tab.min(self.records.len() - 1)
    }

    /// Record for `tab` (clamped).
    pub fn get(&self, tab: usize) -> TabSizeRecord {
        self.records[self.clamp_index(tab)]
    }

    /// Last measured size for `tab`, if it was ever measured.
    pub fn last_size(&self, tab: usize) -> Option<Size> {
        self.get(tab).last_size()
    }

    /// Manual-size flag for `tab`.
    pub fn is_manual(&self, tab: usize) -> bool {
        self.get(tab).is_manual_size
    }

    /// Store a fresh measurement for `tab`.
    pub fn record(&mut self, tab: usize, manual: bool, size: Size) {
        let i = self.clamp_index(tab);
        self.records[i] = TabSizeRecord {
            is_manual_size: manual,
            last_width: size.width,
            last_height: size.height,
        };
    }

    /// Update only the manual flag for `tab`.
    pub fn set_manual(&mut self, tab: usize, manual: bool) {
        let i = self.clamp_index(tab);
        self.records[i].is_manual_size = manual;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tabs_have_no_measurement() {
        let m = TabSizeMemory::new(2);
        assert_eq!(m.len(), 2);
        assert_eq!(m.last_size(0), None);
        assert!(!m.is_manual(1));
    }

    #[test]
    fn record_and_clamp() {
        let mut m = TabSizeMemory::new(2);
        m.record(1, true, Size::new(640.0, 480.0));
        assert_eq!(m.last_size(1), Some(Size::new(640.0, 480.0)));
        assert!(m.is_manual(1));
        // Out-of-range indices land on the last tab.
        assert_eq!(m.last_size(7), Some(Size::new(640.0, 480.0)));
        m.set_manual(9, false);
        assert!(!m.is_manual(1));
        assert_eq!(m.last_size(1), Some(Size::new(640.0, 480.0)));
    }

    #[test]
    fn zero_tabs_still_allocates_one() {
        let m = TabSizeMemory::new(0);
        assert_eq!(m.len(), 1);
        assert_eq!(m.clamp_index(3), 0);
    }
}
