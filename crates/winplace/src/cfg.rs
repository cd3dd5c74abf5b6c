//! Placement configuration.
//!
//! All fields carry defaults, so an empty RON struct `()` is a valid config.

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default quiet period before a burst of size changes triggers a recompute.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;
/// Default period of the corrective redraw.
pub const DEFAULT_WATCHDOG_PERIOD_MS: u64 = 2000;
/// Shortened redraw period applied once after the window is activated.
pub const DEFAULT_WATCHDOG_ACTIVATION_MS: u64 = 500;
/// Horizontal sliver of the title bar that must stay on screen.
pub const DEFAULT_REACH_MARGIN_X: f64 = 50.0;
/// Vertical sliver of the title bar that must stay on screen.
pub const DEFAULT_REACH_MARGIN_Y: f64 = 35.0;
/// Windows narrower than this are not nudged by the redraw watchdog.
pub const DEFAULT_MIN_REDRAW_WIDTH: f64 = 2.0;

/// Tunables for the placement engine, debouncer and watchdog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementCfg {
    /// Debounce delay for size-changed bursts (ms).
    pub debounce_ms: u64,
    /// Regular redraw watchdog period (ms).
    pub watchdog_period_ms: u64,
    /// One-shot redraw period after window activation (ms).
    pub watchdog_activation_ms: u64,
    /// Treat all monitors as one surface when computing size limits.
    pub size_on_virtual_screen: bool,
    /// Minimum horizontal title-bar reach (logical units).
    pub reach_margin_x: f64,
    /// Minimum vertical title-bar reach (logical units).
    pub reach_margin_y: f64,
    /// Minimum width for the redraw nudge to run.
    pub min_redraw_width: f64,
}

impl Default for PlacementCfg {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            watchdog_period_ms: DEFAULT_WATCHDOG_PERIOD_MS,
            watchdog_activation_ms: DEFAULT_WATCHDOG_ACTIVATION_MS,
            size_on_virtual_screen: true,
            reach_margin_x: DEFAULT_REACH_MARGIN_X,
            reach_margin_y: DEFAULT_REACH_MARGIN_Y,
            min_redraw_width: DEFAULT_MIN_REDRAW_WIDTH,
        }
    }
}

impl PlacementCfg {
    /// Parse a configuration from RON text and validate it.
    pub fn from_ron(text: &str) -> Result<Self> {
        let cfg: Self = ron::from_str(text)?;
        cfg.validated()
    }

    /// Load a configuration from a RON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_ron(&text)
    }

    /// Debounce delay as a duration (never zero).
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.max(1))
    }

    /// Regular watchdog period as a duration (never zero).
    pub fn watchdog_period(&self) -> Duration {
        Duration::from_millis(self.watchdog_period_ms.max(1))
    }

    /// Post-activation watchdog period as a duration (never zero).
    pub fn watchdog_activation(&self) -> Duration {
        Duration::from_millis(self.watchdog_activation_ms.max(1))
    }

    /// Reject negative or non-finite margins.
    fn validated(self) -> Result<Self> {
        for (name, v) in [
            ("reach_margin_x", self.reach_margin_x),
            ("reach_margin_y", self.reach_margin_y),
            ("min_redraw_width", self.min_redraw_width),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::Config(format!("{name} must be a non-negative number")));
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_struct_yields_defaults() {
        let cfg = PlacementCfg::from_ron("()").expect("parse");
        assert_eq!(cfg, PlacementCfg::default());
        assert_eq!(cfg.debounce(), Duration::from_millis(100));
        assert!(cfg.size_on_virtual_screen);
    }

    #[test]
    fn partial_override() {
        let cfg = PlacementCfg::from_ron("(debounce_ms: 250, size_on_virtual_screen: false)")
            .expect("parse");
        assert_eq!(cfg.debounce_ms, 250);
        assert!(!cfg.size_on_virtual_screen);
        assert_eq!(cfg.watchdog_period_ms, DEFAULT_WATCHDOG_PERIOD_MS);
    }

    #[test]
    fn zero_periods_are_clamped() {
        let cfg = PlacementCfg::from_ron("(debounce_ms: 0, watchdog_period_ms: 0)").expect("parse");
        assert_eq!(cfg.debounce(), Duration::from_millis(1));
        assert_eq!(cfg.watchdog_period(), Duration::from_millis(1));
    }

    #[test]
    fn negative_margin_rejected() {
        let err = PlacementCfg::from_ron("(reach_margin_x: -5.0)").unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }

    #[test]
    fn garbage_is_parse_error() {
        let err = PlacementCfg::from_ron("(debounce_ms: \"soon\")").unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "{err}");
    }
}
