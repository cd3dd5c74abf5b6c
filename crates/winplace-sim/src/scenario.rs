//! Scenario files: a monitor layout, a window and a step script.

use std::{fs, path::Path};

use serde::Deserialize;
use winplace::{Monitor, PlacementCfg, Point, Size, WindowAspects};

use crate::error::{Error, Result};

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum Step {
    /// Finish the first content render.
    Render,
    /// Let virtual time pass (milliseconds).
    Wait(u64),
    /// Change the content size of a tab: `Content(tab, width, height)`.
    Content(usize, f64, f64),
    /// Drag the window border to a new size.
    UserResize(f64, f64),
    /// Drag the window to a new top-left corner.
    Move(f64, f64),
    /// Select a tab.
    SelectTab(usize),
    /// Bring the window to the foreground.
    Activate,
    /// Minimize the window.
    Minimize,
    /// Single-instance hand-off: restore and activate.
    ShowMe,
    /// Disconnect a monitor by ordinal.
    Unplug(usize),
    /// Connect another monitor.
    Plug(Monitor),
    /// Centre the window on its monitor.
    StartPosition,
    /// Switch to auto-fit and recompute.
    ForceRecalculate,
    /// Capture and hand the aspects to the layout sink.
    Save,
}

/// A complete scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Attached monitors, in ordinal order.
    pub monitors: Vec<Monitor>,
    /// Content size per tab.
    pub tabs: Vec<Size>,
    /// Title bar height.
    #[serde(default = "default_caption")]
    pub caption: f64,
    /// Initial top-left corner.
    #[serde(default)]
    pub position: Option<Point>,
    /// Aspects restored before the window is shown.
    #[serde(default)]
    pub aspects: Option<WindowAspects>,
    /// Placement configuration.
    #[serde(default)]
    pub cfg: PlacementCfg,
    /// Step script.
    pub steps: Vec<Step>,
}

/// Caption height used when the scenario names none.
fn default_caption() -> f64 {
    30.0
}

impl Scenario {
    /// Parse and validate a scenario from RON text.
    pub fn from_ron(text: &str) -> Result<Self> {
        let scenario: Self = ron::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Reject scenarios that cannot run.
    fn validate(&self) -> Result<()> {
        if self.tabs.is_empty() {
            return Err(Error::scenario("at least one tab is required"));
        }
        if let Some(i) = self.tabs.iter().position(|s| !s.is_positive()) {
            return Err(Error::scenario(format!("tab {i} has a non-positive content size")));
        }
        if !(self.caption.is_finite() && self.caption >= 0.0) {
            return Err(Error::scenario("caption must be a non-negative number"));
        }
        for step in &self.steps {
            match step {
                Step::SelectTab(t) | Step::Content(t, _, _) if *t >= self.tabs.len() => {
                    return Err(Error::scenario(format!(
                        "step {step:?} names tab {t}, scenario has {}",
                        self.tabs.len()
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUAL: &str = include_str!("../scenarios/dual_monitor.ron");

    #[test]
    fn bundled_scenario_parses() {
        let s = Scenario::from_ron(DUAL).expect("parse");
        assert_eq!(s.monitors.len(), 2);
        assert_eq!(s.tabs.len(), 2);
        assert!(s.aspects.is_some());
        assert!(s.steps.contains(&Step::Render));
    }

    #[test]
    fn minimal_scenario_uses_defaults() {
        let s = Scenario::from_ron(
            "(monitors: [(bounds: (x: 0.0, y: 0.0, w: 1920.0, h: 1080.0))], \
              tabs: [(width: 640.0, height: 480.0)], steps: [Render, Wait(200)])",
        )
        .expect("parse");
        assert_eq!(s.caption, 30.0);
        assert_eq!(s.cfg, PlacementCfg::default());
        assert_eq!(s.steps, vec![Step::Render, Step::Wait(200)]);
    }

    #[test]
    fn unknown_tab_is_rejected() {
        let err = Scenario::from_ron(
            "(monitors: [], tabs: [(width: 640.0, height: 480.0)], steps: [SelectTab(3)])",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Scenario(_)), "{err}");
    }
}
