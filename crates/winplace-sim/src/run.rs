//! Implementation for the `run` and `check` subcommands.

use std::{cell::Cell, rc::Rc, time::Duration};

use humantime::format_duration;
use ron::ser::{self, PrettyConfig};
use serde::Serialize;
use tokio::{runtime::Builder, sync::mpsc};
use tracing::{debug, info};
use winplace::{
    AspectsStore, ChannelPublisher, Dispatcher, DisplayLayout, PlacementCfg, PlacementObserver,
    Point, Recompute, Rect, Size, Viewer, WindowAspects, WindowController, WindowHost,
    WindowState,
    sim::{SimViewer, SimWindow},
};

use crate::{
    cli::{CheckArgs, RunArgs},
    error::Result,
    scenario::{Scenario, Step},
};

/// Counts engine and watchdog activity during a run.
#[derive(Debug, Default)]
struct Tally {
    /// Recompute attempts.
    recomputes: Cell<u32>,
    /// Committed placements.
    placed: Cell<u32>,
    /// Watchdog ticks.
    ticks: Cell<u32>,
    /// Ticks that nudged.
    nudges: Cell<u32>,
}

impl PlacementObserver for Tally {
    fn on_recompute(&self, outcome: &Recompute) {
        self.recomputes.set(self.recomputes.get() + 1);
        match outcome {
            Recompute::Placed(frame) => {
                self.placed.set(self.placed.get() + 1);
                debug!(%frame, "placed");
            }
            Recompute::Skipped(reason) => debug!(?reason, "recompute_skipped"),
        }
    }

    fn on_redraw_tick(&self, nudged: bool) {
        self.ticks.set(self.ticks.get() + 1);
        if nudged {
            self.nudges.set(self.nudges.get() + 1);
        }
    }
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Outer window frame after the run.
    pub frame: Rect,
    /// Sizing mode after the run, `Auto` or `Manual`.
    pub sizing: String,
    /// Window state after the run.
    pub state: String,
    /// True while the window never received a successful placement.
    pub relocating: bool,
    /// Messages published to the user.
    pub notices: Vec<String>,
    /// Recompute attempts.
    pub recomputes: u32,
    /// Recomputes that committed a position.
    pub placed: u32,
    /// Redraw watchdog ticks.
    pub redraw_ticks: u32,
    /// Ticks that actually nudged the window.
    pub redraw_nudges: u32,
    /// Aspects captured at the end of the run.
    pub aspects: WindowAspects,
}

/// Run the scenario named by `args` and print the report.
pub fn run(args: &RunArgs) -> Result<()> {
    let mut scenario = Scenario::load(&args.scenario)?;
    if let Some(path) = &args.config {
        scenario.cfg = PlacementCfg::load(path)?;
    }
    if let Some(path) = &args.aspects {
        scenario.aspects = AspectsStore::new(path).load()?;
    }
    let store = args.save.as_ref().map(|p| Rc::new(AspectsStore::new(p)));

    let runtime = Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()?;
    let report = runtime.block_on(execute(&scenario, store.clone(), args.settle))?;
    if let Some(store) = &store {
        store.save(&report.aspects)?;
        info!(path = %store.path().display(), "aspects_written");
    }

    let text = ser::to_string_pretty(&report, PrettyConfig::default())?;
    println!("{text}");
    Ok(())
}

/// Parse and validate a scenario without running it.
pub fn check(args: &CheckArgs) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    println!(
        "ok: {} monitor(s), {} tab(s), {} step(s)",
        scenario.monitors.len(),
        scenario.tabs.len(),
        scenario.steps.len()
    );
    Ok(())
}

/// Drive `scenario` on the current (paused) runtime.
pub async fn execute(
    scenario: &Scenario,
    store: Option<Rc<AspectsStore>>,
    settle: Duration,
) -> Result<Report> {
    let dispatcher = Dispatcher::new();
    let layout = Rc::new(DisplayLayout::new(scenario.monitors.clone()));
    let window = Rc::new(SimWindow::new(scenario.tabs.clone(), scenario.caption));
    if let Some(p) = scenario.position {
        window.set_position(p);
    }
    let (publisher, mut notices) = ChannelPublisher::new();
    let tally = Rc::new(Tally::default());

    let mut builder = WindowController::builder(window.clone(), layout.clone())
        .cfg(scenario.cfg.clone())
        .tabs(scenario.tabs.len())
        .publisher(Rc::new(publisher))
        .observer(tally.clone());
    if let Some(store) = store {
        builder = builder.layout_sink(store);
    }
    let controller = builder.build(&dispatcher);
    for tab in 0..scenario.tabs.len() {
        let viewer: Rc<dyn Viewer> = Rc::new(SimViewer::new());
        controller.attach_viewer(tab, viewer);
    }
    controller.apply_persisted_aspects(scenario.aspects);

    for (i, step) in scenario.steps.iter().enumerate() {
        debug!(step = i, ?step, "step");
        apply(step, &dispatcher, &window, &layout, &controller).await?;
        dispatcher.pump();
    }
    debug!(settle = %format_duration(settle), "settling");
    dispatcher.run_for(settle).await;

    let report = Report {
        frame: window.frame(),
        sizing: format!("{:?}", window.sizing()),
        state: format!("{:?}", window.state()),
        relocating: controller.is_relocating(),
        notices: drain(&mut notices),
        recomputes: tally.recomputes.get(),
        placed: tally.placed.get(),
        redraw_ticks: tally.ticks.get(),
        redraw_nudges: tally.nudges.get(),
        aspects: controller.capture_current_aspects(),
    };
    controller.close();
    dispatcher.shutdown();
    Ok(report)
}

/// Perform one scripted step.
async fn apply(
    step: &Step,
    dispatcher: &Dispatcher,
    window: &SimWindow,
    layout: &DisplayLayout,
    controller: &WindowController,
) -> Result<()> {
    match step {
        Step::Render => window.render(),
        Step::Wait(ms) => dispatcher.run_for(Duration::from_millis(*ms)).await,
        Step::Content(tab, w, h) => window.set_content(*tab, Size::new(*w, *h)),
        Step::UserResize(w, h) => window.user_resize(Size::new(*w, *h)),
        Step::Move(x, y) => window.set_position(Point { x: *x, y: *y }),
        Step::SelectTab(tab) => {
            window.show_tab(*tab);
            controller.select_tab(*tab);
        }
        Step::Activate => window.activate(),
        Step::Minimize => window.set_state(WindowState::Minimized),
        Step::ShowMe => controller.show_me(),
        Step::Unplug(index) => {
            layout.unplug(*index)?;
        }
        Step::Plug(monitor) => layout.plug(*monitor),
        Step::StartPosition => controller.move_to_start_position(),
        Step::ForceRecalculate => {
            controller.force_recalculate();
        }
        Step::Save => {
            controller.save_layout()?;
        }
    }
    Ok(())
}

/// Collect every queued notice.
fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(m) = rx.try_recv() {
        out.push(m);
    }
    out
}

#[cfg(test)]
mod tests {
    use winplace::SCREEN_NOT_AVAILABLE;

    use super::*;

    fn scenario(text: &str) -> Scenario {
        Scenario::from_ron(text).expect("scenario")
    }

    #[tokio::test(start_paused = true)]
    async fn bundled_scenario_runs() {
        let s = scenario(include_str!("../scenarios/dual_monitor.ron"));
        let report = execute(&s, None, Duration::from_secs(1))
            .await
            .expect("run");
        assert!(!report.relocating);
        assert!(report.placed >= 1);
        assert_eq!(report.state, "Normal");
        assert_eq!(report.aspects.active_tab, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restored_window_is_centred_and_back_to_auto() {
        let s = scenario(
            "(monitors: [(primary: true, bounds: (x: 0.0, y: 0.0, w: 1920.0, h: 1080.0))],
              tabs: [(width: 800.0, height: 600.0)],
              aspects: Some((width: 800.0, height: 600.0, center_x: 960.0, center_y: 540.0,
                  scroll_left: 0.0, scroll_top: 0.0, zoom: 1.0, is_scrollbar_visible: false,
                  active_tab: 0, screen_index: 0)),
              steps: [Render, Wait(300)])",
        );
        let report = execute(&s, None, Duration::from_millis(100))
            .await
            .expect("run");
        assert_eq!(report.frame, Rect::new(560.0, 240.0, 800.0, 630.0));
        assert_eq!(report.sizing, "Auto");
        assert!(report.notices.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unplugged_saved_screen_publishes_notice() {
        let s = scenario(
            "(monitors: [
                (primary: true, bounds: (x: 0.0, y: 0.0, w: 1920.0, h: 1080.0)),
                (bounds: (x: 1920.0, y: 0.0, w: 1920.0, h: 1080.0)),
              ],
              tabs: [(width: 800.0, height: 600.0)],
              aspects: Some((width: 800.0, height: 600.0, center_x: 2880.0, center_y: 540.0,
                  scroll_left: 0.0, scroll_top: 0.0, zoom: 1.0, is_scrollbar_visible: false,
                  active_tab: 0, screen_index: 1)),
              steps: [Unplug(1), Render, Wait(300)])",
        );
        let report = execute(&s, None, Duration::from_millis(100))
            .await
            .expect("run");
        assert_eq!(report.notices, vec![SCREEN_NOT_AVAILABLE.to_string()]);
        assert!(report.frame.right() <= 1920.0);
    }

    #[tokio::test(start_paused = true)]
    async fn save_step_writes_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Rc::new(AspectsStore::new(dir.path().join("window.ron")));
        let s = scenario(
            "(monitors: [(bounds: (x: 0.0, y: 0.0, w: 1920.0, h: 1080.0))],
              tabs: [(width: 640.0, height: 480.0)],
              steps: [Render, Wait(300), Save])",
        );
        let report = execute(&s, Some(store.clone()), Duration::ZERO)
            .await
            .expect("run");
        let saved = store.load().expect("load").expect("saved");
        assert_eq!(saved.width, 640.0);
        assert_eq!(saved, report.aspects);
    }
}
