use std::{rc::Rc, time::Duration};

use tokio::sync::mpsc;
use winplace::{
    ChannelPublisher, Dispatcher, DisplayLayout, HUMAN_FEEL_GOOD_DIVISOR, Monitor, PlacementCfg,
    Point, Recompute, Rect, SCREEN_NOT_AVAILABLE, Size, SizingMode, Viewer, WindowAspects,
    WindowController, WindowHost,
    sim::{SimViewer, SimWindow},
};

const CAPTION: f64 = 30.0;

struct Fixture {
    dispatcher: Dispatcher,
    window: Rc<SimWindow>,
    viewers: Vec<Rc<SimViewer>>,
    controller: WindowController,
    notices: mpsc::UnboundedReceiver<String>,
}

fn fixture(monitors: Vec<Monitor>, contents: Vec<Size>, cfg: PlacementCfg) -> Fixture {
    let dispatcher = Dispatcher::new();
    let tabs = contents.len();
    let window = Rc::new(SimWindow::new(contents, CAPTION));
    let layout = Rc::new(DisplayLayout::new(monitors));
    let (publisher, notices) = ChannelPublisher::new();
    let controller = WindowController::builder(window.clone(), layout)
        .cfg(cfg)
        .tabs(tabs)
        .publisher(Rc::new(publisher))
        .build(&dispatcher);
    let viewers: Vec<Rc<SimViewer>> = (0..tabs).map(|_| Rc::new(SimViewer::new())).collect();
    for (tab, v) in viewers.iter().enumerate() {
        controller.attach_viewer(tab, v.clone());
    }
    Fixture {
        dispatcher,
        window,
        viewers,
        controller,
        notices,
    }
}

fn full_hd() -> Monitor {
    Monitor::new(Rect::new(0.0, 0.0, 1920.0, 1080.0)).primary()
}

fn saved_800x600() -> WindowAspects {
    WindowAspects {
        width: 800.0,
        height: 600.0,
        center_x: 960.0,
        center_y: 540.0,
        scroll_left: 12.0,
        scroll_top: 48.0,
        zoom: 1.25,
        is_scrollbar_visible: false,
        active_tab: 0,
        screen_index: 0,
        working_area: None,
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(m) = rx.try_recv() {
        out.push(m);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn restored_window_lands_on_saved_center() {
    let mut f = fixture(
        vec![full_hd()],
        vec![Size::new(800.0, 600.0)],
        PlacementCfg::default(),
    );
    f.controller.apply_persisted_aspects(Some(saved_800x600()));
    assert_eq!(f.window.position(), Point { x: 560.0, y: 240.0 });
    assert_eq!(f.window.sizing(), SizingMode::Manual);
    assert!(f.controller.is_relocating());

    f.window.render();
    f.dispatcher.run_for(Duration::from_millis(300)).await;

    assert_eq!(f.window.position(), Point { x: 560.0, y: 240.0 });
    assert_eq!(f.window.actual_size(), Size::new(800.0, 600.0));
    // No scrollbars were saved, so the window went back to auto-fit.
    assert_eq!(f.window.sizing(), SizingMode::Auto);
    assert!(!f.controller.is_relocating());
    assert_eq!(f.viewers[0].scale(), 1.25);
    assert_eq!(f.viewers[0].vertical_offset(), 48.0);
    assert!(drain(&mut f.notices).is_empty());
}

#[tokio::test(start_paused = true)]
async fn saved_scrollbars_keep_manual_size() {
    let f = fixture(
        vec![full_hd()],
        vec![Size::new(1200.0, 900.0)],
        PlacementCfg::default(),
    );
    let saved = WindowAspects {
        is_scrollbar_visible: true,
        ..saved_800x600()
    };
    f.controller.apply_persisted_aspects(Some(saved));
    f.window.render();
    f.dispatcher.run_for(Duration::from_millis(300)).await;
    assert_eq!(f.window.sizing(), SizingMode::Manual);
    assert_eq!(f.window.actual_size(), Size::new(800.0, 600.0));
    assert_eq!(f.window.position(), Point { x: 560.0, y: 240.0 });
}

#[tokio::test(start_paused = true)]
async fn capture_then_apply_round_trips() {
    let f = fixture(
        vec![full_hd()],
        vec![Size::new(800.0, 600.0)],
        PlacementCfg::default(),
    );
    f.controller.apply_persisted_aspects(Some(saved_800x600()));
    f.window.render();
    f.dispatcher.run_for(Duration::from_millis(300)).await;
    f.viewers[0].set_scrollbar_visible(true);

    let captured = f.controller.capture_current_aspects();
    assert_eq!(captured.width, 800.0);
    assert_eq!(captured.height, 600.0);
    assert_eq!(captured.center_x, 960.0);
    assert_eq!(captured.center_y, 540.0);
    assert_eq!(captured.zoom, 1.25);
    assert_eq!(captured.scroll_left, 12.0);
    assert!(captured.is_scrollbar_visible);
    assert_eq!(captured.screen_index, 0);
    assert_eq!(captured.working_area, Some(Size::new(1920.0, 1080.0)));

    let g = fixture(
        vec![full_hd()],
        vec![Size::new(800.0, 600.0)],
        PlacementCfg::default(),
    );
    g.controller.apply_persisted_aspects(Some(captured));
    g.window.render();
    g.dispatcher.run_for(Duration::from_millis(300)).await;
    assert_eq!(g.window.frame(), f.window.frame());
    assert_eq!(g.viewers[0].scale(), 1.25);
}

#[tokio::test(start_paused = true)]
async fn larger_monitor_scales_restored_center() {
    let f = fixture(
        vec![Monitor::new(Rect::new(0.0, 0.0, 3840.0, 2160.0)).primary()],
        vec![Size::new(800.0, 600.0)],
        PlacementCfg::default(),
    );
    let saved = WindowAspects {
        working_area: Some(Size::new(1920.0, 1080.0)),
        ..saved_800x600()
    };
    f.controller.apply_persisted_aspects(Some(saved));
    f.window.render();
    f.dispatcher.run_for(Duration::from_millis(300)).await;
    // Centre (960, 555) doubles to (1920, 1110).
    assert_eq!(f.window.position(), Point { x: 1520.0, y: 795.0 });
}

#[tokio::test(start_paused = true)]
async fn missing_saved_screen_is_reported_once() {
    let mut f = fixture(
        vec![full_hd()],
        vec![Size::new(800.0, 600.0)],
        PlacementCfg::default(),
    );
    let saved = WindowAspects {
        screen_index: 1,
        ..saved_800x600()
    };
    f.controller.apply_persisted_aspects(Some(saved));
    f.window.render();
    f.dispatcher.run_for(Duration::from_millis(300)).await;
    f.controller.force_recalculate();
    f.window.set_content(0, Size::new(640.0, 480.0));
    f.dispatcher.run_for(Duration::from_millis(300)).await;

    assert_eq!(drain(&mut f.notices), vec![SCREEN_NOT_AVAILABLE.to_string()]);
    // Placement still went ahead on the current monitor.
    assert!(!f.controller.is_relocating());
}

#[tokio::test(start_paused = true)]
async fn recompute_is_idempotent() {
    let f = fixture(
        vec![full_hd()],
        vec![Size::new(1000.0, 700.0)],
        PlacementCfg::default(),
    );
    f.window.set_position(Point {
        x: 1700.0,
        y: 900.0,
    });
    f.window.render();
    f.dispatcher.run_for(Duration::from_millis(300)).await;
    let first = f.controller.recompute_measures();
    let second = f.controller.recompute_measures();
    assert!(matches!(first, Recompute::Placed(_)));
    assert_eq!(first, second);
    assert_eq!(f.window.position(), Point { x: 920.0, y: 350.0 });
}

#[tokio::test(start_paused = true)]
async fn tab_switch_carries_zoom_and_restores_manual_size() {
    let f = fixture(
        vec![full_hd()],
        vec![Size::new(800.0, 600.0), Size::new(400.0, 300.0)],
        PlacementCfg::default(),
    );
    f.window.set_position(Point { x: 100.0, y: 100.0 });
    f.window.render();
    f.dispatcher.run_for(Duration::from_millis(300)).await;
    f.viewers[0].set_scale(1.5);
    f.viewers[0].scroll_to_horizontal(10.0);
    f.viewers[0].scroll_to_vertical(20.0);

    f.window.show_tab(1);
    f.controller.select_tab(1);
    assert_eq!(f.viewers[1].scale(), 1.5);
    assert_eq!(f.viewers[1].horizontal_offset(), 10.0);
    assert_eq!(f.viewers[1].vertical_offset(), 20.0);
    assert_eq!(f.window.sizing(), SizingMode::Auto);
    assert_eq!(f.window.actual_size(), Size::new(400.0, 300.0));

    f.window.user_resize(Size::new(500.0, 500.0));
    f.dispatcher.run_for(Duration::from_millis(300)).await;

    f.window.show_tab(0);
    f.controller.select_tab(0);
    assert_eq!(f.window.sizing(), SizingMode::Auto);
    assert_eq!(f.window.actual_size(), Size::new(800.0, 600.0));
    f.controller.with_engine(|e| {
        assert!(e.tab_memory().is_manual(1));
        assert_eq!(e.tab_memory().last_size(1), Some(Size::new(500.0, 500.0)));
    });

    f.window.show_tab(1);
    f.controller.select_tab(1);
    assert_eq!(f.window.sizing(), SizingMode::Manual);
    assert_eq!(f.window.actual_size(), Size::new(500.0, 500.0));
}

#[tokio::test(start_paused = true)]
async fn start_position_uses_feel_good_divisor() {
    let work = Rect::new(0.0, 0.0, 1920.0, 1040.0);
    let f = fixture(
        vec![
            Monitor::new(Rect::new(0.0, 0.0, 1920.0, 1080.0))
                .with_working_area(work)
                .primary(),
        ],
        vec![Size::new(800.0, 600.0)],
        PlacementCfg::default(),
    );
    f.controller.move_to_start_position();
    let p = f.window.position();
    let want_x = 960.0 - 800.0 / HUMAN_FEEL_GOOD_DIVISOR;
    let want_y = 520.0 - 630.0 / HUMAN_FEEL_GOOD_DIVISOR;
    assert!((p.x - want_x).abs() < 1e-9, "{p:?}");
    assert!((p.y - want_y).abs() < 1e-9, "{p:?}");
}

#[tokio::test(start_paused = true)]
async fn off_screen_window_is_pulled_onto_nearest_monitor() {
    let cfg = PlacementCfg {
        size_on_virtual_screen: false,
        ..PlacementCfg::default()
    };
    let f = fixture(
        vec![
            full_hd(),
            Monitor::new(Rect::new(-1280.0, 0.0, 1280.0, 1024.0)),
        ],
        vec![Size::new(600.0, 400.0)],
        cfg,
    );
    f.window.set_position(Point {
        x: -3000.0,
        y: 50.0,
    });
    f.window.render();
    f.dispatcher.run_for(Duration::from_millis(300)).await;
    assert_eq!(f.window.position(), Point { x: -1280.0, y: 50.0 });
    assert_eq!(
        f.controller.screen_context().bounds(),
        Some(Rect::new(-1280.0, 0.0, 1280.0, 1024.0))
    );
}

#[tokio::test(start_paused = true)]
async fn no_monitor_means_no_placement() {
    let f = fixture(vec![], vec![Size::new(600.0, 400.0)], PlacementCfg::default());
    f.window.set_position(Point { x: 5000.0, y: 5000.0 });
    f.window.render();
    f.dispatcher.run_for(Duration::from_millis(300)).await;
    assert_eq!(f.window.position(), Point { x: 5000.0, y: 5000.0 });
    assert!(f.controller.is_relocating());
    f.controller.move_to_start_position();
    assert_eq!(f.window.position(), Point { x: 5000.0, y: 5000.0 });
}

#[tokio::test(start_paused = true)]
async fn restored_tab_is_shown_with_its_zoom() {
    let f = fixture(
        vec![full_hd()],
        vec![Size::new(1000.0, 700.0), Size::new(400.0, 300.0)],
        PlacementCfg::default(),
    );
    let saved = WindowAspects {
        width: 400.0,
        height: 300.0,
        zoom: 1.5,
        active_tab: 1,
        ..saved_800x600()
    };
    f.controller.apply_persisted_aspects(Some(saved));
    f.window.render();
    f.dispatcher.run_for(Duration::from_millis(300)).await;

    assert_eq!(f.window.actual_size(), Size::new(400.0, 300.0));
    assert_eq!(f.window.position(), Point { x: 760.0, y: 390.0 });
    assert_eq!(f.viewers[0].scale(), 1.0);
    assert_eq!(f.viewers[1].scale(), 1.5);
    f.controller.with_engine(|e| {
        assert_eq!(e.active_tab(), 1);
        assert_eq!(e.tab_memory().last_size(1), Some(Size::new(400.0, 300.0)));
        assert_eq!(e.tab_memory().last_size(0), None);
    });
    let captured = f.controller.capture_current_aspects();
    assert_eq!(captured.active_tab, 1);
    assert_eq!(captured.size(), Size::new(400.0, 300.0));
}

#[tokio::test(start_paused = true)]
async fn invalid_record_only_restores_tab() {
    let f = fixture(
        vec![full_hd()],
        vec![Size::new(1000.0, 700.0), Size::new(400.0, 300.0)],
        PlacementCfg::default(),
    );
    let saved = WindowAspects {
        center_x: f64::NAN,
        zoom: 2.0,
        active_tab: 1,
        ..saved_800x600()
    };
    f.controller.apply_persisted_aspects(Some(saved));
    f.window.render();
    f.dispatcher.run_for(Duration::from_millis(300)).await;

    assert_eq!(f.window.actual_size(), Size::new(400.0, 300.0));
    assert_eq!(f.window.position(), Point { x: 0.0, y: 0.0 });
    assert_eq!(f.window.sizing(), SizingMode::Auto);
    assert_eq!(f.viewers[1].scale(), 1.0);
    assert!(!f.controller.is_relocating());
    f.controller.with_engine(|e| {
        assert_eq!(e.active_tab(), 1);
        assert!(e.aspects().is_none());
    });

    let g = fixture(
        vec![full_hd()],
        vec![Size::new(1000.0, 700.0), Size::new(400.0, 300.0)],
        PlacementCfg::default(),
    );
    let zero = WindowAspects {
        width: 0.0,
        height: 0.0,
        active_tab: 1,
        ..saved_800x600()
    };
    g.controller.apply_persisted_aspects(Some(zero));
    assert_eq!(g.window.actual_size(), Size::new(400.0, 300.0));
    assert_eq!(g.controller.capture_current_aspects().active_tab, 1);
}

#[tokio::test(start_paused = true)]
async fn manual_restore_reports_missing_screen() {
    let mut f = fixture(
        vec![full_hd()],
        vec![Size::new(1200.0, 900.0)],
        PlacementCfg::default(),
    );
    let saved = WindowAspects {
        screen_index: 3,
        is_scrollbar_visible: true,
        ..saved_800x600()
    };
    f.controller.apply_persisted_aspects(Some(saved));
    f.window.render();
    f.dispatcher.run_for(Duration::from_millis(300)).await;
    f.controller.recompute_measures();

    assert_eq!(f.window.sizing(), SizingMode::Manual);
    assert!(!f.controller.is_relocating());
    assert_eq!(drain(&mut f.notices), vec![SCREEN_NOT_AVAILABLE.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn reselecting_tab_keeps_pending_manual_size() {
    let f = fixture(
        vec![full_hd()],
        vec![Size::new(800.0, 600.0)],
        PlacementCfg::default(),
    );
    f.window.render();
    f.dispatcher.run_for(Duration::from_millis(300)).await;

    f.window.user_resize(Size::new(500.0, 400.0));
    f.controller.select_tab(0);
    assert_eq!(f.window.sizing(), SizingMode::Manual);
    assert_eq!(f.window.actual_size(), Size::new(500.0, 400.0));
    f.controller.with_engine(|e| {
        assert!(e.tab_memory().is_manual(0));
        assert_eq!(e.tab_memory().last_size(0), Some(Size::new(500.0, 400.0)));
    });
}
