//! winplace: window geometry persistence and multi-monitor placement.
//!
//! The crate keeps a top-level window sensibly sized and positioned across
//! restarts and monitor changes:
//!
//! - [`PlacementEngine`] derives size limits from the current monitor (or the
//!   virtual desktop), recentres auto-sized windows around their previous
//!   centre and clamps them so the title bar stays reachable.
//! - [`ResizeDebouncer`] collapses bursts of size notifications into a single
//!   recompute.
//! - [`RedrawWatchdog`] periodically nudges the window width by one unit to
//!   force a full repaint.
//! - [`WindowController`] wires all of the above to a [`WindowHost`]'s event
//!   hub on a single-threaded [`Dispatcher`].
//!
//! The toolkit, the monitor enumeration and the content viewers are reached
//! through traits; [`DisplayLayout`] and the [`sim`] module provide in-memory
//! implementations.

mod aspects;
mod cfg;
mod context;
mod controller;
mod debounce;
mod dispatcher;
mod engine;
mod error;
mod events;
pub mod geom;
mod host;
mod notice;
mod screen;
pub mod sim;
mod store;
mod tabs;
mod watchdog;


pub use aspects::WindowAspects;
pub use cfg::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_MIN_REDRAW_WIDTH, DEFAULT_REACH_MARGIN_X, DEFAULT_REACH_MARGIN_Y,
    DEFAULT_WATCHDOG_ACTIVATION_MS, DEFAULT_WATCHDOG_PERIOD_MS, PlacementCfg,
};
pub use context::{RelocationFlag, ScreenContext};
pub use controller::{WindowController, WindowControllerBuilder};
pub use debounce::{DebounceState, RESIZE_DEBOUNCE_TIMER, ResizeDebouncer};
pub use dispatcher::{Dispatcher, Priority, Timer};
pub use engine::{
    HUMAN_FEEL_GOOD_DIVISOR, PlacementBounds, PlacementEngine, PlacementObserver, Recompute,
    SkipReason,
};
pub use error::{Error, Result};
pub use events::{Subscription, WindowEvent, WindowEvents};
pub use geom::{Point, Rect, Size};
pub use host::{SizingMode, Viewer, WindowHost, WindowState};
pub use notice::{
    ChannelPublisher, InfoPublisher, LayoutSink, SCREEN_NOT_AVAILABLE, TracingPublisher,
};
pub use screen::{DisplayLayout, Monitor, ScreenGeometry, ScreenResolver};
pub use store::AspectsStore;
pub use tabs::{TabSizeMemory, TabSizeRecord};
pub use watchdog::{REDRAW_WATCHDOG_TIMER, RedrawWatchdog, nudge_width};
