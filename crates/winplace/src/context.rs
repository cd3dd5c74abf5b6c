//! Shared placement state readable outside the UI thread.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use parking_lot::RwLock;
use tokio::time::{Instant, sleep};

use crate::geom::Rect;

/// Bounds of the monitor the window was last seen on.
///
/// Handed explicitly to whoever needs to place secondary windows relative to
/// the main one. Cloning yields another handle to the same slot.
#[derive(Debug, Clone, Default)]
pub struct ScreenContext {
    /// Shared slot; `None` until a monitor was seen.
    bounds: Arc<RwLock<Option<Rect>>>,
}

impl ScreenContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest known monitor bounds.
    pub fn bounds(&self) -> Option<Rect> {
        *self.bounds.read()
    }

    /// Publish new monitor bounds.
    pub fn update(&self, bounds: Rect) {
        *self.bounds.write() = Some(bounds);
    }
}

/// True until the window received its first successful placement.
#[derive(Debug, Clone)]
pub struct RelocationFlag {
    /// True while relocating.
    inner: Arc<AtomicBool>,
}

impl Default for RelocationFlag {
    fn default() -> Self {
        Self {
            inner: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl RelocationFlag {
    /// Create a flag in the relocating state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    pub fn is_relocating(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }

    /// Set by the engine after a committed placement.
    pub(crate) fn set(&self, relocating: bool) {
        self.inner.store(relocating, Ordering::Release);
    }

    /// Poll until placement settled or `timeout` elapses; returns whether it settled.
    pub async fn wait_settled(&self, poll: Duration, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.is_relocating() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(poll).await;
        }
    }
}
