//! Outbound hand-offs: one-line advisories and layout saves.

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{Result, aspects::WindowAspects};

/// Advisory raised when restored aspects name a monitor that is gone.
pub const SCREEN_NOT_AVAILABLE: &str =
    "saved screen layout could not be restored, the addressed screen is not available";

/// Receives short user-facing notices.
pub trait InfoPublisher {
    /// Publish one notice line.
    fn publish(&self, message: &str);
}

/// Publisher that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPublisher;

impl InfoPublisher for TracingPublisher {
    fn publish(&self, message: &str) {
        info!(message, "info_notice");
    }
}

/// Publisher that forwards notices over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    /// Sending half.
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiving end.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl InfoPublisher for ChannelPublisher {
    fn publish(&self, message: &str) {
        info!(message, "info_notice");
        if self.tx.send(message.to_string()).is_err() {
            warn!("info_notice_receiver_gone");
        }
    }
}

/// Receives the "save current layout" hand-off.
pub trait LayoutSink {
    /// Persist `aspects` together with the rest of the layout.
    fn save_tree_state(&self, aspects: &WindowAspects) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_publisher_delivers() {
        let (p, mut rx) = ChannelPublisher::new();
        p.publish(SCREEN_NOT_AVAILABLE);
        assert_eq!(rx.try_recv().ok().as_deref(), Some(SCREEN_NOT_AVAILABLE));
    }

    #[test]
    fn closed_receiver_is_tolerated() {
        let (p, rx) = ChannelPublisher::new();
        drop(rx);
        p.publish("ignored");
    }
}
