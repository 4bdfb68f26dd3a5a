use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::surface::{DocumentInfo, OverlaySlot};
pub use crate::visible::VisibleRange;

/// Why a relocation was reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelocateReason {
    /// Scrolling settled (user input or an in-section page turn)
    Scroll,
    /// Navigation to a selection
    Selection,
    /// Navigation by index or to an anchor
    Navigation,
    /// Re-anchoring after reflow
    Anchor,
}

/// One stable viewport state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelocateEvent {
    pub reason: RelocateReason,
    pub range: VisibleRange,
    pub index: usize,
    /// Scroll start over total section extent, 0 to 1
    pub fraction: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadEvent {
    pub index: usize,
    pub vertical: bool,
    pub rtl: bool,
    pub background: Option<String>,
}

impl LoadEvent {
    pub(crate) fn new(index: usize, info: &DocumentInfo, rtl: bool) -> Self {
        Self {
            index,
            vertical: info.writing_mode.is_vertical(),
            rtl,
            background: info.background.clone(),
        }
    }
}

/// Events emitted by the scroller, in the order they happen
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ScrollerEvent {
    /// The viewport settled on a new range
    Relocate(RelocateEvent),
    /// A section finished rendering; the previous one has been unloaded
    Load(LoadEvent),
    /// A section was mounted; attach an annotation layer through the slot
    CreateOverlayer {
        index: usize,
        #[serde(skip)]
        slot: OverlaySlot,
    },
    /// Raw scroll activity before debouncing
    Scroll { position: f64 },
}

/// Fan-out of scroller events to any number of subscribers
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    senders: Vec<mpsc::UnboundedSender<ScrollerEvent>>,
}

impl EventBus {
    pub(crate) fn add(&mut self, tx: mpsc::UnboundedSender<ScrollerEvent>) {
        self.senders.push(tx);
    }

    pub(crate) fn send(&mut self, event: ScrollerEvent) {
        let before = self.senders.len();
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
        if self.senders.len() < before {
            warn!(
                dropped = before - self.senders.len(),
                "Failed to send scroller event: receiver dropped"
            );
        }
    }
}
