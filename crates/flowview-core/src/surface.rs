//! Capabilities the host application plugs in: the scroll container and the
//! rendering engine behind each section

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::book::{Direction, SectionSource};
use crate::content::{ContentRange, ContentTree};
use crate::Result;

/// Viewport size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Extent along the inline axis
    pub fn inline(&self, vertical: bool) -> f64 {
        if vertical {
            self.height
        } else {
            self.width
        }
    }

    /// Extent along the block (scrolling) axis
    pub fn block(&self, vertical: bool) -> f64 {
        if vertical {
            self.width
        } else {
            self.height
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritingMode {
    #[default]
    HorizontalTb,
    VerticalRl,
}

impl WritingMode {
    pub fn is_vertical(&self) -> bool {
        matches!(self, WritingMode::VerticalRl)
    }
}

/// What a surface reports about a document once it is ready
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInfo {
    pub writing_mode: WritingMode,
    /// `None` when the document does not declare a direction
    pub direction: Option<Direction>,
    pub background: Option<String>,
}

/// Everything needed to activate a rendering target
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub index: usize,
    pub source: SectionSource,
    pub aux: Option<serde_json::Value>,
}

/// Where a style override is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleTarget {
    /// The element framing the document inside the scroll container
    Frame,
    /// The document's root element
    Root,
    Body,
    /// Images, video and other replaced elements
    Media,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CssValue {
    Px(f64),
    /// Two-value shorthand, vertical then horizontal
    PxPair(f64, f64),
    /// Four-value shorthand, top right bottom left
    PxBox(f64, f64, f64, f64),
    Keyword(&'static str),
}

impl fmt::Display for CssValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CssValue::Px(v) => write!(f, "{v}px"),
            CssValue::PxPair(a, b) => write!(f, "{a}px {b}px"),
            CssValue::PxBox(t, r, b, l) => write!(f, "{t}px {r}px {b}px {l}px"),
            CssValue::Keyword(k) => f.write_str(k),
        }
    }
}

/// A single style override, always applied with `!important` priority
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: &'static str,
    pub value: CssValue,
}

impl Declaration {
    pub fn new(property: &'static str, value: CssValue) -> Self {
        Self { property, value }
    }

    pub fn to_css(&self) -> String {
        format!("{}: {} !important", self.property, self.value)
    }
}

/// Change notifications a surface pushes to its controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Rendered content changed size (reflow, font load, dynamic content)
    Resized,
    /// Scroll position changed, by the user or programmatically
    Scrolled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSignal {
    /// Identifies the view that raised the signal; stale views are ignored
    pub generation: u64,
    pub kind: SignalKind,
}

/// Sender handed to a surface when it starts being observed
#[derive(Debug, Clone)]
pub struct SurfaceSignals {
    generation: u64,
    tx: mpsc::UnboundedSender<SurfaceSignal>,
}

impl SurfaceSignals {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<SurfaceSignal>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn resized(&self) {
        self.send(SignalKind::Resized);
    }

    pub fn scrolled(&self) {
        self.send(SignalKind::Scrolled);
    }

    fn send(&self, kind: SignalKind) {
        if self
            .tx
            .send(SurfaceSignal {
                generation: self.generation,
                kind,
            })
            .is_err()
        {
            tracing::debug!(generation = self.generation, "Surface signal dropped: controller gone");
        }
    }
}

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Rendering engine for one section's document.
///
/// Offsets on the scroll axis are canonical: non-negative and growing in
/// reading order. Engines whose native scroll offsets run negative (e.g.
/// `vertical-rl`) convert internally.
#[async_trait::async_trait]
pub trait RenderingSurface: Send {
    /// Activate the target with the given source; resolves once the
    /// document is ready to be measured
    async fn open(&mut self, request: OpenRequest) -> Result<DocumentInfo>;

    /// Text of each embedded style sheet, in document order
    fn style_sheets(&self) -> Vec<String>;

    fn replace_style_sheet(&mut self, index: usize, css: String);

    /// The host paints the background, not the section document
    fn clear_background(&mut self);

    /// Apply overrides with `!important` priority
    fn set_styles_important(&mut self, target: StyleTarget, declarations: &[Declaration]);

    fn content(&self) -> &dyn ContentTree;

    /// Block extent of the laid out document, margins excluded. Measuring
    /// forces any pending reflow.
    fn content_extent(&mut self) -> f64;

    fn scroll_position(&self) -> f64;

    fn set_scroll_position(&mut self, offset: f64);

    /// Show `range` as the document selection
    fn select(&mut self, _range: ContentRange) {}

    /// Start pushing resize and scroll notifications
    fn observe(&mut self, signals: SurfaceSignals);

    fn unobserve(&mut self);

    /// Resolves when pending web fonts have finished loading
    fn fonts_ready(&self) -> BoxFuture<()>;
}

/// The application embedding the scroller
pub trait Host: Send + Sync {
    /// Current scroll container size
    fn viewport(&self) -> Size;

    /// Backgrounded hosts never animate
    fn is_visible(&self) -> bool;

    fn create_surface(&self, index: usize) -> Box<dyn RenderingSurface>;
}

/// Host-supplied annotation layer mounted over a section
pub trait Overlayer: Send {
    /// Called whenever the section's geometry changes
    fn redraw(&mut self);
}

/// Attach point handed out with each `create-overlayer` event
#[derive(Clone, Default)]
pub struct OverlaySlot {
    inner: Arc<Mutex<Option<Box<dyn Overlayer>>>>,
}

impl fmt::Debug for OverlaySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlaySlot")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl OverlaySlot {
    pub fn attach(&self, overlayer: Box<dyn Overlayer>) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(overlayer);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.inner.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    pub(crate) fn redraw(&self) {
        if let Ok(mut slot) = self.inner.lock() {
            if let Some(overlayer) = slot.as_mut() {
                overlayer.redraw();
            }
        }
    }

    pub(crate) fn detach(&self) {
        if let Ok(mut slot) = self.inner.lock() {
            slot.take();
        }
    }
}
