//! One section mounted on a rendering surface
//!
//! A `View` owns the surface for the lifetime of a section: it opens the
//! document, applies the scrolled-flow layout, tracks the total block extent
//! and forwards change notifications to the controller.

use tokio::task::JoinHandle;
use tracing::debug;

use crate::book::{Book, Direction};
use crate::config::LayoutConfig;
use crate::content::{ContentRange, ContentTree};
use crate::geometry::RectMapper;
use crate::surface::{
    CssValue, Declaration, DocumentInfo, OpenRequest, OverlaySlot, RenderingSurface, Size,
    StyleTarget, SurfaceSignals,
};
use crate::Result;

/// Size changes below this are layout noise
const SIZE_EPSILON: f64 = 0.5;

/// Resolved layout for one section in scrolled flow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    /// Inline padding on each side of the column
    pub gap: f64,
    pub column_width: f64,
    pub max_block_size: f64,
    pub vertical: bool,
    pub rtl: bool,
    /// Scroll container size the layout was computed for
    pub viewport: Size,
}

impl LayoutParams {
    /// Derive the layout from configuration and the document's orientation.
    ///
    /// The gap is a percentage of the final inline size, so with
    /// `g = gap_percent / 100` the padding on each side is
    /// `-g / (g - 1) * size`.
    pub fn compute(config: &LayoutConfig, viewport: Size, vertical: bool, rtl: bool) -> Self {
        let size = viewport.inline(vertical);
        let g = (config.gap_percent / 100.0).clamp(0.0, 0.5);
        let gap = -g / (g - 1.0) * size;
        Self {
            margin_top: config.margin_top,
            margin_right: config.margin_right,
            margin_bottom: config.margin_bottom,
            margin_left: config.margin_left,
            gap,
            column_width: config.max_inline_size,
            max_block_size: config.max_block_size,
            vertical,
            rtl,
            viewport,
        }
    }

    /// Margin before the content on the block axis
    pub fn leading_margin(&self) -> f64 {
        if self.vertical {
            self.margin_right
        } else {
            self.margin_top
        }
    }

    pub fn trailing_margin(&self) -> f64 {
        if self.vertical {
            self.margin_left
        } else {
            self.margin_bottom
        }
    }

    fn root_padding(&self) -> CssValue {
        if self.vertical {
            CssValue::PxPair(self.gap, 0.0)
        } else {
            CssValue::PxPair(0.0, self.gap)
        }
    }
}

pub struct View {
    surface: Box<dyn RenderingSurface>,
    index: usize,
    generation: u64,
    info: DocumentInfo,
    rtl: bool,
    layout: Option<LayoutParams>,
    view_size: f64,
    overlay: OverlaySlot,
    font_task: Option<JoinHandle<()>>,
    observing: bool,
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .field("view_size", &self.view_size)
            .field("observing", &self.observing)
            .finish()
    }
}

impl View {
    pub fn new(surface: Box<dyn RenderingSurface>, index: usize, generation: u64) -> Self {
        Self {
            surface,
            index,
            generation,
            info: DocumentInfo::default(),
            rtl: false,
            layout: None,
            view_size: 0.0,
            overlay: OverlaySlot::default(),
            font_task: None,
            observing: false,
        }
    }

    /// Open the section document and lay it out.
    ///
    /// `compute_layout` receives `(vertical, rtl)` once the document has
    /// reported its orientation.
    pub async fn load<F>(&mut self, request: OpenRequest, book: &Book, compute_layout: F) -> Result<()>
    where
        F: FnOnce(bool, bool) -> LayoutParams,
    {
        let info = self.surface.open(request).await?;

        for (i, css) in self.surface.style_sheets().into_iter().enumerate() {
            let transformed = book.transform_css(&css);
            if transformed != css {
                self.surface.replace_style_sheet(i, transformed);
            }
        }

        self.rtl = info.direction.unwrap_or(book.dir) == Direction::Rtl;
        self.info = info;
        self.surface.clear_background();

        let layout = compute_layout(self.info.writing_mode.is_vertical(), self.rtl);
        self.render(layout);
        debug!(
            index = self.index,
            vertical = layout.vertical,
            rtl = self.rtl,
            view_size = self.view_size,
            "Section rendered"
        );
        Ok(())
    }

    /// Start forwarding surface notifications, and re-measure once pending
    /// web fonts have loaded
    pub fn attach(&mut self, signals: SurfaceSignals) {
        let fonts = self.surface.fonts_ready();
        let on_fonts = signals.clone();
        self.surface.observe(signals);
        self.observing = true;
        self.font_task = Some(tokio::spawn(async move {
            fonts.await;
            on_fonts.resized();
        }));
    }

    /// Apply the scrolled-flow style overrides and re-measure
    pub fn render(&mut self, layout: LayoutParams) {
        self.layout = Some(layout);
        let surface = &mut self.surface;

        surface.set_styles_important(
            StyleTarget::Frame,
            &[Declaration::new(
                "padding",
                CssValue::PxBox(
                    layout.margin_top,
                    layout.margin_right,
                    layout.margin_bottom,
                    layout.margin_left,
                ),
            )],
        );
        surface.set_styles_important(
            StyleTarget::Root,
            &[
                Declaration::new("box-sizing", CssValue::Keyword("border-box")),
                Declaration::new("padding", layout.root_padding()),
                Declaration::new(
                    "direction",
                    CssValue::Keyword(if layout.rtl { "rtl" } else { "ltr" }),
                ),
                Declaration::new("column-width", CssValue::Keyword("auto")),
                Declaration::new("height", CssValue::Keyword("auto")),
                Declaration::new("width", CssValue::Keyword("auto")),
            ],
        );
        let max_inline = if layout.vertical {
            "max-height"
        } else {
            "max-width"
        };
        surface.set_styles_important(
            StyleTarget::Body,
            &[
                Declaration::new(max_inline, CssValue::Px(layout.column_width)),
                Declaration::new("margin", CssValue::Keyword("auto")),
            ],
        );
        surface.set_styles_important(
            StyleTarget::Media,
            &[Declaration::new(
                "max-block-size",
                CssValue::Px(layout.max_block_size),
            )],
        );

        self.expand();
    }

    /// Recompute the total block extent. Returns whether it changed.
    pub fn expand(&mut self) -> bool {
        let Some(layout) = self.layout else {
            return false;
        };
        let size = self.surface.content_extent() + layout.leading_margin() + layout.trailing_margin();
        let changed = (size - self.view_size).abs() > SIZE_EPSILON;
        self.view_size = size;
        self.overlay.redraw();
        changed
    }

    /// Stop observing and release the overlay. Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.observing {
            self.surface.unobserve();
            self.observing = false;
        }
        if let Some(task) = self.font_task.take() {
            task.abort();
        }
        self.overlay.detach();
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn is_vertical(&self) -> bool {
        self.info.writing_mode.is_vertical()
    }

    pub fn is_rtl(&self) -> bool {
        self.rtl
    }

    pub fn overlay(&self) -> &OverlaySlot {
        &self.overlay
    }

    pub fn content(&self) -> &dyn ContentTree {
        self.surface.content()
    }

    /// Total block extent, margins included
    pub fn view_size(&self) -> f64 {
        self.view_size
    }

    /// Block extent of the scroll container
    pub fn viewport_size(&self) -> f64 {
        self.layout
            .map(|l| l.viewport.block(l.vertical))
            .unwrap_or_default()
    }

    pub fn max_scroll(&self) -> f64 {
        (self.view_size - self.viewport_size()).max(0.0)
    }

    pub fn scroll_position(&self) -> f64 {
        self.surface.scroll_position()
    }

    pub fn set_scroll_position(&mut self, offset: f64) {
        self.surface
            .set_scroll_position(offset.clamp(0.0, self.max_scroll()));
    }

    pub fn select(&mut self, range: ContentRange) {
        self.surface.select(range);
    }

    pub fn leading_margin(&self) -> f64 {
        self.layout.map(|l| l.leading_margin()).unwrap_or_default()
    }

    pub fn mapper(&self) -> RectMapper {
        let layout = self.layout.unwrap_or_else(|| {
            LayoutParams::compute(&LayoutConfig::default(), Size::default(), false, false)
        });
        RectMapper {
            vertical: layout.vertical,
            view_size: self.view_size,
            margin_top: layout.margin_top,
            margin_right: layout.margin_right,
            margin_left: layout.margin_left,
        }
    }
}

impl Drop for View {
    fn drop(&mut self) {
        self.destroy();
    }
}
