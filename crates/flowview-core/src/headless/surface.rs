use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::document::Document;
use super::host::{HeadlessHost, WebFont};
use super::layout::{FontMetrics, LaidOutTree, LayoutInput};
use crate::book::{Direction, SectionSource};
use crate::content::{ContentRange, ContentTree};
use crate::surface::{
    BoxFuture, CssValue, Declaration, DocumentInfo, Host, OpenRequest, RenderingSurface,
    StyleTarget, SurfaceSignals,
};
use crate::{Error, Result};

/// What a surface has been asked to show, as the host would see it
#[derive(Debug, Clone, Default)]
pub(crate) struct Presentation {
    /// Serialized overrides per target, in application order
    pub(crate) styles: HashMap<StyleTarget, Vec<String>>,
    pub(crate) background_cleared: bool,
    pub(crate) selection: Option<ContentRange>,
}

/// State shared between a surface and its host
#[derive(Debug, Default)]
pub(crate) struct SurfacePort {
    position: f64,
    max: f64,
    signals: Option<SurfaceSignals>,
    pub(crate) presentation: Presentation,
}

pub(crate) type SharedPort = Arc<Mutex<SurfacePort>>;

impl SurfacePort {
    pub(crate) fn position(&self) -> f64 {
        self.position
    }

    /// Clamp, move and notify. Returns whether the position changed.
    pub(crate) fn scroll_to(&mut self, offset: f64) -> bool {
        let to = offset.clamp(0.0, self.max);
        if to == self.position {
            return false;
        }
        self.position = to;
        if let Some(signals) = &self.signals {
            signals.scrolled();
        }
        true
    }

    fn set_max(&mut self, max: f64) {
        self.max = max.max(0.0);
        if self.position > self.max {
            self.scroll_to(self.max);
        }
    }
}

/// In-memory rendering surface laying out [`Document`] markup
pub struct HeadlessSurface {
    index: usize,
    host: HeadlessHost,
    port: SharedPort,
    document: Document,
    tree: LaidOutTree,
    info: DocumentInfo,
    metrics: FontMetrics,
    loaded_font: Arc<Mutex<Option<FontMetrics>>>,
    web_font: Option<WebFont>,
    /// top, right, bottom, left
    frame_padding: [f64; 4],
    gap: f64,
    column_width: Option<f64>,
    rtl: bool,
    dirty: bool,
}

impl std::fmt::Debug for HeadlessSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessSurface")
            .field("index", &self.index)
            .field("blocks", &self.document.blocks.len())
            .field("extent", &self.tree.extent())
            .finish()
    }
}

impl HeadlessSurface {
    pub fn new(index: usize, host: HeadlessHost) -> Self {
        let (metrics, web_font) = host.metrics();
        let document = Document::default();
        let tree = LaidOutTree::build(
            &document,
            LayoutInput {
                vertical: false,
                rtl: false,
                inline_start: 0.0,
                inline_size: 0.0,
                metrics,
            },
        );
        Self {
            index,
            host,
            port: SharedPort::default(),
            document,
            tree,
            info: DocumentInfo::default(),
            metrics,
            loaded_font: Arc::new(Mutex::new(None)),
            web_font,
            frame_padding: [0.0; 4],
            gap: 0.0,
            column_width: None,
            rtl: false,
            dirty: true,
        }
    }

    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn apply(&mut self, target: StyleTarget, decl: &Declaration) {
        let vertical = self.info.writing_mode.is_vertical();
        match (target, decl.property, decl.value) {
            (StyleTarget::Frame, "padding", CssValue::PxBox(t, r, b, l)) => {
                self.frame_padding = [t, r, b, l];
            }
            (StyleTarget::Root, "padding", CssValue::PxPair(v, h)) => {
                self.gap = if vertical { v } else { h };
            }
            (StyleTarget::Root, "direction", CssValue::Keyword(dir)) => {
                self.rtl = dir == "rtl";
            }
            (StyleTarget::Body, "max-width" | "max-height", CssValue::Px(width)) => {
                self.column_width = Some(width);
            }
            _ => {}
        }
    }

    fn present(&self, update: impl FnOnce(&mut Presentation)) {
        if let Ok(mut port) = self.port.lock() {
            update(&mut port.presentation);
        }
    }

    fn reflow(&mut self) {
        let loaded = self
            .loaded_font
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(metrics) = loaded {
            debug!(index = self.index, ?metrics, "Web font applied");
            self.metrics = metrics;
            self.dirty = true;
        }
        if !self.dirty {
            return;
        }

        let vertical = self.info.writing_mode.is_vertical();
        let viewport = self.host.viewport();
        let [top, right, bottom, left] = self.frame_padding;
        let (inline_margins, leading, trailing) = if vertical {
            (top + bottom, right, left)
        } else {
            (left + right, top, bottom)
        };
        let available = (viewport.inline(vertical) - inline_margins - 2.0 * self.gap).max(0.0);
        let inline_size = self.column_width.map_or(available, |w| w.min(available));

        self.tree = LaidOutTree::build(
            &self.document,
            LayoutInput {
                vertical,
                rtl: self.rtl,
                inline_start: self.gap + (available - inline_size) / 2.0,
                inline_size,
                metrics: self.metrics,
            },
        );
        let max = self.tree.extent() + leading + trailing - viewport.block(vertical);
        if let Ok(mut port) = self.port.lock() {
            port.set_max(max);
        }
        self.dirty = false;
    }
}

#[async_trait::async_trait]
impl RenderingSurface for HeadlessSurface {
    async fn open(&mut self, request: OpenRequest) -> Result<DocumentInfo> {
        let text = match request.source {
            SectionSource::Inline(text) => text,
            SectionSource::Url(url) => {
                let path = url.strip_prefix("file://").unwrap_or(&url);
                if path.contains("://") {
                    return Err(Error::Surface(format!("cannot fetch {}", url)));
                }
                tokio::fs::read_to_string(path).await?
            }
        };
        self.document = Document::parse(&text);
        self.info = DocumentInfo {
            writing_mode: self.document.writing_mode,
            direction: self.document.direction,
            background: self.document.background.clone(),
        };
        self.rtl = self.document.direction == Some(Direction::Rtl);
        self.dirty = true;
        debug!(
            index = request.index,
            blocks = self.document.blocks.len(),
            "Document opened"
        );
        Ok(self.info.clone())
    }

    fn style_sheets(&self) -> Vec<String> {
        self.document.styles.clone()
    }

    fn replace_style_sheet(&mut self, index: usize, css: String) {
        let Some(sheet) = self.document.styles.get_mut(index) else {
            return;
        };
        *sheet = css.clone();
        let node = self.tree.style_nodes().nth(index);
        if let Some(node) = node {
            self.tree.set_style_text(node, css);
        }
    }

    fn clear_background(&mut self) {
        self.present(|p| p.background_cleared = true);
    }

    fn set_styles_important(&mut self, target: StyleTarget, declarations: &[Declaration]) {
        for decl in declarations {
            self.apply(target, decl);
        }
        self.present(|p| {
            p.styles
                .entry(target)
                .or_default()
                .extend(declarations.iter().map(Declaration::to_css));
        });
        self.dirty = true;
    }

    fn content(&self) -> &dyn ContentTree {
        &self.tree
    }

    fn content_extent(&mut self) -> f64 {
        self.reflow();
        self.tree.extent()
    }

    fn scroll_position(&self) -> f64 {
        self.port.lock().map(|p| p.position()).unwrap_or_default()
    }

    fn set_scroll_position(&mut self, offset: f64) {
        if let Ok(mut port) = self.port.lock() {
            port.scroll_to(offset);
        }
    }

    fn select(&mut self, range: ContentRange) {
        self.present(|p| p.selection = Some(range));
    }

    fn observe(&mut self, signals: SurfaceSignals) {
        if let Ok(mut port) = self.port.lock() {
            port.signals = Some(signals);
        }
        self.host.set_current(self.port.clone());
    }

    fn unobserve(&mut self) {
        if let Ok(mut port) = self.port.lock() {
            port.signals = None;
        }
        self.host.clear_current(&self.port);
    }

    fn fonts_ready(&self) -> BoxFuture<()> {
        let Some(font) = self.web_font else {
            return Box::pin(async {});
        };
        let slot = self.loaded_font.clone();
        Box::pin(async move {
            tokio::time::sleep(font.load_delay).await;
            if let Ok(mut slot) = slot.lock() {
                *slot = Some(font.metrics);
            }
        })
    }
}
