use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::layout::FontMetrics;
use super::surface::{HeadlessSurface, Presentation, SharedPort};
use crate::content::ContentRange;
use crate::surface::{Host, RenderingSurface, Size, StyleTarget};

/// A web font that replaces the fallback metrics once it has loaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebFont {
    pub metrics: FontMetrics,
    pub load_delay: Duration,
}

#[derive(Debug)]
struct HostState {
    viewport: Size,
    visible: bool,
    metrics: FontMetrics,
    web_font: Option<WebFont>,
    /// Scroll port of the surface currently being observed
    current: Option<SharedPort>,
    surfaces_created: usize,
}

/// Host application simulated in memory. Clones share state, so a test can
/// keep one handle while the scroller owns another.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    state: Arc<Mutex<HostState>>,
}

impl HeadlessHost {
    pub fn new(viewport: Size) -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState {
                viewport,
                visible: true,
                metrics: FontMetrics::default(),
                web_font: None,
                current: None,
                surfaces_created: 0,
            })),
        }
    }

    /// Surfaces created from now on start with fallback metrics and switch
    /// to `font` once it loads
    pub fn with_web_font(self, font: WebFont) -> Self {
        self.lock().web_font = Some(font);
        self
    }

    /// Takes effect on the next render
    pub fn set_viewport(&self, viewport: Size) {
        self.lock().viewport = viewport;
    }

    pub fn set_visible(&self, visible: bool) {
        self.lock().visible = visible;
    }

    pub fn surfaces_created(&self) -> usize {
        self.lock().surfaces_created
    }

    /// Scroll offset of the displayed section
    pub fn scroll_position(&self) -> Option<f64> {
        let port = self.lock().current.clone()?;
        let position = port.lock().ok()?.position();
        Some(position)
    }

    /// Style overrides applied to `target` of the displayed section, as CSS
    /// declarations in application order
    pub fn styles(&self, target: StyleTarget) -> Vec<String> {
        self.presentation()
            .and_then(|mut p| p.styles.remove(&target))
            .unwrap_or_default()
    }

    /// Whether the displayed section's own background was removed
    pub fn background_cleared(&self) -> bool {
        self.presentation().is_some_and(|p| p.background_cleared)
    }

    /// Highlighted range in the displayed section
    pub fn selection(&self) -> Option<ContentRange> {
        self.presentation()?.selection
    }

    fn presentation(&self) -> Option<Presentation> {
        let port = self.lock().current.clone()?;
        let presentation = port.lock().ok()?.presentation.clone();
        Some(presentation)
    }

    /// Scroll the displayed section the way a user would. Returns whether
    /// the position changed.
    pub fn user_scroll_to(&self, offset: f64) -> bool {
        let Some(port) = self.lock().current.clone() else {
            return false;
        };
        let moved = port.lock().map(|mut p| p.scroll_to(offset)).unwrap_or(false);
        moved
    }

    pub fn user_scroll_by(&self, delta: f64) -> bool {
        match self.scroll_position() {
            Some(position) => self.user_scroll_to(position + delta),
            None => false,
        }
    }

    pub(crate) fn metrics(&self) -> (FontMetrics, Option<WebFont>) {
        let state = self.lock();
        (state.metrics, state.web_font)
    }

    pub(crate) fn set_current(&self, port: SharedPort) {
        self.lock().current = Some(port);
    }

    pub(crate) fn clear_current(&self, port: &SharedPort) {
        let mut state = self.lock();
        if state.current.as_ref().is_some_and(|c| Arc::ptr_eq(c, port)) {
            state.current = None;
        }
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Host for HeadlessHost {
    fn viewport(&self) -> Size {
        self.lock().viewport
    }

    fn is_visible(&self) -> bool {
        self.lock().visible
    }

    fn create_surface(&self, index: usize) -> Box<dyn RenderingSurface> {
        self.lock().surfaces_created += 1;
        Box::new(HeadlessSurface::new(index, self.clone()))
    }
}
