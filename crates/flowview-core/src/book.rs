use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Inline base direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

/// What a section's `load` hands to the rendering surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionSource {
    /// Resource locator the surface knows how to fetch
    Url(String),
    /// Document markup held in memory
    Inline(String),
}

/// One independently loadable unit of content, e.g. a chapter file
#[async_trait::async_trait]
pub trait Section: Send + Sync {
    /// Non-linear sections (footnotes, answer keys) are skipped by
    /// next/prev traversal but can still be opened by index
    fn linear(&self) -> bool {
        true
    }

    async fn load(&self) -> Result<SectionSource>;

    /// Auxiliary data the surface may need next to the source
    async fn load_content(&self) -> Result<Option<serde_json::Value>> {
        Ok(None)
    }

    /// Best-effort release once navigation has moved elsewhere
    fn unload(&self) {}
}

/// Rewrites embedded style sheets before they reach a surface
pub type CssTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Ordered, immutable list of sections supplied by the host
#[derive(Clone, Default)]
pub struct Book {
    pub dir: Direction,
    pub sections: Vec<Arc<dyn Section>>,
    transform_css: Option<CssTransform>,
}

impl fmt::Debug for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Book")
            .field("dir", &self.dir)
            .field("sections", &self.sections.len())
            .field("transform_css", &self.transform_css.is_some())
            .finish()
    }
}

impl Book {
    pub fn new(sections: Vec<Arc<dyn Section>>) -> Self {
        Self {
            dir: Direction::Ltr,
            sections,
            transform_css: None,
        }
    }

    pub fn with_dir(mut self, dir: Direction) -> Self {
        self.dir = dir;
        self
    }

    /// Install a hook applied to every embedded style resource
    pub fn with_css_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.transform_css = Some(Arc::new(transform));
        self
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, index: usize) -> Option<&Arc<dyn Section>> {
        self.sections.get(index)
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.sections.len()
    }

    pub fn transform_css(&self, css: &str) -> String {
        match &self.transform_css {
            Some(transform) => transform(css),
            None => css.to_string(),
        }
    }

    /// Nearest linear section from `index` in direction `step` (+1 or -1)
    pub fn adjacent_linear(&self, index: usize, step: isize) -> Option<usize> {
        let mut candidate = index.checked_add_signed(step)?;
        while let Some(section) = self.sections.get(candidate) {
            if section.linear() {
                return Some(candidate);
            }
            candidate = candidate.checked_add_signed(step)?;
        }
        None
    }
}
