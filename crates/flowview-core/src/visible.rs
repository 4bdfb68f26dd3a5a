//! Visible range detection
//!
//! Walks the content tree depth-first and keeps the first and last nodes
//! that fall inside the viewport window, then narrows text boundaries down
//! to a character offset with [`bisect`].

use std::cmp::Ordering;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::bisect::bisect;
use crate::content::{ContentPosition, ContentRange, ContentTree, NodeId, NodeKind};
use crate::geometry::{Interval, RectMapper};

/// The content currently inside the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleRange {
    pub from: ContentPosition,
    pub to: ContentPosition,
}

impl VisibleRange {
    pub fn as_range(&self) -> ContentRange {
        ContentRange::new(self.from, self.to)
    }
}

impl From<VisibleRange> for ContentRange {
    fn from(range: VisibleRange) -> Self {
        range.as_range()
    }
}

/// Canonical-axis window shown for a scroll offset.
///
/// Content aligned by a scroll-to-anchor sits right after the leading margin,
/// so the margin band above it is not part of the reading window. Viewports
/// too small to hold the margin fall back to the raw scroll window.
pub fn reading_window(scroll: f64, viewport: f64, leading_margin: f64) -> Interval {
    let start = scroll + leading_margin;
    let end = scroll + viewport;
    if end > start {
        Interval::new(start, end)
    } else {
        Interval::new(scroll, end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    /// Count the node and keep walking its children
    Accept,
    /// Prune the whole subtree
    Reject,
    /// Do not count the node but walk its children
    Skip,
}

fn filter(tree: &dyn ContentTree, node: NodeId, window: &Interval, mapper: &RectMapper) -> Filter {
    match tree.kind(node) {
        NodeKind::NonContent => Filter::Reject,
        NodeKind::Element => {
            let span = mapper.map(&tree.bounding_rect(node));
            if span.outside(window) {
                Filter::Reject
            } else if span.within(window) {
                // elements have no offsets, so only whole elements count
                Filter::Accept
            } else {
                Filter::Skip
            }
        }
        NodeKind::Text => {
            if tree.text(node).trim().is_empty() {
                return Filter::Skip;
            }
            let span = mapper.map(&tree.bounding_rect(node));
            if span.overlaps(window) {
                Filter::Accept
            } else {
                Filter::Skip
            }
        }
    }
}

struct Walk<'a> {
    tree: &'a dyn ContentTree,
    window: Interval,
    mapper: &'a RectMapper,
    first: Option<NodeId>,
    last: Option<NodeId>,
}

impl Walk<'_> {
    fn descend(&mut self, node: NodeId) {
        for &child in self.tree.children(node) {
            match filter(self.tree, child, &self.window, self.mapper) {
                Filter::Reject => continue,
                Filter::Accept => {
                    self.first.get_or_insert(child);
                    self.last = Some(child);
                }
                Filter::Skip => {}
            }
            self.descend(child);
        }
    }
}

/// Compute the content range inside `window` along the canonical axis
pub fn visible_range(tree: &dyn ContentTree, window: Interval, mapper: &RectMapper) -> VisibleRange {
    let mut walk = Walk {
        tree,
        window,
        mapper,
        first: None,
        last: None,
    };
    walk.descend(tree.root());

    let from = walk.first.unwrap_or_else(|| tree.root());
    let to = walk.last.unwrap_or(from);

    let start = if tree.kind(from) == NodeKind::Text {
        bisect(0, tree.text_len(from), |a, b| {
            start_side(tree, mapper, from, a, b, window.start)
        })
    } else {
        0
    };
    let end = if tree.kind(to) == NodeKind::Text {
        bisect(0, tree.text_len(to), |a, b| {
            end_side(tree, mapper, to, a, b, window.end)
        })
    } else {
        0
    };

    VisibleRange {
        from: ContentPosition::new(from, start),
        to: ContentPosition::new(to, end),
    }
}

fn span(tree: &dyn ContentTree, mapper: &RectMapper, node: NodeId, range: Range<usize>) -> Interval {
    mapper
        .map_all(&tree.range_rects(node, range.start, range.end))
        .unwrap_or_default()
}

/// Leading boundary: the first character whose line box reaches past `cut`
fn start_side(
    tree: &dyn ContentTree,
    mapper: &RectMapper,
    node: NodeId,
    a: Range<usize>,
    b: Range<usize>,
    cut: f64,
) -> Ordering {
    let p = span(tree, mapper, node, a);
    if p.end > cut {
        return Ordering::Less;
    }
    let q = span(tree, mapper, node, b);
    if q.start >= cut {
        Ordering::Equal
    } else {
        Ordering::Greater
    }
}

/// Trailing boundary: the first character whose line box starts at or after `cut`
fn end_side(
    tree: &dyn ContentTree,
    mapper: &RectMapper,
    node: NodeId,
    a: Range<usize>,
    b: Range<usize>,
    cut: f64,
) -> Ordering {
    let q = span(tree, mapper, node, b);
    if q.start < cut {
        return Ordering::Greater;
    }
    let empty = a.is_empty();
    let p = span(tree, mapper, node, a);
    if p.start >= cut {
        Ordering::Less
    } else if empty || p.end <= cut {
        Ordering::Equal
    } else {
        Ordering::Less
    }
}
