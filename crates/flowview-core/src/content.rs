//! Read-only view of a rendered document tree plus the position types that
//! point into it

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Opaque node handle, only meaningful for the document that issued it
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    /// Script, style and similar nodes that never count as visible content
    NonContent,
}

/// Geometry-aware content tree exposed by a rendering surface.
///
/// Text offsets are `char` indices into [`ContentTree::text`].
pub trait ContentTree {
    /// The body element all content hangs off
    fn root(&self) -> NodeId;

    fn kind(&self, node: NodeId) -> NodeKind;

    fn children(&self, node: NodeId) -> &[NodeId];

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Character data of a text node, empty for anything else
    fn text(&self, node: NodeId) -> &str;

    fn text_len(&self, node: NodeId) -> usize {
        self.text(node).chars().count()
    }

    /// Border box of an element, or the union of a text node's line boxes
    fn bounding_rect(&self, node: NodeId) -> Rect;

    /// Client rects of `start..end` inside a text node. A collapsed range
    /// yields a single zero-width caret rect.
    fn range_rects(&self, node: NodeId, start: usize, end: usize) -> Vec<Rect>;
}

/// A point inside the content tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPosition {
    pub node: NodeId,
    pub offset: usize,
}

impl ContentPosition {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRange {
    pub start: ContentPosition,
    pub end: ContentPosition,
}

impl ContentRange {
    pub fn new(start: ContentPosition, end: ContentPosition) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: ContentPosition) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Text covered by the range, following document order between the two
    /// boundary nodes
    pub fn text(&self, tree: &dyn ContentTree) -> String {
        let mut out = String::new();
        let mut inside = false;
        collect_text(tree, tree.root(), self, &mut inside, &mut out);
        out
    }
}

fn collect_text(
    tree: &dyn ContentTree,
    node: NodeId,
    range: &ContentRange,
    inside: &mut bool,
    out: &mut String,
) -> bool {
    let is_start = node == range.start.node;
    let is_end = node == range.end.node;
    if tree.kind(node) == NodeKind::Text {
        let text = tree.text(node);
        let from = if is_start { range.start.offset } else { 0 };
        let to = if is_end { range.end.offset } else { usize::MAX };
        if is_start || *inside {
            out.extend(text.chars().skip(from).take(to.saturating_sub(from)));
        }
        if is_start {
            *inside = true;
        }
        return is_end;
    }
    if is_start {
        *inside = true;
    }
    if is_end && range.end.offset == 0 {
        return true;
    }
    for &child in tree.children(node) {
        if tree.kind(child) == NodeKind::NonContent {
            continue;
        }
        if collect_text(tree, child, range, inside, out) {
            return true;
        }
    }
    is_end
}

/// A position descriptor used to keep the reading location across reflow
/// and section changes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Anchor {
    /// Proportion of the section's total extent, 0 to 1
    Fraction(f64),
    /// Content range inside the currently loaded section
    Range(ContentRange),
    /// Element inside the currently loaded section
    Element(NodeId),
}

impl Default for Anchor {
    fn default() -> Self {
        Anchor::Fraction(0.0)
    }
}

/// Something that has client rects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorTarget {
    Range(ContentRange),
    Element(NodeId),
}

/// Collapsed ranges have no dependable client rects. Widen by one character
/// (forward if possible, else backward), or fall back to the element at the
/// position or its parent.
pub fn uncollapse(tree: &dyn ContentTree, range: ContentRange) -> AnchorTarget {
    if !range.is_collapsed() {
        return AnchorTarget::Range(range);
    }
    let ContentPosition { node, offset } = range.end;
    if tree.kind(node) != NodeKind::Text {
        return match tree.children(node).get(offset) {
            Some(&child) if tree.kind(child) == NodeKind::Element => AnchorTarget::Element(child),
            _ => AnchorTarget::Element(node),
        };
    }
    let len = tree.text_len(node);
    if offset + 1 < len {
        AnchorTarget::Range(ContentRange::new(
            range.start,
            ContentPosition::new(node, offset + 1),
        ))
    } else if offset > 1 {
        AnchorTarget::Range(ContentRange::new(
            ContentPosition::new(node, offset - 1),
            range.end,
        ))
    } else {
        AnchorTarget::Element(tree.parent(node).unwrap_or_else(|| tree.root()))
    }
}

/// Client rects of a target, in document order.
///
/// For a range only the start node's portion is measured; that is where a
/// scroll-to-anchor lands.
pub fn target_rects(tree: &dyn ContentTree, target: AnchorTarget) -> Vec<Rect> {
    match target {
        AnchorTarget::Element(node) => vec![tree.bounding_rect(node)],
        AnchorTarget::Range(range) => {
            let node = range.start.node;
            if tree.kind(node) != NodeKind::Text {
                let child = tree
                    .children(node)
                    .get(range.start.offset)
                    .copied()
                    .unwrap_or(node);
                return vec![tree.bounding_rect(child)];
            }
            let end = if range.end.node == node {
                range.end.offset
            } else {
                tree.text_len(node)
            };
            tree.range_rects(node, range.start.offset, end.max(range.start.offset))
        }
    }
}

/// Pick the rect a scroll should align to: the first one with real area.
/// A range starting right after a hyphen carries an extra zero-width rect
/// on the previous line, which would otherwise win.
pub fn landing_rect(rects: &[Rect]) -> Option<Rect> {
    rects
        .iter()
        .find(|r| r.has_area())
        .or_else(|| rects.first())
        .copied()
}
