//! Monospace line layout
//!
//! Every character advances by a fixed amount, doubled for East Asian wide
//! characters. Blocks stack along the block axis with half a line of spacing
//! between them; headings are set larger. Lines wrap at whitespace, and a
//! word longer than the line is broken between characters.

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

use super::document::{BlockKind, Document};
use crate::content::{ContentTree, NodeId, NodeKind};
use crate::geometry::{bounding_rect, Rect};

const HEADING_SCALE: f64 = 1.5;

/// Block spacing, in lines
const PARAGRAPH_SPACING: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontMetrics {
    /// Advance of a narrow character
    pub advance: f64,
    pub line_height: f64,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            advance: 8.0,
            line_height: 20.0,
        }
    }
}

impl FontMetrics {
    pub fn new(advance: f64, line_height: f64) -> Self {
        Self {
            advance,
            line_height,
        }
    }

    pub fn char_advance(&self, c: char) -> f64 {
        self.advance * UnicodeWidthChar::width(c).unwrap_or(1) as f64
    }

    fn scaled(&self, factor: f64) -> Self {
        Self::new(self.advance * factor, self.line_height * factor)
    }
}

/// Where the text column sits and how it flows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutInput {
    pub vertical: bool,
    pub rtl: bool,
    /// Offset of the column from the content box's inline start
    pub inline_start: f64,
    pub inline_size: f64,
    pub metrics: FontMetrics,
}

#[derive(Debug, Clone)]
struct Line {
    start: usize,
    end: usize,
    top: f64,
    height: f64,
    /// Inline offset of every caret position from `start` to `end`
    carets: Vec<f64>,
}

impl Line {
    fn caret(&self, offset: usize) -> f64 {
        self.carets[offset.clamp(self.start, self.end) - self.start]
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    text: String,
    char_len: usize,
    lines: Vec<Line>,
    bounds: Rect,
}

impl Node {
    fn new(kind: NodeKind, parent: Option<NodeId>, text: String) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            char_len: text.chars().count(),
            text,
            lines: Vec::new(),
            bounds: Rect::default(),
        }
    }
}

/// A laid out document: the root element holds one element per block, each
/// with a single text child, preceded by one non-content node per style sheet
#[derive(Debug, Clone)]
pub struct LaidOutTree {
    nodes: Vec<Node>,
    input: LayoutInput,
    extent: f64,
}

impl LaidOutTree {
    pub fn build(doc: &Document, input: LayoutInput) -> Self {
        let mut tree = Self {
            nodes: vec![Node::new(NodeKind::Element, None, String::new())],
            input,
            extent: 0.0,
        };

        for css in &doc.styles {
            tree.push(NodeKind::NonContent, 0, css.clone());
        }

        let mut cursor = 0.0;
        for (i, block) in doc.blocks.iter().enumerate() {
            let metrics = match block.kind {
                BlockKind::Heading => input.metrics.scaled(HEADING_SCALE),
                BlockKind::Paragraph => input.metrics,
            };
            if i > 0 {
                cursor += input.metrics.line_height * PARAGRAPH_SPACING;
            }
            let element = tree.push(NodeKind::Element, 0, String::new());
            let text = tree.push(NodeKind::Text, element, block.text.clone());
            let lines = wrap(&block.text, &metrics, input.inline_size, cursor);
            cursor += metrics.line_height * lines.len() as f64;
            tree.nodes[text].lines = lines;
        }
        tree.extent = cursor;

        // children always come after their parent
        for id in (0..tree.nodes.len()).rev() {
            let bounds = match tree.nodes[id].kind {
                NodeKind::NonContent => Rect::default(),
                NodeKind::Text => {
                    let node = &tree.nodes[id];
                    let rects: Vec<Rect> = node
                        .lines
                        .iter()
                        .map(|l| tree.physical(l.top, l.height, l.caret(l.start), l.caret(l.end)))
                        .collect();
                    bounding_rect(&rects).unwrap_or_default()
                }
                NodeKind::Element => {
                    let rects: Vec<Rect> = tree.nodes[id]
                        .children
                        .iter()
                        .filter(|&&c| tree.nodes[c].kind != NodeKind::NonContent)
                        .map(|&c| tree.nodes[c].bounds)
                        .collect();
                    bounding_rect(&rects).unwrap_or_default()
                }
            };
            tree.nodes[id].bounds = bounds;
        }
        tree
    }

    /// Block extent of all content
    pub fn extent(&self) -> f64 {
        self.extent
    }

    pub fn style_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[0]
            .children
            .iter()
            .copied()
            .filter(|&c| self.nodes[c].kind == NodeKind::NonContent)
    }

    /// Replace the text of a non-content node; content text is fixed once laid out
    pub fn set_style_text(&mut self, node: NodeId, text: String) {
        if let Some(n) = self.nodes.get_mut(node) {
            if n.kind == NodeKind::NonContent {
                n.char_len = text.chars().count();
                n.text = text;
            }
        }
    }

    fn push(&mut self, kind: NodeKind, parent: NodeId, text: String) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(kind, Some(parent), text));
        self.nodes[parent].children.push(id);
        id
    }

    /// Physical rect of an inline span `a..b` on the line at block offset `top`
    fn physical(&self, top: f64, height: f64, a: f64, b: f64) -> Rect {
        let input = &self.input;
        let (lo, hi) = if input.rtl {
            let edge = input.inline_start + input.inline_size;
            (edge - b, edge - a)
        } else {
            (input.inline_start + a, input.inline_start + b)
        };
        if input.vertical {
            // columns run right to left
            Rect::new(self.extent - (top + height), lo, self.extent - top, hi)
        } else {
            Rect::new(lo, top, hi, top + height)
        }
    }
}

impl ContentTree for LaidOutTree {
    fn root(&self) -> NodeId {
        0
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        self.nodes
            .get(node)
            .map(|n| n.kind)
            .unwrap_or(NodeKind::NonContent)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    fn text(&self, node: NodeId) -> &str {
        self.nodes.get(node).map(|n| n.text.as_str()).unwrap_or("")
    }

    fn text_len(&self, node: NodeId) -> usize {
        self.nodes.get(node).map(|n| n.char_len).unwrap_or(0)
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        self.nodes.get(node).map(|n| n.bounds).unwrap_or_default()
    }

    fn range_rects(&self, node: NodeId, start: usize, end: usize) -> Vec<Rect> {
        let Some(lines) = self.nodes.get(node).map(|n| &n.lines) else {
            return Vec::new();
        };
        let Some(last) = lines.last() else {
            return Vec::new();
        };

        if start >= end {
            let line = lines.iter().find(|l| start < l.end).unwrap_or(last);
            let x = line.caret(start);
            return vec![self.physical(line.top, line.height, x, x)];
        }

        lines
            .iter()
            .filter(|l| l.start < end && start < l.end)
            .map(|l| {
                let a = l.caret(start.max(l.start));
                let b = l.caret(end.min(l.end));
                self.physical(l.top, l.height, a, b)
            })
            .collect()
    }
}

/// Greedy line breaking. Always yields at least one line.
fn wrap(text: &str, metrics: &FontMetrics, max: f64, top: f64) -> Vec<Line> {
    let chars: Vec<char> = text.chars().collect();
    let widths: Vec<f64> = chars.iter().map(|&c| metrics.char_advance(c)).collect();
    let max = max.max(metrics.advance);

    let mut breaks = Vec::new();
    let mut line_start = 0;
    let mut x = 0.0;
    let mut last_break = None;

    for i in 0..chars.len() {
        if x + widths[i] > max && i > line_start && !chars[i].is_whitespace() {
            let at = match last_break {
                Some(b) if b > line_start => b,
                _ => i,
            };
            breaks.push((line_start, at));
            line_start = at;
            x = widths[at..i].iter().sum();
            last_break = None;
        }
        x += widths[i];
        if chars[i].is_whitespace() {
            last_break = Some(i + 1);
        }
    }
    breaks.push((line_start, chars.len()));

    breaks
        .into_iter()
        .enumerate()
        .map(|(row, (start, end))| {
            let mut carets = Vec::with_capacity(end - start + 1);
            let mut x = 0.0;
            carets.push(x);
            for w in &widths[start..end] {
                x += w;
                carets.push(x);
            }
            Line {
                start,
                end,
                top: top + metrics.line_height * row as f64,
                height: metrics.line_height,
                carets,
            }
        })
        .collect()
}
