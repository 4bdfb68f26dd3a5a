//! Rectangle helpers and the canonical reading axis
//!
//! Rendering surfaces report device-axis rectangles whose meaning depends on
//! the writing mode. Everything that measures visibility works on a single
//! 1-D [`Interval`] along the block (reading) direction instead, produced by
//! a [`RectMapper`].

use serde::{Deserialize, Serialize};

/// Device-axis rectangle in document coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// A rect is empty only when it has neither width nor height.
    /// Zero-width carets still carry a position and must not be dropped.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 && self.height() <= 0.0
    }

    /// Non-zero in both dimensions
    #[inline]
    pub fn has_area(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }
}

/// Merge the client rects of one logical node into a single bounding rect.
///
/// Zero-width rects with a height (collapsed carets, hyphen remnants at a
/// line end) take part in the union; only fully degenerate rects are skipped.
/// Returns `None` when nothing is left.
pub fn bounding_rect<'a, I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = &'a Rect>,
{
    rects
        .into_iter()
        .filter(|r| !r.is_empty())
        .fold(None, |acc: Option<Rect>, r| {
            Some(match acc {
                None => *r,
                Some(a) => Rect {
                    left: a.left.min(r.left),
                    top: a.top.min(r.top),
                    right: a.right.max(r.right),
                    bottom: a.bottom.max(r.bottom),
                },
            })
        })
}

/// Span along the canonical axis. `start <= end` and both grow in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }

    /// Some positive-length part of `self` lies within `other`
    #[inline]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.end > other.start && self.start < other.end
    }

    /// `self` lies entirely within `other`
    #[inline]
    pub fn within(&self, other: &Interval) -> bool {
        self.start >= other.start && self.end <= other.end
    }

    /// Entirely before or entirely after `other`
    #[inline]
    pub fn outside(&self, other: &Interval) -> bool {
        self.end < other.start || self.start > other.end
    }
}

/// Maps document rects onto the canonical axis of a scrolled view.
///
/// In horizontal writing modes the block axis is the vertical screen axis and
/// the leading margin is the top one. In `vertical-rl` the block axis runs
/// right to left, so positions are measured from the right edge of the view
/// and the leading margin is the right one. RTL inline direction does not
/// affect the block axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectMapper {
    pub vertical: bool,
    /// Total block extent of the view, margins included
    pub view_size: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_left: f64,
}

impl RectMapper {
    pub fn map(&self, rect: &Rect) -> Interval {
        if self.vertical {
            let origin = self.view_size - self.margin_left;
            Interval::new(origin - rect.right, origin - rect.left)
        } else {
            Interval::new(rect.top + self.margin_top, rect.bottom + self.margin_top)
        }
    }

    /// Margin preceding the content on the canonical axis
    pub fn leading_margin(&self) -> f64 {
        if self.vertical {
            self.margin_right
        } else {
            self.margin_top
        }
    }

    /// Map the union of several rects; `None` if all of them are degenerate
    pub fn map_all(&self, rects: &[Rect]) -> Option<Interval> {
        bounding_rect(rects).map(|r| self.map(&r))
    }
}
