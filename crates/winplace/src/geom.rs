//! Geometry primitives and helpers.
//!
//! Screen coordinates are y-down: `top` is the smaller y, `bottom` the larger.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in logical screen units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate (grows downwards).
    pub y: f64,
}

/// A size in logical screen units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Construct a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when both extents are strictly positive and finite.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}x{:.1}", self.width, self.height)
    }
}

/// True when `a` and `b` differ by at most `eps`.
#[inline]
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

/// Axis-aligned rectangle; origin is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
}

impl Rect {
    /// Construct a rectangle from origin and extent.
    #[must_use]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Construct a rectangle from an origin point and a size.
    #[must_use]
    pub const fn from_parts(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Left edge.
    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }
    /// Right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }
    /// Top edge.
    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }
    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
    /// Horizontal center.
    #[inline]
    pub fn cx(&self) -> f64 {
        self.x + self.w / 2.0
    }
    /// Vertical center.
    #[inline]
    pub fn cy(&self) -> f64 {
        self.y + self.h / 2.0
    }

    /// Origin as a point.
    #[inline]
    pub fn origin(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }

    /// Extent as a size.
    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    /// Center as a point.
    #[inline]
    pub fn center(&self) -> Point {
        Point {
            x: self.cx(),
            y: self.cy(),
        }
    }

    /// Area covered by the intersection with `other` (zero when disjoint).
    #[must_use]
    pub fn overlap_area(&self, other: &Self) -> f64 {
        overlap_1d(self.left(), self.right(), other.left(), other.right())
            * overlap_1d(self.top(), self.bottom(), other.top(), other.bottom())
    }

    /// Smallest rectangle containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let l = self.left().min(other.left());
        let t = self.top().min(other.top());
        let r = self.right().max(other.right());
        let b = self.bottom().max(other.bottom());
        Self::new(l, t, r - l, b - t)
    }

    /// Squared distance from `p` to the closest point of the rectangle.
    #[must_use]
    pub fn distance_sq_to(&self, p: Point) -> f64 {
        let dx = (self.left() - p.x).max(0.0).max(p.x - self.right());
        let dy = (self.top() - p.y).max(0.0).max(p.y - self.bottom());
        dx * dx + dy * dy
    }

    /// Component-wise approximate equality.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        approx_eq(self.x, other.x, eps)
            && approx_eq(self.y, other.y, eps)
            && approx_eq(self.w, other.w, eps)
            && approx_eq(self.h, other.h, eps)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.1},{:.1} {:.1}x{:.1})",
            self.x, self.y, self.w, self.h
        )
    }
}

/// Inclusive containment test.
#[inline]
pub fn point_in_rect(px: f64, py: f64, r: &Rect) -> bool {
    px >= r.left() && px <= r.right() && py >= r.top() && py <= r.bottom()
}

/// Length of the intersection of `[a1, a2]` and `[b1, b2]`.
#[inline]
pub fn overlap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    let l = a1.max(b1);
    let r = a2.min(b2);
    (r - l).max(0.0)
}
