//! Common types for 2D layout geometry.
//!
//! This module defines the small value types shared by the geometry primitive,
//! the layout state and the packer: points, anchor orientations, container
//! dimensions and margins.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

/// Default tolerance used when probing around a corner point.
///
/// Probes are placed this far from the corner on both axes. The value must be
/// small compared to the smallest rectangle edge of the input.
pub const DEFAULT_CORNER_EPSILON: f64 = 1e-3;

/// Represents a 2D point in layout space.
///
/// The origin is the container corner at `(0, 0)`; x grows to the right and y
/// grows towards the side the `bottom` margin is applied to.
///
/// # Examples
/// ```
/// use rect_packer::types::Point;
///
/// let anchor = Point::new(2.0, 3.0);
/// let shifted = anchor + Point::new(1.0, 1.0);
/// assert_eq!(shifted, Point::new(3.0, 4.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Creates the origin point.
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Key used for exact structural de-duplication.
    ///
    /// `-0.0` and `0.0` map to the same key.
    #[inline]
    pub fn dedup_key(&self) -> (u64, u64) {
        ((self.x + 0.0).to_bits(), (self.y + 0.0).to_bits())
    }
}

impl Add for Point {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Which corner of a new rectangle sits on the anchor point.
///
/// The discriminants match the probe order used for concave corner detection:
/// `(+,+)`, `(-,+)`, `(+,-)`, `(-,-)`. The single free probe selects the
/// orientation, so the rectangle always grows into the free quadrant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnchorCorner {
    BottomLeft = 0,
    BottomRight = 1,
    TopLeft = 2,
    TopRight = 3,
}

impl AnchorCorner {
    /// All orientations in probe order.
    pub const ALL: [AnchorCorner; 4] = [
        AnchorCorner::BottomLeft,
        AnchorCorner::BottomRight,
        AnchorCorner::TopLeft,
        AnchorCorner::TopRight,
    ];

    /// Maps a probe index to its orientation.
    pub fn from_probe_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Offset from the anchor point to the rectangle origin for the given size.
    #[inline]
    pub fn origin_offset(self, width: f64, height: f64) -> Point {
        match self {
            AnchorCorner::BottomLeft => Point::zero(),
            AnchorCorner::BottomRight => Point::new(-width, 0.0),
            AnchorCorner::TopLeft => Point::new(0.0, -height),
            AnchorCorner::TopRight => Point::new(-width, -height),
        }
    }
}

/// Width and height of a container.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"w": 100.0, "h": 80.0}))]
pub struct Dimension {
    pub w: f64,
    pub h: f64,
}

impl Dimension {
    #[inline]
    pub const fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    /// Full area, margins not subtracted.
    #[inline]
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Grows both axes by `amount` on each side.
    #[inline]
    pub fn grown_by(&self, amount: f64) -> Self {
        Self::new(self.w + amount + amount, self.h + amount + amount)
    }
}

/// Insets applied to the container to obtain the usable play-field.
///
/// `top` insets the low-y side and `bottom` the high-y side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"top": 0.0, "right": 0.0, "bottom": 0.0, "left": 0.0}))]
pub struct Margin {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub right: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub left: f64,
}

impl Margin {
    #[inline]
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Same inset on every side.
    #[inline]
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    #[inline]
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    #[inline]
    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Axis-aligned bounds of the usable play-field (container minus margin).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayField {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl PlayField {
    pub fn new(size: Dimension, margin: Margin) -> Self {
        Self {
            min_x: margin.left,
            min_y: margin.top,
            max_x: size.w - margin.right,
            max_y: size.h - margin.bottom,
        }
    }

    /// The four play-field corners.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.min_x, self.max_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
        ]
    }

    /// True if the point lies on the play-field edge or outside it.
    #[inline]
    pub fn is_outside_or_on_edge(&self, point: Point) -> bool {
        point.x <= self.min_x
            || point.y <= self.min_y
            || self.max_x <= point.x
            || self.max_y <= point.y
    }
}
