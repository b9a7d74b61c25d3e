//! Geometric primitive for placed rectangles.
//!
//! A `PlacedRect` is an immutable axis-aligned rectangle. Its bounds and
//! corners are computed once at construction; every query afterwards is a pure
//! function of those values.

use crate::types::{AnchorCorner, Point};

/// Length of the gap between two intervals, 0.0 if they touch or overlap.
///
/// # Parameters
/// * `a1` - Start of the first interval
/// * `a2` - End of the first interval
/// * `b1` - Start of the second interval
/// * `b2` - End of the second interval
///
/// # Examples
/// ```
/// use rect_packer::geometry::gap_1d;
///
/// assert_eq!(gap_1d(0.0, 1.0, 3.0, 4.0), 2.0);
/// assert_eq!(gap_1d(0.0, 5.0, 3.0, 8.0), 0.0);
/// ```
pub fn gap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    let outer = a2.max(b2) - a1.min(b1);
    (outer - (a2 - a1) - (b2 - b1)).max(0.0)
}

/// A rectangle at an absolute position in the container.
///
/// # Fields
/// * `id` - Identifier of the spec this rectangle was built from
/// * `origin` - Corner with the smallest x and y
/// * `width` / `height` - Extent after an optional rotation
/// * `rotated` - Whether width and height were swapped relative to the spec
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedRect {
    id: String,
    origin: Point,
    width: f64,
    height: f64,
    rotated: bool,
    bottom: f64,
    top: f64,
    left: f64,
    right: f64,
}

impl PlacedRect {
    /// Builds a rectangle so that its `anchor_corner` lies on `anchor`.
    ///
    /// If `rotated` is set, `width` and `height` are swapped before the origin
    /// is derived from the anchor.
    ///
    /// # Examples
    /// ```
    /// use rect_packer::geometry::PlacedRect;
    /// use rect_packer::types::{AnchorCorner, Point};
    ///
    /// let rect = PlacedRect::anchored("a", Point::new(10.0, 10.0), 4.0, 2.0, AnchorCorner::TopRight, false);
    /// assert_eq!(rect.origin(), Point::new(6.0, 8.0));
    /// ```
    pub fn anchored(
        id: impl Into<String>,
        anchor: Point,
        width: f64,
        height: f64,
        anchor_corner: AnchorCorner,
        rotated: bool,
    ) -> Self {
        let (width, height) = if rotated {
            (height, width)
        } else {
            (width, height)
        };
        let origin = anchor + anchor_corner.origin_offset(width, height);

        Self {
            id: id.into(),
            origin,
            width,
            height,
            rotated,
            bottom: origin.y,
            top: origin.y + height,
            left: origin.x,
            right: origin.x + width,
        }
    }

    /// Builds an unrotated rectangle with its origin at `origin`.
    pub fn new(id: impl Into<String>, origin: Point, width: f64, height: f64) -> Self {
        Self::anchored(id, origin, width, height, AnchorCorner::BottomLeft, false)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn rotated(&self) -> bool {
        self.rotated
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Corners in the order bottom-left, top-left, top-right, bottom-right.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.bottom),
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
        ]
    }

    /// True if `(w, h)` equals this rectangle's size in either orientation.
    pub fn matches_size(&self, w: f64, h: f64) -> bool {
        (w == self.width && h == self.height) || (w == self.height && h == self.width)
    }

    /// Checks whether a point lies inside the rectangle, edges included.
    pub fn contains(&self, point: Point) -> bool {
        self.left <= point.x
            && self.bottom <= point.y
            && point.x <= self.right
            && point.y <= self.top
    }

    /// Checks whether two rectangles share a region of positive area.
    ///
    /// Rectangles that only touch along an edge do not overlap.
    pub fn overlaps(&self, other: &PlacedRect) -> bool {
        !(self.right <= other.left
            || other.right <= self.left
            || self.top <= other.bottom
            || other.top <= self.bottom)
    }

    /// Shortest distance between the outlines of two rectangles.
    ///
    /// Returns 0.0 for touching or overlapping rectangles.
    pub fn gap_distance(&self, other: &PlacedRect) -> f64 {
        let gap_x = gap_1d(self.left, self.right, other.left, other.right);
        let gap_y = gap_1d(self.bottom, self.top, other.bottom, other.top);
        gap_x.hypot(gap_y)
    }
}

impl std::fmt::Display for PlacedRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at ({}, {}) w={} h={} rotated={}",
            self.id, self.origin.x, self.origin.y, self.width, self.height, self.rotated
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> PlacedRect {
        PlacedRect::new("r", Point::new(x, y), w, h)
    }

    #[test]
    fn edge_touching_rects_do_not_overlap() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(2.0, 0.0, 2.0, 2.0);
        let c = rect(0.0, 2.0, 2.0, 2.0);

        assert!(!a.overlaps(&b), "shared vertical edge must not count as overlap");
        assert!(!b.overlaps(&a));
        assert!(!a.overlaps(&c), "shared horizontal edge must not count as overlap");
        assert!(!rect(2.0, 2.0, 1.0, 1.0).overlaps(&a), "corner contact is not overlap");
    }

    #[test]
    fn positive_area_intersection_overlaps() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(1.0, 1.0, 2.0, 2.0);
        let inner = rect(0.5, 0.5, 0.5, 0.5);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(a.overlaps(&inner));
    }

    #[test]
    fn gap_distance_uses_box_corner_distance() {
        // Nearest corners are (1, 1) and (3, 4): gaps of 2 and 3.
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(3.0, 4.0, 1.0, 1.0);
        let expected = 13.0_f64.sqrt();

        assert!((a.gap_distance(&b) - expected).abs() < 1e-12);
        assert!((b.gap_distance(&a) - expected).abs() < 1e-12);

        let c = rect(4.0, 5.0, 1.0, 1.0);
        assert!((a.gap_distance(&c) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn gap_distance_is_zero_for_touching_or_overlapping() {
        let a = rect(0.0, 0.0, 2.0, 2.0);

        assert_eq!(a.gap_distance(&rect(2.0, 0.0, 1.0, 1.0)), 0.0);
        assert_eq!(a.gap_distance(&rect(1.0, 1.0, 3.0, 3.0)), 0.0);
    }

    #[test]
    fn gap_distance_with_shared_extent_is_axis_gap() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(5.0, 1.0, 2.0, 2.0);

        assert_eq!(a.gap_distance(&b), 3.0);
    }

    #[test]
    fn contains_is_inclusive_on_edges() {
        let a = rect(1.0, 1.0, 2.0, 3.0);

        assert!(a.contains(Point::new(1.0, 1.0)));
        assert!(a.contains(Point::new(3.0, 4.0)));
        assert!(a.contains(Point::new(2.0, 2.0)));
        assert!(!a.contains(Point::new(3.001, 2.0)));
        assert!(!a.contains(Point::new(2.0, 0.999)));
    }

    #[test]
    fn anchored_places_named_corner_on_anchor() {
        let anchor = Point::new(10.0, 10.0);
        let cases = [
            (AnchorCorner::BottomLeft, Point::new(10.0, 10.0)),
            (AnchorCorner::BottomRight, Point::new(6.0, 10.0)),
            (AnchorCorner::TopLeft, Point::new(10.0, 8.0)),
            (AnchorCorner::TopRight, Point::new(6.0, 8.0)),
        ];

        for (corner, expected) in cases {
            let r = PlacedRect::anchored("a", anchor, 4.0, 2.0, corner, false);
            assert_eq!(r.origin(), expected, "wrong origin for {:?}", corner);
        }
    }

    #[test]
    fn rotation_swaps_before_anchoring() {
        let r = PlacedRect::anchored(
            "a",
            Point::new(10.0, 10.0),
            4.0,
            2.0,
            AnchorCorner::TopRight,
            true,
        );

        assert!(r.rotated());
        assert_eq!(r.width(), 2.0);
        assert_eq!(r.height(), 4.0);
        assert_eq!(r.origin(), Point::new(8.0, 6.0));
        assert!(r.matches_size(4.0, 2.0));
        assert!(r.matches_size(2.0, 4.0));
        assert!(!r.matches_size(2.0, 2.0));
    }

    #[test]
    fn corners_follow_fixed_order() {
        let r = rect(1.0, 2.0, 3.0, 4.0);

        assert_eq!(
            r.corners(),
            [
                Point::new(1.0, 2.0),
                Point::new(1.0, 6.0),
                Point::new(4.0, 6.0),
                Point::new(4.0, 2.0),
            ]
        );
        assert_eq!((r.bottom(), r.top(), r.left(), r.right()), (2.0, 6.0, 1.0, 4.0));
        assert_eq!(r.area(), 12.0);
    }
}
