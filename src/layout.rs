//! Layout state for one packing attempt.
//!
//! `LayoutState` keeps the partition of the input into packed and unpacked
//! rectangles and derives from it the complete list of corner-occupying
//! candidate placements. The candidate list always belongs to exactly the
//! state it was generated from and is rebuilt after every commit.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::PackError;
use crate::geometry::PlacedRect;
use crate::model::RectSpec;
use crate::optimizer::{PackingConfig, SpecMatching};
use crate::types::{AnchorCorner, Dimension, Margin, PlayField, Point};

/// Packed/unpacked partition plus the candidate placements derived from it.
///
/// Cloning is cheap for placed rectangles: they are immutable and shared via
/// `Arc`, so a clone can be mutated for lookahead without touching the source.
#[derive(Clone, Debug)]
pub struct LayoutState {
    size: Dimension,
    field: PlayField,
    config: PackingConfig,
    unpacked: Vec<RectSpec>,
    packed: Vec<Arc<PlacedRect>>,
    candidates: Vec<Arc<PlacedRect>>,
    concave_corners: Vec<(Point, AnchorCorner)>,
}

impl LayoutState {
    /// Creates an empty layout and generates its first candidate list.
    ///
    /// # Parameters
    /// * `size` - Full container size
    /// * `margin` - Insets defining the play-field
    /// * `unpacked` - Rectangles to pack, in input order
    /// * `config` - Tolerance, rotation and spec-matching settings
    pub fn new(
        size: Dimension,
        margin: Margin,
        unpacked: Vec<RectSpec>,
        config: PackingConfig,
    ) -> Self {
        let mut state = Self {
            size,
            field: PlayField::new(size, margin),
            config,
            unpacked,
            packed: Vec::new(),
            candidates: Vec::new(),
            concave_corners: Vec::new(),
        };
        state.generate_candidates();
        state
    }

    pub fn size(&self) -> Dimension {
        self.size
    }

    pub fn unpacked(&self) -> &[RectSpec] {
        &self.unpacked
    }

    pub fn packed(&self) -> &[Arc<PlacedRect>] {
        &self.packed
    }

    /// Candidate placements valid for the current partition.
    pub fn candidates(&self) -> &[Arc<PlacedRect>] {
        &self.candidates
    }

    /// Concave corners found by the last candidate generation.
    pub fn cached_concave_corners(&self) -> &[(Point, AnchorCorner)] {
        &self.concave_corners
    }

    /// True if every rectangle has been placed.
    pub fn is_complete(&self) -> bool {
        self.unpacked.is_empty()
    }

    /// Packed area divided by the full container area (margin not subtracted).
    pub fn density(&self) -> f64 {
        let occupied: f64 = self.packed.iter().map(|r| r.area()).sum();
        occupied / self.size.area()
    }

    /// True if the point is on or beyond the play-field edge, or inside any
    /// placed rectangle (edges included).
    pub fn is_blocked(&self, point: Point) -> bool {
        self.field.is_outside_or_on_edge(point) || self.packed.iter().any(|r| r.contains(point))
    }

    /// Play-field corners followed by every placed rectangle's corners,
    /// de-duplicated by exact coordinate equality, first occurrence kept.
    pub fn corner_points(&self) -> Vec<Point> {
        let mut seen = HashSet::new();
        self.field
            .corners()
            .into_iter()
            .chain(self.packed.iter().flat_map(|r| r.corners()))
            .filter(|p| seen.insert(p.dedup_key()))
            .collect()
    }

    /// Classifies a corner point.
    ///
    /// Probes the four diagonal neighbours in the order `(+,+)`, `(-,+)`,
    /// `(+,-)`, `(-,-)`. The point is concave iff exactly three probes are
    /// blocked; the free probe picks the anchor orientation.
    pub fn corner_type(&self, point: Point) -> Option<AnchorCorner> {
        let eps = self.config.corner_epsilon;
        let probes = [
            Point::new(point.x + eps, point.y + eps),
            Point::new(point.x - eps, point.y + eps),
            Point::new(point.x + eps, point.y - eps),
            Point::new(point.x - eps, point.y - eps),
        ];
        let blocked = probes.map(|p| self.is_blocked(p));

        if blocked.iter().filter(|&&b| b).count() != 3 {
            return None;
        }
        blocked
            .iter()
            .position(|&b| !b)
            .and_then(AnchorCorner::from_probe_index)
    }

    /// All concave corners of the current layout with their anchor orientation.
    pub fn concave_corners(&self) -> Vec<(Point, AnchorCorner)> {
        self.corner_points()
            .into_iter()
            .filter_map(|p| self.corner_type(p).map(|anchor| (p, anchor)))
            .collect()
    }

    /// Checks a candidate against the play-field bounds and placed rectangles.
    ///
    /// Margins only restrict the bounds; placed rectangles may touch flush.
    pub fn fits(&self, candidate: &PlacedRect) -> bool {
        if candidate.left() < self.field.min_x
            || candidate.bottom() < self.field.min_y
            || self.field.max_x < candidate.right()
            || self.field.max_y < candidate.top()
        {
            return false;
        }
        !self.packed.iter().any(|r| candidate.overlaps(r))
    }

    /// Rebuilds the concave corner cache and the full candidate list.
    pub fn generate_candidates(&mut self) {
        self.concave_corners = self.concave_corners();

        let orientations: &[bool] = if self.config.allow_rotation {
            &[false, true]
        } else {
            &[false]
        };

        let mut candidates = Vec::new();
        for spec in &self.unpacked {
            for &(corner, anchor) in &self.concave_corners {
                for &rotated in orientations {
                    let candidate = PlacedRect::anchored(
                        spec.id.clone(),
                        corner,
                        spec.w,
                        spec.h,
                        anchor,
                        rotated,
                    );
                    if self.fits(&candidate) {
                        candidates.push(Arc::new(candidate));
                    }
                }
            }
        }
        self.candidates = candidates;
    }

    /// Places `rect`, removes its spec from the unpacked list and regenerates
    /// the candidates.
    ///
    /// Which spec is removed depends on `SpecMatching`: the first one with the
    /// same size in either orientation, or the first one that also carries the
    /// same id. In the first case a different removed id is handed over to the
    /// spec the placement was built from.
    pub fn commit(&mut self, rect: Arc<PlacedRect>) -> Result<(), PackError> {
        let index = self.unpacked.iter().position(|spec| {
            rect.matches_size(spec.w, spec.h)
                && match self.config.spec_matching {
                    SpecMatching::Dimensions => true,
                    SpecMatching::Identity => spec.id == rect.id(),
                }
        });

        match index {
            Some(index) => {
                let removed = self.unpacked.remove(index);
                if removed.id != rect.id() {
                    self.hand_over_id(&rect, removed.id);
                }
            }
            None if self.config.spec_matching == SpecMatching::Identity => {
                return Err(PackError::UnmatchedPlacement {
                    id: rect.id().to_string(),
                    width: rect.width(),
                    height: rect.height(),
                });
            }
            None => {}
        }

        self.packed.push(rect);
        self.generate_candidates();
        Ok(())
    }

    /// Renames the first unpacked spec `rect` was built from to `id`.
    fn hand_over_id(&mut self, rect: &PlacedRect, id: String) {
        if let Some(source) = self
            .unpacked
            .iter_mut()
            .find(|spec| spec.id == rect.id() && rect.matches_size(spec.w, spec.h))
        {
            source.id = id;
        }
    }

    /// Splits the state into its placed and left-over rectangles.
    pub fn into_parts(self) -> (Vec<Arc<PlacedRect>>, Vec<RectSpec>) {
        (self.packed, self.unpacked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, w: f64, h: f64) -> RectSpec {
        RectSpec::new(id, w, h).unwrap()
    }

    fn state(w: f64, h: f64, margin: Margin, specs: Vec<RectSpec>) -> LayoutState {
        LayoutState::new(Dimension::new(w, h), margin, specs, PackingConfig::default())
    }

    fn placed(id: &str, x: f64, y: f64, w: f64, h: f64) -> Arc<PlacedRect> {
        Arc::new(PlacedRect::new(id, Point::new(x, y), w, h))
    }

    #[test]
    fn empty_layout_has_exactly_the_play_field_corners() {
        let layout = state(10.0, 10.0, Margin::new(1.0, 2.0, 3.0, 4.0), vec![]);

        assert_eq!(
            layout.concave_corners(),
            vec![
                (Point::new(4.0, 1.0), AnchorCorner::BottomLeft),
                (Point::new(4.0, 7.0), AnchorCorner::TopLeft),
                (Point::new(8.0, 1.0), AnchorCorner::BottomRight),
                (Point::new(8.0, 7.0), AnchorCorner::TopRight),
            ]
        );
    }

    #[test]
    fn placed_rect_adds_concave_corners_along_its_free_sides() {
        let mut layout = state(10.0, 10.0, Margin::default(), vec![spec("a", 4.0, 4.0)]);
        let first = layout.candidates()[0].clone();
        assert_eq!(first.origin(), Point::zero());
        layout.commit(first).unwrap();

        let corners = layout.concave_corners();
        assert!(corners.contains(&(Point::new(4.0, 0.0), AnchorCorner::BottomLeft)));
        assert!(corners.contains(&(Point::new(0.0, 4.0), AnchorCorner::BottomLeft)));
        assert!(
            !corners.iter().any(|(p, _)| *p == Point::zero()),
            "filled container corner is enclosed"
        );
        assert!(
            !corners.iter().any(|(p, _)| *p == Point::new(4.0, 4.0)),
            "convex corner of a placed rect is not concave"
        );
        assert_eq!(layout.cached_concave_corners(), corners.as_slice());
    }

    #[test]
    fn corner_points_are_deduplicated() {
        let mut layout = state(
            4.0,
            2.0,
            Margin::default(),
            vec![spec("a", 2.0, 2.0), spec("b", 2.0, 2.0)],
        );
        layout.commit(placed("a", 0.0, 0.0, 2.0, 2.0)).unwrap();
        layout.commit(placed("b", 2.0, 0.0, 2.0, 2.0)).unwrap();

        let points = layout.corner_points();
        assert_eq!(points.len(), 6, "shared corners must appear once: {:?}", points);
    }

    #[test]
    fn fits_respects_margin_bounds_and_overlap() {
        let mut layout = state(
            10.0,
            10.0,
            Margin::uniform(1.0),
            vec![spec("a", 3.0, 3.0), spec("b", 3.0, 3.0)],
        );

        assert!(layout.fits(&PlacedRect::new("x", Point::new(1.0, 1.0), 8.0, 8.0)));
        assert!(!layout.fits(&PlacedRect::new("x", Point::new(0.5, 1.0), 3.0, 3.0)));
        assert!(!layout.fits(&PlacedRect::new("x", Point::new(7.0, 1.0), 3.0, 3.0)));
        assert!(!layout.fits(&PlacedRect::new("x", Point::new(1.0, 6.5), 3.0, 3.0)));

        layout.commit(placed("a", 1.0, 1.0, 3.0, 3.0)).unwrap();
        assert!(layout.fits(&PlacedRect::new("x", Point::new(4.0, 1.0), 3.0, 3.0)));
        assert!(!layout.fits(&PlacedRect::new("x", Point::new(3.0, 1.0), 3.0, 3.0)));
    }

    #[test]
    fn candidates_cover_both_orientations_unless_disabled() {
        let specs = vec![spec("a", 2.0, 1.0)];
        let rotating = state(10.0, 10.0, Margin::default(), specs.clone());
        let fixed = LayoutState::new(
            Dimension::new(10.0, 10.0),
            Margin::default(),
            specs,
            PackingConfig::builder().allow_rotation(false).build(),
        );

        assert_eq!(rotating.candidates().len(), 8);
        assert_eq!(fixed.candidates().len(), 4);
        assert!(fixed.candidates().iter().all(|c| !c.rotated()));
    }

    #[test]
    fn candidates_that_do_not_fit_are_dropped() {
        let layout = state(5.0, 5.0, Margin::default(), vec![spec("big", 6.0, 6.0)]);

        assert!(layout.candidates().is_empty());
        assert_eq!(layout.concave_corners().len(), 4);
    }

    #[test]
    fn commit_moves_spec_from_unpacked_to_packed() {
        let mut layout = state(
            4.0,
            2.0,
            Margin::default(),
            vec![spec("a", 2.0, 2.0), spec("b", 2.0, 2.0)],
        );
        layout.commit(placed("a", 0.0, 0.0, 2.0, 2.0)).unwrap();

        assert_eq!(layout.packed().len(), 1);
        assert_eq!(layout.unpacked().len(), 1);
        assert!((layout.density() - 0.5).abs() < 1e-12);
        assert!(!layout.is_complete());
        assert!(
            layout.candidates().iter().all(|c| c.origin() == Point::new(2.0, 0.0)),
            "only the remaining slot is a legal placement"
        );
    }

    fn identity_state(specs: Vec<RectSpec>) -> LayoutState {
        LayoutState::new(
            Dimension::new(10.0, 10.0),
            Margin::default(),
            specs,
            PackingConfig::builder()
                .spec_matching(SpecMatching::Identity)
                .build(),
        )
    }

    #[test]
    fn dimension_matching_removes_first_spec_of_equal_size() {
        let specs = vec![spec("a", 2.0, 3.0), spec("b", 3.0, 2.0), spec("c", 1.0, 1.0)];
        let mut layout = state(10.0, 10.0, Margin::default(), specs);
        layout.commit(placed("b", 0.0, 0.0, 3.0, 2.0)).unwrap();

        let left: Vec<(&str, f64, f64)> = layout
            .unpacked()
            .iter()
            .map(|s| (s.id.as_str(), s.w, s.h))
            .collect();
        assert_eq!(
            left,
            vec![("a", 3.0, 2.0), ("c", 1.0, 1.0)],
            "slot keeps its size, the removed id moves onto it"
        );
    }

    #[test]
    fn identity_matching_removes_the_spec_with_the_same_id() {
        let specs = vec![spec("a", 2.0, 3.0), spec("b", 3.0, 2.0)];
        let mut layout = identity_state(specs);
        layout.commit(placed("b", 0.0, 0.0, 3.0, 2.0)).unwrap();

        assert_eq!(layout.unpacked()[0].id, "a");
        assert_eq!((layout.unpacked()[0].w, layout.unpacked()[0].h), (2.0, 3.0));
    }

    #[test]
    fn identity_matching_reports_unknown_placements() {
        let mut layout = identity_state(vec![spec("a", 2.0, 3.0)]);
        let err = layout
            .commit(placed("ghost", 0.0, 0.0, 2.0, 3.0))
            .expect_err("ghost has no spec");

        assert!(matches!(err, PackError::UnmatchedPlacement { .. }));
        assert!(layout.packed().is_empty());
    }

    #[test]
    fn clone_is_independent() {
        let layout = state(
            4.0,
            2.0,
            Margin::default(),
            vec![spec("a", 2.0, 2.0), spec("b", 2.0, 2.0)],
        );
        let mut copy = layout.clone();
        let candidate = copy.candidates()[0].clone();
        copy.commit(candidate).unwrap();

        assert!(layout.packed().is_empty());
        assert_eq!(layout.unpacked().len(), 2);
        assert_eq!(copy.packed().len(), 1);
        assert_ne!(layout.candidates().len(), copy.candidates().len());
    }
}
