//! Data models for the rectangle packing service.
//!
//! This module defines the input and output structures of a packing run:
//! - `RectSpec`: A rectangle still to be packed (id, width, height)
//! - `PackedRectangle`: A rectangle as it appears in the final report
//! - `PackReport`: The packed/unpacked partition returned to the caller

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::error::ValidationError;
use crate::geometry::PlacedRect;
use crate::types::{Dimension, Margin};

/// Helper function to validate a single dimension.
pub(crate) fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Validates container dimensions.
pub(crate) fn validate_container(size: &Dimension) -> Result<(), ValidationError> {
    validate_dimension(size.w, "Container width")?;
    validate_dimension(size.h, "Container height")?;
    Ok(())
}

/// Validates that every margin inset is a non-negative finite number.
pub(crate) fn validate_margin(margin: &Margin) -> Result<(), ValidationError> {
    for (value, side) in [
        (margin.top, "top"),
        (margin.right, "right"),
        (margin.bottom, "bottom"),
        (margin.left, "left"),
    ] {
        if value < 0.0 || !value.is_finite() {
            return Err(ValidationError::InvalidMargin(format!(
                "{} margin must be zero or positive, got: {}",
                side, value
            )));
        }
    }
    Ok(())
}

pub(crate) fn validate_padding(padding: f64) -> Result<(), ValidationError> {
    if padding < 0.0 || !padding.is_finite() {
        return Err(ValidationError::InvalidPadding(format!(
            "Padding must be zero or positive, got: {}",
            padding
        )));
    }
    Ok(())
}

/// A rectangle that still has to be packed.
///
/// Identifiers are not required to be unique.
///
/// # Fields
/// * `id` - Caller supplied identifier
/// * `w` - Width in units
/// * `h` - Height in units
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"id": "sprite-1", "w": 32.0, "h": 16.0}))]
pub struct RectSpec {
    pub id: String,
    pub w: f64,
    pub h: f64,
}

impl RectSpec {
    /// Creates a new RectSpec with validation.
    ///
    /// # Examples
    /// ```
    /// use rect_packer::model::RectSpec;
    ///
    /// assert!(RectSpec::new("a", 10.0, 20.0).is_ok());
    /// assert!(RectSpec::new("a", -10.0, 20.0).is_err());
    /// ```
    pub fn new(id: impl Into<String>, w: f64, h: f64) -> Result<Self, ValidationError> {
        validate_dimension(w, "Width")?;
        validate_dimension(h, "Height")?;
        Ok(Self { id: id.into(), w, h })
    }

    /// Re-validates a spec that was built without going through `new`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimension(self.w, "Width")?;
        validate_dimension(self.h, "Height")
    }

    /// Copy grown by `padding` on every side.
    pub fn padded(&self, padding: f64) -> Self {
        Self {
            id: self.id.clone(),
            w: self.w + padding + padding,
            h: self.h + padding + padding,
        }
    }

    /// Checks whether the spec fits the container after margins, per axis and
    /// in its requested orientation.
    pub fn fits_unrotated(&self, container: &Dimension, margin: &Margin) -> bool {
        self.w + margin.horizontal() <= container.w && self.h + margin.vertical() <= container.h
    }
}

/// A rectangle entry in a packing report.
///
/// Unpacked entries carry their requested size, zero position and
/// `rotated = false`.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackedRectangle {
    pub id: String,
    pub w: f64,
    pub h: f64,
    pub x: f64,
    pub y: f64,
    pub rotated: bool,
}

impl PackedRectangle {
    /// Report entry for a placed rectangle built from its requested spec.
    ///
    /// `requested` is the unpadded spec the placement was made for. Its exact
    /// size is reported, swapped when the placement is rotated relative to it,
    /// so padding never leaves rounding residue in the output. The position is
    /// kept as placed.
    pub fn from_placed(rect: &PlacedRect, requested: &RectSpec, padding: f64) -> Self {
        let padded = requested.padded(padding);
        let rotated = if padded.w == padded.h {
            rect.rotated()
        } else {
            padded.w != rect.width() || padded.h != rect.height()
        };
        let (w, h) = if rotated {
            (requested.h, requested.w)
        } else {
            (requested.w, requested.h)
        };
        let origin = rect.origin();
        Self {
            id: rect.id().to_string(),
            w,
            h,
            x: origin.x,
            y: origin.y,
            rotated,
        }
    }

    /// Report entry for a spec that was never placed.
    pub fn unplaced(spec: &RectSpec) -> Self {
        Self {
            id: spec.id.clone(),
            w: spec.w,
            h: spec.h,
            x: 0.0,
            y: 0.0,
            rotated: false,
        }
    }
}

/// Requested (unpadded) specs of one run, handed out once each.
///
/// Placements and left-over specs are matched back by id and unordered padded
/// size. Padded sizes are recomputed with the same arithmetic that produced
/// them, so the comparison is exact.
#[derive(Debug)]
pub(crate) struct RequestedSpecs {
    padding: f64,
    pool: Vec<Option<RectSpec>>,
}

impl RequestedSpecs {
    pub(crate) fn new(specs: &[RectSpec], padding: f64) -> Self {
        Self {
            padding,
            pool: specs.iter().cloned().map(Some).collect(),
        }
    }

    /// Removes and returns the first requested spec with `id` whose padded
    /// size equals `w x h` in either orientation.
    pub(crate) fn take(&mut self, id: &str, w: f64, h: f64) -> Option<RectSpec> {
        let padding = self.padding;
        let slot = self.pool.iter_mut().find(|slot| {
            slot.as_ref().is_some_and(|spec| {
                let padded = spec.padded(padding);
                spec.id == id
                    && ((padded.w == w && padded.h == h) || (padded.w == h && padded.h == w))
            })
        })?;
        slot.take()
    }

    /// Report entry for a placement.
    pub(crate) fn report_placed(&mut self, rect: &PlacedRect) -> PackedRectangle {
        match self.take(rect.id(), rect.width(), rect.height()) {
            Some(requested) => PackedRectangle::from_placed(rect, &requested, self.padding),
            None => {
                tracing::warn!(rect = %rect, "⚠️ No requested spec for placement");
                let origin = rect.origin();
                PackedRectangle {
                    id: rect.id().to_string(),
                    w: rect.width() - self.padding - self.padding,
                    h: rect.height() - self.padding - self.padding,
                    x: origin.x,
                    y: origin.y,
                    rotated: rect.rotated(),
                }
            }
        }
    }

    /// Report entry for a left-over (padded) spec.
    pub(crate) fn report_unplaced(&mut self, spec: &RectSpec) -> PackedRectangle {
        match self.take(&spec.id, spec.w, spec.h) {
            Some(requested) => PackedRectangle::unplaced(&requested),
            None => {
                tracing::warn!(id = %spec.id, "⚠️ No requested spec for left-over rectangle");
                PackedRectangle {
                    w: spec.w - self.padding - self.padding,
                    h: spec.h - self.padding - self.padding,
                    ..PackedRectangle::unplaced(spec)
                }
            }
        }
    }
}

/// Counters collected while searching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct PackingDiagnostics {
    /// Placements committed to the authoritative layout.
    pub committed_steps: usize,
    /// Lookahead completions evaluated on disposable clones.
    pub lookahead_evaluations: usize,
    /// Packed area divided by full container area.
    pub density: f64,
    /// Whether the final layout was adopted from a complete lookahead.
    pub solved_by_lookahead: bool,
}

/// Result of a packing run.
///
/// # Fields
/// * `packed_rectangles` - Placed rectangles with final size and position
/// * `unpacked_rectangles` - Rectangles left over
/// * `is_remaining` - Whether any rectangle is left over
/// * `error` - Set only when the input was rejected by the fit pre-check
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PackReport {
    pub packed_rectangles: Vec<PackedRectangle>,
    pub unpacked_rectangles: Vec<PackedRectangle>,
    pub is_remaining: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub diagnostics: PackingDiagnostics,
}

impl PackReport {
    /// Report for input rejected before the search ran.
    pub fn rejected(rects: &[RectSpec], error: impl Into<String>) -> Self {
        Self {
            packed_rectangles: Vec::new(),
            unpacked_rectangles: rects.iter().map(PackedRectangle::unplaced).collect(),
            is_remaining: true,
            error: Some(error.into()),
            diagnostics: PackingDiagnostics::default(),
        }
    }

    pub fn packed_count(&self) -> usize {
        self.packed_rectangles.len()
    }

    pub fn unpacked_count(&self) -> usize {
        self.unpacked_rectangles.len()
    }

    pub fn is_complete(&self) -> bool {
        !self.is_remaining
    }
}
