//! Placement search for rectangle packing.
//!
//! This module implements the corner-occupying heuristic:
//! - A local score rating how tightly a candidate nestles into the layout
//! - A purely greedy completion driven by that score
//! - A one-step lookahead that runs the greedy completion for every candidate
//!   and commits the one with the best resulting density
//!
//! The search is single threaded and deterministic for a fixed input order.
//! `pack_async` moves it off the caller's task onto tokio's blocking pool.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{PackError, ValidationError};
use crate::geometry::PlacedRect;
use crate::layout::LayoutState;
use crate::model::{
    PackReport, PackingDiagnostics, RectSpec, RequestedSpecs, validate_container, validate_margin,
    validate_padding,
};
use crate::types::{DEFAULT_CORNER_EPSILON, Dimension, Margin};

/// Error text reported when the fit pre-check rejects the input.
pub const EXCEEDS_CONTAINER_ERROR: &str =
    "Some rectangles exceed available container width or height";

/// How a committed placement is matched back to its unpacked spec.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpecMatching {
    /// First unpacked spec with the same size in either orientation.
    ///
    /// If that spec carries a different id, the committed id is handed over to
    /// it, so every id still ends up exactly once in the result.
    Dimensions,
    /// First unpacked spec with the same id and size.
    ///
    /// Removes a different slot than `Dimensions` when equally sized specs
    /// exist, which changes later candidate order and therefore the layout.
    Identity,
}

impl SpecMatching {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dimensions" | "dims" | "size" => Some(Self::Dimensions),
            "identity" | "id" => Some(Self::Identity),
            _ => None,
        }
    }
}

/// Configuration for the packing search.
#[derive(Copy, Clone, Debug)]
pub struct PackingConfig {
    /// Probe distance used to classify corner points
    pub corner_epsilon: f64,
    /// Whether candidates are also generated with width and height swapped
    pub allow_rotation: bool,
    /// Rule for removing a committed rectangle from the unpacked list
    pub spec_matching: SpecMatching,
}

impl PackingConfig {
    pub const DEFAULT_CORNER_EPSILON: f64 = DEFAULT_CORNER_EPSILON;
    pub const DEFAULT_ALLOW_ROTATION: bool = true;
    pub const DEFAULT_SPEC_MATCHING: SpecMatching = SpecMatching::Dimensions;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.corner_epsilon <= 0.0 || !self.corner_epsilon.is_finite() {
            return Err(ValidationError::InvalidConfiguration(format!(
                "corner epsilon must be positive, got: {}",
                self.corner_epsilon
            )));
        }
        Ok(())
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            corner_epsilon: Self::DEFAULT_CORNER_EPSILON,
            allow_rotation: Self::DEFAULT_ALLOW_ROTATION,
            spec_matching: Self::DEFAULT_SPEC_MATCHING,
        }
    }
}

/// Builder for PackingConfig.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    /// Sets the corner probe distance.
    pub fn corner_epsilon(mut self, epsilon: f64) -> Self {
        self.config.corner_epsilon = epsilon;
        self
    }

    /// Enables or disables rotated candidates.
    pub fn allow_rotation(mut self, allow: bool) -> Self {
        self.config.allow_rotation = allow;
        self
    }

    /// Sets the spec matching rule.
    pub fn spec_matching(mut self, matching: SpecMatching) -> Self {
        self.config.spec_matching = matching;
        self
    }

    /// Builds the final configuration.
    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Per-call options.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PackOptions {
    /// Grows every rectangle and the container before packing; removed from
    /// reported sizes afterwards.
    pub padding: f64,
    /// Insets of the usable play-field.
    pub margin: Margin,
    /// Disables rotated candidates regardless of the configuration.
    pub no_rotation: bool,
}

/// Events emitted while packing, for live visualization.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// Packing has begun.
    Started { rects: usize, container: Dimension },
    /// A rectangle was committed to the final layout.
    RectPlaced {
        id: String,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        rotated: bool,
        remaining: usize,
    },
    /// A lookahead produced a complete layout that was adopted.
    SolutionFound { placed: usize },
    /// The input was rejected by the fit pre-check.
    Rejected { error: String },
    /// Packing has ended.
    Finished { packed: usize, unpacked: usize },
}

/// Outcome of a lookahead evaluation.
#[derive(Debug)]
pub enum Lookahead {
    /// The greedy completion placed every rectangle.
    Complete(LayoutState),
    /// Density reached by the greedy completion.
    Density(f64),
}

/// Greedy search with one-step lookahead over corner-occupying candidates.
#[derive(Debug, Default)]
pub struct Packer {
    diagnostics: PackingDiagnostics,
}

impl Packer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters of the runs performed by this packer so far.
    pub fn diagnostics(&self) -> PackingDiagnostics {
        self.diagnostics
    }

    /// Rates how tightly `candidate` nestles against placed rectangles and the
    /// container edges. Higher is tighter.
    ///
    /// Collects the gap to every placed rectangle and to each of the four raw
    /// container edges, drops the two smallest values (the two contacts every
    /// corner placement has) and compares the next smallest to the mean side
    /// length of the candidate.
    pub fn local_score(candidate: &PlacedRect, state: &LayoutState) -> f64 {
        // Edge distances use the raw container, not the margin-inset play-field.
        let size = state.size();
        let mut distances: Vec<f64> = state
            .packed()
            .iter()
            .map(|placed| candidate.gap_distance(placed))
            .collect();
        distances.extend([
            candidate.bottom(),
            candidate.left(),
            size.h - candidate.top(),
            size.w - candidate.right(),
        ]);
        distances.sort_by(f64::total_cmp);

        let third_nearest = distances[2];
        1.0 - third_nearest / ((candidate.width() + candidate.height()) / 2.0)
    }

    /// Commits the best scoring candidate until none are left.
    ///
    /// Ties go to the earliest candidate in list order.
    pub fn greedy_fill(&mut self, mut state: LayoutState) -> Result<LayoutState, PackError> {
        while let Some(best) = best_by_score(&state) {
            state.commit(best)?;
        }
        Ok(state)
    }

    /// Commits `candidate` to `state` and completes it greedily.
    pub fn lookahead_benefit(
        &mut self,
        candidate: Arc<PlacedRect>,
        mut state: LayoutState,
    ) -> Result<Lookahead, PackError> {
        self.diagnostics.lookahead_evaluations += 1;
        state.commit(candidate)?;
        let state = self.greedy_fill(state)?;

        if state.is_complete() {
            Ok(Lookahead::Complete(state))
        } else {
            Ok(Lookahead::Density(state.density()))
        }
    }

    /// Runs the search to termination.
    ///
    /// See `run_with_progress`.
    pub fn run(&mut self, state: LayoutState) -> Result<LayoutState, PackError> {
        self.run_with_progress(state, |_| {})
    }

    /// Runs the search and reports every real commit.
    ///
    /// Each step evaluates every candidate on a fresh clone. The first clone
    /// that completes is returned as the final layout. Otherwise the candidate
    /// with the strictly highest density is committed to the real state and
    /// the next step starts from scratch. A partial layout is a normal result.
    pub fn run_with_progress(
        &mut self,
        mut state: LayoutState,
        mut on_event: impl FnMut(&PackEvent),
    ) -> Result<LayoutState, PackError> {
        while !state.candidates().is_empty() {
            let mut max_benefit = 0.0;
            let mut best: Option<Arc<PlacedRect>> = None;

            for candidate in state.candidates() {
                match self.lookahead_benefit(candidate.clone(), state.clone())? {
                    Lookahead::Complete(solved) => {
                        tracing::info!(
                            placed = solved.packed().len(),
                            "✅ Lookahead found a complete layout"
                        );
                        self.diagnostics.solved_by_lookahead = true;
                        self.diagnostics.density = solved.density();
                        on_event(&PackEvent::SolutionFound {
                            placed: solved.packed().len(),
                        });
                        return Ok(solved);
                    }
                    Lookahead::Density(density) => {
                        if max_benefit < density {
                            max_benefit = density;
                            best = Some(candidate.clone());
                        }
                    }
                }
            }

            let Some(best) = best else {
                break;
            };
            state.commit(best.clone())?;
            self.diagnostics.committed_steps += 1;
            tracing::debug!(
                rect = %best,
                benefit = max_benefit,
                remaining = state.unpacked().len(),
                "Committed placement"
            );
            let origin = best.origin();
            on_event(&PackEvent::RectPlaced {
                id: best.id().to_string(),
                x: origin.x,
                y: origin.y,
                w: best.width(),
                h: best.height(),
                rotated: best.rotated(),
                remaining: state.unpacked().len(),
            });
        }

        self.diagnostics.density = state.density();
        Ok(state)
    }
}

/// Candidate with the highest local score, first one on ties.
fn best_by_score(state: &LayoutState) -> Option<Arc<PlacedRect>> {
    let mut best: Option<(f64, &Arc<PlacedRect>)> = None;
    for candidate in state.candidates() {
        let score = Packer::local_score(candidate, state);
        match best {
            Some((best_score, _)) if score <= best_score => {}
            _ => best = Some((score, candidate)),
        }
    }
    best.map(|(_, candidate)| candidate.clone())
}

/// Checks whether any rectangle's width or height, plus the margins, exceeds
/// the matching container dimension.
///
/// Only the requested orientation is checked, even when rotation is allowed.
pub fn exceeds_container(rects: &[RectSpec], container: &Dimension, margin: &Margin) -> bool {
    rects
        .iter()
        .any(|rect| !rect.fits_unrotated(container, margin))
}

fn validate_request(
    rects: &[RectSpec],
    container: &Dimension,
    options: &PackOptions,
    config: &PackingConfig,
) -> Result<(), ValidationError> {
    validate_container(container)?;
    validate_margin(&options.margin)?;
    validate_padding(options.padding)?;
    config.validate()?;
    rects.iter().try_for_each(RectSpec::validate)
}

/// Packs `rects` into `container`.
///
/// See `pack_with_progress`.
pub fn pack(
    rects: Vec<RectSpec>,
    container: Dimension,
    options: PackOptions,
    config: PackingConfig,
) -> Result<PackReport, PackError> {
    pack_with_progress(rects, container, options, config, |_| {})
}

/// Packs `rects` into `container` and reports progress events.
///
/// # Parameters
/// * `rects` - Rectangles to pack, in input order
/// * `container` - Container size before padding
/// * `options` - Padding, margin and rotation override
/// * `config` - Search configuration
/// * `on_event` - Callback for each progress event
///
/// # Returns
/// `Err` only for invalid input or an internal inconsistency. Rectangles that
/// cannot be placed are listed as unpacked.
pub fn pack_with_progress(
    rects: Vec<RectSpec>,
    container: Dimension,
    options: PackOptions,
    config: PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> Result<PackReport, PackError> {
    validate_request(&rects, &container, &options, &config)?;

    let mut config = config;
    if options.no_rotation {
        config.allow_rotation = false;
    }

    on_event(&PackEvent::Started {
        rects: rects.len(),
        container,
    });

    if exceeds_container(&rects, &container, &options.margin) {
        tracing::warn!(
            rects = rects.len(),
            container_w = container.w,
            container_h = container.h,
            "⚠️ Rejected input: {}",
            EXCEEDS_CONTAINER_ERROR
        );
        on_event(&PackEvent::Rejected {
            error: EXCEEDS_CONTAINER_ERROR.to_string(),
        });
        on_event(&PackEvent::Finished {
            packed: 0,
            unpacked: rects.len(),
        });
        return Ok(PackReport::rejected(&rects, EXCEEDS_CONTAINER_ERROR));
    }

    let padding = options.padding;
    let mut requested = RequestedSpecs::new(&rects, padding);
    let (rects, container): (Vec<RectSpec>, Dimension) = if padding > 0.0 {
        (
            rects.iter().map(|r| r.padded(padding)).collect(),
            container.grown_by(padding),
        )
    } else {
        (rects, container)
    };

    let state = LayoutState::new(container, options.margin, rects, config);
    let mut packer = Packer::new();
    let state = packer.run_with_progress(state, &mut on_event)?;
    let diagnostics = packer.diagnostics();

    let (packed, unpacked) = state.into_parts();
    on_event(&PackEvent::Finished {
        packed: packed.len(),
        unpacked: unpacked.len(),
    });

    Ok(PackReport {
        packed_rectangles: packed
            .iter()
            .map(|r| requested.report_placed(r))
            .collect(),
        is_remaining: !unpacked.is_empty(),
        unpacked_rectangles: unpacked
            .iter()
            .map(|r| requested.report_unplaced(r))
            .collect(),
        error: None,
        diagnostics,
    })
}

/// Packs on tokio's blocking pool so the calling task is never blocked.
pub async fn pack_async(
    rects: Vec<RectSpec>,
    container: Dimension,
    options: PackOptions,
    config: PackingConfig,
) -> Result<PackReport, PackError> {
    tokio::task::spawn_blocking(move || pack(rects, container, options, config))
        .await
        .map_err(|err| PackError::Task(err.to_string()))?
}
