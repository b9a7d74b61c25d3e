//! Rectangle packing with corner-occupying placements.
//!
//! Rectangles are packed into a fixed container by repeatedly anchoring one
//! of them at a concave corner of the current layout. The choice among all
//! such placements is made by a greedy completion with one-step lookahead.

pub mod api;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod optimizer;
pub mod types;

pub use error::{PackError, ValidationError};
pub use model::{PackReport, PackedRectangle, RectSpec};
pub use optimizer::{PackOptions, PackingConfig, SpecMatching, pack, pack_async};
pub use types::{Dimension, Margin};
