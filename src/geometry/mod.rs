//! Planar geometry in host units.
//!
//! Everything here is a pure function of its inputs. The import engine uses
//! these types to rebuild outlines, tracks and fills from foreign vertex lists.

mod point;
mod polygon;
mod segment;
mod transform;

pub use point::{normalize_angle_180, normalize_angle_neg, normalize_angle_pos, round, Point};
pub use polygon::{capsule, circle, rectangle, stroke, LineChain, PolySet, Polygon};
pub use segment::{arc_point, arc_steps, Segment};
pub use transform::Transform;

use thiserror::Error;

/// Errors raised while reconstructing geometry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// A closed outline resolved to fewer than three distinct points.
    #[error("outline has {points} distinct point(s); at least 3 are required")]
    Degenerate {
        /// Number of distinct points found.
        points: usize,
    },
}
