//! Vertex lists and shapes.

use serde::{Deserialize, Serialize};

use super::HatchCodeId;

/// A point in archive units (Y axis pointing up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ArchivePoint {
    /// X coordinate.
    pub x: i64,
    /// Y coordinate.
    pub y: i64,
}

impl ArchivePoint {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// One step of a vertex list, ending at `end`.
///
/// The segment starts at the previous vertex's end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Vertex {
    /// Straight line (or the starting point of a list).
    Point {
        /// End point.
        end: ArchivePoint,
    },
    /// Clockwise arc about `center`.
    ClockwiseArc {
        /// End point.
        end: ArchivePoint,
        /// Arc centre.
        center: ArchivePoint,
    },
    /// Counter-clockwise arc about `center`.
    AnticlockwiseArc {
        /// End point.
        end: ArchivePoint,
        /// Arc centre.
        center: ArchivePoint,
    },
    /// Clockwise half circle; the centre is the midpoint of its end points.
    ClockwiseSemicircle {
        /// End point.
        end: ArchivePoint,
    },
    /// Counter-clockwise half circle.
    AnticlockwiseSemicircle {
        /// End point.
        end: ArchivePoint,
    },
}

impl Vertex {
    /// Creates a straight vertex.
    #[must_use]
    pub const fn point(x: i64, y: i64) -> Self {
        Self::Point {
            end: ArchivePoint::new(x, y),
        }
    }

    /// End point of the vertex.
    #[must_use]
    pub const fn end(&self) -> ArchivePoint {
        match self {
            Self::Point { end }
            | Self::ClockwiseArc { end, .. }
            | Self::AnticlockwiseArc { end, .. }
            | Self::ClockwiseSemicircle { end }
            | Self::AnticlockwiseSemicircle { end } => *end,
        }
    }

    /// Returns a copy of the vertex ending at `end`.
    #[must_use]
    pub const fn with_end(self, end: ArchivePoint) -> Self {
        match self {
            Self::Point { .. } => Self::Point { end },
            Self::ClockwiseArc { center, .. } => Self::ClockwiseArc { end, center },
            Self::AnticlockwiseArc { center, .. } => Self::AnticlockwiseArc { end, center },
            Self::ClockwiseSemicircle { .. } => Self::ClockwiseSemicircle { end },
            Self::AnticlockwiseSemicircle { .. } => Self::AnticlockwiseSemicircle { end },
        }
    }
}

/// How a shape is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Open polyline.
    Openshape,
    /// Closed, unfilled outline.
    Outline,
    /// Solid filled region.
    Solid,
    /// Hatch filled region.
    Hatched,
}

/// A shape: outline vertices plus optional cutouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    /// Drawing mode.
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    /// Outline vertices.
    pub vertices: Vec<Vertex>,
    /// Holes, each an independent vertex list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cutouts: Vec<Vec<Vertex>>,
    /// Hatch code for hatched shapes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hatch_code: Option<HatchCodeId>,
}

impl Shape {
    /// Creates a shape from a list of straight vertices.
    #[must_use]
    pub fn polygon(kind: ShapeKind, points: &[(i64, i64)]) -> Self {
        Self {
            kind,
            vertices: points.iter().map(|&(x, y)| Vertex::point(x, y)).collect(),
            cutouts: Vec::new(),
            hatch_code: None,
        }
    }
}
