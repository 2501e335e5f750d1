//! Line and arc primitives.

use serde::{Deserialize, Serialize};

use super::point::{round, Point};
use super::transform::Transform;

/// A straight or circular primitive between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    /// Straight line.
    Line {
        /// Start point.
        start: Point,
        /// End point.
        end: Point,
    },
    /// Circular arc.
    Arc {
        /// Arc centre.
        center: Point,
        /// Start point.
        start: Point,
        /// End point.
        end: Point,
        /// Signed sweep in degrees, measured in the same sense as [`Point::angle`].
        sweep: f64,
    },
}

impl Segment {
    /// Creates a straight line.
    #[must_use]
    pub const fn line(start: Point, end: Point) -> Self {
        Self::Line { start, end }
    }

    /// Creates an arc from its centre, start point and signed sweep.
    #[must_use]
    pub fn arc(center: Point, start: Point, sweep: f64) -> Self {
        let end = arc_point(center, start, sweep);
        Self::Arc {
            center,
            start,
            end,
            sweep,
        }
    }

    /// Start point.
    #[must_use]
    pub const fn start(&self) -> Point {
        match self {
            Self::Line { start, .. } | Self::Arc { start, .. } => *start,
        }
    }

    /// End point.
    #[must_use]
    pub const fn end(&self) -> Point {
        match self {
            Self::Line { end, .. } | Self::Arc { end, .. } => *end,
        }
    }

    /// Returns `true` for arcs.
    #[must_use]
    pub const fn is_arc(&self) -> bool {
        matches!(self, Self::Arc { .. })
    }

    /// Point halfway along the primitive.
    #[must_use]
    pub fn mid(&self) -> Point {
        match *self {
            Self::Line { start, end } => start.midpoint(end),
            Self::Arc {
                center,
                start,
                sweep,
                ..
            } => arc_point(center, start, sweep / 2.0),
        }
    }

    /// Length of the primitive.
    #[must_use]
    pub fn length(&self) -> f64 {
        match *self {
            Self::Line { start, end } => start.distance(end),
            Self::Arc {
                center,
                start,
                end,
                sweep,
            } => {
                if start == end && sweep.abs() < 360.0 {
                    return 0.0;
                }
                center.distance(start) * sweep.abs().to_radians()
            }
        }
    }

    /// Approximates the primitive as a polyline, including both end points.
    ///
    /// `segments_per_circle` sets the resolution of arcs.
    #[must_use]
    pub fn to_polyline(&self, segments_per_circle: u32) -> Vec<Point> {
        match *self {
            Self::Line { start, end } => vec![start, end],
            Self::Arc {
                center,
                start,
                end,
                sweep,
            } => {
                let steps = arc_steps(sweep, segments_per_circle);
                let mut points = Vec::with_capacity(steps + 1);
                points.push(start);
                for i in 1..steps {
                    #[allow(clippy::cast_precision_loss)]
                    let fraction = i as f64 / steps as f64;
                    points.push(arc_point(center, start, sweep * fraction));
                }
                points.push(end);
                points
            }
        }
    }

    /// Applies a placement transform.
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Self {
        match *self {
            Self::Line { start, end } => Self::line(transform.apply(start), transform.apply(end)),
            Self::Arc {
                center,
                start,
                end,
                sweep,
            } => Self::Arc {
                center: transform.apply(center),
                start: transform.apply(start),
                end: transform.apply(end),
                sweep: if transform.mirror { -sweep } else { sweep },
            },
        }
    }

    /// Translates the primitive.
    #[must_use]
    pub fn translated(&self, offset: Point) -> Self {
        match *self {
            Self::Line { start, end } => Self::line(start + offset, end + offset),
            Self::Arc {
                center,
                start,
                end,
                sweep,
            } => Self::Arc {
                center: center + offset,
                start: start + offset,
                end: end + offset,
                sweep,
            },
        }
    }
}

/// Number of straight steps used to approximate a sweep.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn arc_steps(sweep: f64, segments_per_circle: u32) -> usize {
    let steps = (sweep.abs() / 360.0 * f64::from(segments_per_circle)).ceil();
    (steps as usize).max(1)
}

/// Point reached by sweeping `start` about `center` by `sweep` degrees of polar angle.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn arc_point(center: Point, start: Point, sweep: f64) -> Point {
    let radius = center.distance(start);
    let angle = (start - center).angle() + sweep;
    let (sin, cos) = angle.to_radians().sin_cos();
    Point::new(
        center.x + round(radius * cos),
        center.y + round(radius * sin),
    )
}
