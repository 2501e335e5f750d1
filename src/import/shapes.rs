//! Vertex lists to host geometry.
//!
//! Archive shapes are chains of line, arc and semicircle vertices. They are
//! converted here into [`Segment`] lists, closed outlines and polygon sets,
//! and drawn as board graphics.

use crate::archive::{ArchivePoint, Shape, ShapeKind, Vertex};
use crate::board::{Graphic, PcbLayer};
use crate::geometry::{
    normalize_angle_neg, normalize_angle_pos, stroke, GeometryError, LineChain, Point, PolySet,
    Polygon, Segment, Transform,
};

use super::diagnostics::Diagnostics;
use super::units::UnitConverter;

/// Converts archive shapes into host geometry.
#[derive(Debug, Clone, Copy)]
pub struct ShapeBuilder {
    units: UnitConverter,
    arc_segments: u32,
}

impl ShapeBuilder {
    /// Creates a builder.
    ///
    /// `arc_segments` is the number of straight steps per full circle used
    /// wherever arcs are approximated.
    #[must_use]
    pub const fn new(units: UnitConverter, arc_segments: u32) -> Self {
        Self {
            units,
            arc_segments,
        }
    }

    /// The unit converter.
    #[must_use]
    pub const fn units(&self) -> &UnitConverter {
        &self.units
    }

    /// Steps per full circle.
    #[must_use]
    pub const fn arc_segments(&self) -> u32 {
        self.arc_segments
    }

    /// Converts an archive point to host coordinates.
    #[must_use]
    pub const fn point(&self, p: ArchivePoint) -> Point {
        self.units.point(p)
    }

    /// Converts one vertex, starting at `start`, into a primitive.
    #[must_use]
    pub fn segment(&self, start: ArchivePoint, vertex: &Vertex) -> Segment {
        let from = self.point(start);
        let to = self.point(vertex.end());
        match *vertex {
            Vertex::Point { .. } => Segment::line(from, to),
            Vertex::ClockwiseArc { center, .. } => arc(self.point(center), from, to, true),
            Vertex::AnticlockwiseArc { center, .. } => arc(self.point(center), from, to, false),
            Vertex::ClockwiseSemicircle { .. } => arc(from.midpoint(to), from, to, true),
            Vertex::AnticlockwiseSemicircle { .. } => arc(from.midpoint(to), from, to, false),
        }
    }

    /// Converts a vertex list into primitives.
    ///
    /// The first vertex only sets the starting point.
    #[must_use]
    pub fn segments(&self, vertices: &[Vertex], transform: &Transform) -> Vec<Segment> {
        vertices
            .windows(2)
            .map(|pair| {
                self.segment(pair[0].end(), &pair[1])
                    .transformed(transform)
            })
            .collect()
    }

    /// Converts a vertex list into a closed chain.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] when fewer than three distinct
    /// points remain.
    pub fn outline(
        &self,
        vertices: &[Vertex],
        transform: &Transform,
    ) -> Result<LineChain, GeometryError> {
        let segments = self.segments(vertices, transform);
        let mut chain = LineChain::new();
        if segments.is_empty() {
            if let Some(v) = vertices.first() {
                chain.append(transform.apply(self.point(v.end())));
            }
        }
        for segment in &segments {
            for p in segment.to_polyline(self.arc_segments) {
                chain.append(p);
            }
        }
        chain.close();

        let points = chain.vertex_count();
        if points < 3 {
            return Err(GeometryError::Degenerate { points });
        }
        Ok(chain)
    }

    /// Converts a shape and its cutouts into a polygon with holes.
    ///
    /// Degenerate cutouts are dropped; a degenerate outline is an error.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] for a degenerate outline.
    pub fn polygon(&self, shape: &Shape, transform: &Transform) -> Result<PolySet, GeometryError> {
        let mut polygon = Polygon::new(self.outline(&shape.vertices, transform)?);
        polygon.holes = shape
            .cutouts
            .iter()
            .filter_map(|cutout| self.outline(cutout, transform).ok())
            .collect();
        let mut set = PolySet::new();
        set.push(polygon);
        Ok(set)
    }

    /// Area covered by a shape drawn with a pen of `width`.
    ///
    /// Open shapes are stroked along their centreline. Closed shapes are grown
    /// by half the width. The result is fractured.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] for a degenerate closed shape.
    pub fn filled_area(
        &self,
        shape: &Shape,
        width: i64,
        transform: &Transform,
    ) -> Result<PolySet, GeometryError> {
        if shape.kind == ShapeKind::Openshape {
            let segments = self.segments(&shape.vertices, transform);
            if segments.is_empty() {
                return Err(GeometryError::Degenerate {
                    points: shape.vertices.len(),
                });
            }
            return Ok(stroke(&segments, width, self.arc_segments));
        }
        Ok(self
            .polygon(shape, transform)?
            .inflated(width / 2, self.arc_segments)
            .fractured())
    }

    /// Draws a shape as board graphics.
    ///
    /// Open and closed outlines become line and arc paths, cutouts included.
    /// Solid shapes become one fractured filled polygon. Hatched shapes are
    /// drawn solid with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] for a degenerate filled shape.
    pub fn graphics(
        &self,
        shape: &Shape,
        width: i64,
        layer: PcbLayer,
        transform: &Transform,
        diag: &mut Diagnostics,
    ) -> Result<Vec<Graphic>, GeometryError> {
        match shape.kind {
            ShapeKind::Openshape | ShapeKind::Outline => {
                let mut rings = vec![&shape.vertices];
                if shape.kind == ShapeKind::Outline {
                    rings.extend(&shape.cutouts);
                }
                Ok(rings
                    .into_iter()
                    .flat_map(|ring| self.segments(ring, transform))
                    .filter(|s| s.start() != s.end() || s.is_arc())
                    .map(|s| Graphic::path(s, width, layer))
                    .collect())
            }
            ShapeKind::Hatched | ShapeKind::Solid => {
                if shape.kind == ShapeKind::Hatched {
                    let code = shape
                        .hatch_code
                        .as_ref()
                        .map_or_else(String::new, ToString::to_string);
                    diag.warn_once(format!("hatched-shape:{code}"), || {
                        format!(
                            "Hatched shapes are not supported and are drawn solid (hatch code '{code}')"
                        )
                    });
                }
                let polygons = self.polygon(shape, transform)?.fractured();
                Ok(vec![Graphic::filled_polygon(polygons, width, layer)])
            }
        }
    }
}

/// Builds an arc between two host points.
///
/// Clockwise arcs sweep positively in host coordinates (Y pointing down),
/// anticlockwise arcs negatively. Coincident end points give a full circle.
fn arc(center: Point, start: Point, end: Point, clockwise: bool) -> Segment {
    let delta = (end - center).angle() - (start - center).angle();
    let sweep = if clockwise {
        let s = normalize_angle_pos(delta);
        if s == 0.0 { 360.0 } else { s }
    } else {
        let s = normalize_angle_neg(delta);
        if s == 0.0 { -360.0 } else { s }
    };
    Segment::Arc {
        center,
        start,
        end,
        sweep,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Technology;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    fn builder() -> ShapeBuilder {
        // Multiplier 1, centre at the origin.
        let tech = Technology {
            unit_multiplier: 1,
            ..Technology::default()
        };
        ShapeBuilder::new(UnitConverter::new(&tech), 64)
    }

    fn p(x: i64, y: i64) -> ArchivePoint {
        ArchivePoint::new(x, y)
    }

    #[test]
    fn square_outline_has_one_closing_point() {
        let shape = Shape::polygon(
            ShapeKind::Solid,
            &[(0, 0), (100, 0), (100, 100), (0, 100)],
        );
        let chain = builder().outline(&shape.vertices, &Transform::IDENTITY).unwrap();
        assert!(chain.is_closed());
        assert_eq!(chain.point_count(), 5);
        assert_eq!(chain.vertex_count(), 4);
    }

    #[test]
    fn explicitly_closed_outline_is_not_closed_twice() {
        let shape = Shape::polygon(
            ShapeKind::Solid,
            &[(0, 0), (100, 0), (100, 100), (0, 0)],
        );
        let chain = builder().outline(&shape.vertices, &Transform::IDENTITY).unwrap();
        assert_eq!(chain.point_count(), 4);
    }

    #[test]
    fn two_points_are_degenerate() {
        let shape = Shape::polygon(ShapeKind::Solid, &[(0, 0), (100, 0), (0, 0)]);
        let err = builder()
            .outline(&shape.vertices, &Transform::IDENTITY)
            .unwrap_err();
        assert_eq!(err, GeometryError::Degenerate { points: 2 });
    }

    #[test]
    fn semicircle_centre_is_midpoint() {
        let seg = builder().segment(
            p(-100, 0),
            &Vertex::ClockwiseSemicircle { end: p(100, 0) },
        );
        let Segment::Arc { center, sweep, .. } = seg else {
            panic!("expected an arc");
        };
        assert_eq!(center, Point::ORIGIN);
        assert!(approx_eq(sweep, 180.0, 1e-9));
    }

    #[test]
    fn arc_direction_sets_sweep_sign() {
        let b = builder();
        let cw = b.segment(
            p(100, 0),
            &Vertex::ClockwiseArc {
                end: p(0, -100),
                center: p(0, 0),
            },
        );
        let ccw = b.segment(
            p(100, 0),
            &Vertex::AnticlockwiseArc {
                end: p(0, -100),
                center: p(0, 0),
            },
        );
        let (Segment::Arc { sweep: a, .. }, Segment::Arc { sweep: c, .. }) = (cw, ccw) else {
            panic!("expected arcs");
        };
        assert!(approx_eq(a, 90.0, 1e-9));
        assert!(approx_eq(c, -270.0, 1e-9));
    }

    #[test]
    fn clockwise_arc_bulges_the_right_way() {
        // Clockwise from (100, 0) to (-100, 0) about the origin passes below the
        // centre in archive space, which is positive Y on the board.
        let seg = builder().segment(
            p(100, 0),
            &Vertex::ClockwiseArc {
                end: p(-100, 0),
                center: p(0, 0),
            },
        );
        let mid = seg.mid();
        assert_eq!(mid, Point::new(0, 100));
    }

    #[test]
    fn cutouts_become_holes() {
        let mut shape = Shape::polygon(
            ShapeKind::Solid,
            &[(0, 0), (100, 0), (100, 100), (0, 100)],
        );
        shape.cutouts.push(
            Shape::polygon(ShapeKind::Solid, &[(25, 25), (75, 25), (75, 75), (25, 75)]).vertices,
        );
        let set = builder().polygon(&shape, &Transform::IDENTITY).unwrap();
        assert_eq!(set.polygons()[0].holes.len(), 1);
        assert!(approx_eq(set.area(), 10_000.0 - 2_500.0, 1.0));
    }

    #[test]
    fn stroked_line_has_pen_width() {
        let shape = Shape::polygon(ShapeKind::Openshape, &[(0, 0), (10_000, 0)]);
        let area = builder()
            .filled_area(&shape, 1_000, &Transform::IDENTITY)
            .unwrap();
        let (lo, hi) = area.bbox().unwrap();
        assert!((hi.y - lo.y - 1_000).abs() <= 2);
        assert!((hi.x - lo.x - 11_000).abs() <= 2);
    }

    #[test]
    fn hatched_shape_warns_once_and_draws_solid() {
        let mut diag = Diagnostics::new();
        let shape = Shape::polygon(
            ShapeKind::Hatched,
            &[(0, 0), (100, 0), (100, 100), (0, 100)],
        );
        let b = builder();
        for _ in 0..2 {
            let g = b
                .graphics(&shape, 10, PcbLayer::Drawings, &Transform::IDENTITY, &mut diag)
                .unwrap();
            assert!(g[0].filled);
        }
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn outline_graphics_include_cutouts() {
        let mut shape = Shape::polygon(
            ShapeKind::Outline,
            &[(0, 0), (100, 0), (100, 100), (0, 0)],
        );
        shape
            .cutouts
            .push(Shape::polygon(ShapeKind::Outline, &[(10, 10), (20, 10), (10, 20), (10, 10)]).vertices);
        let g = builder()
            .graphics(
                &shape,
                10,
                PcbLayer::Drawings,
                &Transform::IDENTITY,
                &mut Diagnostics::new(),
            )
            .unwrap();
        assert_eq!(g.len(), 6);
    }
}
