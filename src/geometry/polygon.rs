//! Polygon sets with holes and the boolean operations used on them.
//!
//! Booleans, simplification and inflation are delegated to `i_overlay`.
//! Closed chains always repeat their first point as their last point.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use serde::{Deserialize, Serialize};

use super::point::Point;
use super::segment::Segment;

/// Contours in the layout expected by `i_overlay`: shape, contour, point.
type OverlayShapes = Vec<Vec<Vec<[f64; 2]>>>;

/// An ordered chain of points, open or closed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineChain {
    points: Vec<Point>,
    closed: bool,
}

impl LineChain {
    /// Creates an empty open chain.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            points: Vec::new(),
            closed: false,
        }
    }

    /// Creates a closed chain from a ring of points.
    ///
    /// The closing point is added when the ring does not already repeat its start.
    #[must_use]
    pub fn closed_from(points: impl IntoIterator<Item = Point>) -> Self {
        let mut chain = Self::new();
        for p in points {
            chain.append(p);
        }
        chain.close();
        chain
    }

    /// Appends a point, skipping it if it repeats the last point.
    pub fn append(&mut self, point: Point) {
        if self.points.last() != Some(&point) {
            self.points.push(point);
        }
    }

    /// Marks the chain closed, appending the first point if needed.
    pub fn close(&mut self) {
        if let (Some(&first), Some(&last)) = (self.points.first(), self.points.last()) {
            if first != last {
                self.points.push(first);
            }
        }
        self.closed = true;
    }

    /// Points of the chain.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of stored points, including a closing point.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of distinct vertices (a closing point is not counted twice).
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        if self.closed && self.points.len() > 1 && self.points.first() == self.points.last() {
            self.points.len() - 1
        } else {
            self.points.len()
        }
    }

    /// Returns `true` if the chain is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Signed shoelace area.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            sum += (a.x as f64) * (b.y as f64) - (b.x as f64) * (a.y as f64);
        }
        sum / 2.0
    }

    /// Unsigned enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Even-odd point containment test against the closed ring.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn contains(&self, p: Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let (px, py) = (p.x as f64, p.y as f64);
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = (self.points[i].x as f64, self.points[i].y as f64);
            let (xj, yj) = (self.points[j].x as f64, self.points[j].y as f64);
            if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Axis-aligned bounding box as `(min, max)`.
    #[must_use]
    pub fn bbox(&self) -> Option<(Point, Point)> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold((first, first), |(lo, hi), p| {
            (
                Point::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }

    /// Returns the chain with every point mapped through `f`.
    #[must_use]
    pub fn map(&self, f: impl Fn(Point) -> Point) -> Self {
        Self {
            points: self.points.iter().map(|&p| f(p)).collect(),
            closed: self.closed,
        }
    }

    fn ring(&self, positive: bool) -> Vec<[f64; 2]> {
        let mut pts: Vec<[f64; 2]> = self.points.iter().map(|p| p.to_f64()).collect();
        if pts.len() > 1 && pts.first() == pts.last() {
            pts.pop();
        }
        if (self.signed_area() > 0.0) != positive {
            pts.reverse();
        }
        pts
    }
}

/// A polygon outline with zero or more holes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Polygon {
    /// Outer boundary.
    pub outline: LineChain,
    /// Holes cut out of the outline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<LineChain>,
}

impl Polygon {
    /// Creates a polygon without holes.
    #[must_use]
    pub const fn new(outline: LineChain) -> Self {
        Self {
            outline,
            holes: Vec::new(),
        }
    }

    /// Enclosed area, outline minus holes.
    #[must_use]
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(LineChain::area).sum();
        (self.outline.area() - holes).max(0.0)
    }

    /// Returns `true` if `p` is inside the outline and outside every hole.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        self.outline.contains(p) && !self.holes.iter().any(|h| h.contains(p))
    }

    fn to_overlay(&self) -> Vec<Vec<[f64; 2]>> {
        let mut shape = Vec::with_capacity(1 + self.holes.len());
        shape.push(self.outline.ring(true));
        shape.extend(self.holes.iter().map(|h| h.ring(false)));
        shape
    }
}

/// A set of polygons, each with its own holes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolySet {
    polygons: Vec<Polygon>,
}

impl PolySet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            polygons: Vec::new(),
        }
    }

    /// Creates a set holding one outline.
    #[must_use]
    pub fn from_outline(outline: LineChain) -> Self {
        Self {
            polygons: vec![Polygon::new(outline)],
        }
    }

    /// Adds a polygon.
    pub fn push(&mut self, polygon: Polygon) {
        self.polygons.push(polygon);
    }

    /// Adds a hole to the last polygon.
    ///
    /// Ignored if the set is empty.
    pub fn add_hole(&mut self, hole: LineChain) {
        if let Some(last) = self.polygons.last_mut() {
            last.holes.push(hole);
        }
    }

    /// Polygons in the set.
    #[must_use]
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Returns `true` if the set holds no polygons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Total enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.polygons.iter().map(Polygon::area).sum()
    }

    /// Returns `true` if any polygon contains `p`.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        self.polygons.iter().any(|poly| poly.contains(p))
    }

    /// Bounding box of every outline.
    #[must_use]
    pub fn bbox(&self) -> Option<(Point, Point)> {
        self.polygons
            .iter()
            .filter_map(|p| p.outline.bbox())
            .reduce(|(lo, hi), (l, h)| {
                (
                    Point::new(lo.x.min(l.x), lo.y.min(l.y)),
                    Point::new(hi.x.max(h.x), hi.y.max(h.y)),
                )
            })
    }

    /// Returns the set with every point mapped through `f`.
    #[must_use]
    pub fn map(&self, f: impl Fn(Point) -> Point + Copy) -> Self {
        Self {
            polygons: self
                .polygons
                .iter()
                .map(|poly| Polygon {
                    outline: poly.outline.map(f),
                    holes: poly.holes.iter().map(|h| h.map(f)).collect(),
                })
                .collect(),
        }
    }

    /// Translates every point.
    #[must_use]
    pub fn translated(&self, offset: Point) -> Self {
        self.map(|p| p + offset)
    }

    /// Rotates every point about `center`.
    #[must_use]
    pub fn rotated(&self, center: Point, degrees: f64) -> Self {
        self.map(|p| p.rotate_about(center, degrees))
    }

    /// Union of two sets.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        boolean(&self.to_overlay(), &other.to_overlay(), OverlayRule::Union)
    }

    /// Intersection of two sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        boolean(&self.to_overlay(), &other.to_overlay(), OverlayRule::Intersect)
    }

    /// Resolves overlaps and self-intersections into disjoint outlines with holes.
    #[must_use]
    pub fn fractured(&self) -> Self {
        boolean(&self.to_overlay(), &OverlayShapes::new(), OverlayRule::Union)
    }

    /// Grows the set outwards by `amount` with rounded corners.
    ///
    /// Holes shrink by the same amount.
    #[must_use]
    pub fn inflated(&self, amount: i64, segments_per_circle: u32) -> Self {
        if amount <= 0 || self.is_empty() {
            return self.clone();
        }
        let mut strokes = OverlayShapes::new();
        for poly in &self.polygons {
            for ring in std::iter::once(&poly.outline).chain(&poly.holes) {
                for pair in ring.points().windows(2) {
                    strokes.push(vec![capsule(pair[0], pair[1], amount, segments_per_circle)
                        .ring(true)]);
                }
            }
        }
        boolean(&self.to_overlay(), &strokes, OverlayRule::Union)
    }

    fn to_overlay(&self) -> OverlayShapes {
        self.polygons
            .iter()
            .filter(|p| p.outline.vertex_count() >= 3)
            .map(Polygon::to_overlay)
            .collect()
    }

    fn from_overlay(shapes: OverlayShapes) -> Self {
        let polygons = shapes
            .into_iter()
            .filter_map(|shape| {
                let mut contours = shape.into_iter().map(|contour| {
                    LineChain::closed_from(contour.into_iter().map(Point::from_f64))
                });
                let outline = contours.next()?;
                Some(Polygon {
                    outline,
                    holes: contours.filter(|h| h.vertex_count() >= 3).collect(),
                })
            })
            .filter(|p| p.outline.vertex_count() >= 3)
            .collect();
        Self { polygons }
    }
}

fn boolean(subject: &OverlayShapes, clip: &OverlayShapes, rule: OverlayRule) -> PolySet {
    if subject.is_empty() && clip.is_empty() {
        return PolySet::new();
    }
    PolySet::from_overlay(subject.overlay(clip, rule, FillRule::NonZero))
}

/// Approximates a circle as a closed chain.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn circle(center: Point, radius: i64, segments_per_circle: u32) -> LineChain {
    let n = segments_per_circle.max(8);
    LineChain::closed_from((0..n).map(|i| {
        let angle = (f64::from(i) * 360.0 / f64::from(n)).to_radians();
        let (sin, cos) = angle.sin_cos();
        Point::new(
            center.x + super::point::round(radius as f64 * cos),
            center.y + super::point::round(radius as f64 * sin),
        )
    }))
}

/// Approximates the outline of a line from `a` to `b` with round caps.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn capsule(a: Point, b: Point, radius: i64, segments_per_circle: u32) -> LineChain {
    if a == b {
        return circle(a, radius, segments_per_circle);
    }
    let half_steps = (segments_per_circle / 2).max(4);
    let direction = (b - a).angle();
    let cap = |center: Point, from: f64| {
        (0..=half_steps).map(move |i| {
            let angle = (from + 180.0 * f64::from(i) / f64::from(half_steps)).to_radians();
            let (sin, cos) = angle.sin_cos();
            Point::new(
                center.x + super::point::round(radius as f64 * cos),
                center.y + super::point::round(radius as f64 * sin),
            )
        })
    };
    LineChain::closed_from(cap(b, direction - 90.0).chain(cap(a, direction + 90.0)))
}

/// Outline of primitives stroked with a round pen of the given width.
#[must_use]
pub fn stroke(segments: &[Segment], width: i64, segments_per_circle: u32) -> PolySet {
    let radius = width / 2;
    if radius <= 0 {
        return PolySet::new();
    }
    let mut strokes = OverlayShapes::new();
    for segment in segments {
        for pair in segment.to_polyline(segments_per_circle).windows(2) {
            strokes.push(vec![capsule(pair[0], pair[1], radius, segments_per_circle).ring(true)]);
        }
    }
    boolean(&strokes, &OverlayShapes::new(), OverlayRule::Union)
}

/// Axis-aligned rectangle centred on `center`.
#[must_use]
pub fn rectangle(center: Point, width: i64, height: i64) -> LineChain {
    let (hw, hh) = (width / 2, height / 2);
    LineChain::closed_from([
        Point::new(center.x - hw, center.y - hh),
        Point::new(center.x + hw, center.y - hh),
        Point::new(center.x + hw, center.y + hh),
        Point::new(center.x - hw, center.y + hh),
    ])
}
