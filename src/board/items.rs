//! Board items: tracks, vias, zones, graphics, text, dimensions and groups.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::layer::{LayerSet, PcbLayer};
use super::{ItemId, NetCode};
use crate::geometry::{PolySet, Point, Segment, Transform};

/// A width/height pair in nanometres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub x: i64,
    /// Vertical extent.
    pub y: i64,
}

impl Size {
    /// Creates a size.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Creates a square size.
    #[must_use]
    pub const fn square(side: i64) -> Self {
        Self { x: side, y: side }
    }

    /// The smaller of the two extents.
    #[must_use]
    pub const fn min(&self) -> i64 {
        if self.x < self.y {
            self.x
        } else {
            self.y
        }
    }
}

/// Geometry of a graphic item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphicShape {
    /// A stroked line or arc.
    Path {
        /// The primitive.
        segment: Segment,
    },
    /// A polygon set, outlined or filled.
    Polygon {
        /// The polygons.
        polygons: PolySet,
    },
}

/// A drawn shape on a single layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graphic {
    /// Geometry.
    #[serde(flatten)]
    pub shape: GraphicShape,

    /// Stroke width.
    pub width: i64,

    /// Layer.
    pub layer: PcbLayer,

    /// Whether a polygon is filled.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub filled: bool,

    /// Locked against editing.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

impl Graphic {
    /// Creates a stroked line or arc.
    #[must_use]
    pub const fn path(segment: Segment, width: i64, layer: PcbLayer) -> Self {
        Self {
            shape: GraphicShape::Path { segment },
            width,
            layer,
            filled: false,
            locked: false,
        }
    }

    /// Creates a filled polygon.
    #[must_use]
    pub const fn filled_polygon(polygons: PolySet, width: i64, layer: PcbLayer) -> Self {
        Self {
            shape: GraphicShape::Polygon { polygons },
            width,
            layer,
            filled: true,
            locked: false,
        }
    }

    /// Returns the graphic with every point transformed.
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Self {
        let shape = match &self.shape {
            GraphicShape::Path { segment } => GraphicShape::Path {
                segment: segment.transformed(transform),
            },
            GraphicShape::Polygon { polygons } => GraphicShape::Polygon {
                polygons: polygons.map(|p| transform.apply(p)),
            },
        };
        Self {
            shape,
            ..self.clone()
        }
    }
}

/// Horizontal text justification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalJustify {
    /// Anchor on the left edge.
    Left,
    /// Anchor in the centre.
    #[default]
    Center,
    /// Anchor on the right edge.
    Right,
}

impl HorizontalJustify {
    /// Justification after a left/right mirror.
    #[must_use]
    pub const fn mirrored(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Center => Self::Center,
            Self::Right => Self::Left,
        }
    }
}

/// Vertical text justification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalJustify {
    /// Anchor on the top edge.
    Top,
    /// Anchor in the centre.
    #[default]
    Center,
    /// Anchor on the bottom edge.
    Bottom,
}

/// A text item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// Content. May reference text variables as `${NAME}`.
    pub text: String,

    /// Anchor position.
    pub position: Point,

    /// Rotation in degrees.
    #[serde(default)]
    pub angle: f64,

    /// Glyph width and height.
    pub size: Size,

    /// Stroke thickness.
    pub thickness: i64,

    /// Drawn mirrored (reads correctly from the back).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mirrored: bool,

    /// Layer.
    pub layer: PcbLayer,

    /// Horizontal justification.
    #[serde(default)]
    pub h_justify: HorizontalJustify,

    /// Vertical justification.
    #[serde(default)]
    pub v_justify: VerticalJustify,

    /// Locked against editing.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

impl Text {
    /// Creates centred, unrotated text.
    #[must_use]
    pub fn new(text: impl Into<String>, position: Point, layer: PcbLayer) -> Self {
        Self {
            text: text.into(),
            position,
            angle: 0.0,
            size: Size::default(),
            thickness: 0,
            mirrored: false,
            layer,
            h_justify: HorizontalJustify::default(),
            v_justify: VerticalJustify::default(),
            locked: false,
        }
    }
}

/// Geometry of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackShape {
    /// Straight segment.
    Segment,
    /// Circular arc through `mid`.
    Arc {
        /// A point on the arc between start and end.
        mid: Point,
    },
}

/// A copper track or arc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Start point.
    pub start: Point,

    /// End point.
    pub end: Point,

    /// Straight or arc.
    #[serde(flatten)]
    pub shape: TrackShape,

    /// Width.
    pub width: i64,

    /// Copper layer.
    pub layer: PcbLayer,

    /// Net, if connected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net: Option<NetCode>,

    /// Locked against editing.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

impl Track {
    /// Creates a straight track.
    #[must_use]
    pub const fn segment(start: Point, end: Point, width: i64, layer: PcbLayer) -> Self {
        Self {
            start,
            end,
            shape: TrackShape::Segment,
            width,
            layer,
            net: None,
            locked: false,
        }
    }

    /// Creates an arc track through `mid`.
    #[must_use]
    pub const fn arc(start: Point, mid: Point, end: Point, width: i64, layer: PcbLayer) -> Self {
        Self {
            start,
            end,
            shape: TrackShape::Arc { mid },
            width,
            layer,
            net: None,
            locked: false,
        }
    }

    /// Length along the track. A track whose ends coincide has zero length.
    #[must_use]
    pub fn length(&self) -> f64 {
        if self.start == self.end {
            return 0.0;
        }
        match self.shape {
            TrackShape::Segment => self.start.distance(self.end),
            TrackShape::Arc { mid } => arc_length(self.start, mid, self.end),
        }
    }
}

/// Length of the circular arc from `start` through `mid` to `end`.
fn arc_length(start: Point, mid: Point, end: Point) -> f64 {
    let [ax, ay] = start.to_f64();
    let [bx, by] = mid.to_f64();
    let [cx, cy] = end.to_f64();
    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < f64::EPSILON {
        return start.distance(mid) + mid.distance(end);
    }
    let a2 = ax.mul_add(ax, ay * ay);
    let b2 = bx.mul_add(bx, by * by);
    let c2 = cx.mul_add(cx, cy * cy);
    let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
    let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;
    let radius = (ax - ux).hypot(ay - uy);

    let tau = std::f64::consts::TAU;
    let a0 = (ay - uy).atan2(ax - ux);
    let am = (by - uy).atan2(bx - ux);
    let a1 = (cy - uy).atan2(cx - ux);
    let sweep = (a1 - a0).rem_euclid(tau);
    let to_mid = (am - a0).rem_euclid(tau);
    let sweep = if to_mid <= sweep { sweep } else { tau - sweep };
    radius * sweep
}

/// Via construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViaType {
    /// Spans both outer layers.
    #[default]
    Through,
    /// Spans inner layers only.
    BlindBuried,
    /// Spans one outer layer and an inner layer.
    Micro,
}

/// A plated via.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Via {
    /// Centre.
    pub position: Point,

    /// Pad diameter.
    pub width: i64,

    /// Drill diameter.
    pub drill: i64,

    /// Construction.
    pub via_type: ViaType,

    /// First copper layer.
    pub top_layer: PcbLayer,

    /// Last copper layer.
    pub bottom_layer: PcbLayer,

    /// Net, if connected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net: Option<NetCode>,

    /// Locked against editing.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

bitflags! {
    /// What a rule area forbids.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Keepout: u8 {
        /// No tracks.
        const TRACKS = 1;
        /// No vias.
        const VIAS = 1 << 1;
        /// No pads.
        const PADS = 1 << 2;
        /// No copper pour.
        const COPPER_POUR = 1 << 3;
        /// No footprints.
        const FOOTPRINTS = 1 << 4;
    }
}

/// Zone fill style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Solid copper.
    #[default]
    Solid,
    /// Cross-hatched copper.
    Hatched,
}

/// Hatch pattern for [`FillMode::Hatched`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HatchSettings {
    /// Hatch line thickness.
    pub thickness: i64,
    /// Gap between hatch lines.
    pub gap: i64,
    /// Hatch angle in degrees.
    pub orientation: f64,
}

/// Policy for removing isolated copper islands after filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IslandRemoval {
    /// Remove every island.
    #[default]
    Always,
    /// Keep every island.
    Never,
    /// Remove islands smaller than the area, in nm².
    Area(i64),
}

/// How pads connect to a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadConnection {
    /// Thermal relief spokes.
    #[default]
    Thermal,
    /// Solid connection.
    Full,
}

/// How the zone outline is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderStyle {
    /// Plain outline.
    NoHatch,
    /// Short diagonal hatch marks along the edge.
    #[default]
    DiagonalEdge,
}

/// A copper pour or rule area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Optional zone name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Layers the zone exists on.
    pub layers: LayerSet,

    /// Outline with holes.
    pub outline: PolySet,

    /// Rule area (keepout) instead of copper.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rule_area: bool,

    /// What a rule area forbids.
    #[serde(default, skip_serializing_if = "Keepout::is_empty")]
    pub keepout: Keepout,

    /// Fill order; higher fills first.
    #[serde(default)]
    pub priority: u32,

    /// Net, if connected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net: Option<NetCode>,

    /// Fill style.
    #[serde(default)]
    pub fill_mode: FillMode,

    /// Hatch pattern when hatched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hatch: Option<HatchSettings>,

    /// Island removal policy.
    #[serde(default)]
    pub island_removal: IslandRemoval,

    /// Pad connection style.
    #[serde(default)]
    pub pad_connection: PadConnection,

    /// Thermal relief gap.
    #[serde(default)]
    pub thermal_gap: i64,

    /// Thermal relief spoke width.
    #[serde(default)]
    pub thermal_spoke_width: i64,

    /// Minimum copper width.
    #[serde(default)]
    pub min_thickness: i64,

    /// Clearance to other copper.
    #[serde(default)]
    pub local_clearance: i64,

    /// Outline display.
    #[serde(default)]
    pub border: BorderStyle,

    /// Filled copper, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<PolySet>,

    /// Locked against editing.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

impl Zone {
    /// Creates an unfilled copper zone with default settings.
    #[must_use]
    pub fn new(layers: LayerSet, outline: PolySet) -> Self {
        Self {
            name: String::new(),
            layers,
            outline,
            rule_area: false,
            keepout: Keepout::empty(),
            priority: 0,
            net: None,
            fill_mode: FillMode::default(),
            hatch: None,
            island_removal: IslandRemoval::default(),
            pad_connection: PadConnection::default(),
            thermal_gap: 0,
            thermal_spoke_width: 0,
            min_thickness: 0,
            local_clearance: 0,
            border: BorderStyle::default(),
            fill: None,
            locked: false,
        }
    }

    /// Creates a rule area.
    #[must_use]
    pub fn rule_area(layers: LayerSet, outline: PolySet, keepout: Keepout) -> Self {
        Self {
            rule_area: true,
            keepout,
            ..Self::new(layers, outline)
        }
    }

    /// Returns `true` once a fill has been recorded.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.fill.is_some()
    }

    /// Filled copper, or an empty set.
    #[must_use]
    pub fn filled_polygons(&self) -> PolySet {
        self.fill.clone().unwrap_or_default()
    }
}

/// Dimension flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DimensionKind {
    /// Measures along the line from start to end.
    Aligned,
    /// Measures the horizontal or vertical extent only.
    Orthogonal {
        /// Measures the horizontal extent.
        horizontal: bool,
    },
    /// A leader line with free text.
    Leader,
}

/// Units shown by a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionUnits {
    /// Millimetres.
    #[default]
    Millimetres,
    /// Inches.
    Inches,
    /// Mils.
    Mils,
}

/// Whether a dimension prints its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitsFormat {
    /// Value only.
    #[default]
    NoSuffix,
    /// Value followed by the unit abbreviation.
    BareSuffix,
}

/// A measurement annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// Flavour.
    #[serde(flatten)]
    pub kind: DimensionKind,

    /// Layer.
    pub layer: PcbLayer,

    /// First measured point.
    pub start: Point,

    /// Second measured point (leader: end of the leader line).
    pub end: Point,

    /// Distance from the measured points to the crossbar.
    #[serde(default)]
    pub height: i64,

    /// Gap between a measured point and its extension line.
    #[serde(default)]
    pub extension_offset: i64,

    /// Extension line overshoot past the crossbar.
    #[serde(default)]
    pub extension_height: i64,

    /// Line thickness.
    pub line_thickness: i64,

    /// Text attributes. `text.text` is only meaningful with `override_text`.
    pub text: Text,

    /// Free text replacing the measured value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_text: Option<String>,

    /// Digits after the decimal point.
    pub precision: u32,

    /// Text before the value.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,

    /// Text after the value.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suffix: String,

    /// Measurement units.
    #[serde(default)]
    pub units: DimensionUnits,

    /// Unit suffix style.
    #[serde(default)]
    pub units_format: UnitsFormat,
}

/// A named group of items.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Group {
    /// Name.
    pub name: String,

    /// Direct members, items or groups.
    #[serde(default)]
    pub members: Vec<ItemId>,

    /// Locked against editing.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

impl Group {
    /// Creates an empty group.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance
    }

    #[test]
    fn segment_length() {
        let t = Track::segment(Point::new(0, 0), Point::new(3000, 4000), 100, PcbLayer::FrontCopper);
        assert!(approx_eq(t.length(), 5000.0, 1e-9));
    }

    #[test]
    fn half_circle_arc_length() {
        let t = Track::arc(
            Point::new(-1000, 0),
            Point::new(0, -1000),
            Point::new(1000, 0),
            100,
            PcbLayer::FrontCopper,
        );
        assert!(approx_eq(t.length(), std::f64::consts::PI * 1000.0, 1e-6));
    }

    #[test]
    fn major_arc_length_follows_mid_point() {
        // Three quarters of a circle: mid point is on the far side.
        let t = Track::arc(
            Point::new(1000, 0),
            Point::new(-1000, 0),
            Point::new(0, 1000),
            100,
            PcbLayer::FrontCopper,
        );
        assert!(approx_eq(t.length(), 1.5 * std::f64::consts::PI * 1000.0, 1e-6));
    }

    #[test]
    fn coincident_ends_have_zero_length() {
        let p = Point::new(5, 5);
        assert!(Track::segment(p, p, 10, PcbLayer::BackCopper).length() == 0.0);
    }

    #[test]
    fn justify_mirrors() {
        assert_eq!(HorizontalJustify::Left.mirrored(), HorizontalJustify::Right);
        assert_eq!(HorizontalJustify::Center.mirrored(), HorizontalJustify::Center);
    }

    #[test]
    fn rule_area_keeps_flags() {
        let zone = Zone::rule_area(
            LayerSet::of(&[PcbLayer::FrontCopper]),
            PolySet::new(),
            Keepout::TRACKS | Keepout::COPPER_POUR,
        );
        assert!(zone.rule_area);
        assert!(zone.keepout.contains(Keepout::TRACKS));
        assert!(!zone.keepout.contains(Keepout::VIAS));
        assert!(!zone.is_filled());
    }
}
