//! Footprints and their pads.
//!
//! Children of a footprint are stored in footprint-local coordinates: relative
//! to the footprint origin and before the footprint rotation is applied. A
//! flipped footprint stores its children already mirrored.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::items::{Graphic, Size, Text, Zone};
use super::layer::{LayerSet, PcbLayer};
use super::NetCode;
use crate::geometry::{
    capsule, circle, normalize_angle_180, rectangle, round, LineChain, Point, PolySet, Transform,
};

bitflags! {
    /// Corners of a rectangle, in the pad's own frame (Y down).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Chamfers: u8 {
        /// Top-left corner.
        const TOP_LEFT = 1;
        /// Top-right corner.
        const TOP_RIGHT = 1 << 1;
        /// Bottom-right corner.
        const BOTTOM_RIGHT = 1 << 2;
        /// Bottom-left corner.
        const BOTTOM_LEFT = 1 << 3;
    }
}

impl Chamfers {
    /// The corner set after a left/right mirror.
    #[must_use]
    pub fn mirrored(self) -> Self {
        let mut out = Self::empty();
        for (from, to) in [
            (Self::TOP_LEFT, Self::TOP_RIGHT),
            (Self::TOP_RIGHT, Self::TOP_LEFT),
            (Self::BOTTOM_RIGHT, Self::BOTTOM_LEFT),
            (Self::BOTTOM_LEFT, Self::BOTTOM_RIGHT),
        ] {
            if self.contains(from) {
                out |= to;
            }
        }
        out
    }
}

/// Anchor shape of a custom pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomAnchor {
    /// Circular anchor.
    Circle,
    /// Rectangular anchor.
    #[default]
    Rect,
}

/// Copper shape of a pad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PadShape {
    /// Circle of diameter `size.x`.
    Circle,
    /// Rectangle.
    Rect,
    /// Stadium along the longer side.
    Oval,
    /// Rectangle with every corner rounded.
    RoundRect {
        /// Corner radius.
        radius: i64,
    },
    /// Rectangle with selected corners modified.
    ///
    /// Selected corners are cut at 45° by `chamfer_ratio` of the smaller side;
    /// with a zero chamfer they are rounded by `round_ratio` of it instead.
    ChamferedRect {
        /// Chamfer size relative to the smaller side.
        chamfer_ratio: f64,
        /// Rounding radius relative to the smaller side.
        round_ratio: f64,
        /// Affected corners.
        corners: Chamfers,
    },
    /// Anchor shape merged with free polygons.
    Custom {
        /// Anchor.
        anchor: CustomAnchor,
        /// Extra copper in the pad frame.
        primitives: PolySet,
    },
}

/// Pad attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadAttribute {
    /// Surface mount.
    #[default]
    Smd,
    /// Plated through hole.
    Through,
    /// Non-plated hole.
    NonPlated,
}

/// Drill shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillShape {
    /// Round hole.
    #[default]
    Circle,
    /// Slot.
    Oblong,
}

/// Pad hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drill {
    /// Hole shape.
    pub shape: DrillShape,
    /// Hole extents.
    pub size: Size,
}

/// A pad belonging to a footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    /// Pad number or name. Pads sharing a name are one electrical pad.
    pub number: String,

    /// Mount style.
    pub attribute: PadAttribute,

    /// Copper shape.
    #[serde(flatten)]
    pub shape: PadShape,

    /// Copper extents before rotation.
    pub size: Size,

    /// Offset of the copper shape from the hole, before rotation.
    #[serde(default)]
    pub offset: Point,

    /// Hole, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drill: Option<Drill>,

    /// Layers the pad exists on.
    pub layers: LayerSet,

    /// Position of the hole in footprint-local coordinates.
    pub position: Point,

    /// Rotation in degrees, in footprint-local coordinates.
    #[serde(default)]
    pub orientation: f64,

    /// Solder mask expansion.
    #[serde(default)]
    pub solder_mask_margin: i64,

    /// Solder paste expansion.
    #[serde(default)]
    pub solder_paste_margin: i64,

    /// Thermal relief gap override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_gap: Option<i64>,

    /// Thermal relief spoke width override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_spoke_width: Option<i64>,

    /// Net, if connected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net: Option<NetCode>,

    /// Locked relative to the footprint.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

impl Pad {
    /// Creates a pad with no hole and no margins.
    #[must_use]
    pub fn new(number: impl Into<String>, shape: PadShape, size: Size, layers: LayerSet) -> Self {
        Self {
            number: number.into(),
            attribute: PadAttribute::Smd,
            shape,
            size,
            offset: Point::ORIGIN,
            drill: None,
            layers,
            position: Point::ORIGIN,
            orientation: 0.0,
            solder_mask_margin: 0,
            solder_paste_margin: 0,
            thermal_gap: None,
            thermal_spoke_width: None,
            net: None,
            locked: false,
        }
    }

    /// Copper outline centred on the origin, unrotated and without offset.
    #[must_use]
    pub fn shape_polygon(&self, segments_per_circle: u32) -> PolySet {
        let Size { x: w, y: h } = self.size;
        match &self.shape {
            PadShape::Circle => PolySet::from_outline(circle(Point::ORIGIN, w / 2, segments_per_circle)),
            PadShape::Rect => PolySet::from_outline(rectangle(Point::ORIGIN, w, h)),
            PadShape::Oval => {
                let r = w.min(h) / 2;
                let (a, b) = if w >= h {
                    (Point::new(-(w / 2 - r), 0), Point::new(w / 2 - r, 0))
                } else {
                    (Point::new(0, -(h / 2 - r)), Point::new(0, h / 2 - r))
                };
                PolySet::from_outline(capsule(a, b, r, segments_per_circle))
            }
            PadShape::RoundRect { radius } => {
                let r = (*radius).clamp(0, w.min(h) / 2);
                PolySet::from_outline(rectangle(Point::ORIGIN, w - 2 * r, h - 2 * r))
                    .inflated(r, segments_per_circle)
            }
            PadShape::ChamferedRect {
                chamfer_ratio,
                round_ratio,
                corners,
            } => PolySet::from_outline(chamfered_rect(
                self.size,
                *chamfer_ratio,
                *round_ratio,
                *corners,
                segments_per_circle,
            )),
            PadShape::Custom {
                anchor,
                primitives,
            } => {
                let anchor = match anchor {
                    CustomAnchor::Circle => circle(Point::ORIGIN, w / 2, segments_per_circle),
                    CustomAnchor::Rect => rectangle(Point::ORIGIN, w, h),
                };
                PolySet::from_outline(anchor).union(primitives)
            }
        }
    }

    fn mirror(&mut self, copper_count: u32) {
        self.position.x = -self.position.x;
        self.offset.x = -self.offset.x;
        self.orientation = normalize_angle_180(-self.orientation);
        self.layers = self.layers.flipped(copper_count);
        match &mut self.shape {
            PadShape::ChamferedRect { corners, .. } => *corners = corners.mirrored(),
            PadShape::Custom { primitives, .. } => {
                *primitives = primitives.map(|p| p.mirror_x(0));
            }
            _ => {}
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn chamfered_rect(
    size: Size,
    chamfer_ratio: f64,
    round_ratio: f64,
    corners: Chamfers,
    segments_per_circle: u32,
) -> LineChain {
    let (hw, hh) = (size.x / 2, size.y / 2);
    let short = size.min() as f64;
    let chamfer = round(short * chamfer_ratio.clamp(0.0, 0.5));
    let radius = round(short * round_ratio.clamp(0.0, 0.5));
    let quarter = (segments_per_circle / 4).max(2);

    let mut chain = LineChain::new();
    // Each corner with the directions towards its two neighbours, walked clockwise on screen.
    let layout = [
        (Chamfers::TOP_LEFT, Point::new(-hw, -hh), Point::new(0, 1), Point::new(1, 0)),
        (Chamfers::TOP_RIGHT, Point::new(hw, -hh), Point::new(-1, 0), Point::new(0, 1)),
        (Chamfers::BOTTOM_RIGHT, Point::new(hw, hh), Point::new(0, -1), Point::new(-1, 0)),
        (Chamfers::BOTTOM_LEFT, Point::new(-hw, hh), Point::new(1, 0), Point::new(0, -1)),
    ];
    for (corner, at, towards_prev, towards_next) in layout {
        if !corners.contains(corner) || (chamfer == 0 && radius == 0) {
            chain.append(at);
        } else if chamfer > 0 {
            chain.append(at + towards_prev * chamfer);
            chain.append(at + towards_next * chamfer);
        } else {
            let center = at + towards_prev * radius + towards_next * radius;
            let start = at + towards_prev * radius;
            for i in 0..=quarter {
                let fraction = f64::from(i) / f64::from(quarter);
                chain.append(start.rotate_about(center, -90.0 * fraction));
            }
        }
    }
    chain.close();
    chain
}

/// A placed footprint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Footprint {
    /// Library identifier.
    pub library_id: String,

    /// Reference designator.
    #[serde(default)]
    pub reference: String,

    /// Value field.
    #[serde(default)]
    pub value: String,

    /// Description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Search keywords.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keywords: String,

    /// Origin on the board.
    #[serde(default)]
    pub position: Point,

    /// Rotation in degrees.
    #[serde(default)]
    pub orientation: f64,

    /// Placed on the back side.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub flipped: bool,

    /// Locked against editing.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,

    /// Pads, addressed by position.
    #[serde(default)]
    pub pads: Vec<Pad>,

    /// Graphics.
    #[serde(default)]
    pub graphics: Vec<Graphic>,

    /// Texts.
    #[serde(default)]
    pub texts: Vec<Text>,

    /// Zones scoped to the footprint.
    #[serde(default)]
    pub zones: Vec<Zone>,
}

impl Footprint {
    /// Creates an empty footprint.
    #[must_use]
    pub fn new(library_id: impl Into<String>) -> Self {
        Self {
            library_id: library_id.into(),
            ..Self::default()
        }
    }

    /// Maps a footprint-local point onto the board.
    #[must_use]
    pub fn to_board(&self, local: Point) -> Point {
        local.rotate(self.orientation) + self.position
    }

    /// Board position of the pad at `index`.
    #[must_use]
    pub fn pad_position(&self, index: usize) -> Option<Point> {
        self.pads.get(index).map(|pad| self.to_board(pad.position))
    }

    /// Moves the footprint to the other side of the board.
    ///
    /// The footprint is mirrored left/right about the vertical line through
    /// its position. Children are mirrored in the local frame, their layers
    /// swapped, and the rotation is negated.
    pub fn flip(&mut self, copper_count: u32) {
        self.flipped = !self.flipped;
        self.orientation = normalize_angle_180(-self.orientation);
        let mirror = Transform {
            mirror: true,
            ..Transform::IDENTITY
        };
        for pad in &mut self.pads {
            pad.mirror(copper_count);
        }
        for graphic in &mut self.graphics {
            *graphic = Graphic {
                layer: graphic.layer.flipped(copper_count),
                ..graphic.transformed(&mirror)
            };
        }
        for text in &mut self.texts {
            text.position.x = -text.position.x;
            text.angle = normalize_angle_180(-text.angle);
            text.mirrored = !text.mirrored;
            text.layer = text.layer.flipped(copper_count);
        }
        for zone in &mut self.zones {
            zone.outline = zone.outline.map(|p| p.mirror_x(0));
            zone.layers = zone.layers.flipped(copper_count);
        }
    }

    /// Copper layers used by any pad.
    #[must_use]
    pub fn pad_layers(&self) -> LayerSet {
        self.pads
            .iter()
            .fold(LayerSet::new(), |acc, pad| acc | pad.layers)
    }

    /// Returns `true` if any child lies on `layer`.
    #[must_use]
    pub fn uses_layer(&self, layer: PcbLayer) -> bool {
        self.pad_layers().contains(layer)
            || self.graphics.iter().any(|g| g.layer == layer)
            || self.texts.iter().any(|t| t.layer == layer)
            || self.zones.iter().any(|z| z.layers.contains(layer))
    }
}
