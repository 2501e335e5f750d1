//! Code definitions: reusable line widths, pad stacks, via stacks and so on.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    CopperCodeId, HatchCodeId, LayerId, LayerPairId, LineCodeId, PadCodeId, RouteCodeId,
    TextCodeId, ViaCodeId,
};

/// Every code table in the archive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Codes {
    /// Line widths for graphics.
    #[serde(default)]
    pub line_codes: IndexMap<LineCodeId, LineCode>,
    /// Copper widths for copper elements and pours.
    #[serde(default)]
    pub copper_codes: IndexMap<CopperCodeId, CopperCode>,
    /// Pad stacks.
    #[serde(default)]
    pub pad_codes: IndexMap<PadCodeId, PadCode>,
    /// Via stacks.
    #[serde(default)]
    pub via_codes: IndexMap<ViaCodeId, ViaCode>,
    /// Route width rules.
    #[serde(default)]
    pub route_codes: IndexMap<RouteCodeId, RouteCode>,
    /// Hatch patterns.
    #[serde(default)]
    pub hatch_codes: IndexMap<HatchCodeId, HatchCode>,
    /// Text styles.
    #[serde(default)]
    pub text_codes: IndexMap<TextCodeId, TextCode>,
    /// Spacing rules keyed by rule name (`T_T`, `C_B`, `H_H`, `C_C`, …).
    #[serde(default)]
    pub spacing_codes: IndexMap<String, i64>,
    /// Via layer spans.
    #[serde(default)]
    pub layer_pairs: IndexMap<LayerPairId, LayerPair>,
}

/// A line width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineCode {
    /// Code name.
    #[serde(default)]
    pub name: String,
    /// Stroke width.
    pub width: i64,
}

/// A copper width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopperCode {
    /// Code name.
    #[serde(default)]
    pub name: String,
    /// Copper width.
    pub copper_width: i64,
}

/// Base pad shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadShapeKind {
    /// Ring.
    Annulus,
    /// Rectangle with one rounded end.
    Bullet,
    /// Circle.
    Circle,
    /// Square rotated by 45 degrees.
    Diamond,
    /// Oblong with two rounded ends.
    Finger,
    /// Regular octagon.
    Octagon,
    /// Rectangle.
    Rectangle,
    /// Rectangle with rounded corners.
    RoundedRect,
    /// Square.
    Square,
}

/// Shape of a pad on one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadShape {
    /// Base kind.
    #[serde(rename = "type")]
    pub kind: PadShapeKind,
    /// Primary size (diameter or short side).
    pub size: i64,
    /// Extension to the left of the origin.
    #[serde(default)]
    pub left_length: i64,
    /// Extension to the right of the origin.
    #[serde(default)]
    pub right_length: i64,
    /// Secondary feature: corner radius, annulus hole, …
    #[serde(default)]
    pub internal_feature: i64,
    /// Rotation of the shape, thousandths of a degree.
    #[serde(default)]
    pub orient_angle: i64,
}

impl PadShape {
    /// Creates a shape of the given kind and size.
    #[must_use]
    pub const fn new(kind: PadShapeKind, size: i64) -> Self {
        Self {
            kind,
            size,
            left_length: 0,
            right_length: 0,
            internal_feature: 0,
            orient_angle: 0,
        }
    }
}

/// A pad stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadCode {
    /// Code name.
    #[serde(default)]
    pub name: String,
    /// Nominal shape.
    pub shape: PadShape,
    /// Whether the hole is plated.
    #[serde(default = "default_true")]
    pub plated: bool,
    /// Hole diameter, if drilled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drill_diameter: Option<i64>,
    /// Slot length, if the hole is a slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_length: Option<i64>,
    /// Slot rotation, thousandths of a degree.
    #[serde(default)]
    pub slot_orientation: i64,
    /// Hole offset from the pad origin along X.
    #[serde(default)]
    pub drill_x_offset: i64,
    /// Hole offset from the pad origin along Y.
    #[serde(default)]
    pub drill_y_offset: i64,
    /// Per-layer shape overrides.
    #[serde(default)]
    pub reassigns: IndexMap<LayerId, PadShape>,
    /// Thermal relief gap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relief_clearance: Option<i64>,
    /// Thermal relief spoke width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relief_width: Option<i64>,
}

const fn default_true() -> bool {
    true
}

/// A via stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViaCode {
    /// Code name.
    #[serde(default)]
    pub name: String,
    /// Via pad shape.
    pub shape: PadShape,
    /// Hole diameter.
    pub drill_diameter: i64,
}

/// Route width rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteCode {
    /// Code name.
    #[serde(default)]
    pub name: String,
    /// Preferred track width.
    #[serde(default)]
    pub optimal_width: i64,
    /// Minimum track width.
    #[serde(default)]
    pub min_width: i64,
    /// Maximum track width.
    #[serde(default)]
    pub max_width: i64,
}

/// One set of parallel hatch lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hatch {
    /// Line width.
    pub line_width: i64,
    /// Distance between line centres.
    pub step: i64,
    /// Line angle, thousandths of a degree.
    #[serde(default)]
    pub orient_angle: i64,
}

/// A hatch pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HatchCode {
    /// Code name.
    #[serde(default)]
    pub name: String,
    /// Hatch line sets.
    #[serde(default)]
    pub hatches: Vec<Hatch>,
}

/// A text style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextCode {
    /// Code name.
    #[serde(default)]
    pub name: String,
    /// Stroke width.
    #[serde(default)]
    pub line_width: i64,
    /// Character height.
    pub height: i64,
    /// Character width; zero for proportional fonts.
    #[serde(default)]
    pub width: i64,
}

/// A span of physical layers used by vias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerPair {
    /// Pair name.
    #[serde(default)]
    pub name: String,
    /// First physical layer (1-based).
    pub physical_layer_start: u32,
    /// Last physical layer (1-based).
    pub physical_layer_end: u32,
}
