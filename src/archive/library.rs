//! Footprint library and part definitions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    AreaId, ArchivePoint, CopperCodeId, FigureId, GroupId, LayerId, LineCodeId, PadCodeId, PadId,
    Shape, TextCodeId, TextId,
};

/// A footprint definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolDef {
    /// Reference name, e.g. `SOIC8`.
    pub reference_name: String,
    /// Alternate name, e.g. `WAVE`.
    #[serde(default)]
    pub alternate: String,
    /// Footprint origin.
    #[serde(default)]
    pub origin: ArchivePoint,
    /// Graphic figures.
    #[serde(default)]
    pub figures: IndexMap<FigureId, Figure>,
    /// Text items.
    #[serde(default)]
    pub texts: IndexMap<TextId, Text>,
    /// Pads, numbered sequentially from 1.
    #[serde(default)]
    pub pads: IndexMap<PadId, ComponentPad>,
    /// Copper elements.
    #[serde(default)]
    pub coppers: Vec<ComponentCopper>,
    /// Keepout areas.
    #[serde(default)]
    pub areas: IndexMap<AreaId, ComponentArea>,
}

impl SymbolDef {
    /// Display name combining reference and alternate names.
    #[must_use]
    pub fn build_name(&self) -> String {
        if self.alternate.is_empty() {
            self.reference_name.clone()
        } else {
            format!("{} ({})", self.reference_name, self.alternate)
        }
    }
}

/// A graphic figure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    /// Layer (may be an aggregate layer).
    pub layer: LayerId,
    /// Stroke width code.
    pub line_code: LineCodeId,
    /// Geometry.
    pub shape: Shape,
    /// Owning group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    /// Locked against editing.
    #[serde(default)]
    pub fixed: bool,
}

/// Text anchor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Not specified; treated as bottom-left with a multi-line correction.
    #[default]
    NoAlignment,
    /// Top left.
    TopLeft,
    /// Top centre.
    TopCenter,
    /// Top right.
    TopRight,
    /// Centre left.
    CenterLeft,
    /// Centre.
    CenterCenter,
    /// Centre right.
    CenterRight,
    /// Bottom left.
    BottomLeft,
    /// Bottom centre.
    BottomCenter,
    /// Bottom right.
    BottomRight,
}

/// A free text item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    /// Text content, possibly with `<@FIELD@>` placeholders.
    pub text: String,
    /// Style code.
    pub text_code: TextCodeId,
    /// Anchor position.
    pub position: ArchivePoint,
    /// Layer (may be an aggregate layer).
    pub layer: LayerId,
    /// Rotation, thousandths of a degree.
    #[serde(default)]
    pub orient_angle: i64,
    /// Mirrored (reads from the back).
    #[serde(default)]
    pub mirror: bool,
    /// Anchor alignment.
    #[serde(default)]
    pub alignment: Alignment,
    /// Owning group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
}

/// Which side of the board a pad sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadSide {
    /// Bottom surface only.
    Bottom,
    /// Top surface only.
    Top,
    /// Through every layer.
    #[default]
    ThroughHole,
}

/// A pad inside a footprint definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentPad {
    /// Pad stack.
    pub pad_code: PadCodeId,
    /// Position.
    pub position: ArchivePoint,
    /// Board side.
    #[serde(default)]
    pub side: PadSide,
    /// Rotation, thousandths of a degree.
    #[serde(default)]
    pub orient_angle: i64,
    /// Pad name; falls back to the pad number when empty.
    #[serde(default)]
    pub identifier: String,
    /// Mechanical pad with no schematic pin.
    #[serde(default)]
    pub pcb_only: bool,
}

/// A copper element inside a footprint definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCopper {
    /// Copper width code.
    pub copper_code: CopperCodeId,
    /// Layer.
    pub layer: LayerId,
    /// Geometry.
    pub shape: Shape,
    /// Pads electrically tied to this copper.
    #[serde(default)]
    pub associated_pads: Vec<PadId>,
}

/// A keepout area inside a footprint definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentArea {
    /// Area name.
    #[serde(default)]
    pub name: String,
    /// Layer.
    pub layer: LayerId,
    /// Outline stroke code.
    pub line_code: LineCodeId,
    /// Geometry.
    pub shape: Shape,
    /// Tracks are forbidden.
    #[serde(default)]
    pub no_tracks: bool,
    /// Vias are forbidden.
    #[serde(default)]
    pub no_vias: bool,
}

/// A part definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    /// Part name.
    pub name: String,
    /// Pins keyed by the pad number they land on.
    #[serde(default)]
    pub pins: IndexMap<PadId, PartPin>,
}

/// A part pin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartPin {
    /// Pin name.
    #[serde(default)]
    pub name: String,
    /// Pin identifier, used when the name is empty.
    #[serde(default)]
    pub identifier: String,
}
