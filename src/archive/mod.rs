//! Foreign archive object model.
//!
//! These types mirror a parsed CADSTAR PCB archive. The native file format is
//! parsed elsewhere; this crate consumes the resulting object graph as JSON.
//!
//! # Identifiers
//!
//! Records reference each other by typed ids (see [`LayerId`], [`NetId`], …).
//! Every table is an [`IndexMap`] so iteration follows the order in which
//! records appear in the archive.
//!
//! # Units
//!
//! Coordinates and lengths are integers in archive units. Angles are in
//! thousandths of a degree.

mod codes;
mod layers;
mod layout;
mod library;
mod shapes;

pub use codes::{
    Codes, CopperCode, Hatch, HatchCode, LayerPair, LineCode, PadCode, PadShape, PadShapeKind,
    RouteCode, TextCode, ViaCode,
};
pub use layers::{Embedding, Layer, LayerKind, LayerSubtype, Material};
pub use layout::{
    Area, BoardOutline, Component, ComponentVariant, Connection, Copper, Dimension, DimensionKind,
    DimensionLine, DimensionText, DocumentationSymbol, ExtensionLine, FillType, Group, Junction,
    Layout, LineStyle, LinearKind, Net, NetSynch, NetVia, PadException, Pin, Pouring, Route,
    RouteVertex, Template, Variant,
};
pub use library::{
    Alignment, ComponentArea, ComponentCopper, ComponentPad, Figure, PadSide, Part, PartPin,
    SymbolDef, Text,
};
pub use shapes::{ArchivePoint, Shape, ShapeKind, Vertex};

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::import::{ImportError, ImportResult};

macro_rules! archive_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub String);

            impl $name {
                /// Returns the id as a string slice.
                #[must_use]
                pub fn as_str(&self) -> &str {
                    &self.0
                }

                /// Returns `true` for an empty id.
                #[must_use]
                pub fn is_empty(&self) -> bool {
                    self.0.is_empty()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

archive_id!(
    /// Layer identifier.
    LayerId,
    /// Material identifier.
    MaterialId,
    /// Line code identifier.
    LineCodeId,
    /// Copper code identifier.
    CopperCodeId,
    /// Pad code identifier.
    PadCodeId,
    /// Via code identifier.
    ViaCodeId,
    /// Route code identifier.
    RouteCodeId,
    /// Hatch code identifier.
    HatchCodeId,
    /// Text code identifier.
    TextCodeId,
    /// Layer pair identifier.
    LayerPairId,
    /// Symbol (footprint) definition identifier.
    SymdefId,
    /// Part definition identifier.
    PartId,
    /// Group identifier.
    GroupId,
    /// Board outline identifier.
    BoardId,
    /// Figure identifier.
    FigureId,
    /// Text identifier.
    TextId,
    /// Dimension identifier.
    DimensionId,
    /// Area identifier.
    AreaId,
    /// Placed component identifier.
    ComponentId,
    /// Documentation symbol instance identifier.
    DocSymbolId,
    /// Template (copper pour) identifier.
    TemplateId,
    /// Copper element identifier.
    CopperId,
    /// Net identifier.
    NetId,
    /// Net element (pin, via or junction) identifier.
    NetElementId,
    /// Variant identifier.
    VariantId,
);

impl NetId {
    /// Returns `true` when the id refers to no net (empty or `NONE`).
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.0.is_empty() || self.0 == "NONE"
    }
}

/// Sequential pad number within a symbol definition, starting at 1.
///
/// Pads are addressed positionally: pad `n` is the `n - 1`th pad of the footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PadId(pub u32);

impl PadId {
    /// Zero-based position of the pad in its footprint.
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self.0.checked_sub(1) {
            Some(i) => Some(i as usize),
            None => None,
        }
    }
}

impl fmt::Display for PadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Root of a parsed archive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Archive {
    /// File header.
    #[serde(default)]
    pub header: Header,
    /// Units, design extents and physical layer count.
    pub technology: Technology,
    /// Layer definitions.
    #[serde(default)]
    pub layers: IndexMap<LayerId, Layer>,
    /// Layer stack order, top to bottom.
    #[serde(default)]
    pub layer_stack: Vec<LayerId>,
    /// Dielectric materials.
    #[serde(default)]
    pub materials: IndexMap<MaterialId, Material>,
    /// Code definitions (line, pad, via, route, … codes).
    #[serde(default)]
    pub codes: Codes,
    /// Footprint library.
    #[serde(default)]
    pub library: IndexMap<SymdefId, SymbolDef>,
    /// Part definitions.
    #[serde(default)]
    pub parts: IndexMap<PartId, Part>,
    /// Board contents.
    #[serde(default)]
    pub layout: Layout,
}

impl Archive {
    /// Parses an archive from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe an archive.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads an archive from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn read(path: impl AsRef<Path>) -> ImportResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ImportError::archive_read(path, e))?;
        Self::from_json(&contents).map_err(|e| ImportError::archive_parse(path, e))
    }

    /// Looks up a layer.
    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// Name of a layer, or its id if undefined.
    #[must_use]
    pub fn layer_name(&self, id: &LayerId) -> String {
        self.layers
            .get(id)
            .map_or_else(|| id.to_string(), |l| l.name.clone())
    }
}

/// File header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Header {
    /// Job title, exported as the design title text variable.
    #[serde(default)]
    pub job_title: String,
}

/// Units in which the archive displays lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    /// Metres.
    Meter,
    /// Centimetres.
    Centimeter,
    /// Millimetres.
    #[default]
    Millimeter,
    /// Micrometres.
    Micrometer,
    /// Inches.
    Inch,
    /// Thousandths of an inch.
    Thou,
    /// Whatever the technology section declares.
    Design,
}

/// Technology section: units and design extents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technology {
    /// Display units.
    #[serde(default)]
    pub units: Units,
    /// Host nanometres per archive unit.
    #[serde(default = "default_unit_multiplier")]
    pub unit_multiplier: i64,
    /// Number of decimals shown for lengths.
    #[serde(default = "default_unit_precision")]
    pub unit_display_precision: u32,
    /// Lower-left and upper-right corners of the design area.
    pub design_area: (ArchivePoint, ArchivePoint),
    /// Maximum design extent.
    pub design_limit: ArchivePoint,
    /// Minimum route width rule.
    #[serde(default)]
    pub min_route_width: i64,
    /// Number of physical (copper) layers.
    #[serde(default)]
    pub max_physical_layer: u32,
}

impl Default for Technology {
    fn default() -> Self {
        Self {
            units: Units::default(),
            unit_multiplier: default_unit_multiplier(),
            unit_display_precision: default_unit_precision(),
            design_area: (ArchivePoint::default(), ArchivePoint::default()),
            design_limit: ArchivePoint::default(),
            min_route_width: 0,
            max_physical_layer: 0,
        }
    }
}

const fn default_unit_multiplier() -> i64 {
    10
}

const fn default_unit_precision() -> u32 {
    2
}
