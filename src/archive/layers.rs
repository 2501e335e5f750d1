//! Layer definitions and dielectric materials.

use serde::{Deserialize, Serialize};

use super::MaterialId;

/// Declared layer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Routing copper layer.
    Elec,
    /// Power plane copper layer.
    Power,
    /// Jumper (wire link) copper layer.
    Jumper,
    /// Dielectric between copper layers.
    Construction,
    /// Documentation layer.
    Doc,
    /// Non-electrical layer qualified by [`LayerSubtype`].
    Nonelec,
    /// Aggregate of every documentation layer.
    Alldoc,
    /// Aggregate of every electrical layer.
    Allelec,
    /// Aggregate of every layer.
    Alllayer,
    /// Assembly/component copper placeholder.
    Asscompcopp,
    /// Placeholder meaning "no layer".
    Nolayer,
}

impl LayerKind {
    /// Returns `true` for layers that carry copper.
    #[must_use]
    pub const fn is_electrical(self) -> bool {
        matches!(self, Self::Elec | Self::Power | Self::Jumper)
    }

    /// Returns `true` for aggregate or placeholder layer types.
    #[must_use]
    pub const fn is_aggregate(self) -> bool {
        matches!(
            self,
            Self::Alldoc | Self::Allelec | Self::Alllayer | Self::Asscompcopp | Self::Nolayer
        )
    }
}

/// Subtype of a non-electrical layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSubtype {
    /// No declared purpose.
    #[default]
    None,
    /// Assembly drawing.
    Assembly,
    /// Component placement outline (courtyard).
    Placement,
    /// Silkscreen legend.
    Silkscreen,
    /// Solder resist (mask).
    Solderresist,
    /// Solder paste.
    Paste,
    /// Routing/milling outline.
    Rout,
    /// Clearance outline.
    Clearance,
}

/// Which neighbour a copper layer is bonded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Embedding {
    /// Not specified.
    #[default]
    None,
    /// Embedded into the dielectric above.
    Above,
    /// Embedded into the dielectric below.
    Below,
}

/// A layer definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    /// Display name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub kind: LayerKind,
    /// Subtype for non-electrical layers.
    #[serde(default)]
    pub subtype: LayerSubtype,
    /// Embedding direction for copper layers.
    #[serde(default)]
    pub embedding: Embedding,
    /// Material, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialId>,
    /// Thickness in archive units.
    #[serde(default)]
    pub thickness: i64,
    /// Physical (copper) layer number, 1-based, for electrical layers.
    #[serde(default)]
    pub physical_layer: u32,
}

impl Layer {
    /// Creates a layer with no subtype, material or thickness.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            subtype: LayerSubtype::None,
            embedding: Embedding::None,
            material: None,
            thickness: 0,
            physical_layer: 0,
        }
    }
}

/// A dielectric material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    /// Material name.
    pub name: String,
    /// Relative permittivity.
    #[serde(default)]
    pub permittivity: f64,
    /// Loss tangent.
    #[serde(default)]
    pub loss_tangent: f64,
}
