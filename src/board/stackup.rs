//! Physical board stackup.

use serde::{Deserialize, Serialize};

use super::layer::PcbLayer;

/// Electrical role of a copper layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopperLayerType {
    /// Routing layer.
    #[default]
    Signal,
    /// Plane layer.
    Power,
    /// Jumper layer.
    Jumper,
}

/// Whether a dielectric is laminated as a core or as prepreg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DielectricKind {
    /// Cured core.
    Core,
    /// Bonding prepreg.
    #[default]
    Prepreg,
}

/// One material layer inside a dielectric.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DielectricLayer {
    /// Foreign layer name.
    pub name: String,

    /// Material name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub material: String,

    /// Relative permittivity.
    #[serde(default)]
    pub epsilon_r: f64,

    /// Loss tangent.
    #[serde(default)]
    pub loss_tangent: f64,

    /// Thickness in nanometres.
    pub thickness: i64,
}

/// A stackup entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StackupItem {
    /// A copper layer.
    Copper {
        /// Host layer.
        layer: PcbLayer,
        /// Display name.
        name: String,
        /// Thickness in nanometres.
        thickness: i64,
        /// Electrical role.
        role: CopperLayerType,
    },
    /// A dielectric between two copper layers.
    Dielectric {
        /// 1-based dielectric index from the top.
        number: u32,
        /// Lamination kind.
        kind: DielectricKind,
        /// Material layers, top first.
        sublayers: Vec<DielectricLayer>,
    },
}

/// Ordered stackup, top first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stackup {
    items: Vec<StackupItem>,
}

impl Stackup {
    /// Creates an empty stackup.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Appends an entry.
    pub fn push(&mut self, item: StackupItem) {
        self.items.push(item);
    }

    /// Entries, top first.
    #[must_use]
    pub fn items(&self) -> &[StackupItem] {
        &self.items
    }

    /// Number of copper entries.
    #[must_use]
    pub fn copper_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i, StackupItem::Copper { .. }))
            .count()
    }

    /// Total thickness in nanometres.
    #[must_use]
    pub fn thickness(&self) -> i64 {
        self.items
            .iter()
            .map(|item| match item {
                StackupItem::Copper { thickness, .. } => *thickness,
                StackupItem::Dielectric { sublayers, .. } => {
                    sublayers.iter().map(|s| s.thickness).sum()
                }
            })
            .sum()
    }
}
