//! Host board model.
//!
//! This is the target of an import: a flat, id-addressed collection of board
//! items plus board-wide settings. Groups reference their members by
//! [`ItemId`]; an item belongs to at most one immediate parent group.

mod footprint;
mod items;
mod layer;
mod stackup;

pub use footprint::{
    Chamfers, CustomAnchor, Drill, DrillShape, Footprint, Pad, PadAttribute, PadShape,
};
pub use items::{
    BorderStyle, Dimension, DimensionKind, DimensionUnits, FillMode, Graphic, GraphicShape,
    Group, HatchSettings, HorizontalJustify, IslandRemoval, Keepout, PadConnection, Size, Text,
    Track, TrackShape, UnitsFormat, VerticalJustify, Via, ViaType, Zone,
};
pub use layer::{LayerSet, PcbLayer, MAX_COPPER_LAYERS};
pub use stackup::{CopperLayerType, DielectricKind, DielectricLayer, Stackup, StackupItem};

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a top-level board item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Net code. Codes start at 1; an unconnected item has no code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetCode(pub u32);

/// Errors raised by board edits.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// No item has this id.
    #[error("no board item {0}")]
    UnknownItem(ItemId),

    /// The item exists but is not a group.
    #[error("board item {0} is not a group")]
    NotAGroup(ItemId),

    /// Adding the member would make a group contain itself.
    #[error("adding {member} to group {group} would create a cycle")]
    GroupCycle {
        /// Target group.
        group: ItemId,
        /// Rejected member.
        member: ItemId,
    },
}

/// A top-level board item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardItem {
    /// Placed footprint.
    Footprint(Footprint),
    /// Track or arc.
    Track(Track),
    /// Via.
    Via(Via),
    /// Zone or rule area.
    Zone(Zone),
    /// Graphic shape.
    Graphic(Graphic),
    /// Text.
    Text(Text),
    /// Dimension.
    Dimension(Dimension),
    /// Group.
    Group(Group),
}

macro_rules! board_item_kind {
    ($variant:ident, $ty:ty, $get:ident, $get_mut:ident, $iter:ident) => {
        impl From<$ty> for BoardItem {
            fn from(item: $ty) -> Self {
                Self::$variant(item)
            }
        }

        impl Board {
            #[doc = concat!("Returns the ", stringify!($variant), " with this id.")]
            #[must_use]
            pub fn $get(&self, id: ItemId) -> Option<&$ty> {
                match self.items.get(&id) {
                    Some(BoardItem::$variant(item)) => Some(item),
                    _ => None,
                }
            }

            #[doc = concat!("Returns the ", stringify!($variant), " with this id, mutably.")]
            pub fn $get_mut(&mut self, id: ItemId) -> Option<&mut $ty> {
                match self.items.get_mut(&id) {
                    Some(BoardItem::$variant(item)) => Some(item),
                    _ => None,
                }
            }

            #[doc = concat!("Every ", stringify!($variant), " in insertion order.")]
            pub fn $iter(&self) -> impl Iterator<Item = (ItemId, &$ty)> + '_ {
                self.items.iter().filter_map(|(id, item)| match item {
                    BoardItem::$variant(item) => Some((*id, item)),
                    _ => None,
                })
            }
        }
    };
}

board_item_kind!(Footprint, Footprint, footprint, footprint_mut, footprints);
board_item_kind!(Track, Track, track, track_mut, tracks);
board_item_kind!(Via, Via, via, via_mut, vias);
board_item_kind!(Zone, Zone, zone, zone_mut, zones);
board_item_kind!(Graphic, Graphic, graphic, graphic_mut, graphics);
board_item_kind!(Text, Text, text, text_mut, texts);
board_item_kind!(Dimension, Dimension, dimension, dimension_mut, dimensions);
board_item_kind!(Group, Group, group, group_mut, groups);

/// Board-wide design rule minimums, in nanometres.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignSettings {
    /// Copper-to-copper clearance.
    pub min_clearance: i64,
    /// Copper-to-board-edge clearance.
    pub copper_edge_clearance: i64,
    /// Hole-to-hole spacing.
    pub hole_to_hole_min: i64,
    /// Minimum track width.
    pub track_min_width: i64,
    /// Minimum via diameter.
    pub via_min_size: i64,
    /// Minimum via annular ring.
    pub via_min_annular_width: i64,
    /// Minimum through-hole drill.
    pub min_through_drill: i64,
    /// Hole-to-copper clearance.
    pub hole_clearance: i64,
    /// Maximum deviation when approximating arcs.
    pub max_error: i64,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            min_clearance: 200_000,
            copper_edge_clearance: 500_000,
            hole_to_hole_min: 250_000,
            track_min_width: 200_000,
            via_min_size: 400_000,
            via_min_annular_width: 100_000,
            min_through_drill: 300_000,
            hole_clearance: 0,
            max_error: 5_000,
        }
    }
}

/// Net class.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetClass {
    /// Name.
    pub name: String,

    /// Default track width.
    pub track_width: i64,

    /// Description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Name of the class every net starts in.
pub const DEFAULT_NET_CLASS: &str = "Default";

/// A net.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetInfo {
    /// Code.
    pub code: NetCode,

    /// Name.
    pub name: String,

    /// Net class name.
    pub net_class: String,
}

/// Project-level settings written next to the board.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Project {
    /// Text variables, referenced from text as `${NAME}`.
    #[serde(default)]
    pub text_vars: BTreeMap<String, String>,
}

/// A board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    design_settings: DesignSettings,
    stackup: Stackup,
    copper_layer_count: u32,
    enabled_layers: LayerSet,
    visible_layers: LayerSet,
    #[serde(default)]
    layer_names: BTreeMap<PcbLayer, String>,
    #[serde(default)]
    layer_types: BTreeMap<PcbLayer, CopperLayerType>,
    #[serde(default)]
    nets: Vec<NetInfo>,
    #[serde(default)]
    net_classes: IndexMap<String, NetClass>,
    #[serde(default)]
    items: IndexMap<ItemId, BoardItem>,
    #[serde(default)]
    next_id: u32,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Creates an empty two-layer board.
    #[must_use]
    pub fn new() -> Self {
        let enabled = LayerSet::all_copper(2) | LayerSet::all_technical() | LayerSet::all_user();
        let mut net_classes = IndexMap::new();
        net_classes.insert(
            DEFAULT_NET_CLASS.to_string(),
            NetClass {
                name: DEFAULT_NET_CLASS.to_string(),
                track_width: DesignSettings::default().track_min_width,
                description: String::new(),
            },
        );
        Self {
            design_settings: DesignSettings::default(),
            stackup: Stackup::new(),
            copper_layer_count: 2,
            enabled_layers: enabled,
            visible_layers: enabled,
            layer_names: BTreeMap::new(),
            layer_types: BTreeMap::new(),
            nets: Vec::new(),
            net_classes,
            items: IndexMap::new(),
            next_id: 1,
        }
    }

    /// Design rule minimums.
    #[must_use]
    pub const fn design_settings(&self) -> &DesignSettings {
        &self.design_settings
    }

    /// Design rule minimums, mutably.
    pub fn design_settings_mut(&mut self) -> &mut DesignSettings {
        &mut self.design_settings
    }

    /// Physical stackup.
    #[must_use]
    pub const fn stackup(&self) -> &Stackup {
        &self.stackup
    }

    /// Replaces the physical stackup.
    pub fn set_stackup(&mut self, stackup: Stackup) {
        self.stackup = stackup;
    }

    /// Number of copper layers.
    #[must_use]
    pub const fn copper_layer_count(&self) -> u32 {
        self.copper_layer_count
    }

    /// Sets the number of copper layers, enabling exactly that many.
    pub fn set_copper_layer_count(&mut self, count: u32) {
        let count = count.clamp(2, MAX_COPPER_LAYERS);
        let non_copper: LayerSet = self.enabled_layers.iter().filter(|l| !l.is_copper()).collect();
        self.copper_layer_count = count;
        self.enabled_layers = non_copper | LayerSet::all_copper(count);
    }

    /// Enabled layers.
    #[must_use]
    pub const fn enabled_layers(&self) -> LayerSet {
        self.enabled_layers
    }

    /// Sets the enabled layers.
    pub fn set_enabled_layers(&mut self, layers: LayerSet) {
        self.enabled_layers = layers;
    }

    /// Visible layers.
    #[must_use]
    pub const fn visible_layers(&self) -> LayerSet {
        self.visible_layers
    }

    /// Sets the visible layers.
    pub fn set_visible_layers(&mut self, layers: LayerSet) {
        self.visible_layers = layers;
    }

    /// User name of a layer, defaulting to its canonical name.
    #[must_use]
    pub fn layer_name(&self, layer: PcbLayer) -> String {
        self.layer_names
            .get(&layer)
            .cloned()
            .unwrap_or_else(|| layer.name())
    }

    /// Sets the user name of a layer.
    pub fn set_layer_name(&mut self, layer: PcbLayer, name: impl Into<String>) {
        self.layer_names.insert(layer, name.into());
    }

    /// Electrical role of a copper layer.
    #[must_use]
    pub fn layer_type(&self, layer: PcbLayer) -> CopperLayerType {
        self.layer_types.get(&layer).copied().unwrap_or_default()
    }

    /// Sets the electrical role of a copper layer.
    pub fn set_layer_type(&mut self, layer: PcbLayer, role: CopperLayerType) {
        self.layer_types.insert(layer, role);
    }

    /// Adds an item and returns its id.
    pub fn add(&mut self, item: impl Into<BoardItem>) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.items.insert(id, item.into());
        id
    }

    /// Removes an item, detaching it from its group.
    pub fn remove(&mut self, id: ItemId) -> Option<BoardItem> {
        let item = self.items.shift_remove(&id)?;
        for other in self.items.values_mut() {
            if let BoardItem::Group(group) = other {
                group.members.retain(|m| *m != id);
            }
        }
        Some(item)
    }

    /// Returns the item with this id.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&BoardItem> {
        self.items.get(&id)
    }

    /// Every item in insertion order.
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &BoardItem)> + '_ {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    /// Number of items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// The group directly containing `id`.
    #[must_use]
    pub fn parent_group(&self, id: ItemId) -> Option<ItemId> {
        self.groups()
            .find(|(_, g)| g.members.contains(&id))
            .map(|(gid, _)| gid)
    }

    /// Makes `member` a direct member of `group`, leaving any previous group.
    ///
    /// # Errors
    ///
    /// Returns an error if either id is unknown, `group` is not a group, or
    /// `member` is `group` or one of its ancestors.
    pub fn add_to_group(&mut self, group: ItemId, member: ItemId) -> Result<(), BoardError> {
        if !self.items.contains_key(&member) {
            return Err(BoardError::UnknownItem(member));
        }
        match self.items.get(&group) {
            None => return Err(BoardError::UnknownItem(group)),
            Some(BoardItem::Group(_)) => {}
            Some(_) => return Err(BoardError::NotAGroup(group)),
        }
        let mut ancestor = Some(group);
        while let Some(current) = ancestor {
            if current == member {
                return Err(BoardError::GroupCycle { group, member });
            }
            ancestor = self.parent_group(current);
        }

        if let Some(previous) = self.parent_group(member) {
            if let Some(g) = self.group_mut(previous) {
                g.members.retain(|m| *m != member);
            }
        }
        if let Some(g) = self.group_mut(group) {
            g.members.push(member);
        }
        Ok(())
    }

    /// Adds a net and returns its code.
    pub fn add_net(&mut self, name: impl Into<String>) -> NetCode {
        let code = NetCode(u32::try_from(self.nets.len()).unwrap_or(u32::MAX - 1) + 1);
        self.nets.push(NetInfo {
            code,
            name: name.into(),
            net_class: DEFAULT_NET_CLASS.to_string(),
        });
        code
    }

    /// Returns the net with this code.
    #[must_use]
    pub fn net(&self, code: NetCode) -> Option<&NetInfo> {
        self.nets.get((code.0 as usize).checked_sub(1)?)
    }

    /// Returns the net with this code, mutably.
    pub fn net_mut(&mut self, code: NetCode) -> Option<&mut NetInfo> {
        self.nets.get_mut((code.0 as usize).checked_sub(1)?)
    }

    /// Finds a net by name.
    #[must_use]
    pub fn net_by_name(&self, name: &str) -> Option<&NetInfo> {
        self.nets.iter().find(|n| n.name == name)
    }

    /// Every net, by code.
    #[must_use]
    pub fn nets(&self) -> &[NetInfo] {
        &self.nets
    }

    /// Adds or replaces a net class.
    pub fn add_net_class(&mut self, class: NetClass) {
        self.net_classes.insert(class.name.clone(), class);
    }

    /// Returns a net class by name.
    #[must_use]
    pub fn net_class(&self, name: &str) -> Option<&NetClass> {
        self.net_classes.get(name)
    }

    /// Every net class.
    pub fn net_classes(&self) -> impl Iterator<Item = &NetClass> + '_ {
        self.net_classes.values()
    }
}
