//! Board contents: placed items, pours, nets and annotations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    AreaId, ArchivePoint, BoardId, ComponentId, CopperCodeId, CopperId, DimensionId, DocSymbolId,
    FigureId, Figure, GroupId, HatchCodeId, LayerId, LayerPairId, LineCodeId, NetElementId, NetId,
    PadCodeId, PadId, PadSide, PartId, RouteCodeId, Shape, SymdefId, TemplateId, Text,
    TextCodeId, TextId, Units, VariantId, ViaCodeId, Vertex,
};

/// Everything placed on the board.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layout {
    /// How the layout is kept in step with the schematic.
    #[serde(default)]
    pub net_synch: NetSynch,
    /// Groups.
    #[serde(default)]
    pub groups: IndexMap<GroupId, Group>,
    /// Board outlines.
    #[serde(default)]
    pub boards: IndexMap<BoardId, BoardOutline>,
    /// Free figures.
    #[serde(default)]
    pub figures: IndexMap<FigureId, Figure>,
    /// Free texts.
    #[serde(default)]
    pub texts: IndexMap<TextId, Text>,
    /// Dimensions.
    #[serde(default)]
    pub dimensions: IndexMap<DimensionId, Dimension>,
    /// Keepout and placement areas.
    #[serde(default)]
    pub areas: IndexMap<AreaId, Area>,
    /// Placed components.
    #[serde(default)]
    pub components: IndexMap<ComponentId, Component>,
    /// Placed documentation symbols.
    #[serde(default)]
    pub documentation_symbols: IndexMap<DocSymbolId, DocumentationSymbol>,
    /// Copper pour templates.
    #[serde(default)]
    pub templates: IndexMap<TemplateId, Template>,
    /// Copper elements, poured or free.
    #[serde(default)]
    pub coppers: IndexMap<CopperId, Copper>,
    /// Nets.
    #[serde(default)]
    pub nets: IndexMap<NetId, Net>,
    /// Trunk (bus) names.
    #[serde(default)]
    pub trunks: Vec<String>,
    /// Design variants; the first one is the loaded variant.
    #[serde(default)]
    pub variants: IndexMap<VariantId, Variant>,
    /// Re-use block names.
    #[serde(default)]
    pub reuse_blocks: Vec<String>,
}

/// Net synchronisation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetSynch {
    /// Not declared.
    #[default]
    Undefined,
    /// Warn on differences.
    Warning,
    /// Fully synchronised.
    Full,
}

/// A group of items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Group name.
    pub name: String,
    /// Enclosing group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<GroupId>,
    /// Locked against editing.
    #[serde(default)]
    pub fixed: bool,
}

/// A board outline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardOutline {
    /// Outline stroke code.
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

/// Dimension family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    /// Linear measurement.
    Lineardim,
    /// Leader, radius or diameter.
    Leaderdim,
    /// Angular measurement.
    Angledim,
}

/// Subtype of a linear dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearKind {
    /// Measures along the line between the points.
    #[default]
    Direct,
    /// Measures along X or Y.
    Orthogonal,
    /// Measures along an arbitrary angle.
    Angled,
    /// Radius, diameter and other non-linear subtypes.
    Other,
}

/// Drawing style of a dimension line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    /// Arrows inside the extension lines.
    #[default]
    Internal,
    /// Arrows outside the extension lines.
    External,
}

/// The dimension line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionLine {
    /// Stroke code.
    pub line_code: LineCodeId,
    /// Arrow style.
    #[serde(default)]
    pub style: LineStyle,
    /// Start of the crossbar.
    pub start: ArchivePoint,
    /// End of the crossbar.
    pub end: ArchivePoint,
    /// Leader angle, thousandths of a degree.
    #[serde(default)]
    pub leader_angle: i64,
    /// Length of the angled leader segment.
    #[serde(default)]
    pub leader_line_length: i64,
    /// Length of the horizontal leader segment.
    #[serde(default)]
    pub leader_line_extension_length: i64,
}

/// Extension line parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtensionLine {
    /// First measured point.
    pub start: ArchivePoint,
    /// Second measured point.
    pub end: ArchivePoint,
    /// Gap between the measured point and the extension line.
    #[serde(default)]
    pub offset: i64,
    /// Extension past the crossbar.
    #[serde(default)]
    pub overshoot: i64,
}

/// Dimension label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionText {
    /// Label, containing a `<@DISTANCE@>` field for the measured value.
    #[serde(default)]
    pub text: String,
    /// Style code.
    pub text_code: TextCodeId,
}

/// A dimension annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dimension {
    /// Family.
    #[serde(rename = "type")]
    pub kind: DimensionKind,
    /// Linear subtype.
    #[serde(default)]
    pub subtype: LinearKind,
    /// Layer.
    pub layer: LayerId,
    /// Decimal places shown.
    #[serde(default)]
    pub precision: u32,
    /// Units of the measured value.
    #[serde(default)]
    pub linear_units: Units,
    /// Label.
    pub text: DimensionText,
    /// Crossbar.
    pub line: DimensionLine,
    /// Extension lines.
    #[serde(default)]
    pub extension: ExtensionLine,
}

/// A keepout, routing or placement area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    /// Area name.
    #[serde(default)]
    pub name: String,
    /// Layer (may be an aggregate layer).
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
    /// Components are forbidden.
    #[serde(default)]
    pub keepout: bool,
    /// Components may be placed here.
    #[serde(default)]
    pub placement: bool,
    /// Routing area.
    #[serde(default)]
    pub routing: bool,
}

/// Variant membership of a component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentVariant {
    /// Variant the component belongs to.
    pub variant: VariantId,
    /// Component of the master variant this one derives from.
    pub parent: ComponentId,
}

/// Per-pad overrides on a placed component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PadException {
    /// Replacement pad stack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pad_code: Option<PadCodeId>,
    /// Replacement side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<PadSide>,
    /// Replacement rotation, thousandths of a degree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orient_angle: Option<i64>,
}

/// A placed component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// Reference designator.
    pub name: String,
    /// Footprint definition.
    pub symdef: SymdefId,
    /// Part definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<PartId>,
    /// Placement position.
    pub origin: ArchivePoint,
    /// Rotation, thousandths of a degree.
    #[serde(default)]
    pub orient_angle: i64,
    /// Placed on the bottom side.
    #[serde(default)]
    pub mirror: bool,
    /// Locked against editing.
    #[serde(default)]
    pub fixed: bool,
    /// Variant membership; absent for components of every variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<ComponentVariant>,
    /// Pad overrides.
    #[serde(default)]
    pub pad_exceptions: IndexMap<PadId, PadException>,
    /// Owning group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
}

/// A placed documentation symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentationSymbol {
    /// Definition.
    pub symdef: SymdefId,
    /// Target layer (may be an aggregate layer).
    pub layer: LayerId,
    /// Placement position.
    pub origin: ArchivePoint,
    /// Rotation, thousandths of a degree.
    #[serde(default)]
    pub orient_angle: i64,
    /// Mirrored.
    #[serde(default)]
    pub mirror: bool,
    /// Scale numerator.
    #[serde(default = "default_one")]
    pub scale_numerator: i64,
    /// Scale denominator.
    #[serde(default = "default_one")]
    pub scale_denominator: i64,
    /// Owning group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
}

const fn default_one() -> i64 {
    1
}

/// Copper fill style of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillType {
    /// Solid fill.
    #[default]
    Filled,
    /// Hatched fill.
    Hatched,
}

/// Pouring settings of a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pouring {
    /// Copper code of the fill; its width is the minimum copper width.
    pub copper_code: CopperCodeId,
    /// Copper code of thermal relief spokes.
    pub relief_copper_code: CopperCodeId,
    /// Thermal relief gap.
    #[serde(default)]
    pub clearance_width: i64,
    /// Isolation added on top of the copper-to-copper rule.
    #[serde(default)]
    pub additional_isolation: i64,
    /// Fill style.
    #[serde(default)]
    pub fill_type: FillType,
    /// Hatch code for hatched fills.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hatch_code: Option<HatchCodeId>,
    /// Thermal reliefs on pads.
    #[serde(default)]
    pub thermal_relief_on_pads: bool,
    /// Thermal reliefs on vias.
    #[serde(default)]
    pub thermal_relief_on_vias: bool,
    /// Spoke angle for pads, thousandths of a degree.
    #[serde(default)]
    pub thermal_relief_pads_angle: i64,
    /// Spoke angle for vias, thousandths of a degree.
    #[serde(default)]
    pub thermal_relief_vias_angle: i64,
    /// Minimum retained isolated copper length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_isolated_copper: Option<i64>,
    /// Minimum retained disjoint copper length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_disjoint_copper: Option<i64>,
    /// Minimum sliver width.
    #[serde(default)]
    pub sliver_width: i64,
    /// Pour may enter no-routing areas.
    #[serde(default)]
    pub allow_in_no_routing: bool,
    /// Box isolated pins.
    #[serde(default)]
    pub box_isolated_pins: bool,
    /// Repour automatically.
    #[serde(default)]
    pub automatic_repour: bool,
}

/// A copper pour template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Template name.
    #[serde(default)]
    pub name: String,
    /// Net; empty or `NONE` for unconnected pours.
    #[serde(default)]
    pub net: NetId,
    /// Layer.
    pub layer: LayerId,
    /// Outline stroke code.
    #[serde(default)]
    pub line_code: LineCodeId,
    /// Outline.
    pub shape: Shape,
    /// Pouring settings.
    pub pouring: Pouring,
}

/// A copper element: either the poured result of a template or free copper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Copper {
    /// Copper width code.
    pub copper_code: CopperCodeId,
    /// Layer.
    pub layer: LayerId,
    /// Geometry.
    pub shape: Shape,
    /// Net.
    #[serde(default)]
    pub net: NetId,
    /// Template this copper was poured from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poured_template: Option<TemplateId>,
}

/// A pin on a net.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    /// Component.
    pub component: ComponentId,
    /// Pad of the component's footprint.
    pub pad: PadId,
}

/// A via on a net.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetVia {
    /// Via stack.
    pub via_code: ViaCodeId,
    /// Layer span.
    pub layer_pair: LayerPairId,
    /// Position.
    pub location: ArchivePoint,
    /// Locked against editing.
    #[serde(default)]
    pub fixed: bool,
}

/// A junction where routes meet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Junction {
    /// Layer.
    pub layer: LayerId,
    /// Position.
    pub location: ArchivePoint,
}

/// One vertex of a route with the width used to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteVertex {
    /// Track width of the segment ending at this vertex.
    pub route_width: i64,
    /// Segment geometry.
    pub vertex: Vertex,
    /// Locked against editing.
    #[serde(default)]
    pub fixed: bool,
}

/// Routed geometry of a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Copper layer.
    pub layer: LayerId,
    /// Where the route starts.
    pub start_point: ArchivePoint,
    /// Vertices after the start point.
    #[serde(default)]
    pub vertices: Vec<RouteVertex>,
}

/// A connection between two net elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Start element (pin, via or junction).
    pub start_node: NetElementId,
    /// End element.
    pub end_node: NetElementId,
    /// Not yet routed (ratsnest only).
    #[serde(default)]
    pub unrouted: bool,
    /// Route geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
}

/// A net.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Net {
    /// Net name; may be empty.
    #[serde(default)]
    pub name: String,
    /// Signal number.
    #[serde(default)]
    pub signal_num: i64,
    /// Route code.
    #[serde(default)]
    pub route_code: RouteCodeId,
    /// Net class.
    #[serde(default)]
    pub net_class: String,
    /// Spacing class.
    #[serde(default)]
    pub spacing_class: String,
    /// Pins.
    #[serde(default)]
    pub pins: IndexMap<NetElementId, Pin>,
    /// Vias.
    #[serde(default)]
    pub vias: IndexMap<NetElementId, NetVia>,
    /// Junctions.
    #[serde(default)]
    pub junctions: IndexMap<NetElementId, Junction>,
    /// Connections.
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// A design variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Variant {
    /// Variant name.
    #[serde(default)]
    pub name: String,
    /// Variant description.
    #[serde(default)]
    pub description: String,
}
