//! Layer stack normalisation and archive-to-host layer mapping.
//!
//! The physical stack is grouped into blocks of one electrical layer followed
//! by the construction layers beneath it. Hosts need a balanced stack, so the
//! block list is padded to an even copper count before host layers are
//! assigned. Non-electrical layers are classified by subtype, then by name,
//! and the uncertain ones are offered to a [`LayerResolver`].

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::archive::{Archive, Embedding, Layer, LayerId, LayerKind, LayerSubtype};
use crate::board::{
    Board, CopperLayerType, DielectricKind, DielectricLayer, LayerSet, PcbLayer, Stackup,
    StackupItem, MAX_COPPER_LAYERS,
};

use super::diagnostics::Diagnostics;
use super::error::{ImportError, ImportResult};
use super::units::UnitConverter;

/// Name given to copper layers inserted to balance the stack.
pub const DUMMY_COPPER_NAME: &str = "Dummy Copper";

/// One electrical layer and the construction layers beneath it.
///
/// A block without an electrical layer is a dummy copper layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackBlock {
    /// Electrical layer, or `None` for a dummy.
    pub electrical: Option<LayerId>,
    /// Construction layers below the electrical layer, top first.
    pub construction: Vec<LayerId>,
}

impl StackBlock {
    fn is_empty(&self) -> bool {
        self.electrical.is_none() && self.construction.is_empty()
    }
}

/// A stack with an even number of blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedStack {
    /// Blocks, top first. The last block has no construction layers.
    pub blocks: Vec<StackBlock>,
    /// A construction layer shared between two blocks at half thickness.
    pub halved: Option<LayerId>,
}

impl NormalizedStack {
    /// Number of copper layers.
    #[must_use]
    pub fn copper_count(&self) -> usize {
        self.blocks.len()
    }
}

/// Groups the physical stack into blocks and balances it.
///
/// # Errors
///
/// Fails if a stack entry is undefined, if an aggregate or placeholder layer
/// appears in the stack, or if the stack is empty.
pub fn normalize_stack(
    layers: &IndexMap<LayerId, Layer>,
    stack: &[LayerId],
) -> ImportResult<NormalizedStack> {
    let mut blocks = Vec::new();
    let mut current = StackBlock::default();

    for id in stack {
        let layer = layers
            .get(id)
            .ok_or_else(|| ImportError::missing("layer", id.as_str(), "The layer stack"))?;

        if layer.kind.is_aggregate() {
            return Err(ImportError::malformed_stack(
                &layer.name,
                "aggregate or placeholder layer type inside the physical stack",
            ));
        }
        if layer.kind.is_electrical() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            current.electrical = Some(id.clone());
        } else if layer.kind == LayerKind::Construction {
            current.construction.push(id.clone());
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    let Some(last) = blocks.last() else {
        return Err(ImportError::malformed_stack(
            "(empty)",
            "no electrical or construction layers in the stack",
        ));
    };

    if !last.construction.is_empty() || blocks.len() == 1 {
        blocks.push(StackBlock::default());
    }

    let mut halved = None;
    if blocks.len() % 2 != 0 {
        // At least three blocks here: a single block was padded above.
        let bottom = blocks.pop().unwrap_or_default();
        let mut second = blocks.pop().unwrap_or_default();
        let mut dummy = StackBlock::default();

        if let Some(shared) = second.construction.last().cloned() {
            if second.construction.len() > 1 {
                second.construction.pop();
            } else {
                halved = Some(shared.clone());
            }
            dummy.construction.push(shared);
        }
        blocks.push(second);
        blocks.push(dummy);
        blocks.push(bottom);
    }

    Ok(NormalizedStack { blocks, halved })
}

/// Dielectric kind between `block` and `below`, from the copper embedding.
fn dielectric_kind(
    layers: &IndexMap<LayerId, Layer>,
    block: &StackBlock,
    below: Option<&StackBlock>,
) -> DielectricKind {
    let embedding = |b: Option<&StackBlock>| {
        b.and_then(|b| b.electrical.as_ref())
            .and_then(|id| layers.get(id))
            .map(|l| l.embedding)
    };
    match (embedding(Some(block)), embedding(below)) {
        (None, _) => DielectricKind::Prepreg,
        (Some(Embedding::Above), None) => DielectricKind::Core,
        (Some(Embedding::Above), Some(Embedding::Below)) => DielectricKind::Core,
        _ => DielectricKind::Prepreg,
    }
}

/// What an archive layer resolves to on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerTarget {
    /// A single host layer.
    Single(PcbLayer),
    /// A dielectric of the stackup, by 1-based number.
    Dielectric(u32),
    /// Several host layers.
    Set(LayerSet),
    /// No host layer.
    Undefined,
}

/// Archive layer id to host layer lookup, built once per import.
#[derive(Debug, Clone, Default)]
pub struct LayerMap {
    targets: IndexMap<LayerId, LayerTarget>,
    copper_count: u32,
    power_planes: Vec<LayerId>,
}

impl LayerMap {
    /// Resolution of an archive layer.
    #[must_use]
    pub fn target(&self, id: &LayerId) -> LayerTarget {
        self.targets.get(id).copied().unwrap_or(LayerTarget::Undefined)
    }

    /// The single host layer for `id`, if it maps to exactly one.
    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<PcbLayer> {
        match self.target(id) {
            LayerTarget::Single(layer) => Some(layer),
            _ => None,
        }
    }

    /// Every host layer `id` maps to.
    #[must_use]
    pub fn layers(&self, id: &LayerId) -> LayerSet {
        match self.target(id) {
            LayerTarget::Single(layer) => LayerSet::of(&[layer]),
            LayerTarget::Set(set) => set,
            LayerTarget::Dielectric(_) | LayerTarget::Undefined => LayerSet::new(),
        }
    }

    /// Returns `true` if `id` is an aggregate layer.
    #[must_use]
    pub fn is_set(&self, id: &LayerId) -> bool {
        matches!(self.target(id), LayerTarget::Set(_))
    }

    /// Number of host copper layers.
    #[must_use]
    pub const fn copper_count(&self) -> u32 {
        self.copper_count
    }

    /// POWER layers, in stack order.
    #[must_use]
    pub fn power_planes(&self) -> &[LayerId] {
        &self.power_planes
    }

    /// Host copper layer for a 1-based physical layer number.
    #[must_use]
    pub fn physical_copper(&self, number: u32, max_physical: u32) -> Option<PcbLayer> {
        match number {
            n if n == max_physical && n > 0 => Some(PcbLayer::BackCopper),
            1 => Some(PcbLayer::FrontCopper),
            2..=31 => u8::try_from(number - 1).ok().map(PcbLayer::InnerCopper),
            32 => Some(PcbLayer::BackCopper),
            _ => None,
        }
    }

    fn insert(&mut self, id: &LayerId, target: LayerTarget) {
        self.targets.insert(id.clone(), target);
    }
}

/// A layer whose mapping is uncertain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedLayer {
    /// Archive layer name.
    pub name: String,
    /// Host layers the layer may be mapped to.
    pub permitted: LayerSet,
    /// Heuristic choice.
    pub default: PcbLayer,
}

/// Chooses host layers for archive layers that could not be classified with
/// confidence.
///
/// Entries missing from the returned map keep their heuristic default.
pub trait LayerResolver {
    /// Returns the chosen host layer per archive layer name.
    fn resolve(&mut self, layers: &[UnresolvedLayer]) -> IndexMap<String, PcbLayer>;
}

impl<F> LayerResolver for F
where
    F: FnMut(&[UnresolvedLayer]) -> IndexMap<String, PcbLayer>,
{
    fn resolve(&mut self, layers: &[UnresolvedLayer]) -> IndexMap<String, PcbLayer> {
        self(layers)
    }
}

/// Accepts every heuristic default.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptDefaults;

impl LayerResolver for AcceptDefaults {
    fn resolve(&mut self, layers: &[UnresolvedLayer]) -> IndexMap<String, PcbLayer> {
        layers
            .iter()
            .map(|l| (l.name.clone(), l.default))
            .collect()
    }
}

/// Resolves layers from a fixed name-to-layer table, defaulting the rest.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLayerResolver {
    overrides: IndexMap<String, PcbLayer>,
}

impl ConfiguredLayerResolver {
    /// Creates a resolver from archive layer names to host layers.
    #[must_use]
    pub const fn new(overrides: IndexMap<String, PcbLayer>) -> Self {
        Self { overrides }
    }
}

impl LayerResolver for ConfiguredLayerResolver {
    fn resolve(&mut self, layers: &[UnresolvedLayer]) -> IndexMap<String, PcbLayer> {
        layers
            .iter()
            .map(|l| {
                let chosen = self.overrides.get(&l.name).copied().unwrap_or(l.default);
                (l.name.clone(), chosen)
            })
            .collect()
    }
}

/// How loudly a heuristic layer choice is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confidence {
    Certain,
    Assumed,
    Fallback,
}

/// Classifies a non-electrical layer: front and back candidates plus confidence.
fn classify(layer: &Layer) -> Option<(PcbLayer, PcbLayer, Confidence)> {
    use Confidence::{Assumed, Certain, Fallback};
    use PcbLayer as L;

    let choice = match (layer.kind, layer.subtype) {
        (LayerKind::Doc, _) => (L::Drawings, L::Comments, Fallback),
        (LayerKind::Nonelec, LayerSubtype::Assembly) => (L::FrontFab, L::BackFab, Certain),
        (LayerKind::Nonelec, LayerSubtype::Placement) => {
            (L::FrontCourtyard, L::BackCourtyard, Certain)
        }
        (LayerKind::Nonelec, LayerSubtype::Paste) => (L::FrontPaste, L::BackPaste, Assumed),
        (LayerKind::Nonelec, LayerSubtype::Silkscreen) => {
            (L::FrontSilkscreen, L::BackSilkscreen, Assumed)
        }
        (LayerKind::Nonelec, LayerSubtype::Solderresist) => (L::FrontMask, L::BackMask, Assumed),
        (LayerKind::Nonelec, LayerSubtype::Rout | LayerSubtype::Clearance) => {
            (L::Eco1, L::Eco2, Fallback)
        }
        (LayerKind::Nonelec, LayerSubtype::None) => classify_by_name(&layer.name),
        _ => return None,
    };
    Some(choice)
}

fn classify_by_name(name: &str) -> (PcbLayer, PcbLayer, Confidence) {
    use PcbLayer as L;

    const KEYWORDS: [(&[&str], PcbLayer, PcbLayer); 5] = [
        (&["glue", "adhesive"], L::FrontAdhesive, L::BackAdhesive),
        (&["silk", "legend"], L::FrontSilkscreen, L::BackSilkscreen),
        (&["assembly", "fabrication"], L::FrontFab, L::BackFab),
        (&["resist", "mask"], L::FrontMask, L::BackMask),
        (&["paste"], L::FrontPaste, L::BackPaste),
    ];

    let lower = name.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(words, _, _)| words.iter().any(|w| lower.contains(w)))
        .map_or((L::Eco1, L::Eco2, Confidence::Fallback), |(_, front, back)| {
            (*front, *back, Confidence::Assumed)
        })
}

/// Returns `true` for layers offered to the [`LayerResolver`].
fn is_uncertain(layer: &Layer) -> bool {
    layer.kind == LayerKind::Doc
        || (layer.kind == LayerKind::Nonelec
            && matches!(
                layer.subtype,
                LayerSubtype::None | LayerSubtype::Rout | LayerSubtype::Clearance
            ))
}

/// Builds the host stackup and the layer map from the archive layer stack.
///
/// # Errors
///
/// Fails on a malformed stack, an undefined material or more copper layers
/// than the host supports.
pub fn load_stackup(
    archive: &Archive,
    board: &mut Board,
    units: &UnitConverter,
    diag: &mut Diagnostics,
    log_layer_warnings: bool,
) -> ImportResult<LayerMap> {
    let stack = normalize_stack(&archive.layers, &archive.layer_stack)?;
    let count = u32::try_from(stack.copper_count()).unwrap_or(u32::MAX);
    if count > MAX_COPPER_LAYERS {
        return Err(ImportError::malformed_stack(
            archive.layer_name(archive.layer_stack.last().unwrap_or(&LayerId::default())),
            format!("{count} copper layers exceed the supported {MAX_COPPER_LAYERS}"),
        ));
    }

    board.set_copper_layer_count(count);
    let enabled = LayerSet::all_copper(count) | LayerSet::all_technical() | LayerSet::all_user();
    board.set_enabled_layers(enabled);
    board.set_visible_layers(enabled);

    let mut map = LayerMap {
        copper_count: count,
        ..LayerMap::default()
    };
    let mut stackup = Stackup::new();

    for (index, block) in stack.blocks.iter().enumerate() {
        let index_u32 = u32::try_from(index).unwrap_or(u32::MAX);
        let host = PcbLayer::copper(index_u32, count);

        match &block.electrical {
            None => stackup.push(StackupItem::Copper {
                layer: host,
                name: DUMMY_COPPER_NAME.to_string(),
                thickness: 0,
                role: CopperLayerType::Signal,
            }),
            Some(id) => {
                let layer = &archive.layers[id];
                let role = match layer.kind {
                    LayerKind::Power => {
                        map.power_planes.push(id.clone());
                        CopperLayerType::Power
                    }
                    LayerKind::Jumper => CopperLayerType::Jumper,
                    _ => CopperLayerType::Signal,
                };
                board.set_layer_type(host, role);
                board.set_layer_name(host, &layer.name);
                map.insert(id, LayerTarget::Single(host));
                stackup.push(StackupItem::Copper {
                    layer: host,
                    name: layer.name.clone(),
                    thickness: units.length(layer.thickness),
                    role,
                });
            }
        }

        if index + 1 < stack.blocks.len() {
            let number = index_u32 + 1;
            let mut sublayers = Vec::with_capacity(block.construction.len());
            for id in &block.construction {
                let layer = &archive.layers[id];
                let mut thickness = units.length(layer.thickness);
                if stack.halved.as_ref() == Some(id) {
                    thickness /= 2;
                }
                let mut sub = DielectricLayer {
                    name: layer.name.clone(),
                    thickness,
                    ..DielectricLayer::default()
                };
                if let Some(material_id) = &layer.material {
                    let material = archive.materials.get(material_id).ok_or_else(|| {
                        ImportError::missing(
                            "material",
                            material_id.as_str(),
                            format!("Layer '{}'", layer.name),
                        )
                    })?;
                    sub.material = material.name.clone();
                    sub.epsilon_r = material.permittivity;
                    sub.loss_tangent = material.loss_tangent;
                }
                sublayers.push(sub);
                map.insert(id, LayerTarget::Dielectric(number));
            }
            stackup.push(StackupItem::Dielectric {
                number,
                kind: dielectric_kind(&archive.layers, block, stack.blocks.get(index + 1)),
                sublayers,
            });
        }
    }
    board.set_stackup(stackup);

    let mut electrical_seen = false;
    for id in &archive.layer_stack {
        let layer = &archive.layers[id];
        if layer.kind.is_electrical() {
            electrical_seen = true;
            continue;
        }
        let Some((front, back, confidence)) = classify(layer) else {
            continue;
        };
        let host = if electrical_seen { back } else { front };
        map.insert(id, LayerTarget::Single(host));

        if log_layer_warnings {
            match confidence {
                Confidence::Certain => {}
                Confidence::Assumed => info!(
                    layer = %layer.name,
                    host = %host,
                    "Layer assumed to be a technical layer"
                ),
                Confidence::Fallback => diag.warn(format!(
                    "The layer '{}' has no host equivalent. Elements on it are mapped to '{host}'",
                    layer.name
                )),
            }
        }
    }

    for (id, layer) in &archive.layers {
        if map.targets.contains_key(id) {
            continue;
        }
        let target = match layer.kind {
            LayerKind::Alldoc => LayerTarget::Set(LayerSet::of(&[
                PcbLayer::Drawings,
                PcbLayer::Comments,
                PcbLayer::Eco1,
                PcbLayer::Eco2,
            ])),
            LayerKind::Allelec => LayerTarget::Set(LayerSet::all_copper(count)),
            // Every enabled layer; refreshed after remapping.
            LayerKind::Alllayer => LayerTarget::Set(board.enabled_layers()),
            _ => LayerTarget::Undefined,
        };
        map.insert(id, target);
    }

    debug!(copper_layers = count, "Stackup loaded");
    Ok(map)
}

/// Offers uncertain layers to `resolver` and applies its choices.
///
/// Choices outside the permitted set are ignored with a warning. Enabled
/// and visible layers grow to include every chosen layer.
pub fn remap_uncertain_layers(
    archive: &Archive,
    map: &mut LayerMap,
    board: &mut Board,
    resolver: &mut dyn LayerResolver,
    diag: &mut Diagnostics,
) {
    let mut enabled = board.enabled_layers();
    let permitted = enabled | LayerSet::all_technical() | LayerSet::all_user();

    let mut by_name: IndexMap<String, LayerId> = IndexMap::new();
    let mut requests = Vec::new();
    for (id, target) in &map.targets {
        let (LayerTarget::Single(default), Some(layer)) = (*target, archive.layer(id)) else {
            continue;
        };
        if is_uncertain(layer) {
            requests.push(UnresolvedLayer {
                name: layer.name.clone(),
                permitted,
                default,
            });
            by_name.insert(layer.name.clone(), id.clone());
        }
    }

    if !requests.is_empty() {
        for (name, chosen) in resolver.resolve(&requests) {
            let Some(id) = by_name.get(&name) else {
                diag.warn(format!(
                    "Layer mapping names unknown layer '{name}'; the choice was ignored"
                ));
                continue;
            };
            if !permitted.contains(chosen) {
                diag.warn(format!(
                    "Layer '{name}' cannot be mapped to '{chosen}'; the default was kept"
                ));
                continue;
            }
            map.insert(id, LayerTarget::Single(chosen));
            enabled.insert(chosen);
        }
        board.set_enabled_layers(enabled);
        board.set_visible_layers(enabled);
    }

    for (id, layer) in &archive.layers {
        if layer.kind == LayerKind::Alllayer {
            map.insert(id, LayerTarget::Set(enabled));
        }
    }
}
