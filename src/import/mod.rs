//! Archive to board import engine.
//!
//! [`import_archive`] runs every stage against one [`Importer`] context in a
//! fixed order: stackup and layer mapping first, then the footprint library,
//! annotations, placements, pours and finally nets. Stages share the lookup
//! tables held by the context (layer map, library, group, zone and net
//! tables), which only grow during a run.
//!
//! Unsupported features are recorded as warnings in [`Diagnostics`]; broken
//! cross-references abort the import with an [`ImportError`].

mod annotations;
mod diagnostics;
mod error;
mod footprints;
mod layers;
mod nets;
mod shapes;
#[cfg(test)]
mod test_support;
mod units;
mod zones;

pub use annotations::text_fields;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{ImportError, ImportResult};
pub use footprints::{build_pad, PadSource};
pub use layers::{
    normalize_stack, AcceptDefaults, ConfiguredLayerResolver, LayerMap, LayerResolver,
    LayerTarget, NormalizedStack, StackBlock, UnresolvedLayer, DUMMY_COPPER_NAME,
};
pub use nets::{apply_route_offset, chain_tracks, RoutePiece};
pub use shapes::ShapeBuilder;
pub use units::{check_design_limit, UnitConverter, NM_PER_MM};
pub use zones::{infer_priorities, PriorityCandidate};

use indexmap::IndexMap;
use serde::Serialize;

use crate::archive::{
    Archive, ComponentId, CopperCodeId, GroupId, HatchCode, HatchCodeId, LayerId, LayerPair,
    LayerPairId, LineCodeId, NetId, PadCode, PadCodeId, PadId, RouteCode, RouteCodeId, SymdefId,
    TemplateId, TextCode, TextCodeId, ViaCode, ViaCodeId,
};
use crate::board::{Board, Footprint, ItemId, NetCode, Project};
use crate::geometry::GeometryError;

/// Default number of straight steps per full circle.
pub const DEFAULT_ARC_SEGMENTS: u32 = 32;

/// Tunables of one import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Record layer-mapping fidelity warnings.
    pub log_layer_warnings: bool,
    /// Steps per full circle used when arcs become polygons.
    pub arc_segments: u32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            log_layer_warnings: true,
            arc_segments: DEFAULT_ARC_SEGMENTS,
        }
    }
}

/// Outcome of a successful import.
#[derive(Debug, Serialize)]
pub struct ImportReport {
    /// Warnings recorded during the run.
    pub diagnostics: Diagnostics,
    /// Library footprints, in footprint-local coordinates, by name.
    pub library: IndexMap<String, Footprint>,
}

/// Imports `archive` into `board`.
///
/// `project` receives the design text variables when given. `resolver`
/// chooses host layers for archive layers that could not be classified with
/// confidence.
///
/// # Errors
///
/// Fails on a design that exceeds the host coordinate range, a malformed
/// layer stack or a reference to a record that does not exist.
pub fn import_archive(
    archive: &Archive,
    board: &mut Board,
    project: Option<&mut Project>,
    resolver: &mut dyn LayerResolver,
    options: ImportOptions,
) -> ImportResult<ImportReport> {
    let mut importer = Importer::new(archive, board, options);
    match importer.run(project, resolver) {
        Ok(()) => {
            tracing::info!(
                warnings = importer.diag.warning_count(),
                "Import finished"
            );
            let library = importer
                .archive
                .library
                .iter()
                .filter_map(|(id, def)| {
                    importer
                        .library
                        .get(id)
                        .map(|fp| (def.build_name(), fp.clone()))
                })
                .collect();
            Ok(ImportReport {
                diagnostics: importer.diag,
                library,
            })
        }
        Err(e) => Err(importer.diag.fatal(e)),
    }
}

/// State shared by the import stages.
pub(crate) struct Importer<'a> {
    archive: &'a Archive,
    board: &'a mut Board,
    options: ImportOptions,
    diag: Diagnostics,
    shapes: ShapeBuilder,
    layers: LayerMap,
    /// Library footprints by symbol definition.
    library: IndexMap<SymdefId, Footprint>,
    /// Custom pads made from library coppers: anchor pad to pad indices.
    copper_pads: IndexMap<SymdefId, IndexMap<PadId, Vec<usize>>>,
    components: IndexMap<ComponentId, ItemId>,
    groups: IndexMap<GroupId, ItemId>,
    templates: IndexMap<TemplateId, ItemId>,
    nets: IndexMap<NetId, NetCode>,
    net_classes: IndexMap<RouteCodeId, String>,
}

impl<'a> Importer<'a> {
    fn new(archive: &'a Archive, board: &'a mut Board, options: ImportOptions) -> Self {
        let units = UnitConverter::new(&archive.technology);
        Self {
            archive,
            board,
            options,
            diag: Diagnostics::new(),
            shapes: ShapeBuilder::new(units, options.arc_segments),
            layers: LayerMap::default(),
            library: IndexMap::new(),
            copper_pads: IndexMap::new(),
            components: IndexMap::new(),
            groups: IndexMap::new(),
            templates: IndexMap::new(),
            nets: IndexMap::new(),
            net_classes: IndexMap::new(),
        }
    }

    fn run(
        &mut self,
        project: Option<&mut Project>,
        resolver: &mut dyn LayerResolver,
    ) -> ImportResult<()> {
        check_design_limit(&self.archive.technology)?;
        self.warn_net_synch();

        tracing::debug!("Loading stackup");
        self.layers = layers::load_stackup(
            self.archive,
            self.board,
            self.shapes.units(),
            &mut self.diag,
            self.options.log_layer_warnings,
        )?;
        layers::remap_uncertain_layers(
            self.archive,
            &mut self.layers,
            self.board,
            resolver,
            &mut self.diag,
        );
        self.load_design_rules();

        tracing::debug!("Loading component library");
        self.load_library()?;

        tracing::debug!("Loading annotations");
        self.load_groups()?;
        self.load_boards()?;
        self.load_figures()?;
        self.load_texts()?;
        self.load_dimensions()?;
        self.load_areas()?;

        tracing::debug!("Placing components");
        self.load_components()?;
        self.load_documentation_symbols()?;

        tracing::debug!("Loading pours");
        self.load_templates()?;
        self.load_coppers()?;
        self.calculate_zone_priorities();

        tracing::debug!("Loading nets");
        self.load_nets()?;
        self.load_text_variables(project);
        self.warn_unsupported();
        Ok(())
    }

    fn warn_net_synch(&mut self) {
        if self.archive.layout.net_synch == crate::archive::NetSynch::Warning {
            self.diag.warn(
                "The archive indicates that nets might be out of synchronisation with the \
                 schematic. Align the nets in the source design and re-import to avoid \
                 inconsistencies.",
            );
        }
    }

    fn warn_unsupported(&mut self) {
        let layout = &self.archive.layout;
        if !layout.trunks.is_empty() {
            self.diag.warn(
                "The design contains trunk routing elements, which have no host equivalent. \
                 They were not loaded.",
            );
        }
        if let Some(variant) = layout.variants.values().next() {
            let name = variant.name.clone();
            self.diag.warn(format!(
                "The design contains variants, which have no host equivalent. Only the \
                 variant '{name}' was loaded."
            ));
        }
        if !layout.reuse_blocks.is_empty() {
            self.diag.warn(
                "The design contains re-use blocks, which have no host equivalent. The \
                 re-use block information was discarded.",
            );
        }
    }

    // Code lookups. A dangling code reference is a structural error.

    fn line_width(&self, id: &LineCodeId, context: &str) -> ImportResult<i64> {
        self.archive
            .codes
            .line_codes
            .get(id)
            .map(|code| self.shapes.units().length(code.width))
            .ok_or_else(|| ImportError::missing("line code", id.as_str(), context))
    }

    fn copper_width(&self, id: &CopperCodeId, context: &str) -> ImportResult<i64> {
        self.archive
            .codes
            .copper_codes
            .get(id)
            .map(|code| self.shapes.units().length(code.copper_width))
            .ok_or_else(|| ImportError::missing("copper code", id.as_str(), context))
    }

    fn pad_code(&self, id: &PadCodeId, context: &str) -> ImportResult<&'a PadCode> {
        let archive: &'a Archive = self.archive;
        archive
            .codes
            .pad_codes
            .get(id)
            .ok_or_else(|| ImportError::missing("pad code", id.as_str(), context))
    }

    fn via_code(&self, id: &ViaCodeId, context: &str) -> ImportResult<&'a ViaCode> {
        let archive: &'a Archive = self.archive;
        archive
            .codes
            .via_codes
            .get(id)
            .ok_or_else(|| ImportError::missing("via code", id.as_str(), context))
    }

    fn layer_pair(&self, id: &LayerPairId, context: &str) -> ImportResult<&'a LayerPair> {
        let archive: &'a Archive = self.archive;
        archive
            .codes
            .layer_pairs
            .get(id)
            .ok_or_else(|| ImportError::missing("layer pair", id.as_str(), context))
    }

    fn text_code(&self, id: &TextCodeId, context: &str) -> ImportResult<&'a TextCode> {
        let archive: &'a Archive = self.archive;
        archive
            .codes
            .text_codes
            .get(id)
            .ok_or_else(|| ImportError::missing("text code", id.as_str(), context))
    }

    fn hatch_code(&self, id: &HatchCodeId, context: &str) -> ImportResult<&'a HatchCode> {
        let archive: &'a Archive = self.archive;
        archive
            .codes
            .hatch_codes
            .get(id)
            .ok_or_else(|| ImportError::missing("hatch code", id.as_str(), context))
    }

    fn route_code(&self, id: &RouteCodeId, context: &str) -> ImportResult<&'a RouteCode> {
        let archive: &'a Archive = self.archive;
        archive
            .codes
            .route_codes
            .get(id)
            .ok_or_else(|| ImportError::missing("route code", id.as_str(), context))
    }

    fn layer_name(&self, id: &LayerId) -> String {
        self.archive.layer_name(id)
    }

    /// Unwraps a geometry result, turning a degenerate shape into a warning.
    fn geometry<T>(&mut self, result: Result<T, GeometryError>, what: &str) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.diag.warn(format!("{what} was not imported: {e}"));
                None
            }
        }
    }

    // Groups

    /// Adds `item` to the host group made for `group`.
    fn add_to_group(&mut self, group: Option<&GroupId>, item: ItemId) -> ImportResult<()> {
        let Some(group) = group.filter(|g| !g.is_empty()) else {
            return Ok(());
        };
        let parent = *self
            .groups
            .get(group)
            .ok_or_else(|| ImportError::missing("group", group.as_str(), "Board item"))?;
        self.board.add_to_group(parent, item)?;
        Ok(())
    }

    /// Creates a group whose name is unique among imported groups.
    fn create_unique_group(&mut self, name: &str) -> GroupId {
        let mut candidate = name.to_string();
        let mut n = 0;
        while self.groups.contains_key(&GroupId::from(candidate.as_str())) {
            n += 1;
            candidate = format!("{name}_{n}");
        }
        let item = self.board.add(crate::board::Group::new(candidate.as_str()));
        let id = GroupId::from(candidate.as_str());
        self.groups.insert(id.clone(), item);
        id
    }
}
