//! Footprint library, pad stacks and placement.

use indexmap::IndexMap;
use tracing::debug;

use crate::archive::{
    ComponentCopper, ComponentPad, PadCode, PadCodeId, PadId, PadShapeKind, PadSide, ShapeKind,
    SymbolDef, SymdefId,
};
use crate::board::{
    Chamfers, CustomAnchor, Drill, DrillShape, Footprint, Keepout, LayerSet, Pad, PadAttribute,
    PadShape, PcbLayer, Size, Zone,
};
use crate::geometry::{normalize_angle_180, round, Point, Transform};

use super::diagnostics::Diagnostics;
use super::error::{ImportError, ImportResult};
use super::layers::LayerMap;
use super::shapes::ShapeBuilder;
use super::units::UnitConverter;
use super::Importer;

/// Keyword set on footprints whose library copper ties several pads together.
const THERMAL_PAD_KEYWORDS: &str = "allow thermal pads";

/// A footprint pad together with the pad code it uses.
#[derive(Debug, Clone, Copy)]
pub struct PadSource<'a> {
    /// Pad code id, used to report each code once.
    pub code_id: &'a PadCodeId,
    /// Pad code.
    pub code: &'a PadCode,
    /// Pad instance inside the footprint definition.
    pub pad: &'a ComponentPad,
    /// Pad number, used when the pad has no identifier.
    pub number: PadId,
}

/// Builds a host pad in footprint-local coordinates.
///
/// `origin` is the host position of the footprint origin. Pad stacks the
/// host cannot represent are approximated and reported once per pad code.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn build_pad(
    source: &PadSource<'_>,
    origin: Point,
    shapes: &ShapeBuilder,
    layers: &LayerMap,
    diag: &mut Diagnostics,
) -> Pad {
    let PadSource {
        code_id,
        code,
        pad,
        number,
    } = *source;
    let units = shapes.units();

    let (mut attribute, mut pad_layers) = match pad.side {
        PadSide::Bottom => (
            PadAttribute::Smd,
            LayerSet::of(&[PcbLayer::BackCopper, PcbLayer::BackPaste, PcbLayer::BackMask]),
        ),
        PadSide::Top => (
            PadAttribute::Smd,
            LayerSet::of(&[PcbLayer::FrontCopper, PcbLayer::FrontPaste, PcbLayer::FrontMask]),
        ),
        PadSide::ThroughHole => (
            if code.plated {
                PadAttribute::Through
            } else {
                PadAttribute::NonPlated
            },
            LayerSet::all_copper(layers.copper_count())
                | LayerSet::of(&[
                    PcbLayer::FrontMask,
                    PcbLayer::BackMask,
                    PcbLayer::FrontPaste,
                    PcbLayer::BackPaste,
                ]),
        ),
    };

    let mut mask_margin = 0_i64;
    let mut paste_margin = 0_i64;
    let mut complex_stack = false;
    for (layer_id, reassign) in &code.reassigns {
        let Some(layer) = layers.layer(layer_id) else {
            complex_stack = true;
            continue;
        };
        if reassign.size == 0 {
            pad_layers.remove(layer);
            continue;
        }
        let margin = units.length(reassign.size - code.shape.size) / 2;
        match layer {
            PcbLayer::FrontMask | PcbLayer::BackMask => {
                if margin.abs() > mask_margin.abs() {
                    mask_margin = margin;
                }
            }
            PcbLayer::FrontPaste | PcbLayer::BackPaste => {
                if margin.abs() > paste_margin.abs() {
                    paste_margin = margin;
                }
            }
            _ => complex_stack = true,
        }
    }
    if complex_stack {
        diag.warn_once(format!("pad-stack:{code_id}"), || {
            format!(
                "Pad code '{}' has shapes that differ per layer. Only the nominal shape was \
                 imported, with solder mask and paste margins where possible.",
                code.name
            )
        });
    }

    let mut shape = code.shape;
    if shape.size == 0 {
        if code.drill_diameter.is_none() && pad.side == PadSide::ThroughHole {
            attribute = PadAttribute::Smd;
            pad_layers = LayerSet::of(&[PcbLayer::FrontMask]);
        }
        shape.size = 1;
    }

    let size = units.length(shape.size);
    let extended = units.length(shape.size + shape.left_length + shape.right_length);
    let centring = Point::new(
        units.length(shape.left_length / 2 - shape.right_length / 2),
        0,
    );
    let (host_shape, host_size, mut pad_offset) = match shape.kind {
        PadShapeKind::Annulus | PadShapeKind::Circle => {
            (PadShape::Circle, Size::square(size), Point::ORIGIN)
        }
        PadShapeKind::Bullet => (
            PadShape::ChamferedRect {
                chamfer_ratio: 0.0,
                round_ratio: 0.5,
                corners: Chamfers::TOP_LEFT | Chamfers::BOTTOM_LEFT,
            },
            Size::new(extended, size),
            centring,
        ),
        PadShapeKind::Diamond => (
            PadShape::ChamferedRect {
                chamfer_ratio: 0.5,
                round_ratio: 0.0,
                corners: Chamfers::all(),
            },
            Size::square(round(size as f64 * std::f64::consts::SQRT_2)),
            centring,
        ),
        PadShapeKind::Finger => (PadShape::Oval, Size::new(extended, size), centring),
        PadShapeKind::Octagon => (
            PadShape::ChamferedRect {
                chamfer_ratio: 0.25,
                round_ratio: 0.0,
                corners: Chamfers::all(),
            },
            Size::square(size),
            Point::ORIGIN,
        ),
        PadShapeKind::Rectangle => (PadShape::Rect, Size::new(extended, size), centring),
        PadShapeKind::RoundedRect => (
            PadShape::RoundRect {
                radius: units.length(shape.internal_feature),
            },
            Size::new(extended, size),
            centring,
        ),
        PadShapeKind::Square => (PadShape::Rect, Size::square(size), Point::ORIGIN),
    };

    let name = if pad.identifier.is_empty() {
        number.to_string()
    } else {
        pad.identifier.clone()
    };
    let mut host = Pad::new(name, host_shape, host_size, pad_layers);
    host.attribute = attribute;
    host.solder_mask_margin = mask_margin;
    host.solder_paste_margin = paste_margin;
    host.thermal_gap = code.relief_clearance.map(|v| units.length(v));
    host.thermal_spoke_width = code.relief_width.map(|v| units.length(v));

    let mut drill_offset = Point::ORIGIN;
    if let Some(diameter) = code.drill_diameter {
        host.drill = Some(match code.slot_length.filter(|l| *l > 0) {
            Some(slot) => Drill {
                shape: DrillShape::Oblong,
                size: Size::new(units.length(slot + diameter), units.length(diameter)),
            },
            None => Drill {
                shape: DrillShape::Circle,
                size: Size::square(units.length(diameter)),
            },
        });
        drill_offset = Point::new(
            -units.length(code.drill_x_offset),
            units.length(code.drill_y_offset),
        );
    }

    let mut slot_angle = UnitConverter::angle(code.slot_orientation);
    if code.slot_orientation == 0 {
        host.offset = drill_offset;
    } else {
        let outline = host
            .shape_polygon(shapes.arc_segments())
            .translated(pad_offset - drill_offset)
            .rotated(Point::ORIGIN, 180.0 - slot_angle);
        if outline.contains(Point::ORIGIN) {
            host.shape = PadShape::Custom {
                anchor: CustomAnchor::Rect,
                primitives: outline,
            };
            host.size = Size::square(4);
            pad_offset = Point::ORIGIN;
        } else {
            slot_angle = 0.0;
            drill_offset = Point::ORIGIN;
            diag.warn_once(format!("pad-slot:{code_id}"), || {
                format!(
                    "Pad code '{}' has a slotted hole outside its copper. The slot angle was \
                     dropped and the hole moved to the pad centre.",
                    code.name
                )
            });
        }
    }

    let orientation = UnitConverter::angle(pad.orient_angle + shape.orient_angle);
    let pad_offset = pad_offset.rotate(orientation);
    let drill_offset = drill_offset.rotate(orientation);
    host.position = units.point(pad.position) - origin - pad_offset - drill_offset;
    host.orientation = normalize_angle_180(orientation + slot_angle);
    host.locked = true;
    host
}

impl<'a> Importer<'a> {
    pub(super) fn load_library(&mut self) -> ImportResult<()> {
        let archive = self.archive;
        for (id, def) in &archive.library {
            let footprint = self.library_footprint(id, def)?;
            self.library.insert(id.clone(), footprint);
        }
        debug!(footprints = self.library.len(), "Component library loaded");
        Ok(())
    }

    fn library_footprint(&mut self, id: &SymdefId, def: &'a SymbolDef) -> ImportResult<Footprint> {
        let name = def.build_name();
        let origin = self.shapes.point(def.origin);
        let local = Transform {
            translation: -origin,
            ..Transform::IDENTITY
        };
        let mut footprint = Footprint::new(name.as_str());
        footprint.position = origin;

        for figure in def.figures.values() {
            let width = self.line_width(&figure.line_code, &format!("Footprint '{name}'"))?;
            let layers = self.layers.layers(&figure.layer);
            for layer in layers.iter() {
                let result =
                    self.shapes
                        .graphics(&figure.shape, width, layer, &local, &mut self.diag);
                if let Some(graphics) =
                    self.geometry(result, &format!("A figure in footprint '{name}'"))
                {
                    footprint.graphics.extend(graphics);
                }
            }
        }

        for (area_id, area) in &def.areas {
            let label = if area.name.is_empty() {
                area_id.to_string()
            } else {
                area.name.clone()
            };
            if !(area.no_tracks || area.no_vias) {
                self.diag.warn(format!(
                    "The area '{label}' in footprint '{name}' forbids neither tracks nor vias \
                     and was not imported."
                ));
                continue;
            }
            let result = self.shapes.polygon(&area.shape, &local);
            let Some(outline) =
                self.geometry(result, &format!("Area '{label}' in footprint '{name}'"))
            else {
                continue;
            };
            let mut keepout = Keepout::empty();
            if area.no_tracks {
                keepout |= Keepout::TRACKS | Keepout::COPPER_POUR;
            }
            if area.no_vias {
                keepout |= Keepout::VIAS;
            }
            let mut zone = Zone::rule_area(self.layers.layers(&area.layer), outline, keepout);
            zone.name = label;
            footprint.zones.push(zone);
        }

        for (pad_id, pad) in &def.pads {
            let code = self.pad_code(&pad.pad_code, &format!("Footprint '{name}'"))?;
            let source = PadSource {
                code_id: &pad.pad_code,
                code,
                pad,
                number: *pad_id,
            };
            footprint
                .pads
                .push(build_pad(&source, origin, &self.shapes, &self.layers, &mut self.diag));
        }

        let mut copper_pads: IndexMap<PadId, Vec<usize>> = IndexMap::new();
        for copper in &def.coppers {
            let width = self.copper_width(&copper.copper_code, &format!("Footprint '{name}'"))?;
            let copper_layer = self.layers.layer(&copper.layer).filter(|l| l.is_copper());
            match copper_layer {
                Some(layer)
                    if !copper.associated_pads.is_empty()
                        && copper.shape.kind == ShapeKind::Solid =>
                {
                    self.copper_pad(def, copper, layer, width, &mut footprint, &mut copper_pads)?;
                }
                _ => {
                    let layers = self.layers.layers(&copper.layer);
                    for layer in layers.iter() {
                        let result = self.shapes.graphics(
                            &copper.shape,
                            width,
                            layer,
                            &local,
                            &mut self.diag,
                        );
                        if let Some(graphics) =
                            self.geometry(result, &format!("Copper in footprint '{name}'"))
                        {
                            footprint.graphics.extend(graphics);
                        }
                    }
                }
            }
        }
        if !copper_pads.is_empty() {
            self.copper_pads.insert(id.clone(), copper_pads);
        }
        Ok(footprint)
    }

    /// Turns library copper tied to pads into a custom pad at the anchor pad.
    fn copper_pad(
        &mut self,
        def: &SymbolDef,
        copper: &ComponentCopper,
        layer: PcbLayer,
        width: i64,
        footprint: &mut Footprint,
        copper_pads: &mut IndexMap<PadId, Vec<usize>>,
    ) -> ImportResult<()> {
        let name = def.build_name();
        let anchor_id = copper
            .associated_pads
            .iter()
            .copied()
            .find(|id| def.pads.get(id).is_some_and(|pad| !pad.pcb_only))
            .or_else(|| copper.associated_pads.first().copied());
        let Some(anchor_id) = anchor_id else {
            return Ok(());
        };
        let anchor = def.pads.get(&anchor_id).ok_or_else(|| {
            ImportError::missing(
                "pad",
                anchor_id.to_string(),
                format!("Copper in footprint '{name}'"),
            )
        })?;
        let code = self.pad_code(&anchor.pad_code, &format!("Footprint '{name}'"))?;

        let result = self.shapes.polygon(&copper.shape, &Transform::IDENTITY);
        let Some(polygon) = self.geometry(result, &format!("Copper in footprint '{name}'")) else {
            return Ok(());
        };
        let anchor_position = self.shapes.point(anchor.position);
        let primitives = polygon
            .inflated(width / 2, self.shapes.arc_segments())
            .fractured()
            .translated(-anchor_position);

        let number = if anchor.identifier.is_empty() {
            anchor_id.to_string()
        } else {
            anchor.identifier.clone()
        };
        let mut pad = Pad::new(
            number.as_str(),
            PadShape::Custom {
                anchor: CustomAnchor::Circle,
                primitives,
            },
            Size::square(self.shapes.units().length(code.shape.size)),
            LayerSet::of(&[layer]),
        );
        pad.position = anchor_position - footprint.position;
        pad.locked = true;

        let index = footprint.pads.len();
        footprint.pads.push(pad);

        let mut electrical = 0;
        for pad_id in &copper.associated_pads {
            copper_pads.entry(*pad_id).or_default().push(index);
            if def.pads.get(pad_id).is_some_and(|p| !p.pcb_only) {
                electrical += 1;
            }
            if let Some(existing) = pad_id.index().and_then(|i| footprint.pads.get_mut(i)) {
                existing.number.clone_from(&number);
            }
        }
        if electrical > 1 {
            footprint.keywords = THERMAL_PAD_KEYWORDS.to_string();
        }
        Ok(())
    }

    pub(super) fn load_components(&mut self) -> ImportResult<()> {
        let archive = self.archive;
        for (id, component) in &archive.layout.components {
            if component
                .variant
                .as_ref()
                .is_some_and(|variant| variant.parent != *id)
            {
                continue;
            }
            let context = format!("Component '{}'", component.name);
            let def = archive.library.get(&component.symdef).ok_or_else(|| {
                ImportError::missing("footprint", component.symdef.as_str(), context.as_str())
            })?;
            let mut footprint = self
                .library
                .get(&component.symdef)
                .cloned()
                .ok_or_else(|| {
                    ImportError::missing("footprint", component.symdef.as_str(), context.as_str())
                })?;

            let part = component.part.as_ref().and_then(|p| archive.parts.get(p));
            if let Some(part) = part.filter(|p| p.pins.len() == footprint.pads.len()) {
                for (pad_id, pin) in &part.pins {
                    let Some(pad) = pad_id.index().and_then(|i| footprint.pads.get_mut(i)) else {
                        continue;
                    };
                    pad.number = if !pin.name.is_empty() {
                        pin.name.clone()
                    } else if !pin.identifier.is_empty() {
                        pin.identifier.clone()
                    } else {
                        pad_id.to_string()
                    };
                }
            }

            for (pad_id, exception) in &component.pad_exceptions {
                let base = def.pads.get(pad_id).ok_or_else(|| {
                    ImportError::missing("pad", pad_id.to_string(), context.as_str())
                })?;
                let mut pad = base.clone();
                if let Some(code) = &exception.pad_code {
                    pad.pad_code = code.clone();
                }
                if let Some(side) = exception.side {
                    pad.side = side;
                }
                if let Some(angle) = exception.orient_angle {
                    pad.orient_angle = angle;
                }
                let code = self.pad_code(&pad.pad_code, &context)?;
                let source = PadSource {
                    code_id: &pad.pad_code,
                    code,
                    pad: &pad,
                    number: *pad_id,
                };
                let mut rebuilt = build_pad(
                    &source,
                    self.shapes.point(def.origin),
                    &self.shapes,
                    &self.layers,
                    &mut self.diag,
                );
                if let Some(existing) = pad_id.index().and_then(|i| footprint.pads.get_mut(i)) {
                    rebuilt.number = std::mem::take(&mut existing.number);
                    *existing = rebuilt;
                }
            }

            let angle = UnitConverter::angle(component.orient_angle);
            footprint.value = String::new();
            footprint.position = self.shapes.point(component.origin);
            footprint.orientation = angle;
            footprint.reference.clone_from(&component.name);
            footprint.locked = component.fixed;
            if component.mirror {
                footprint.orientation = normalize_angle_180(-angle);
                footprint.flip(self.layers.copper_count());
            }
            if let Some(part) = part {
                footprint.description.clone_from(&part.name);
                footprint.value.clone_from(&part.name);
            }

            let item = self.board.add(footprint);
            self.components.insert(id.clone(), item);
            self.add_to_group(component.group.as_ref(), item)?;
        }
        debug!(components = self.components.len(), "Components placed");
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    pub(super) fn load_documentation_symbols(&mut self) -> ImportResult<()> {
        let archive = self.archive;
        for (id, symbol) in &archive.layout.documentation_symbols {
            let def = archive.library.get(&symbol.symdef).ok_or_else(|| {
                ImportError::missing(
                    "symbol definition",
                    symbol.symdef.as_str(),
                    format!("Documentation symbol '{id}'"),
                )
            })?;
            let center = self.shapes.point(def.origin);
            let scale = if symbol.scale_denominator == 0 {
                1.0
            } else {
                symbol.scale_numerator as f64 / symbol.scale_denominator as f64
            };
            let transform = Transform {
                mirror: symbol.mirror,
                scale,
                rotation: UnitConverter::angle(symbol.orient_angle),
                translation: self.shapes.point(symbol.origin) - center,
                center,
            };

            let group = self.create_unique_group(&def.build_name());
            if let Some(&group_item) = self.groups.get(&group) {
                self.add_to_group(symbol.group.as_ref(), group_item)?;
            }

            let layers = self.layers.layers(&symbol.layer);
            for figure in def.figures.values() {
                let width = self.line_width(
                    &figure.line_code,
                    &format!("Documentation symbol '{id}'"),
                )?;
                for layer in layers.iter() {
                    self.draw_shape(
                        &figure.shape,
                        layer,
                        width,
                        &transform,
                        Some(&group),
                        figure.fixed,
                    )?;
                }
            }
            for text in def.texts.values() {
                self.draw_text(text, Some(&symbol.layer), &transform, Some(&group))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{Archive, PadShape as ArchivePadShape};
    use crate::board::Board;
    use crate::import::test_support::{archive, importer_with_stackup};
    use serde_json::json;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    fn code(kind: PadShapeKind, size: i64) -> PadCode {
        let mut code: PadCode = serde_json::from_value(json!({
            "name": "P1",
            "shape": {"type": "circle", "size": 1},
        }))
        .unwrap();
        code.shape = ArchivePadShape::new(kind, size);
        code
    }

    fn component_pad(side: PadSide) -> ComponentPad {
        serde_json::from_value(json!({
            "pad_code": "P1",
            "position": {"x": 100, "y": 0},
            "side": side,
        }))
        .unwrap()
    }

    fn build(code: &PadCode, pad: &ComponentPad, archive: &Archive) -> (Pad, Diagnostics) {
        let mut board = Board::new();
        let importer = importer_with_stackup(archive, &mut board);
        let mut diag = Diagnostics::new();
        let id = PadCodeId::from("P1");
        let source = PadSource {
            code_id: &id,
            code,
            pad,
            number: PadId(1),
        };
        let pad = build_pad(
            &source,
            Point::ORIGIN,
            &importer.shapes,
            &importer.layers,
            &mut diag,
        );
        (pad, diag)
    }

    #[test]
    fn zero_size_through_hole_pad_without_drill_becomes_mask_only() {
        let archive = archive(json!({}));
        let mut code = code(PadShapeKind::Circle, 0);
        code.drill_diameter = None;
        let (pad, _) = build(&code, &component_pad(PadSide::ThroughHole), &archive);
        assert_eq!(pad.attribute, PadAttribute::Smd);
        assert_eq!(pad.layers, LayerSet::of(&[PcbLayer::FrontMask]));
        assert_eq!(pad.size, Size::square(10));
    }

    #[test]
    fn zero_size_pad_with_drill_keeps_layers() {
        let archive = archive(json!({}));
        let mut code = code(PadShapeKind::Circle, 0);
        code.drill_diameter = Some(50);
        let (pad, _) = build(&code, &component_pad(PadSide::ThroughHole), &archive);
        assert_eq!(pad.attribute, PadAttribute::Through);
        assert!(pad.layers.contains(PcbLayer::BackCopper));
        assert_eq!(pad.size, Size::square(10));
    }

    #[test]
    fn asymmetric_rectangle_is_centred_with_offset() {
        let archive = archive(json!({}));
        let mut code = code(PadShapeKind::Rectangle, 100);
        code.shape.left_length = 40;
        code.shape.right_length = 0;
        let (pad, _) = build(&code, &component_pad(PadSide::Top), &archive);
        assert_eq!(pad.shape, PadShape::Rect);
        assert_eq!(pad.size, Size::new(1400, 1000));
        // Shape centre shifted left by half the extension.
        assert_eq!(pad.position, Point::new(1000 - 200, 0));
        assert_eq!(
            pad.layers,
            LayerSet::of(&[PcbLayer::FrontCopper, PcbLayer::FrontPaste, PcbLayer::FrontMask])
        );
    }

    #[test]
    fn diamond_is_square_chamfered_rect() {
        let archive = archive(json!({}));
        let code = code(PadShapeKind::Diamond, 100);
        let (pad, _) = build(&code, &component_pad(PadSide::Top), &archive);
        assert!(matches!(
            pad.shape,
            PadShape::ChamferedRect { chamfer_ratio, .. } if approx_eq(chamfer_ratio, 0.5, 1e-9)
        ));
        assert_eq!(pad.size, Size::square(1414));
    }

    #[test]
    fn mask_reassign_becomes_margin_and_copper_reassign_warns_once() {
        let archive = archive(json!({}));
        let mut code = code(PadShapeKind::Circle, 100);
        code.reassigns.insert("SMT".into(), ArchivePadShape::new(PadShapeKind::Circle, 120));
        code.reassigns.insert("BOT".into(), ArchivePadShape::new(PadShapeKind::Square, 80));
        let pad_def = component_pad(PadSide::ThroughHole);
        let (pad, diag) = build(&code, &pad_def, &archive);
        assert_eq!(pad.solder_mask_margin, 100);
        assert_eq!(diag.warning_count(), 1);
        assert!(diag.has_warning("differ per layer"));
    }

    #[test]
    fn zero_size_reassign_removes_layer() {
        let archive = archive(json!({}));
        let mut code = code(PadShapeKind::Circle, 100);
        code.reassigns.insert("SMT".into(), ArchivePadShape::new(PadShapeKind::Circle, 0));
        let (pad, _) = build(&code, &component_pad(PadSide::Top), &archive);
        assert!(!pad.layers.contains(PcbLayer::FrontMask));
        assert!(pad.layers.contains(PcbLayer::FrontCopper));
    }

    #[test]
    fn slot_outside_copper_is_recentred() {
        let archive = archive(json!({}));
        let mut code = code(PadShapeKind::Circle, 100);
        code.drill_diameter = Some(20);
        code.slot_length = Some(30);
        code.slot_orientation = 90_000;
        code.drill_x_offset = 500;
        let (pad, diag) = build(&code, &component_pad(PadSide::ThroughHole), &archive);
        assert!(diag.has_warning("slotted hole"));
        let drill = pad.drill.unwrap();
        assert_eq!(drill.shape, DrillShape::Oblong);
        assert_eq!(pad.position, Point::new(1000, 0));
        // The slot angle is dropped along with the slot offset.
        assert!(approx_eq(pad.orientation, 0.0, 1e-9));
    }

    #[test]
    fn slot_inside_copper_becomes_custom_pad() {
        let archive = archive(json!({}));
        let mut code = code(PadShapeKind::Circle, 100);
        code.drill_diameter = Some(20);
        code.slot_length = Some(30);
        code.slot_orientation = 90_000;
        let (pad, diag) = build(&code, &component_pad(PadSide::ThroughHole), &archive);
        assert_eq!(diag.warning_count(), 0);
        assert!(matches!(pad.shape, PadShape::Custom { anchor: CustomAnchor::Rect, .. }));
        assert_eq!(pad.drill.unwrap().shape, DrillShape::Oblong);
        assert!(approx_eq(pad.orientation, 90.0, 1e-9));
    }

    #[test]
    fn library_copper_becomes_custom_pad() {
        let archive = archive(json!({
            "library": {
                "SD1": {
                    "reference_name": "TAB",
                    "origin": {"x": 0, "y": 0},
                    "pads": {
                        "1": {"pad_code": "PC1", "position": {"x": 0, "y": 0}, "side": "top"},
                        "2": {"pad_code": "PC1", "position": {"x": 100, "y": 0}, "side": "top",
                              "identifier": "2"}
                    },
                    "coppers": [{
                        "copper_code": "CC1",
                        "layer": "TOP",
                        "shape": {"type": "solid", "vertices": [
                            {"type": "point", "end": {"x": -50, "y": -50}},
                            {"type": "point", "end": {"x": 150, "y": -50}},
                            {"type": "point", "end": {"x": 150, "y": 50}},
                            {"type": "point", "end": {"x": -50, "y": 50}}
                        ]},
                        "associated_pads": [1, 2]
                    }]
                }
            }
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_library().unwrap();

        let footprint = &importer.library[&SymdefId::from("SD1")];
        assert_eq!(footprint.pads.len(), 3);
        let custom = &footprint.pads[2];
        assert!(matches!(custom.shape, PadShape::Custom { anchor: CustomAnchor::Circle, .. }));
        assert_eq!(custom.layers, LayerSet::of(&[PcbLayer::FrontCopper]));
        assert!(footprint.pads.iter().all(|p| p.number == "1"));
        assert_eq!(footprint.keywords, THERMAL_PAD_KEYWORDS);
        assert_eq!(
            importer.copper_pads[&SymdefId::from("SD1")][&PadId(2)],
            vec![2]
        );
    }

    #[test]
    fn mirrored_component_is_flipped_to_the_back() {
        let archive = archive(json!({
            "library": {
                "SD1": {
                    "reference_name": "R0603",
                    "origin": {"x": 0, "y": 0},
                    "pads": {
                        "1": {"pad_code": "PC1", "position": {"x": 100, "y": 0}, "side": "top"}
                    }
                }
            },
            "parts": {"PA1": {"name": "10k", "pins": {"1": {"name": "A"}}}},
            "layout": {
                "components": {
                    "CP1": {
                        "name": "R1", "symdef": "SD1", "part": "PA1",
                        "origin": {"x": 1000, "y": 0}, "orient_angle": 90000, "mirror": true
                    }
                }
            }
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_library().unwrap();
        importer.load_components().unwrap();
        let item = importer.components[&crate::archive::ComponentId::from("CP1")];
        drop(importer);

        let footprint = board.footprint(item).unwrap();
        assert!(footprint.flipped);
        assert_eq!(footprint.reference, "R1");
        assert_eq!(footprint.value, "10k");
        assert_eq!(footprint.pads[0].number, "A");
        assert!(footprint.pads[0].layers.contains(PcbLayer::BackCopper));
        assert!(approx_eq(footprint.orientation, 90.0, 1e-9));
        // Mirrored then rotated: local (-1000, 0) turned by 90 degrees.
        assert_eq!(footprint.pad_position(0), Some(Point::new(10_000, 1000)));
    }

    #[test]
    fn variant_children_are_skipped() {
        let archive = archive(json!({
            "library": {"SD1": {"reference_name": "R", "origin": {"x": 0, "y": 0}}},
            "layout": {
                "components": {
                    "CP1": {"name": "R1", "symdef": "SD1", "origin": {"x": 0, "y": 0}},
                    "CP2": {"name": "R1", "symdef": "SD1", "origin": {"x": 0, "y": 0},
                            "variant": {"variant": "V1", "parent": "CP1"}}
                }
            }
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_library().unwrap();
        importer.load_components().unwrap();
        assert_eq!(importer.components.len(), 1);
    }

    #[test]
    fn missing_library_entry_is_fatal() {
        let archive = archive(json!({
            "layout": {
                "components": {
                    "CP1": {"name": "U1", "symdef": "NOPE", "origin": {"x": 0, "y": 0}}
                }
            }
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        let err = importer.load_components().unwrap_err();
        assert!(matches!(err, ImportError::MissingReference { kind: "footprint", .. }));
    }

    #[test]
    fn documentation_symbol_goes_into_unique_group() {
        let archive = archive(json!({
            "library": {
                "SD1": {
                    "reference_name": "LOGO",
                    "origin": {"x": 0, "y": 0},
                    "figures": {
                        "F1": {"layer": "SLT", "line_code": "LC1", "shape": {
                            "type": "openshape",
                            "vertices": [
                                {"type": "point", "end": {"x": 0, "y": 0}},
                                {"type": "point", "end": {"x": 100, "y": 0}}
                            ]
                        }}
                    }
                }
            },
            "layout": {
                "documentation_symbols": {
                    "DS1": {"symdef": "SD1", "layer": "SLT", "origin": {"x": 0, "y": 100},
                            "scale_numerator": 2, "scale_denominator": 1}
                }
            }
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_documentation_symbols().unwrap();
        drop(importer);

        let (_, group) = board.groups().next().unwrap();
        assert_eq!(group.name, "LOGO");
        assert_eq!(group.members.len(), 1);
        let graphic = board.graphic(group.members[0]).unwrap();
        assert_eq!(graphic.layer, PcbLayer::FrontSilkscreen);
        assert_eq!(graphic.width, 100);
        let crate::board::GraphicShape::Path { segment } = &graphic.shape else {
            panic!("expected a path");
        };
        assert_eq!(segment.start(), Point::new(0, -1000));
        assert_eq!(segment.end(), Point::new(2000, -1000));
    }
}
