//! Rule areas, copper pours and their fill order.
//!
//! Templates become copper zones. Poured coppers are merged into the fill of
//! the template they came from; free coppers become tracks or standalone
//! zones. The archive records no fill order, so template priorities are
//! inferred afterwards from how the fills overlap ([`infer_priorities`]).

use tracing::debug;

use crate::archive::{FillType, HatchCodeId, Shape, ShapeKind, Template};
use crate::board::{
    BorderStyle, FillMode, HatchSettings, IslandRemoval, Keepout, LayerSet, NetCode,
    PadConnection, PcbLayer, Zone,
};
use crate::geometry::{PolySet, Transform};

use super::error::{ImportError, ImportResult};
use super::nets::{chain_tracks, is_unconnected, RoutePiece};
use super::units::UnitConverter;
use super::Importer;

/// A zone taking part in priority inference.
#[derive(Debug, Clone, Copy)]
pub struct PriorityCandidate<'a> {
    /// Layers of the zone.
    pub layers: LayerSet,
    /// Zone outline.
    pub outline: &'a PolySet,
    /// Filled copper, if the zone was poured.
    pub fill: Option<&'a PolySet>,
}

impl PriorityCandidate<'_> {
    fn shares_layer(&self, other: &Self) -> bool {
        self.layers.iter().any(|layer| other.layers.contains(layer))
    }

    fn fill_area(&self) -> f64 {
        self.fill.map_or(0.0, PolySet::area)
    }
}

/// Decides which of two overlapping zones fills first.
///
/// Returns `Some(true)` when `a` wins, `Some(false)` when `b` wins.
fn winner(a: &PriorityCandidate<'_>, b: &PriorityCandidate<'_>) -> Option<bool> {
    if let (Some(fill_a), Some(fill_b)) = (a.fill, b.fill) {
        if a.fill_area() > 0.0 && b.fill_area() > 0.0 {
            let into_b = fill_a.intersection(b.outline).area();
            let into_a = fill_b.intersection(a.outline).area();
            if into_b > into_a {
                return Some(true);
            }
            if into_a > 0.0 {
                return Some(false);
            }
        }
    }

    // Unpoured, or the fills do not reach into each other: the smaller of
    // two overlapping outlines sits on top.
    if a.outline.intersection(b.outline).area() <= 0.0 {
        return None;
    }
    let (area_a, area_b) = (a.outline.area(), b.outline.area());
    if area_a < area_b {
        Some(true)
    } else if area_b < area_a {
        Some(false)
    } else {
        None
    }
}

/// Infers fill priorities for overlapping zones.
///
/// Every pair of candidates sharing a layer is compared with [`winner`].
/// Zones are then visited losers first, ties in input order, and each gets a
/// priority one above the highest priority it beats; a zone that beats
/// nothing gets 1. Zones that overlap nothing get `None` and keep their
/// priority. Inconsistent results (a cycle) are tolerated: the remaining
/// zones are visited in input order.
#[must_use]
pub fn infer_priorities(candidates: &[PriorityCandidate<'_>]) -> Vec<Option<u32>> {
    let n = candidates.len();
    let mut beats: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut beaten_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut involved = vec![false; n];

    for i in 0..n {
        for j in i + 1..n {
            let (a, b) = (&candidates[i], &candidates[j]);
            if !a.shares_layer(b) {
                continue;
            }
            let Some(a_wins) = winner(a, b) else {
                continue;
            };
            let (win, lose) = if a_wins { (i, j) } else { (j, i) };
            beats[win].push(lose);
            beaten_by[lose].push(win);
            involved[i] = true;
            involved[j] = true;
        }
    }

    let mut pending: Vec<usize> = beats.iter().map(Vec::len).collect();
    let mut priorities: Vec<Option<u32>> = vec![None; n];
    loop {
        let open = |i: &usize| involved[*i] && priorities[*i].is_none();
        let Some(next) = (0..n)
            .filter(open)
            .find(|&i| pending[i] == 0)
            .or_else(|| (0..n).find(open))
        else {
            break;
        };

        let priority = beats[next]
            .iter()
            .filter_map(|&loser| priorities[loser])
            .max()
            .map_or(1, |p| p + 1);
        priorities[next] = Some(priority);
        for &win in &beaten_by[next] {
            pending[win] = pending[win].saturating_sub(1);
        }
    }
    priorities
}

impl Importer<'_> {
    pub(super) fn load_areas(&mut self) -> ImportResult<()> {
        let archive = self.archive;
        for (id, area) in &archive.layout.areas {
            let label = if area.name.is_empty() {
                id.to_string()
            } else {
                area.name.clone()
            };
            if !(area.no_vias || area.no_tracks || area.keepout || area.routing) {
                self.diag.warn(format!(
                    "The area '{label}' is a pure placement area, which has no host \
                     equivalent. It was not imported."
                ));
                continue;
            }

            let width = self.line_width(&area.line_code, &format!("Area '{label}'"))?;
            let result = self
                .shapes
                .filled_area(&area.shape, width, &Transform::IDENTITY);
            let Some(outline) = self.geometry(result, &format!("Area '{label}'")) else {
                continue;
            };
            let layers = self.host_layers(&area.layer);
            if layers.is_empty() {
                continue;
            }

            let mut keepout = Keepout::empty();
            if area.no_tracks {
                keepout |= Keepout::TRACKS | Keepout::COPPER_POUR;
            }
            if area.no_vias {
                keepout |= Keepout::VIAS;
            }
            if area.keepout {
                keepout |= Keepout::FOOTPRINTS;
            }
            let mut zone = Zone::rule_area(layers, outline, keepout);
            zone.name.clone_from(&label);
            zone.border = BorderStyle::NoHatch;
            self.board.add(zone);

            if area.placement {
                self.diag.warn(format!(
                    "The area '{label}' is also a placement area, which has no host \
                     equivalent. Only its routing restrictions were imported."
                ));
            }
        }
        Ok(())
    }

    pub(super) fn load_templates(&mut self) -> ImportResult<()> {
        let archive = self.archive;
        for (id, template) in &archive.layout.templates {
            let label = if template.name.is_empty() {
                id.to_string()
            } else {
                template.name.clone()
            };
            let Some(zone) = self.template_zone(template, &label)? else {
                continue;
            };
            let item = self.board.add(zone);
            self.templates.insert(id.clone(), item);
        }
        self.load_power_planes()?;
        debug!(templates = self.templates.len(), "Templates loaded");
        Ok(())
    }

    fn template_zone(&mut self, template: &Template, label: &str) -> ImportResult<Option<Zone>> {
        let Some(layer) = self.copper_layer(&template.layer) else {
            return Ok(None);
        };
        let result = self.shapes.polygon(&template.shape, &Transform::IDENTITY);
        let Some(outline) = self.geometry(result, &format!("Template '{label}'")) else {
            return Ok(None);
        };
        let context = format!("Template '{label}'");
        let pouring = &template.pouring;
        let units = *self.shapes.units();

        let mut zone = Zone::new(LayerSet::of(&[layer]), outline);
        zone.name = label.to_string();
        zone.priority = 1;
        zone.border = BorderStyle::NoHatch;
        if !is_unconnected(template.net.as_str()) {
            zone.net = Some(self.net_code(&template.net)?);
        }

        for (enabled, setting) in [
            (pouring.allow_in_no_routing, "Allow in No Routing Areas"),
            (pouring.box_isolated_pins, "Box Isolated Pins"),
            (pouring.automatic_repour, "Automatic Repour"),
            (pouring.sliver_width != 0, "Sliver Width"),
        ] {
            if enabled {
                self.diag.warn(format!(
                    "The template '{label}' uses the setting '{setting}', which has no host \
                     equivalent. It was ignored."
                ));
            }
        }
        if pouring.min_isolated_copper != pouring.min_disjoint_copper {
            self.diag.warn(format!(
                "The template '{label}' has different minima for isolated and disjoint \
                 copper. The disjoint minimum was used as the island area."
            ));
        }

        zone.island_removal = match pouring.min_disjoint_copper {
            Some(length) => {
                let length = units.length(length);
                IslandRemoval::Area(length.saturating_mul(length))
            }
            None => IslandRemoval::Always,
        };

        let copper_to_copper = match self.archive.codes.spacing_codes.get("C_C") {
            Some(&spacing) => units.length(spacing),
            None => self.board.design_settings().min_clearance,
        };
        zone.local_clearance = units.length(pouring.additional_isolation) + copper_to_copper;

        let min_thickness = self.copper_width(&pouring.copper_code, &context)?;
        zone.min_thickness = min_thickness;

        if pouring.fill_type == FillType::Hatched {
            zone.fill_mode = FillMode::Hatched;
            if let Some(hatch) = &pouring.hatch_code {
                zone.hatch = self.hatch_settings(hatch, &context)?;
            }
        }

        if pouring.thermal_relief_on_pads != pouring.thermal_relief_on_vias
            || pouring.thermal_relief_pads_angle != pouring.thermal_relief_vias_angle
        {
            self.diag.warn(format!(
                "The template '{label}' has different thermal relief settings for pads and \
                 vias. The pad settings were applied to both."
            ));
        }

        let spoke_width = self.copper_width(&pouring.relief_copper_code, &context)?;
        let relief_width = units.length(pouring.clearance_width);
        if pouring.thermal_relief_on_pads && relief_width > 0 && spoke_width > min_thickness {
            zone.pad_connection = PadConnection::Thermal;
            zone.thermal_gap = relief_width;
            zone.thermal_spoke_width = spoke_width;
        } else {
            if pouring.thermal_relief_on_pads && spoke_width > min_thickness {
                self.diag.warn(format!(
                    "The template '{label}' has thermal reliefs that cannot be represented. \
                     A solid connection was used; refilling the zone removes the reliefs."
                ));
            }
            zone.pad_connection = PadConnection::Full;
        }

        Ok(Some(zone))
    }

    /// Hatch pattern from the first hatch of a code.
    ///
    /// Each code is checked once for patterns the host cannot draw.
    fn hatch_settings(
        &mut self,
        id: &HatchCodeId,
        context: &str,
    ) -> ImportResult<Option<HatchSettings>> {
        let code = self.hatch_code(id, context)?;
        let units = *self.shapes.units();

        let mut issues = Vec::new();
        match code.hatches.as_slice() {
            [first, second] => {
                if first.line_width != second.line_width {
                    issues.push("different line widths");
                }
                if first.step != second.step {
                    issues.push("different steps");
                }
                if (first.orient_angle - second.orient_angle).abs() != 90_000 {
                    issues.push("hatches that are not 90 degrees apart");
                }
            }
            _ => issues.push("a hatch count other than two"),
        }
        if !issues.is_empty() {
            let name = if code.name.is_empty() {
                id.to_string()
            } else {
                code.name.clone()
            };
            self.diag.warn_once(format!("hatch-code:{id}"), || {
                format!(
                    "The hatch code '{name}' has {}. Only crosshatching 90 degrees apart is \
                     supported; the first hatch was used.",
                    issues.join(" and ")
                )
            });
        }

        Ok(code.hatches.first().map(|hatch| HatchSettings {
            thickness: units.length(hatch.line_width),
            gap: units.length(hatch.step),
            orientation: UnitConverter::angle(hatch.orient_angle),
        }))
    }

    /// One zone per board outline on every POWER layer, on the net named
    /// after the layer.
    fn load_power_planes(&mut self) -> ImportResult<()> {
        let archive = self.archive;
        for layer_id in self.layers.power_planes().to_vec() {
            let name = self.layer_name(&layer_id);
            let Some(layer) = self.copper_layer(&layer_id) else {
                continue;
            };
            let Some(net_id) = archive
                .layout
                .nets
                .iter()
                .find(|(_, net)| net.name == name)
                .map(|(id, _)| id)
            else {
                self.diag.warn(format!(
                    "The layer '{name}' is a power plane but no net has that name. The layer \
                     was loaded without a copper zone."
                ));
                continue;
            };
            let net = self.net_code(net_id)?;

            for (board_id, outline) in &archive.layout.boards {
                let result = self.shapes.polygon(&outline.shape, &Transform::IDENTITY);
                let what = format!("Power plane '{name}' on board '{board_id}'");
                let Some(polygon) = self.geometry(result, &what) else {
                    continue;
                };
                let mut zone = Zone::new(LayerSet::of(&[layer]), polygon);
                zone.name.clone_from(&name);
                zone.net = Some(net);
                zone.priority = 0;
                zone.fill_mode = FillMode::Solid;
                zone.pad_connection = PadConnection::Full;
                zone.island_removal = IslandRemoval::Never;
                zone.border = BorderStyle::NoHatch;
                self.board.add(zone);
            }
        }
        Ok(())
    }

    pub(super) fn load_coppers(&mut self) -> ImportResult<()> {
        let archive = self.archive;
        for (id, copper) in &archive.layout.coppers {
            let context = format!("Copper '{id}'");
            let width = self.copper_width(&copper.copper_code, &context)?;

            if let Some(template) = &copper.poured_template {
                if !archive.layout.templates.contains_key(template) {
                    return Err(ImportError::missing("template", template.as_str(), context));
                }
                // Templates without a zone were already reported.
                let Some(&item) = self.templates.get(template) else {
                    continue;
                };
                let result =
                    self.shapes
                        .filled_area(&copper.shape, width, &Transform::IDENTITY);
                let Some(area) = self.geometry(result, &context) else {
                    continue;
                };
                if let Some(zone) = self.board.zone_mut(item) {
                    let fill = zone.filled_polygons().union(&area).fractured();
                    zone.fill = Some(fill);
                }
                continue;
            }

            self.diag.warn_once("free-copper", || {
                "The design contains copper elements without a template. Solid and hatched \
                 ones were imported as zones, outlines as tracks."
                    .to_string()
            });
            let Some(layer) = self.copper_layer(&copper.layer) else {
                continue;
            };
            let net = if is_unconnected(copper.net.as_str()) {
                None
            } else {
                Some(self.net_code(&copper.net)?)
            };

            match copper.shape.kind {
                ShapeKind::Openshape | ShapeKind::Outline => {
                    self.copper_tracks(&copper.shape, width, layer, net);
                }
                ShapeKind::Solid | ShapeKind::Hatched => {
                    let result =
                        self.shapes
                            .filled_area(&copper.shape, width, &Transform::IDENTITY);
                    let Some(outline) = self.geometry(result, &context) else {
                        continue;
                    };
                    let mut zone = Zone::new(LayerSet::of(&[layer]), outline.clone());
                    zone.name = id.to_string();
                    zone.border = BorderStyle::NoHatch;
                    if copper.shape.kind == ShapeKind::Hatched {
                        zone.fill_mode = FillMode::Hatched;
                        if let Some(hatch) = &copper.shape.hatch_code {
                            zone.hatch = self.hatch_settings(hatch, &context)?;
                        }
                    }
                    zone.island_removal = IslandRemoval::Never;
                    zone.pad_connection = PadConnection::Full;
                    zone.net = net;
                    zone.priority = u32::try_from(self.templates.len() + 1).unwrap_or(u32::MAX);
                    zone.fill = Some(outline.fractured());
                    self.board.add(zone);
                }
            }
        }
        Ok(())
    }

    /// Free copper outlines, cutouts included, as chained tracks.
    fn copper_tracks(&mut self, shape: &Shape, width: i64, layer: PcbLayer, net: Option<NetCode>) {
        let rings = std::iter::once(&shape.vertices).chain(&shape.cutouts);
        for ring in rings {
            let pieces: Vec<RoutePiece> = self
                .shapes
                .segments(ring, &Transform::IDENTITY)
                .into_iter()
                .map(|segment| RoutePiece {
                    segment,
                    width,
                    locked: false,
                })
                .collect();
            for track in chain_tracks(&pieces, layer, net) {
                self.board.add(track);
            }
        }
    }

    /// Host copper layer of an archive layer, warning once when there is none.
    fn copper_layer(&mut self, id: &crate::archive::LayerId) -> Option<PcbLayer> {
        let layer = self.layers.layer(id).filter(|l| l.is_copper());
        if layer.is_none() {
            let name = self.layer_name(id);
            self.diag.warn_once(format!("no-copper-layer:{id}"), || {
                format!("Copper on the layer '{name}' has no host copper layer and was not imported.")
            });
        }
        layer
    }

    pub(super) fn calculate_zone_priorities(&mut self) {
        let (items, priorities) = {
            let zones: Vec<_> = self
                .templates
                .values()
                .filter_map(|&item| self.board.zone(item).map(|zone| (item, zone)))
                .collect();
            let candidates: Vec<PriorityCandidate<'_>> = zones
                .iter()
                .map(|(_, zone)| PriorityCandidate {
                    layers: zone.layers,
                    outline: &zone.outline,
                    fill: zone.fill.as_ref(),
                })
                .collect();
            let items: Vec<_> = zones.iter().map(|(item, _)| *item).collect();
            (items, infer_priorities(&candidates))
        };

        let mut changed = 0;
        for (item, priority) in items.into_iter().zip(priorities) {
            if let (Some(zone), Some(priority)) = (self.board.zone_mut(item), priority) {
                zone.priority = priority;
                changed += 1;
            }
        }
        debug!(zones = changed, "Zone priorities inferred");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::geometry::{rectangle, Point};
    use crate::import::test_support::{archive, importer_with_stackup};
    use serde_json::{json, Value};

    fn square(cx: i64, cy: i64, size: i64) -> PolySet {
        PolySet::from_outline(rectangle(Point::new(cx, cy), size, size))
    }

    fn candidate<'a>(outline: &'a PolySet, fill: Option<&'a PolySet>) -> PriorityCandidate<'a> {
        PriorityCandidate {
            layers: LayerSet::of(&[PcbLayer::FrontCopper]),
            outline,
            fill,
        }
    }

    fn square_shape(size: i64) -> Value {
        json!({"type": "outline", "vertices": [
            {"type": "point", "end": {"x": -size, "y": -size}},
            {"type": "point", "end": {"x": size, "y": -size}},
            {"type": "point", "end": {"x": size, "y": size}},
            {"type": "point", "end": {"x": -size, "y": size}}
        ]})
    }

    fn template(size: i64, net: &str) -> Value {
        json!({
            "name": format!("T{size}"),
            "net": net,
            "layer": "TOP",
            "shape": square_shape(size),
            "pouring": {"copper_code": "CC1", "relief_copper_code": "CC1"}
        })
    }

    #[test]
    fn nested_fill_wins_over_outer_fill() {
        let outer = square(0, 0, 10_000);
        let inner = square(0, 0, 2000);
        let outer_fill = square(0, 0, 10_000);
        let inner_fill = square(0, 0, 2000);
        let candidates = [
            candidate(&outer, Some(&outer_fill)),
            candidate(&inner, Some(&inner_fill)),
        ];
        let priorities = infer_priorities(&candidates);
        assert_eq!(priorities, vec![Some(1), Some(2)]);
    }

    #[test]
    fn unpoured_nested_outline_wins() {
        let outer = square(0, 0, 10_000);
        let inner = square(3000, 0, 2000);
        let candidates = [candidate(&inner, None), candidate(&outer, None)];
        let priorities = infer_priorities(&candidates);
        assert!(priorities[0] > priorities[1]);
    }

    #[test]
    fn disjoint_or_foreign_layer_zones_keep_priority() {
        let a = square(0, 0, 1000);
        let b = square(5000, 0, 1000);
        let c = square(0, 0, 500);
        let mut other_layer = candidate(&c, None);
        other_layer.layers = LayerSet::of(&[PcbLayer::BackCopper]);
        let priorities = infer_priorities(&[candidate(&a, None), candidate(&b, None), other_layer]);
        assert_eq!(priorities, vec![None, None, None]);
    }

    #[test]
    fn chains_of_wins_stack_up() {
        let big = square(0, 0, 10_000);
        let mid = square(0, 0, 5000);
        let small = square(0, 0, 1000);
        let priorities = infer_priorities(&[
            candidate(&small, None),
            candidate(&big, None),
            candidate(&mid, None),
        ]);
        assert_eq!(priorities, vec![Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn priority_cycle_is_broken_in_input_order() {
        // Each zone's fill reaches into the next outline: A over B over C over A.
        let outlines = [square(0, 0, 2000), square(10_000, 0, 2000), square(20_000, 0, 2000)];
        let fills: Vec<PolySet> = (0..3)
            .map(|i| outlines[i].union(&outlines[(i + 1) % 3]))
            .collect();
        let candidates: Vec<_> = outlines
            .iter()
            .zip(&fills)
            .map(|(outline, fill)| candidate(outline, Some(fill)))
            .collect();

        let priorities = infer_priorities(&candidates);
        assert_eq!(priorities, vec![Some(1), Some(3), Some(2)]);
        assert_eq!(infer_priorities(&candidates), priorities);
    }

    #[test]
    fn nested_templates_get_increasing_priorities() {
        let archive = archive(json!({
            "layout": {
                "nets": {"N1": {"name": "GND", "route_code": "RC1"}},
                "templates": {
                    "TP1": template(50_000, "N1"),
                    "TP2": template(10_000, "NONE")
                }
            }
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_templates().unwrap();
        importer.load_coppers().unwrap();
        importer.calculate_zone_priorities();
        let outer = importer.templates[&crate::archive::TemplateId::from("TP1")];
        let inner = importer.templates[&crate::archive::TemplateId::from("TP2")];
        importer.calculate_zone_priorities();
        drop(importer);

        let outer = board.zone(outer).unwrap();
        let inner = board.zone(inner).unwrap();
        assert!(inner.priority > outer.priority);
        assert_eq!(outer.priority, 1);
        assert!(outer.net.is_some());
        assert!(inner.net.is_none());
        assert_eq!(outer.border, BorderStyle::NoHatch);
        assert_eq!(board.net_by_name("GND").map(|n| n.code), outer.net);
    }

    #[test]
    fn template_settings_follow_pouring() {
        let mut tp = template(10_000, "");
        tp["pouring"] = json!({
            "copper_code": "CC1",
            "relief_copper_code": "CC2",
            "clearance_width": 30,
            "additional_isolation": 5,
            "thermal_relief_on_pads": true,
            "thermal_relief_on_vias": true,
            "min_isolated_copper": 100,
            "min_disjoint_copper": 100,
            "fill_type": "hatched",
            "hatch_code": "HC1"
        });
        let archive = archive(json!({
            "codes": {
                "copper_codes": {"CC2": {"name": "Spoke", "copper_width": 20}},
                "spacing_codes": {"C_C": 40}
            },
            "layout": {"templates": {"TP1": tp}}
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_templates().unwrap();
        let item = importer.templates[&crate::archive::TemplateId::from("TP1")];
        let diag = std::mem::take(&mut importer.diag);
        drop(importer);

        let zone = board.zone(item).unwrap();
        assert_eq!(zone.local_clearance, 50 + 400);
        assert_eq!(zone.min_thickness, 100);
        assert_eq!(zone.island_removal, IslandRemoval::Area(1000 * 1000));
        assert_eq!(zone.pad_connection, PadConnection::Thermal);
        assert_eq!(zone.thermal_gap, 300);
        assert_eq!(zone.thermal_spoke_width, 200);
        assert_eq!(zone.fill_mode, FillMode::Hatched);
        let hatch = zone.hatch.unwrap();
        assert_eq!((hatch.thickness, hatch.gap), (50, 500));
        assert!((hatch.orientation - 45.0).abs() < 1e-9);
        assert!(!diag.warnings().any(|w| w.contains("T10000") || w.contains("hatch code")));
    }

    #[test]
    fn odd_hatch_code_warns_once() {
        let mut a = template(10_000, "");
        a["pouring"]["fill_type"] = json!("hatched");
        a["pouring"]["hatch_code"] = json!("HC1");
        let b = a.clone();
        let archive = archive(json!({
            "codes": {"hatch_codes": {"HC1": {"hatches": [
                {"line_width": 5, "step": 50, "orient_angle": 0},
                {"line_width": 6, "step": 50, "orient_angle": 45_000}
            ]}}},
            "layout": {"templates": {"TP1": a, "TP2": b}}
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_templates().unwrap();
        let diag = std::mem::take(&mut importer.diag);
        drop(importer);

        let hatch_warnings: Vec<&str> = diag.warnings().filter(|w| w.contains("hatch code")).collect();
        assert_eq!(hatch_warnings.len(), 1);
        assert!(hatch_warnings[0].contains("different line widths"));
        assert!(hatch_warnings[0].contains("90 degrees"));
    }

    #[test]
    fn unsupported_template_options_warn() {
        let mut tp = template(10_000, "");
        tp["pouring"]["box_isolated_pins"] = json!(true);
        tp["pouring"]["sliver_width"] = json!(3);
        tp["pouring"]["thermal_relief_on_pads"] = json!(true);
        tp["pouring"]["relief_copper_code"] = json!("CC2");
        let archive = archive(json!({
            "codes": {"copper_codes": {"CC2": {"name": "Spoke", "copper_width": 20}}},
            "layout": {"templates": {"TP1": tp}}
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_templates().unwrap();
        let item = importer.templates[&crate::archive::TemplateId::from("TP1")];
        let diag = std::mem::take(&mut importer.diag);
        drop(importer);

        assert!(diag.has_warning("Box Isolated Pins"));
        assert!(diag.has_warning("Sliver Width"));
        assert!(diag.has_warning("pads and vias"));
        assert!(diag.has_warning("thermal reliefs that cannot be represented"));
        assert_eq!(board.zone(item).map(|z| z.pad_connection), Some(PadConnection::Full));
    }

    #[test]
    fn power_plane_covers_each_board_outline() {
        let archive = archive(json!({
            "layers": {"BOT": {"name": "VCC", "type": "power", "physical_layer": 2}},
            "layout": {
                "boards": {"B1": {"line_code": "LC1", "shape": square_shape(50_000)}},
                "nets": {"N1": {"name": "VCC", "route_code": "RC1"}}
            }
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_templates().unwrap();
        drop(importer);

        let zones: Vec<&Zone> = board.zones().map(|(_, z)| z).collect();
        assert_eq!(zones.len(), 1);
        let plane = zones[0];
        assert_eq!(plane.priority, 0);
        assert_eq!(plane.island_removal, IslandRemoval::Never);
        assert_eq!(plane.pad_connection, PadConnection::Full);
        assert!(plane.layers.contains(PcbLayer::BackCopper));
        assert_eq!(board.net_by_name("VCC").map(|n| n.code), plane.net);
    }

    #[test]
    fn power_plane_without_net_warns() {
        let archive = archive(json!({
            "layers": {"BOT": {"name": "VCC", "type": "power", "physical_layer": 2}},
            "layout": {"boards": {"B1": {"line_code": "LC1", "shape": square_shape(50_000)}}}
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_templates().unwrap();
        assert!(importer.diag.has_warning("power plane"));
        drop(importer);
        assert_eq!(board.zones().count(), 0);
    }

    #[test]
    fn poured_coppers_fill_their_template() {
        let archive = archive(json!({
            "layout": {
                "templates": {"TP1": template(10_000, "")},
                "coppers": {
                    "CU1": {"copper_code": "CC1", "layer": "TOP", "shape": {"type": "solid", "vertices": [
                        {"type": "point", "end": {"x": -5000, "y": -5000}},
                        {"type": "point", "end": {"x": 5000, "y": -5000}},
                        {"type": "point", "end": {"x": 5000, "y": 5000}},
                        {"type": "point", "end": {"x": -5000, "y": 5000}}
                    ]}, "poured_template": "TP1"},
                    "CU2": {"copper_code": "CC1", "layer": "TOP", "shape": {"type": "openshape", "vertices": [
                        {"type": "point", "end": {"x": 5000, "y": 0}},
                        {"type": "point", "end": {"x": 9000, "y": 0}}
                    ]}, "poured_template": "TP1"}
                }
            }
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_templates().unwrap();
        importer.load_coppers().unwrap();
        let item = importer.templates[&crate::archive::TemplateId::from("TP1")];
        drop(importer);

        let zone = board.zone(item).unwrap();
        let fill = zone.fill.as_ref().unwrap();
        // 100 um square grown by 50 nm, plus a 40 um spoke 100 nm wide.
        let square = 100_100.0_f64 * 100_100.0;
        assert!(fill.area() > square);
        assert!(fill.area() < square + 40_000.0 * 100.0 + 10_000.0);
        assert!(fill.contains(Point::new(85_000, 0)));
    }

    #[test]
    fn missing_poured_template_is_fatal() {
        let archive = archive(json!({"layout": {"coppers": {"CU1": {
            "copper_code": "CC1", "layer": "TOP", "poured_template": "TP9",
            "shape": {"type": "solid", "vertices": []}
        }}}}));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        let err = importer.load_coppers().unwrap_err();
        assert!(matches!(err, ImportError::MissingReference { kind: "template", .. }));
    }

    #[test]
    fn free_coppers_become_tracks_and_zones() {
        let archive = archive(json!({"layout": {
            "nets": {"N1": {"name": "GND", "route_code": "RC1"}},
            "templates": {"TP1": template(10_000, "")},
            "coppers": {
                "CU1": {"copper_code": "CC1", "layer": "TOP", "net": "N1", "shape": {
                    "type": "openshape", "vertices": [
                        {"type": "point", "end": {"x": 0, "y": 0}},
                        {"type": "point", "end": {"x": 1000, "y": 0}},
                        {"type": "point", "end": {"x": 1000, "y": 1000}}
                    ]}},
                "CU2": {"copper_code": "CC1", "layer": "BOT", "shape": square_shape(2000)},
                "CU3": {"copper_code": "CC1", "layer": "BOT", "shape": {
                    "type": "solid", "vertices": square_shape(3000)["vertices"]}}
            }
        }}));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_templates().unwrap();
        importer.load_coppers().unwrap();
        let diag = std::mem::take(&mut importer.diag);
        drop(importer);

        assert_eq!(diag.warnings().filter(|w| w.contains("without a template")).count(), 1);
        let gnd = board.net_by_name("GND").map(|n| n.code);
        let tracks: Vec<_> = board.tracks().map(|(_, t)| t).collect();
        assert_eq!(tracks.iter().filter(|t| t.net == gnd && t.net.is_some()).count(), 2);
        // Four vertices, three edges: outlines are drawn as listed.
        assert_eq!(tracks.iter().filter(|t| t.layer == PcbLayer::BackCopper).count(), 3);
        assert!(tracks.iter().all(|t| t.width == 100));

        let free = board.zones().map(|(_, z)| z).find(|z| z.name == "CU3").unwrap();
        assert_eq!(free.priority, 2);
        assert_eq!(free.island_removal, IslandRemoval::Never);
        assert!(free.is_filled());
    }

    #[test]
    fn areas_become_rule_areas() {
        let archive = archive(json!({"layout": {"areas": {
            "A1": {"name": "No vias", "layer": "TOP", "line_code": "LC1",
                   "shape": square_shape(1000), "no_vias": true, "placement": true},
            "A2": {"name": "Keep out", "layer": "ELEC", "line_code": "LC1",
                   "shape": square_shape(1000), "no_tracks": true, "keepout": true},
            "A3": {"name": "Place", "layer": "TOP", "line_code": "LC1",
                   "shape": square_shape(1000), "placement": true}
        }}}));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_areas().unwrap();
        let diag = std::mem::take(&mut importer.diag);
        drop(importer);

        let zones: Vec<&Zone> = board.zones().map(|(_, z)| z).collect();
        assert_eq!(zones.len(), 2);
        assert!(zones.iter().all(|z| z.rule_area));
        assert_eq!(zones[0].keepout, Keepout::VIAS);
        assert_eq!(
            zones[1].keepout,
            Keepout::TRACKS | Keepout::COPPER_POUR | Keepout::FOOTPRINTS
        );
        assert!(zones[1].layers.contains(PcbLayer::BackCopper));
        assert!(diag.has_warning("also a placement area"));
        assert!(diag.has_warning("pure placement area"));
    }
}
