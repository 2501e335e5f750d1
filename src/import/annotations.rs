//! Design rules, groups, board outlines, figures, texts, dimensions and text
//! variables.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::archive::{
    self, Alignment, DimensionId, GroupId, LayerId, LineStyle, LinearKind, Shape, TextCode, Units,
};
use crate::board::{
    Dimension, DimensionKind, DimensionUnits, Group, HorizontalJustify, LayerSet, PcbLayer,
    Project, Size, Text, UnitsFormat, VerticalJustify,
};
use crate::geometry::{normalize_angle_pos, round, Point, Transform};

use super::error::{ImportError, ImportResult};
use super::units::UnitConverter;
use super::Importer;

/// Glyph height as a share of the archive character cell.
const TEXT_HEIGHT_RATIO: f64 = (24.0 - 5.0) / 21.0;

/// Distance between baselines as a multiple of the glyph height.
const INTERLINE_RATIO: f64 = 1.61;

/// Smallest through hole, in nanometres (0.0508 mm).
const MIN_THROUGH_DRILL: i64 = 50_800;

/// Replaces `<@NAME@>` fields with `${NAME}` host text variables.
///
/// Spaces inside a field name become underscores.
#[must_use]
pub fn text_fields(text: &str) -> String {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(pattern) = PATTERN.get_or_init(|| Regex::new(r"<@([^@>]+)@>").ok()) else {
        return text.to_string();
    };
    pattern
        .replace_all(text, |caps: &Captures<'_>| {
            format!("${{{}}}", caps[1].trim().replace(' ', "_"))
        })
        .into_owned()
}

const fn justification(alignment: Alignment) -> (HorizontalJustify, VerticalJustify) {
    use HorizontalJustify as H;
    use VerticalJustify as V;
    match alignment {
        Alignment::NoAlignment | Alignment::BottomLeft => (H::Left, V::Bottom),
        Alignment::BottomCenter => (H::Center, V::Bottom),
        Alignment::BottomRight => (H::Right, V::Bottom),
        Alignment::CenterLeft => (H::Left, V::Center),
        Alignment::CenterCenter => (H::Center, V::Center),
        Alignment::CenterRight => (H::Right, V::Center),
        Alignment::TopLeft => (H::Left, V::Top),
        Alignment::TopCenter => (H::Center, V::Top),
        Alignment::TopRight => (H::Right, V::Top),
    }
}

/// Moves unaligned multi-line text so its first line sits on the anchor.
#[allow(clippy::cast_precision_loss)]
fn correct_unaligned(text: &mut Text) {
    let mut extra = text.text.matches('\n').count();
    if text.text.ends_with('\n') {
        extra = extra.saturating_sub(1);
    }
    if extra == 0 {
        return;
    }
    let interline = round(text.size.y as f64 * INTERLINE_RATIO);
    let mut offset = Point::new(0, interline).rotate(text.angle);
    if text.mirrored {
        offset.x = -offset.x;
    }
    text.position += offset * i64::try_from(extra).unwrap_or(0);
}

/// Unit abbreviations a dimension suffix may start with.
const fn unit_suffixes(units: DimensionUnits) -> &'static [&'static str] {
    match units {
        DimensionUnits::Millimetres => &["mm"],
        DimensionUnits::Inches => &["in", "\""],
        DimensionUnits::Mils => &["thou", "mil"],
    }
}

impl<'a> Importer<'a> {
    /// Host layers for an archive layer, warning once per layer when there are none.
    pub(super) fn host_layers(&mut self, id: &LayerId) -> LayerSet {
        let layers = self.layers.layers(id);
        if layers.is_empty() {
            let name = self.layer_name(id);
            self.diag.warn_once(format!("no-host-layer:{id}"), || {
                format!("Elements on the layer '{name}' have no host layer and were not imported.")
            });
        }
        layers
    }

    fn text_size(&self, code: &TextCode) -> (Size, i64) {
        let units = self.shapes.units();
        let height = units.length(code.height);
        let width = if code.width == 0 {
            height
        } else {
            units.length(code.width)
        };
        #[allow(clippy::cast_precision_loss)]
        let size = Size::new(width, round(TEXT_HEIGHT_RATIO * height as f64));
        (size, units.length(code.line_width))
    }

    fn spacing_rule(&mut self, rule: &str, description: &str) -> Option<i64> {
        let value = self.archive.codes.spacing_codes.get(rule).copied();
        if value.is_none() {
            self.diag.warn(format!(
                "The design rule '{rule}' ({description}) was not found in the archive. The \
                 host default was kept."
            ));
        }
        value.map(|v| self.shapes.units().length(v))
    }

    pub(super) fn load_design_rules(&mut self) {
        let min_clearance = self.spacing_rule("T_T", "minimum clearance");
        let edge_clearance = self.spacing_rule("C_B", "copper to board edge clearance");
        let hole_to_hole = self.spacing_rule("H_H", "minimum hole to hole spacing");
        let min_width = self
            .shapes
            .units()
            .length(self.archive.technology.min_route_width);

        let settings = self.board.design_settings_mut();
        if let Some(value) = min_clearance {
            settings.min_clearance = value;
        }
        if let Some(value) = edge_clearance {
            settings.copper_edge_clearance = value;
        }
        if let Some(value) = hole_to_hole {
            settings.hole_to_hole_min = value;
        }
        settings.track_min_width = min_width;
        settings.via_min_size = min_width;
        settings.via_min_annular_width = min_width / 2;
        settings.min_through_drill = MIN_THROUGH_DRILL;
        settings.hole_clearance = settings.copper_edge_clearance;

        self.diag.warn(
            "The archive and host design rules are different. Only the compatible design rules \
             were imported; review the design rules that were applied.",
        );
    }

    pub(super) fn load_groups(&mut self) -> ImportResult<()> {
        let archive = self.archive;
        for (id, group) in &archive.layout.groups {
            let mut host = Group::new(group.name.as_str());
            host.locked = group.fixed;
            let item = self.board.add(host);
            self.groups.insert(id.clone(), item);
        }
        for (id, group) in &archive.layout.groups {
            let Some(parent) = group.parent.as_ref().filter(|p| !p.is_empty()) else {
                continue;
            };
            let parent_item = *self.groups.get(parent).ok_or_else(|| {
                ImportError::missing("group", parent.as_str(), format!("Group '{}'", group.name))
            })?;
            if let Some(&item) = self.groups.get(id) {
                self.board.add_to_group(parent_item, item)?;
            }
        }
        debug!(groups = self.groups.len(), "Groups loaded");
        Ok(())
    }

    pub(super) fn load_boards(&mut self) -> ImportResult<()> {
        let archive = self.archive;
        for (id, outline) in &archive.layout.boards {
            let width = self.line_width(&outline.line_code, &format!("Board outline '{id}'"))?;
            let group = self.create_unique_group("Board");
            if let Some(&item) = self.groups.get(&group) {
                self.add_to_group(outline.group.as_ref(), item)?;
            }
            self.draw_shape(
                &outline.shape,
                PcbLayer::EdgeCuts,
                width,
                &Transform::IDENTITY,
                Some(&group),
                outline.fixed,
            )?;
        }
        Ok(())
    }

    pub(super) fn load_figures(&mut self) -> ImportResult<()> {
        let archive = self.archive;
        for (id, figure) in &archive.layout.figures {
            let width = self.line_width(&figure.line_code, &format!("Figure '{id}'"))?;
            let layers = self.host_layers(&figure.layer);
            for layer in layers.iter() {
                self.draw_shape(
                    &figure.shape,
                    layer,
                    width,
                    &Transform::IDENTITY,
                    figure.group.as_ref(),
                    figure.fixed,
                )?;
            }
        }
        Ok(())
    }

    pub(super) fn load_texts(&mut self) -> ImportResult<()> {
        let archive = self.archive;
        for text in archive.layout.texts.values() {
            self.draw_text(text, None, &Transform::IDENTITY, text.group.as_ref())?;
        }
        Ok(())
    }

    /// Draws a shape as board graphics on one layer and adds them to `group`.
    pub(super) fn draw_shape(
        &mut self,
        shape: &Shape,
        layer: PcbLayer,
        width: i64,
        transform: &Transform,
        group: Option<&GroupId>,
        locked: bool,
    ) -> ImportResult<()> {
        let result = self
            .shapes
            .graphics(shape, width, layer, transform, &mut self.diag);
        let Some(graphics) = self.geometry(result, &format!("A shape on '{layer}'")) else {
            return Ok(());
        };
        for mut graphic in graphics {
            graphic.locked = locked;
            let item = self.board.add(graphic);
            self.add_to_group(group, item)?;
        }
        Ok(())
    }

    /// Draws archive text through `transform`.
    ///
    /// The text is rotated and scaled about the transform centre, mirrored
    /// when the transform mirrors, then moved. `layer` replaces the text's own
    /// layer; an aggregate layer gets one copy per host layer.
    pub(super) fn draw_text(
        &mut self,
        text: &archive::Text,
        layer: Option<&LayerId>,
        transform: &Transform,
        group: Option<&GroupId>,
    ) -> ImportResult<()> {
        let code = self.text_code(&text.text_code, "Text")?;
        let (size, thickness) = self.text_size(code);
        let center = transform.center;
        let position = self
            .shapes
            .point(text.position)
            .rotate_about(center, transform.rotation)
            .scale_about(center, transform.scale);

        let mut angle = UnitConverter::angle(text.orient_angle) + transform.rotation;
        if text.mirror != transform.mirror {
            angle = -angle;
        }
        let (h_justify, v_justify) = justification(text.alignment);
        let mut item = Text {
            text: text_fields(&text.text),
            position,
            angle,
            size,
            thickness,
            mirrored: text.mirror,
            layer: PcbLayer::Drawings,
            h_justify,
            v_justify,
            locked: false,
        };

        if transform.mirror {
            item.position = item.position.mirror_x(center.x);
            item.angle = -item.angle;
            item.mirrored = !item.mirrored;
        }
        if (transform.scale - 1.0).abs() > f64::EPSILON {
            #[allow(clippy::cast_precision_loss)]
            let scale = |v: i64| round(v as f64 * transform.scale);
            item.size = Size::new(scale(item.size.x), scale(item.size.y));
            item.thickness = scale(item.thickness);
        }
        item.position += transform.translation;
        item.angle = normalize_angle_pos(item.angle);
        if text.alignment == Alignment::NoAlignment {
            correct_unaligned(&mut item);
        }

        let layers = self.host_layers(layer.unwrap_or(&text.layer));
        for host in layers.iter() {
            let mut copy = item.clone();
            copy.layer = host;
            let id = self.board.add(copy);
            self.add_to_group(group, id)?;
        }
        Ok(())
    }

    pub(super) fn load_dimensions(&mut self) -> ImportResult<()> {
        let archive = self.archive;
        for (id, dim) in &archive.layout.dimensions {
            let dimension = match dim.kind {
                archive::DimensionKind::Lineardim => self.linear_dimension(id, dim)?,
                archive::DimensionKind::Leaderdim => self.leader_dimension(id, dim)?,
                archive::DimensionKind::Angledim => {
                    self.diag.warn(format!(
                        "Dimension '{id}' is an angular dimension, which has no host \
                         equivalent. It was not imported."
                    ));
                    None
                }
            };
            if let Some(dimension) = dimension {
                self.board.add(dimension);
            }
        }
        Ok(())
    }

    fn linear_dimension(
        &mut self,
        id: &DimensionId,
        dim: &archive::Dimension,
    ) -> ImportResult<Option<Dimension>> {
        let kind = match dim.subtype {
            LinearKind::Direct => DimensionKind::Aligned,
            LinearKind::Angled => {
                self.diag.warn(format!(
                    "Dimension '{id}' is an angled dimension, which has no host equivalent. \
                     An aligned dimension was loaded instead."
                ));
                DimensionKind::Aligned
            }
            LinearKind::Orthogonal => DimensionKind::Orthogonal {
                horizontal: dim.extension.start.x == dim.line.start.x,
            },
            LinearKind::Other => {
                self.diag.warn(format!(
                    "Dimension '{id}' has an unexpected linear subtype. It was not imported."
                ));
                return Ok(None);
            }
        };
        if dim.line.style == LineStyle::External {
            self.diag.warn(format!(
                "Dimension '{id}' uses the external style, which has no host equivalent. It \
                 was imported with the internal style instead."
            ));
        }
        let Some(mut dimension) = self.dimension_base(id, dim, kind)? else {
            return Ok(None);
        };
        dimension.extension_height = self.shapes.units().length(dim.extension.overshoot);

        let crossbar_start = self.shapes.point(dim.line.start);
        let crossbar_end = self.shapes.point(dim.line.end);
        let height_vector = crossbar_start - dimension.start;
        dimension.height = match kind {
            DimensionKind::Orthogonal { horizontal: true } => height_vector.y,
            DimensionKind::Orthogonal { horizontal: false } => height_vector.x,
            _ => {
                let angle = ((crossbar_end - crossbar_start).angle() + 90.0).to_radians();
                let [x, y] = height_vector.to_f64();
                round(x.mul_add(angle.cos(), y * angle.sin()))
            }
        };
        Ok(Some(dimension))
    }

    #[allow(clippy::cast_precision_loss)]
    fn leader_dimension(
        &mut self,
        id: &DimensionId,
        dim: &archive::Dimension,
    ) -> ImportResult<Option<Dimension>> {
        let line = &dim.line;
        if line.style == LineStyle::Internal {
            let Some(mut dimension) = self.dimension_base(id, dim, DimensionKind::Aligned)? else {
                return Ok(None);
            };
            dimension.start = self.shapes.point(line.start);
            dimension.end = self.shapes.point(line.end);
            dimension.extension_offset = 0;
            dimension.extension_height = 0;
            dimension.height = 0;
            return Ok(Some(dimension));
        }

        let Some(mut dimension) = self.dimension_base(id, dim, DimensionKind::Leader)? else {
            return Ok(None);
        };
        // The leader leans away from the start point, towards the side the end lies on.
        let orient_x: i64 = if line.end.x >= line.start.x { 1 } else { -1 };
        let orient_y: i64 = if line.end.y >= line.start.y { 1 } else { -1 };
        let angle = UnitConverter::angle(line.leader_angle).to_radians();
        let length = line.leader_line_length as f64;
        let end = archive::ArchivePoint::new(
            line.end.x + round(length * angle.cos()) * orient_x,
            line.end.y + round(length * angle.sin()) * orient_y,
        );
        let text_anchor = archive::ArchivePoint::new(
            end.x + line.leader_line_extension_length * orient_x,
            end.y,
        );

        dimension.start = self.shapes.point(line.end);
        dimension.end = self.shapes.point(end);
        dimension.text.position = self.shapes.point(text_anchor);
        dimension.text.h_justify = if orient_x == 1 {
            HorizontalJustify::Right
        } else {
            HorizontalJustify::Left
        };
        dimension.override_text = Some(text_fields(&dim.text.text));
        dimension.prefix.clear();
        dimension.suffix.clear();
        dimension.units_format = UnitsFormat::NoSuffix;
        dimension.extension_offset = 0;
        Ok(Some(dimension))
    }

    /// Settings shared by every dimension kind: layer, text style, measured
    /// points, units, prefix and suffix.
    fn dimension_base(
        &mut self,
        id: &DimensionId,
        dim: &archive::Dimension,
        kind: DimensionKind,
    ) -> ImportResult<Option<Dimension>> {
        let context = format!("Dimension '{id}'");
        let code = self.text_code(&dim.text.text_code, &context)?;
        let line_thickness = self.line_width(&dim.line.line_code, &context)?;
        let Some(layer) = self.host_layers(&dim.layer).iter().next() else {
            return Ok(None);
        };

        let (size, thickness) = self.text_size(code);
        let mut text = Text::new("", Point::ORIGIN, layer);
        text.size = size;
        text.thickness = thickness;

        let technology = &self.archive.technology;
        let (archive_units, precision) = if dim.linear_units == Units::Design {
            (technology.units, technology.unit_display_precision)
        } else {
            (dim.linear_units, dim.precision)
        };
        let units = match archive_units {
            Units::Meter | Units::Centimeter | Units::Micrometer => {
                self.diag.warn(format!(
                    "Dimension '{id}' uses a unit with no host equivalent. Millimetres were \
                     applied instead."
                ));
                DimensionUnits::Millimetres
            }
            Units::Millimeter | Units::Design => DimensionUnits::Millimetres,
            Units::Inch => DimensionUnits::Inches,
            Units::Thou => DimensionUnits::Mils,
        };

        let label = &dim.text.text;
        let (prefix, mut suffix) = match label.find("<@DISTANCE") {
            Some(start) => {
                let rest = &label[start..];
                let after = rest.find("@>").map_or("", |end| &rest[end + 2..]);
                (text_fields(&label[..start]), text_fields(after))
            }
            None => (String::new(), String::new()),
        };
        let mut units_format = UnitsFormat::NoSuffix;
        if let Some(rest) = unit_suffixes(units)
            .iter()
            .find_map(|abbreviation| suffix.strip_prefix(abbreviation))
        {
            suffix = rest.to_string();
            units_format = UnitsFormat::BareSuffix;
        }

        Ok(Some(Dimension {
            kind,
            layer,
            start: self.shapes.point(dim.extension.start),
            end: self.shapes.point(dim.extension.end),
            height: 0,
            extension_offset: self.shapes.units().length(dim.extension.offset),
            extension_height: 0,
            line_thickness,
            text,
            override_text: None,
            precision,
            prefix,
            suffix,
            units,
            units_format,
        }))
    }

    pub(super) fn load_text_variables(&mut self, project: Option<&mut Project>) {
        let Some(project) = project else {
            self.diag.warn(
                "The design text variables were not loaded because there is no project to \
                 store them in.",
            );
            return;
        };
        let archive = self.archive;
        let vars = &mut project.text_vars;
        vars.insert("DESIGN_TITLE".to_string(), archive.header.job_title.clone());
        if let Some(variant) = archive.layout.variants.values().next() {
            vars.insert("VARIANT_NAME".to_string(), variant.name.clone());
            vars.insert(
                "VARIANT_DESCRIPTION".to_string(),
                variant.description.clone(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, GraphicShape};
    use crate::import::Diagnostics;
    use crate::import::test_support::{archive, importer_with_stackup};
    use serde_json::{json, Value};

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    fn texts(board: &Board) -> Vec<Text> {
        board.texts().map(|(_, t)| t.clone()).collect()
    }

    fn text(overrides: Value) -> archive::Text {
        let mut value = json!({
            "text": "R1",
            "text_code": "TC1",
            "position": {"x": 100, "y": 100},
            "layer": "SLT"
        });
        if let (Value::Object(base), Value::Object(extra)) = (&mut value, overrides) {
            base.extend(extra);
        }
        serde_json::from_value(value).unwrap()
    }

    fn dimension(overrides: Value) -> Value {
        let mut value = json!({
            "type": "lineardim",
            "subtype": "direct",
            "layer": "SLT",
            "precision": 2,
            "text": {"text": "<@DISTANCE@>mm", "text_code": "TC1"},
            "line": {
                "line_code": "LC1",
                "start": {"x": 0, "y": 200},
                "end": {"x": 1000, "y": 200}
            },
            "extension": {
                "start": {"x": 0, "y": 0},
                "end": {"x": 1000, "y": 0},
                "offset": 5,
                "overshoot": 7
            }
        });
        if let (Value::Object(base), Value::Object(extra)) = (&mut value, overrides) {
            base.extend(extra);
        }
        value
    }

    fn load_dimension(dim: Value) -> (Board, Diagnostics) {
        let archive = archive(json!({"layout": {"dimensions": {"D1": dim}}}));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_dimensions().unwrap();
        let diag = std::mem::take(&mut importer.diag);
        drop(importer);
        (board, diag)
    }

    #[test]
    fn fields_become_text_variables() {
        assert_eq!(text_fields("<@DESIGN TITLE@> rev A"), "${DESIGN_TITLE} rev A");
        assert_eq!(text_fields("plain"), "plain");
        assert_eq!(text_fields("<@A@>/<@B@>"), "${A}/${B}");
    }

    #[test]
    fn design_rules_come_from_spacing_codes() {
        let archive = archive(json!({}));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_design_rules();
        assert!(importer.diag.has_warning("H_H"));
        assert!(importer.diag.has_warning("design rules"));
        drop(importer);

        let rules = board.design_settings();
        assert_eq!(rules.min_clearance, 200);
        assert_eq!(rules.copper_edge_clearance, 500);
        assert_eq!(rules.hole_clearance, 500);
        assert_eq!(rules.track_min_width, 10_000);
        assert_eq!(rules.via_min_size, 10_000);
        assert_eq!(rules.via_min_annular_width, 5_000);
        assert_eq!(rules.min_through_drill, MIN_THROUGH_DRILL);
    }

    #[test]
    fn groups_are_nested_after_creation() {
        let archive = archive(json!({
            "layout": {"groups": {
                "G2": {"name": "inner", "parent": "G1"},
                "G1": {"name": "outer", "fixed": true}
            }}
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_groups().unwrap();
        let inner = importer.groups[&GroupId::from("G2")];
        let outer = importer.groups[&GroupId::from("G1")];
        drop(importer);

        assert_eq!(board.parent_group(inner), Some(outer));
        assert!(board.group(outer).unwrap().locked);
        assert!(!board.group(inner).unwrap().locked);
    }

    #[test]
    fn board_outline_is_drawn_on_edge_cuts_in_its_own_group() {
        let archive = archive(json!({
            "layout": {
                "groups": {"G1": {"name": "mech"}},
                "boards": {"B1": {
                    "line_code": "LC1",
                    "group": "G1",
                    "shape": {"type": "outline", "vertices": [
                        {"type": "point", "end": {"x": 0, "y": 0}},
                        {"type": "point", "end": {"x": 1000, "y": 0}},
                        {"type": "point", "end": {"x": 1000, "y": 1000}},
                        {"type": "point", "end": {"x": 0, "y": 1000}},
                        {"type": "point", "end": {"x": 0, "y": 0}}
                    ]}
                }}
            }
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_groups().unwrap();
        importer.load_boards().unwrap();
        let mech = importer.groups[&GroupId::from("G1")];
        let outline_group = importer.groups[&GroupId::from("Board")];
        drop(importer);

        assert_eq!(board.parent_group(outline_group), Some(mech));
        let group = board.group(outline_group).unwrap();
        assert_eq!(group.name, "Board");
        assert_eq!(group.members.len(), 4);
        for member in &group.members {
            let graphic = board.graphic(*member).unwrap();
            assert_eq!(graphic.layer, PcbLayer::EdgeCuts);
            assert_eq!(graphic.width, 100);
        }
    }

    #[test]
    fn figure_on_aggregate_layer_is_drawn_on_every_layer() {
        let archive = archive(json!({
            "layout": {"figures": {"F1": {
                "layer": "DOC",
                "line_code": "LC1",
                "fixed": true,
                "shape": {"type": "openshape", "vertices": [
                    {"type": "point", "end": {"x": 0, "y": 0}},
                    {"type": "point", "end": {"x": 100, "y": 0}}
                ]}
            }}}
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_figures().unwrap();
        drop(importer);

        let layers: Vec<PcbLayer> = board.graphics().map(|(_, g)| g.layer).collect();
        assert_eq!(layers.len(), 4);
        assert!(layers.contains(&PcbLayer::Drawings));
        assert!(layers.contains(&PcbLayer::Comments));
        assert!(board.graphics().all(|(_, g)| g.locked));
        let (_, first) = board.graphics().next().unwrap();
        let GraphicShape::Path { segment } = &first.shape else {
            panic!("expected a path");
        };
        assert_eq!(segment.end(), Point::new(1000, 0));
    }

    #[test]
    fn text_takes_code_size_and_alignment() {
        let archive = archive(json!({}));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        let source = text(json!({
            "text": "<@DESIGN TITLE@>",
            "alignment": "top_right",
            "orient_angle": 90_000
        }));
        importer
            .draw_text(&source, None, &Transform::IDENTITY, None)
            .unwrap();
        drop(importer);

        let texts = texts(&board);
        assert_eq!(texts.len(), 1);
        let t = &texts[0];
        assert_eq!(t.text, "${DESIGN_TITLE}");
        assert_eq!(t.position, Point::new(1000, -1000));
        assert_eq!(t.size, Size::new(800, 905));
        assert_eq!(t.thickness, 20);
        assert_eq!(t.layer, PcbLayer::FrontSilkscreen);
        assert_eq!((t.h_justify, t.v_justify), (HorizontalJustify::Right, VerticalJustify::Top));
        assert!(approx_eq(t.angle, 90.0, 1e-9));
        assert!(!t.mirrored);
    }

    #[test]
    fn unaligned_multiline_text_moves_down_by_extra_lines() {
        let archive = archive(json!({}));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        let source = text(json!({"text": "A\nB\n"}));
        importer
            .draw_text(&source, None, &Transform::IDENTITY, None)
            .unwrap();
        drop(importer);

        let t = &texts(&board)[0];
        assert_eq!((t.h_justify, t.v_justify), (HorizontalJustify::Left, VerticalJustify::Bottom));
        // One extra line: 905 * 1.61 rounds to 1457.
        assert_eq!(t.position, Point::new(1000, -1000 + 1457));
    }

    #[test]
    fn mirrored_transform_flips_text_about_the_centre() {
        let archive = archive(json!({}));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        let source = text(json!({"alignment": "center_center", "orient_angle": 30_000}));
        let transform = Transform {
            mirror: true,
            scale: 2.0,
            translation: Point::new(0, 500),
            ..Transform::IDENTITY
        };
        importer.draw_text(&source, None, &transform, None).unwrap();
        drop(importer);

        let t = &texts(&board)[0];
        assert!(t.mirrored);
        assert_eq!(t.position, Point::new(-2000, -2000 + 500));
        assert_eq!(t.size, Size::new(1600, 1810));
        assert_eq!(t.thickness, 40);
        // Inverted once for the mirror mismatch and once by the flip.
        assert!(approx_eq(t.angle, 30.0, 1e-9));
    }

    #[test]
    fn text_on_aggregate_layer_is_copied_into_the_group() {
        let archive = archive(json!({"layout": {"groups": {"G1": {"name": "notes"}}}}));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_groups().unwrap();
        let group = GroupId::from("G1");
        let source = text(json!({"layer": "DOC"}));
        importer
            .draw_text(&source, None, &Transform::IDENTITY, Some(&group))
            .unwrap();
        let group_item = importer.groups[&group];
        drop(importer);

        assert_eq!(texts(&board).len(), 4);
        assert_eq!(board.group(group_item).unwrap().members.len(), 4);
    }

    #[test]
    fn direct_dimension_is_aligned_with_height() {
        let (board, diag) = load_dimension(dimension(json!({})));
        assert_eq!(diag.warning_count(), 0);
        let (_, d) = board.dimensions().next().unwrap();
        assert_eq!(d.kind, DimensionKind::Aligned);
        assert_eq!(d.start, Point::new(0, 0));
        assert_eq!(d.end, Point::new(10_000, 0));
        assert_eq!(d.height, -2000);
        assert_eq!(d.extension_offset, 50);
        assert_eq!(d.extension_height, 70);
        assert_eq!(d.line_thickness, 100);
        assert_eq!(d.units, DimensionUnits::Millimetres);
        assert_eq!(d.units_format, UnitsFormat::BareSuffix);
        assert!(d.suffix.is_empty());
        assert_eq!(d.precision, 2);
    }

    #[test]
    fn orthogonal_dimension_picks_direction_from_extension_start() {
        let (board, _) = load_dimension(dimension(json!({"subtype": "orthogonal"})));
        let (_, d) = board.dimensions().next().unwrap();
        assert_eq!(d.kind, DimensionKind::Orthogonal { horizontal: true });
        assert_eq!(d.height, -2000);
    }

    #[test]
    fn angled_and_external_dimensions_warn() {
        let mut dim = dimension(json!({"subtype": "angled"}));
        dim["line"]["style"] = json!("external");
        let (board, diag) = load_dimension(dim);
        assert!(diag.has_warning("angled"));
        assert!(diag.has_warning("external"));
        assert_eq!(board.dimensions().count(), 1);
    }

    #[test]
    fn prefix_and_design_units() {
        let archive = archive(json!({
            "technology": {"units": "thou", "unit_display_precision": 1},
            "layout": {"dimensions": {"D1": dimension(json!({
                "linear_units": "design",
                "text": {"text": "W=<@DISTANCE@> thou max", "text_code": "TC1"}
            }))}}
        }));
        let mut board = Board::new();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_dimensions().unwrap();
        drop(importer);

        let (_, d) = board.dimensions().next().unwrap();
        assert_eq!(d.units, DimensionUnits::Mils);
        assert_eq!(d.precision, 1);
        assert_eq!(d.prefix, "W=");
        assert_eq!(d.suffix, " thou max");
        assert_eq!(d.units_format, UnitsFormat::NoSuffix);
    }

    #[test]
    fn external_leader_follows_the_leader_angle() {
        let (board, _) = load_dimension(json!({
            "type": "leaderdim",
            "layer": "SLT",
            "text": {"text": "See <@NOTE@>", "text_code": "TC1"},
            "line": {
                "line_code": "LC1",
                "style": "external",
                "start": {"x": 0, "y": 0},
                "end": {"x": 100, "y": 100},
                "leader_angle": 45_000,
                "leader_line_length": 100,
                "leader_line_extension_length": 50
            }
        }));
        let (_, d) = board.dimensions().next().unwrap();
        assert_eq!(d.kind, DimensionKind::Leader);
        assert_eq!(d.start, Point::new(1000, -1000));
        assert_eq!(d.end, Point::new(1710, -1710));
        assert_eq!(d.text.position, Point::new(2210, -1710));
        assert_eq!(d.text.h_justify, HorizontalJustify::Right);
        assert_eq!(d.override_text.as_deref(), Some("See ${NOTE}"));
    }

    #[test]
    fn internal_leader_is_a_plain_aligned_dimension() {
        let mut dim = dimension(json!({"type": "leaderdim"}));
        dim["line"]["style"] = json!("internal");
        let (board, _) = load_dimension(dim);
        let (_, d) = board.dimensions().next().unwrap();
        assert_eq!(d.kind, DimensionKind::Aligned);
        assert_eq!(d.start, Point::new(0, -2000));
        assert_eq!(d.end, Point::new(10_000, -2000));
        assert_eq!((d.height, d.extension_offset, d.extension_height), (0, 0, 0));
    }

    #[test]
    fn angular_dimensions_are_skipped() {
        let (board, diag) = load_dimension(dimension(json!({"type": "angledim"})));
        assert_eq!(board.dimensions().count(), 0);
        assert!(diag.has_warning("angular"));
    }

    #[test]
    fn text_variables_come_from_header_and_first_variant() {
        let archive = archive(json!({
            "layout": {"variants": {
                "V1": {"name": "Master", "description": "Full build"},
                "V2": {"name": "Lite"}
            }}
        }));
        let mut board = Board::new();
        let mut project = Project::default();
        let mut importer = importer_with_stackup(&archive, &mut board);
        importer.load_text_variables(Some(&mut project));
        drop(importer);

        let vars = &project.text_vars;
        assert_eq!(vars["DESIGN_TITLE"], "Test board");
        assert_eq!(vars["VARIANT_NAME"], "Master");
        assert_eq!(vars["VARIANT_DESCRIPTION"], "Full build");
    }
}
