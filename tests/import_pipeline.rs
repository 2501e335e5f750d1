//! End-to-end import tests.
//!
//! These tests drive the public API with a small but complete archive: one
//! resistor, a ground net with a via and a route, a poured ground template,
//! a board outline and a figure on a layer with no obvious host equivalent.

use cadstar_pcb_import::archive::Archive;
use cadstar_pcb_import::board::{Board, PcbLayer, Project, ViaType};
use cadstar_pcb_import::config::Config;
use cadstar_pcb_import::import::{
    import_archive, AcceptDefaults, ImportError, ImportOptions, UnresolvedLayer,
};
use indexmap::IndexMap;
use serde_json::{json, Value};
use tempfile::tempdir;

fn square(kind: &str, half: i64) -> Value {
    json!({
        "type": kind,
        "vertices": [
            {"type": "point", "end": {"x": -half, "y": -half}},
            {"type": "point", "end": {"x": half, "y": -half}},
            {"type": "point", "end": {"x": half, "y": half}},
            {"type": "point", "end": {"x": -half, "y": half}},
            {"type": "point", "end": {"x": -half, "y": -half}}
        ]
    })
}

fn design() -> Value {
    json!({
        "header": {"job_title": "Pipeline board"},
        "technology": {
            "design_area": [{"x": -100_000, "y": -100_000}, {"x": 100_000, "y": 100_000}],
            "design_limit": {"x": 200_000, "y": 200_000},
            "max_physical_layer": 2
        },
        "layers": {
            "NTS": {"name": "Notes", "type": "nonelec"},
            "SLT": {"name": "Silk Top", "type": "nonelec", "subtype": "silkscreen"},
            "TOP": {"name": "Top", "type": "elec", "physical_layer": 1},
            "DIE": {"name": "Core", "type": "construction", "thickness": 1000},
            "BOT": {"name": "Bottom", "type": "elec", "physical_layer": 2}
        },
        "layer_stack": ["NTS", "SLT", "TOP", "DIE", "BOT"],
        "codes": {
            "line_codes": {"LC1": {"name": "Thin", "width": 10}},
            "copper_codes": {"CC1": {"name": "Copper", "copper_width": 10}},
            "pad_codes": {"PC1": {"name": "Round", "shape": {"type": "circle", "size": 100}}},
            "via_codes": {
                "VC1": {"name": "Via", "shape": {"type": "circle", "size": 60}, "drill_diameter": 30}
            },
            "route_codes": {"RC1": {"name": "Signal", "optimal_width": 20}},
            "layer_pairs": {
                "LP1": {"name": "Through", "physical_layer_start": 1, "physical_layer_end": 2}
            }
        },
        "library": {
            "SD1": {
                "reference_name": "R0603",
                "pads": {
                    "1": {"pad_code": "PC1", "position": {"x": -100, "y": 0}, "side": "top"},
                    "2": {"pad_code": "PC1", "position": {"x": 100, "y": 0}, "side": "top"}
                }
            }
        },
        "layout": {
            "boards": {"B1": {"line_code": "LC1", "shape": square("outline", 50_000)}},
            "figures": {"F1": {"layer": "NTS", "line_code": "LC1", "shape": square("outline", 1000)}},
            "components": {
                "CP1": {"name": "R1", "symdef": "SD1", "origin": {"x": 0, "y": 0}}
            },
            "templates": {
                "T1": {
                    "name": "GND pour",
                    "net": "N1",
                    "layer": "BOT",
                    "line_code": "LC1",
                    "shape": square("solid", 40_000),
                    "pouring": {"copper_code": "CC1", "relief_copper_code": "CC1"}
                }
            },
            "coppers": {
                "CU1": {
                    "copper_code": "CC1",
                    "layer": "BOT",
                    "net": "N1",
                    "poured_template": "T1",
                    "shape": square("solid", 30_000)
                }
            },
            "nets": {
                "N1": {
                    "name": "GND",
                    "route_code": "RC1",
                    "pins": {"P1": {"component": "CP1", "pad": 1}},
                    "vias": {
                        "V1": {"via_code": "VC1", "layer_pair": "LP1", "location": {"x": -10_000, "y": 0}}
                    },
                    "connections": [{"start_node": "V1", "end_node": "P1", "route": {
                        "layer": "TOP",
                        "start_point": {"x": -10_000, "y": 0},
                        "vertices": [
                            {"route_width": 20, "vertex": {"type": "point", "end": {"x": -100, "y": 0}}}
                        ]
                    }}]
                }
            }
        }
    })
}

fn parse(value: Value) -> Archive {
    serde_json::from_value(value).expect("fixture is a valid archive")
}

#[test]
fn complete_design_imports() {
    let archive = parse(design());
    let mut board = Board::new();
    let mut project = Project::default();
    let report = import_archive(
        &archive,
        &mut board,
        Some(&mut project),
        &mut AcceptDefaults,
        ImportOptions::default(),
    )
    .expect("import succeeds");

    assert_eq!(board.copper_layer_count(), 2);
    assert_eq!(board.footprints().count(), 1);
    assert!(report.library.contains_key("R0603"));
    assert_eq!(
        project.text_vars.get("DESIGN_TITLE").map(String::as_str),
        Some("Pipeline board")
    );

    let gnd = board.net_by_name("GND").expect("net created").code;
    let (_, footprint) = board.footprints().next().unwrap();
    assert_eq!(footprint.pads[0].net, Some(gnd));

    let vias: Vec<_> = board.vias().map(|(_, v)| v).collect();
    assert_eq!(vias.len(), 1);
    assert_eq!(vias[0].via_type, ViaType::Through);
    assert_eq!(vias[0].net, Some(gnd));

    assert!(board.tracks().count() > 0);
    assert!(board
        .tracks()
        .all(|(_, t)| t.layer == PcbLayer::FrontCopper && t.net == Some(gnd)));

    let zones: Vec<_> = board.zones().map(|(_, z)| z).collect();
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].name, "GND pour");
    assert_eq!(zones[0].net, Some(gnd));
    assert!(zones[0].layers.contains(PcbLayer::BackCopper));
    assert!(zones[0].fill.as_ref().is_some_and(|f| f.area() > 0.0));

    assert!(board.graphics().any(|(_, g)| g.layer == PcbLayer::EdgeCuts));
}

#[test]
fn uncertain_layer_keeps_default_and_warns() {
    let archive = parse(design());
    let mut board = Board::new();
    let report = import_archive(
        &archive,
        &mut board,
        None,
        &mut AcceptDefaults,
        ImportOptions::default(),
    )
    .unwrap();

    assert!(report.diagnostics.has_warning("Notes"));
    assert!(board.graphics().any(|(_, g)| g.layer == PcbLayer::Eco1));
}

#[test]
fn layer_warnings_can_be_silenced() {
    let archive = parse(design());
    let mut board = Board::new();
    let options = ImportOptions {
        log_layer_warnings: false,
        ..ImportOptions::default()
    };
    let report = import_archive(&archive, &mut board, None, &mut AcceptDefaults, options).unwrap();
    assert!(!report.diagnostics.has_warning("'Notes'"));
}

#[test]
fn closure_resolver_moves_uncertain_layer() {
    let archive = parse(design());
    let mut board = Board::new();
    let mut offered = Vec::new();
    let mut resolver = |layers: &[UnresolvedLayer]| {
        offered.extend(layers.iter().map(|l| l.name.clone()));
        layers
            .iter()
            .map(|l| (l.name.clone(), PcbLayer::Comments))
            .collect::<IndexMap<_, _>>()
    };
    import_archive(
        &archive,
        &mut board,
        None,
        &mut resolver,
        ImportOptions::default(),
    )
    .unwrap();

    assert_eq!(offered, vec!["Notes".to_string()]);
    assert!(board.graphics().any(|(_, g)| g.layer == PcbLayer::Comments));
    assert!(!board.graphics().any(|(_, g)| g.layer == PcbLayer::Eco1));
}

#[test]
fn configured_overrides_resolve_layers() {
    let config: Config = serde_json::from_value(json!({
        "import": {"layer_overrides": {"Notes": "User.3"}}
    }))
    .unwrap();
    config.validate().unwrap();

    let archive = parse(design());
    let mut board = Board::new();
    let mut resolver = config.import.layer_resolver();
    import_archive(
        &archive,
        &mut board,
        None,
        &mut resolver,
        config.import.options(),
    )
    .unwrap();

    assert!(board.graphics().any(|(_, g)| g.layer == PcbLayer::User(3)));
}

#[test]
fn archive_is_read_from_disk() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("design.json");
    std::fs::write(&path, design().to_string()).unwrap();

    let archive = Archive::read(&path).expect("archive parses");
    assert_eq!(archive.header.job_title, "Pipeline board");
    assert_eq!(archive.layout.components.len(), 1);
}

#[test]
fn unreadable_or_malformed_archive_is_fatal() {
    let dir = tempdir().expect("Failed to create temp dir");

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        Archive::read(&missing),
        Err(ImportError::ArchiveRead { .. })
    ));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, r#"{"technology": 3}"#).unwrap();
    assert!(matches!(
        Archive::read(&broken),
        Err(ImportError::ArchiveParse { .. })
    ));
}

#[test]
fn oversized_design_is_rejected_before_anything_is_added() {
    let mut value = design();
    value["technology"]["design_limit"] = json!({"x": 300_000_000, "y": 1000});
    let archive = parse(value);
    let mut board = Board::new();
    let err = import_archive(
        &archive,
        &mut board,
        None,
        &mut AcceptDefaults,
        ImportOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, ImportError::DesignTooLarge { .. }));
    assert!(err.to_string().contains("too large"));
    assert_eq!(board.item_count(), 0);
}

#[test]
fn dangling_pin_component_is_fatal() {
    let mut value = design();
    value["layout"]["nets"]["N1"]["pins"]["P1"]["component"] = json!("CP9");
    let archive = parse(value);
    let mut board = Board::new();
    let err = import_archive(
        &archive,
        &mut board,
        None,
        &mut AcceptDefaults,
        ImportOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ImportError::MissingReference { .. }));
}

#[test]
fn report_lists_library_footprints_and_warnings() {
    let archive = parse(design());
    let mut board = Board::new();
    let report = import_archive(
        &archive,
        &mut board,
        None,
        &mut AcceptDefaults,
        ImportOptions::default(),
    )
    .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["library"]["R0603"]["pads"].is_array());
    assert_eq!(json["library"]["R0603"]["pads"].as_array().map(Vec::len), Some(2));
    assert!(report.diagnostics.has_warning("no project"));
}
