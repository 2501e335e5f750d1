//! Fixtures shared by the engine's unit tests.

use serde_json::{json, Value};

use crate::archive::Archive;
use crate::board::Board;

use super::{layers, ImportOptions, Importer};

/// Two copper layers with silkscreen and mask on both sides, one code of
/// each kind and a design centred on the origin at ten nanometres per unit.
fn base() -> Value {
    json!({
        "header": {"job_title": "Test board"},
        "technology": {
            "design_area": [{"x": -100_000, "y": -100_000}, {"x": 100_000, "y": 100_000}],
            "design_limit": {"x": 200_000, "y": 200_000},
            "min_route_width": 1000,
            "max_physical_layer": 2
        },
        "layers": {
            "SLT": {"name": "Silk Top", "type": "nonelec", "subtype": "silkscreen"},
            "SMT": {"name": "Mask Top", "type": "nonelec", "subtype": "solderresist"},
            "TOP": {"name": "Top", "type": "elec", "physical_layer": 1},
            "DIE": {"name": "Core", "type": "construction", "thickness": 1000},
            "BOT": {"name": "Bottom", "type": "elec", "physical_layer": 2},
            "SMB": {"name": "Mask Bottom", "type": "nonelec", "subtype": "solderresist"},
            "DOC": {"name": "All Doc", "type": "alldoc"},
            "ELEC": {"name": "All Elec", "type": "allelec"}
        },
        "layer_stack": ["SLT", "SMT", "TOP", "DIE", "BOT", "SMB"],
        "codes": {
            "line_codes": {"LC1": {"name": "Thin", "width": 10}},
            "copper_codes": {"CC1": {"name": "Copper", "copper_width": 10}},
            "pad_codes": {"PC1": {"name": "Round", "shape": {"type": "circle", "size": 100}}},
            "via_codes": {
                "VC1": {"name": "Via", "shape": {"type": "circle", "size": 60}, "drill_diameter": 30}
            },
            "route_codes": {"RC1": {"name": "Signal", "optimal_width": 20}},
            "text_codes": {"TC1": {"name": "Text", "line_width": 2, "height": 100, "width": 80}},
            "hatch_codes": {"HC1": {"name": "Hatch", "hatches": [
                {"line_width": 5, "step": 50, "orient_angle": 45_000},
                {"line_width": 5, "step": 50, "orient_angle": 135_000}
            ]}},
            "spacing_codes": {"T_T": 20, "C_B": 50},
            "layer_pairs": {
                "LP1": {"name": "Through", "physical_layer_start": 1, "physical_layer_end": 2}
            }
        }
    })
}

fn merge(target: &mut Value, overrides: Value) {
    match (target, overrides) {
        (Value::Object(target), Value::Object(overrides)) => {
            for (key, value) in overrides {
                merge(target.entry(key).or_insert(Value::Null), value);
            }
        }
        (target, value) => *target = value,
    }
}

/// The base archive with `overrides` merged in, objects key by key.
pub(crate) fn archive(overrides: Value) -> Archive {
    let mut value = base();
    merge(&mut value, overrides);
    serde_json::from_value(value).unwrap()
}

/// An importer whose stackup and layer map are already loaded.
pub(crate) fn importer_with_stackup<'a>(
    archive: &'a Archive,
    board: &'a mut Board,
) -> Importer<'a> {
    let mut importer = Importer::new(archive, board, ImportOptions::default());
    importer.layers = layers::load_stackup(
        archive,
        importer.board,
        importer.shapes.units(),
        &mut importer.diag,
        true,
    )
    .unwrap();
    importer
}
