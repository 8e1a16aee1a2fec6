use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use garment_geometry::point_in_3d;
use garment_geometry::rotation::euler_to_matrix;
use garment_pattern::{
    loop_residual, Padding, Pattern, PatternError, RotationFormat, TensorOptions,
};
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn square_pattern() -> Pattern {
    let doc = json!({
        "pattern": {
            "panels": {
                "square": {
                    "translation": [0, 0, 0],
                    "rotation": [0, 0, 0],
                    "vertices": [[0, 0], [10, 0], [10, 10], [0, 10]],
                    "edges": [
                        {"endpoints": [0, 1]},
                        {"endpoints": [1, 2]},
                        {"endpoints": [2, 3]},
                        {"endpoints": [3, 0]}
                    ]
                }
            },
            "stitches": []
        },
        "parameters": {},
        "parameter_order": [],
        "properties": {"curvature_coords": "relative", "units_in_meter": 100}
    });
    Pattern::from_json_str("square", &doc.to_string()).unwrap()
}

/// World positions of all panel vertices, sorted for order-free comparison.
fn world_outline(pattern: &Pattern, panel: &str) -> Vec<[f64; 3]> {
    let panel = pattern.panel(panel).unwrap();
    let rotation = euler_to_matrix(panel.rotation);
    let mut points: Vec<[f64; 3]> = panel
        .vertices
        .iter()
        .map(|v| point_in_3d(*v, &rotation, panel.translation))
        .collect();
    points.sort_by(|a, b| {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x * 1e6).round().total_cmp(&(y * 1e6).round()))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    points
}

fn assert_outlines_match(a: &[[f64; 3]], b: &[[f64; 3]]) {
    assert_eq!(a.len(), b.len());
    for (p, q) in a.iter().zip(b) {
        for k in 0..3 {
            assert_abs_diff_eq!(p[k], q[k], epsilon = 1e-6);
        }
    }
}

#[test]
fn square_encodes_to_closed_loop() {
    let pattern = square_pattern();
    let numeric = pattern.panel_as_numeric("square", Some(4)).unwrap();

    assert_eq!(numeric.edges.len(), 4);
    assert!(numeric.edges.iter().all(|e| e[2] == 0.0 && e[3] == 0.0));
    assert_eq!(loop_residual(&numeric.edges, Padding::Unpadded), [0.0, 0.0]);
}

#[test]
fn square_decodes_to_same_vertices() {
    let mut pattern = square_pattern();
    let before = world_outline(&pattern, "square");
    let numeric = pattern.panel_as_numeric("square", Some(4)).unwrap();

    pattern
        .panel_from_numeric(
            "square",
            &numeric.edges,
            Some(numeric.rotation),
            Some(numeric.translation),
            Padding::ZEROS,
        )
        .unwrap();

    let panel = pattern.panel("square").unwrap();
    assert_eq!(panel.vertices.len(), 4);
    assert_eq!(panel.edges.len(), 4);
    assert_outlines_match(&world_outline(&pattern, "square"), &before);
}

#[test]
fn tensor_roundtrip_keeps_world_geometry() {
    let template = Pattern::from_file(fixture("skirt_2_panels.json")).unwrap();
    for format in [RotationFormat::Euler, RotationFormat::TwoColumn] {
        let tensors = template
            .pattern_as_tensors(TensorOptions {
                pad_to_len: Some(6),
                with_placement: true,
                rotation_format: format,
                with_stitches: true,
                with_stitch_tags: true,
            })
            .unwrap();
        assert_eq!(tensors.pad_len(), 6);
        assert_eq!(tensors.panel_count(), 2);

        let mut decoded = template.clone();
        decoded.pattern_from_tensors(&tensors, Padding::ZEROS).unwrap();

        for (idx, original) in tensors.panel_order.iter().enumerate() {
            let name = format!("panel_{idx}");
            assert_outlines_match(
                &world_outline(&decoded, &name),
                &world_outline(&template, original),
            );
        }

        // stitches reference the same world edges as before
        let mut before = template.stitches_as_tags().unwrap();
        let mut after = decoded.stitches_as_tags().unwrap();
        before.sort_by(|a, b| a[1].total_cmp(&b[1]).then(a[0].total_cmp(&b[0])));
        after.sort_by(|a, b| a[1].total_cmp(&b[1]).then(a[0].total_cmp(&b[0])));
        for (a, b) in after.iter().zip(&before) {
            for k in 0..3 {
                assert_abs_diff_eq!(a[k], b[k], epsilon = 1e-6);
            }
        }
    }
}

#[test]
fn stitched_edges_carry_their_tag() {
    let pattern = Pattern::from_file(fixture("skirt_2_panels.json")).unwrap();
    let tensors = pattern
        .pattern_as_tensors(TensorOptions {
            with_stitches: true,
            with_stitch_tags: true,
            ..TensorOptions::default()
        })
        .unwrap();
    let tags = pattern.stitches_as_tags().unwrap();
    let [first, second] = tensors.stitches.as_ref().unwrap();
    let per_edge = tensors.stitch_tags.as_ref().unwrap();
    let pad_len = tensors.pad_len();

    for (idx, tag) in tags.iter().enumerate() {
        for flat in [first[idx], second[idx]] {
            assert_eq!(&per_edge[flat / pad_len][flat % pad_len], tag);
        }
    }
    // hems and waists are free
    let free = per_edge
        .iter()
        .flatten()
        .filter(|t| **t == [0.0; 3])
        .count();
    assert_eq!(free, 4);
}

#[test]
fn fixture_stitch_tag_sits_on_the_side_seam() {
    let pattern = Pattern::from_file(fixture("skirt_2_panels.json")).unwrap();
    let tag = pattern.stitches_as_tags().unwrap()[0];
    assert_abs_diff_eq!(tag[0], 17.75, epsilon = 1e-9);
    assert_abs_diff_eq!(tag[1], 65.0, epsilon = 1e-9);
    assert_abs_diff_eq!(tag[2], 0.0, epsilon = 1e-9);
}

#[test]
fn decoding_invalidates_parameter_values() {
    let mut pattern = Pattern::from_file(fixture("skirt_2_panels.json")).unwrap();
    let tensors = pattern
        .pattern_as_tensors(TensorOptions::default())
        .unwrap();
    pattern
        .pattern_from_tensors(&tensors, Padding::ZEROS)
        .unwrap();

    assert!(pattern.spec().parameters.values().all(|p| p.value.is_none()));
    assert!(pattern.spec().pattern.stitches.is_empty());
    assert!(pattern.param_values_list().is_err());
}

#[test]
fn short_pad_length_is_a_capacity_error() {
    let pattern = Pattern::from_file(fixture("skirt_2_panels.json")).unwrap();
    let err = pattern
        .pattern_as_tensors(TensorOptions {
            pad_to_len: Some(3),
            ..TensorOptions::default()
        })
        .unwrap_err();
    assert!(matches!(err, PatternError::PanelTooLong { edges: 4, pad_len: 3, .. }));
}
