use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use garment_pattern::{ParamValue, Pattern, PatternError, MAX_ATTEMPTS};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

fn skirt() -> Pattern {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/skirt_2_panels.json");
    Pattern::from_file(path).unwrap()
}

fn one_edge_length(direction: &str) -> Pattern {
    let doc = json!({
        "pattern": {
            "panels": {
                "strip": {
                    "translation": [0, 0, 0],
                    "rotation": [0, 0, 0],
                    "vertices": [[0, 0], [10, 0], [10, 3], [0, 3]],
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
        "parameters": {
            "len": {
                "type": "length",
                "value": 1.0,
                "range": [0.5, 2.0],
                "influence": [
                    {"panel": "strip", "edge_list": [{"id": 0, "direction": direction}]}
                ]
            }
        },
        "parameter_order": ["len"],
        "properties": {"curvature_coords": "relative", "units_in_meter": 100}
    });
    Pattern::from_json_str("strip", &doc.to_string()).unwrap()
}

fn all_vertices(pattern: &Pattern) -> Vec<[f64; 2]> {
    pattern
        .spec()
        .pattern
        .panels
        .values()
        .flat_map(|p| p.vertices.iter().copied())
        .collect()
}

fn assert_vertices_close(a: &[[f64; 2]], b: &[[f64; 2]], eps: f64) {
    assert_eq!(a.len(), b.len());
    for (p, q) in a.iter().zip(b) {
        assert_abs_diff_eq!(p[0], q[0], epsilon = eps);
        assert_abs_diff_eq!(p[1], q[1], epsilon = eps);
    }
}

#[test]
fn length_parameter_doubles_edge_holding_its_end() {
    let mut pattern = one_edge_length("start");
    pattern.apply_param_list(&[2.0]).unwrap();

    let panel = pattern.panel("strip").unwrap();
    assert_abs_diff_eq!(panel.edge_length(0).unwrap(), 20.0, epsilon = 1e-9);
    assert_eq!(panel.vertices[1], [10.0, 0.0]);

    // reverting scales by the multiplicative inverse
    pattern.restore_template(true).unwrap();
    let panel = pattern.panel("strip").unwrap();
    assert_eq!(panel.vertices[1], [10.0, 0.0]);
    assert_abs_diff_eq!(panel.edge_length(0).unwrap(), 10.0, epsilon = 1e-6);
}

#[test]
fn reapplying_starts_from_the_template() {
    let mut pattern = one_edge_length("end");
    pattern.apply_param_list(&[2.0]).unwrap();
    pattern.apply_param_list(&[1.5]).unwrap();
    let panel = pattern.panel("strip").unwrap();
    assert_abs_diff_eq!(panel.edge_length(0).unwrap(), 15.0, epsilon = 1e-9);
    assert_eq!(panel.vertices[0], [0.0, 0.0]);
}

#[test]
fn fixture_values_list_follows_parameter_order() {
    let pattern = skirt();
    assert_eq!(pattern.param_values_list().unwrap(), vec![1.0, 0.0, 1.0]);
}

#[test]
fn fixture_apply_and_restore_is_lossless() {
    let mut pattern = skirt();
    let template = all_vertices(&pattern);

    pattern.apply_param_list(&[1.3, 4.0, 1.8]).unwrap();
    assert_eq!(pattern.param_values_list().unwrap(), vec![1.3, 4.0, 1.8]);

    // the waist constraint equalizes front and back waist lengths
    let front = pattern.panel("front").unwrap().edge_length(2).unwrap();
    let back = pattern.panel("back").unwrap().edge_length(2).unwrap();
    assert_abs_diff_eq!(front, 31.0, epsilon = 1e-9);
    assert_abs_diff_eq!(back, 31.0, epsilon = 1e-9);

    // additive hem growth on both ends
    let hem = pattern.panel("front").unwrap().edge_length(0).unwrap();
    assert!(hem > 40.0 + 2.0 * 4.0);

    let curve = pattern.panel("front").unwrap().edges[0].curvature.unwrap();
    assert_abs_diff_eq!(curve[1], -0.05 * 1.8, epsilon = 1e-12);

    pattern.restore_template(true).unwrap();
    assert_vertices_close(&all_vertices(&pattern), &template, 1e-6);
    assert_eq!(pattern.param_values_list().unwrap(), vec![1.0, 0.0, 1.0]);
}

#[test]
fn constraint_inversion_restores_lengths() {
    let mut pattern = skirt();
    pattern.apply_param_list(&[1.0, 0.0, 1.0]).unwrap();
    let back = pattern.panel("back").unwrap().edge_length(2).unwrap();
    assert_abs_diff_eq!(back, 31.0, epsilon = 1e-9);

    pattern.restore_template(false).unwrap();
    let back = pattern.panel("back").unwrap().edge_length(2).unwrap();
    let front = pattern.panel("front").unwrap().edge_length(2).unwrap();
    assert_abs_diff_eq!(back, 32.0, epsilon = 1e-6);
    assert_abs_diff_eq!(front, 30.0, epsilon = 1e-6);
}

#[test]
fn wrong_value_count_is_rejected_without_changes() {
    let mut pattern = skirt();
    let before = pattern.clone();
    let err = pattern.apply_param_list(&[1.0, 2.0]).unwrap_err();
    assert!(matches!(
        err,
        PatternError::ValueCountMismatch {
            expected: 3,
            got: 2
        }
    ));
    assert_eq!(pattern, before);
}

#[test]
fn zero_multiplicative_value_cannot_be_reverted() {
    let mut pattern = one_edge_length("start");
    pattern.apply_param_list(&[0.0]).unwrap();
    let collapsed = pattern.clone();

    let err = pattern.restore_template(true).unwrap_err();
    assert!(matches!(err, PatternError::ZeroInversion { .. }));
    assert_eq!(pattern, collapsed);
}

#[test]
fn randomization_is_reproducible_and_in_range() {
    let mut a = skirt();
    let mut b = skirt();
    let outcome_a = a.randomize(&mut StdRng::seed_from_u64(42)).unwrap();
    let outcome_b = b.randomize(&mut StdRng::seed_from_u64(42)).unwrap();

    assert_eq!(outcome_a, outcome_b);
    assert_eq!(a, b);
    assert!(!outcome_a.self_intersecting);
    assert!(outcome_a.attempts <= MAX_ATTEMPTS);
    assert!(!a.is_self_intersecting());

    let values = a.param_values_list().unwrap();
    assert!((0.7..=1.5).contains(&values[0]));
    assert!((-5.0..=10.0).contains(&values[1]));
    assert!(values[1].abs() >= 0.01);
    assert!((0.5..=2.0).contains(&values[2]));

    // a randomized pattern still reverts to the template
    let template = all_vertices(&skirt());
    a.restore_template(true).unwrap();
    assert_vertices_close(&all_vertices(&a), &template, 1e-6);
}

#[test]
fn randomization_replaces_previous_values() {
    let mut pattern = skirt();
    let mut rng = StdRng::seed_from_u64(7);
    pattern.randomize(&mut rng).unwrap();
    let first = pattern.param_values_list().unwrap();
    pattern.randomize(&mut rng).unwrap();
    let second = pattern.param_values_list().unwrap();
    assert_ne!(first, second);

    let template = all_vertices(&skirt());
    pattern.restore_template(true).unwrap();
    assert_vertices_close(&all_vertices(&pattern), &template, 1e-6);
}

#[test]
fn curve_parameter_on_straight_edge_fails() {
    let mut pattern = skirt();
    pattern.apply_param_list(&[1.0, 0.0, 1.0]).unwrap();
    let doc = serde_json::to_string(pattern.spec()).unwrap();
    let broken = doc.replace(
        r#""edge_list":[{"id":0}]"#,
        r#""edge_list":[{"id":1}]"#,
    );
    let mut pattern = Pattern::from_json_str("broken", &broken).unwrap();
    let err = pattern.apply_param_list(&[1.0, 0.0, 1.2]).unwrap_err();
    assert!(matches!(err, PatternError::MissingCurvature { edge: 1, .. }));
    assert!(matches!(
        pattern.spec().parameters["hem_curve"].value,
        Some(ParamValue::Scalar(v)) if v == 1.0
    ));
}
