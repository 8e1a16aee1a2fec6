use garment_geometry::point_in_3d;
use garment_geometry::rotation::euler_to_matrix;
use garment_pattern::{Edge, Padding, Panel, Pattern, PatternSpec, Stitch, StitchSide};
use proptest::prelude::*;

fn rectangle(w: f64, h: f64, translation: [f64; 3], rotation: [f64; 3]) -> Panel {
    Panel {
        translation,
        rotation,
        vertices: vec![[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]],
        edges: (0..4).map(|i| Edge::straight(i, (i + 1) % 4)).collect(),
        ..Panel::default()
    }
}

fn pattern_of(panels: Vec<(String, Panel)>, stitches: Vec<Stitch>) -> Pattern {
    let mut spec = PatternSpec::default();
    spec.pattern.panels = panels.into_iter().collect();
    spec.pattern.stitches = stitches;
    Pattern::from_spec("prop", spec).unwrap()
}

fn world_points(panel: &Panel) -> Vec<[f64; 3]> {
    let rotation = euler_to_matrix(panel.rotation);
    panel
        .vertices
        .iter()
        .map(|v| point_in_3d(*v, &rotation, panel.translation))
        .collect()
}

fn side(panel: &str, edge: usize) -> StitchSide {
    StitchSide {
        panel: panel.to_string(),
        edge,
    }
}

fn placement() -> impl Strategy<Value = ([f64; 3], [f64; 3])> {
    (
        prop::array::uniform3(-100.0f64..100.0),
        prop::array::uniform3(-180.0f64..180.0),
    )
}

proptest! {
    #[test]
    fn panel_order_ignores_insertion_order(
        placements in prop::collection::vec(prop::array::uniform3(-60.0f64..60.0), 2..7),
        seed in any::<u64>(),
    ) {
        let panels: Vec<(String, Panel)> = placements
            .iter()
            .enumerate()
            .map(|(i, t)| (format!("p{i}"), rectangle(10.0, 20.0, *t, [0.0; 3])))
            .collect();
        let mut shuffled = panels.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        shuffled.reverse();

        let a = pattern_of(panels, vec![]).panel_order();
        let b = pattern_of(shuffled, vec![]).panel_order();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), len);
    }

    #[test]
    fn stitch_tag_is_side_symmetric(
        (t1, r1) in placement(),
        (t2, r2) in placement(),
        e1 in 0usize..4,
        e2 in 0usize..4,
    ) {
        let pattern = pattern_of(
            vec![
                ("a".to_string(), rectangle(30.0, 40.0, t1, r1)),
                ("b".to_string(), rectangle(25.0, 35.0, t2, r2)),
            ],
            vec![],
        );
        let forward = Stitch([side("a", e1), side("b", e2)]);
        let backward = Stitch([side("b", e2), side("a", e1)]);
        prop_assert_eq!(
            pattern.stitch_tag(&forward).unwrap(),
            pattern.stitch_tag(&backward).unwrap()
        );
    }

    #[test]
    fn panel_roundtrip_keeps_world_placement(
        w in 2.0f64..80.0,
        h in 2.0f64..80.0,
        (translation, rotation) in placement(),
        bend in (0.2f64..0.8, -0.3f64..0.3),
        pad_len in 4usize..9,
    ) {
        let mut panel = rectangle(w, h, translation, rotation);
        panel.edges[2].curvature = Some([bend.0, bend.1]);
        let before = world_points(&panel);
        let mut pattern = pattern_of(vec![("cloth".to_string(), panel)], vec![]);

        let numeric = pattern.panel_as_numeric("cloth", Some(pad_len)).unwrap();
        pattern
            .panel_from_numeric(
                "cloth",
                &numeric.edges,
                Some(numeric.rotation),
                Some(numeric.translation),
                Padding::ZEROS,
            )
            .unwrap();

        let decoded = pattern.panel("cloth").unwrap();
        prop_assert_eq!(decoded.edges.len(), 4);
        prop_assert_eq!(
            decoded.edges.iter().filter(|e| e.curvature == Some([bend.0, bend.1])).count(),
            1
        );
        let after = world_points(decoded);
        prop_assert_eq!(after.len(), before.len());
        for p in &after {
            prop_assert!(
                before.iter().any(|q| (0..3).all(|k| (p[k] - q[k]).abs() < 1e-6)),
                "{:?} not in {:?}", p, before
            );
        }
    }
}
