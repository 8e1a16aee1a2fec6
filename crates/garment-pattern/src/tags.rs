//! Stitch tags: approximate 3D identifiers of stitches.
//!
//! A tag is the mean of the world-space mid-points of the two stitched
//! edges, roughly where the seam lands when the garment is placed around
//! the body. It depends only on edge geometry, not on local panel origins,
//! edge order or side order, so it is usable as a soft regression target.

use garment_geometry::point_in_3d;
use garment_geometry::rotation::euler_to_matrix;

use crate::error::PatternError;
use crate::pattern::Pattern;
use crate::spec::{Stitch, StitchSide};

impl Pattern {
    /// One tag per stitch, in stitch order.
    pub fn stitches_as_tags(&self) -> Result<Vec<[f64; 3]>, PatternError> {
        self.spec
            .pattern
            .stitches
            .iter()
            .map(|stitch| self.stitch_tag(stitch))
            .collect()
    }

    pub fn stitch_tag(&self, stitch: &Stitch) -> Result<[f64; 3], PatternError> {
        let [a, b] = &stitch.0;
        let a = self.edge_midpoint_3d(a)?;
        let b = self.edge_midpoint_3d(b)?;
        Ok([
            (a[0] + b[0]) / 2.0,
            (a[1] + b[1]) / 2.0,
            (a[2] + b[2]) / 2.0,
        ])
    }

    fn edge_midpoint_3d(&self, side: &StitchSide) -> Result<[f64; 3], PatternError> {
        let panel = self.panel(&side.panel)?;
        let (start, end) = panel
            .edge_coords(side.edge)
            .ok_or_else(|| PatternError::EdgeOutOfRange {
                panel: side.panel.clone(),
                edge: side.edge,
            })?;
        let mid = [(start[0] + end[0]) / 2.0, (start[1] + end[1]) / 2.0];
        Ok(point_in_3d(
            mid,
            &euler_to_matrix(panel.rotation),
            panel.translation,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::spec::{Stitch, StitchSide};
    use crate::Pattern;
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    fn two_panels() -> Pattern {
        let doc = json!({
            "pattern": {
                "panels": {
                    "front": {
                        "translation": [0, 0, 10],
                        "rotation": [0, 0, 0],
                        "vertices": [[0, 0], [20, 0], [20, 30], [0, 30]],
                        "edges": [
                            {"endpoints": [0, 1]},
                            {"endpoints": [1, 2]},
                            {"endpoints": [2, 3]},
                            {"endpoints": [3, 0]}
                        ]
                    },
                    "back": {
                        "translation": [20, 0, -10],
                        "rotation": [0, 180, 0],
                        "vertices": [[0, 0], [20, 0], [20, 30], [0, 30]],
                        "edges": [
                            {"endpoints": [0, 1]},
                            {"endpoints": [1, 2]},
                            {"endpoints": [2, 3]},
                            {"endpoints": [3, 0]}
                        ]
                    }
                },
                "stitches": [
                    [{"panel": "front", "edge": 1}, {"panel": "back", "edge": 3}]
                ]
            },
            "properties": {"curvature_coords": "relative", "units_in_meter": 100}
        });
        Pattern::from_json_str("tags", &doc.to_string()).unwrap()
    }

    #[test]
    fn tag_is_mean_of_world_midpoints() {
        let pattern = two_panels();
        let tags = pattern.stitches_as_tags().unwrap();
        assert_eq!(tags.len(), 1);
        // front right side mid (20, 15, 10); back left side mid maps to (20, 15, -10)
        assert_abs_diff_eq!(tags[0][0], 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tags[0][1], 15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tags[0][2], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn side_order_does_not_matter() {
        let pattern = two_panels();
        let forward = pattern.spec().pattern.stitches[0].clone();
        let [a, b] = forward.0.clone();
        let swapped = Stitch([b, a]);
        assert_eq!(
            pattern.stitch_tag(&forward).unwrap(),
            pattern.stitch_tag(&swapped).unwrap()
        );
    }

    #[test]
    fn dangling_side_is_an_error() {
        let pattern = two_panels();
        let stitch = Stitch([
            StitchSide {
                panel: "front".to_string(),
                edge: 9,
            },
            StitchSide {
                panel: "back".to_string(),
                edge: 0,
            },
        ]);
        assert!(pattern.stitch_tag(&stitch).is_err());
    }
}
