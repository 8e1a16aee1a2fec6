//! Panel self-intersection check on a straight-segment approximation.
//!
//! Curved edges are replaced by two segments through their control point,
//! so strongly curved edges may report false positives.

use garment_geometry::{control_to_absolute, first_intersection, Segment};
use tracing::debug;

use crate::error::PatternError;
use crate::pattern::Pattern;
use crate::spec::Panel;

/// Segments approximating the panel outline.
pub fn panel_segments(panel: &Panel) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(panel.edges.len() * 2);
    for (idx, edge) in panel.edges.iter().enumerate() {
        let Some((start, end)) = panel.edge_coords(idx) else {
            continue;
        };
        match edge.curvature {
            Some(relative) => {
                let control = control_to_absolute(start, end, relative);
                segments.push([start, control]);
                segments.push([control, end]);
            }
            None => segments.push([start, end]),
        }
    }
    segments
}

impl Pattern {
    pub fn is_self_intersecting(&self) -> bool {
        self.spec
            .pattern
            .panels
            .iter()
            .any(|(name, panel)| panel_intersects(name, panel))
    }

    pub fn is_panel_self_intersecting(&self, name: &str) -> Result<bool, PatternError> {
        Ok(panel_intersects(name, self.panel(name)?))
    }
}

fn panel_intersects(name: &str, panel: &Panel) -> bool {
    match first_intersection(&panel_segments(panel)) {
        Some((a, b)) => {
            debug!(panel = name, a, b, "segments intersect");
            true
        }
        None => false,
    }
}
