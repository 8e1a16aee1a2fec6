//! Canonical panel order for tensor layout.
//!
//! Panels are sorted by a stable 3D landmark: left to right (X), then bottom
//! to top (Y), then back to front (Z). Coordinates closer than the
//! tolerance count as equal and defer to the next axis.

use std::cmp::Ordering;
use std::collections::HashMap;

use garment_geometry::point_in_3d;
use garment_geometry::rotation::euler_to_matrix;

use crate::error::PatternError;
use crate::pattern::Pattern;
use crate::spec::Panel;

/// Default fuzzy-equality tolerance in centimeters.
pub const ORDER_TOLERANCE: f64 = 5.0;

impl Pattern {
    pub fn panel_order(&self) -> Vec<String> {
        self.panel_order_with_tolerance(ORDER_TOLERANCE)
    }

    pub fn panel_order_with_tolerance(&self, tolerance: f64) -> Vec<String> {
        let locations: HashMap<&str, [f64; 3]> = self
            .spec
            .pattern
            .panels
            .iter()
            .map(|(name, panel)| (name.as_str(), universal_translation(panel)))
            .collect();
        let names: Vec<&str> = locations.keys().copied().collect();

        order_by_axis(names, &locations, 0, tolerance)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// World location of the highest mid-point of the panel's bounding box sides.
    pub fn panel_universal_translation(&self, name: &str) -> Result<[f64; 3], PatternError> {
        Ok(universal_translation(self.panel(name)?))
    }
}

/// Among the mid-points of the four sides of the panel's 2D bounding box,
/// the one that ends up highest (world Y). Independent of where the panel's
/// local origin sits.
pub fn universal_translation(panel: &Panel) -> [f64; 3] {
    let Some((low, high)) = panel.bounds() else {
        return panel.translation;
    };
    let mid_x = (low[0] + high[0]) / 2.0;
    let mid_y = (low[1] + high[1]) / 2.0;
    let rotation = euler_to_matrix(panel.rotation);

    [
        [mid_x, high[1]],
        [mid_x, low[1]],
        [high[0], mid_y],
        [low[0], mid_y],
    ]
    .into_iter()
    .map(|p| point_in_3d(p, &rotation, panel.translation))
    .fold(None, |best: Option<[f64; 3]>, p| match best {
        Some(b) if b[1] >= p[1] => Some(b),
        _ => Some(p),
    })
    .unwrap_or(panel.translation)
}

fn order_by_axis<'a>(
    mut names: Vec<&'a str>,
    locations: &HashMap<&'a str, [f64; 3]>,
    axis: usize,
    tolerance: f64,
) -> Vec<&'a str> {
    let coord = |name: &str| locations[name][axis];
    names.sort_by(|a, b| match coord(a).total_cmp(&coord(b)) {
        Ordering::Equal => a.cmp(b),
        other => other,
    });

    if axis + 1 >= 3 {
        return names;
    }

    // re-sort runs of fuzzy-equal values by the next axis
    let mut start = 0;
    for end in 1..names.len() {
        if coord(names[end]) - coord(names[start]) >= tolerance {
            if end - start > 1 {
                let group = names[start..end].to_vec();
                let sorted = order_by_axis(group, locations, axis + 1, tolerance);
                names[start..end].copy_from_slice(&sorted);
            }
            start = end;
        }
    }
    if names.len() - start > 1 {
        let group = names[start..].to_vec();
        let sorted = order_by_axis(group, locations, axis + 1, tolerance);
        names[start..].copy_from_slice(&sorted);
    }
    names
}
