//! Quadratic Bezier control points in the edge frame.
//!
//! A relative control point `[t, s]` sits at `start + t * edge + s * perp`,
//! where `edge = end - start` and `perp` is `edge` turned 90° counter-clockwise.
//! Relative coordinates survive edge scaling untouched, which is what the
//! parametric engine relies on.

use nalgebra::Vector2;

use crate::GeometryError;

#[must_use]
pub fn control_to_absolute(start: [f64; 2], end: [f64; 2], relative: [f64; 2]) -> [f64; 2] {
    let start = Vector2::from(start);
    let edge = Vector2::from(end) - start;
    let perp = Vector2::new(-edge.y, edge.x);

    (start + edge * relative[0] + perp * relative[1]).into()
}

pub fn control_to_relative(
    start: [f64; 2],
    end: [f64; 2],
    control: [f64; 2],
) -> Result<[f64; 2], GeometryError> {
    let start_v = Vector2::from(start);
    let edge = Vector2::from(end) - start_v;
    let len_sq = edge.norm_squared();
    if len_sq == 0.0 {
        return Err(GeometryError::ZeroLengthEdge { start, end });
    }
    let len = len_sq.sqrt();

    let control_vec = Vector2::from(control) - start_v;
    let along = edge.dot(&control_vec) / len_sq;
    let normal = control_vec - edge * along;

    let side = edge.perp(&control_vec);
    let sign = if side < 0.0 { -1.0 } else { 1.0 };

    Ok([along, sign * normal.norm() / len])
}
