//! 2D/3D primitives shared by the pattern engine: rotation conventions,
//! Bezier control point frames and segment intersection.

pub mod curve;
pub mod rotation;
pub mod segment;
pub mod tolerance;

pub use curve::{control_to_absolute, control_to_relative};
pub use rotation::{point_in_3d, RotationRepr};
pub use segment::{first_intersection, segments_intersect, Segment};
pub use tolerance::{all_close, is_close, is_close_tol};

pub use nalgebra::{Matrix3, Vector2, Vector3};

#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("rotation encoding needs 3 (Euler) or 6 (two-column) values, got {0}")]
    RotationArity(usize),

    #[error("two-column rotation encoding has a degenerate column: {0:?}")]
    DegenerateRotation([f64; 6]),

    #[error("zero-length edge from {start:?} to {end:?}")]
    ZeroLengthEdge { start: [f64; 2], end: [f64; 2] },
}
