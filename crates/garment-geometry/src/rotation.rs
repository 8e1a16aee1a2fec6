//! Panel rotation conventions.
//!
//! Panels store their orientation as Euler angles in degrees, applied in
//! x, y, z order (the Maya convention): the rotation matrix is
//! `Rz * Ry * Rx`. For tensor exchange the same rotation may be given as
//! the first two columns of that matrix (6 values, column-major).
//! Every conversion between the three forms lives here.

use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::GeometryError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationRepr {
    /// Euler angles in degrees, x-y-z order.
    Euler([f64; 3]),
    /// First two columns of the rotation matrix, `[c0.x, c0.y, c0.z, c1.x, c1.y, c1.z]`.
    TwoColumn([f64; 6]),
}

impl RotationRepr {
    /// Interpret a flat slice by its length (3 → Euler, 6 → two-column).
    pub fn from_slice(values: &[f64]) -> Result<Self, GeometryError> {
        match values.len() {
            3 => Ok(Self::Euler([values[0], values[1], values[2]])),
            6 => {
                let mut cols = [0.0; 6];
                cols.copy_from_slice(values);
                Ok(Self::TwoColumn(cols))
            }
            n => Err(GeometryError::RotationArity(n)),
        }
    }

    pub fn to_matrix(&self) -> Result<Matrix3<f64>, GeometryError> {
        match self {
            Self::Euler(angles) => Ok(euler_to_matrix(*angles)),
            Self::TwoColumn(cols) => two_column_to_matrix(*cols),
        }
    }

    pub fn to_euler(&self) -> Result<[f64; 3], GeometryError> {
        match self {
            Self::Euler(angles) => Ok(*angles),
            Self::TwoColumn(cols) => Ok(matrix_to_euler(&two_column_to_matrix(*cols)?)),
        }
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Self::Euler(angles) => angles.to_vec(),
            Self::TwoColumn(cols) => cols.to_vec(),
        }
    }
}

#[must_use]
pub fn euler_to_matrix(degrees: [f64; 3]) -> Matrix3<f64> {
    Rotation3::from_euler_angles(
        degrees[0].to_radians(),
        degrees[1].to_radians(),
        degrees[2].to_radians(),
    )
    .into_inner()
}

/// Euler angles (degrees) of a proper rotation matrix.
#[must_use]
pub fn matrix_to_euler(matrix: &Matrix3<f64>) -> [f64; 3] {
    let (x, y, z) = Rotation3::from_matrix_unchecked(*matrix).euler_angles();
    [x.to_degrees(), y.to_degrees(), z.to_degrees()]
}

#[must_use]
pub fn matrix_to_two_column(matrix: &Matrix3<f64>) -> [f64; 6] {
    let c0 = matrix.column(0);
    let c1 = matrix.column(1);
    [c0[0], c0[1], c0[2], c1[0], c1[1], c1[2]]
}

#[must_use]
pub fn euler_to_two_column(degrees: [f64; 3]) -> [f64; 6] {
    matrix_to_two_column(&euler_to_matrix(degrees))
}

/// Rebuild a rotation matrix from two (possibly unnormalized) columns.
///
/// The first column is normalized, the second is made orthogonal to it and
/// normalized, and the third is their cross product.
pub fn two_column_to_matrix(cols: [f64; 6]) -> Result<Matrix3<f64>, GeometryError> {
    let a = Vector3::new(cols[0], cols[1], cols[2]);
    let b = Vector3::new(cols[3], cols[4], cols[5]);

    let first = a
        .try_normalize(f64::EPSILON)
        .ok_or(GeometryError::DegenerateRotation(cols))?;
    let second = (b - first * first.dot(&b))
        .try_normalize(f64::EPSILON)
        .ok_or(GeometryError::DegenerateRotation(cols))?;
    let third = first.cross(&second);

    Ok(Matrix3::from_columns(&[first, second, third]))
}

/// Map a panel-local 2D point into world space.
#[must_use]
pub fn point_in_3d(local: [f64; 2], rotation: &Matrix3<f64>, translation: [f64; 3]) -> [f64; 3] {
    let world = rotation * Vector3::new(local[0], local[1], 0.0) + Vector3::from(translation);
    world.into()
}
