//! Closeness checks with numpy `isclose` semantics:
//! `|a - b| <= atol + rtol * |b|`.

pub const RTOL: f64 = 1e-5;
pub const ATOL: f64 = 1e-8;

#[must_use]
pub fn is_close(a: f64, b: f64) -> bool {
    is_close_tol(a, b, ATOL)
}

#[must_use]
pub fn is_close_tol(a: f64, b: f64, atol: f64) -> bool {
    (a - b).abs() <= atol + RTOL * b.abs()
}

/// Element-wise closeness over two equally long slices.
#[must_use]
pub fn all_close(a: &[f64], b: &[f64], atol: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| is_close_tol(*x, *y, atol))
}
