//! Segment intersection via the counter-clockwise orientation test.

pub type Segment = [[f64; 2]; 2];

/// Twice the signed area of `(start, end, point)`: positive for a
/// counter-clockwise turn, negative for clockwise, zero when collinear.
#[must_use]
pub fn ccw(start: [f64; 2], end: [f64; 2], point: [f64; 2]) -> f64 {
    (end[0] - start[0]) * (point[1] - start[1]) - (point[0] - start[0]) * (end[1] - start[1])
}

/// True when the segments cross at a point interior to both.
///
/// Touching endpoints and collinear overlaps give a zero orientation
/// product and do not count.
#[must_use]
pub fn segments_intersect(a: &Segment, b: &Segment) -> bool {
    let a_splits_b = ccw(a[0], a[1], b[0]) * ccw(a[0], a[1], b[1]);
    let b_splits_a = ccw(b[0], b[1], a[0]) * ccw(b[0], b[1], a[1]);
    a_splits_b < 0.0 && b_splits_a < 0.0
}

/// First pair of crossing segments, scanning all pairs.
#[must_use]
pub fn first_intersection(segments: &[Segment]) -> Option<(usize, usize)> {
    for i in 0..segments.len() {
        for j in (i + 1)..segments.len() {
            if segments_intersect(&segments[i], &segments[j]) {
                return Some((i, j));
            }
        }
    }
    None
}
