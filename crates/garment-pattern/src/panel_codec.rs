//! Single panel ↔ fixed-width edge sequence.
//!
//! Each edge becomes `[dx, dy, curve_x, curve_y]`: the offset from its start
//! vertex to its end vertex plus the relative curvature control (zeros for a
//! straight edge). Summing the first `k` offsets gives vertex `k` in a frame
//! whose origin is the panel's canonical origin vertex.

use garment_geometry::rotation::{euler_to_matrix, matrix_to_two_column};
use garment_geometry::{all_close, is_close, RotationRepr};
use nalgebra::Vector3;
use tracing::warn;

use crate::error::PatternError;
use crate::pattern::Pattern;
use crate::spec::{Edge, Panel};

pub type EdgeVector = [f64; 4];

/// Rows of a padded sequence within this distance of the pad vector are padding.
pub const PAD_TOLERANCE: f64 = 1.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationFormat {
    /// Euler angles in degrees (3 values).
    #[default]
    Euler,
    /// First two rotation matrix columns (6 values).
    TwoColumn,
}

/// How the tail of an edge sequence is to be read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Padding {
    /// Every row is a real edge.
    Unpadded,
    /// Trailing rows close to this vector are padding.
    Padded([f64; 4]),
}

impl Padding {
    pub const ZEROS: Self = Self::Padded([0.0; 4]);
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelNumeric {
    pub edges: Vec<EdgeVector>,
    pub rotation: RotationRepr,
    pub translation: [f64; 3],
    /// `edge_ids[original]` is the position of that edge in `edges`.
    pub edge_ids: Vec<usize>,
}

/// Panel rebuilt from an edge sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPanel {
    pub vertices: Vec<[f64; 2]>,
    pub edges: Vec<Edge>,
    /// False when the sequence did not return to the origin and an extra
    /// vertex had to be inserted.
    pub closed: bool,
}

pub fn encode_panel(
    name: &str,
    panel: &Panel,
    pad_to_len: Option<usize>,
    format: RotationFormat,
) -> Result<PanelNumeric, PatternError> {
    let (low, _) = panel
        .bounds()
        .ok_or_else(|| PatternError::EmptyPanel(name.to_string()))?;
    if panel.edges.is_empty() {
        return Err(PatternError::EmptyPanel(name.to_string()));
    }

    // bounding box corner to the origin, then the lowest-left vertex on Ox
    let mut vertices: Vec<[f64; 2]> = panel
        .vertices
        .iter()
        .map(|v| [v[0] - low[0], v[1] - low[1]])
        .collect();
    let origin_id = vertices
        .iter()
        .enumerate()
        .filter(|(_, v)| is_close(v[1], 0.0))
        .fold(None, |best: Option<(usize, f64)>, (idx, v)| match best {
            Some((_, x)) if x <= v[0] => best,
            _ => Some((idx, v[0])),
        })
        .map(|(idx, _)| idx)
        .ok_or_else(|| PatternError::NoOriginEdge(name.to_string()))?;
    let origin = vertices[origin_id];
    for v in &mut vertices {
        v[0] -= origin[0];
        v[1] -= origin[1];
    }
    let shift = [-low[0] - origin[0], -low[1] - origin[1]];

    let first_edge = panel
        .edges
        .iter()
        .position(|e| e.endpoints[0] == origin_id)
        .ok_or_else(|| PatternError::NoOriginEdge(name.to_string()))?;
    let n = panel.edges.len();
    let edge_ids = (0..n).map(|old| (old + n - first_edge) % n).collect();

    let mut edges = Vec::with_capacity(pad_to_len.unwrap_or(n).max(n));
    for offset in 0..n {
        let idx = (first_edge + offset) % n;
        let edge = &panel.edges[idx];
        let vertex = |v: usize| {
            vertices
                .get(v)
                .copied()
                .ok_or_else(|| PatternError::VertexOutOfRange {
                    panel: name.to_string(),
                    edge: idx,
                    vertex: v,
                })
        };
        let start = vertex(edge.endpoints[0])?;
        let end = vertex(edge.endpoints[1])?;
        let curvature = edge.curvature.unwrap_or([0.0, 0.0]);
        edges.push([end[0] - start[0], end[1] - start[1], curvature[0], curvature[1]]);
    }

    if let Some(pad_len) = pad_to_len {
        if n > pad_len {
            return Err(PatternError::PanelTooLong {
                panel: name.to_string(),
                edges: n,
                pad_len,
            });
        }
        edges.resize(pad_len, [0.0; 4]);
    }

    // keep the world placement despite the new local origin
    let matrix = euler_to_matrix(panel.rotation);
    let compensation = matrix * Vector3::new(shift[0], shift[1], 0.0);
    let translation = [
        panel.translation[0] - compensation.x,
        panel.translation[1] - compensation.y,
        panel.translation[2] - compensation.z,
    ];
    let rotation = match format {
        RotationFormat::Euler => RotationRepr::Euler(panel.rotation),
        RotationFormat::TwoColumn => RotationRepr::TwoColumn(matrix_to_two_column(&matrix)),
    };

    Ok(PanelNumeric {
        edges,
        rotation,
        translation,
        edge_ids,
    })
}

/// Rows of `sequence` that are real edges.
pub fn unpadded(sequence: &[EdgeVector], padding: Padding) -> &[EdgeVector] {
    match padding {
        Padding::Unpadded => sequence,
        Padding::Padded(pad) => {
            let mut len = sequence.len();
            while len > 0 && all_close(&sequence[len - 1], &pad, PAD_TOLERANCE) {
                len -= 1;
            }
            &sequence[..len]
        }
    }
}

/// Where the edge chain ends relative to where it started. Zero for a
/// closed panel loop.
pub fn loop_residual(sequence: &[EdgeVector], padding: Padding) -> [f64; 2] {
    unpadded(sequence, padding)
        .iter()
        .fold([0.0, 0.0], |acc, e| [acc[0] + e[0], acc[1] + e[1]])
}

pub fn decode_panel(
    name: &str,
    sequence: &[EdgeVector],
    padding: Padding,
) -> Result<DecodedPanel, PatternError> {
    let sequence = unpadded(sequence, padding);
    let Some((last, body)) = sequence.split_last() else {
        return Err(PatternError::EmptyPanel(name.to_string()));
    };

    let mut vertices = vec![[0.0, 0.0]];
    let mut edges = Vec::with_capacity(sequence.len() + 1);
    for (idx, e) in body.iter().enumerate() {
        let prev = vertices[idx];
        vertices.push([prev[0] + e[0], prev[1] + e[1]]);
        edges.push(edge_from_row(idx, idx + 1, e));
    }

    let idx = vertices.len() - 1;
    let prev = vertices[idx];
    let fin = [prev[0] + last[0], prev[1] + last[1]];
    let closed = is_close(fin[0], 0.0) && is_close(fin[1], 0.0);
    if closed {
        edges.push(edge_from_row(idx, 0, last));
    } else {
        warn!(panel = name, end = ?fin, "edge sequence does not return to origin; adding a vertex");
        vertices.push(fin);
        edges.push(edge_from_row(idx, idx + 1, last));
        edges.push(Edge::straight(idx + 1, 0));
    }

    Ok(DecodedPanel {
        vertices,
        edges,
        closed,
    })
}

fn edge_from_row(start: usize, end: usize, row: &EdgeVector) -> Edge {
    let curved = !(is_close(row[2], 0.0) && is_close(row[3], 0.0));
    Edge {
        endpoints: [start, end],
        curvature: curved.then_some([row[2], row[3]]),
    }
}

impl Pattern {
    /// Numeric form of a panel with its placement compensated for the
    /// canonical local origin.
    pub fn panel_as_numeric(
        &self,
        name: &str,
        pad_to_len: Option<usize>,
    ) -> Result<PanelNumeric, PatternError> {
        encode_panel(name, self.panel(name)?, pad_to_len, RotationFormat::Euler)
    }

    /// Create or replace a panel from its numeric form.
    ///
    /// Placement is only touched when given. Any parameter values stop
    /// describing the geometry and are invalidated.
    pub fn panel_from_numeric(
        &mut self,
        name: &str,
        sequence: &[EdgeVector],
        rotation: Option<RotationRepr>,
        translation: Option<[f64; 3]>,
        padding: Padding,
    ) -> Result<(), PatternError> {
        self.set_panel_from_numeric(name, sequence, rotation, translation, padding)?;
        self.invalidate_all_values();
        Ok(())
    }

    pub(crate) fn set_panel_from_numeric(
        &mut self,
        name: &str,
        sequence: &[EdgeVector],
        rotation: Option<RotationRepr>,
        translation: Option<[f64; 3]>,
        padding: Padding,
    ) -> Result<(), PatternError> {
        let decoded = decode_panel(name, sequence, padding)?;
        let rotation = rotation.map(|r| r.to_euler()).transpose()?;

        let panel = self
            .spec
            .pattern
            .panels
            .entry(name.to_string())
            .or_default();
        panel.vertices = decoded.vertices;
        panel.edges = decoded.edges;
        if let Some(translation) = translation {
            panel.translation = translation;
        }
        if let Some(rotation) = rotation {
            panel.rotation = rotation;
        }
        Ok(())
    }
}
