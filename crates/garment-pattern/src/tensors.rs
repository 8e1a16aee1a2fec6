//! Whole pattern ↔ stacked numeric arrays for learning pipelines.
//!
//! Panels are laid out in canonical order and padded to one length, so a
//! stitch side flattens to `panel_index * pad_len + edge_index`.

use garment_geometry::RotationRepr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PatternError;
use crate::panel_codec::{decode_panel, encode_panel, EdgeVector, Padding, RotationFormat};
use crate::pattern::Pattern;
use crate::spec::{Panel, Stitch, StitchSide};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TensorOptions {
    /// Edge count per panel; defaults to the longest panel.
    pub pad_to_len: Option<usize>,
    pub with_placement: bool,
    pub rotation_format: RotationFormat,
    pub with_stitches: bool,
    pub with_stitch_tags: bool,
}

/// Numeric form of a pattern.
///
/// Shapes: `edges` `[P][E][4]`, `rotations` `[P][3|6]`, `translations`
/// `[P][3]`, `stitches` `[2][S]`, `stitch_tags` `[P][E][3]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternTensors {
    pub edges: Vec<Vec<EdgeVector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotations: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translations: Option<Vec<[f64; 3]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stitches: Option<[Vec<usize>; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stitch_tags: Option<Vec<Vec<[f64; 3]>>>,
    /// Source panel names in tensor order. Not used when decoding.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub panel_order: Vec<String>,
}

impl PatternTensors {
    pub fn panel_count(&self) -> usize {
        self.edges.len()
    }

    /// Rows per panel, taken from the first panel.
    pub fn pad_len(&self) -> usize {
        self.edges.first().map_or(0, Vec::len)
    }
}

impl Pattern {
    pub fn pattern_as_tensors(&self, options: TensorOptions) -> Result<PatternTensors, PatternError> {
        let order = self.panel_order();
        let pad_len = match options.pad_to_len {
            Some(len) => len,
            None => self
                .spec
                .pattern
                .panels
                .values()
                .map(|p| p.edges.len())
                .max()
                .ok_or_else(|| PatternError::Shape("pattern has no panels".to_string()))?,
        };

        let mut edges = Vec::with_capacity(order.len());
        let mut rotations = Vec::with_capacity(order.len());
        let mut translations = Vec::with_capacity(order.len());
        let mut edge_ids = IndexMap::with_capacity(order.len());
        for name in &order {
            let numeric = encode_panel(name, self.panel(name)?, Some(pad_len), options.rotation_format)?;
            edges.push(numeric.edges);
            rotations.push(numeric.rotation.to_vec());
            translations.push(numeric.translation);
            edge_ids.insert(name.as_str(), numeric.edge_ids);
        }

        let flat_side = |side: &StitchSide| -> Result<(usize, usize), PatternError> {
            let (panel_id, _, ids) = edge_ids
                .get_full(side.panel.as_str())
                .ok_or_else(|| PatternError::UnknownPanel(side.panel.clone()))?;
            let edge_id = *ids.get(side.edge).ok_or_else(|| PatternError::EdgeOutOfRange {
                panel: side.panel.clone(),
                edge: side.edge,
            })?;
            Ok((panel_id, edge_id))
        };

        let stitches = self.spec.pattern.stitches.as_slice();
        let mut flat = [Vec::with_capacity(stitches.len()), Vec::with_capacity(stitches.len())];
        let mut tags_per_edge = options
            .with_stitch_tags
            .then(|| vec![vec![[0.0; 3]; pad_len]; order.len()]);
        let tags = match tags_per_edge {
            Some(_) => self.stitches_as_tags()?,
            None => Vec::new(),
        };
        for (idx, stitch) in stitches.iter().enumerate() {
            for (side_id, side) in stitch.0.iter().enumerate() {
                let (panel_id, edge_id) = flat_side(side)?;
                flat[side_id].push(panel_id * pad_len + edge_id);
                if let Some(per_edge) = tags_per_edge.as_mut() {
                    per_edge[panel_id][edge_id] = tags[idx];
                }
            }
        }

        debug!(
            pattern = %self.name,
            panels = order.len(),
            pad_len,
            stitches = stitches.len(),
            "encoded pattern"
        );
        Ok(PatternTensors {
            edges,
            rotations: options.with_placement.then_some(rotations),
            translations: options.with_placement.then_some(translations),
            stitches: options.with_stitches.then_some(flat),
            stitch_tags: tags_per_edge,
            panel_order: order,
        })
    }

    /// Replace all panels and stitches with the content of `tensors`.
    ///
    /// Panels are named `panel_<i>` in tensor order. Stitch indices are read
    /// against the padded row count, so stitches require padded input. On
    /// error the pattern is left unchanged; on success parameter and
    /// constraint values are invalidated.
    pub fn pattern_from_tensors(
        &mut self,
        tensors: &PatternTensors,
        padding: Padding,
    ) -> Result<(), PatternError> {
        let count = tensors.panel_count();
        let stitches = tensors
            .stitches
            .as_ref()
            .filter(|[first, second]| !first.is_empty() || !second.is_empty());
        if stitches.is_some() && padding == Padding::Unpadded {
            return Err(PatternError::UnpaddedStitches);
        }
        check_len("rotations", tensors.rotations.as_ref().map(Vec::len), count)?;
        check_len("translations", tensors.translations.as_ref().map(Vec::len), count)?;
        let pad_len = tensors.pad_len();
        if padding != Padding::Unpadded && tensors.edges.iter().any(|e| e.len() != pad_len) {
            return Err(PatternError::Shape(
                "padded panels must all have the same edge count".to_string(),
            ));
        }

        let mut panels = IndexMap::with_capacity(count);
        for (idx, sequence) in tensors.edges.iter().enumerate() {
            let name = format!("panel_{idx}");
            let decoded = decode_panel(&name, sequence, padding)?;
            let rotation = match &tensors.rotations {
                Some(rotations) => RotationRepr::from_slice(&rotations[idx])?.to_euler()?,
                None => [0.0; 3],
            };
            let translation = tensors
                .translations
                .as_ref()
                .map_or([0.0; 3], |t| t[idx]);
            panels.insert(
                name,
                Panel {
                    translation,
                    rotation,
                    vertices: decoded.vertices,
                    edges: decoded.edges,
                    ..Panel::default()
                },
            );
        }

        let new_stitches = match stitches {
            Some([first, second]) => {
                if first.len() != second.len() {
                    return Err(PatternError::Shape(format!(
                        "stitch sides have {} and {} entries",
                        first.len(),
                        second.len()
                    )));
                }
                first
                    .iter()
                    .zip(second)
                    .map(|(&a, &b)| {
                        Ok(Stitch([
                            unflatten(a, &panels, pad_len)?,
                            unflatten(b, &panels, pad_len)?,
                        ]))
                    })
                    .collect::<Result<Vec<_>, PatternError>>()?
            }
            None => {
                warn!(pattern = %self.name, "panels replaced without stitch information; stitches removed");
                Vec::new()
            }
        };

        self.spec.pattern.panels = panels;
        self.spec.pattern.stitches = new_stitches;
        self.invalidate_all_values();
        debug!(pattern = %self.name, panels = count, "decoded pattern");
        Ok(())
    }
}

fn check_len(what: &str, len: Option<usize>, panels: usize) -> Result<(), PatternError> {
    match len {
        Some(len) if len != panels => Err(PatternError::Shape(format!(
            "{len} {what} for {panels} panels"
        ))),
        _ => Ok(()),
    }
}

fn unflatten(
    index: usize,
    panels: &IndexMap<String, Panel>,
    pad_len: usize,
) -> Result<StitchSide, PatternError> {
    let out_of_range = || PatternError::StitchOutOfRange {
        index,
        panels: panels.len(),
        pad_len,
    };
    if pad_len == 0 {
        return Err(out_of_range());
    }
    let (name, panel) = panels.get_index(index / pad_len).ok_or_else(out_of_range)?;
    let edge = index % pad_len;
    if edge >= panel.edges.len() {
        return Err(out_of_range());
    }
    Ok(StitchSide {
        panel: name.clone(),
        edge,
    })
}
