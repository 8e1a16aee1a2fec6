//! Parametric transform engine: parameter application and reversal.
//!
//! A pattern is either at template defaults or has its current parameter
//! values applied on top of them. Every edit is replayed from the template:
//! revert (constraints first, then parameters in reverse order), set the new
//! values, then apply parameters forward and constraints last.

use garment_geometry::is_close;
use nalgebra::Vector2;
use tracing::{debug, warn};

use crate::error::PatternError;
use crate::pattern::Pattern;
use crate::spec::{EdgeInfluence, ExtendDirection, Panel, ParamValue, Parameter, ParameterKind};

/// Vertices along an edge or a chain of edges, with the unit line that
/// extensions move them along.
#[derive(Debug, Clone)]
pub(crate) struct MetaEdge {
    pub vertex_ids: Vec<usize>,
    pub coords: Vec<Vector2<f64>>,
    pub line: Vector2<f64>,
    /// Extent of the chain projected on `line`.
    pub length: f64,
}

pub(crate) fn meta_edge(
    panel_name: &str,
    panel: &Panel,
    influence: &EdgeInfluence,
) -> Result<MetaEdge, PatternError> {
    let endpoints = |id: usize| {
        panel
            .edges
            .get(id)
            .map(|e| e.endpoints)
            .ok_or_else(|| PatternError::EdgeOutOfRange {
                panel: panel_name.to_string(),
                edge: id,
            })
    };

    let ids = influence.id.ids();
    let Some(&first) = ids.first() else {
        return Err(PatternError::DegenerateLine {
            panel: panel_name.to_string(),
        });
    };
    let mut vertex_ids = vec![endpoints(first)?[0]];
    for &id in ids {
        vertex_ids.push(endpoints(id)?[1]);
    }

    let coords = vertex_ids
        .iter()
        .map(|&v| {
            panel
                .vertex(v)
                .map(Vector2::from)
                .ok_or_else(|| PatternError::VertexOutOfRange {
                    panel: panel_name.to_string(),
                    edge: first,
                    vertex: v,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let span = coords[coords.len() - 1] - coords[0];
    let line = influence.along.map(Vector2::from).unwrap_or(span);
    let norm = line.norm();
    if is_close(norm, 0.0) {
        return Err(PatternError::DegenerateLine {
            panel: panel_name.to_string(),
        });
    }
    let line = line / norm;

    Ok(MetaEdge {
        vertex_ids,
        coords,
        line,
        length: line.dot(&span),
    })
}

/// Multiplicative or additive inverse of every component.
pub fn invert_value(
    owner: &str,
    value: &ParamValue,
    multiplicative: bool,
) -> Result<ParamValue, PatternError> {
    if !multiplicative {
        return Ok(value.map(|x| -x));
    }
    if value.components().iter().any(|x| is_close(*x, 0.0)) {
        return Err(PatternError::ZeroInversion {
            owner: owner.to_string(),
        });
    }
    Ok(value.map(|x| 1.0 / x))
}

impl Pattern {
    pub fn parameter(&self, name: &str) -> Result<&Parameter, PatternError> {
        self.spec
            .parameters
            .get(name)
            .ok_or_else(|| PatternError::UnknownParameter(name.to_string()))
    }

    fn parameter_mut(&mut self, name: &str) -> Result<&mut Parameter, PatternError> {
        self.spec
            .parameters
            .get_mut(name)
            .ok_or_else(|| PatternError::UnknownParameter(name.to_string()))
    }

    /// Current values of all parameters flattened in parameter order.
    pub fn param_values_list(&self) -> Result<Vec<f64>, PatternError> {
        let mut values = Vec::new();
        for name in &self.spec.parameter_order {
            let value = self
                .parameter(name)?
                .value
                .as_ref()
                .ok_or_else(|| PatternError::InvalidValue {
                    parameter: name.clone(),
                    message: "value was invalidated by a direct geometry update".to_string(),
                })?;
            values.extend_from_slice(value.components());
        }
        Ok(values)
    }

    /// Apply a flat value list in the shape of [`Pattern::param_values_list`].
    pub fn apply_param_list(&mut self, values: &[f64]) -> Result<(), PatternError> {
        let expected = self
            .spec
            .parameter_order
            .iter()
            .map(|name| self.parameter(name).map(Parameter::width))
            .sum::<Result<usize, _>>()?;
        if values.len() != expected {
            return Err(PatternError::ValueCountMismatch {
                expected,
                got: values.len(),
            });
        }

        self.atomically(|pattern| {
            pattern.revert_to_template(false)?;

            let order = pattern.spec.parameter_order.clone();
            let mut rest = values;
            for name in &order {
                let parameter = pattern.parameter_mut(name)?;
                let (taken, tail) = rest.split_at(parameter.width());
                parameter.value = Some(match (parameter.neutral_value(), taken) {
                    (ParamValue::Scalar(_), [value]) => ParamValue::Scalar(*value),
                    _ => ParamValue::List(taken.to_vec()),
                });
                rest = tail;
            }

            pattern.update_pattern_by_param_values()
        })
    }

    /// Bring the geometry back to template defaults.
    ///
    /// With `params_to_default` the parameter values are reset to their
    /// neutral values, otherwise they keep describing the last applied state.
    pub fn restore_template(&mut self, params_to_default: bool) -> Result<(), PatternError> {
        self.atomically(|pattern| pattern.revert_to_template(params_to_default))
    }

    /// Run `op`, rolling the spec back if it fails.
    pub(crate) fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, PatternError>,
    ) -> Result<T, PatternError> {
        let snapshot = self.snapshot();
        match op(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.restore(&snapshot);
                Err(err)
            }
        }
    }

    /// Apply current parameter values to a pattern at template defaults,
    /// followed by the constraints.
    pub(crate) fn update_pattern_by_param_values(&mut self) -> Result<(), PatternError> {
        let order = self.spec.parameter_order.clone();
        for name in &order {
            let parameter = self.parameter(name)?.clone();
            let Some(value) = &parameter.value else {
                continue;
            };
            for influence in &parameter.influence {
                for edge in &influence.edge_list {
                    self.transform_edge(name, parameter.kind, &influence.panel, edge, value)?;
                }
            }
        }
        self.apply_constraints()?;
        debug!(pattern = %self.name, "parameters applied");
        Ok(())
    }

    pub(crate) fn revert_to_template(&mut self, params_to_default: bool) -> Result<(), PatternError> {
        self.invert_constraints()?;

        let order = self.spec.parameter_order.clone();
        for name in order.iter().rev() {
            let parameter = self.parameter(name)?.clone();
            if let Some(value) = &parameter.value {
                let owner = format!("parameter \"{name}\"");
                let inverse = invert_value(&owner, value, parameter.kind.is_multiplicative())?;
                for influence in parameter.influence.iter().rev() {
                    for edge in influence.edge_list.iter().rev() {
                        self.transform_edge(name, parameter.kind, &influence.panel, edge, &inverse)?;
                    }
                }
            }
            if params_to_default {
                self.parameter_mut(name)?.value = Some(parameter.neutral_value());
            }
        }
        Ok(())
    }

    fn transform_edge(
        &mut self,
        parameter: &str,
        kind: ParameterKind,
        panel: &str,
        edge: &EdgeInfluence,
        value: &ParamValue,
    ) -> Result<(), PatternError> {
        match kind {
            ParameterKind::Length | ParameterKind::AdditiveLength => {
                let [factor] = value.components() else {
                    return Err(PatternError::InvalidValue {
                        parameter: parameter.to_string(),
                        message: "edge extension takes a single value".to_string(),
                    });
                };
                self.extend_edge(panel, edge, *factor, kind.is_multiplicative())
            }
            ParameterKind::Curve => {
                for &id in edge.id.ids() {
                    self.curve_edge(parameter, panel, id, value)?;
                }
                Ok(())
            }
        }
    }

    /// Lengthen or shorten an edge (chain) along its extension line.
    ///
    /// Multiplicative mode scales each vertex's projection relative to the
    /// fixed point by `value`. Additive mode moves each vertex by `value`
    /// along the unit projection direction; vertices sitting at the fixed
    /// point do not move.
    pub(crate) fn extend_edge(
        &mut self,
        panel_name: &str,
        influence: &EdgeInfluence,
        value: f64,
        multiplicative: bool,
    ) -> Result<(), PatternError> {
        let direction = influence
            .direction
            .ok_or_else(|| PatternError::MissingDirection {
                panel: panel_name.to_string(),
            })?;
        let panel = self.spec.panel_mut(panel_name)?;
        let meta = meta_edge(panel_name, panel, influence)?;

        let start = meta.coords[0];
        let end = meta.coords[meta.coords.len() - 1];
        let fixed = match direction {
            ExtendDirection::End => start,
            ExtendDirection::Start => end,
            ExtendDirection::Both => (start + end) / 2.0,
        };

        for (&id, &point) in meta.vertex_ids.iter().zip(&meta.coords) {
            let projection = meta.line * (point - fixed).dot(&meta.line);
            let moved = if multiplicative {
                point - projection * (1.0 - value)
            } else {
                let norm = projection.norm();
                if is_close(norm, 0.0) {
                    point
                } else {
                    point + projection / norm * value
                }
            };
            panel.vertices[id] = [moved.x, moved.y];
        }
        Ok(())
    }

    /// Scale an edge's relative curvature control. A scalar scales the
    /// perpendicular offset only, a pair scales both coordinates.
    fn curve_edge(
        &mut self,
        parameter: &str,
        panel_name: &str,
        edge: usize,
        value: &ParamValue,
    ) -> Result<(), PatternError> {
        let panel = self.spec.panel_mut(panel_name)?;
        let target = panel
            .edges
            .get_mut(edge)
            .ok_or_else(|| PatternError::EdgeOutOfRange {
                panel: panel_name.to_string(),
                edge,
            })?;
        let control = target
            .curvature
            .as_mut()
            .ok_or_else(|| PatternError::MissingCurvature {
                panel: panel_name.to_string(),
                edge,
            })?;

        match value.components() {
            [y] => control[1] *= y,
            [x, y] => {
                control[0] *= x;
                control[1] *= y;
            }
            other => {
                return Err(PatternError::InvalidValue {
                    parameter: parameter.to_string(),
                    message: format!("curve scaling takes 1 or 2 values, got {}", other.len()),
                })
            }
        }
        Ok(())
    }

    /// Forget all parameter and constraint values: the geometry no longer
    /// follows from them.
    pub(crate) fn invalidate_all_values(&mut self) {
        let mut updated = false;
        for parameter in self.spec.parameters.values_mut() {
            updated |= parameter.value.take().is_some();
        }
        for constraint in self.spec.constraints.iter_mut().flat_map(|c| c.values_mut()) {
            for influence in &mut constraint.influence {
                for edge in &mut influence.edge_list {
                    updated |= edge.value.take().is_some();
                }
            }
        }
        if updated {
            warn!(pattern = %self.name, "parameter and constraint values invalidated");
        }
    }
}
