//! One-time template normalization applied on every load.

use garment_geometry::control_to_relative;
use tracing::warn;

use crate::error::PatternError;
use crate::pattern::Pattern;
use crate::spec::{CurvatureCoords, ParameterKind, CM_PER_METER};

impl Pattern {
    /// Bring a freshly loaded template to the canonical form: relative
    /// curvature, centimeters, and (if requested once) centered panels.
    pub(crate) fn normalize_template(&mut self) -> Result<(), PatternError> {
        if self.spec.properties.curvature_coords == CurvatureCoords::Absolute {
            self.curvature_to_relative()?;
            self.spec.properties.curvature_coords = CurvatureCoords::Relative;
        }

        match self.spec.properties.units_in_meter {
            Some(units) if units != CM_PER_METER => {
                let scale = CM_PER_METER / units;
                for panel in self.spec.pattern.panels.values_mut() {
                    for v in &mut panel.vertices {
                        v[0] *= scale;
                        v[1] *= scale;
                    }
                    for t in &mut panel.translation {
                        *t *= scale;
                    }
                }
                self.spec.properties.original_units_in_meter = Some(units);
                self.spec.properties.units_in_meter = Some(CM_PER_METER);
                warn!(pattern = %self.name, from = units, "pattern units converted to cm");
            }
            Some(_) => {}
            None => {
                warn!(pattern = %self.name, "units not specified; scaling normalization skipped");
            }
        }

        // after curvature conversion: the centroid shift moves vertices only
        if self.spec.properties.normalize_panel_translation {
            self.spec.properties.normalize_panel_translation = false;
            for panel in self.spec.pattern.panels.values_mut() {
                let offset = centroid(&panel.vertices);
                for v in &mut panel.vertices {
                    v[0] -= offset[0];
                    v[1] -= offset[1];
                }
                panel.translation[0] += offset[0];
                panel.translation[1] += offset[1];
            }
        }

        self.normalize_param_scaling();
        Ok(())
    }

    fn curvature_to_relative(&mut self) -> Result<(), PatternError> {
        for panel in self.spec.pattern.panels.values_mut() {
            for edge in &mut panel.edges {
                if let Some(control) = edge.curvature {
                    let [start, end] = edge.endpoints;
                    edge.curvature = Some(control_to_relative(
                        panel.vertices[start],
                        panel.vertices[end],
                        control,
                    )?);
                }
            }
        }
        Ok(())
    }

    /// Additive parameters are lengths and follow the unit change.
    fn normalize_param_scaling(&mut self) {
        let Some(original) = self.spec.properties.original_units_in_meter.take() else {
            return;
        };
        let scale = CM_PER_METER / original;
        for parameter in self.spec.parameters.values_mut() {
            if parameter.kind == ParameterKind::AdditiveLength {
                parameter.value = parameter.value.as_ref().map(|v| v.map(|x| x * scale));
                parameter.range = parameter.range.map(|x| x * scale);
            }
        }
        warn!(pattern = %self.name, "parameter units converted to cm");
    }
}

fn centroid(vertices: &[[f64; 2]]) -> [f64; 2] {
    if vertices.is_empty() {
        return [0.0, 0.0];
    }
    let n = vertices.len() as f64;
    let sum = vertices
        .iter()
        .fold([0.0, 0.0], |acc, v| [acc[0] + v[0], acc[1] + v[1]]);
    [sum[0] / n, sum[1] / n]
}
