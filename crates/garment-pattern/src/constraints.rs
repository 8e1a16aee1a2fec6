//! Constraints applied after every parameter edit.

use garment_geometry::is_close;
use indexmap::IndexMap;
use tracing::debug;

use crate::error::PatternError;
use crate::params::meta_edge;
use crate::pattern::Pattern;
use crate::spec::{Constraint, ConstraintKind};

impl Pattern {
    /// Enforce every constraint in order, recording the scaling applied to
    /// each edge so that it can be undone.
    pub(crate) fn apply_constraints(&mut self) -> Result<(), PatternError> {
        let Some(mut constraints) = self.spec.constraints.take() else {
            return Ok(());
        };
        let result = self.apply_each(&mut constraints);
        self.spec.constraints = Some(constraints);
        result
    }

    /// Undo the recorded constraint scalings in reverse order.
    pub(crate) fn invert_constraints(&mut self) -> Result<(), PatternError> {
        let Some(mut constraints) = self.spec.constraints.take() else {
            return Ok(());
        };
        let result = self.invert_each(&mut constraints);
        self.spec.constraints = Some(constraints);
        result
    }

    fn apply_each(
        &mut self,
        constraints: &mut IndexMap<String, Constraint>,
    ) -> Result<(), PatternError> {
        for name in self.spec.constraint_sequence_of(constraints) {
            let constraint = constraints
                .get_mut(&name)
                .ok_or_else(|| PatternError::UnknownConstraint(name.clone()))?;
            match constraint.kind {
                ConstraintKind::LengthEquality => self.equalize_lengths(&name, constraint)?,
            }
        }
        Ok(())
    }

    fn invert_each(
        &mut self,
        constraints: &mut IndexMap<String, Constraint>,
    ) -> Result<(), PatternError> {
        for name in self.spec.constraint_sequence_of(constraints).iter().rev() {
            let constraint = constraints
                .get_mut(name)
                .ok_or_else(|| PatternError::UnknownConstraint(name.clone()))?;
            for influence in constraint.influence.iter_mut().rev() {
                for edge in influence.edge_list.iter_mut().rev() {
                    let Some(value) = edge.value else {
                        continue;
                    };
                    if is_close(value, 0.0) {
                        return Err(PatternError::ZeroInversion {
                            owner: format!("constraint \"{name}\""),
                        });
                    }
                    self.extend_edge(&influence.panel, edge, 1.0 / value, true)?;
                    edge.value = Some(1.0);
                }
            }
        }
        Ok(())
    }

    /// Scale every referenced (meta-)edge to the mean of their lengths.
    fn equalize_lengths(
        &mut self,
        name: &str,
        constraint: &mut Constraint,
    ) -> Result<(), PatternError> {
        let mut lengths = Vec::new();
        for influence in &mut constraint.influence {
            let panel = self.spec.panel(&influence.panel)?;
            for edge in &mut influence.edge_list {
                let length = meta_edge(&influence.panel, panel, edge)?.length;
                if is_close(length, 0.0) {
                    return Err(PatternError::DegenerateLine {
                        panel: influence.panel.clone(),
                    });
                }
                edge.length = Some(length);
                lengths.push(length);
            }
        }
        if lengths.is_empty() {
            return Ok(());
        }
        let target = lengths.iter().sum::<f64>() / lengths.len() as f64;

        let mut lengths = lengths.into_iter();
        for influence in &mut constraint.influence {
            for (edge, length) in influence.edge_list.iter_mut().zip(lengths.by_ref()) {
                let scaling = target / length;
                if is_close(scaling, 1.0) {
                    edge.value = Some(1.0);
                } else {
                    self.extend_edge(&influence.panel, edge, scaling, true)?;
                    edge.value = Some(scaling);
                }
            }
        }
        debug!(constraint = name, target, "length equality applied");
        Ok(())
    }
}
