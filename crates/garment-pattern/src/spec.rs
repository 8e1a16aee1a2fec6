//! Serde model of the pattern document.
//!
//! Keys that the engine does not interpret are kept in `extra` maps so that
//! a load/serialize cycle does not lose data written by other tools.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PatternError;

pub type Extra = IndexMap<String, Value>;

/// Root of a pattern document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub pattern: PatternBody,
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
    #[serde(default)]
    pub parameter_order: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<IndexMap<String, Constraint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_order: Option<Vec<String>>,
    pub properties: Properties,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for PatternSpec {
    fn default() -> Self {
        Self {
            pattern: PatternBody::default(),
            parameters: IndexMap::new(),
            parameter_order: Vec::new(),
            constraints: None,
            constraint_order: None,
            properties: Properties::default(),
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternBody {
    pub panels: IndexMap<String, Panel>,
    #[serde(default)]
    pub stitches: Vec<Stitch>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurvatureCoords {
    Absolute,
    #[default]
    Relative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub curvature_coords: CurvatureCoords,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units_in_meter: Option<f64>,
    #[serde(default)]
    pub normalize_panel_translation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_units_in_meter: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            curvature_coords: CurvatureCoords::Relative,
            units_in_meter: Some(CM_PER_METER),
            normalize_panel_translation: false,
            original_units_in_meter: None,
            extra: Extra::new(),
        }
    }
}

/// Patterns are normalized to centimeters.
pub const CM_PER_METER: f64 = 100.0;

/// A flat piece of cloth: a closed 2D polygon placed in 3D.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    #[serde(default)]
    pub translation: [f64; 3],
    /// Euler angles in degrees, x-y-z order.
    #[serde(default)]
    pub rotation: [f64; 3],
    pub vertices: Vec<[f64; 2]>,
    pub edges: Vec<Edge>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Panel {
    pub fn vertex(&self, idx: usize) -> Option<[f64; 2]> {
        self.vertices.get(idx).copied()
    }

    /// Start and end coordinates of an edge.
    pub fn edge_coords(&self, edge: usize) -> Option<([f64; 2], [f64; 2])> {
        let [start, end] = self.edges.get(edge)?.endpoints;
        Some((self.vertex(start)?, self.vertex(end)?))
    }

    pub fn edge_length(&self, edge: usize) -> Option<f64> {
        let (start, end) = self.edge_coords(edge)?;
        Some((end[0] - start[0]).hypot(end[1] - start[1]))
    }

    /// Axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (
                [lo[0].min(v[0]), lo[1].min(v[1])],
                [hi[0].max(v[0]), hi[1].max(v[1])],
            )
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub endpoints: [usize; 2],
    /// Bezier control point; relative to the edge frame once normalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curvature: Option<[f64; 2]>,
}

impl Edge {
    pub fn straight(start: usize, end: usize) -> Self {
        Self {
            endpoints: [start, end],
            curvature: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchSide {
    pub panel: String,
    pub edge: usize,
}

/// Two edges sewn together. The order of the sides carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stitch(pub [StitchSide; 2]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Length,
    AdditiveLength,
    Curve,
}

impl ParameterKind {
    /// Value at which the parameter leaves the template untouched.
    pub fn neutral(self) -> f64 {
        match self {
            Self::Length | Self::Curve => 1.0,
            Self::AdditiveLength => 0.0,
        }
    }

    pub fn is_multiplicative(self) -> bool {
        !matches!(self, Self::AdditiveLength)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f64),
    List(Vec<f64>),
}

impl ParamValue {
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::List(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn components(&self) -> &[f64] {
        match self {
            Self::Scalar(v) => std::slice::from_ref(v),
            Self::List(values) => values,
        }
    }

    /// Same shape with every component replaced by `f(component)`.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Self::Scalar(v) => Self::Scalar(f(*v)),
            Self::List(values) => Self::List(values.iter().map(|v| f(*v)).collect()),
        }
    }
}

/// A single `[low, high]` range or one range per value component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamRange {
    Single([f64; 2]),
    PerComponent(Vec<[f64; 2]>),
}

impl ParamRange {
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Self::Single([lo, hi]) => Self::Single([f(*lo), f(*hi)]),
            Self::PerComponent(ranges) => {
                Self::PerComponent(ranges.iter().map(|[lo, hi]| [f(*lo), f(*hi)]).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    /// `None` once a direct geometry update has made the value meaningless.
    #[serde(default)]
    pub value: Option<ParamValue>,
    pub range: ParamRange,
    #[serde(default)]
    pub influence: Vec<Influence>,
}

impl Parameter {
    /// Number of scalar components this parameter carries.
    pub fn width(&self) -> usize {
        match (&self.value, &self.range) {
            (Some(value), _) => value.len(),
            (None, ParamRange::Single(_)) => 1,
            (None, ParamRange::PerComponent(ranges)) => ranges.len(),
        }
    }

    /// Neutral value in this parameter's shape.
    pub fn neutral_value(&self) -> ParamValue {
        let neutral = self.kind.neutral();
        match &self.value {
            Some(ParamValue::List(values)) => ParamValue::List(vec![neutral; values.len()]),
            Some(ParamValue::Scalar(_)) => ParamValue::Scalar(neutral),
            None => match self.width() {
                1 if matches!(self.range, ParamRange::Single(_)) => ParamValue::Scalar(neutral),
                n => ParamValue::List(vec![neutral; n]),
            },
        }
    }
}

/// The edges of one panel affected by a parameter or constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Influence {
    pub panel: String,
    pub edge_list: Vec<EdgeInfluence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeRef {
    Single(usize),
    /// Ordered chain of consecutive edges treated as one meta-edge.
    Chain(Vec<usize>),
}

impl EdgeRef {
    pub fn ids(&self) -> &[usize] {
        match self {
            Self::Single(id) => std::slice::from_ref(id),
            Self::Chain(ids) => ids,
        }
    }
}

/// Which end of an edge (chain) moves when it is extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtendDirection {
    /// Start moves, end stays fixed.
    Start,
    /// End moves, start stays fixed.
    End,
    /// Both ends move symmetrically around the midpoint.
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeInfluence {
    pub id: EdgeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<ExtendDirection>,
    /// Custom extension line; defaults to the chain's start-to-end vector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub along: Option<[f64; 2]>,
    /// Constraint bookkeeping: scaling factor last applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Constraint bookkeeping: length before the scaling was applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
}

impl EdgeInfluence {
    pub fn new(id: EdgeRef, direction: ExtendDirection) -> Self {
        Self {
            id,
            direction: Some(direction),
            along: None,
            value: None,
            length: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    LengthEquality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    pub influence: Vec<Influence>,
}

impl PatternSpec {
    pub fn panel(&self, name: &str) -> Result<&Panel, PatternError> {
        self.pattern
            .panels
            .get(name)
            .ok_or_else(|| PatternError::UnknownPanel(name.to_string()))
    }

    pub fn panel_mut(&mut self, name: &str) -> Result<&mut Panel, PatternError> {
        self.pattern
            .panels
            .get_mut(name)
            .ok_or_else(|| PatternError::UnknownPanel(name.to_string()))
    }

    /// Constraint names in application order.
    pub fn constraint_sequence(&self) -> Vec<String> {
        match &self.constraints {
            Some(constraints) => self.constraint_sequence_of(constraints),
            None => self.constraint_order.clone().unwrap_or_default(),
        }
    }

    /// Order for `constraints`, which may have been detached from the spec.
    pub(crate) fn constraint_sequence_of(
        &self,
        constraints: &IndexMap<String, Constraint>,
    ) -> Vec<String> {
        self.constraint_order
            .clone()
            .unwrap_or_else(|| constraints.keys().cloned().collect())
    }

    /// Structural checks that the serde model cannot express.
    pub fn validate(&self) -> Result<(), PatternError> {
        for (name, panel) in &self.pattern.panels {
            for (idx, edge) in panel.edges.iter().enumerate() {
                for vertex in edge.endpoints {
                    if vertex >= panel.vertices.len() {
                        return Err(PatternError::VertexOutOfRange {
                            panel: name.clone(),
                            edge: idx,
                            vertex,
                        });
                    }
                }
            }
        }

        for stitch in &self.pattern.stitches {
            for side in &stitch.0 {
                self.check_edge(&side.panel, side.edge)?;
            }
        }

        // Influences of invalidated values may name panels that were since
        // replaced; they are only resolved once values are applied again.
        let realized = self.has_realized_values();
        for name in &self.parameter_order {
            let parameter = self
                .parameters
                .get(name)
                .ok_or_else(|| PatternError::UnknownParameter(name.clone()))?;
            if parameter.value.is_some() {
                let extends = !matches!(parameter.kind, ParameterKind::Curve);
                self.check_influences(&parameter.influence, extends)?;
            }
        }

        if let Some(constraints) = &self.constraints {
            for name in self.constraint_sequence() {
                let constraint = constraints
                    .get(&name)
                    .ok_or_else(|| PatternError::UnknownConstraint(name.clone()))?;
                if realized {
                    self.check_influences(&constraint.influence, true)?;
                }
            }
        }
        Ok(())
    }

    /// False once a direct geometry update has cleared every parameter and
    /// constraint value.
    fn has_realized_values(&self) -> bool {
        let params = self.parameters.values().any(|p| p.value.is_some());
        let constraints = self
            .constraints
            .iter()
            .flat_map(|c| c.values())
            .flat_map(|c| &c.influence)
            .flat_map(|i| &i.edge_list)
            .any(|e| e.value.is_some());
        params || constraints || self.parameters.is_empty()
    }

    fn check_edge(&self, panel: &str, edge: usize) -> Result<(), PatternError> {
        if edge >= self.panel(panel)?.edges.len() {
            return Err(PatternError::EdgeOutOfRange {
                panel: panel.to_string(),
                edge,
            });
        }
        Ok(())
    }

    fn check_influences(&self, influences: &[Influence], extends: bool) -> Result<(), PatternError> {
        for influence in influences {
            for edge in &influence.edge_list {
                for id in edge.id.ids() {
                    self.check_edge(&influence.panel, *id)?;
                }
                if extends && edge.direction.is_none() {
                    return Err(PatternError::MissingDirection {
                        panel: influence.panel.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
