//! Parametric sewing pattern specifications and their numeric encoding.

mod constraints;
pub mod error;
pub mod intersect;
mod normalize;
pub mod order;
pub mod panel_codec;
pub mod params;
pub mod pattern;
pub mod random;
pub mod spec;
mod tags;
pub mod tensors;

pub use error::PatternError;
pub use panel_codec::{
    decode_panel, encode_panel, loop_residual, DecodedPanel, EdgeVector, Padding, PanelNumeric,
    RotationFormat, PAD_TOLERANCE,
};
pub use pattern::{name_from_path, Pattern, Snapshot, STANDARD_FILENAMES};
pub use random::{RandomizeOutcome, MAX_ATTEMPTS};
pub use spec::{
    Constraint, ConstraintKind, Edge, EdgeInfluence, EdgeRef, ExtendDirection, Influence, Panel,
    ParamRange, ParamValue, Parameter, ParameterKind, PatternSpec, Properties, Stitch, StitchSide,
};
pub use tensors::{PatternTensors, TensorOptions};

pub use garment_geometry::RotationRepr;
