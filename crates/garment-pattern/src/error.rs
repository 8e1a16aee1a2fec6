use std::path::PathBuf;

use garment_geometry::GeometryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed pattern document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pattern is not connected to a file")]
    NoSourceFile,

    #[error("unknown panel \"{0}\"")]
    UnknownPanel(String),

    #[error("unknown parameter \"{0}\" in parameter order")]
    UnknownParameter(String),

    #[error("unknown constraint \"{0}\" in constraint order")]
    UnknownConstraint(String),

    #[error("panel \"{panel}\" has no edge {edge}")]
    EdgeOutOfRange { panel: String, edge: usize },

    #[error("panel \"{panel}\" edge {edge} references missing vertex {vertex}")]
    VertexOutOfRange {
        panel: String,
        edge: usize,
        vertex: usize,
    },

    #[error("panel \"{panel}\" has {edges} edges and cannot fit into length {pad_len}")]
    PanelTooLong {
        panel: String,
        edges: usize,
        pad_len: usize,
    },

    #[error("panel \"{0}\" has no edge starting at its canonical origin vertex")]
    NoOriginEdge(String),

    #[error("panel \"{0}\" has no vertices or edges")]
    EmptyPanel(String),

    #[error("extension line of panel \"{panel}\" is degenerate (zero length)")]
    DegenerateLine { panel: String },

    #[error("zero value encountered while inverting multiplicative {owner}")]
    ZeroInversion { owner: String },

    #[error("curve scaling targets straight edge {edge} of panel \"{panel}\"")]
    MissingCurvature { panel: String, edge: usize },

    #[error("edge extension in panel \"{panel}\" needs a direction")]
    MissingDirection { panel: String },

    #[error("parameter \"{parameter}\": {message}")]
    InvalidValue { parameter: String, message: String },

    #[error("parameter \"{parameter}\" has an invalid range: {message}")]
    InvalidRange { parameter: String, message: String },

    #[error("expected {expected} parameter values, got {got}")]
    ValueCountMismatch { expected: usize, got: usize },

    #[error("stitch index {index} is out of range for {panels} panels of {pad_len} edges")]
    StitchOutOfRange {
        index: usize,
        panels: usize,
        pad_len: usize,
    },

    #[error("recovering stitches from an unpadded edge tensor is not supported")]
    UnpaddedStitches,

    #[error("tensor shape mismatch: {0}")]
    Shape(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl PatternError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
