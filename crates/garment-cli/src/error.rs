use std::fmt;

use garment_pattern::PatternError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// CLI usage error (missing args, invalid flags).
    Usage = 1,
    /// Input error (missing file, malformed JSON/YAML, etc.).
    Input = 2,
    /// Processing error (geometry or parametric failure).
    Processing = 3,
}

#[derive(Debug)]
pub struct CliError {
    pub code: ErrorCode,
    pub message: String,
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Usage,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Input,
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Processing,
            message: message.into(),
        }
    }
}

impl From<PatternError> for CliError {
    fn from(err: PatternError) -> Self {
        match err {
            PatternError::Io { .. } | PatternError::Json(_) | PatternError::NoSourceFile => {
                Self::input(err.to_string())
            }
            // dangling references are problems of the document, not of processing
            PatternError::UnknownPanel(_)
            | PatternError::UnknownParameter(_)
            | PatternError::UnknownConstraint(_)
            | PatternError::EdgeOutOfRange { .. }
            | PatternError::VertexOutOfRange { .. }
            | PatternError::MissingDirection { .. } => Self::input(err.to_string()),
            _ => Self::processing(err.to_string()),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
