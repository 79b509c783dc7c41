use crate::types::MatrixKind;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MotifError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid sequence at position {position}: {message}")]
    InvalidSequence { position: usize, message: String },

    #[error("Invalid motif matrix: {0}")]
    InvalidMatrix(String),

    #[error("Invalid motif width {width}: {message}")]
    InvalidWidth { width: usize, message: String },

    #[error("Not valid motif ID")]
    InvalidIdentifier,

    #[error("Not valid motif name")]
    InvalidName,

    #[error("The motif is not built on DNA alphabet: {0}")]
    InvalidAlphabet(String),

    #[error("Invalid background distribution: {0}")]
    InvalidBackground(String),

    #[error("Expected {expected} for '{name}', got {found}")]
    InvalidType {
        name: String,
        expected: String,
        found: String,
    },

    #[error("Invalid parameter: {name} = {value}, {message}")]
    InvalidParameter {
        name: String,
        value: String,
        message: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Motif {0} has no score range: every window scores the same")]
    DegenerateMotif(String),

    #[error("{0}")]
    StateConflict(String),

    #[error("The MotifSet object is empty")]
    EmptySet,

    #[error("Not valid motif p-value matrix: {0}")]
    EmptyDistribution(String),

    #[error("The {0} matrix is not available for this motif")]
    MissingMatrix(MatrixKind),

    #[error("Unknown motif matrix: '{0}'")]
    UnknownMatrixKind(String),

    #[error("Data error: {0}")]
    DataError(String),
}

/// Broad classes of [`MotifError`], used by callers that react to the kind of
/// contract violation rather than to the individual failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgumentType,
    InvalidArgumentValue,
    StateConflict,
    EmptyCollection,
    UnknownSelector,
    Io,
    Data,
}

/// Type alias for Result with MotifError
pub type Result<T> = std::result::Result<T, MotifError>;

impl MotifError {
    /// Create a new InvalidSequence error
    pub fn invalid_sequence(position: usize, message: impl Into<String>) -> Self {
        MotifError::InvalidSequence {
            position,
            message: message.into(),
        }
    }

    /// Create a new InvalidMatrix error
    pub fn invalid_matrix(message: impl Into<String>) -> Self {
        MotifError::InvalidMatrix(message.into())
    }

    /// Create a new InvalidWidth error
    pub fn invalid_width(width: usize, message: impl Into<String>) -> Self {
        MotifError::InvalidWidth {
            width,
            message: message.into(),
        }
    }

    /// Create a new InvalidType error
    pub fn invalid_type(
        name: impl Into<String>,
        expected: impl Into<String>,
        found: impl ToString,
    ) -> Self {
        MotifError::InvalidType {
            name: name.into(),
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Create a new InvalidParameter error
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        MotifError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MotifError::InvalidType { .. } => ErrorKind::InvalidArgumentType,
            MotifError::InvalidSequence { .. }
            | MotifError::InvalidMatrix(_)
            | MotifError::InvalidWidth { .. }
            | MotifError::InvalidIdentifier
            | MotifError::InvalidName
            | MotifError::InvalidAlphabet(_)
            | MotifError::InvalidBackground(_)
            | MotifError::InvalidParameter { .. }
            | MotifError::InvalidInput(_)
            | MotifError::DegenerateMotif(_) => ErrorKind::InvalidArgumentValue,
            MotifError::StateConflict(_) => ErrorKind::StateConflict,
            MotifError::EmptySet
            | MotifError::EmptyDistribution(_)
            | MotifError::MissingMatrix(_) => ErrorKind::EmptyCollection,
            MotifError::UnknownMatrixKind(_) => ErrorKind::UnknownSelector,
            MotifError::Io(_) => ErrorKind::Io,
            MotifError::DataError(_) => ErrorKind::Data,
        }
    }
}
