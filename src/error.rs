use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MotifError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed matrix: {0}")]
    MalformedMatrix(String),

    #[error("Invalid sequence at position {position}: unexpected symbol {symbol:?}")]
    InvalidSequence { position: usize, symbol: char },

    #[error("Length mismatch: window has {found} bases, motif has {expected} columns")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Position {position} out of range [1, {length}]")]
    OutOfRange { position: usize, length: usize },

    #[error("Invalid information content threshold {0}, expected a value in [0, 2]")]
    InvalidThreshold(f64),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Invalid parameter: {name} = {value}, {message}")]
    InvalidParameter {
        name: String,
        value: String,
        message: String,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Failed to score {motif} on {sequence} at {start}: {source}")]
    Window {
        sequence: String,
        motif: String,
        start: usize,
        #[source]
        source: Box<MotifError>,
    },
}

/// Type alias for Result with MotifError
pub type Result<T> = std::result::Result<T, MotifError>;

impl MotifError {
    /// Create a new InvalidSequence error
    pub fn invalid_sequence(position: usize, symbol: char) -> Self {
        MotifError::InvalidSequence { position, symbol }
    }

    /// Create a new MalformedMatrix error
    pub fn malformed_matrix(message: impl Into<String>) -> Self {
        MotifError::MalformedMatrix(message.into())
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

    /// Attach scan context to an error raised while scoring one window
    pub fn in_window(
        self,
        sequence: impl Into<String>,
        motif: impl Into<String>,
        start: usize,
    ) -> Self {
        MotifError::Window {
            sequence: sequence.into(),
            motif: motif.into(),
            start,
            source: Box::new(self),
        }
    }
}

impl From<polars::prelude::PolarsError> for MotifError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        MotifError::DataError(e.to_string())
    }
}
