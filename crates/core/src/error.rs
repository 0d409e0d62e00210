//! Error types for voxkit

use thiserror::Error;

/// Main error type for voxkit operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid grid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Index out of bounds: {index:?} in grid of extent {extents:?}")]
    OutOfBounds {
        index: Vec<usize>,
        extents: Vec<usize>,
    },

    #[error("Grid shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Invalid radius {radius:?}: every radius must be non-negative")]
    InvalidRadius { radius: Vec<i64> },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate intensity range: every sample equals {value}")]
    DegenerateRange { value: f64 },

    #[error("Invalid crop: removing {amount} voxels from both sides of axis {axis} (extent {extent})")]
    InvalidCrop {
        axis: usize,
        amount: i64,
        extent: usize,
    },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cancelled after {iteration} iterations")]
    Cancelled { iteration: usize },

    #[error("Stage {index} ({operation}) failed: {source}")]
    Stage {
        index: usize,
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Innermost error, looking through `Stage` wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for voxkit operations
pub type Result<T> = std::result::Result<T, Error>;
