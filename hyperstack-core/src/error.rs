//! Error types for hyperstack-core.

use thiserror::Error;

/// Result type alias for dataset operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or reading a dataset.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Two axes share the same label.
    #[error("duplicate axis: {0}")]
    DuplicateAxis(String),

    /// An axis was declared with zero extent.
    #[error("axis {0} has zero extent")]
    EmptyAxis(String),

    /// Storage dimensions disagree with the declared axes.
    #[error("dimension mismatch: axes {axes:?}, storage {storage:?}")]
    DimensionMismatch {
        axes: Vec<usize>,
        storage: Vec<usize>,
    },

    /// Cell grid definition is unusable.
    #[error("invalid cell size: {0:?}")]
    InvalidCellSize(Vec<usize>),

    /// A pixel position lies outside the storage bounds.
    #[error("position {position:?} out of bounds for dims {dims:?}")]
    PositionOutOfBounds {
        position: Vec<usize>,
        dims: Vec<usize>,
    },

    /// Sampled axis positions do not match the axis extent.
    #[error("axis {axis} has {samples} sampled positions for extent {extent}")]
    InvalidScale {
        axis: String,
        samples: usize,
        extent: usize,
    },
}
