//! Translation error types.

use hyperstack_core::{AxisKind, PixelType};
use thiserror::Error;

/// Result type for translation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The source cannot be mapped onto a legacy plane.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// X or Y is absent; a legacy image always needs a 2D plane.
    #[error("dataset has no {0} axis")]
    MissingSpatialAxis(AxisKind),

    /// The image plane disagrees with the shape it is being calibrated for.
    #[error("plane {found_width}x{found_height} does not match shape {width}x{height}")]
    ShapeMismatch {
        width: usize,
        height: usize,
        found_width: usize,
        found_height: usize,
    },
}

/// Color merging was requested but the source cannot be merged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorCompatibilityError {
    /// Merged datasets need a channel axis.
    #[error("rgb merged dataset has no channel axis")]
    MissingChannelAxis,

    /// The channel extent cannot be split into RGB triplets.
    #[error("channel extent {0} is not a multiple of 3")]
    ChannelExtent(usize),

    /// The channel extent does not hold three components per merged channel.
    #[error("channel extent {extent} cannot back {channels} merged channels")]
    ChannelMismatch { extent: usize, channels: usize },

    /// Only unsigned 8-bit components can be packed into ARGB.
    #[error("pixel type {0} cannot be color merged (need uint8)")]
    PixelType(PixelType),
}

/// Translation errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Shape resolution failed.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// Color merge precondition failed.
    #[error(transparent)]
    ColorCompatibility(#[from] ColorCompatibilityError),

    /// Reading the source dataset failed.
    #[error("dataset error: {0}")]
    Core(#[from] hyperstack_core::Error),

    /// Plane index outside the stack.
    #[error("plane index {index} out of range for stack of {len}")]
    PlaneIndex { index: usize, len: usize },

    /// The stack does not cover the shape.
    #[error("stack holds {actual} planes of {actual_width}x{actual_height}, shape needs {expected} of {width}x{height}")]
    StackLayout {
        expected: usize,
        width: usize,
        height: usize,
        actual: usize,
        actual_width: usize,
        actual_height: usize,
    },
}
