//! hyperstack-core: Calibrated N-dimensional dataset model.
//!
//! This crate provides the generic image side of hyperstack translation:
//! named axes with physical calibration, pixel type tags, flat and chunked
//! pixel storage, and the [`GenericImage`] accessor trait.
//!

pub mod axis;
pub mod dataset;
pub mod error;
pub mod pixel;
pub mod storage;

pub use axis::{Axis, AxisCalibration, AxisKind};
pub use dataset::{Dataset, DatasetBuilder, GenericImage};
pub use error::{Error, Result};
pub use pixel::PixelType;
pub use storage::{ArrayStorage, CellStorage, PixelStorage};
