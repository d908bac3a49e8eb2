//! hyperstack-translate: Legacy 5D image creation from N-dimensional datasets.
//!
//! This crate maps a [`GenericImage`](hyperstack_core::GenericImage) with
//! arbitrary axis order onto the fixed (x, y, c, z, t) layout of a legacy
//! image stack:
//! - **Shape** - axis lookup by kind and stack addressing
//! - **Stack** - eager zero-filled planes, or a virtual stack that merges
//!   RGB channel triplets on read for chunked storage
//! - **Calibration** - pixel size, units and frame interval, mirrored into
//!   the file descriptor
//! - **Creator** - the pipeline tying these together, followed by the
//!   pixel, metadata, position and name harmonizers
//!

pub mod calibration;
pub mod color;
mod config;
mod creator;
pub mod descriptor;
mod error;
pub mod harmonize;
mod image;
pub mod plane;
pub mod shape;
pub mod stack;
mod virtual_stack;

pub use calibration::{populate_calibration, Calibration, CalibrationFunction, ValueCalibration};
pub use color::ColorMergeStrategy;
pub use config::TranslationConfig;
pub use creator::LegacyImageCreator;
pub use descriptor::{FileDescriptor, FileType, Origin, OriginResolutionWarning};
pub use error::{ColorCompatibilityError, Error, Result, ShapeError};
pub use harmonize::{
    DisplayContext, MetadataHarmonizer, NameHarmonizer, PixelHarmonizer, PositionHarmonizer,
};
pub use image::{CompositeImage, CompositeMode, LegacyContainer, LegacyImage, LutColor};
pub use plane::{Plane, PlaneKind};
pub use shape::{resolve_shape, AxisIndices, LegacyShape, StackPosition};
pub use stack::{build_stack, build_stack_with, ImageStack, Stack};
pub use virtual_stack::MergedRgbVirtualStack;
