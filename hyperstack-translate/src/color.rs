//! RGB merge checks and strategy selection.

use crate::error::ColorCompatibilityError;
use crate::shape::LegacyShape;
use hyperstack_core::{AxisKind, GenericImage, PixelType};

/// Components per merged color pixel.
pub const RGB_COMPONENTS: usize = 3;

/// How color channels are handled for one translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMergeStrategy {
    /// Grayscale: every source channel becomes its own plane.
    None,
    /// Channel triplets are packed into ARGB planes allocated up front.
    EagerMerge,
    /// Channel triplets are packed on read by a virtual stack.
    LazyMerge,
}

impl ColorMergeStrategy {
    /// Picks the strategy from the merge flag and the storage capability.
    ///
    /// Only chunked storage goes lazy; flat storage is always copied.
    #[must_use]
    pub fn select(color_merge: bool, chunked: bool) -> Self {
        match (color_merge, chunked) {
            (false, _) => Self::None,
            (true, true) => Self::LazyMerge,
            (true, false) => Self::EagerMerge,
        }
    }

    /// True for both merge strategies.
    #[must_use]
    pub fn is_merge(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Checks that `image` can be color merged and returns its channel extent.
///
/// # Errors
/// Fails if there is no channel axis, the channel extent is not a multiple
/// of 3, or the pixel type is not unsigned 8-bit.
pub fn check_color_compatible(image: &dyn GenericImage) -> Result<usize, ColorCompatibilityError> {
    let channel = image
        .axis_index(&AxisKind::Channel)
        .ok_or(ColorCompatibilityError::MissingChannelAxis)?;
    let extent = image.axis_extent(channel);
    if extent % RGB_COMPONENTS != 0 {
        return Err(ColorCompatibilityError::ChannelExtent(extent));
    }
    let pixel_type = image.pixel_type();
    if pixel_type != PixelType::U8 {
        return Err(ColorCompatibilityError::PixelType(pixel_type));
    }
    Ok(extent)
}

/// Collapses the channel count of `shape` by 3 for a merged image.
///
/// # Errors
/// Fails under the same conditions as [`check_color_compatible`].
pub fn merged_shape(
    image: &dyn GenericImage,
    shape: LegacyShape,
) -> Result<LegacyShape, ColorCompatibilityError> {
    let extent = check_color_compatible(image)?;
    Ok(shape.with_channels(extent / RGB_COMPONENTS))
}

/// Packs 8-bit components into an opaque ARGB pixel.
#[inline]
#[must_use]
pub fn pack_argb(r: u8, g: u8, b: u8) -> u32 {
    0xFF00_0000 | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Splits an ARGB pixel into (r, g, b).
#[inline]
#[must_use]
pub fn unpack_rgb(argb: u32) -> (u8, u8, u8) {
    let [_, r, g, b] = argb.to_be_bytes();
    (r, g, b)
}

/// Clamps and rounds a sample into a byte.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_component(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
