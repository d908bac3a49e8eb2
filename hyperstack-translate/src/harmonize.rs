//! Post-construction harmonizers.
//!
//! Once the legacy skeleton exists the creator runs, in order: the pixel
//! harmonizer (eager stacks only), the metadata harmonizer, then the
//! position and name harmonizers when a display is given.

use crate::calibration::{needs_signed_offset, SIGNED_16_OFFSET};
use crate::error::Result;
use crate::image::LegacyImage;
use crate::plane::Plane;
use crate::shape::{AxisIndices, StackPosition};
use crate::virtual_stack::merged_pixel;
use hyperstack_core::GenericImage;
use rayon::prelude::*;

/// Display state a legacy image is synchronized with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayContext {
    /// Window title.
    pub title: String,
    /// Current (channel, slice, frame).
    pub position: StackPosition,
}

impl DisplayContext {
    /// Creates a display context.
    #[must_use]
    pub fn new(title: impl Into<String>, position: StackPosition) -> Self {
        Self {
            title: title.into(),
            position,
        }
    }
}

/// Fills the pixel planes of a freshly built image.
pub trait PixelHarmonizer: Send + Sync {
    /// Copies pixel values from `source` into `target`.
    ///
    /// # Errors
    /// Returns an error if a source read fails.
    fn copy_values(&self, source: &dyn GenericImage, target: &mut LegacyImage) -> Result<()>;
}

/// Copies non-pixel, non-calibration metadata.
pub trait MetadataHarmonizer: Send + Sync {
    /// Copies metadata from `source` into `target`.
    fn copy_metadata(&self, source: &dyn GenericImage, target: &mut LegacyImage);
}

/// Synchronizes the current plane with a display.
pub trait PositionHarmonizer: Send + Sync {
    /// Copies the display position into `target`.
    fn copy_position(&self, display: &DisplayContext, target: &mut LegacyImage);
}

/// Synchronizes the title with a display.
pub trait NameHarmonizer: Send + Sync {
    /// Copies the display title into `target`.
    fn copy_name(&self, display: &DisplayContext, target: &mut LegacyImage);
}

/// Copies source samples into eager planes.
///
/// Gray planes get the sample clamped to their range (signed 16-bit data is
/// shifted by +32768 first); RGB planes get channel triplets packed as ARGB.
/// Virtual stacks are left alone.
#[derive(Debug, Clone, Copy)]
pub struct StackPixelHarmonizer {
    parallel: bool,
}

impl Default for StackPixelHarmonizer {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl StackPixelHarmonizer {
    /// Creates a harmonizer; `parallel` copies planes on the rayon pool.
    #[must_use]
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }
}

impl PixelHarmonizer for StackPixelHarmonizer {
    fn copy_values(&self, source: &dyn GenericImage, target: &mut LegacyImage) -> Result<()> {
        let shape = *target.shape();
        let Some(stack) = target.stack_mut().as_eager_mut() else {
            return Ok(());
        };

        let indices = AxisIndices::locate(source)?;
        let storage = source.pixels();
        let offset = if needs_signed_offset(source.pixel_type()) {
            SIGNED_16_OFFSET
        } else {
            0.0
        };

        let fill = |(index, plane): (usize, &mut Plane)| -> Result<()> {
            let position = shape.position_of(index);
            let mut scratch = vec![0usize; indices.rank];
            for y in 0..shape.height() {
                for x in 0..shape.width() {
                    let i = y * shape.width() + x;
                    if let Some(pixels) = plane.as_rgb_mut() {
                        pixels[i] = merged_pixel(
                            storage.as_ref(),
                            &indices,
                            &mut scratch,
                            x,
                            y,
                            position,
                        )?;
                    } else {
                        indices.fill_position(
                            &mut scratch,
                            x,
                            y,
                            position.channel,
                            position.slice,
                            position.frame,
                        );
                        plane.set_value(i, storage.get(&scratch)? + offset);
                    }
                }
            }
            Ok(())
        };

        if self.parallel {
            stack.planes_mut().par_iter_mut().enumerate().try_for_each(fill)
        } else {
            stack.planes_mut().iter_mut().enumerate().try_for_each(fill)
        }
    }
}

/// Copies dataset properties into the image property map.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyMetadataHarmonizer;

impl MetadataHarmonizer for PropertyMetadataHarmonizer {
    fn copy_metadata(&self, source: &dyn GenericImage, target: &mut LegacyImage) {
        target.properties_mut().extend(
            source
                .properties()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }
}

/// Moves the image to the display position.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayPositionHarmonizer;

impl PositionHarmonizer for DisplayPositionHarmonizer {
    fn copy_position(&self, display: &DisplayContext, target: &mut LegacyImage) {
        target.set_position(display.position);
    }
}

/// Uses the display title as image title.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayNameHarmonizer;

impl NameHarmonizer for DisplayNameHarmonizer {
    fn copy_name(&self, display: &DisplayContext, target: &mut LegacyImage) {
        target.set_title(display.title.clone());
    }
}
