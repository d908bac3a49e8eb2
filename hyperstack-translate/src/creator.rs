//! Creation of legacy images from generic datasets.

use crate::calibration::populate_calibration;
use crate::color::{merged_shape, ColorMergeStrategy};
use crate::config::TranslationConfig;
use crate::descriptor::{resolve_origin, FileDescriptor, FileType, Origin};
use crate::error::Result;
use crate::harmonize::{
    DisplayContext, DisplayNameHarmonizer, DisplayPositionHarmonizer, MetadataHarmonizer,
    NameHarmonizer, PixelHarmonizer, PositionHarmonizer, PropertyMetadataHarmonizer,
    StackPixelHarmonizer,
};
use crate::image::{CompositeImage, LegacyContainer, LegacyImage};
use crate::shape::resolve_shape;
use crate::stack::build_stack_with;
use hyperstack_core::GenericImage;
use log::{debug, warn};

/// Builds legacy images from datasets.
///
/// The creator holds no per-call state; the same instance can translate
/// any number of datasets.
pub struct LegacyImageCreator {
    config: TranslationConfig,
    pixels: Option<Box<dyn PixelHarmonizer>>,
    metadata: Option<Box<dyn MetadataHarmonizer>>,
    position: Box<dyn PositionHarmonizer>,
    name: Box<dyn NameHarmonizer>,
}

impl Default for LegacyImageCreator {
    fn default() -> Self {
        Self::new(TranslationConfig::default())
    }
}

impl LegacyImageCreator {
    /// Creates a creator with the default harmonizers.
    #[must_use]
    pub fn new(config: TranslationConfig) -> Self {
        Self {
            pixels: Some(Box::new(StackPixelHarmonizer::new(config.parallel_copy))),
            metadata: Some(Box::new(PropertyMetadataHarmonizer)),
            position: Box::new(DisplayPositionHarmonizer),
            name: Box::new(DisplayNameHarmonizer),
            config,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// Replaces the pixel harmonizer.
    #[must_use]
    pub fn with_pixel_harmonizer(mut self, harmonizer: impl PixelHarmonizer + 'static) -> Self {
        self.pixels = Some(Box::new(harmonizer));
        self
    }

    /// Replaces the metadata harmonizer.
    #[must_use]
    pub fn with_metadata_harmonizer(
        mut self,
        harmonizer: impl MetadataHarmonizer + 'static,
    ) -> Self {
        self.metadata = Some(Box::new(harmonizer));
        self
    }

    /// Replaces the position harmonizer.
    #[must_use]
    pub fn with_position_harmonizer(
        mut self,
        harmonizer: impl PositionHarmonizer + 'static,
    ) -> Self {
        self.position = Box::new(harmonizer);
        self
    }

    /// Replaces the name harmonizer.
    #[must_use]
    pub fn with_name_harmonizer(mut self, harmonizer: impl NameHarmonizer + 'static) -> Self {
        self.name = Box::new(harmonizer);
        self
    }

    /// Disables pixel and metadata harmonization; results keep zero-filled
    /// planes and an empty property map.
    #[must_use]
    pub fn skeleton_only(mut self) -> Self {
        self.pixels = None;
        self.metadata = None;
        self
    }

    /// Translates `dataset` into a legacy image.
    ///
    /// Returns `Ok(None)` when there is no dataset. With a display context
    /// the result also takes over the display position and title.
    ///
    /// # Errors
    /// Fails if the dataset has no X/Y plane, if it is declared RGB merged
    /// but cannot be merged, or if a pixel read fails.
    pub fn create_legacy_image(
        &self,
        dataset: Option<&dyn GenericImage>,
        display: Option<&DisplayContext>,
    ) -> Result<Option<LegacyContainer>> {
        let Some(dataset) = dataset else {
            debug!("no active dataset; nothing to translate");
            return Ok(None);
        };

        let mut container = self.create_skeleton(dataset)?;
        let image = container.image_mut();

        if let Some(pixels) = &self.pixels {
            if !image.stack().is_virtual() {
                pixels.copy_values(dataset, image)?;
            }
        }
        if let Some(metadata) = &self.metadata {
            metadata.copy_metadata(dataset, image);
        }
        if let Some(display) = display {
            self.position.copy_position(display, image);
            self.name.copy_name(display, image);
        }
        Ok(Some(container))
    }

    /// Builds the legacy container for `dataset` without running any
    /// harmonizer: planes are zero-filled unless the stack is virtual.
    ///
    /// # Errors
    /// See [`Self::create_legacy_image`].
    pub fn create_skeleton(&self, dataset: &dyn GenericImage) -> Result<LegacyContainer> {
        let merge = dataset.is_rgb_merged();
        let strategy = ColorMergeStrategy::select(
            merge,
            self.config.allow_virtual && dataset.is_chunked_storage(),
        );

        let mut shape = resolve_shape(dataset)?;
        if merge {
            shape = merged_shape(dataset, shape)?;
        }
        debug!(
            "translating {} as {shape:?} with {strategy:?}",
            dataset.name()
        );

        let stack = build_stack_with(dataset, &shape, strategy)?;
        let is_virtual = stack.is_virtual();
        let mut image = LegacyImage::new(dataset.name(), shape, stack)?;

        let origin = resolve_origin(dataset.source(), self.config.resolve_local_origin)
            .unwrap_or_else(|warning| {
                warn!("{warning}");
                Origin::Unresolved
            });
        let mut descriptor = FileDescriptor::new(FileType::for_image(dataset), origin, &shape);
        descriptor.virtual_stack = is_virtual;
        descriptor.debug_info = dataset.summary();

        let calibration = populate_calibration(dataset, &shape)?;
        descriptor.mirror_calibration(&calibration);
        image.set_calibration(calibration);
        image.set_file_descriptor(descriptor);

        if shape.needs_composite() {
            Ok(LegacyContainer::Composite(CompositeImage::new(
                image,
                self.config.composite_mode,
            )))
        } else {
            Ok(LegacyContainer::Plain(image))
        }
    }
}
