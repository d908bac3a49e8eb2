//! The legacy image container and its composite wrapper.

use crate::calibration::Calibration;
use crate::descriptor::FileDescriptor;
use crate::error::{Error, Result};
use crate::shape::{LegacyShape, StackPosition};
use crate::stack::Stack;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A legacy 5D image: one linear stack plus calibration and file info.
#[derive(Debug, Clone)]
pub struct LegacyImage {
    title: String,
    shape: LegacyShape,
    stack: Stack,
    calibration: Calibration,
    file_descriptor: Option<FileDescriptor>,
    open_as_hyperstack: bool,
    position: StackPosition,
    properties: BTreeMap<String, String>,
}

impl LegacyImage {
    /// Creates an image over `stack`.
    ///
    /// # Errors
    /// Returns [`Error::StackLayout`] unless the stack has exactly
    /// `shape.plane_count()` planes of `shape.width()` x `shape.height()`.
    pub fn new(title: impl Into<String>, shape: LegacyShape, stack: Stack) -> Result<Self> {
        if stack.len() != shape.plane_count()
            || stack.width() != shape.width()
            || stack.height() != shape.height()
        {
            return Err(Error::StackLayout {
                expected: shape.plane_count(),
                width: shape.width(),
                height: shape.height(),
                actual: stack.len(),
                actual_width: stack.width(),
                actual_height: stack.height(),
            });
        }
        Ok(Self {
            title: title.into(),
            shape,
            open_as_hyperstack: shape.is_hyperstack(),
            stack,
            calibration: Calibration::default(),
            file_descriptor: None,
            position: StackPosition::default(),
            properties: BTreeMap::new(),
        })
    }

    /// Window title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Sets the window title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// The 5D shape.
    #[must_use]
    pub fn shape(&self) -> &LegacyShape {
        &self.shape
    }

    /// The pixel stack.
    #[must_use]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Mutable pixel stack.
    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    /// Spatial, temporal and value calibration.
    #[must_use]
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Replaces the calibration.
    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = calibration;
    }

    /// Attached file descriptor, if any.
    #[must_use]
    pub fn file_descriptor(&self) -> Option<&FileDescriptor> {
        self.file_descriptor.as_ref()
    }

    /// Attaches a file descriptor.
    pub fn set_file_descriptor(&mut self, descriptor: FileDescriptor) {
        self.file_descriptor = Some(descriptor);
    }

    /// True when the image should open as a hyperstack.
    #[must_use]
    pub fn open_as_hyperstack(&self) -> bool {
        self.open_as_hyperstack
    }

    /// Current (channel, slice, frame).
    #[must_use]
    pub fn position(&self) -> StackPosition {
        self.position
    }

    /// Moves to `position`, clamped into the shape.
    pub fn set_position(&mut self, position: StackPosition) {
        self.position = self.shape.clamp(position);
    }

    /// Linear index of the current plane.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.shape.stack_index(self.position)
    }

    /// Free-form metadata.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Mutable free-form metadata.
    pub fn properties_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.properties
    }
}

/// Display mode of a composite image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CompositeMode {
    /// All channels overlaid.
    #[default]
    Composite,
    /// One channel at a time, in its LUT color.
    Color,
    /// One channel at a time, in gray.
    Grayscale,
}

/// Channel lookup table color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LutColor {
    Red,
    Green,
    Blue,
    Gray,
    Cyan,
    Magenta,
    Yellow,
}

impl LutColor {
    const CYCLE: [LutColor; 7] = [
        LutColor::Red,
        LutColor::Green,
        LutColor::Blue,
        LutColor::Gray,
        LutColor::Cyan,
        LutColor::Magenta,
        LutColor::Yellow,
    ];

    /// Default color of channel `channel`.
    #[must_use]
    pub fn for_channel(channel: usize) -> Self {
        Self::CYCLE[channel % Self::CYCLE.len()]
    }
}

/// Multi-channel presentation wrapper.
#[derive(Debug, Clone)]
pub struct CompositeImage {
    image: LegacyImage,
    mode: CompositeMode,
    channel_luts: Vec<LutColor>,
}

impl CompositeImage {
    /// Wraps `image`, assigning one LUT per channel.
    #[must_use]
    pub fn new(image: LegacyImage, mode: CompositeMode) -> Self {
        let channel_luts = (0..image.shape().channels())
            .map(LutColor::for_channel)
            .collect();
        Self {
            image,
            mode,
            channel_luts,
        }
    }

    /// Display mode.
    #[must_use]
    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    /// Per-channel LUT colors.
    #[must_use]
    pub fn channel_luts(&self) -> &[LutColor] {
        &self.channel_luts
    }
}

/// The result of a translation: a plain image or a composite.
#[derive(Debug, Clone)]
pub enum LegacyContainer {
    Plain(LegacyImage),
    Composite(CompositeImage),
}

impl LegacyContainer {
    /// The wrapped image.
    #[must_use]
    pub fn image(&self) -> &LegacyImage {
        match self {
            Self::Plain(image) => image,
            Self::Composite(composite) => &composite.image,
        }
    }

    /// The wrapped image, mutably.
    pub fn image_mut(&mut self) -> &mut LegacyImage {
        match self {
            Self::Plain(image) => image,
            Self::Composite(composite) => &mut composite.image,
        }
    }

    /// Unwraps into the image.
    #[must_use]
    pub fn into_image(self) -> LegacyImage {
        match self {
            Self::Plain(image) => image,
            Self::Composite(composite) => composite.image,
        }
    }

    /// True for a composite.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    /// The composite wrapper, if any.
    #[must_use]
    pub fn as_composite(&self) -> Option<&CompositeImage> {
        match self {
            Self::Plain(_) => None,
            Self::Composite(composite) => Some(composite),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::PlaneKind;
    use crate::stack::ImageStack;

    fn image(c: usize, z: usize, t: usize) -> LegacyImage {
        let shape = LegacyShape::new(4, 2, c, z, t);
        let stack = Stack::Eager(ImageStack::zeroed(4, 2, shape.plane_count(), PlaneKind::Gray8));
        LegacyImage::new("img", shape, stack).unwrap()
    }

    #[test]
    fn test_stack_layout_checked() {
        let shape = LegacyShape::new(4, 2, 1, 3, 1);
        let short = Stack::Eager(ImageStack::zeroed(4, 2, 2, PlaneKind::Gray8));
        assert!(matches!(
            LegacyImage::new("x", shape, short),
            Err(Error::StackLayout { expected: 3, actual: 2, .. })
        ));
        let narrow = Stack::Eager(ImageStack::zeroed(3, 2, 3, PlaneKind::Gray8));
        assert!(LegacyImage::new("x", shape, narrow).is_err());
    }

    #[test]
    fn test_hyperstack_flag() {
        assert!(!image(1, 5, 1).open_as_hyperstack());
        assert!(image(2, 5, 1).open_as_hyperstack());
    }

    #[test]
    fn test_position_is_clamped() {
        let mut img = image(2, 3, 2);
        img.set_position(StackPosition::new(1, 7, 1));
        assert_eq!(img.position(), StackPosition::new(1, 2, 1));
        assert_eq!(img.current_index(), 11);
    }

    #[test]
    fn test_composite_luts_cycle() {
        let composite = CompositeImage::new(image(9, 2, 1), CompositeMode::Composite);
        assert_eq!(composite.channel_luts().len(), 9);
        assert_eq!(composite.channel_luts()[0], LutColor::Red);
        assert_eq!(composite.channel_luts()[7], LutColor::Red);
        assert_eq!(composite.channel_luts()[8], LutColor::Green);

        let container = LegacyContainer::Composite(composite);
        assert!(container.is_composite());
        assert_eq!(container.image().shape().channels(), 9);
        assert_eq!(container.into_image().title(), "img");
    }
}
