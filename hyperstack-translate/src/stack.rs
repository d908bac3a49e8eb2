//! Linear pixel stack of a legacy image and the builder that allocates it.

use crate::color::{check_color_compatible, ColorMergeStrategy, RGB_COMPONENTS};
use crate::error::{ColorCompatibilityError, Error, Result};
use crate::plane::{Plane, PlaneKind};
use crate::shape::LegacyShape;
use crate::virtual_stack::MergedRgbVirtualStack;
use hyperstack_core::GenericImage;
use log::debug;
use std::borrow::Cow;

/// Planes held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStack {
    width: usize,
    height: usize,
    planes: Vec<Plane>,
}

impl ImageStack {
    /// Allocates `count` zero-filled planes of the given kind.
    #[must_use]
    pub fn zeroed(width: usize, height: usize, count: usize, kind: PlaneKind) -> Self {
        let planes = (0..count).map(|_| kind.zeroed(width * height)).collect();
        Self {
            width,
            height,
            planes,
        }
    }

    /// Plane width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Plane height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of planes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// Returns true if the stack has no planes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// All planes in stack order.
    #[must_use]
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Mutable planes in stack order.
    pub fn planes_mut(&mut self) -> &mut [Plane] {
        &mut self.planes
    }
}

/// A legacy pixel stack, either materialized or computed on read.
#[derive(Debug, Clone)]
pub enum Stack {
    Eager(ImageStack),
    Virtual(MergedRgbVirtualStack),
}

impl Stack {
    /// Plane width.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Eager(s) => s.width(),
            Self::Virtual(s) => s.width(),
        }
    }

    /// Plane height.
    #[must_use]
    pub fn height(&self) -> usize {
        match self {
            Self::Eager(s) => s.height(),
            Self::Virtual(s) => s.height(),
        }
    }

    /// Number of planes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Eager(s) => s.len(),
            Self::Virtual(s) => s.len(),
        }
    }

    /// Returns true if the stack has no planes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for a virtual stack.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual(_))
    }

    /// Returns plane `index`, borrowed for eager stacks and computed for
    /// virtual ones.
    ///
    /// # Errors
    /// Returns [`Error::PlaneIndex`] past the end, or the read error of a
    /// virtual stack.
    pub fn plane(&self, index: usize) -> Result<Cow<'_, Plane>> {
        match self {
            Self::Eager(s) => s
                .planes
                .get(index)
                .map(Cow::Borrowed)
                .ok_or(Error::PlaneIndex {
                    index,
                    len: s.len(),
                }),
            Self::Virtual(s) => Ok(Cow::Owned(Plane::Rgb(s.read_plane(index)?))),
        }
    }

    /// The in-memory stack, if eager.
    pub fn as_eager_mut(&mut self) -> Option<&mut ImageStack> {
        match self {
            Self::Eager(s) => Some(s),
            Self::Virtual(_) => None,
        }
    }
}

/// Builds the stack for `image`.
///
/// With `color_merge` set, `shape.channels()` is the merged count and the
/// source channel axis must hold exactly three times as many channels.
/// The stack is virtual exactly when merging over chunked storage.
///
/// # Errors
/// Returns [`ColorCompatibilityError`] when merging is requested on an
/// incompatible source.
pub fn build_stack(
    image: &dyn GenericImage,
    shape: &LegacyShape,
    color_merge: bool,
) -> Result<Stack> {
    let strategy = ColorMergeStrategy::select(color_merge, image.is_chunked_storage());
    build_stack_with(image, shape, strategy)
}

/// Builds the stack for an already selected strategy.
///
/// Eager stacks come back zero-filled; values are copied by a pixel
/// harmonizer afterwards.
///
/// # Errors
/// See [`build_stack`].
pub fn build_stack_with(
    image: &dyn GenericImage,
    shape: &LegacyShape,
    strategy: ColorMergeStrategy,
) -> Result<Stack> {
    if strategy.is_merge() {
        let extent = check_color_compatible(image)?;
        if extent != shape.channels() * RGB_COMPONENTS {
            return Err(ColorCompatibilityError::ChannelMismatch {
                extent,
                channels: shape.channels(),
            }
            .into());
        }
    }

    let stack = match strategy {
        ColorMergeStrategy::LazyMerge => {
            Stack::Virtual(MergedRgbVirtualStack::new(image, *shape)?)
        }
        ColorMergeStrategy::EagerMerge => Stack::Eager(ImageStack::zeroed(
            shape.width(),
            shape.height(),
            shape.plane_count(),
            PlaneKind::Rgb,
        )),
        ColorMergeStrategy::None => Stack::Eager(ImageStack::zeroed(
            shape.width(),
            shape.height(),
            shape.plane_count(),
            PlaneKind::for_pixel_type(image.pixel_type()),
        )),
    };
    debug!(
        "built {} stack of {} planes ({}x{}) for {}",
        if stack.is_virtual() { "virtual" } else { "eager" },
        stack.len(),
        stack.width(),
        stack.height(),
        image.name()
    );
    Ok(stack)
}
