//! Mapping of named dataset axes onto the legacy (x, y, c, z, t) layout.

use crate::error::ShapeError;
use hyperstack_core::{AxisKind, GenericImage};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Legacy 5D shape. Every count is at least 1.
///
/// Fields are private so that [`LegacyShape::new`] is the only way in; plane
/// addressing divides by these counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LegacyShape {
    width: usize,
    height: usize,
    channels: usize,
    slices: usize,
    frames: usize,
}

/// Zero-based (channel, slice, frame) coordinate of a stack plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StackPosition {
    pub channel: usize,
    pub slice: usize,
    pub frame: usize,
}

impl StackPosition {
    /// Creates a position.
    #[must_use]
    pub fn new(channel: usize, slice: usize, frame: usize) -> Self {
        Self {
            channel,
            slice,
            frame,
        }
    }
}

impl LegacyShape {
    /// Creates a shape, raising zero counts to 1.
    #[must_use]
    pub fn new(width: usize, height: usize, channels: usize, slices: usize, frames: usize) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            channels: channels.max(1),
            slices: slices.max(1),
            frames: frames.max(1),
        }
    }

    /// Plane width (X extent).
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Plane height (Y extent).
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Channel count.
    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Slice (Z) count.
    #[must_use]
    pub fn slices(&self) -> usize {
        self.slices
    }

    /// Frame (time) count.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Same shape with a different channel count (raised to 1 if zero).
    #[must_use]
    pub fn with_channels(&self, channels: usize) -> Self {
        Self::new(self.width, self.height, channels, self.slices, self.frames)
    }

    /// Number of planes in the linear stack.
    #[must_use]
    pub fn plane_count(&self) -> usize {
        self.channels * self.slices * self.frames
    }

    /// Pixels per plane.
    #[must_use]
    pub fn plane_len(&self) -> usize {
        self.width * self.height
    }

    /// Number of meaningful dimensions: the plane plus every c/z/t above 1.
    #[must_use]
    pub fn n_dimensions(&self) -> usize {
        2 + usize::from(self.channels > 1)
            + usize::from(self.slices > 1)
            + usize::from(self.frames > 1)
    }

    /// True when the image should open as a hyperstack.
    #[must_use]
    pub fn is_hyperstack(&self) -> bool {
        self.n_dimensions() > 3
    }

    /// True unless `(c == 1 || z == 1) && t == 1`.
    #[must_use]
    pub fn needs_composite(&self) -> bool {
        !((self.channels == 1 || self.slices == 1) && self.frames == 1)
    }

    /// Linear stack index; channel varies fastest, then slice, then frame.
    #[must_use]
    pub fn stack_index(&self, position: StackPosition) -> usize {
        (position.frame * self.slices + position.slice) * self.channels + position.channel
    }

    /// Inverse of [`Self::stack_index`].
    #[must_use]
    pub fn position_of(&self, index: usize) -> StackPosition {
        StackPosition {
            channel: index % self.channels,
            slice: (index / self.channels) % self.slices,
            frame: index / (self.channels * self.slices),
        }
    }

    /// Clamps a position into the shape.
    #[must_use]
    pub fn clamp(&self, position: StackPosition) -> StackPosition {
        StackPosition {
            channel: position.channel.min(self.channels - 1),
            slice: position.slice.min(self.slices - 1),
            frame: position.frame.min(self.frames - 1),
        }
    }
}

/// Storage indices of the axes the legacy layout understands.
///
/// Axes of any other kind stay at index 0 when addressing source pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisIndices {
    pub x: usize,
    pub y: usize,
    pub channel: Option<usize>,
    pub z: Option<usize>,
    pub time: Option<usize>,
    /// Source dimensionality.
    pub rank: usize,
}

impl AxisIndices {
    /// Locates the legacy axes of `image` by kind.
    ///
    /// # Errors
    /// Returns [`ShapeError::MissingSpatialAxis`] if X or Y is absent.
    pub fn locate(image: &dyn GenericImage) -> Result<Self, ShapeError> {
        let x = image
            .axis_index(&AxisKind::X)
            .ok_or(ShapeError::MissingSpatialAxis(AxisKind::X))?;
        let y = image
            .axis_index(&AxisKind::Y)
            .ok_or(ShapeError::MissingSpatialAxis(AxisKind::Y))?;
        Ok(Self {
            x,
            y,
            channel: image.axis_index(&AxisKind::Channel),
            z: image.axis_index(&AxisKind::Z),
            time: image.axis_index(&AxisKind::Time),
            rank: image.axes().len(),
        })
    }

    /// Writes the source position of pixel `(x, y)` at `(channel, z, t)`.
    ///
    /// `position` must have length [`Self::rank`]. Coordinates for absent
    /// axes are ignored.
    pub fn fill_position(
        &self,
        position: &mut [usize],
        x: usize,
        y: usize,
        channel: usize,
        slice: usize,
        frame: usize,
    ) {
        position[self.x] = x;
        position[self.y] = y;
        if let Some(c) = self.channel {
            position[c] = channel;
        }
        if let Some(z) = self.z {
            position[z] = slice;
        }
        if let Some(t) = self.time {
            position[t] = frame;
        }
    }
}

/// Resolves the legacy shape of `image` without any channel merging.
///
/// # Errors
/// Returns [`ShapeError::MissingSpatialAxis`] if X or Y is absent.
pub fn resolve_shape(image: &dyn GenericImage) -> Result<LegacyShape, ShapeError> {
    let indices = AxisIndices::locate(image)?;
    let extent = |index: Option<usize>| index.map_or(1, |i| image.axis_extent(i));
    Ok(LegacyShape::new(
        image.axis_extent(indices.x),
        image.axis_extent(indices.y),
        extent(indices.channel),
        extent(indices.z),
        extent(indices.time),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperstack_core::{ArrayStorage, Axis, Dataset};
    use std::sync::Arc;

    fn dataset(axes: &[(AxisKind, usize)]) -> Dataset {
        let dims: Vec<usize> = axes.iter().map(|(_, n)| *n).collect();
        axes.iter()
            .fold(
                Dataset::builder("shape", Arc::new(ArrayStorage::zeros(&dims))),
                |b, (kind, n)| b.axis(Axis::new(kind.clone(), *n)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_is_order_independent() {
        let a = dataset(&[
            (AxisKind::X, 7),
            (AxisKind::Y, 5),
            (AxisKind::Channel, 2),
            (AxisKind::Z, 3),
            (AxisKind::Time, 4),
        ]);
        let b = dataset(&[
            (AxisKind::Time, 4),
            (AxisKind::Z, 3),
            (AxisKind::Y, 5),
            (AxisKind::Channel, 2),
            (AxisKind::X, 7),
        ]);
        let expected = LegacyShape::new(7, 5, 2, 3, 4);
        assert_eq!(resolve_shape(&a).unwrap(), expected);
        assert_eq!(resolve_shape(&b).unwrap(), expected);
    }

    #[test]
    fn test_absent_axes_default_to_one() {
        let ds = dataset(&[(AxisKind::Y, 9), (AxisKind::X, 11)]);
        assert_eq!(resolve_shape(&ds).unwrap(), LegacyShape::new(11, 9, 1, 1, 1));
    }

    #[test]
    fn test_other_axes_do_not_contribute() {
        let ds = dataset(&[
            (AxisKind::X, 4),
            (AxisKind::Y, 4),
            (AxisKind::Other("Lifetime".into()), 6),
        ]);
        assert_eq!(resolve_shape(&ds).unwrap().plane_count(), 1);
    }

    #[test]
    fn test_missing_spatial_axis() {
        let ds = dataset(&[(AxisKind::X, 4), (AxisKind::Z, 4)]);
        assert_eq!(
            resolve_shape(&ds),
            Err(ShapeError::MissingSpatialAxis(AxisKind::Y))
        );
        let ds = dataset(&[(AxisKind::Y, 4)]);
        assert_eq!(
            resolve_shape(&ds),
            Err(ShapeError::MissingSpatialAxis(AxisKind::X))
        );
    }

    #[test]
    fn test_stack_index_round_trip() {
        let shape = LegacyShape::new(2, 2, 3, 4, 5);
        assert_eq!(shape.plane_count(), 60);
        assert_eq!(shape.stack_index(StackPosition::new(1, 0, 0)), 1);
        assert_eq!(shape.stack_index(StackPosition::new(0, 1, 0)), 3);
        assert_eq!(shape.stack_index(StackPosition::new(0, 0, 1)), 12);
        for index in 0..shape.plane_count() {
            assert_eq!(shape.stack_index(shape.position_of(index)), index);
        }
    }

    #[test]
    fn test_dimension_counting() {
        assert_eq!(LegacyShape::new(8, 8, 1, 1, 1).n_dimensions(), 2);
        assert!(!LegacyShape::new(8, 8, 1, 5, 1).is_hyperstack());
        assert!(LegacyShape::new(8, 8, 3, 5, 1).is_hyperstack());
        assert!(LegacyShape::new(8, 8, 1, 5, 7).is_hyperstack());
    }

    #[test]
    fn test_composite_rule() {
        assert!(!LegacyShape::new(8, 8, 1, 5, 1).needs_composite());
        assert!(LegacyShape::new(8, 8, 3, 5, 1).needs_composite());
        assert!(!LegacyShape::new(8, 8, 1, 1, 1).needs_composite());
        assert!(!LegacyShape::new(8, 8, 3, 1, 1).needs_composite());
        assert!(LegacyShape::new(8, 8, 1, 1, 4).needs_composite());
    }

    #[test]
    fn test_clamp() {
        let shape = LegacyShape::new(4, 4, 2, 3, 1);
        assert_eq!(
            shape.clamp(StackPosition::new(5, 1, 9)),
            StackPosition::new(1, 1, 0)
        );
    }

    #[test]
    fn test_zero_counts_are_raised() {
        let shape = LegacyShape::new(0, 4, 0, 0, 0);
        assert_eq!(shape.width(), 1);
        assert_eq!(shape.channels(), 1);
        assert_eq!(shape.plane_count(), 1);
        assert_eq!(shape.position_of(0), StackPosition::default());
        assert_eq!(
            shape.clamp(StackPosition::new(3, 3, 3)),
            StackPosition::default()
        );

        let shape = LegacyShape::new(4, 4, 3, 2, 1).with_channels(0);
        assert_eq!(shape.channels(), 1);
        assert_eq!(shape.position_of(1), StackPosition::new(0, 1, 0));
    }
}
