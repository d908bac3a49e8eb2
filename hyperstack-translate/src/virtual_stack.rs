//! Virtual stack that merges RGB channel triplets on read.
//!
//! Used for chunked sources: every plane read fetches the three source
//! channel planes at the requested (c, z, t) and packs them into ARGB,
//! so the merged image never exists in memory as a whole.

use crate::color::{pack_argb, to_component, RGB_COMPONENTS};
use crate::error::{Error, Result};
use crate::shape::{AxisIndices, LegacyShape, StackPosition};
use hyperstack_core::{GenericImage, PixelStorage};
use log::trace;
use rayon::prelude::*;
use std::sync::Arc;

/// Reads merged channel `position.channel` of pixel `(x, y)` as ARGB.
///
/// `scratch` must have length `indices.rank`; entries for axes the legacy
/// layout does not know are left untouched.
pub(crate) fn merged_pixel(
    storage: &dyn PixelStorage,
    indices: &AxisIndices,
    scratch: &mut [usize],
    x: usize,
    y: usize,
    position: StackPosition,
) -> Result<u32> {
    let mut rgb = [0u8; RGB_COMPONENTS];
    for (component, slot) in rgb.iter_mut().enumerate() {
        indices.fill_position(
            scratch,
            x,
            y,
            position.channel * RGB_COMPONENTS + component,
            position.slice,
            position.frame,
        );
        *slot = to_component(storage.get(scratch)?);
    }
    Ok(pack_argb(rgb[0], rgb[1], rgb[2]))
}

/// Lazily merged ARGB stack over chunked storage.
///
/// Holds no per-read state; concurrent reads are safe as long as the
/// underlying storage is.
#[derive(Debug, Clone)]
pub struct MergedRgbVirtualStack {
    storage: Arc<dyn PixelStorage>,
    indices: AxisIndices,
    shape: LegacyShape,
}

impl MergedRgbVirtualStack {
    /// Creates the view. `shape` is the merged shape (channels already / 3).
    ///
    /// # Errors
    /// Returns an error if `image` has no X or Y axis.
    pub fn new(image: &dyn GenericImage, shape: LegacyShape) -> Result<Self> {
        Ok(Self {
            storage: image.pixels(),
            indices: AxisIndices::locate(image)?,
            shape,
        })
    }

    /// Plane width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.shape.width()
    }

    /// Plane height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.shape.height()
    }

    /// Number of planes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape.plane_count()
    }

    /// Returns true if the stack has no planes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Computes plane `index` (zero-based) as packed ARGB, row by row.
    ///
    /// # Errors
    /// Returns [`Error::PlaneIndex`] for an index past the end, or the
    /// storage error if a source read fails.
    pub fn read_plane(&self, index: usize) -> Result<Vec<u32>> {
        if index >= self.len() {
            return Err(Error::PlaneIndex {
                index,
                len: self.len(),
            });
        }
        let position = self.shape.position_of(index);
        trace!("virtual read of plane {index} at {position:?}");

        let width = self.shape.width();
        let mut pixels = vec![0u32; self.shape.plane_len()];
        pixels
            .par_chunks_mut(width)
            .enumerate()
            .try_for_each(|(y, row)| {
                let mut scratch = vec![0usize; self.indices.rank];
                for (x, pixel) in row.iter_mut().enumerate() {
                    *pixel = merged_pixel(
                        self.storage.as_ref(),
                        &self.indices,
                        &mut scratch,
                        x,
                        y,
                        position,
                    )?;
                }
                Ok::<(), Error>(())
            })?;
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::unpack_rgb;
    use hyperstack_core::{Axis, AxisKind, CellStorage, Dataset, PixelType};

    // Component value encodes (x, y, channel, z) so reads can be checked.
    fn sample(pos: &[usize]) -> f64 {
        let (x, y, c, z) = (pos[0], pos[1], pos[2], pos[3]);
        #[allow(clippy::cast_precision_loss)]
        let v = (x + 4 * y + 16 * c + 100 * z) as f64;
        v.min(255.0)
    }

    fn chunked(channels: usize, slices: usize) -> Dataset {
        let dims = [4, 3, channels, slices];
        let cells = CellStorage::from_fn(&dims, &[2, 2, 1, 1], sample).unwrap();
        Dataset::builder("chunked", Arc::new(cells))
            .axis(Axis::new(AxisKind::X, 4))
            .axis(Axis::new(AxisKind::Y, 3))
            .axis(Axis::new(AxisKind::Channel, channels))
            .axis(Axis::new(AxisKind::Z, slices))
            .pixel_type(PixelType::U8)
            .rgb_merged(true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_read_plane_packs_channel_triplets() {
        let ds = chunked(6, 2);
        let shape = LegacyShape::new(4, 3, 2, 2, 1);
        let stack = MergedRgbVirtualStack::new(&ds, shape).unwrap();
        assert_eq!(stack.len(), 4);

        // Plane 3 = merged channel 1, slice 1: source channels 3, 4, 5.
        let plane = stack.read_plane(3).unwrap();
        assert_eq!(plane.len(), 12);
        let (r, g, b) = unpack_rgb(plane[1 + 4 * 2]);
        assert_eq!((r, g, b), (157, 173, 189));
        assert_eq!(plane[0] >> 24, 0xFF);
    }

    #[test]
    fn test_reads_are_repeatable_and_stateless() {
        let ds = chunked(3, 2);
        let stack = MergedRgbVirtualStack::new(&ds, LegacyShape::new(4, 3, 1, 2, 1)).unwrap();
        let first = stack.read_plane(1).unwrap();
        let other = stack.read_plane(0).unwrap();
        assert_ne!(first, other);
        assert_eq!(stack.read_plane(1).unwrap(), first);
    }

    #[test]
    fn test_concurrent_reads() {
        let ds = chunked(3, 4);
        let stack = MergedRgbVirtualStack::new(&ds, LegacyShape::new(4, 3, 1, 4, 1)).unwrap();
        let sequential: Vec<_> = (0..4).map(|i| stack.read_plane(i).unwrap()).collect();
        let parallel: Vec<_> = (0..4)
            .into_par_iter()
            .map(|i| stack.read_plane(i).unwrap())
            .collect();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_index_out_of_range() {
        let ds = chunked(3, 1);
        let stack = MergedRgbVirtualStack::new(&ds, LegacyShape::new(4, 3, 1, 1, 1)).unwrap();
        assert!(matches!(
            stack.read_plane(1),
            Err(Error::PlaneIndex { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_zero_width_request_reads_one_column() {
        let ds = chunked(3, 1);
        let stack = MergedRgbVirtualStack::new(&ds, LegacyShape::new(0, 3, 1, 1, 1)).unwrap();
        assert_eq!(stack.width(), 1);
        assert_eq!(stack.read_plane(0).unwrap().len(), 3);
    }
}
