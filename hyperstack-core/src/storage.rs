//! Pixel storage backends.
//!
//! Two layouts are provided: [`ArrayStorage`] keeps every sample in one flat
//! `ndarray` buffer, [`CellStorage`] splits the volume into a grid of
//! independently addressable cells. Both are read through [`PixelStorage`].

use crate::{Error, Result};
use ndarray::{ArrayD, Dimension, IxDyn};
use std::fmt;

/// Raw pixel accessor.
///
/// Positions are given in dataset axis order. Implementations must be safe
/// to read from several threads at once.
pub trait PixelStorage: Send + Sync + fmt::Debug {
    /// Extent of every dimension, in axis order.
    fn dims(&self) -> &[usize];

    /// Reads the sample at `position`.
    ///
    /// # Errors
    /// Returns [`Error::PositionOutOfBounds`] if the position has the wrong
    /// rank or lies outside the storage.
    fn get(&self, position: &[usize]) -> Result<f64>;

    /// True when the backing store is organized in addressable blocks.
    fn is_chunked(&self) -> bool {
        false
    }

    /// Total number of samples.
    fn len(&self) -> usize {
        self.dims().iter().product()
    }

    /// Returns true if the storage holds no samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn out_of_bounds(position: &[usize], dims: &[usize]) -> Error {
    Error::PositionOutOfBounds {
        position: position.to_vec(),
        dims: dims.to_vec(),
    }
}

fn check_position(position: &[usize], dims: &[usize]) -> Result<()> {
    if position.len() != dims.len() || position.iter().zip(dims).any(|(p, d)| p >= d) {
        return Err(out_of_bounds(position, dims));
    }
    Ok(())
}

/// Flat, random-access storage backed by a single `ndarray` buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayStorage {
    data: ArrayD<f64>,
    dims: Vec<usize>,
}

impl ArrayStorage {
    /// Creates zero-filled storage.
    #[must_use]
    pub fn zeros(dims: &[usize]) -> Self {
        Self::from_array(ArrayD::zeros(IxDyn(dims)))
    }

    /// Creates storage by evaluating `f` at every position.
    pub fn from_fn<F>(dims: &[usize], f: F) -> Self
    where
        F: Fn(&[usize]) -> f64,
    {
        Self::from_array(ArrayD::from_shape_fn(IxDyn(dims), |index| f(index.slice())))
    }

    /// Wraps row-major samples (last axis fastest).
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] if `data` does not fill `dims`.
    pub fn from_vec(dims: &[usize], data: Vec<f64>) -> Result<Self> {
        let len = data.len();
        let array = ArrayD::from_shape_vec(IxDyn(dims), data).map_err(|_| {
            Error::DimensionMismatch {
                axes: dims.to_vec(),
                storage: vec![len],
            }
        })?;
        Ok(Self::from_array(array))
    }

    /// Wraps an existing array.
    #[must_use]
    pub fn from_array(data: ArrayD<f64>) -> Self {
        let dims = data.shape().to_vec();
        Self { data, dims }
    }
}

impl PixelStorage for ArrayStorage {
    fn dims(&self) -> &[usize] {
        &self.dims
    }

    fn get(&self, position: &[usize]) -> Result<f64> {
        if position.len() != self.dims.len() {
            return Err(out_of_bounds(position, &self.dims));
        }
        self.data
            .get(position)
            .copied()
            .ok_or_else(|| out_of_bounds(position, &self.dims))
    }
}

/// Chunked storage: the volume is cut into a regular grid of cells.
///
/// Edge cells are truncated to the volume bounds. Each cell owns its own
/// buffer, so a reader only touches the cells it addresses.
#[derive(Debug, Clone, PartialEq)]
pub struct CellStorage {
    dims: Vec<usize>,
    cell_dims: Vec<usize>,
    grid_dims: Vec<usize>,
    cells: Vec<ArrayD<f64>>,
}

impl CellStorage {
    /// Creates cell storage by evaluating `f` at every global position.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCellSize`] if `cell_dims` has the wrong rank
    /// or contains a zero.
    pub fn from_fn<F>(dims: &[usize], cell_dims: &[usize], mut f: F) -> Result<Self>
    where
        F: FnMut(&[usize]) -> f64,
    {
        if cell_dims.len() != dims.len() || cell_dims.contains(&0) {
            return Err(Error::InvalidCellSize(cell_dims.to_vec()));
        }

        let grid_dims: Vec<usize> = dims
            .iter()
            .zip(cell_dims)
            .map(|(d, c)| d.div_ceil(*c))
            .collect();
        let cell_count: usize = grid_dims.iter().product();

        let mut cells = Vec::with_capacity(cell_count);
        let mut grid_pos = vec![0usize; dims.len()];
        let mut global = vec![0usize; dims.len()];
        for linear in 0..cell_count {
            unravel(linear, &grid_dims, &mut grid_pos);
            let extent: Vec<usize> = grid_pos
                .iter()
                .zip(cell_dims)
                .zip(dims)
                .map(|((g, c), d)| (*c).min(d - g * c))
                .collect();
            let cell = ArrayD::from_shape_fn(IxDyn(&extent), |local| {
                for (axis, l) in local.slice().iter().enumerate() {
                    global[axis] = grid_pos[axis] * cell_dims[axis] + l;
                }
                f(global.as_slice())
            });
            cells.push(cell);
        }

        Ok(Self {
            dims: dims.to_vec(),
            cell_dims: cell_dims.to_vec(),
            grid_dims,
            cells,
        })
    }

    /// Re-chunks any storage into cells of the given size.
    ///
    /// # Errors
    /// Returns an error if the cell size is invalid or the source cannot be
    /// read.
    pub fn from_storage(source: &dyn PixelStorage, cell_dims: &[usize]) -> Result<Self> {
        let mut first_error = None;
        let storage = Self::from_fn(source.dims(), cell_dims, |pos| {
            source.get(pos).unwrap_or_else(|e| {
                first_error.get_or_insert(e);
                0.0
            })
        });
        match first_error {
            Some(e) => Err(e),
            None => storage,
        }
    }
}

impl PixelStorage for CellStorage {
    fn dims(&self) -> &[usize] {
        &self.dims
    }

    fn get(&self, position: &[usize]) -> Result<f64> {
        check_position(position, &self.dims)?;

        // Row-major offset inside the cell; edge cells are truncated.
        let mut cell_index = 0;
        let mut offset = 0;
        for (((p, c), g), d) in position
            .iter()
            .zip(&self.cell_dims)
            .zip(&self.grid_dims)
            .zip(&self.dims)
        {
            let cell = p / c;
            cell_index = cell_index * g + cell;
            offset = offset * (*c).min(d - cell * c) + p % c;
        }

        self.cells
            .get(cell_index)
            .and_then(ArrayD::as_slice)
            .and_then(|samples| samples.get(offset))
            .copied()
            .ok_or_else(|| out_of_bounds(position, &self.dims))
    }

    fn is_chunked(&self) -> bool {
        true
    }
}

/// Row-major unravel of `linear` into `out` (last axis fastest).
fn unravel(mut linear: usize, dims: &[usize], out: &mut [usize]) {
    for (slot, d) in out.iter_mut().zip(dims).rev() {
        *slot = linear % d;
        linear /= d;
    }
}
