//! The generic N-dimensional dataset and its read-only accessor trait.

use crate::axis::{Axis, AxisKind};
use crate::pixel::PixelType;
use crate::storage::PixelStorage;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Read-only view of an N-dimensional image with named, calibrated axes.
///
/// Axes are located by kind, never by position, so any storage order works.
pub trait GenericImage: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    /// All axes in storage order.
    fn axes(&self) -> &[Axis];

    /// Index of the axis with the given kind, if present.
    fn axis_index(&self, kind: &AxisKind) -> Option<usize> {
        self.axes().iter().position(|axis| &axis.kind == kind)
    }

    /// Extent of the axis at `index`.
    fn axis_extent(&self, index: usize) -> usize {
        self.axes().get(index).map_or(1, |axis| axis.extent)
    }

    /// Average physical step of the axis at `index`.
    fn axis_average_scale(&self, index: usize) -> f64 {
        self.axes().get(index).map_or(1.0, Axis::average_scale)
    }

    /// Unit of the axis at `index`.
    fn axis_unit(&self, index: usize) -> &str {
        self.axes().get(index).map_or("", |axis| axis.unit.as_str())
    }

    /// Raw pixel accessor.
    fn pixels(&self) -> Arc<dyn PixelStorage>;

    /// True when the channel axis holds interleaved RGB components.
    fn is_rgb_merged(&self) -> bool;

    /// Declared element type.
    fn pixel_type(&self) -> PixelType;

    /// Path or URL the data was loaded from.
    fn source(&self) -> Option<&str>;

    /// True when the pixel store is organized in addressable cells.
    fn is_chunked_storage(&self) -> bool {
        self.pixels().is_chunked()
    }

    /// Free-form key/value metadata.
    fn properties(&self) -> &BTreeMap<String, String>;

    /// One-line description: name, axes with extents, pixel type and an
    /// `rgb` tag for merged data, e.g. `"cells [X=6, Y=5] uint8"`.
    fn summary(&self) -> String {
        let axes: Vec<String> = self
            .axes()
            .iter()
            .map(|axis| format!("{}={}", axis.kind, axis.extent))
            .collect();
        let rgb = if self.is_rgb_merged() { " rgb" } else { "" };
        format!("{} [{}] {}{rgb}", self.name(), axes.join(", "), self.pixel_type())
    }
}

/// In-memory dataset.
#[derive(Clone)]
pub struct Dataset {
    name: String,
    source: Option<String>,
    axes: Vec<Axis>,
    pixel_type: PixelType,
    rgb_merged: bool,
    storage: Arc<dyn PixelStorage>,
    properties: BTreeMap<String, String>,
}

impl Dataset {
    /// Starts building a dataset over the given storage.
    pub fn builder(name: impl Into<String>, storage: Arc<dyn PixelStorage>) -> DatasetBuilder {
        DatasetBuilder {
            name: name.into(),
            source: None,
            axes: Vec::new(),
            pixel_type: PixelType::F64,
            rgb_merged: false,
            storage,
            properties: BTreeMap::new(),
        }
    }
}

impl GenericImage for Dataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn axes(&self) -> &[Axis] {
        &self.axes
    }

    fn pixels(&self) -> Arc<dyn PixelStorage> {
        Arc::clone(&self.storage)
    }

    fn is_rgb_merged(&self) -> bool {
        self.rgb_merged
    }

    fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn is_chunked_storage(&self) -> bool {
        self.storage.is_chunked()
    }

    fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("axes", &self.axes)
            .field("pixel_type", &self.pixel_type)
            .field("rgb_merged", &self.rgb_merged)
            .field("chunked", &self.storage.is_chunked())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Builder for [`Dataset`].
pub struct DatasetBuilder {
    name: String,
    source: Option<String>,
    axes: Vec<Axis>,
    pixel_type: PixelType,
    rgb_merged: bool,
    storage: Arc<dyn PixelStorage>,
    properties: BTreeMap<String, String>,
}

impl DatasetBuilder {
    /// Appends an axis. Order must match the storage dimension order.
    #[must_use]
    pub fn axis(mut self, axis: Axis) -> Self {
        self.axes.push(axis);
        self
    }

    /// Sets the declared pixel type.
    #[must_use]
    pub fn pixel_type(mut self, pixel_type: PixelType) -> Self {
        self.pixel_type = pixel_type;
        self
    }

    /// Marks the channel axis as interleaved RGB.
    #[must_use]
    pub fn rgb_merged(mut self, merged: bool) -> Self {
        self.rgb_merged = merged;
        self
    }

    /// Sets the source path or URL.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a metadata property.
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Validates and builds the dataset.
    ///
    /// # Errors
    /// Returns an error if axis labels repeat, an extent is zero, a sampled
    /// axis has the wrong number of positions, or the storage dimensions do
    /// not match the axis extents.
    pub fn build(self) -> Result<Dataset> {
        let mut seen = HashSet::new();
        for axis in &self.axes {
            let label = axis.kind.label();
            if !seen.insert(label.to_string()) {
                return Err(Error::DuplicateAxis(label.to_string()));
            }
            if axis.extent == 0 {
                return Err(Error::EmptyAxis(label.to_string()));
            }
            if let crate::AxisCalibration::Sampled(positions) = &axis.calibration {
                if positions.len() != axis.extent {
                    return Err(Error::InvalidScale {
                        axis: label.to_string(),
                        samples: positions.len(),
                        extent: axis.extent,
                    });
                }
            }
        }

        let extents: Vec<usize> = self.axes.iter().map(|axis| axis.extent).collect();
        if extents.as_slice() != self.storage.dims() {
            return Err(Error::DimensionMismatch {
                axes: extents,
                storage: self.storage.dims().to_vec(),
            });
        }

        Ok(Dataset {
            name: self.name,
            source: self.source,
            axes: self.axes,
            pixel_type: self.pixel_type,
            rgb_merged: self.rgb_merged,
            storage: self.storage,
            properties: self.properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ArrayStorage, CellStorage};

    fn xyc() -> Dataset {
        Dataset::builder("sample", Arc::new(ArrayStorage::zeros(&[3, 8, 6])))
            .axis(Axis::new(AxisKind::Channel, 3))
            .axis(Axis::new(AxisKind::Y, 8).with_scale(0.5, "um"))
            .axis(Axis::new(AxisKind::X, 6).with_scale(0.25, "um"))
            .pixel_type(PixelType::U8)
            .source("/data/sample.tif")
            .property("Objective", "63x")
            .build()
            .unwrap()
    }

    #[test]
    fn test_axis_lookup_by_kind() {
        let ds = xyc();
        assert_eq!(ds.axis_index(&AxisKind::X), Some(2));
        assert_eq!(ds.axis_index(&AxisKind::Channel), Some(0));
        assert_eq!(ds.axis_index(&AxisKind::Z), None);
        assert_eq!(ds.axis_extent(1), 8);
        assert!((ds.axis_average_scale(2) - 0.25).abs() < f64::EPSILON);
        assert_eq!(ds.axis_unit(1), "um");
        assert_eq!(ds.properties().get("Objective").map(String::as_str), Some("63x"));
    }

    #[test]
    fn test_display_summary() {
        let ds = xyc();
        assert_eq!(ds.to_string(), "sample [Channel=3, Y=8, X=6] uint8");
        assert_eq!(ds.summary(), ds.to_string());

        let merged = Dataset::builder("rgb", Arc::new(ArrayStorage::zeros(&[2, 2, 3])))
            .axis(Axis::new(AxisKind::X, 2))
            .axis(Axis::new(AxisKind::Y, 2))
            .axis(Axis::new(AxisKind::Channel, 3))
            .pixel_type(PixelType::U8)
            .rgb_merged(true)
            .build()
            .unwrap();
        assert_eq!(merged.summary(), "rgb [X=2, Y=2, Channel=3] uint8 rgb");
    }

    #[test]
    fn test_duplicate_axis_rejected() {
        let err = Dataset::builder("dup", Arc::new(ArrayStorage::zeros(&[2, 2])))
            .axis(Axis::new(AxisKind::X, 2))
            .axis(Axis::new(AxisKind::X, 2))
            .build()
            .unwrap_err();
        assert_eq!(err, Error::DuplicateAxis("X".into()));
    }

    #[test]
    fn test_zero_extent_rejected() {
        let err = Dataset::builder("empty", Arc::new(ArrayStorage::zeros(&[0, 2])))
            .axis(Axis::new(AxisKind::X, 0))
            .axis(Axis::new(AxisKind::Y, 2))
            .build()
            .unwrap_err();
        assert_eq!(err, Error::EmptyAxis("X".into()));
    }

    #[test]
    fn test_storage_mismatch_rejected() {
        let err = Dataset::builder("bad", Arc::new(ArrayStorage::zeros(&[4, 4])))
            .axis(Axis::new(AxisKind::X, 4))
            .axis(Axis::new(AxisKind::Y, 5))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn test_sampled_positions_must_cover_axis() {
        let err = Dataset::builder("z", Arc::new(ArrayStorage::zeros(&[2, 2, 3])))
            .axis(Axis::new(AxisKind::X, 2))
            .axis(Axis::new(AxisKind::Y, 2))
            .axis(Axis::new(AxisKind::Z, 3).with_positions(vec![0.0, 1.0], "um"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidScale { samples: 2, .. }));
    }

    #[test]
    fn test_chunked_flag_follows_storage() {
        let cells = CellStorage::from_fn(&[4, 4], &[2, 2], |_| 0.0).unwrap();
        let ds = Dataset::builder("cells", Arc::new(cells))
            .axis(Axis::new(AxisKind::X, 4))
            .axis(Axis::new(AxisKind::Y, 4))
            .build()
            .unwrap();
        assert!(ds.is_chunked_storage());
        assert!(!xyc().is_chunked_storage());
    }
}
