//! File descriptor: provenance and a shadow copy of the calibration.

use crate::calibration::{Calibration, ValueCalibration};
use crate::shape::LegacyShape;
use hyperstack_core::{GenericImage, PixelType};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pixel layout declared to legacy consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FileType {
    Gray8,
    Gray16Unsigned,
    Rgb,
}

impl FileType {
    /// RGB if merged, 16-bit if unsigned short, 8-bit otherwise.
    ///
    /// The declared type can understate the plane depth: signed 16-bit data
    /// fills `Gray16` planes and float data fills `Gray32` planes, yet both
    /// are declared `Gray8` here.
    #[must_use]
    pub fn for_image(image: &dyn GenericImage) -> Self {
        if image.is_rgb_merged() {
            Self::Rgb
        } else if image.pixel_type() == PixelType::U16 {
            Self::Gray16Unsigned
        } else {
            Self::Gray8
        }
    }
}

/// Where the pixels came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Origin {
    /// An existing local file.
    Local {
        directory: PathBuf,
        file_name: String,
    },
    /// A URL or other reference that is not a local file.
    Reference(String),
    /// No usable origin.
    #[default]
    Unresolved,
}

/// Non-fatal: the declared source is neither a local file nor a usable
/// reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot resolve origin {declared:?}; leaving it empty")]
pub struct OriginResolutionWarning {
    pub declared: String,
}

/// Resolves a declared source into an [`Origin`].
///
/// Existing local paths are split into directory and file name when
/// `check_local` is set; anything else that looks like a reference is kept
/// verbatim. A missing source resolves to [`Origin::Unresolved`] silently.
///
/// # Errors
/// Returns [`OriginResolutionWarning`] for blank sources or sources with
/// control characters.
pub fn resolve_origin(
    source: Option<&str>,
    check_local: bool,
) -> Result<Origin, OriginResolutionWarning> {
    let Some(source) = source else {
        return Ok(Origin::Unresolved);
    };
    if !is_well_formed_reference(source) {
        return Err(OriginResolutionWarning {
            declared: source.to_string(),
        });
    }

    if check_local {
        let path = Path::new(source);
        if path.exists() {
            if let Some(file_name) = path.file_name() {
                return Ok(Origin::Local {
                    directory: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                    file_name: file_name.to_string_lossy().into_owned(),
                });
            }
        }
    }
    Ok(Origin::Reference(source.to_string()))
}

fn is_well_formed_reference(source: &str) -> bool {
    !source.trim().is_empty() && !source.chars().any(char::is_control)
}

/// Legacy file descriptor.
///
/// The calibration fields are a copy of the image calibration taken when
/// the descriptor is attached; they are never edited independently.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FileDescriptor {
    pub file_type: FileType,
    pub origin: Origin,
    pub width: usize,
    pub height: usize,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub pixel_depth: f64,
    pub frame_interval: f64,
    pub unit: String,
    pub value_calibration: Option<ValueCalibration>,
    /// Set when the stack computes its planes on read.
    pub virtual_stack: bool,
    /// Summary of the source dataset.
    pub debug_info: String,
}

impl FileDescriptor {
    /// Creates a descriptor with default calibration.
    #[must_use]
    pub fn new(file_type: FileType, origin: Origin, shape: &LegacyShape) -> Self {
        let calibration = Calibration::default();
        Self {
            file_type,
            origin,
            width: shape.width(),
            height: shape.height(),
            pixel_width: calibration.pixel_width,
            pixel_height: calibration.pixel_height,
            pixel_depth: calibration.pixel_depth,
            frame_interval: calibration.frame_interval,
            unit: calibration.x_unit,
            value_calibration: None,
            virtual_stack: false,
            debug_info: String::new(),
        }
    }

    /// Copies the calibration fields from `calibration`.
    pub fn mirror_calibration(&mut self, calibration: &Calibration) {
        self.pixel_width = calibration.pixel_width;
        self.pixel_height = calibration.pixel_height;
        self.pixel_depth = calibration.pixel_depth;
        self.frame_interval = calibration.frame_interval;
        self.unit = calibration.unit().to_string();
        self.value_calibration.clone_from(&calibration.value);
    }

    /// True if the shadow fields equal `calibration`.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn mirrors(&self, calibration: &Calibration) -> bool {
        self.pixel_width == calibration.pixel_width
            && self.pixel_height == calibration.pixel_height
            && self.pixel_depth == calibration.pixel_depth
            && self.frame_interval == calibration.frame_interval
            && self.unit == calibration.unit()
            && self.value_calibration == calibration.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_existing_path_is_split() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.tif");
        File::create(&path).unwrap();

        let origin = resolve_origin(path.to_str(), true).unwrap();
        assert_eq!(
            origin,
            Origin::Local {
                directory: dir.path().to_path_buf(),
                file_name: "cells.tif".to_string(),
            }
        );
    }

    #[test]
    fn test_local_check_can_be_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.tif");
        File::create(&path).unwrap();

        let source = path.to_str().unwrap();
        assert_eq!(
            resolve_origin(Some(source), false).unwrap(),
            Origin::Reference(source.to_string())
        );
    }

    #[test]
    fn test_missing_path_becomes_reference() {
        let origin = resolve_origin(Some("https://example.org/data/cells.ome.tif"), true).unwrap();
        assert_eq!(
            origin,
            Origin::Reference("https://example.org/data/cells.ome.tif".to_string())
        );
        assert_eq!(
            resolve_origin(Some("/no/such/dir/cells.tif"), true).unwrap(),
            Origin::Reference("/no/such/dir/cells.tif".to_string())
        );
    }

    #[test]
    fn test_malformed_source_warns() {
        assert!(resolve_origin(Some("   "), true).is_err());
        let warning = resolve_origin(Some("bad\u{0}name"), true).unwrap_err();
        assert_eq!(warning.declared, "bad\u{0}name");
        assert_eq!(resolve_origin(None, true), Ok(Origin::Unresolved));
    }

    #[test]
    fn test_mirror_calibration() {
        let shape = LegacyShape::new(10, 20, 1, 1, 1);
        let mut fd = FileDescriptor::new(FileType::Gray8, Origin::Unresolved, &shape);
        let calibration = Calibration {
            pixel_width: 0.5,
            pixel_height: 0.25,
            pixel_depth: 3.0,
            frame_interval: 0.1,
            x_unit: "um".into(),
            value: Some(ValueCalibration::signed_16_bit()),
            ..Calibration::default()
        };
        assert!(!fd.mirrors(&calibration));
        fd.mirror_calibration(&calibration);
        assert!(fd.mirrors(&calibration));
        assert_eq!(fd.unit, "um");
        assert_eq!((fd.width, fd.height), (10, 20));
    }
}
