//! Spatial, temporal and value calibration of a legacy image.

use crate::error::ShapeError;
use crate::shape::{AxisIndices, LegacyShape};
use hyperstack_core::{GenericImage, PixelType};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Offset applied when signed 16-bit data is stored in unsigned planes.
pub const SIGNED_16_OFFSET: f64 = 32768.0;

/// True for signed 16-bit integer data, which is stored shifted by
/// [`SIGNED_16_OFFSET`] and gets a value calibration mapping it back.
#[must_use]
pub fn needs_signed_offset(pixel_type: PixelType) -> bool {
    pixel_type.is_integer() && pixel_type.is_signed() && pixel_type.bits_per_pixel() == 16
}

/// Curve used to map raw pixel values to calibrated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CalibrationFunction {
    /// `a + b*x`
    StraightLine,
    /// `a + b*x + c*x^2`
    Poly2,
    /// `a + b*x + c*x^2 + d*x^3`
    Poly3,
    /// `a * exp(b*x)`
    Exponential,
    /// `a * x^b`
    Power,
    /// `a * ln(b*x)`
    Log,
}

impl CalibrationFunction {
    /// Number of coefficients the function reads.
    #[must_use]
    pub fn coefficient_count(self) -> usize {
        match self {
            Self::StraightLine | Self::Exponential | Self::Power | Self::Log => 2,
            Self::Poly2 => 3,
            Self::Poly3 => 4,
        }
    }

    /// Evaluates the function, or `None` if too few coefficients are given.
    #[must_use]
    pub fn apply(self, coefficients: &[f64], x: f64) -> Option<f64> {
        if coefficients.len() < self.coefficient_count() {
            return None;
        }
        let c = coefficients;
        Some(match self {
            Self::StraightLine => c[0] + c[1] * x,
            Self::Poly2 => c[0] + x * (c[1] + x * c[2]),
            Self::Poly3 => c[0] + x * (c[1] + x * (c[2] + x * c[3])),
            Self::Exponential => c[0] * (c[1] * x).exp(),
            Self::Power => c[0] * x.powf(c[1]),
            Self::Log => c[0] * (c[1] * x).ln(),
        })
    }
}

/// Raw-to-calibrated value mapping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValueCalibration {
    pub function: CalibrationFunction,
    pub coefficients: Vec<f64>,
    pub unit: String,
}

impl ValueCalibration {
    /// The mapping used for signed 16-bit data stored with a +32768 offset.
    #[must_use]
    pub fn signed_16_bit() -> Self {
        Self {
            function: CalibrationFunction::StraightLine,
            coefficients: vec![-SIGNED_16_OFFSET, 1.0],
            unit: "Gray Value".to_string(),
        }
    }
}

/// Calibration record of a legacy image.
///
/// Axes absent from the source keep scale 1 and an empty unit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calibration {
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub pixel_depth: f64,
    pub frame_interval: f64,
    pub x_unit: String,
    pub y_unit: String,
    pub z_unit: String,
    pub time_unit: String,
    pub value: Option<ValueCalibration>,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            pixel_width: 1.0,
            pixel_height: 1.0,
            pixel_depth: 1.0,
            frame_interval: 1.0,
            x_unit: String::new(),
            y_unit: String::new(),
            z_unit: String::new(),
            time_unit: String::new(),
            value: None,
        }
    }
}

impl Calibration {
    /// The plane unit (X unit).
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.x_unit
    }

    /// Maps a raw stored value through the value calibration, if any.
    #[must_use]
    pub fn calibrated_value(&self, raw: f64) -> f64 {
        self.value
            .as_ref()
            .and_then(|v| v.function.apply(&v.coefficients, raw))
            .unwrap_or(raw)
    }
}

/// Builds the calibration record for `image`.
///
/// Scales are copied as given; zero or negative values pass through.
/// Signed 16-bit datasets additionally get [`ValueCalibration::signed_16_bit`].
///
/// # Errors
/// Returns [`ShapeError::MissingSpatialAxis`] if X or Y is absent, and
/// [`ShapeError::ShapeMismatch`] if the X/Y extents disagree with `shape`.
pub fn populate_calibration(
    image: &dyn GenericImage,
    shape: &LegacyShape,
) -> Result<Calibration, ShapeError> {
    let indices = AxisIndices::locate(image)?;
    let (found_width, found_height) = (
        image.axis_extent(indices.x),
        image.axis_extent(indices.y),
    );
    if (found_width, found_height) != (shape.width(), shape.height()) {
        return Err(ShapeError::ShapeMismatch {
            width: shape.width(),
            height: shape.height(),
            found_width,
            found_height,
        });
    }

    let scaled = |index: usize| {
        (
            image.axis_average_scale(index),
            image.axis_unit(index).to_string(),
        )
    };

    let mut calibration = Calibration::default();
    (calibration.pixel_width, calibration.x_unit) = scaled(indices.x);
    (calibration.pixel_height, calibration.y_unit) = scaled(indices.y);
    if let Some(z) = indices.z {
        (calibration.pixel_depth, calibration.z_unit) = scaled(z);
    }
    if let Some(t) = indices.time {
        (calibration.frame_interval, calibration.time_unit) = scaled(t);
    }
    if needs_signed_offset(image.pixel_type()) {
        calibration.value = Some(ValueCalibration::signed_16_bit());
    }
    Ok(calibration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::resolve_shape;
    use approx::assert_relative_eq;
    use hyperstack_core::{ArrayStorage, Axis, AxisKind, Dataset};
    use std::sync::Arc;

    fn build(axes: Vec<Axis>, pixel_type: PixelType) -> Dataset {
        let dims: Vec<usize> = axes.iter().map(|a| a.extent).collect();
        axes.into_iter()
            .fold(
                Dataset::builder("cal", Arc::new(ArrayStorage::zeros(&dims))),
                hyperstack_core::DatasetBuilder::axis,
            )
            .pixel_type(pixel_type)
            .build()
            .unwrap()
    }

    #[test]
    fn test_scales_and_units_copied_exactly() {
        let ds = build(
            vec![
                Axis::new(AxisKind::Time, 2).with_scale(0.125, "s"),
                Axis::new(AxisKind::Z, 3).with_scale(2.5, "um"),
                Axis::new(AxisKind::Y, 4).with_scale(0.17, "um"),
                Axis::new(AxisKind::X, 5).with_scale(0.13, "nm"),
            ],
            PixelType::U8,
        );
        let shape = resolve_shape(&ds).unwrap();
        let cal = populate_calibration(&ds, &shape).unwrap();
        assert_eq!(cal.pixel_width, 0.13);
        assert_eq!(cal.pixel_height, 0.17);
        assert_eq!(cal.pixel_depth, 2.5);
        assert_eq!(cal.frame_interval, 0.125);
        assert_eq!(cal.x_unit, "nm");
        assert_eq!(cal.y_unit, "um");
        assert_eq!(cal.z_unit, "um");
        assert_eq!(cal.time_unit, "s");
        assert_eq!(cal.unit(), "nm");
        assert!(cal.value.is_none());
    }

    #[test]
    fn test_absent_axes_keep_defaults() {
        let ds = build(
            vec![Axis::new(AxisKind::X, 5), Axis::new(AxisKind::Y, 4)],
            PixelType::U8,
        );
        let shape = resolve_shape(&ds).unwrap();
        let cal = populate_calibration(&ds, &shape).unwrap();
        assert_eq!(cal, Calibration::default());
    }

    #[test]
    fn test_negative_scale_passes_through() {
        let ds = build(
            vec![
                Axis::new(AxisKind::X, 5).with_scale(-0.5, "um"),
                Axis::new(AxisKind::Y, 4).with_scale(0.0, "um"),
            ],
            PixelType::U8,
        );
        let shape = resolve_shape(&ds).unwrap();
        let cal = populate_calibration(&ds, &shape).unwrap();
        assert_relative_eq!(cal.pixel_width, -0.5);
        assert_relative_eq!(cal.pixel_height, 0.0);
        assert_eq!(cal.x_unit, "um");
    }

    #[test]
    fn test_non_uniform_axis_uses_average() {
        let ds = build(
            vec![
                Axis::new(AxisKind::X, 2),
                Axis::new(AxisKind::Y, 2),
                Axis::new(AxisKind::Time, 3).with_positions(vec![0.0, 1.0, 5.0], "min"),
            ],
            PixelType::U8,
        );
        let shape = resolve_shape(&ds).unwrap();
        let cal = populate_calibration(&ds, &shape).unwrap();
        assert_relative_eq!(cal.frame_interval, 2.5);
        assert_eq!(cal.time_unit, "min");
    }

    #[test]
    fn test_shape_mismatch() {
        let ds = build(
            vec![Axis::new(AxisKind::X, 5), Axis::new(AxisKind::Y, 4)],
            PixelType::U8,
        );
        let err = populate_calibration(&ds, &LegacyShape::new(4, 4, 1, 1, 1)).unwrap_err();
        assert!(matches!(err, ShapeError::ShapeMismatch { found_width: 5, .. }));
    }

    #[test]
    fn test_signed_16_value_calibration() {
        let ds = build(
            vec![Axis::new(AxisKind::X, 2), Axis::new(AxisKind::Y, 2)],
            PixelType::I16,
        );
        let shape = resolve_shape(&ds).unwrap();
        let cal = populate_calibration(&ds, &shape).unwrap();
        assert_eq!(cal.value, Some(ValueCalibration::signed_16_bit()));
        assert_relative_eq!(cal.calibrated_value(32768.0), 0.0);
        assert_relative_eq!(cal.calibrated_value(0.0), -32768.0);
    }

    #[test]
    fn test_only_signed_short_is_offset() {
        assert!(needs_signed_offset(PixelType::I16));
        for other in [PixelType::U16, PixelType::I8, PixelType::I32, PixelType::F32] {
            assert!(!needs_signed_offset(other), "{other}");
        }
    }

    #[test]
    fn test_calibration_functions() {
        let line = CalibrationFunction::StraightLine;
        assert_relative_eq!(line.apply(&[1.0, 2.0], 3.0).unwrap(), 7.0);
        assert!(line.apply(&[1.0], 3.0).is_none());
        assert_relative_eq!(
            CalibrationFunction::Poly2.apply(&[1.0, 0.0, 2.0], 3.0).unwrap(),
            19.0
        );
        assert_relative_eq!(
            CalibrationFunction::Poly3.apply(&[0.0, 0.0, 0.0, 1.0], 2.0).unwrap(),
            8.0
        );
        assert_relative_eq!(
            CalibrationFunction::Power.apply(&[2.0, 2.0], 3.0).unwrap(),
            18.0
        );
        assert_relative_eq!(
            CalibrationFunction::Exponential.apply(&[1.0, 1.0], 0.0).unwrap(),
            1.0
        );
        assert_relative_eq!(
            CalibrationFunction::Log.apply(&[1.0, 1.0], 1.0).unwrap(),
            0.0
        );
    }
}
