//! Named, calibrated dataset axes.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Semantic kind of a dataset dimension, independent of storage order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AxisKind {
    /// Horizontal spatial axis.
    X,
    /// Vertical spatial axis.
    Y,
    /// Depth (focal plane) axis.
    Z,
    /// Temporal axis.
    Time,
    /// Channel axis.
    Channel,
    /// Any other named dimension (lifetime, spectra, phase, ...).
    Other(String),
}

impl AxisKind {
    /// Returns the axis label. Labels are unique within a dataset.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
            Self::Time => "Time",
            Self::Channel => "Channel",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for AxisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mapping from axis index to physical position.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AxisCalibration {
    /// `position = origin + scale * index`.
    Linear { origin: f64, scale: f64 },
    /// Explicit position for every index; step sizes may vary.
    Sampled(Vec<f64>),
}

impl Default for AxisCalibration {
    fn default() -> Self {
        Self::Linear {
            origin: 0.0,
            scale: 1.0,
        }
    }
}

impl AxisCalibration {
    /// Average step between consecutive positions.
    ///
    /// Non-uniform sampled axes collapse to `(last - first) / (n - 1)`, so
    /// variable step sizes are lost.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_scale(&self) -> f64 {
        match self {
            Self::Linear { scale, .. } => *scale,
            Self::Sampled(positions) => match (positions.first(), positions.last()) {
                (Some(first), Some(last)) if positions.len() > 1 => {
                    (last - first) / (positions.len() - 1) as f64
                }
                _ => 1.0,
            },
        }
    }
}

/// A single dataset dimension.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Axis {
    /// Semantic kind.
    pub kind: AxisKind,
    /// Number of samples along the axis.
    pub extent: usize,
    /// Index-to-position mapping.
    pub calibration: AxisCalibration,
    /// Physical unit, empty when uncalibrated.
    pub unit: String,
}

impl Axis {
    /// Creates an uncalibrated axis.
    #[must_use]
    pub fn new(kind: AxisKind, extent: usize) -> Self {
        Self {
            kind,
            extent,
            calibration: AxisCalibration::default(),
            unit: String::new(),
        }
    }

    /// Sets a linear scale and unit.
    #[must_use]
    pub fn with_scale(mut self, scale: f64, unit: impl Into<String>) -> Self {
        let origin = match self.calibration {
            AxisCalibration::Linear { origin, .. } => origin,
            AxisCalibration::Sampled(_) => 0.0,
        };
        self.calibration = AxisCalibration::Linear { origin, scale };
        self.unit = unit.into();
        self
    }

    /// Sets explicit per-index positions and a unit.
    #[must_use]
    pub fn with_positions(mut self, positions: Vec<f64>, unit: impl Into<String>) -> Self {
        self.calibration = AxisCalibration::Sampled(positions);
        self.unit = unit.into();
        self
    }

    /// Average physical step along the axis.
    #[must_use]
    pub fn average_scale(&self) -> f64 {
        self.calibration.average_scale()
    }
}
