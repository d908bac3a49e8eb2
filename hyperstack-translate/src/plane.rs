//! Typed pixel planes of a legacy stack.

use crate::color::{pack_argb, unpack_rgb};
use hyperstack_core::PixelType;

/// Storage kind of a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneKind {
    /// Unsigned 8-bit gray.
    Gray8,
    /// Unsigned 16-bit gray.
    Gray16,
    /// 32-bit float gray.
    Gray32,
    /// Packed ARGB.
    Rgb,
}

impl PlaneKind {
    /// Plane kind used for grayscale data of the given type.
    #[must_use]
    pub fn for_pixel_type(pixel_type: PixelType) -> Self {
        let bits = pixel_type.bits_per_pixel();
        if !pixel_type.is_integer() {
            Self::Gray32
        } else if bits <= 8 && !pixel_type.is_signed() {
            Self::Gray8
        } else if bits == 16 {
            Self::Gray16
        } else {
            Self::Gray32
        }
    }

    /// Element type stored per pixel (per component for RGB).
    #[must_use]
    pub fn sample_type(self) -> PixelType {
        match self {
            Self::Gray8 | Self::Rgb => PixelType::U8,
            Self::Gray16 => PixelType::U16,
            Self::Gray32 => PixelType::F32,
        }
    }

    /// Allocates a zero-filled plane.
    #[must_use]
    pub fn zeroed(self, len: usize) -> Plane {
        match self {
            Self::Gray8 => Plane::Gray8(vec![0; len]),
            Self::Gray16 => Plane::Gray16(vec![0; len]),
            Self::Gray32 => Plane::Gray32(vec![0.0; len]),
            Self::Rgb => Plane::Rgb(vec![0; len]),
        }
    }
}

/// One width x height plane.
#[derive(Debug, Clone, PartialEq)]
pub enum Plane {
    Gray8(Vec<u8>),
    Gray16(Vec<u16>),
    Gray32(Vec<f32>),
    Rgb(Vec<u32>),
}

impl Plane {
    /// Plane kind.
    #[must_use]
    pub fn kind(&self) -> PlaneKind {
        match self {
            Self::Gray8(_) => PlaneKind::Gray8,
            Self::Gray16(_) => PlaneKind::Gray16,
            Self::Gray32(_) => PlaneKind::Gray32,
            Self::Rgb(_) => PlaneKind::Rgb,
        }
    }

    /// Number of pixels.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Gray8(p) => p.len(),
            Self::Gray16(p) => p.len(),
            Self::Gray32(p) => p.len(),
            Self::Rgb(p) => p.len(),
        }
    }

    /// Returns true if the plane has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if every pixel is zero.
    #[must_use]
    pub fn is_zeroed(&self) -> bool {
        match self {
            Self::Gray8(p) => p.iter().all(|v| *v == 0),
            Self::Gray16(p) => p.iter().all(|v| *v == 0),
            Self::Gray32(p) => p.iter().all(|v| *v == 0.0),
            Self::Rgb(p) => p.iter().all(|v| *v == 0),
        }
    }

    /// Pixel value as `f64`. RGB pixels report the mean of their components.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<f64> {
        match self {
            Self::Gray8(p) => p.get(index).map(|v| f64::from(*v)),
            Self::Gray16(p) => p.get(index).map(|v| f64::from(*v)),
            Self::Gray32(p) => p.get(index).map(|v| f64::from(*v)),
            Self::Rgb(p) => p.get(index).map(|v| {
                let (r, g, b) = unpack_rgb(*v);
                (f64::from(r) + f64::from(g) + f64::from(b)) / 3.0
            }),
        }
    }

    /// Stores a gray value, clamped and rounded to the plane's range.
    ///
    /// On RGB planes the value is written to all three components.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_value(&mut self, index: usize, value: f64) {
        let sample = self.kind().sample_type();
        let value = if sample.is_integer() {
            value.round().clamp(sample.min_value(), sample.max_value())
        } else {
            value
        };
        match self {
            Self::Gray8(p) => p[index] = value as u8,
            Self::Gray16(p) => p[index] = value as u16,
            Self::Gray32(p) => p[index] = value as f32,
            Self::Rgb(p) => {
                let v = value as u8;
                p[index] = pack_argb(v, v, v);
            }
        }
    }

    /// Raw ARGB pixels, if this is an RGB plane.
    #[must_use]
    pub fn as_rgb(&self) -> Option<&[u32]> {
        match self {
            Self::Rgb(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable ARGB pixels, if this is an RGB plane.
    pub fn as_rgb_mut(&mut self) -> Option<&mut [u32]> {
        match self {
            Self::Rgb(p) => Some(p),
            _ => None,
        }
    }
}
