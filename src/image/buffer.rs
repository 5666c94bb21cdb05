//! Copy-on-write pixel buffer handed between the engines.
//!
//! A [`PixelBuffer`] is either direct color ([`RgbaImage`]) or paletted
//! ([`IndexedImage`]). Cloning is cheap: storage is shared until one side
//! asks for a mutable view. Engines take `&PixelBuffer` and return a new
//! handle; identity fallbacks return a clone of the input handle, which
//! [`PixelBuffer::ptr_eq`] can observe.
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use super::color::Rgba;
use super::indexed::IndexedImage;
use super::mask::BitMask;
use super::rgba::RgbaImage;
use super::traits::ImageView;

/// Storage depth in bits per pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u32")]
pub enum Depth {
    Bit1,
    Bit8,
    Bit16,
    Bit24,
    Bit32,
}

impl Depth {
    pub fn bits(self) -> u32 {
        match self {
            Depth::Bit1 => 1,
            Depth::Bit8 => 8,
            Depth::Bit16 => 16,
            Depth::Bit24 => 24,
            Depth::Bit32 => 32,
        }
    }

    pub fn is_indexed(self) -> bool {
        matches!(self, Depth::Bit1 | Depth::Bit8)
    }

    /// Maximum palette size for indexed depths; zero for direct color.
    pub fn palette_capacity(self) -> usize {
        match self {
            Depth::Bit1 => 2,
            Depth::Bit8 => 256,
            _ => 0,
        }
    }
}

impl TryFrom<u32> for Depth {
    type Error = String;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            1 => Ok(Depth::Bit1),
            8 => Ok(Depth::Bit8),
            16 => Ok(Depth::Bit16),
            24 => Ok(Depth::Bit24),
            32 => Ok(Depth::Bit32),
            other => Err(format!("unsupported depth {other}")),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer size {w}x{h} overflows the address space")]
    SizeOverflow { w: usize, h: usize },
    #[error("pixel data has {actual} elements, expected {expected}")]
    DataLength { expected: usize, actual: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Repr {
    Direct(RgbaImage),
    Indexed(IndexedImage),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    repr: Arc<Repr>,
}

impl PixelBuffer {
    /// Fully transparent 32-bit buffer.
    pub fn new(w: usize, h: usize) -> Self {
        RgbaImage::new(w, h).into()
    }

    pub fn filled(w: usize, h: usize, px: Rgba) -> Self {
        RgbaImage::filled(w, h, px).into()
    }

    pub fn from_rgba8(w: usize, h: usize, bytes: &[u8]) -> Result<Self, BufferError> {
        RgbaImage::from_rgba8(w, h, bytes).map(Into::into)
    }

    pub fn from_pixels(w: usize, h: usize, pixels: Vec<Rgba>) -> Result<Self, BufferError> {
        RgbaImage::from_pixels(w, h, pixels).map(Into::into)
    }

    pub fn width(&self) -> usize {
        match &*self.repr {
            Repr::Direct(img) => img.w,
            Repr::Indexed(img) => img.w,
        }
    }

    pub fn height(&self) -> usize {
        match &*self.repr {
            Repr::Direct(img) => img.h,
            Repr::Indexed(img) => img.h,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn depth(&self) -> Depth {
        match &*self.repr {
            Repr::Direct(img) => img.depth,
            Repr::Indexed(img) => img.depth,
        }
    }

    pub fn repr(&self) -> &Repr {
        &self.repr
    }

    pub fn as_direct(&self) -> Option<&RgbaImage> {
        match &*self.repr {
            Repr::Direct(img) => Some(img),
            Repr::Indexed(_) => None,
        }
    }

    pub fn as_indexed(&self) -> Option<&IndexedImage> {
        match &*self.repr {
            Repr::Indexed(img) => Some(img),
            Repr::Direct(_) => None,
        }
    }

    /// Direct-color copy of the buffer, expanding a palette if needed.
    pub fn to_direct(&self) -> RgbaImage {
        match &*self.repr {
            Repr::Direct(img) => img.clone(),
            Repr::Indexed(img) => img.to_rgba(),
        }
    }

    /// Like [`PixelBuffer::to_direct`] but avoids the copy when storage is unshared.
    pub fn into_direct(self) -> RgbaImage {
        match Arc::try_unwrap(self.repr) {
            Ok(Repr::Direct(img)) => img,
            Ok(Repr::Indexed(img)) => img.to_rgba(),
            Err(shared) => match &*shared {
                Repr::Direct(img) => img.clone(),
                Repr::Indexed(img) => img.to_rgba(),
            },
        }
    }

    /// Mutable direct-color view; unshares storage and expands palettes.
    pub fn direct_mut(&mut self) -> &mut RgbaImage {
        if let Repr::Indexed(img) = &*self.repr {
            self.repr = Arc::new(Repr::Direct(img.to_rgba()));
        }
        match Arc::make_mut(&mut self.repr) {
            Repr::Direct(img) => img,
            Repr::Indexed(_) => unreachable!("indexed storage expanded above"),
        }
    }

    /// Effective pixel at (x, y).
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        match &*self.repr {
            Repr::Direct(img) => img.get(x, y),
            Repr::Indexed(img) => img.pixel(x, y),
        }
    }

    pub fn has_transparency(&self) -> bool {
        match &*self.repr {
            Repr::Direct(img) => img.has_transparency(),
            Repr::Indexed(img) => img.has_transparency(),
        }
    }

    /// Opacity plane, or `None` when every pixel is opaque.
    pub fn mask(&self) -> Option<BitMask> {
        if !self.has_transparency() {
            return None;
        }
        Some(match &*self.repr {
            Repr::Direct(img) => img.mask(),
            Repr::Indexed(img) => img.to_rgba().mask(),
        })
    }

    /// Whether both handles share the same storage.
    pub fn ptr_eq(a: &PixelBuffer, b: &PixelBuffer) -> bool {
        Arc::ptr_eq(&a.repr, &b.repr)
    }

    /// Pixel-wise comparison that ignores representation (direct vs paletted).
    pub fn same_pixels(&self, other: &PixelBuffer) -> bool {
        if self.width() != other.width() || self.height() != other.height() {
            return false;
        }
        (0..self.height())
            .all(|y| (0..self.width()).all(|x| self.pixel(x, y) == other.pixel(x, y)))
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        Self {
            repr: Arc::new(Repr::Direct(img)),
        }
    }
}

impl From<IndexedImage> for PixelBuffer {
    fn from(img: IndexedImage) -> Self {
        Self {
            repr: Arc::new(Repr::Indexed(img)),
        }
    }
}
