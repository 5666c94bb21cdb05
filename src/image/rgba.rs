//! Owned direct-color RGBA image in row-major layout (stride == width).
use super::buffer::{BufferError, Depth};
use super::color::Rgba;
use super::mask::BitMask;
use super::traits::{ImageView, ImageViewMut};
use crate::arith::checked_byte_size;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaImage {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of pixels between consecutive rows (equals `w`)
    pub stride: usize,
    /// Nominal storage depth: 16 (RGB565-quantized), 24 or 32
    pub depth: Depth,
    /// Backing storage in row-major order
    pub data: Vec<Rgba>,
}

impl RgbaImage {
    /// Fully transparent 32-bit image of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self::filled(w, h, Rgba::TRANSPARENT)
    }

    /// Image of size `w × h` with every pixel set to `px`.
    ///
    /// Sizes derived from caller input are checked with
    /// [`checked_byte_size`] before reaching here.
    pub fn filled(w: usize, h: usize, px: Rgba) -> Self {
        Self {
            w,
            h,
            stride: w,
            depth: Depth::Bit32,
            data: vec![px; w * h],
        }
    }

    /// Wraps existing pixels after checking the length against the dimensions.
    pub fn from_pixels(w: usize, h: usize, data: Vec<Rgba>) -> Result<Self, BufferError> {
        let expected = w
            .checked_mul(h)
            .ok_or(BufferError::SizeOverflow { w, h })?;
        if data.len() != expected {
            return Err(BufferError::DataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            w,
            h,
            stride: w,
            depth: Depth::Bit32,
            data: data
                .into_iter()
                .map(|p| Rgba::from_rgba8(p.r(), p.g(), p.b(), p.a()))
                .collect(),
        })
    }

    /// Parses straight (non-premultiplied) RGBA8 bytes, collapsing alpha to 1 bit.
    pub fn from_rgba8(w: usize, h: usize, bytes: &[u8]) -> Result<Self, BufferError> {
        let expected = checked_byte_size(w, h, 4).ok_or(BufferError::SizeOverflow { w, h })?;
        if bytes.len() != expected {
            return Err(BufferError::DataLength {
                expected,
                actual: bytes.len(),
            });
        }
        let data = bytes
            .chunks_exact(4)
            .map(|c| Rgba::from_rgba8(c[0], c[1], c[2], c[3]))
            .collect();
        Ok(Self {
            w,
            h,
            stride: w,
            depth: Depth::Bit32,
            data,
        })
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        self.data.iter().flat_map(|p| p.to_array()).collect()
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }

    pub fn has_transparency(&self) -> bool {
        self.data.iter().any(Rgba::is_transparent)
    }

    /// Opacity plane of the image (set = opaque).
    pub fn mask(&self) -> BitMask {
        let mut mask = BitMask::new(self.w, self.h, false);
        for (y, row) in self.rows().enumerate() {
            for (x, px) in row.iter().enumerate() {
                if px.is_opaque() {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    /// Clears every pixel whose mask bit is unset.
    pub fn apply_mask(&mut self, mask: &BitMask) {
        debug_assert_eq!((mask.width(), mask.height()), (self.w, self.h));
        for y in 0..self.h {
            let row = self.row_mut(y);
            for (x, px) in row.iter_mut().enumerate() {
                if !mask.get(x, y) {
                    *px = Rgba::TRANSPARENT;
                }
            }
        }
    }

    /// Applies `f` to every opaque pixel; transparent pixels are left alone.
    pub fn map_opaque(&mut self, mut f: impl FnMut(Rgba) -> Rgba) {
        for px in self.data.iter_mut().filter(|p| p.is_opaque()) {
            *px = f(*px);
        }
    }
}

impl ImageView for RgbaImage {
    type Pixel = Rgba;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[Rgba] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

impl ImageViewMut for RgbaImage {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [Rgba] {
        let start = y * self.stride;
        let end = start + self.w;
        &mut self.data[start..end]
    }
}
