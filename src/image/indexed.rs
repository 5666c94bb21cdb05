//! Paletted image: one byte index per pixel into a color table.
//!
//! Transparency is either a palette entry equal to [`Rgba::TRANSPARENT`] or a
//! separate 1-bit mask; both may not be needed at once but both are honoured.
use super::buffer::Depth;
use super::color::Rgba;
use super::mask::BitMask;
use super::rgba::RgbaImage;
use super::traits::{ImageView, ImageViewMut};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedImage {
    pub w: usize,
    pub h: usize,
    /// `Bit1` (two palette entries) or `Bit8` (up to 256)
    pub depth: Depth,
    pub indices: Vec<u8>,
    pub palette: Vec<Rgba>,
    /// Opacity plane; `None` means every pixel takes its palette entry as is.
    pub mask: Option<BitMask>,
}

impl IndexedImage {
    /// Image filled with palette index 0.
    pub fn new(w: usize, h: usize, depth: Depth, palette: Vec<Rgba>) -> Self {
        debug_assert!(matches!(depth, Depth::Bit1 | Depth::Bit8));
        debug_assert!(palette.len() <= depth.palette_capacity());
        Self {
            w,
            h,
            depth,
            indices: vec![0; w * h],
            palette,
            mask: None,
        }
    }

    /// Effective pixel color at (x, y).
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        if let Some(mask) = &self.mask {
            if !mask.get(x, y) {
                return Rgba::TRANSPARENT;
            }
        }
        let idx = self.indices[y * self.w + x] as usize;
        self.palette.get(idx).copied().unwrap_or(Rgba::TRANSPARENT)
    }

    pub fn has_transparency(&self) -> bool {
        let masked = self.mask.as_ref().is_some_and(|m| !m.is_all_set());
        masked || self.palette.iter().any(Rgba::is_transparent)
    }

    /// Expands to a 32-bit direct-color image.
    pub fn to_rgba(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.w, self.h);
        for y in 0..self.h {
            let dst = out.row_mut(y);
            for (x, px) in dst.iter_mut().enumerate() {
                *px = self.pixel(x, y);
            }
        }
        out
    }

    /// Rewrites every palette entry through `f`, skipping transparent entries.
    pub fn map_palette(&mut self, mut f: impl FnMut(Rgba) -> Rgba) {
        for entry in self.palette.iter_mut().filter(|p| p.is_opaque()) {
            *entry = f(*entry);
        }
    }
}

impl ImageView for IndexedImage {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.w;
        &self.indices[start..start + self.w]
    }
}

impl ImageViewMut for IndexedImage {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.w;
        &mut self.indices[start..start + self.w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_and_transparent_entry_both_yield_transparent_pixels() {
        let mut img = IndexedImage::new(
            2,
            2,
            Depth::Bit1,
            vec![Rgba::opaque(1, 1, 1), Rgba::TRANSPARENT],
        );
        img.set(1, 0, 1);
        let mut mask = BitMask::new(2, 2, true);
        mask.set(0, 1, false);
        img.mask = Some(mask);

        let rgba = img.to_rgba();
        assert_eq!(rgba.get(0, 0), Rgba::opaque(1, 1, 1));
        assert_eq!(rgba.get(1, 0), Rgba::TRANSPARENT);
        assert_eq!(rgba.get(0, 1), Rgba::TRANSPARENT);
        assert_eq!(rgba.get(1, 1), Rgba::opaque(1, 1, 1));
        assert!(img.has_transparency());
    }
}
