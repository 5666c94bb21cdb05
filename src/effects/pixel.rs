//! Per-pixel color transforms: lookup tables, grayscale, invert and flatten.
//!
//! Paletted buffers are transformed through their palette only, which is both
//! cheaper (at most 256 entries) and keeps the set of effective colors exact.
//! Transparent pixels and transparent palette entries are never modified.
use log::{debug, error};

use super::ChannelMask;
use crate::arith::lerp_u8;
use crate::image::{Color, PixelBuffer, Repr, Rgba};

/// Per-channel 256-entry lookup tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelLuts {
    pub red: [u8; 256],
    pub green: [u8; 256],
    pub blue: [u8; 256],
}

impl Default for ChannelLuts {
    fn default() -> Self {
        Self::identity()
    }
}

impl ChannelLuts {
    pub fn identity() -> Self {
        let mut lut = [0u8; 256];
        for (i, v) in lut.iter_mut().enumerate() {
            *v = i as u8;
        }
        Self {
            red: lut,
            green: lut,
            blue: lut,
        }
    }

    /// Tables computing `f` on the enabled channels and identity elsewhere.
    pub fn from_fn(channels: ChannelMask, f: impl Fn(u8) -> u8) -> Self {
        let mut luts = Self::identity();
        let mut table = [0u8; 256];
        for (i, v) in table.iter_mut().enumerate() {
            *v = f(i as u8);
        }
        if channels.red {
            luts.red = table;
        }
        if channels.green {
            luts.green = table;
        }
        if channels.blue {
            luts.blue = table;
        }
        luts
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    #[inline]
    pub fn map(&self, px: Rgba) -> Rgba {
        px.with_rgb(
            self.red[px.r() as usize],
            self.green[px.g() as usize],
            self.blue[px.b() as usize],
        )
    }
}

/// Applies `f` to every opaque pixel (direct) or palette entry (indexed).
pub fn map_colors(buffer: &PixelBuffer, f: impl Fn(Rgba) -> Rgba) -> PixelBuffer {
    match buffer.repr() {
        Repr::Direct(img) => {
            let mut out = img.clone();
            out.map_opaque(f);
            out.into()
        }
        Repr::Indexed(img) => {
            let mut out = img.clone();
            out.map_palette(f);
            out.into()
        }
    }
}

pub fn apply_luts(buffer: &PixelBuffer, luts: &ChannelLuts) -> PixelBuffer {
    map_colors(buffer, |px| luts.map(px))
}

/// Replaces each color by its luma, preserving alpha. Idempotent.
pub fn grayscale(buffer: &PixelBuffer) -> PixelBuffer {
    map_colors(buffer, |px| {
        let gray = px.luma();
        px.with_rgb(gray, gray, gray)
    })
}

/// XORs the enabled channels with 0xFF. Applying it twice restores the input.
pub fn invert(buffer: &PixelBuffer, channels: ChannelMask) -> PixelBuffer {
    if channels.is_empty() {
        debug!("invert: no channels selected, returning input");
        return buffer.clone();
    }
    let luts = ChannelLuts::from_fn(channels, |v| v ^ 0xFF);
    apply_luts(buffer, &luts)
}

/// Maps the buffer's luma range linearly onto the `color1 → color2` ramp.
///
/// Both colors must be opaque; otherwise the input is returned unchanged.
pub fn flatten(buffer: &PixelBuffer, color1: Color, color2: Color) -> PixelBuffer {
    let (Some(c1), Some(c2)) = (color1.to_rgba(), color2.to_rgba()) else {
        error!("flatten: invalid color ({color1:?}, {color2:?})");
        return buffer.clone();
    };
    if c1.is_transparent() || c2.is_transparent() {
        error!("flatten: colors must be opaque ({color1:?}, {color2:?})");
        return buffer.clone();
    }

    let Some((min, max)) = luma_range(buffer) else {
        return buffer.clone();
    };
    let span = (max - min) as f32;
    map_colors(buffer, |px| {
        let t = if span > 0.0 {
            (px.luma() - min) as f32 / span
        } else {
            0.0
        };
        px.with_rgb(
            lerp_u8(c1.r(), c2.r(), t),
            lerp_u8(c1.g(), c2.g(), t),
            lerp_u8(c1.b(), c2.b(), t),
        )
    })
}

/// Darkest and brightest luma over opaque colors, `None` if there are none.
fn luma_range(buffer: &PixelBuffer) -> Option<(u8, u8)> {
    let colors: Box<dyn Iterator<Item = &Rgba>> = match buffer.repr() {
        Repr::Direct(img) => Box::new(img.data.iter()),
        Repr::Indexed(img) => Box::new(img.palette.iter()),
    };
    colors
        .filter(|p| p.is_opaque())
        .map(Rgba::luma)
        .fold(None, |acc, l| match acc {
            None => Some((l, l)),
            Some((lo, hi)) => Some((lo.min(l), hi.max(l))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Depth, ImageViewMut, IndexedImage, RgbaImage};

    fn sample() -> PixelBuffer {
        let mut img = RgbaImage::new(3, 2);
        let colors = [
            Rgba::opaque(10, 200, 30),
            Rgba::opaque(255, 0, 128),
            Rgba::TRANSPARENT,
            Rgba::opaque(1, 2, 3),
            Rgba::opaque(90, 90, 90),
            Rgba::WHITE,
        ];
        img.data.copy_from_slice(&colors);
        img.into()
    }

    #[test]
    fn invert_is_self_inverse_and_skips_transparency() {
        let b = sample();
        for mask in [ChannelMask::RGB, ChannelMask::RED, ChannelMask::new(false, true, true)] {
            let once = invert(&b, mask);
            assert_ne!(once, b);
            assert_eq!(once.pixel(2, 0), Rgba::TRANSPARENT);
            assert_eq!(invert(&once, mask), b);
        }
        assert_eq!(invert(&b, ChannelMask::NONE), b);
    }

    #[test]
    fn grayscale_is_idempotent() {
        let b = sample();
        let g = grayscale(&b);
        assert_eq!(grayscale(&g), g);
        let px = g.pixel(0, 0);
        assert_eq!((px.r(), px.g(), px.b()), (147, 147, 147));
    }

    #[test]
    fn paletted_invert_touches_palette_only() {
        let mut img = IndexedImage::new(4, 1, Depth::Bit8, vec![Rgba::BLACK, Rgba::opaque(1, 2, 3)]);
        img.set(3, 0, 1);
        let out = invert(&PixelBuffer::from(img.clone()), ChannelMask::RGB);
        let out = out.as_indexed().expect("stays paletted");
        assert_eq!(out.indices, img.indices);
        assert_eq!(out.palette, vec![Rgba::WHITE, Rgba::opaque(254, 253, 252)]);
    }

    #[test]
    fn flatten_spans_color_range() {
        let b = sample();
        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);
        let out = flatten(&b, red, blue);
        // Darkest opaque pixel maps to color1, brightest to color2.
        assert_eq!(out.pixel(0, 1), Rgba::opaque(255, 0, 0));
        assert_eq!(out.pixel(2, 1), Rgba::opaque(0, 0, 255));
        assert_eq!(out.pixel(2, 0), Rgba::TRANSPARENT);
        assert!(PixelBuffer::ptr_eq(&flatten(&b, red, Color::Invalid), &b));
    }
}
