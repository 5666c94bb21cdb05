//! Channel histograms, global equalization and locality-aware tone enhancement.
//!
//! Color histograms count opaque pixels only; the transparent sentinel has no
//! meaningful color. The alpha histogram counts every pixel but is never
//! used for remapping since alpha is already 0 or 255.
use log::warn;

use crate::arith::round_channel;
use crate::image::{Depth, ImageView, PixelBuffer, Rgba, RgbaImage};

/// Largest tile grid (per axis) used by [`tone_enhance`] at granularity 1.
pub const MAX_TONE_TILES: usize = 16;

/// 256-bucket counts per channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
    pub red: [u32; 256],
    pub green: [u32; 256],
    pub blue: [u32; 256],
    pub alpha: [u32; 256],
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            red: [0; 256],
            green: [0; 256],
            blue: [0; 256],
            alpha: [0; 256],
        }
    }
}

impl Histogram {
    pub fn from_image(img: &RgbaImage) -> Self {
        let mut hist = Self::default();
        for row in img.rows() {
            for px in row {
                hist.add(*px);
            }
        }
        hist
    }

    pub fn from_buffer(buffer: &PixelBuffer) -> Self {
        match buffer.as_direct() {
            Some(img) => Self::from_image(img),
            None => Self::from_image(&buffer.to_direct()),
        }
    }

    #[inline]
    pub fn add(&mut self, px: Rgba) {
        self.alpha[px.a() as usize] += 1;
        if px.is_opaque() {
            self.red[px.r() as usize] += 1;
            self.green[px.g() as usize] += 1;
            self.blue[px.b() as usize] += 1;
        }
    }

    /// Number of opaque pixels counted.
    pub fn opaque_count(&self) -> u64 {
        self.red.iter().map(|&c| c as u64).sum()
    }
}

/// Prefix sums of a [`Histogram`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CumulativeHistogram {
    pub red: [u64; 256],
    pub green: [u64; 256],
    pub blue: [u64; 256],
    pub alpha: [u64; 256],
}

impl From<&Histogram> for CumulativeHistogram {
    fn from(hist: &Histogram) -> Self {
        Self {
            red: prefix_sum(&hist.red),
            green: prefix_sum(&hist.green),
            blue: prefix_sum(&hist.blue),
            alpha: prefix_sum(&hist.alpha),
        }
    }
}

fn prefix_sum(counts: &[u32; 256]) -> [u64; 256] {
    let mut out = [0u64; 256];
    let mut acc = 0u64;
    for (dst, &c) in out.iter_mut().zip(counts.iter()) {
        acc += c as u64;
        *dst = acc;
    }
    out
}

/// Equalization lookup for one cumulative channel, `None` without dynamic range.
///
/// `map[v] = 255 * (cum[v] - low) / (high - low)` with `low = cum[0]` and
/// `high = cum[255]`.
pub fn equalization_map(cumulative: &[u64; 256]) -> Option<[u8; 256]> {
    let low = cumulative[0];
    let high = cumulative[255];
    if high == low {
        return None;
    }
    let mut map = [0u8; 256];
    for (dst, &c) in map.iter_mut().zip(cumulative.iter()) {
        *dst = (255 * (c - low) / (high - low)) as u8;
    }
    Some(map)
}

/// Stretches each color channel over the full range, in place.
///
/// Returns `false` for an empty buffer. Channels with no dynamic range are
/// left untouched; paletted buffers are expanded to direct color.
pub fn equalize(buffer: &mut PixelBuffer) -> bool {
    if buffer.is_empty() {
        return false;
    }
    let hist = Histogram::from_buffer(buffer);
    let cumulative = CumulativeHistogram::from(&hist);
    let red = equalization_map(&cumulative.red);
    let green = equalization_map(&cumulative.green);
    let blue = equalization_map(&cumulative.blue);
    if red.is_none() && green.is_none() && blue.is_none() {
        return true;
    }

    let img = buffer.direct_mut();
    img.map_opaque(|px| {
        let remap = |map: &Option<[u8; 256]>, v: u8| map.as_ref().map_or(v, |m| m[v as usize]);
        px.with_rgb(remap(&red, px.r()), remap(&green, px.g()), remap(&blue, px.b()))
    });
    true
}

#[inline]
fn intensity(px: Rgba) -> u8 {
    px.r().max(px.g()).max(px.b())
}

/// Tone map for one tile: cumulative equalization anchored at the darkest
/// populated bucket, identity for tiles without range.
fn tile_tone_map(counts: &[u32; 256]) -> [f32; 256] {
    let cumulative = prefix_sum(counts);
    let total = cumulative[255];
    let first = cumulative.iter().copied().find(|&c| c > 0).unwrap_or(0);
    let mut map = [0f32; 256];
    for (v, dst) in map.iter_mut().enumerate() {
        *dst = if total == first {
            v as f32
        } else {
            let c = cumulative[v].saturating_sub(first);
            255.0 * c as f32 / (total - first) as f32
        };
    }
    map
}

/// Neighbouring tile indices and blend weight for a pixel along one axis.
#[inline]
fn tile_blend(pos: usize, tile: usize, tiles: usize) -> (usize, usize, f32) {
    let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
    if f <= 0.0 {
        return (0, 0, 0.0);
    }
    let i0 = f.floor() as usize;
    if i0 + 1 >= tiles {
        return (tiles - 1, tiles - 1, 0.0);
    }
    (i0, i0 + 1, f - i0 as f32)
}

/// Locality-aware histogram equalization of pixel intensity.
///
/// `granularity` in `[0, 1]` sets how local the histograms are (0 is a single
/// global histogram, 1 a 16×16 tile grid); `amount` in `[0, 1]` blends the
/// equalized intensity with the original. `amount == 0` returns the input
/// unchanged. Hue is kept by scaling each color by the intensity ratio.
pub fn tone_enhance(buffer: &PixelBuffer, granularity: f64, amount: f64) -> PixelBuffer {
    if amount == 0.0 {
        return buffer.clone();
    }
    if !(0.0..=1.0).contains(&granularity) || !(0.0..=1.0).contains(&amount) {
        warn!("tone_enhance: parameters out of range (granularity={granularity}, amount={amount}), clamping");
    }
    let granularity = if granularity.is_nan() {
        0.0
    } else {
        granularity.clamp(0.0, 1.0)
    };
    let amount: f32 = if amount.is_nan() {
        0.0
    } else {
        amount.clamp(0.0, 1.0) as f32
    };
    if amount == 0.0 || buffer.is_empty() {
        return buffer.clone();
    }

    let src = buffer.to_direct();
    let (w, h) = (src.w, src.h);
    let requested = 1 + (granularity * (MAX_TONE_TILES - 1) as f64).round() as usize;
    let tile_w = w.div_ceil(requested.min(w));
    let tile_h = h.div_ceil(requested.min(h));
    let (nx, ny) = (w.div_ceil(tile_w), h.div_ceil(tile_h));

    let mut counts = vec![[0u32; 256]; nx * ny];
    for (y, row) in src.rows().enumerate() {
        let tile_row = (y / tile_h) * nx;
        for (x, px) in row.iter().enumerate() {
            if px.is_opaque() {
                counts[tile_row + x / tile_w][intensity(*px) as usize] += 1;
            }
        }
    }
    let maps: Vec<[f32; 256]> = counts.iter().map(tile_tone_map).collect();

    let mut out = src.clone();
    out.depth = Depth::Bit32;
    for y in 0..h {
        let (ty0, ty1, wy) = tile_blend(y, tile_h, ny);
        for x in 0..w {
            let idx = out.idx(x, y);
            let px = src.data[idx];
            if px.is_transparent() {
                continue;
            }
            let (tx0, tx1, wx) = tile_blend(x, tile_w, nx);
            let v = intensity(px);
            let sample = |ty: usize, tx: usize| maps[ty * nx + tx][v as usize];
            let top = sample(ty0, tx0) * (1.0 - wx) + sample(ty0, tx1) * wx;
            let bottom = sample(ty1, tx0) * (1.0 - wx) + sample(ty1, tx1) * wx;
            let target = top * (1.0 - wy) + bottom * wy;
            let blended = v as f32 + amount * (target - v as f32);

            out.data[idx] = if v == 0 {
                let g = round_channel(blended);
                Rgba::opaque(g, g, g)
            } else {
                let scale = blended / v as f32;
                let ch = |c: u8| round_channel(c as f32 * scale);
                Rgba::opaque(ch(px.r()), ch(px.g()), ch(px.b()))
            };
        }
    }
    out.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageViewMut;

    fn gradient(w: usize, h: usize, lo: u8, hi: u8) -> PixelBuffer {
        let mut img = RgbaImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let t = (x + y * w) as f32 / (w * h - 1) as f32;
                let v = (lo as f32 + t * (hi - lo) as f32).round() as u8;
                img.set(x, y, Rgba::opaque(v, v, v));
            }
        }
        img.into()
    }

    #[test]
    fn cumulative_histogram_is_prefix_sum() {
        let mut hist = Histogram::default();
        hist.add(Rgba::opaque(0, 10, 255));
        hist.add(Rgba::opaque(0, 20, 255));
        hist.add(Rgba::TRANSPARENT);
        let cum = CumulativeHistogram::from(&hist);
        assert_eq!(cum.red[0], 2);
        assert_eq!(cum.green[9], 0);
        assert_eq!(cum.green[15], 1);
        assert_eq!(cum.green[255], 2);
        assert_eq!(cum.alpha[255], 3);
        assert_eq!(hist.opaque_count(), 2);
    }

    #[test]
    fn equalize_stretches_narrow_range() {
        let mut b = gradient(8, 8, 100, 140);
        assert!(equalize(&mut b));
        let first = b.pixel(0, 0);
        let last = b.pixel(7, 7);
        assert!(first.r() < 10, "first={first:?}");
        assert_eq!(last.r(), 255);
    }

    #[test]
    fn equalize_leaves_flat_zero_channel_untouched() {
        let mut b = PixelBuffer::filled(4, 4, Rgba::opaque(0, 90, 0));
        assert!(equalize(&mut b));
        // Red and blue are all zero: no range. Green has no zeros, so cum[0] = 0
        // and its constant value is stretched to the top.
        assert_eq!(b.pixel(1, 1), Rgba::opaque(0, 255, 0));
        let mut empty = PixelBuffer::new(0, 3);
        assert!(!equalize(&mut empty));
    }

    #[test]
    fn tone_enhance_zero_amount_is_identity() {
        let b = gradient(9, 7, 30, 200);
        for g in [0.0, 0.3, 1.0] {
            assert!(PixelBuffer::ptr_eq(&tone_enhance(&b, g, 0.0), &b));
        }
    }

    #[test]
    fn tone_enhance_global_full_amount_stretches() {
        let b = gradient(16, 16, 60, 120);
        let out = tone_enhance(&b, 0.0, 1.0);
        assert_eq!(out.pixel(0, 0).r(), 0);
        assert_eq!(out.pixel(15, 15).r(), 255);
        let mid = out.pixel(8, 8);
        assert_eq!((mid.r(), mid.g()), (mid.g(), mid.b()));
    }

    #[test]
    fn tone_enhance_keeps_transparency() {
        let mut img = RgbaImage::filled(6, 6, Rgba::opaque(50, 100, 25));
        img.set(2, 3, Rgba::TRANSPARENT);
        img.set(0, 0, Rgba::opaque(10, 20, 5));
        let b: PixelBuffer = img.into();
        let out = tone_enhance(&b, 1.0, 0.5);
        assert_eq!(out.mask(), b.mask());
    }
}
