//! Color-depth conversion and the "reduce colors" effect.
//!
//! Alpha is never diffused: transparent pixels are thresholded onto the mask
//! plane (or the transparent palette entry) and take no part in error
//! diffusion, neither giving nor receiving error.
use std::collections::HashMap;

use log::{debug, error};

use crate::image::{Depth, IndexedImage, PixelBuffer, Rgba, RgbaImage};

/// Levels per channel of the 8-bit color cube.
const CUBE_LEVELS: u32 = 6;
const CUBE_STEP: u32 = 255 / (CUBE_LEVELS - 1);

const FS_RIGHT: f32 = 7.0 / 16.0;
const FS_DOWN_LEFT: f32 = 3.0 / 16.0;
const FS_DOWN: f32 = 5.0 / 16.0;
const FS_DOWN_RIGHT: f32 = 1.0 / 16.0;

/// Converts `buffer` to the storage format of `depth`.
///
/// `dither` selects Floyd–Steinberg diffusion over nearest-color mapping.
/// A buffer already at `depth` is returned as is.
pub fn convert_depth(buffer: &PixelBuffer, depth: Depth, dither: bool) -> PixelBuffer {
    if buffer.depth() == depth {
        return buffer.clone();
    }
    let src = buffer.to_direct();
    match depth {
        Depth::Bit1 => {
            if !dither {
                if let Some(img) = two_color_image(&src) {
                    debug!("convert_depth: two-color fast path");
                    return img.into();
                }
            }
            to_monochrome(&src, dither).into()
        }
        Depth::Bit8 => to_indexed8(&src, dither).into(),
        Depth::Bit16 => to_rgb565(&src, dither).into(),
        Depth::Bit24 | Depth::Bit32 => {
            let mut img = src;
            img.depth = depth;
            img.into()
        }
    }
}

/// Visual color quantization to 1 or 8 bits, re-expanded to 32-bit direct color.
pub fn reduce_colors(buffer: &PixelBuffer, depth: Depth, dither: bool) -> PixelBuffer {
    if !depth.is_indexed() {
        error!("reduce_colors: unsupported depth {}", depth.bits());
        return buffer.clone();
    }
    let mut img = convert_depth(buffer, depth, dither).into_direct();
    img.depth = Depth::Bit32;
    img.into()
}

/// Distinct colors in row-major first-seen order with per-pixel indices, or
/// `None` once more than `limit` colors are found.
fn exact_palette(src: &RgbaImage, limit: usize, with_transparent: bool) -> Option<(Vec<Rgba>, Vec<u8>)> {
    let mut palette = Vec::new();
    let mut lookup: HashMap<Rgba, u8> = HashMap::new();
    let mut indices = Vec::with_capacity(src.data.len());
    for &px in &src.data {
        if px.is_transparent() && !with_transparent {
            indices.push(0);
            continue;
        }
        let idx = match lookup.get(&px) {
            Some(&idx) => idx,
            None => {
                if palette.len() == limit {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push(px);
                lookup.insert(px, idx);
                idx
            }
        };
        indices.push(idx);
    }
    Some((palette, indices))
}

/// Keeps a bicolor image exact: the transparent sentinel counts as a color
/// and becomes a transparent palette entry.
fn two_color_image(src: &RgbaImage) -> Option<IndexedImage> {
    let (mut palette, indices) = exact_palette(src, 2, true)?;
    match palette.len() {
        0 => palette.extend([Rgba::BLACK, Rgba::BLACK]),
        1 => palette.push(palette[0]),
        _ => {}
    }
    let mut img = IndexedImage::new(src.w, src.h, Depth::Bit1, palette);
    img.indices = indices;
    Some(img)
}

fn with_mask(mut img: IndexedImage, src: &RgbaImage) -> IndexedImage {
    if src.has_transparency() {
        img.mask = Some(src.mask());
    }
    img
}

fn to_monochrome(src: &RgbaImage, dither: bool) -> IndexedImage {
    let indices = if dither {
        diffuse(
            src,
            |px| [px.luma() as f32],
            |[v]: [f32; 1]| if v >= 128.0 { (1u8, [255.0]) } else { (0u8, [0.0]) },
        )
    } else {
        src.data
            .iter()
            .map(|px| u8::from(px.is_opaque() && px.luma() >= 128))
            .collect()
    };
    let mut img = IndexedImage::new(src.w, src.h, Depth::Bit1, vec![Rgba::BLACK, Rgba::WHITE]);
    img.indices = indices;
    with_mask(img, src)
}

#[inline]
fn cube_level(v: u8) -> u32 {
    (v as u32 * (CUBE_LEVELS - 1) + 127) / 255
}

#[inline]
fn cube_index(levels: [u32; 3]) -> u8 {
    (levels[0] * CUBE_LEVELS * CUBE_LEVELS + levels[1] * CUBE_LEVELS + levels[2]) as u8
}

fn cube_palette() -> Vec<Rgba> {
    let mut palette = Vec::with_capacity((CUBE_LEVELS * CUBE_LEVELS * CUBE_LEVELS) as usize);
    for r in 0..CUBE_LEVELS {
        for g in 0..CUBE_LEVELS {
            for b in 0..CUBE_LEVELS {
                palette.push(Rgba::opaque(
                    (r * CUBE_STEP) as u8,
                    (g * CUBE_STEP) as u8,
                    (b * CUBE_STEP) as u8,
                ));
            }
        }
    }
    palette
}

fn to_indexed8(src: &RgbaImage, dither: bool) -> IndexedImage {
    if !dither {
        if let Some((palette, indices)) = exact_palette(src, Depth::Bit8.palette_capacity(), false) {
            debug!("convert_depth: {} colors fit an exact palette", palette.len());
            let palette = if palette.is_empty() { vec![Rgba::BLACK] } else { palette };
            let mut img = IndexedImage::new(src.w, src.h, Depth::Bit8, palette);
            img.indices = indices;
            return with_mask(img, src);
        }
    }

    let indices = if dither {
        diffuse(
            src,
            |px| px.channels().map(|c| c as f32),
            |value: [f32; 3]| {
                let levels = value.map(|v| (v * (CUBE_LEVELS - 1) as f32 / 255.0).round() as u32);
                (cube_index(levels), levels.map(|l| (l * CUBE_STEP) as f32))
            },
        )
    } else {
        src.data
            .iter()
            .map(|px| {
                if px.is_opaque() {
                    cube_index(px.channels().map(cube_level))
                } else {
                    0
                }
            })
            .collect()
    };
    let mut img = IndexedImage::new(src.w, src.h, Depth::Bit8, cube_palette());
    img.indices = indices;
    with_mask(img, src)
}

/// Rounds a byte to the nearest of `max + 1` evenly spaced levels.
#[inline]
fn quantize_level(v: u8, max: u32) -> u8 {
    let q = (v as u32 * max + 127) / 255;
    level_value(q, max)
}

#[inline]
fn level_value(q: u32, max: u32) -> u8 {
    ((q * 255 + max / 2) / max) as u8
}

const RGB565_MAX: [u32; 3] = [31, 63, 31];

fn to_rgb565(src: &RgbaImage, dither: bool) -> RgbaImage {
    let mut out = src.clone();
    out.depth = Depth::Bit16;
    if dither {
        let colors = diffuse(
            src,
            |px| px.channels().map(|c| c as f32),
            |value: [f32; 3]| {
                let mut chosen = [0u8; 3];
                for ((c, v), max) in chosen.iter_mut().zip(value).zip(RGB565_MAX) {
                    let q = (v * max as f32 / 255.0).round() as u32;
                    *c = level_value(q, max);
                }
                (chosen, chosen.map(|c| c as f32))
            },
        );
        for (px, [r, g, b]) in out.data.iter_mut().zip(colors) {
            *px = px.with_rgb(r, g, b);
        }
    } else {
        out.map_opaque(|px| {
            px.with_rgb(
                quantize_level(px.r(), RGB565_MAX[0]),
                quantize_level(px.g(), RGB565_MAX[1]),
                quantize_level(px.b(), RGB565_MAX[2]),
            )
        });
    }
    out
}

#[inline]
fn push_error<const N: usize>(slot: &mut [f32; N], err: &[f32; N], weight: f32) {
    for (s, e) in slot.iter_mut().zip(err) {
        *s += e * weight;
    }
}

/// Floyd–Steinberg error diffusion over the opaque pixels of `src`.
///
/// `sample` reads the values to quantize; `quantize` receives them (with the
/// accumulated error added and clamped to `[0, 255]`) and returns the chosen
/// output together with the values that output represents. Transparent
/// pixels get `T::default()`.
fn diffuse<const N: usize, T: Copy + Default>(
    src: &RgbaImage,
    sample: impl Fn(Rgba) -> [f32; N],
    mut quantize: impl FnMut([f32; N]) -> (T, [f32; N]),
) -> Vec<T> {
    let (w, h) = (src.w, src.h);
    let opaque = |x: usize, y: usize| src.data[y * w + x].is_opaque();
    let mut out = vec![T::default(); w * h];
    let mut current = vec![[0f32; N]; w];
    let mut next = vec![[0f32; N]; w];
    for y in 0..h {
        for x in 0..w {
            let px = src.data[y * w + x];
            if px.is_transparent() {
                continue;
            }
            let mut value = sample(px);
            for (v, e) in value.iter_mut().zip(current[x]) {
                *v = (*v + e).clamp(0.0, 255.0);
            }
            let (choice, chosen) = quantize(value);
            out[y * w + x] = choice;

            let mut err = [0f32; N];
            for ((e, v), c) in err.iter_mut().zip(value).zip(chosen) {
                *e = v - c;
            }
            if x + 1 < w && opaque(x + 1, y) {
                push_error(&mut current[x + 1], &err, FS_RIGHT);
            }
            if y + 1 < h {
                if x > 0 && opaque(x - 1, y + 1) {
                    push_error(&mut next[x - 1], &err, FS_DOWN_LEFT);
                }
                if opaque(x, y + 1) {
                    push_error(&mut next[x], &err, FS_DOWN);
                }
                if x + 1 < w && opaque(x + 1, y + 1) {
                    push_error(&mut next[x + 1], &err, FS_DOWN_RIGHT);
                }
            }
        }
        std::mem::swap(&mut current, &mut next);
        next.fill([0.0; N]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageViewMut;

    fn two_tone() -> RgbaImage {
        let mut img = RgbaImage::filled(4, 3, Rgba::opaque(200, 10, 10));
        img.set(1, 0, Rgba::opaque(10, 10, 200));
        img.set(3, 2, Rgba::opaque(10, 10, 200));
        img
    }

    #[test]
    fn two_colors_keep_their_palette() {
        let b: PixelBuffer = two_tone().into();
        let out = convert_depth(&b, Depth::Bit1, false);
        let img = out.as_indexed().expect("1-bit output is paletted");
        assert_eq!(img.depth, Depth::Bit1);
        assert_eq!(img.palette, vec![Rgba::opaque(200, 10, 10), Rgba::opaque(10, 10, 200)]);
        assert!(out.same_pixels(&b));
    }

    #[test]
    fn third_color_takes_generic_path() {
        let mut img = two_tone();
        img.set(0, 1, Rgba::opaque(250, 250, 250));
        let out = convert_depth(&img.into(), Depth::Bit1, false);
        let img = out.as_indexed().expect("1-bit output is paletted");
        assert_eq!(img.palette, vec![Rgba::BLACK, Rgba::WHITE]);
        assert_eq!(out.pixel(0, 1), Rgba::WHITE);
        assert_eq!(out.pixel(0, 0), Rgba::BLACK);
    }

    #[test]
    fn single_color_duplicates_palette_entry() {
        let b = PixelBuffer::filled(3, 3, Rgba::opaque(5, 6, 7));
        let out = convert_depth(&b, Depth::Bit1, false);
        let img = out.as_indexed().expect("paletted");
        assert_eq!(img.palette, vec![Rgba::opaque(5, 6, 7); 2]);
    }

    #[test]
    fn transparent_counts_as_a_color() {
        let mut img = RgbaImage::filled(2, 2, Rgba::opaque(9, 9, 9));
        img.set(1, 1, Rgba::TRANSPARENT);
        let b: PixelBuffer = img.into();
        let out = convert_depth(&b, Depth::Bit1, false);
        assert_eq!(out.as_indexed().map(|i| i.palette.len()), Some(2));
        assert_eq!(out.pixel(1, 1), Rgba::TRANSPARENT);
        assert!(out.same_pixels(&b));
    }

    #[test]
    fn dithered_monochrome_preserves_mean() {
        let b = PixelBuffer::filled(8, 8, Rgba::opaque(100, 100, 100));
        let out = convert_depth(&b, Depth::Bit1, true);
        let white = (0..8)
            .flat_map(|y| (0..8).map(move |x| (x, y)))
            .filter(|&(x, y)| out.pixel(x, y) == Rgba::WHITE)
            .count();
        assert!((15..=35).contains(&white), "white={white}");
    }

    #[test]
    fn dither_never_touches_transparency() {
        let mut img = RgbaImage::filled(6, 6, Rgba::opaque(120, 60, 200));
        img.set(2, 2, Rgba::TRANSPARENT);
        img.set(5, 0, Rgba::TRANSPARENT);
        let b: PixelBuffer = img.into();
        for depth in [Depth::Bit1, Depth::Bit8, Depth::Bit16] {
            let out = convert_depth(&b, depth, true);
            assert_eq!(out.mask(), b.mask(), "depth {}", depth.bits());
        }
    }

    #[test]
    fn few_colors_fit_exact_8bit_palette() {
        let mut img = two_tone();
        img.set(0, 1, Rgba::opaque(1, 2, 3));
        img.set(2, 1, Rgba::TRANSPARENT);
        let b: PixelBuffer = img.into();
        let out = convert_depth(&b, Depth::Bit8, false);
        let indexed = out.as_indexed().expect("paletted");
        assert_eq!(indexed.palette.len(), 3);
        assert!(indexed.mask.is_some());
        assert!(out.same_pixels(&b));
    }

    #[test]
    fn dithered_8bit_uses_color_cube() {
        let b: PixelBuffer = two_tone().into();
        let out = reduce_colors(&b, Depth::Bit8, true);
        assert_eq!(out.depth(), Depth::Bit32);
        for y in 0..3 {
            for x in 0..4 {
                let px = out.pixel(x, y);
                for c in px.channels() {
                    assert_eq!(c % 51, 0, "{px:?}");
                }
            }
        }
    }

    #[test]
    fn rgb565_rounds_to_representable_levels() {
        let b = PixelBuffer::filled(2, 2, Rgba::opaque(100, 100, 100));
        let out = convert_depth(&b, Depth::Bit16, false);
        assert_eq!(out.depth(), Depth::Bit16);
        assert_eq!(out.pixel(1, 1), Rgba::opaque(99, 101, 99));
    }

    #[test]
    fn reduce_colors_rejects_direct_depths() {
        let b: PixelBuffer = two_tone().into();
        assert!(PixelBuffer::ptr_eq(&reduce_colors(&b, Depth::Bit16, false), &b));
        let out = reduce_colors(&b, Depth::Bit1, false);
        assert!(out.as_direct().is_some());
        assert!(out.same_pixels(&b));
    }
}
