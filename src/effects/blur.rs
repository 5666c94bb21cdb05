//! Separable box blur and the strength-driven blur / sharpen / emboss effects.
use log::warn;
use serde::{Deserialize, Serialize};

use super::convolve::{emboss, gaussian_sharpen};
use crate::arith::clamp_index;
use crate::image::{ImageView, PixelBuffer, Rgba, RgbaImage};

/// Upper bound of the effect strength slider; 0 is always the identity.
pub const MAX_STRENGTH: u32 = 10;
/// Largest radius used by [`BlurSharpenKind::MakeConfidential`].
pub const CONFIDENTIAL_MAX_RADIUS: usize = 20;

const BLUR_MIN_RADIUS: f64 = 1.0;
const BLUR_MAX_RADIUS: f64 = 10.0;
const SHARPEN_MIN_RADIUS: f32 = 0.1;
const SHARPEN_MAX_RADIUS: f32 = 2.5;
const SHARPEN_MIN_SIGMA: f32 = 0.5;
const SHARPEN_MAX_SIGMA: f32 = 3.0;
const SHARPEN_MIN_REPEAT: f64 = 1.0;
const SHARPEN_MAX_REPEAT: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurSharpenKind {
    Blur,
    Sharpen,
    MakeConfidential,
}

/// Box blur with a `(2r+1)`-wide window, horizontal pass then vertical.
///
/// Window samples outside the image clamp to the edge. Only RGB is filtered;
/// transparent pixels stay transparent but their (zero) color does take part
/// in the neighbours' averages.
pub fn blur(buffer: &PixelBuffer, radius: usize) -> PixelBuffer {
    if radius == 0 || buffer.is_empty() {
        return buffer.clone();
    }
    let src = buffer.to_direct();
    let (w, h) = (src.w, src.h);
    let div = (2 * radius + 1) as u32;
    let r = radius as isize;

    let mut horizontal = vec![[0u8; 3]; w * h];
    for (y, row) in src.rows().enumerate() {
        let mut sum = [0u32; 3];
        for dx in -r..=r {
            add(&mut sum, row[clamp_index(dx, w)].channels());
        }
        for x in 0..w {
            horizontal[y * w + x] = average(sum, div);
            let leaving = row[clamp_index(x as isize - r, w)].channels();
            let entering = row[clamp_index(x as isize + r + 1, w)].channels();
            slide(&mut sum, leaving, entering);
        }
    }

    let mut out = RgbaImage::new(w, h);
    for x in 0..w {
        let at = |y: isize| horizontal[clamp_index(y, h) * w + x];
        let mut sum = [0u32; 3];
        for dy in -r..=r {
            add(&mut sum, at(dy));
        }
        for y in 0..h {
            let idx = out.idx(x, y);
            let source = src.data[idx];
            if source.is_opaque() {
                let [red, green, blue] = average(sum, div);
                out.data[idx] = Rgba::opaque(red, green, blue);
            }
            slide(&mut sum, at(y as isize - r), at(y as isize + r + 1));
        }
    }
    out.into()
}

#[inline]
fn add(sum: &mut [u32; 3], c: [u8; 3]) {
    for (s, v) in sum.iter_mut().zip(c) {
        *s += v as u32;
    }
}

#[inline]
fn slide(sum: &mut [u32; 3], leaving: [u8; 3], entering: [u8; 3]) {
    for ((s, l), e) in sum.iter_mut().zip(leaving).zip(entering) {
        *s = *s + e as u32 - l as u32;
    }
}

#[inline]
fn average(sum: [u32; 3], div: u32) -> [u8; 3] {
    sum.map(|s| ((s + div / 2) / div) as u8)
}

/// Linear interpolation of a slider strength in `[1, MAX_STRENGTH]`.
fn interpolate(strength: u32, min: f64, max: f64) -> f64 {
    min + (strength as f64 - 1.0) * (max - min) / (MAX_STRENGTH as f64 - 1.0)
}

/// Blur radius for a blur strength in `[1, MAX_STRENGTH]`.
pub fn blur_radius(strength: u32) -> usize {
    interpolate(strength, BLUR_MIN_RADIUS, BLUR_MAX_RADIUS).round() as usize
}

/// `(radius, sigma, repeat)` for a sharpen strength in `[1, MAX_STRENGTH]`.
pub fn sharpen_params(strength: u32) -> (f32, f32, usize) {
    let radius = interpolate(strength, SHARPEN_MIN_RADIUS as f64, SHARPEN_MAX_RADIUS as f64);
    let sigma = interpolate(strength, SHARPEN_MIN_SIGMA as f64, SHARPEN_MAX_SIGMA as f64);
    let repeat = interpolate(strength, SHARPEN_MIN_REPEAT, SHARPEN_MAX_REPEAT).round();
    (radius as f32, sigma as f32, repeat as usize)
}

fn clamp_strength(effect: &str, strength: u32) -> u32 {
    if strength > MAX_STRENGTH {
        warn!("{effect}: strength {strength} above {MAX_STRENGTH}, clamping");
    }
    strength.min(MAX_STRENGTH)
}

pub fn blur_sharpen(buffer: &PixelBuffer, kind: BlurSharpenKind, strength: u32) -> PixelBuffer {
    let strength = clamp_strength("blur_sharpen", strength);
    if strength == 0 {
        return buffer.clone();
    }
    match kind {
        BlurSharpenKind::Blur => blur(buffer, blur_radius(strength)),
        BlurSharpenKind::Sharpen => {
            let (radius, sigma, repeat) = sharpen_params(strength);
            let mut out = buffer.clone();
            for _ in 0..repeat {
                out = gaussian_sharpen(&out, radius, sigma);
            }
            out
        }
        BlurSharpenKind::MakeConfidential => {
            let radius = CONFIDENTIAL_MAX_RADIUS.min(buffer.width() / 2);
            blur(buffer, radius)
        }
    }
}

/// Emboss at the given strength. Any non-zero strength gives the same result.
pub fn emboss_effect(buffer: &PixelBuffer, strength: u32) -> PixelBuffer {
    let strength = clamp_strength("emboss", strength);
    if strength == 0 {
        return buffer.clone();
    }
    emboss(buffer, 0.0, 1.0)
}
