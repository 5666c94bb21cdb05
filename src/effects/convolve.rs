//! General N×N convolution with edge replication, plus the Gaussian sharpen
//! and emboss kernels built on top of it.
//!
//! - Kernel weights are normalized to sum to 1 before use; sums within
//!   `1e-6` of zero are treated as 1 so high-pass kernels do not blow up.
//! - Rows and columns outside the image clamp to the nearest edge.
//! - Only the color channels are filtered. Alpha is copied from the source
//!   pixel, so the transparency mask is unchanged by convolution.
//!
//! Malformed input (even kernel size, weight count mismatch, image smaller
//! than 3×3, zero sigma) is logged and the input handle is returned as is.
use log::warn;

use super::histogram::equalize;
use crate::arith::{clamp_index, round_channel};
use crate::image::{ImageView, ImageViewMut, PixelBuffer, Rgba, RgbaImage};

/// `sqrt(2π)`
const SQRT_2PI: f32 = 2.506_628_3;
const NORMALIZE_EPSILON: f32 = 1e-6;
/// Smallest image dimension accepted by [`convolve`].
pub const MIN_CONVOLVE_DIM: usize = 3;

/// Square convolution kernel in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvolutionKernel {
    size: usize,
    weights: Vec<f32>,
}

impl ConvolutionKernel {
    /// Wraps raw weights. Shape is validated by [`convolve`], not here.
    pub fn from_weights(size: usize, weights: Vec<f32>) -> Self {
        Self { size, weights }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn is_well_formed(&self) -> bool {
        self.size % 2 == 1 && self.weights.len() == self.size * self.size
    }

    /// Reciprocal of the weight sum, or 1 when the sum is ~0.
    pub fn normalization(&self) -> f32 {
        let sum: f32 = self.weights.iter().sum();
        if sum.abs() <= NORMALIZE_EPSILON {
            1.0
        } else {
            1.0 / sum
        }
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.weights[row * self.size + col]
    }

    /// High-pass kernel: an inverted Gaussian with a boosted centre.
    pub fn gaussian_sharpen(radius: f32, sigma: f32) -> Option<Self> {
        if sigma == 0.0 {
            warn!("gaussian_sharpen: zero sigma is invalid");
            return None;
        }
        let size = kernel_size(radius, sigma, true);
        let half = (size / 2) as i32;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let mut weights = Vec::with_capacity(size * size);
        let mut sum = 0.0f32;
        for y in -half..=half {
            for x in -half..=half {
                let alpha = (-((x * x + y * y) as f32) / two_sigma_sq).exp();
                let w = alpha / (std::f32::consts::PI * two_sigma_sq);
                weights.push(w);
                sum += w;
            }
        }
        let centre = weights.len() / 2;
        weights[centre] = -2.0 * sum;
        Some(Self { size, weights })
    }

    /// Directional kernel: a ±8 scaled Gaussian, negative on the upper/left
    /// side, with the anti-diagonal through the centre zeroed.
    pub fn emboss(radius: f32, sigma: f32) -> Option<Self> {
        if sigma == 0.0 {
            warn!("emboss: zero sigma is invalid");
            return None;
        }
        let size = kernel_size(radius, sigma, true);
        let half = (size / 2) as i32;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let mut weights = Vec::with_capacity(size * size);
        for y in -half..=half {
            for x in -half..=half {
                let w = if x == -y {
                    0.0
                } else {
                    let alpha = (-((x * x + y * y) as f32) / two_sigma_sq).exp();
                    let sign = if x < 0 || y < 0 { -8.0 } else { 8.0 };
                    sign * alpha / (SQRT_2PI * sigma)
                };
                weights.push(w);
            }
        }
        Some(Self { size, weights })
    }
}

/// Odd kernel width for a Gaussian of the given radius and sigma.
///
/// A positive radius fixes the width at `2 * ceil(radius) + 1`. Otherwise the
/// width grows from 5 until the normalized edge sample no longer registers
/// at 8-bit (or 16-bit with `high_precision`) resolution, then backs off to
/// the last width where it still did.
pub fn kernel_size(radius: f32, sigma: f32, high_precision: bool) -> usize {
    if radius > 0.0 {
        return (2.0 * radius.ceil() + 1.0) as usize;
    }
    if sigma == 0.0 {
        warn!("kernel_size: zero sigma is invalid");
        return 5;
    }
    let max = if high_precision { 65535.0 } else { 255.0 };
    let two_sigma_sq = 2.0 * sigma * sigma;
    let sigma_sqrt_2pi = SQRT_2PI * sigma;
    let sample = |i: i32| (-((i * i) as f32) / two_sigma_sq).exp() / sigma_sqrt_2pi;

    let mut size = 5usize;
    loop {
        let half = (size / 2) as i32;
        let normalize: f32 = (-half..=half).map(sample).sum();
        let edge = sample(half) / normalize;
        size += 2;
        if (max * edge) as i32 <= 0 {
            break;
        }
    }
    size - 4
}

/// Convolves the color channels of `buffer` with `kernel`.
pub fn convolve(buffer: &PixelBuffer, kernel: &ConvolutionKernel) -> PixelBuffer {
    if !kernel.is_well_formed() {
        warn!(
            "convolve: kernel must be odd-sized and square (size={}, weights={})",
            kernel.size(),
            kernel.weights().len()
        );
        return buffer.clone();
    }
    let (w, h) = (buffer.width(), buffer.height());
    if w < MIN_CONVOLVE_DIM || h < MIN_CONVOLVE_DIM {
        warn!("convolve: image {w}x{h} is too small");
        return buffer.clone();
    }

    let src = buffer.to_direct();
    let n = kernel.size();
    let edge = (n / 2) as isize;
    let scale = kernel.normalization();
    let weights: Vec<f32> = kernel.weights().iter().map(|k| k * scale).collect();

    // Column offsets are resolved once per x; rows once per y.
    let mut cols = vec![0usize; n];
    let mut rows: Vec<&[Rgba]> = Vec::with_capacity(n);
    let mut out = RgbaImage::new(w, h);
    for y in 0..h {
        rows.clear();
        rows.extend((-edge..=edge).map(|dy| src.row(clamp_index(y as isize + dy, h))));
        let centre_row = rows[edge as usize];
        let dst = out.row_mut(y);
        for (x, dst_px) in dst.iter_mut().enumerate() {
            let source = centre_row[x];
            if source.is_transparent() {
                continue;
            }
            for (i, col) in cols.iter_mut().enumerate() {
                *col = clamp_index(x as isize + i as isize - edge, w);
            }
            let (mut r, mut g, mut b) = (0.0f32, 0.0f32, 0.0f32);
            for (row, krow) in rows.iter().zip(weights.chunks_exact(n)) {
                for (&k, &c) in krow.iter().zip(cols.iter()) {
                    let px = row[c];
                    r += k * px.r() as f32;
                    g += k * px.g() as f32;
                    b += k * px.b() as f32;
                }
            }
            *dst_px = Rgba::opaque(round_channel(r), round_channel(g), round_channel(b));
        }
    }
    out.into()
}

/// Sharpens by convolving with [`ConvolutionKernel::gaussian_sharpen`].
pub fn gaussian_sharpen(buffer: &PixelBuffer, radius: f32, sigma: f32) -> PixelBuffer {
    match ConvolutionKernel::gaussian_sharpen(radius, sigma) {
        Some(kernel) => convolve(buffer, &kernel),
        None => buffer.clone(),
    }
}

/// Emboss: directional convolution followed by histogram equalization to
/// stretch the otherwise low-contrast result.
pub fn emboss(buffer: &PixelBuffer, radius: f32, sigma: f32) -> PixelBuffer {
    let Some(kernel) = ConvolutionKernel::emboss(radius, sigma) else {
        return buffer.clone();
    };
    let mut out = convolve(buffer, &kernel);
    if PixelBuffer::ptr_eq(&out, buffer) {
        return out;
    }
    equalize(&mut out);
    out
}
