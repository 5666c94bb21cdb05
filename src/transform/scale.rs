//! Resizing: smooth separable resampling or a plain nearest-neighbour matrix.
//!
//! The smooth path works on premultiplied values with alpha in `{0, 1}`, so
//! transparent pixels contribute no color. The resampled alpha is thresholded
//! back to 1 bit at one half.
use std::mem::size_of;

use log::warn;

use super::matrix::scale_matrix;
use super::xform::xform;
use crate::arith::{checked_byte_size, round_channel};
use crate::image::{Color, ImageView, PixelBuffer, Rgba, RgbaImage};

/// Source contributions for one destination sample along an axis.
type Taps = Vec<(usize, f32)>;

/// Bilinear taps when enlarging, box (area-average) taps when shrinking.
fn axis_taps(src: usize, dst: usize) -> Vec<Taps> {
    let ratio = src as f64 / dst as f64;
    (0..dst)
        .map(|i| {
            if dst > src {
                let centre = ((i as f64 + 0.5) * ratio - 0.5).clamp(0.0, (src - 1) as f64);
                let i0 = centre.floor() as usize;
                let i1 = (i0 + 1).min(src - 1);
                let t = (centre - i0 as f64) as f32;
                vec![(i0, 1.0 - t), (i1, t)]
            } else {
                let start = i as f64 * ratio;
                let end = (i + 1) as f64 * ratio;
                let mut taps = Vec::new();
                let mut s = start.floor() as usize;
                while (s as f64) < end && s < src {
                    let overlap = (end.min(s as f64 + 1.0) - start.max(s as f64)) as f32;
                    if overlap > 0.0 {
                        taps.push((s, overlap / ratio as f32));
                    }
                    s += 1;
                }
                taps
            }
        })
        .collect()
}

#[inline]
fn premultiplied(px: Rgba) -> [f32; 4] {
    if px.is_opaque() {
        [px.r() as f32, px.g() as f32, px.b() as f32, 1.0]
    } else {
        [0.0; 4]
    }
}

fn accumulate(acc: &mut [f32; 4], v: &[f32; 4], weight: f32) {
    for (a, x) in acc.iter_mut().zip(v) {
        *a += x * weight;
    }
}

fn smooth_scale(src: &RgbaImage, w: usize, h: usize) -> RgbaImage {
    let x_taps = axis_taps(src.w, w);
    let y_taps = axis_taps(src.h, h);

    let mut horizontal = vec![[0f32; 4]; w * src.h];
    for (y, row) in src.rows().enumerate() {
        let values: Vec<[f32; 4]> = row.iter().map(|&px| premultiplied(px)).collect();
        for (x, taps) in x_taps.iter().enumerate() {
            let acc = &mut horizontal[y * w + x];
            for &(sx, weight) in taps {
                accumulate(acc, &values[sx], weight);
            }
        }
    }

    let mut out = RgbaImage::new(w, h);
    for (y, taps) in y_taps.iter().enumerate() {
        for x in 0..w {
            let mut acc = [0f32; 4];
            for &(sy, weight) in taps {
                accumulate(&mut acc, &horizontal[sy * w + x], weight);
            }
            let alpha = acc[3];
            if alpha >= 0.5 {
                let idx = out.idx(x, y);
                out.data[idx] = Rgba::opaque(
                    round_channel(acc[0] / alpha),
                    round_channel(acc[1] / alpha),
                    round_channel(acc[2] / alpha),
                );
            }
        }
    }
    out
}

/// Resizes to `w × h`. `pretty` selects smooth resampling through a
/// full-color intermediate; otherwise pixels are sampled nearest-neighbour.
pub fn scale(buffer: &PixelBuffer, w: usize, h: usize, pretty: bool) -> PixelBuffer {
    let (src_w, src_h) = (buffer.width(), buffer.height());
    if (w, h) == (src_w, src_h) {
        return buffer.clone();
    }
    if w == 0 || h == 0 {
        warn!("scale: target size {w}x{h} is empty");
        return buffer.clone();
    }
    // Covers the output, the horizontal pass and the per-axis tap lists.
    let fits = checked_byte_size(w, h.max(src_h), size_of::<[f32; 4]>()).is_some()
        && checked_byte_size(w.max(h), 1, size_of::<Taps>()).is_some();
    if !fits {
        warn!("scale: target size {w}x{h} is too large");
        return buffer.clone();
    }
    if src_w == 0 || src_h == 0 {
        return PixelBuffer::new(w, h);
    }
    if pretty {
        return smooth_scale(&buffer.to_direct(), w, h).into();
    }
    let matrix = scale_matrix(w as f64 / src_w as f64, h as f64 / src_h as f64);
    xform(buffer, &matrix, Color::Transparent, Some((w, h)))
}
