//! Resampling a buffer through an affine matrix, plus the rotate / skew / flip
//! entry points built on it.
use log::{debug, warn};

use super::matrix::{rotate_matrix, skew_matrix, TransformMatrix, ANGLE_EPSILON};
use crate::arith::checked_byte_size;
use crate::geom::Rect;
use crate::image::{BitMask, Color, IndexedImage, PixelBuffer, Repr, Rgba, RgbaImage};

/// Transforms `buffer` through `matrix` with nearest-neighbour sampling.
///
/// The output covers the mapped source rectangle. When `target` asks for a
/// different size, a scale is folded into the matrix so that the transform
/// and the resize share one resampling pass. Pixels not covered by the
/// source take `background` (an invalid color counts as transparent); covered
/// pixels copy the source pixel, transparency included.
pub fn xform(
    buffer: &PixelBuffer,
    matrix: &TransformMatrix,
    background: Color,
    target: Option<(usize, usize)>,
) -> PixelBuffer {
    let (w, h) = (buffer.width(), buffer.height());
    let natural = matrix.map_rect(Rect::of_size(w, h));
    let mut m = matrix.then(&TransformMatrix::translation(
        -natural.x as f64,
        -natural.y as f64,
    ));
    let natural_size = (natural.w.max(0) as usize, natural.h.max(0) as usize);
    let (dw, dh) = match target {
        Some(size) if size != natural_size => {
            if natural_size.0 > 0 && natural_size.1 > 0 {
                let sx = size.0 as f64 / natural_size.0 as f64;
                let sy = size.1 as f64 / natural_size.1 as f64;
                m = m.then(&TransformMatrix::scaling(sx, sy));
            }
            size
        }
        _ => natural_size,
    };
    if checked_byte_size(dw, dh, std::mem::size_of::<Rgba>()).is_none() {
        warn!("xform: output {dw}x{dh} is too large, returning input");
        return buffer.clone();
    }

    let fill = background.to_rgba().unwrap_or_else(|| {
        debug!("xform: invalid background, using transparent");
        Rgba::TRANSPARENT
    });
    let mut out = RgbaImage::filled(dw, dh, fill);
    if w == 0 || h == 0 {
        return out.into();
    }
    let Some(inverse) = m.inverse() else {
        warn!("xform: singular matrix, returning input");
        return buffer.clone();
    };

    let src = buffer.to_direct();
    for y in 0..dh {
        for x in 0..dw {
            let (sx, sy) = inverse.map(x as f64 + 0.5, y as f64 + 0.5);
            let (fx, fy) = (sx.floor(), sy.floor());
            if fx >= 0.0 && fy >= 0.0 && fx < w as f64 && fy < h as f64 {
                let idx = out.idx(x, y);
                out.data[idx] = src.data[src.idx(fx as usize, fy as usize)];
            }
        }
    }
    out.into()
}

/// Rotates clockwise by `angle` degrees; exposed corners take `background`.
pub fn rotate(buffer: &PixelBuffer, angle: f64, background: Color) -> PixelBuffer {
    if angle % 360.0 == 0.0 {
        return buffer.clone();
    }
    let matrix = rotate_matrix(buffer.width(), buffer.height(), angle);
    xform(buffer, &matrix, background, None)
}

/// Skews by the given angles (degrees, each strictly inside (-90, 90)),
/// optionally resizing to `target` in the same pass.
pub fn skew(
    buffer: &PixelBuffer,
    horizontal: f64,
    vertical: f64,
    background: Color,
    target: Option<(usize, usize)>,
) -> PixelBuffer {
    let in_range = |a: f64| a > -90.0 && a < 90.0;
    if !in_range(horizontal) || !in_range(vertical) {
        warn!("skew: angles ({horizontal}, {vertical}) outside (-90, 90)");
        return buffer.clone();
    }
    if horizontal.abs() < ANGLE_EPSILON && vertical.abs() < ANGLE_EPSILON && target.is_none() {
        return buffer.clone();
    }
    let matrix = skew_matrix(buffer.width(), buffer.height(), horizontal, vertical);
    xform(buffer, &matrix, background, target)
}

/// Source position of a mirrored coordinate.
#[inline]
fn mirror(i: usize, len: usize, flip: bool) -> usize {
    if flip {
        len - 1 - i
    } else {
        i
    }
}

fn mirror_plane<T: Copy>(data: &[T], w: usize, h: usize, horizontal: bool, vertical: bool) -> Vec<T> {
    let mut out = Vec::with_capacity(data.len());
    for y in 0..h {
        let row = &data[mirror(y, h, vertical) * w..][..w];
        if horizontal {
            out.extend(row.iter().rev());
        } else {
            out.extend_from_slice(row);
        }
    }
    out
}

fn mirror_mask(mask: &BitMask, horizontal: bool, vertical: bool) -> BitMask {
    let (w, h) = (mask.width(), mask.height());
    let mut out = BitMask::new(w, h, false);
    for y in 0..h {
        for x in 0..w {
            if mask.get(mirror(x, w, horizontal), mirror(y, h, vertical)) {
                out.set(x, y, true);
            }
        }
    }
    out
}

/// Mirrors the buffer. Pixels are moved, never resampled, so paletted
/// buffers stay paletted and flipping twice restores the input.
pub fn flip(buffer: &PixelBuffer, horizontal: bool, vertical: bool) -> PixelBuffer {
    if !horizontal && !vertical {
        return buffer.clone();
    }
    match buffer.repr() {
        Repr::Direct(img) => RgbaImage {
            data: mirror_plane(&img.data, img.w, img.h, horizontal, vertical),
            ..img.clone()
        }
        .into(),
        Repr::Indexed(img) => IndexedImage {
            indices: mirror_plane(&img.indices, img.w, img.h, horizontal, vertical),
            mask: img.mask.as_ref().map(|m| mirror_mask(m, horizontal, vertical)),
            ..img.clone()
        }
        .into(),
    }
}
