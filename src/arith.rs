//! Overflow-safe size arithmetic and clamped lookups shared by the engines.

/// Multiplies `w * h * bytes_per_pixel`, returning `None` on overflow or
/// when the result exceeds the largest possible allocation (`isize::MAX`).
#[inline]
pub fn checked_byte_size(w: usize, h: usize, bytes_per_pixel: usize) -> Option<usize> {
    let bytes = w.checked_mul(h)?.checked_mul(bytes_per_pixel)?;
    (bytes <= isize::MAX as usize).then_some(bytes)
}

/// Clamps a signed coordinate into `[0, len - 1]`. `len` must be non-zero.
#[inline]
pub fn clamp_index(i: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    if i <= 0 {
        0
    } else if i as usize >= len {
        len - 1
    } else {
        i as usize
    }
}

/// Saturates an integer channel value into a byte.
#[inline]
pub fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Converts an accumulated channel value to a byte, rounding half up.
///
/// Values below zero map to 0 and values above 255 map to 255; everything in
/// between is `(v + 0.5)` truncated.
#[inline]
pub fn round_channel(v: f32) -> u8 {
    if v < 0.0 {
        0
    } else if v > 255.0 {
        255
    } else {
        (v + 0.5) as u8
    }
}

/// Linear interpolation between two bytes with a weight in `[0, 1]`.
#[inline]
pub fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    round_channel(a as f32 + (b as f32 - a as f32) * t)
}
