//! Brightness / contrast / gamma adjustment through per-channel lookup tables.
//!
//! Each strength lies in `[-50, 50]`; zero for all three is an exact identity.
//! The per-value pipeline is `gamma(contrast(brightness(v)))`, each step
//! clamped to a byte. Integer steps truncate toward zero.
use log::warn;

use super::pixel::{apply_luts, ChannelLuts};
use super::ChannelMask;
use crate::arith::clamp_u8;
use crate::image::PixelBuffer;

pub const MIN_STRENGTH: i32 = -50;
pub const MAX_STRENGTH: i32 = 50;

#[inline]
fn brightness(base: i32, strength: i32) -> i32 {
    clamp_u8(base + strength * 255 / 50) as i32
}

#[inline]
fn contrast(base: i32, strength: i32) -> i32 {
    clamp_u8((base - 127) * (strength + 50) / 50 + 127) as i32
}

#[inline]
fn gamma(base: i32, strength: i32) -> i32 {
    let exponent = 1.0 / 10f64.powf(strength as f64 / 50.0);
    let v = (255.0 * (base as f64 / 255.0).powf(exponent)).round();
    clamp_u8(v as i32) as i32
}

/// Value of the balance pipeline for one channel byte.
pub fn balance_value(base: u8, brightness_strength: i32, contrast_strength: i32, gamma_strength: i32) -> u8 {
    let v = brightness(base as i32, brightness_strength);
    let v = contrast(v, contrast_strength);
    gamma(v, gamma_strength) as u8
}

fn clamp_strength(name: &str, value: i32) -> i32 {
    if !(MIN_STRENGTH..=MAX_STRENGTH).contains(&value) {
        warn!("balance: {name} strength {value} outside [{MIN_STRENGTH}, {MAX_STRENGTH}], clamping");
    }
    value.clamp(MIN_STRENGTH, MAX_STRENGTH)
}

/// Lookup tables for the given strengths; disabled channels map to themselves.
pub fn balance_luts(channels: ChannelMask, brightness: i32, contrast: i32, gamma: i32) -> ChannelLuts {
    let b = clamp_strength("brightness", brightness);
    let c = clamp_strength("contrast", contrast);
    let g = clamp_strength("gamma", gamma);
    ChannelLuts::from_fn(channels, |v| balance_value(v, b, c, g))
}

pub fn balance(
    buffer: &PixelBuffer,
    channels: ChannelMask,
    brightness: i32,
    contrast: i32,
    gamma: i32,
) -> PixelBuffer {
    let luts = balance_luts(channels, brightness, contrast, gamma);
    apply_luts(buffer, &luts)
}
