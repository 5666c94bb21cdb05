mod common;

use common::init_logging;
use common::synthetic_image::{color_ramp, ramp_with_hole};
use kolour_fx::transform::{
    flip, is_lossless_rotation, rotate, rotate_matrix, scale, skew, skew_matrix, xform,
};
use kolour_fx::{Color, PixelBuffer, Rect, Rgba};

#[test]
fn lossless_rotations_round_trip() {
    init_logging();
    let b = ramp_with_hole(7, 4, 2);
    for angle in [90.0, 180.0, 270.0, -90.0, 450.0] {
        assert!(is_lossless_rotation(angle));
        let there = rotate(&b, angle, Color::Transparent);
        let back = rotate(&there, -angle, Color::Transparent);
        assert_eq!(back, b, "angle {angle}");
    }
}

#[test]
fn quarter_turn_swaps_dimensions() {
    let b = color_ramp(7, 4);
    let out = rotate(&b, 270.0, Color::WHITE);
    assert_eq!((out.width(), out.height()), (4, 7));
    // Counter-clockwise: the top-right source pixel becomes the top-left.
    assert_eq!(out.pixel(0, 0), b.pixel(6, 0));
}

#[test]
fn arbitrary_rotation_fills_corners_with_background() {
    let b = PixelBuffer::filled(20, 10, Rgba::opaque(0, 0, 255));
    let out = rotate(&b, 30.0, Color::rgb(0, 255, 0));
    let bounds = rotate_matrix(20, 10, 30.0).map_rect(Rect::of_size(20, 10));
    assert_eq!((out.width(), out.height()), (bounds.w as usize, bounds.h as usize));
    assert_eq!(out.pixel(0, 0), Rgba::opaque(0, 255, 0));
    assert_eq!(out.pixel(out.width() / 2, out.height() / 2), Rgba::opaque(0, 0, 255));
    assert!(!out.has_transparency());
}

#[test]
fn flip_twice_is_identity() {
    let b = ramp_with_hole(6, 5, 2);
    for (h, v) in [(true, false), (false, true), (true, true)] {
        assert_eq!(flip(&flip(&b, h, v), h, v), b);
    }
    let same = flip(&b, false, false);
    assert!(PixelBuffer::ptr_eq(&same, &b));
}

#[test]
fn zero_skew_is_identity() {
    assert!(skew_matrix(100, 100, 0.0, 0.0).is_identity());
    let b = color_ramp(5, 5);
    assert!(PixelBuffer::ptr_eq(&skew(&b, 0.0, 0.0, Color::WHITE, None), &b));
    assert!(PixelBuffer::ptr_eq(&skew(&b, -95.0, 0.0, Color::WHITE, None), &b));
}

#[test]
fn skew_with_target_resamples_once() {
    let b = color_ramp(10, 6);
    let natural = skew(&b, 20.0, 0.0, Color::Transparent, None);
    let small = skew(&b, 20.0, 0.0, Color::Transparent, Some((natural.width() / 2, 3)));
    assert_eq!((small.width(), small.height()), (natural.width() / 2, 3));
    assert!(small.has_transparency());
}

#[test]
fn xform_with_identity_copies() {
    let b = ramp_with_hole(4, 4, 1);
    let out = xform(&b, &Default::default(), Color::WHITE, None);
    assert!(out.same_pixels(&b));
}

#[test]
fn nearest_scale_up_then_down_restores() {
    let b = color_ramp(5, 3);
    let up = scale(&b, 10, 6, false);
    let down = scale(&up, 5, 3, false);
    assert!(down.same_pixels(&b));
    assert!(PixelBuffer::ptr_eq(&scale(&b, 5, 3, true), &b));
}

#[test]
fn pretty_scale_keeps_one_bit_alpha() {
    let b = ramp_with_hole(8, 8, 4);
    let out = scale(&b, 3, 5, true);
    for y in 0..5 {
        for x in 0..3 {
            let a = out.pixel(x, y).a();
            assert!(a == 0 || a == 255);
        }
    }
    assert_eq!(out.pixel(0, 0), Rgba::TRANSPARENT);
    assert!(out.pixel(2, 4).is_opaque());
}
