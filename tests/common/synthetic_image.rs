use kolour_fx::image::{ImageViewMut, RgbaImage};
use kolour_fx::{PixelBuffer, Rgba};

/// Generates a two-color checkerboard.
pub fn checkerboard(width: usize, height: usize, cell: usize, a: Rgba, b: Rgba) -> PixelBuffer {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(cell > 0, "cell size must be positive");

    let mut img = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let sum = x / cell + y / cell;
            img.set(x, y, if sum & 1 == 0 { a } else { b });
        }
    }
    img.into()
}

/// Generates a color ramp: red grows along x, green along y, blue is fixed.
/// Every pixel differs from its neighbours, so moved pixels are traceable.
pub fn color_ramp(width: usize, height: usize) -> PixelBuffer {
    assert!(width > 0 && height > 0, "image dimensions must be positive");

    let mut img = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / (width - 1).max(1)) as u8;
            let g = (y * 255 / (height - 1).max(1)) as u8;
            img.set(x, y, Rgba::opaque(r, g, 90));
        }
    }
    img.into()
}

/// Color ramp with a transparent `hole × hole` square in the top-left corner.
pub fn ramp_with_hole(width: usize, height: usize, hole: usize) -> PixelBuffer {
    let mut img = color_ramp(width, height).into_direct();
    for y in 0..hole.min(height) {
        for x in 0..hole.min(width) {
            img.set(x, y, Rgba::TRANSPARENT);
        }
    }
    img.into()
}
