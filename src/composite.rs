//! Masked compositing of rectangular sub-buffers.
//!
//! The color and transparency planes are written separately: a pixel's color
//! is only ever written together with it becoming opaque, and a pixel only
//! becomes transparent when a transparent pixel or color is explicitly drawn.
//! Painting never creates or clears transparency as a side effect.
//!
//! Paletted destinations are expanded to direct color before writing.
use log::{error, warn};

use crate::arith::checked_byte_size;
use crate::geom::{Point, Rect, SelectionShape};
use crate::image::{Color, ImageView, PixelBuffer, Rgba, RgbaImage};

/// Copies `rect` out of `buffer`. Parts of `rect` outside the buffer are
/// transparent in the result.
pub fn get_sub_buffer(buffer: &PixelBuffer, rect: Rect) -> PixelBuffer {
    if rect.is_empty() {
        return PixelBuffer::new(0, 0);
    }
    let bounds = Rect::of_size(buffer.width(), buffer.height());
    if rect == bounds {
        return buffer.clone();
    }
    if checked_byte_size(rect.w as usize, rect.h as usize, std::mem::size_of::<Rgba>()).is_none() {
        warn!("get_sub_buffer: rect {}x{} is too large", rect.w, rect.h);
        return PixelBuffer::new(0, 0);
    }
    let mut out = RgbaImage::new(rect.w as usize, rect.h as usize);
    if let Some(overlap) = rect.intersect(&bounds) {
        let src = buffer.to_direct();
        for y in overlap.y..overlap.bottom() {
            let src_row = &src.row(y as usize)[overlap.x as usize..overlap.right() as usize];
            let start = out.idx((overlap.x - rect.x) as usize, (y - rect.y) as usize);
            out.data[start..start + src_row.len()].copy_from_slice(src_row);
        }
    }
    out.into()
}

/// Overwrites `dest_rect` of `dest` with the top-left `dest_rect` area of
/// `src`, transparency included. Writes outside `dest` are clipped.
///
/// `dest_rect` must not be larger than `src`; otherwise `dest` is left as is.
pub fn set_sub_buffer(dest: &mut PixelBuffer, dest_rect: Rect, src: &PixelBuffer) {
    if dest_rect.is_empty() {
        return;
    }
    if dest_rect.w as usize > src.width() || dest_rect.h as usize > src.height() {
        error!(
            "set_sub_buffer: rect {}x{} larger than source {}x{}",
            dest_rect.w,
            dest_rect.h,
            src.width(),
            src.height()
        );
        return;
    }
    let bounds = Rect::of_size(dest.width(), dest.height());
    let Some(clip) = dest_rect.intersect(&bounds) else {
        return;
    };
    if clip == bounds && (src.width(), src.height()) == (dest.width(), dest.height()) {
        *dest = src.clone();
        return;
    }
    let src = src.to_direct();
    let img = dest.direct_mut();
    for y in clip.y..clip.bottom() {
        let sy = (y - dest_rect.y) as usize;
        let sx = (clip.x - dest_rect.x) as usize;
        let src_row = &src.row(sy)[sx..sx + clip.w as usize];
        let start = img.idx(clip.x as usize, y as usize);
        img.data[start..start + src_row.len()].copy_from_slice(src_row);
    }
}

/// Draws `src` onto `dest` with its top-left at `at`: opaque source pixels
/// replace the destination, transparent ones leave it untouched.
pub fn paint_sub_buffer(dest: &mut PixelBuffer, at: Point, src: &PixelBuffer) {
    let bounds = Rect::of_size(dest.width(), dest.height());
    let placed = Rect::new(at.x, at.y, src.width() as i32, src.height() as i32);
    let Some(clip) = placed.intersect(&bounds) else {
        return;
    };
    let src = src.to_direct();
    let img = dest.direct_mut();
    for y in clip.y..clip.bottom() {
        for x in clip.x..clip.right() {
            let px = src.data[src.idx((x - at.x) as usize, (y - at.y) as usize)];
            if px.is_opaque() {
                let idx = img.idx(x as usize, y as usize);
                img.data[idx] = px;
            }
        }
    }
}

fn fill_color(op: &str, color: Color) -> Option<Rgba> {
    let rgba = color.to_rgba();
    if rgba.is_none() {
        error!("{op}: invalid color");
    }
    rgba
}

/// Sets every pixel of `dest` to `color` (transparent clears the buffer).
pub fn fill(dest: &mut PixelBuffer, color: Color) {
    let Some(px) = fill_color("fill", color) else {
        return;
    };
    let img = dest.direct_mut();
    img.data.fill(px);
}

/// Sets the pixels of `rect` (clipped to `dest`) to `color`.
pub fn fill_rect(dest: &mut PixelBuffer, rect: Rect, color: Color) {
    let Some(px) = fill_color("fill_rect", color) else {
        return;
    };
    let Some(clip) = rect.intersect(&Rect::of_size(dest.width(), dest.height())) else {
        return;
    };
    let img = dest.direct_mut();
    for y in clip.y..clip.bottom() {
        let start = img.idx(clip.x as usize, y as usize);
        img.data[start..start + clip.w as usize].fill(px);
    }
}

/// Pixels of `buffer` under `shape`, cropped to the shape's bounding rect;
/// pixels outside the shape are transparent.
pub fn get_selection(buffer: &PixelBuffer, shape: &SelectionShape) -> PixelBuffer {
    let bounds = shape.bounding_rect();
    if bounds.is_empty() {
        return PixelBuffer::new(0, 0);
    }
    let mut sub = get_sub_buffer(buffer, bounds).into_direct();
    if let SelectionShape::Rectangle { .. } = shape {
        return sub.into();
    }
    sub.apply_mask(&shape.mask());
    sub.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Depth, ImageViewMut, IndexedImage};

    fn numbered(w: usize, h: usize) -> PixelBuffer {
        let mut img = RgbaImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                img.set(x, y, Rgba::opaque(x as u8 * 10, y as u8 * 10, 100));
            }
        }
        img.into()
    }

    #[test]
    fn get_pads_outside_with_transparency() {
        let b = numbered(4, 4);
        let sub = get_sub_buffer(&b, Rect::new(2, -1, 4, 3));
        assert_eq!((sub.width(), sub.height()), (4, 3));
        assert_eq!(sub.pixel(0, 0), Rgba::TRANSPARENT);
        assert_eq!(sub.pixel(0, 1), b.pixel(2, 0));
        assert_eq!(sub.pixel(1, 2), b.pixel(3, 1));
        assert_eq!(sub.pixel(2, 1), Rgba::TRANSPARENT);
        assert!(PixelBuffer::ptr_eq(&get_sub_buffer(&b, Rect::of_size(4, 4)), &b));
    }

    #[test]
    fn get_of_huge_rect_is_empty() {
        let b = numbered(4, 4);
        let sub = get_sub_buffer(&b, Rect::new(0, 0, i32::MAX, i32::MAX));
        assert!(sub.is_empty());
    }

    #[test]
    fn get_then_set_is_identity() {
        let b = numbered(6, 5);
        let rect = Rect::new(1, 2, 3, 2);
        let sub = get_sub_buffer(&b, rect);
        let mut dest = b.clone();
        fill_rect(&mut dest, rect, Color::BLACK);
        assert_ne!(dest, b);
        set_sub_buffer(&mut dest, rect, &sub);
        assert_eq!(dest, b);
    }

    #[test]
    fn set_rejects_rect_larger_than_source() {
        let mut dest = numbered(4, 4);
        let before = dest.clone();
        set_sub_buffer(&mut dest, Rect::new(0, 0, 3, 3), &PixelBuffer::new(2, 2));
        assert!(PixelBuffer::ptr_eq(&dest, &before));
    }

    #[test]
    fn set_copies_transparency() {
        let mut dest = numbered(4, 4);
        set_sub_buffer(&mut dest, Rect::new(3, 3, 2, 2), &PixelBuffer::new(2, 2));
        assert_eq!(dest.pixel(3, 3), Rgba::TRANSPARENT);
        assert!(dest.pixel(2, 3).is_opaque());
    }

    #[test]
    fn paint_skips_transparent_source_pixels() {
        let mut dest = PixelBuffer::filled(3, 3, Rgba::WHITE);
        let mut stamp = RgbaImage::new(2, 2);
        stamp.set(1, 1, Rgba::BLACK);
        paint_sub_buffer(&mut dest, Point::new(1, 1), &stamp.into());
        assert_eq!(dest.pixel(2, 2), Rgba::BLACK);
        assert_eq!(dest.pixel(1, 1), Rgba::WHITE);
        assert!(!dest.has_transparency());
    }

    #[test]
    fn paint_onto_transparent_makes_opaque() {
        let mut dest = PixelBuffer::new(2, 2);
        paint_sub_buffer(&mut dest, Point::new(-1, 0), &PixelBuffer::filled(2, 1, Rgba::BLACK));
        assert_eq!(dest.pixel(0, 0), Rgba::BLACK);
        assert_eq!(dest.pixel(1, 0), Rgba::TRANSPARENT);
    }

    #[test]
    fn paint_expands_paletted_destination() {
        let img = IndexedImage::new(2, 2, Depth::Bit1, vec![Rgba::WHITE, Rgba::BLACK]);
        let mut dest: PixelBuffer = img.into();
        paint_sub_buffer(&mut dest, Point::new(0, 0), &PixelBuffer::filled(1, 1, Rgba::opaque(1, 2, 3)));
        assert!(dest.as_direct().is_some());
        assert_eq!(dest.pixel(0, 0), Rgba::opaque(1, 2, 3));
        assert_eq!(dest.pixel(1, 1), Rgba::WHITE);
    }

    #[test]
    fn fill_handles_transparent_and_invalid() {
        let mut b = numbered(3, 3);
        let before = b.clone();
        fill(&mut b, Color::Invalid);
        assert!(PixelBuffer::ptr_eq(&b, &before));
        fill(&mut b, Color::Transparent);
        assert_eq!(b.pixel(1, 1), Rgba::TRANSPARENT);
        fill_rect(&mut b, Rect::new(-5, 1, 6, 1), Color::WHITE);
        assert_eq!(b.pixel(0, 1), Rgba::WHITE);
        assert_eq!(b.pixel(1, 1), Rgba::TRANSPARENT);
    }

    #[test]
    fn ellipse_selection_has_transparent_corners() {
        let b = PixelBuffer::filled(10, 10, Rgba::opaque(50, 60, 70));
        let shape = SelectionShape::Ellipse {
            rect: Rect::new(1, 1, 8, 8),
        };
        let sel = get_selection(&b, &shape);
        assert_eq!((sel.width(), sel.height()), (8, 8));
        assert_eq!(sel.pixel(0, 0), Rgba::TRANSPARENT);
        assert_eq!(sel.pixel(4, 4), Rgba::opaque(50, 60, 70));
    }
}
