#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod composite;
pub mod diagnostics;
pub mod effects;
pub mod geom;
pub mod image;
pub mod transform;

// Tool-facing modules.
pub mod arith;
pub mod config;

// --- High-level re-exports -------------------------------------------------

// Buffer model.
pub use crate::image::{BufferError, Color, Depth, PixelBuffer, Rgba};

// Effect dispatch and chains.
pub use crate::effects::{apply_chain, ChannelMask, Effect};

// Geometry shared by compositing and selections.
pub use crate::geom::{Point, Polygon, Rect, SelectionShape};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use kolour_fx::prelude::*;
///
/// # fn main() {
/// let img = PixelBuffer::filled(64, 48, Rgba::opaque(200, 40, 40));
/// let gray = grayscale(&img);
/// let turned = rotate(&gray, 90.0, Color::Transparent);
/// assert_eq!((turned.width(), turned.height()), (48, 64));
/// assert!(is_lossless_rotation(90.0));
/// # }
/// ```
pub mod prelude {
    pub use crate::composite::{fill, fill_rect, get_sub_buffer, paint_sub_buffer, set_sub_buffer};
    pub use crate::effects::{
        balance, blur, equalize, grayscale, invert, reduce_colors, tone_enhance, BlurSharpenKind,
    };
    pub use crate::transform::{flip, is_lossless_rotation, rotate, scale, skew};
    pub use crate::{ChannelMask, Color, Depth, Effect, PixelBuffer, Point, Rect, Rgba};
}
