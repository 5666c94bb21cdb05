pub mod buffer;
pub mod color;
pub mod indexed;
pub mod io;
pub mod mask;
pub mod rgba;
pub mod traits;

pub use self::buffer::{BufferError, Depth, PixelBuffer, Repr};
pub use self::color::{Color, Rgba};
pub use self::indexed::IndexedImage;
pub use self::mask::BitMask;
pub use self::rgba::RgbaImage;
pub use self::traits::{ImageView, ImageViewMut, Rows};
