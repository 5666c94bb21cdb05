//! Pixel and color value types.
//!
//! `Rgba` is the stored pixel. Its alpha is 1-bit in disguise: every
//! constructor collapses alpha to 0 or 255 and normalizes transparent pixels
//! to [`Rgba::TRANSPARENT`], so two transparent pixels always compare equal.
//!
//! `Color` is the caller-facing paint color with a tri-state opacity.
use serde::Deserialize;

/// Luma weights scaled by 1e6; they sum to exactly 1_000_000.
const LUMA_R: u32 = 212_671;
const LUMA_G: u32 = 715_160;
const LUMA_B: u32 = 72_169;

/// Stored pixel. Fields are private so that only the constructors below can
/// produce one; `a` is always 0 or 255 and a transparent pixel is all zeros.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Builds a pixel from straight 8-bit RGBA, thresholding alpha at 128.
    #[inline]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        if a >= 128 {
            Self::opaque(r, g, b)
        } else {
            Self::TRANSPARENT
        }
    }

    #[inline]
    pub fn r(&self) -> u8 {
        self.r
    }

    #[inline]
    pub fn g(&self) -> u8 {
        self.g
    }

    #[inline]
    pub fn b(&self) -> u8 {
        self.b
    }

    /// 0 or 255.
    #[inline]
    pub fn a(&self) -> u8 {
        self.a
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        self.a != 0
    }

    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Replaces the color channels of an opaque pixel; transparent pixels are returned as is.
    #[inline]
    pub fn with_rgb(self, r: u8, g: u8, b: u8) -> Self {
        if self.is_transparent() {
            self
        } else {
            Self::opaque(r, g, b)
        }
    }

    /// Rec. 709 luma, integer weighted so that gray inputs map to themselves.
    #[inline]
    pub fn luma(&self) -> u8 {
        ((LUMA_R * self.r as u32 + LUMA_G * self.g as u32 + LUMA_B * self.b as u32) / 1_000_000)
            as u8
    }

    #[inline]
    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Paint color: an RGB triple, fully transparent, or an invalid sentinel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ColorSpec")]
pub enum Color {
    Opaque { r: u8, g: u8, b: u8 },
    Transparent,
    #[default]
    Invalid,
}

impl Color {
    pub const BLACK: Color = Color::Opaque { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color::Opaque {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Opaque { r, g, b }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Color::Invalid)
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Color::Opaque { .. })
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, Color::Transparent)
    }

    /// Stored pixel for this color; `None` for the invalid sentinel.
    pub fn to_rgba(&self) -> Option<Rgba> {
        match *self {
            Color::Opaque { r, g, b } => Some(Rgba::opaque(r, g, b)),
            Color::Transparent => Some(Rgba::TRANSPARENT),
            Color::Invalid => None,
        }
    }
}

impl From<Rgba> for Color {
    fn from(px: Rgba) -> Self {
        if px.is_opaque() {
            Color::rgb(px.r, px.g, px.b)
        } else {
            Color::Transparent
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorSpec {
    Name(String),
    Rgb([u8; 3]),
}

impl TryFrom<ColorSpec> for Color {
    type Error = String;

    fn try_from(spec: ColorSpec) -> Result<Self, Self::Error> {
        match spec {
            ColorSpec::Rgb([r, g, b]) => Ok(Color::rgb(r, g, b)),
            ColorSpec::Name(name) => parse_color_name(&name),
        }
    }
}

fn parse_color_name(name: &str) -> Result<Color, String> {
    match name.trim().to_ascii_lowercase().as_str() {
        "transparent" => return Ok(Color::Transparent),
        "black" => return Ok(Color::BLACK),
        "white" => return Ok(Color::WHITE),
        _ => {}
    }
    let hex = name
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| format!("Unrecognized color {name:?}"))?;
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("Expected #rrggbb, got {name:?}"));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("Bad color {name:?}: {e}"))
    };
    Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_collapses_to_one_bit() {
        assert_eq!(Rgba::from_rgba8(10, 20, 30, 200), Rgba::opaque(10, 20, 30));
        assert_eq!(Rgba::from_rgba8(10, 20, 30, 127), Rgba::TRANSPARENT);
        assert_eq!(Rgba::TRANSPARENT.with_rgb(1, 2, 3), Rgba::TRANSPARENT);
    }

    #[test]
    fn every_constructor_yields_one_bit_alpha() {
        let pixels = [
            Rgba::opaque(9, 8, 7),
            Rgba::from_rgba8(9, 8, 7, 128),
            Rgba::from_rgba8(9, 8, 7, 100),
            Rgba::from_rgba8(9, 8, 7, 0),
            Rgba::default(),
            Rgba::opaque(9, 8, 7).with_rgb(1, 2, 3),
        ];
        for px in pixels {
            assert!(px.a() == 0 || px.a() == 255, "{px:?}");
            if px.is_transparent() {
                assert_eq!(px.to_array(), [0; 4]);
            }
        }
        assert_eq!(Rgba::from_rgba8(9, 8, 7, 128), Rgba::opaque(9, 8, 7));
        assert_eq!(Rgba::from_rgba8(9, 8, 7, 100), Rgba::default());
    }

    #[test]
    fn luma_is_exact_on_grays() {
        for v in [0u8, 1, 77, 128, 254, 255] {
            assert_eq!(Rgba::opaque(v, v, v).luma(), v);
        }
    }

    #[test]
    fn color_deserializes_from_names_hex_and_triples() {
        let c: Color = serde_json::from_str("\"transparent\"").unwrap();
        assert!(c.is_transparent());
        let c: Color = serde_json::from_str("\"#ff8000\"").unwrap();
        assert_eq!(c, Color::rgb(255, 128, 0));
        let c: Color = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(c.to_rgba(), Some(Rgba::opaque(1, 2, 3)));
        assert!(serde_json::from_str::<Color>("\"#12\"").is_err());
        assert_eq!(Color::Invalid.to_rgba(), None);
    }
}
