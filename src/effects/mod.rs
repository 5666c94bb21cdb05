//! Pixel effects and the closed set of effect kinds a caller can apply.
//!
//! Every engine is a pure function `(&PixelBuffer, params) -> PixelBuffer`.
//! [`Effect`] wraps them in a deserializable, tagged form for tool configs and
//! exposes the properties an undo layer needs (no-op detection,
//! invertibility).
pub mod balance;
pub mod blur;
pub mod convolve;
pub mod histogram;
pub mod pixel;
pub mod reduce;

use std::time::Instant;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::diagnostics::TimingBreakdown;
use crate::image::{Color, Depth, PixelBuffer};
use crate::transform::{flip, is_lossless_rotation, rotate, scale, skew, ANGLE_EPSILON};

pub use balance::{balance, balance_luts, balance_value};
pub use blur::{blur, blur_sharpen, emboss_effect, BlurSharpenKind};
pub use convolve::{convolve, emboss, gaussian_sharpen, kernel_size, ConvolutionKernel};
pub use histogram::{equalize, tone_enhance, CumulativeHistogram, Histogram};
pub use pixel::{apply_luts, flatten, grayscale, invert, ChannelLuts};
pub use reduce::{convert_depth, reduce_colors};

/// Which of the red, green and blue channels an effect touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMask {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl Default for ChannelMask {
    fn default() -> Self {
        Self::RGB
    }
}

impl ChannelMask {
    pub const RGB: ChannelMask = ChannelMask::new(true, true, true);
    pub const NONE: ChannelMask = ChannelMask::new(false, false, false);
    pub const RED: ChannelMask = ChannelMask::new(true, false, false);
    pub const GREEN: ChannelMask = ChannelMask::new(false, true, false);
    pub const BLUE: ChannelMask = ChannelMask::new(false, false, true);

    pub const fn new(red: bool, green: bool, blue: bool) -> Self {
        Self { red, green, blue }
    }

    pub fn is_empty(&self) -> bool {
        !(self.red || self.green || self.blue)
    }
}

fn transparent() -> Color {
    Color::Transparent
}

fn default_depth() -> Depth {
    Depth::Bit8
}

fn default_true() -> bool {
    true
}

/// One effect with its parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    Balance {
        #[serde(default)]
        channels: ChannelMask,
        #[serde(default)]
        brightness: i32,
        #[serde(default)]
        contrast: i32,
        #[serde(default)]
        gamma: i32,
    },
    BlurSharpen {
        kind: BlurSharpenKind,
        strength: u32,
    },
    Emboss {
        strength: u32,
    },
    Flatten {
        color1: Color,
        color2: Color,
    },
    Grayscale,
    Invert {
        #[serde(default)]
        channels: ChannelMask,
    },
    ReduceColors {
        #[serde(default = "default_depth")]
        depth: Depth,
        #[serde(default)]
        dither: bool,
    },
    ToneEnhance {
        #[serde(default)]
        granularity: f64,
        amount: f64,
    },
    Rotate {
        angle: f64,
        #[serde(default = "transparent")]
        background: Color,
    },
    Skew {
        #[serde(default)]
        horizontal: f64,
        #[serde(default)]
        vertical: f64,
        #[serde(default = "transparent")]
        background: Color,
        #[serde(default)]
        target: Option<[usize; 2]>,
    },
    Flip {
        #[serde(default)]
        horizontal: bool,
        #[serde(default)]
        vertical: bool,
    },
    Scale {
        width: usize,
        height: usize,
        #[serde(default = "default_true")]
        pretty: bool,
    },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Balance { .. } => "balance",
            Effect::BlurSharpen { .. } => "blur_sharpen",
            Effect::Emboss { .. } => "emboss",
            Effect::Flatten { .. } => "flatten",
            Effect::Grayscale => "grayscale",
            Effect::Invert { .. } => "invert",
            Effect::ReduceColors { .. } => "reduce_colors",
            Effect::ToneEnhance { .. } => "tone_enhance",
            Effect::Rotate { .. } => "rotate",
            Effect::Skew { .. } => "skew",
            Effect::Flip { .. } => "flip",
            Effect::Scale { .. } => "scale",
        }
    }

    pub fn apply(&self, buffer: &PixelBuffer) -> PixelBuffer {
        match *self {
            Effect::Balance {
                channels,
                brightness,
                contrast,
                gamma,
            } => balance(buffer, channels, brightness, contrast, gamma),
            Effect::BlurSharpen { kind, strength } => blur_sharpen(buffer, kind, strength),
            Effect::Emboss { strength } => emboss_effect(buffer, strength),
            Effect::Flatten { color1, color2 } => flatten(buffer, color1, color2),
            Effect::Grayscale => grayscale(buffer),
            Effect::Invert { channels } => invert(buffer, channels),
            Effect::ReduceColors { depth, dither } => reduce_colors(buffer, depth, dither),
            Effect::ToneEnhance {
                granularity,
                amount,
            } => tone_enhance(buffer, granularity, amount),
            Effect::Rotate { angle, background } => rotate(buffer, angle, background),
            Effect::Skew {
                horizontal,
                vertical,
                background,
                target,
            } => skew(
                buffer,
                horizontal,
                vertical,
                background,
                target.map(|[w, h]| (w, h)),
            ),
            Effect::Flip {
                horizontal,
                vertical,
            } => flip(buffer, horizontal, vertical),
            Effect::Scale {
                width,
                height,
                pretty,
            } => scale(buffer, width, height, pretty),
        }
    }

    /// Whether the parameters make this effect an identity for any buffer.
    ///
    /// Scale depends on the buffer size and is never reported as a no-op.
    pub fn is_no_op(&self) -> bool {
        match *self {
            Effect::Balance {
                channels,
                brightness,
                contrast,
                gamma,
            } => channels.is_empty() || (brightness == 0 && contrast == 0 && gamma == 0),
            Effect::BlurSharpen { strength, .. } | Effect::Emboss { strength } => strength == 0,
            Effect::Invert { channels } => channels.is_empty(),
            Effect::ToneEnhance { amount, .. } => amount == 0.0,
            Effect::Rotate { angle, .. } => angle % 360.0 == 0.0,
            Effect::Skew {
                horizontal,
                vertical,
                target,
                ..
            } => target.is_none() && horizontal.abs() < ANGLE_EPSILON && vertical.abs() < ANGLE_EPSILON,
            Effect::Flip {
                horizontal,
                vertical,
            } => !horizontal && !vertical,
            Effect::Flatten { .. }
            | Effect::Grayscale
            | Effect::ReduceColors { .. }
            | Effect::Scale { .. } => false,
        }
    }

    /// Whether [`Effect::inverse`] undoes this effect exactly, so an undo
    /// layer need not keep the original buffer.
    pub fn is_invertible(&self) -> bool {
        self.inverse().is_some()
    }

    /// Effect that restores the input of this one, when it exists.
    pub fn inverse(&self) -> Option<Effect> {
        if self.is_no_op() {
            return Some(self.clone());
        }
        match *self {
            Effect::Invert { .. } | Effect::Flip { .. } => Some(self.clone()),
            Effect::Rotate { angle, background } if is_lossless_rotation(angle) => {
                Some(Effect::Rotate {
                    angle: -angle,
                    background,
                })
            }
            _ => None,
        }
    }
}

/// Applies `effects` in order, timing each one.
pub fn apply_chain(buffer: &PixelBuffer, effects: &[Effect]) -> (PixelBuffer, TimingBreakdown) {
    let total_start = Instant::now();
    let mut timings = TimingBreakdown::default();
    let mut current = buffer.clone();
    for effect in effects {
        if effect.is_no_op() {
            debug!("apply_chain: skipping no-op {}", effect.name());
            timings.record_skipped(effect);
            continue;
        }
        let start = Instant::now();
        current = effect.apply(&current);
        timings.record(effect, start.elapsed());
    }
    timings.total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    (current, timings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Rgba;

    #[test]
    fn effects_parse_from_tagged_json() {
        let json = r##"[
            {"effect": "balance", "brightness": 10, "channels": {"blue": false}},
            {"effect": "grayscale"},
            {"effect": "blur_sharpen", "kind": "make_confidential", "strength": 3},
            {"effect": "reduce_colors", "depth": 1, "dither": true},
            {"effect": "rotate", "angle": 90, "background": "#ff0000"},
            {"effect": "skew", "horizontal": 10, "target": [40, 30]}
        ]"##;
        let effects: Vec<Effect> = serde_json::from_str(json).expect("valid effect list");
        assert_eq!(
            effects[0],
            Effect::Balance {
                channels: ChannelMask::new(true, true, false),
                brightness: 10,
                contrast: 0,
                gamma: 0,
            }
        );
        assert_eq!(effects[1], Effect::Grayscale);
        assert_eq!(
            effects[3],
            Effect::ReduceColors {
                depth: Depth::Bit1,
                dither: true
            }
        );
        assert_eq!(
            effects[4],
            Effect::Rotate {
                angle: 90.0,
                background: Color::rgb(255, 0, 0)
            }
        );
        match effects[5] {
            Effect::Skew {
                background, target, ..
            } => {
                assert_eq!(background, Color::Transparent);
                assert_eq!(target, Some([40, 30]));
            }
            ref other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn no_op_and_invertibility() {
        assert!(Effect::Flip {
            horizontal: false,
            vertical: false
        }
        .is_no_op());
        assert!(Effect::ToneEnhance {
            granularity: 0.7,
            amount: 0.0
        }
        .is_no_op());
        assert!(Effect::Invert {
            channels: ChannelMask::RED
        }
        .is_invertible());
        assert!(!Effect::Grayscale.is_invertible());

        let rotate = Effect::Rotate {
            angle: 270.0,
            background: Color::Transparent,
        };
        assert_eq!(
            rotate.inverse(),
            Some(Effect::Rotate {
                angle: -270.0,
                background: Color::Transparent
            })
        );
        let lossy = Effect::Rotate {
            angle: 30.0,
            background: Color::Transparent,
        };
        assert!(!lossy.is_invertible());
    }

    #[test]
    fn chain_runs_in_order_and_times_each_effect() {
        let b = PixelBuffer::filled(4, 4, Rgba::opaque(255, 0, 0));
        let effects = [
            Effect::Balance {
                channels: ChannelMask::RGB,
                brightness: 50,
                contrast: 0,
                gamma: 0,
            },
            Effect::Invert {
                channels: ChannelMask::NONE,
            },
            Effect::Invert {
                channels: ChannelMask::GREEN,
            },
        ];
        let (out, timings) = apply_chain(&b, &effects);
        assert_eq!(out.pixel(3, 3), Rgba::opaque(255, 0, 255));
        let labels: Vec<&str> = timings.stages.iter().map(|s| s.effect.as_str()).collect();
        assert_eq!(labels, ["balance", "invert", "invert"]);
        assert!(timings.stages[1].skipped);
        assert_eq!(timings.ran_count(), 2);
    }
}
