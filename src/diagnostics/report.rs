use serde::Serialize;

use super::timing::TimingBreakdown;
use crate::effects::Effect;
use crate::image::PixelBuffer;

/// Shape and storage of a buffer at one end of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferDescriptor {
    pub width: usize,
    pub height: usize,
    pub depth: u32,
    pub paletted: bool,
    pub has_transparency: bool,
}

impl BufferDescriptor {
    pub fn of(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width(),
            height: buffer.height(),
            depth: buffer.depth().bits(),
            paletted: buffer.as_indexed().is_some(),
            has_transparency: buffer.has_transparency(),
        }
    }
}

/// Summary written by `apply_effects` next to the output image.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub input: BufferDescriptor,
    pub output: BufferDescriptor,
    /// Effect names in application order.
    pub effects: Vec<String>,
    /// Effects whose parameters made them identities.
    pub skipped: Vec<String>,
    /// Effects an undo layer could revert without keeping the input.
    pub invertible: Vec<String>,
    pub timings: TimingBreakdown,
}

impl RunReport {
    pub fn from_run(
        input: &PixelBuffer,
        output: &PixelBuffer,
        effects: &[Effect],
        timings: TimingBreakdown,
    ) -> Self {
        let names = |keep: fn(&Effect) -> bool| {
            effects
                .iter()
                .filter(|e| keep(e))
                .map(|e| e.name().to_string())
                .collect::<Vec<_>>()
        };
        Self {
            input: BufferDescriptor::of(input),
            output: BufferDescriptor::of(output),
            effects: names(|_| true),
            skipped: names(Effect::is_no_op),
            invertible: names(Effect::is_invertible),
            timings,
        }
    }
}
