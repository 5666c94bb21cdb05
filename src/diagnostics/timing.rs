//! Wall-clock timings of an effect chain, one entry per configured effect.
use std::time::Duration;

use serde::Serialize;

use crate::effects::Effect;

/// One effect of a chain, by position and name.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    /// Position in the configured chain.
    pub index: usize,
    pub effect: String,
    pub elapsed_ms: f64,
    /// The effect was a no-op for its parameters and never ran.
    pub skipped: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn record(&mut self, effect: &Effect, elapsed: Duration) {
        self.push_stage(effect, elapsed.as_secs_f64() * 1000.0, false);
    }

    pub fn record_skipped(&mut self, effect: &Effect) {
        self.push_stage(effect, 0.0, true);
    }

    fn push_stage(&mut self, effect: &Effect, elapsed_ms: f64, skipped: bool) {
        self.stages.push(StageTiming {
            index: self.stages.len(),
            effect: effect.name().to_string(),
            elapsed_ms,
            skipped,
        });
    }

    /// Time spent in all stages running the named effect.
    pub fn stage_ms(&self, effect: &str) -> f64 {
        self.stages
            .iter()
            .filter(|s| s.effect == effect)
            .map(|s| s.elapsed_ms)
            .sum()
    }

    pub fn ran_count(&self) -> usize {
        self.stages.iter().filter(|s| !s.skipped).count()
    }
}
