//! Structured, serializable reports produced by the effect tools.
//!
//! Nothing here influences processing; the engines stay free of reporting
//! state and the driver assembles these from their results.
pub mod report;
pub mod timing;

pub use report::{BufferDescriptor, RunReport};
pub use timing::{StageTiming, TimingBreakdown};
