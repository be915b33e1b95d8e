//! Connectivity sampling pipeline
//!
//! ```text
//! MetricSource ──fetch──▶ threshold::evaluate ──breach──▶ AlertSink
//!        ▲                                                   │
//!        └──────────────── SamplingLoop (fixed interval) ◀───┘
//! ```

pub mod sampler;
pub mod source;
pub mod threshold;

pub use sampler::{CycleReport, LoopPhase, SamplerHandle, SamplingLoop};
pub use source::{EapiMetricSource, MetricSource};
