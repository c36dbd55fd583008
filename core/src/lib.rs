//! Core modeling engine for the PHY impairment toolkit.
//!
//! The memory-polynomial model sits at the center: the power amplifier
//! simulator and the ILA predistorter both own one and add their own stages
//! around it. Waveform generation and the small DSP helpers produce and score
//! the signals that flow through those models.

pub mod math;
pub mod models;
pub mod prelude;
pub mod telemetry;
pub mod waveform;

pub use models::{MemoryPolynomialModel, PowerAmpModel, PredistorterModel};
pub use prelude::{ModelError, ModelResult, SignalTransform};
