pub mod memory_polynomial;
pub mod power_amp;
pub mod predistorter;

pub use memory_polynomial::MemoryPolynomialModel;
pub use power_amp::{IqImbalance, PowerAmpModel};
pub use predistorter::PredistorterModel;
