pub mod basis;
pub mod dsp;
pub mod fft;
pub mod lstsq;
pub mod stats;

pub use basis::BasisHelper;
pub use fft::FftHelper;
pub use lstsq::{LeastSquaresHelper, LeastSquaresSolution};
pub use stats::StatsHelper;
