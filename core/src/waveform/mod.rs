pub mod constellation;
pub mod ofdm;

pub use constellation::Constellation;
pub use ofdm::{OfdmConfig, OfdmFrame, OfdmModulator};
