use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Square QAM constellations carried on each OFDM subcarrier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constellation {
    #[default]
    #[serde(rename = "QPSK")]
    Qpsk,
    #[serde(rename = "16QAM")]
    Qam16,
    #[serde(rename = "64QAM")]
    Qam64,
}

impl Constellation {
    pub fn points(&self) -> usize {
        match self {
            Constellation::Qpsk => 4,
            Constellation::Qam16 => 16,
            Constellation::Qam64 => 64,
        }
    }

    fn side(&self) -> usize {
        match self {
            Constellation::Qpsk => 2,
            Constellation::Qam16 => 4,
            Constellation::Qam64 => 8,
        }
    }

    /// Unnormalized grid on odd integer levels, e.g. `±1 ± 1j` for QPSK.
    pub fn alphabet(&self) -> Vec<Complex64> {
        let side = self.side();
        let levels: Vec<f64> = (0..side)
            .map(|i| (2 * i) as f64 - (side - 1) as f64)
            .collect();
        levels
            .iter()
            .rev()
            .flat_map(|&q| levels.iter().map(move |&i| Complex64::new(i, q)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_sizes_match_point_counts() {
        for constellation in [Constellation::Qpsk, Constellation::Qam16, Constellation::Qam64] {
            assert_eq!(constellation.alphabet().len(), constellation.points());
        }
    }

    #[test]
    fn qpsk_sits_on_unit_corners() {
        let alphabet = Constellation::Qpsk.alphabet();
        for point in [(-1.0, 1.0), (1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)] {
            assert!(alphabet.contains(&Complex64::new(point.0, point.1)));
        }
    }

    #[test]
    fn qam64_spans_odd_levels_to_seven() {
        let alphabet = Constellation::Qam64.alphabet();
        let max_re = alphabet.iter().map(|p| p.re).fold(f64::MIN, f64::max);
        let min_im = alphabet.iter().map(|p| p.im).fold(f64::MAX, f64::min);
        assert_eq!(max_re, 7.0);
        assert_eq!(min_im, -7.0);
        assert!(alphabet.iter().all(|p| (p.re as i64).abs() % 2 == 1));
    }
}
