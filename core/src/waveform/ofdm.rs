use crate::math::fft::FftHelper;
use crate::math::stats::StatsHelper;
use crate::prelude::{ModelError, ModelResult};
use crate::waveform::constellation::Constellation;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfdmConfig {
    pub n_subcarriers: usize,
    pub subcarrier_spacing: f64,
    pub cp_length: usize,
    pub constellation: Constellation,
    pub seed: u64,
}

impl Default for OfdmConfig {
    fn default() -> Self {
        Self {
            n_subcarriers: 1200,
            subcarrier_spacing: 15_000.0,
            cp_length: 144,
            constellation: Constellation::Qpsk,
            seed: 0,
        }
    }
}

/// Time-domain waveform and the frequency-domain grid it carries.
#[derive(Debug, Clone)]
pub struct OfdmFrame {
    pub samples: Array1<Complex64>,
    /// `[n_subcarriers, n_symbols]`
    pub symbols: Array2<Complex64>,
}

impl OfdmFrame {
    pub fn n_symbols(&self) -> usize {
        self.symbols.ncols()
    }
}

/// CP-OFDM modulator with the DC bin left empty.
#[derive(Clone)]
pub struct OfdmModulator {
    config: OfdmConfig,
    fft: FftHelper,
    alphabet: Vec<Complex64>,
}

impl OfdmModulator {
    pub fn new(config: OfdmConfig) -> ModelResult<Self> {
        if config.n_subcarriers == 0 || config.n_subcarriers % 2 != 0 {
            return Err(ModelError::InvalidParameter(format!(
                "subcarrier count must be even and non-zero, got {}",
                config.n_subcarriers
            )));
        }
        if !config.subcarrier_spacing.is_finite() || config.subcarrier_spacing <= 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "subcarrier spacing must be positive, got {}",
                config.subcarrier_spacing
            )));
        }
        let fft_size = (config.n_subcarriers + 1).next_power_of_two();
        if config.cp_length > fft_size {
            return Err(ModelError::InvalidParameter(format!(
                "cyclic prefix of {} exceeds FFT size {}",
                config.cp_length, fft_size
            )));
        }

        Ok(Self {
            alphabet: config.constellation.alphabet(),
            fft: FftHelper::new(fft_size),
            config,
        })
    }

    pub fn config(&self) -> &OfdmConfig {
        &self.config
    }

    pub fn fft_size(&self) -> usize {
        self.fft.size()
    }

    pub fn sampling_rate(&self) -> f64 {
        self.config.subcarrier_spacing * self.fft_size() as f64
    }

    /// Samples per OFDM symbol including the cyclic prefix.
    pub fn symbol_length(&self) -> usize {
        self.fft_size() + self.config.cp_length
    }

    /// Draws `n_symbols` random symbols per subcarrier and modulates them.
    /// The RNG is reseeded on every call.
    pub fn modulate(&self, n_symbols: usize) -> ModelResult<OfdmFrame> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let points = self.alphabet.len();
        let symbols = Array2::from_shape_fn((self.config.n_subcarriers, n_symbols), |_| {
            self.alphabet[rng.gen_range(0..points)]
        });

        let fft_size = self.fft_size();
        let cp = self.config.cp_length;
        let mut samples = Array1::zeros(self.symbol_length() * n_symbols);
        let mut bins = vec![Complex64::new(0.0, 0.0); fft_size];

        for (index, column) in symbols.axis_iter(Axis(1)).enumerate() {
            self.map_subcarriers(column, &mut bins);
            self.fft.inverse(&mut bins)?;

            let start = index * self.symbol_length();
            let mut slot = samples.slice_mut(s![start..start + self.symbol_length()]);
            for (offset, value) in bins[fft_size - cp..].iter().chain(bins.iter()).enumerate() {
                slot[offset] = *value;
            }
        }

        Ok(OfdmFrame { samples, symbols })
    }

    /// Strips the cyclic prefix and recovers the `[n_subcarriers, n_symbols]`
    /// grid.
    pub fn demodulate(
        &self,
        samples: ArrayView1<'_, Complex64>,
        n_symbols: usize,
    ) -> ModelResult<Array2<Complex64>> {
        let expected = self.symbol_length() * n_symbols;
        if samples.len() != expected {
            return Err(ModelError::ShapeMismatch(format!(
                "{} OFDM symbols need {} samples, got {}",
                n_symbols,
                expected,
                samples.len()
            )));
        }

        let half = self.config.n_subcarriers / 2;
        let fft_size = self.fft_size();
        let mut grid = Array2::zeros((self.config.n_subcarriers, n_symbols));
        for (index, mut column) in grid.axis_iter_mut(Axis(1)).enumerate() {
            let start = index * self.symbol_length() + self.config.cp_length;
            let mut bins: Vec<Complex64> =
                samples.slice(s![start..start + fft_size]).to_vec();
            self.fft.forward(&mut bins)?;

            for k in 0..half {
                column[half + k] = bins[1 + k];
                column[k] = bins[fft_size - half + k];
            }
        }
        Ok(grid)
    }

    pub fn evm_percent(
        transmitted: ArrayView2<'_, Complex64>,
        received: ArrayView2<'_, Complex64>,
    ) -> ModelResult<f64> {
        StatsHelper::evm_percent(transmitted, received)
    }

    /// Upper half of the grid on positive frequencies, lower half wrapped to
    /// the top bins, DC empty.
    fn map_subcarriers(&self, symbols: ArrayView1<'_, Complex64>, bins: &mut [Complex64]) {
        let half = self.config.n_subcarriers / 2;
        let fft_size = bins.len();
        bins.fill(Complex64::new(0.0, 0.0));
        for k in 0..half {
            bins[1 + k] = symbols[half + k];
            bins[fft_size - half + k] = symbols[k];
        }
    }
}
