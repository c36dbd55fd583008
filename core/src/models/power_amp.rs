use crate::math::stats::StatsHelper;
use crate::models::memory_polynomial::MemoryPolynomialModel;
use crate::prelude::{ModelError, ModelResult, PowerAmpConfig, SignalTransform};
use crate::telemetry::log::LogManager;
use ndarray::{Array1, Array2, ArrayView1};
use num_complex::Complex64;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Parallel-Hammerstein fit of a WARP board PA, orders 1..7 by taps 0..3.
const WARP_COEFFICIENTS: [[(f64, f64); 4]; 4] = [
    [(0.9295, -0.0001), (0.2939, 0.0005), (-0.1270, 0.0034), (0.0741, -0.0018)],
    [(0.1419, -0.0008), (-0.0735, 0.0833), (-0.0535, 0.0004), (0.0908, -0.0473)],
    [(0.0084, -0.0569), (-0.4610, 0.0274), (-0.3011, -0.1403), (-0.0623, -0.0269)],
    [(0.1774, 0.0265), (0.0848, 0.0613), (-0.0362, -0.0307), (0.0415, 0.0429)],
];

const DEFAULT_GAIN_MISMATCH: f64 = 1.07;
const DEFAULT_PHASE_MISMATCH_DEG: f64 = 5.0;
const LO_LEAKAGE_SCALE: f64 = 0.01;

/// Transmit IQ imbalance `x' = k1 x + k2 conj(x)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqImbalance {
    pub k1: Complex64,
    pub k2: Complex64,
}

impl IqImbalance {
    pub fn passthrough() -> Self {
        Self {
            k1: Complex64::new(1.0, 0.0),
            k2: Complex64::new(0.0, 0.0),
        }
    }

    /// Gain/phase mismatch scaled so that `|k1|² + |k2|² = 1`.
    pub fn from_mismatch(gain_mismatch: f64, phase_mismatch_rad: f64) -> Self {
        let skew = Complex64::from_polar(gain_mismatch, phase_mismatch_rad);
        let k1 = (Complex64::new(1.0, 0.0) + skew) * 0.5;
        let k2 = (Complex64::new(1.0, 0.0) - skew) * 0.5;
        let scale = 1.0 / (k1.norm_sqr() + k2.norm_sqr()).sqrt();
        Self {
            k1: k1 * scale,
            k2: k2 * scale,
        }
    }

    pub fn apply(&self, signal: ArrayView1<'_, Complex64>) -> Array1<Complex64> {
        signal.mapv(|x| self.k1 * x + self.k2 * x.conj())
    }
}

impl Default for IqImbalance {
    fn default() -> Self {
        Self::from_mismatch(
            DEFAULT_GAIN_MISMATCH,
            DEFAULT_PHASE_MISMATCH_DEG.to_radians(),
        )
    }
}

/// Baseband PA: IQ imbalance, then a memory polynomial, then additive noise.
#[derive(Debug, Clone)]
pub struct PowerAmpModel {
    polynomial: MemoryPolynomialModel,
    iq_imbalance: IqImbalance,
    lo_leakage: Complex64,
    noise_variance: f64,
    last_fit_error: Option<f64>,
    rng: StdRng,
    logger: LogManager,
}

impl PowerAmpModel {
    pub fn new(config: &PowerAmpConfig) -> ModelResult<Self> {
        let mut polynomial = MemoryPolynomialModel::from_config(&config.polynomial())?;
        if config.noise_variance.is_nan() || config.noise_variance < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "noise variance must be >= 0, got {}",
                config.noise_variance
            )));
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let lo_leakage = if config.add_lo_leakage {
            let re: f64 = rng.sample(StandardNormal);
            let im: f64 = rng.sample(StandardNormal);
            Complex64::new(LO_LEAKAGE_SCALE * re, LO_LEAKAGE_SCALE * im)
        } else {
            Complex64::new(0.0, 0.0)
        };
        let iq_imbalance = if config.add_iq_imbalance {
            IqImbalance::default()
        } else {
            IqImbalance::passthrough()
        };

        polynomial.set_coefficients(warp_coefficients(
            polynomial.num_branches(),
            polynomial.memory_depth(),
        ))?;

        Ok(Self {
            polynomial,
            iq_imbalance,
            lo_leakage,
            noise_variance: config.noise_variance,
            last_fit_error: None,
            rng,
            logger: LogManager::new("power-amp"),
        })
    }

    pub fn polynomial(&self) -> &MemoryPolynomialModel {
        &self.polynomial
    }

    pub fn coefficients(&self) -> &Array2<Complex64> {
        self.polynomial.coefficients()
    }

    pub fn set_coefficients(&mut self, coefficients: Array2<Complex64>) -> ModelResult<()> {
        self.polynomial.set_coefficients(coefficients)
    }

    pub fn iq_imbalance(&self) -> IqImbalance {
        self.iq_imbalance
    }

    pub fn k1(&self) -> Complex64 {
        self.iq_imbalance.k1
    }

    pub fn k2(&self) -> Complex64 {
        self.iq_imbalance.k2
    }

    pub fn noise_variance(&self) -> f64 {
        self.noise_variance
    }

    /// Carrier feedthrough drawn at construction. `transmit` does not add it.
    pub fn lo_leakage(&self) -> Complex64 {
        self.lo_leakage
    }

    pub fn set_lo_leakage(&mut self, lo_leakage: Complex64) {
        self.lo_leakage = lo_leakage;
    }

    /// Adds the LO leakage offset for callers that want it in the signal.
    pub fn apply_lo_leakage(&self, signal: ArrayView1<'_, Complex64>) -> Array1<Complex64> {
        signal.mapv(|x| x + self.lo_leakage)
    }

    /// NMSE of the most recent [`fit_from`](Self::fit_from), if any.
    pub fn last_fit_error(&self) -> Option<f64> {
        self.last_fit_error
    }

    pub fn transmit(&mut self, input: ArrayView1<'_, Complex64>) -> Array1<Complex64> {
        let imbalanced = self.iq_imbalance.apply(input);
        let mut output = self.polynomial.evaluate(imbalanced.view());
        // Real, non-negative uniform noise on each complex sample.
        for sample in output.iter_mut() {
            let draw: f64 = self.rng.gen();
            sample.re += self.noise_variance * draw;
        }
        output
    }

    /// Identifies coefficients from an observed input/output pair.
    ///
    /// The basis is built from the raw input, ahead of the IQ stage. The new
    /// table is assigned, the input is re-transmitted, and the NMSE of that
    /// reproduction against `output` is stored and returned.
    pub fn fit_from(
        &mut self,
        input: ArrayView1<'_, Complex64>,
        output: ArrayView1<'_, Complex64>,
    ) -> ModelResult<f64> {
        let coefficients = self.polynomial.fit(input, output)?;
        self.polynomial.set_coefficients(coefficients)?;

        let reproduced = self.transmit(input);
        let nmse = StatsHelper::nmse(output, reproduced.view())?;
        self.last_fit_error = Some(nmse);
        self.logger.record(&format!(
            "identified {} coefficients, NMSE {:.2} dB",
            self.polynomial.num_coeffs(),
            StatsHelper::to_db(nmse)
        ));
        Ok(nmse)
    }
}

impl SignalTransform for PowerAmpModel {
    fn transform(&mut self, input: ArrayView1<'_, Complex64>) -> ModelResult<Array1<Complex64>> {
        Ok(self.transmit(input))
    }
}

fn warp_coefficients(branches: usize, memory_depth: usize) -> Array2<Complex64> {
    Array2::from_shape_fn((branches, memory_depth), |(branch, tap)| {
        WARP_COEFFICIENTS
            .get(branch)
            .and_then(|row| row.get(tap))
            .map(|&(re, im)| Complex64::new(re, im))
            .unwrap_or_else(|| Complex64::new(0.0, 0.0))
    })
}
