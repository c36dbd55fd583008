use crate::math::basis::BasisHelper;
use crate::math::lstsq::LeastSquaresHelper;
use crate::math::stats::StatsHelper;
use crate::prelude::{ModelError, ModelResult, PolynomialConfig, SignalTransform};
use crate::telemetry::log::LogManager;
use ndarray::{Array1, Array2, ArrayView1};
use num_complex::Complex64;

/// Parallel-Hammerstein model: odd-order nonlinear branches, each followed
/// by a short FIR filter.
///
/// The coefficient table is `[num_branches, memory_depth]` and always keeps
/// that shape; it only changes through [`set_coefficients`](Self::set_coefficients).
#[derive(Debug, Clone)]
pub struct MemoryPolynomialModel {
    order: usize,
    memory_depth: usize,
    memory_stride: usize,
    coefficients: Array2<Complex64>,
    logger: LogManager,
}

impl MemoryPolynomialModel {
    /// Validated model with all-zero coefficients.
    pub fn new(order: usize, memory_depth: usize, memory_stride: usize) -> ModelResult<Self> {
        Self::validate(order, memory_depth, memory_stride)?;
        Ok(Self {
            order,
            memory_depth,
            memory_stride,
            coefficients: Array2::zeros((BasisHelper::num_branches(order), memory_depth)),
            logger: LogManager::new("memory-polynomial"),
        })
    }

    pub fn from_config(config: &PolynomialConfig) -> ModelResult<Self> {
        Self::new(config.order, config.memory_depth, config.memory_stride)
    }

    pub fn with_coefficients(
        order: usize,
        memory_depth: usize,
        memory_stride: usize,
        coefficients: Array2<Complex64>,
    ) -> ModelResult<Self> {
        let mut model = Self::new(order, memory_depth, memory_stride)?;
        model.set_coefficients(coefficients)?;
        Ok(model)
    }

    fn validate(order: usize, memory_depth: usize, memory_stride: usize) -> ModelResult<()> {
        if order == 0 || order % 2 == 0 {
            return Err(ModelError::InvalidParameter(format!(
                "order must be positive and odd, got {}",
                order
            )));
        }
        if memory_depth == 0 {
            return Err(ModelError::InvalidParameter(
                "memory depth must be a positive integer".into(),
            ));
        }
        if memory_stride == 0 {
            return Err(ModelError::InvalidParameter(
                "memory stride must be a positive integer".into(),
            ));
        }
        Ok(())
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn memory_depth(&self) -> usize {
        self.memory_depth
    }

    pub fn memory_stride(&self) -> usize {
        self.memory_stride
    }

    pub fn num_branches(&self) -> usize {
        BasisHelper::num_branches(self.order)
    }

    pub fn num_coeffs(&self) -> usize {
        BasisHelper::num_coeffs(self.order, self.memory_depth)
    }

    pub fn coefficients(&self) -> &Array2<Complex64> {
        &self.coefficients
    }

    /// Replaces the coefficient table; the shape must be `[num_branches, memory_depth]`.
    pub fn set_coefficients(&mut self, coefficients: Array2<Complex64>) -> ModelResult<()> {
        let expected = (self.num_branches(), self.memory_depth);
        if coefficients.dim() != expected {
            return Err(ModelError::ShapeMismatch(format!(
                "coefficient table must be {:?}, got {:?}",
                expected,
                coefficients.dim()
            )));
        }
        self.coefficients = coefficients;
        Ok(())
    }

    pub fn basis_matrix(&self, signal: ArrayView1<'_, Complex64>) -> Array2<Complex64> {
        BasisHelper::build(signal, self.order, self.memory_depth, self.memory_stride)
    }

    pub fn evaluate(&self, signal: ArrayView1<'_, Complex64>) -> Array1<Complex64> {
        let flattened: Array1<Complex64> = self.coefficients.iter().cloned().collect();
        self.basis_matrix(signal).dot(&flattened)
    }

    /// Least-squares coefficients mapping `input` to `output`.
    ///
    /// Returns the table without assigning it; underdetermined or
    /// rank-deficient systems give the minimum-norm solution.
    pub fn fit(
        &self,
        input: ArrayView1<'_, Complex64>,
        output: ArrayView1<'_, Complex64>,
    ) -> ModelResult<Array2<Complex64>> {
        self.fit_regularized(input, output, 0.0)
    }

    pub fn fit_regularized(
        &self,
        input: ArrayView1<'_, Complex64>,
        output: ArrayView1<'_, Complex64>,
        regularization: f64,
    ) -> ModelResult<Array2<Complex64>> {
        if input.len() != output.len() {
            return Err(ModelError::ShapeMismatch(format!(
                "fit input has {} samples but output has {}",
                input.len(),
                output.len()
            )));
        }

        let basis = self.basis_matrix(input);
        let solved = LeastSquaresHelper::solve_regularized(basis.view(), output, regularization)?;
        if !input.is_empty() && solved.rank < self.num_coeffs() {
            self.logger.warn(&format!(
                "rank-deficient basis: rank {} of {} columns",
                solved.rank,
                self.num_coeffs()
            ));
        }
        self.logger.detail(&format!(
            "fit {} samples onto {} coefficients, condition {:.3e}",
            input.len(),
            self.num_coeffs(),
            solved.condition
        ));

        solved
            .solution
            .into_shape((self.num_branches(), self.memory_depth))
            .map_err(|err| ModelError::ShapeMismatch(err.to_string()))
    }

    /// `||desired - actual||² / ||desired||²`.
    pub fn normalized_mean_squared_error(
        desired: ArrayView1<'_, Complex64>,
        actual: ArrayView1<'_, Complex64>,
    ) -> ModelResult<f64> {
        StatsHelper::nmse(desired, actual)
    }
}

impl SignalTransform for MemoryPolynomialModel {
    fn transform(&mut self, input: ArrayView1<'_, Complex64>) -> ModelResult<Array1<Complex64>> {
        Ok(self.evaluate(input))
    }
}
