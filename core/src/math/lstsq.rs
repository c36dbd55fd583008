use crate::prelude::{ModelError, ModelResult};
use nalgebra::linalg::SVD;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView1, ArrayView2};
use num_complex::Complex64;

const SVD_MAX_ITERATIONS: usize = 10_000;

/// Result of a least-squares solve together with its conditioning.
#[derive(Debug, Clone)]
pub struct LeastSquaresSolution {
    pub solution: Array1<Complex64>,
    /// Singular values above the cutoff.
    pub rank: usize,
    pub singular_values: Vec<f64>,
    /// Ratio of largest to smallest retained singular value.
    pub condition: f64,
}

impl LeastSquaresSolution {
    fn zeros(cols: usize, singular_values: Vec<f64>) -> Self {
        Self {
            solution: Array1::zeros(cols),
            rank: 0,
            singular_values,
            condition: f64::INFINITY,
        }
    }
}

/// SVD-based complex least squares. Never forms the normal equations.
pub struct LeastSquaresHelper;

impl LeastSquaresHelper {
    /// Minimum-norm solution of `min ||a x - b||`.
    pub fn solve(
        a: ArrayView2<'_, Complex64>,
        b: ArrayView1<'_, Complex64>,
    ) -> ModelResult<LeastSquaresSolution> {
        Self::solve_regularized(a, b, 0.0)
    }

    /// Minimum-norm solution of `min ||a x - b||² + lambda ||x||²`.
    ///
    /// The penalty is folded in by appending `sqrt(lambda) * I` below `a`
    /// and zeros below `b`, so the same SVD path serves both cases.
    pub fn solve_regularized(
        a: ArrayView2<'_, Complex64>,
        b: ArrayView1<'_, Complex64>,
        lambda: f64,
    ) -> ModelResult<LeastSquaresSolution> {
        let (rows, cols) = a.dim();
        if b.len() != rows {
            return Err(ModelError::ShapeMismatch(format!(
                "design matrix has {} rows but target has {} samples",
                rows,
                b.len()
            )));
        }
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "regularization must be finite and >= 0, got {}",
                lambda
            )));
        }
        if a.iter().chain(b.iter()).any(|v| !is_finite(v)) {
            return Err(ModelError::NumericalDegeneracy(
                "least-squares system contains non-finite values".into(),
            ));
        }

        let extra_rows = if lambda > 0.0 { cols } else { 0 };
        let total_rows = rows + extra_rows;
        if total_rows == 0 || cols == 0 {
            return Ok(LeastSquaresSolution::zeros(cols, Vec::new()));
        }

        let weight = Complex64::new(lambda.sqrt(), 0.0);
        let zero = Complex64::new(0.0, 0.0);
        let a_na = DMatrix::from_fn(total_rows, cols, |i, j| {
            if i < rows {
                a[[i, j]]
            } else if i - rows == j {
                weight
            } else {
                zero
            }
        });
        let b_na = DVector::from_fn(total_rows, |i, _| if i < rows { b[i] } else { zero });

        let svd = SVD::try_new(a_na, true, true, f64::EPSILON, SVD_MAX_ITERATIONS).ok_or_else(
            || ModelError::NumericalDegeneracy("SVD did not converge".into()),
        )?;

        let singular_values: Vec<f64> = svd.singular_values.iter().cloned().collect();
        let max_singular = singular_values.iter().cloned().fold(0.0_f64, f64::max);
        if max_singular == 0.0 {
            // All-zero design matrix: the minimum-norm solution is zero.
            return Ok(LeastSquaresSolution::zeros(cols, singular_values));
        }

        let cutoff = max_singular * total_rows.max(cols) as f64 * f64::EPSILON;
        let solved = svd
            .solve(&b_na, cutoff)
            .map_err(|err| ModelError::NumericalDegeneracy(format!("SVD solve failed: {}", err)))?;
        if solved.iter().any(|v| !is_finite(v)) {
            return Err(ModelError::NumericalDegeneracy(
                "least-squares solution is not finite".into(),
            ));
        }

        let retained: Vec<f64> = singular_values
            .iter()
            .cloned()
            .filter(|value| *value > cutoff)
            .collect();
        let min_retained = retained.iter().cloned().fold(f64::INFINITY, f64::min);

        Ok(LeastSquaresSolution {
            solution: solved.iter().cloned().collect(),
            rank: retained.len(),
            condition: max_singular / min_retained,
            singular_values,
        })
    }
}

fn is_finite(value: &Complex64) -> bool {
    value.re.is_finite() && value.im.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn solves_square_complex_system() {
        let a = array![[c(2.0, 0.0), c(0.0, 1.0)], [c(1.0, -1.0), c(3.0, 0.0)]];
        let x = array![c(0.5, 0.25), c(-1.0, 2.0)];
        let b = a.dot(&x);

        let solved = LeastSquaresHelper::solve(a.view(), b.view()).unwrap();
        assert_eq!(solved.rank, 2);
        for (got, want) in solved.solution.iter().zip(x.iter()) {
            assert_relative_eq!(got.re, want.re, epsilon = 1e-12);
            assert_relative_eq!(got.im, want.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn overdetermined_fit_minimizes_residual() {
        // Fit a constant to [1, 2, 3]: the mean.
        let a = Array2::from_elem((3, 1), c(1.0, 0.0));
        let b = array![c(1.0, 0.0), c(2.0, 0.0), c(3.0, 0.0)];
        let solved = LeastSquaresHelper::solve(a.view(), b.view()).unwrap();
        assert_relative_eq!(solved.solution[0].re, 2.0, epsilon = 1e-12);
        assert_relative_eq!(solved.solution[0].im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn underdetermined_returns_minimum_norm() {
        let a = array![[c(1.0, 0.0), c(1.0, 0.0)]];
        let b = array![c(2.0, 0.0)];
        let solved = LeastSquaresHelper::solve(a.view(), b.view()).unwrap();
        assert_eq!(solved.rank, 1);
        assert_relative_eq!(solved.solution[0].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(solved.solution[1].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn duplicate_columns_are_rank_deficient_but_solvable() {
        let a = array![[c(1.0, 0.0), c(1.0, 0.0)], [c(2.0, 0.0), c(2.0, 0.0)]];
        let b = array![c(2.0, 0.0), c(4.0, 0.0)];
        let solved = LeastSquaresHelper::solve(a.view(), b.view()).unwrap();
        assert_eq!(solved.rank, 1);
        assert_relative_eq!(solved.solution[0].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(solved.solution[1].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn regularization_shrinks_solution() {
        let a = array![[c(1.0, 0.0)]];
        let b = array![c(1.0, 0.0)];
        let solved = LeastSquaresHelper::solve_regularized(a.view(), b.view(), 1.0).unwrap();
        // (a^H a + lambda)^-1 a^H b = 1 / 2
        assert_relative_eq!(solved.solution[0].re, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn zero_matrix_yields_zero_solution() {
        let a = Array2::<Complex64>::zeros((4, 2));
        let b = array![c(1.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(1.0, 0.0)];
        let solved = LeastSquaresHelper::solve(a.view(), b.view()).unwrap();
        assert_eq!(solved.rank, 0);
        assert!(solved.solution.iter().all(|v| *v == c(0.0, 0.0)));
    }

    #[test]
    fn rejects_mismatched_and_non_finite_input() {
        let a = Array2::<Complex64>::zeros((2, 1));
        let short = array![c(1.0, 0.0)];
        assert!(matches!(
            LeastSquaresHelper::solve(a.view(), short.view()),
            Err(ModelError::ShapeMismatch(_))
        ));

        let nan = array![c(f64::NAN, 0.0), c(1.0, 0.0)];
        assert!(matches!(
            LeastSquaresHelper::solve(a.view(), nan.view()),
            Err(ModelError::NumericalDegeneracy(_))
        ));

        let ok = array![c(1.0, 0.0), c(1.0, 0.0)];
        assert!(matches!(
            LeastSquaresHelper::solve_regularized(a.view(), ok.view(), -1.0),
            Err(ModelError::InvalidParameter(_))
        ));
    }
}
